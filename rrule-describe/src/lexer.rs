use crate::error::{RuleError, Span};

/// Token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Any alphanumeric atom that is not a plain integer, uppercased:
    /// part names, frequencies, weekday codes (`MO`, `-1FR`), UNTIL stamps.
    Word(String),

    /// Optionally signed decimal integer.
    Integer(i32),

    // Punctuation
    Equals,
    Semicolon,
    Comma,
    Colon,
}

pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, RuleError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            if self.pos >= self.bytes.len() {
                break;
            }

            let start = self.pos;
            let ch = self.bytes[self.pos];

            let punct = match ch {
                b'=' => Some(TokenKind::Equals),
                b';' => Some(TokenKind::Semicolon),
                b',' => Some(TokenKind::Comma),
                b':' => Some(TokenKind::Colon),
                _ => None,
            };
            if let Some(kind) = punct {
                self.pos += 1;
                tokens.push(Token {
                    kind,
                    span: Span::new(start, self.pos),
                });
                continue;
            }

            if is_atom_byte(ch) {
                let tok = self.lex_atom()?;
                tokens.push(tok);
                continue;
            }

            let ch = self.input[start..].chars().next().unwrap_or('?');
            return Err(RuleError::lex(
                format!("unexpected character '{ch}'"),
                Span::new(start, start + ch.len_utf8()),
                self.input,
            ));
        }
        Ok(tokens)
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn lex_atom(&mut self) -> Result<Token, RuleError> {
        let start = self.pos;
        while self.pos < self.bytes.len() && is_atom_byte(self.bytes[self.pos]) {
            self.pos += 1;
        }
        let text = &self.input[start..self.pos];
        let span = Span::new(start, self.pos);

        let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            let value: i32 = text
                .parse()
                .map_err(|_| RuleError::lex("number out of range", span, self.input))?;
            return Ok(Token {
                kind: TokenKind::Integer(value),
                span,
            });
        }

        Ok(Token {
            kind: TokenKind::Word(text.to_uppercase()),
            span,
        })
    }
}

fn is_atom_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'+' || b == b'-' || b == b'_'
}
