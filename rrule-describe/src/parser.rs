// Hand-rolled recursive descent parser for RRULE values.
//
//   rule  = [ "RRULE" ":" ] part *( ";" part ) [ ";" ]
//   part  = name "=" value *( "," value )

use jiff::civil::{Date, DateTime, Time};

use crate::ast::*;
use crate::error::{RuleError, Span};
use crate::lexer::{Token, TokenKind};

/// Rule parts understood by the parser, in canonical order.
const KNOWN_PARTS: [&str; 7] = [
    "FREQ",
    "UNTIL",
    "INTERVAL",
    "BYDAY",
    "BYMONTHDAY",
    "BYMONTH",
    "BYSETPOS",
];

/// Parser state: consumes a slice of tokens.
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    input: &'a str,
}

/// Values collected while walking the parts, before FREQ is known to exist.
#[derive(Default)]
struct Parts {
    frequency: Option<Frequency>,
    interval: Option<u32>,
    by_weekday: Vec<(WeekdaySpec, Span)>,
    by_month_day: Vec<i8>,
    by_month: Vec<MonthName>,
    by_set_pos: Vec<i16>,
    until: Option<DateTime>,
    seen: Vec<&'static str>,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], input: &'a str) -> Self {
        Self {
            tokens,
            pos: 0,
            input,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn current_span(&self) -> Span {
        if let Some(tok) = self.peek() {
            tok.span
        } else if let Some(last) = self.tokens.last() {
            Span::new(last.span.end, last.span.end)
        } else {
            Span::new(0, 0)
        }
    }

    fn error(&self, message: String, span: Span) -> RuleError {
        RuleError::parse(message, span, self.input, None)
    }

    fn error_at_end(&self, message: String) -> RuleError {
        let span = if let Some(last) = self.tokens.last() {
            Span::new(last.span.end, last.span.end)
        } else {
            Span::new(0, 0)
        };
        RuleError::parse(message, span, self.input, None)
    }

    fn consume_kind(
        &mut self,
        expected: &str,
        check: impl Fn(&TokenKind) -> bool,
    ) -> Result<&Token, RuleError> {
        let span = self.current_span();
        match self.peek() {
            Some(tok) if check(&tok.kind) => {
                let idx = self.pos;
                self.pos += 1;
                Ok(&self.tokens[idx])
            }
            Some(tok) => Err(self.error(format!("expected {expected}, got {:?}", tok.kind), span)),
            None => Err(self.error_at_end(format!("expected {expected}"))),
        }
    }

    fn raw(&self, span: Span) -> &'a str {
        &self.input[span.start..span.end]
    }

    // --- Grammar productions ---

    fn parse_rule(&mut self) -> Result<RecurrenceRule, RuleError> {
        // Optional "RRULE:" property prefix
        if matches!(
            (self.tokens.first(), self.tokens.get(1)),
            (Some(Token { kind: TokenKind::Word(w), .. }), Some(Token { kind: TokenKind::Colon, .. }))
                if w == "RRULE"
        ) {
            self.pos = 2;
        }

        let mut parts = Parts::default();
        loop {
            self.parse_part(&mut parts)?;
            match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Semicolon) => {
                    self.advance();
                    // A trailing ';' is tolerated.
                    if self.peek().is_none() {
                        break;
                    }
                }
                None => break,
                Some(kind) => {
                    let span = self.current_span();
                    return Err(self.error(format!("expected ';', got {kind:?}"), span));
                }
            }
        }

        self.finish(parts)
    }

    fn parse_part(&mut self, parts: &mut Parts) -> Result<(), RuleError> {
        let name_tok = self.consume_kind("rule part name", |k| matches!(k, TokenKind::Word(_)))?;
        let name_span = name_tok.span;
        let name = match &name_tok.kind {
            TokenKind::Word(w) => w.clone(),
            _ => unreachable!("consume_kind checked for Word"),
        };

        let Some(canonical) = KNOWN_PARTS.iter().copied().find(|p| *p == name) else {
            return Err(RuleError::parse(
                format!("unknown rule part '{name}'"),
                name_span,
                self.input,
                suggest_part(&name),
            ));
        };
        if parts.seen.contains(&canonical) {
            return Err(self.error(format!("duplicate rule part '{canonical}'"), name_span));
        }
        parts.seen.push(canonical);

        self.consume_kind("'='", |k| matches!(k, TokenKind::Equals))?;

        match canonical {
            "FREQ" => {
                let span = self.current_span();
                let word = self.parse_word("frequency")?;
                let freq = parse_frequency(&word)
                    .ok_or_else(|| self.error(format!("unknown frequency '{word}'"), span))?;
                parts.frequency = Some(freq);
            }
            "INTERVAL" => {
                let span = self.current_span();
                let n = self.parse_integer()?;
                if n < 1 {
                    return Err(self.error(format!("INTERVAL must be at least 1, got {n}"), span));
                }
                parts.interval = Some(n as u32);
            }
            "UNTIL" => {
                let tok = self.consume_kind("date after 'UNTIL='", |k| {
                    matches!(k, TokenKind::Word(_) | TokenKind::Integer(_))
                })?;
                let span = tok.span;
                let raw = self.raw(span);
                let until = parse_until_stamp(raw)
                    .ok_or_else(|| self.error(format!("invalid UNTIL value '{raw}'"), span))?;
                parts.until = Some(until);
            }
            "BYDAY" => {
                for span in self.parse_value_spans()? {
                    let spec = parse_weekday_spec(self.raw(span)).ok_or_else(|| {
                        self.error(format!("invalid weekday '{}'", self.raw(span)), span)
                    })?;
                    parts.by_weekday.push((spec, span));
                }
            }
            "BYMONTHDAY" => {
                for (n, span) in self.parse_integer_list()? {
                    if n == 0 || !(-31..=31).contains(&n) {
                        return Err(self.error(
                            format!("BYMONTHDAY values must be in -31..=31 and non-zero, got {n}"),
                            span,
                        ));
                    }
                    parts.by_month_day.push(n as i8);
                }
            }
            "BYMONTH" => {
                for (n, span) in self.parse_integer_list()? {
                    let month = u8::try_from(n)
                        .ok()
                        .and_then(MonthName::from_number)
                        .ok_or_else(|| {
                            self.error(format!("BYMONTH values must be in 1..=12, got {n}"), span)
                        })?;
                    parts.by_month.push(month);
                }
            }
            "BYSETPOS" => {
                for (n, span) in self.parse_integer_list()? {
                    if n == 0 || !(-366..=366).contains(&n) {
                        return Err(self.error(
                            format!("BYSETPOS values must be in -366..=366 and non-zero, got {n}"),
                            span,
                        ));
                    }
                    parts.by_set_pos.push(n as i16);
                }
            }
            _ => unreachable!("KNOWN_PARTS covers every arm"),
        }
        Ok(())
    }

    fn parse_word(&mut self, expected: &str) -> Result<String, RuleError> {
        let tok = self.consume_kind(expected, |k| matches!(k, TokenKind::Word(_)))?;
        match &tok.kind {
            TokenKind::Word(w) => Ok(w.clone()),
            _ => unreachable!("consume_kind checked for Word"),
        }
    }

    fn parse_integer(&mut self) -> Result<i32, RuleError> {
        let tok = self.consume_kind("number", |k| matches!(k, TokenKind::Integer(_)))?;
        match tok.kind {
            TokenKind::Integer(n) => Ok(n),
            _ => unreachable!("consume_kind checked for Integer"),
        }
    }

    fn parse_integer_list(&mut self) -> Result<Vec<(i32, Span)>, RuleError> {
        let mut values = Vec::new();
        loop {
            let span = self.current_span();
            values.push((self.parse_integer()?, span));
            if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Comma)) {
                self.advance();
            } else {
                break;
            }
        }
        Ok(values)
    }

    /// Comma separated atoms of any kind, returned as spans into the input.
    fn parse_value_spans(&mut self) -> Result<Vec<Span>, RuleError> {
        let mut spans = Vec::new();
        loop {
            let tok = self.consume_kind("value", |k| {
                matches!(k, TokenKind::Word(_) | TokenKind::Integer(_))
            })?;
            spans.push(tok.span);
            if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Comma)) {
                self.advance();
            } else {
                break;
            }
        }
        Ok(spans)
    }

    fn finish(&self, parts: Parts) -> Result<RecurrenceRule, RuleError> {
        let Some(frequency) = parts.frequency else {
            return Err(RuleError::parse(
                "missing FREQ",
                Span::new(0, self.input.len()),
                self.input,
                Some(format!("FREQ=DAILY;{}", self.input.trim())),
            ));
        };

        if matches!(frequency, Frequency::Daily | Frequency::Weekly) {
            if let Some((_, span)) = parts.by_weekday.iter().find(|(w, _)| w.nth.is_some()) {
                return Err(self.error(
                    format!(
                        "BYDAY position prefixes are only valid in MONTHLY or YEARLY rules, not {}",
                        frequency.as_str()
                    ),
                    *span,
                ));
            }
        }

        Ok(RecurrenceRule {
            frequency,
            interval: parts.interval.unwrap_or(1),
            by_weekday: parts.by_weekday.into_iter().map(|(w, _)| w).collect(),
            by_month_day: parts.by_month_day,
            by_month: parts.by_month,
            by_set_pos: parts.by_set_pos,
            until: parts.until,
        })
    }
}

/// Parse `MO`, `2TU`, `+1WE`, `-1FR`.
fn parse_weekday_spec(s: &str) -> Option<WeekdaySpec> {
    if s.len() < 2 || !s.is_char_boundary(s.len() - 2) {
        return None;
    }
    let (prefix, code) = s.split_at(s.len() - 2);
    let weekday = parse_weekday_code(code)?;
    if prefix.is_empty() {
        return Some(WeekdaySpec::every(weekday));
    }
    let nth: i8 = prefix.parse().ok()?;
    if nth == 0 || !(-53..=53).contains(&nth) {
        return None;
    }
    Some(WeekdaySpec::nth(nth, weekday))
}

/// `YYYYMMDD` or `YYYYMMDDTHHMMSS` with an optional trailing `Z`.
fn parse_until_stamp(s: &str) -> Option<DateTime> {
    let s = s.strip_suffix(['Z', 'z']).unwrap_or(s);
    if !s.is_ascii() {
        return None;
    }
    let (date_part, time_part) = match s.len() {
        8 => (s, None),
        15 if s.as_bytes()[8].eq_ignore_ascii_case(&b'T') => (&s[..8], Some(&s[9..])),
        _ => return None,
    };
    let num = |t: &str| -> Option<i16> {
        if t.bytes().all(|b| b.is_ascii_digit()) {
            t.parse().ok()
        } else {
            None
        }
    };
    let date = Date::new(
        num(&date_part[..4])?,
        num(&date_part[4..6])? as i8,
        num(&date_part[6..8])? as i8,
    )
    .ok()?;
    let time = match time_part {
        Some(t) => Time::new(
            num(&t[..2])? as i8,
            num(&t[2..4])? as i8,
            num(&t[4..6])? as i8,
            0,
        )
        .ok()?,
        None => Time::midnight(),
    };
    Some(date.to_datetime(time))
}

/// Suggest the known part name closest to a misspelled one.
fn suggest_part(name: &str) -> Option<String> {
    let aliases: &[(&str, &str)] = &[
        ("BYWEEKDAY", "BYDAY"),
        ("BYDAYS", "BYDAY"),
        ("BYMONTHDAYS", "BYMONTHDAY"),
        ("BYMONTHS", "BYMONTH"),
        ("BYSETPOSITION", "BYSETPOS"),
        ("FREQUENCY", "FREQ"),
    ];
    if let Some((_, to)) = aliases.iter().find(|(from, _)| *from == name) {
        return Some((*to).to_string());
    }
    KNOWN_PARTS
        .iter()
        .map(|p| (edit_distance(name, p), p))
        .filter(|(d, _)| *d <= 2)
        .min_by_key(|(d, _)| *d)
        .map(|(_, p)| (*p).to_string())
}

fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut row = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            row[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(row[j] + 1);
        }
        prev = row;
    }
    prev[b.len()]
}

/// Parse an RRULE value into a `RecurrenceRule`.
pub fn parse(input: &str) -> Result<RecurrenceRule, RuleError> {
    let mut lexer = crate::lexer::Lexer::new(input);
    let tokens = lexer.tokenize()?;

    if tokens.is_empty() {
        return Err(RuleError::parse("empty rule", Span::new(0, 0), input, None));
    }

    let mut parser = Parser::new(&tokens, input);
    parser.parse_rule()
}
