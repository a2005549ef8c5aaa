use std::fmt;

use crate::ast::Frequency;

/// Byte range within the input string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// All errors produced by rrule-describe.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum RuleError {
    Lex {
        message: String,
        span: Span,
        input: String,
    },

    Parse {
        message: String,
        span: Span,
        input: String,
        suggestion: Option<String>,
    },

    /// The rule parsed, but its frequency cannot be described.
    UnsupportedFrequency {
        frequency: Frequency,
        rule: String,
    },

    Eval {
        message: String,
    },

    Config {
        message: String,
    },

    Cron {
        message: String,
    },
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex { message, .. } => write!(f, "{message}"),
            Self::Parse { message, .. } => write!(f, "{message}"),
            Self::UnsupportedFrequency { frequency, rule } => {
                write!(f, "unsupported frequency [{frequency}] in rrule [{rule}]")
            }
            Self::Eval { message } => write!(f, "{message}"),
            Self::Config { message } => write!(f, "{message}"),
            Self::Cron { message } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for RuleError {}

impl RuleError {
    pub fn lex(message: impl Into<String>, span: Span, input: impl Into<String>) -> Self {
        Self::Lex {
            message: message.into(),
            span,
            input: input.into(),
        }
    }

    pub fn parse(
        message: impl Into<String>,
        span: Span,
        input: impl Into<String>,
        suggestion: Option<String>,
    ) -> Self {
        Self::Parse {
            message: message.into(),
            span,
            input: input.into(),
            suggestion,
        }
    }

    pub fn unsupported_frequency(frequency: Frequency, rule: impl Into<String>) -> Self {
        Self::UnsupportedFrequency {
            frequency,
            rule: rule.into(),
        }
    }

    pub fn eval(message: impl Into<String>) -> Self {
        Self::Eval {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn cron(message: impl Into<String>) -> Self {
        Self::Cron {
            message: message.into(),
        }
    }

    /// Format a rich error with underline and optional suggestion.
    pub fn display_rich(&self) -> String {
        match self {
            Self::Lex {
                message,
                span,
                input,
            } => format_span_error("error", message, span, input, None),
            Self::Parse {
                message,
                span,
                input,
                suggestion,
            } => format_span_error("error", message, span, input, suggestion.as_deref()),
            Self::UnsupportedFrequency { frequency, rule } => match frequency_span(rule) {
                Some(span) => format_span_error(
                    "error",
                    &format!("unsupported frequency [{frequency}]"),
                    &span,
                    rule,
                    None,
                ),
                None => format!("error: {self}"),
            },
            Self::Eval { message } => format!("error: {message}"),
            Self::Config { message } => format!("error: {message}"),
            Self::Cron { message } => format!("error: {message}"),
        }
    }
}

/// Span of the `FREQ` value inside a raw rule string.
fn frequency_span(rule: &str) -> Option<Span> {
    let upper = rule.to_ascii_uppercase();
    let key = upper.find("FREQ=")?;
    let start = key + "FREQ=".len();
    let end = upper[start..].find(';').map_or(upper.len(), |i| start + i);
    (end > start).then(|| Span::new(start, end))
}

fn format_span_error(
    prefix: &str,
    message: &str,
    span: &Span,
    input: &str,
    suggestion: Option<&str>,
) -> String {
    let mut out = format!("{prefix}: {message}\n");
    out.push_str(&format!("  {input}\n"));
    let padding = " ".repeat(span.start + 2);
    let underline = "^".repeat(span.end.saturating_sub(span.start).max(1));
    out.push_str(&padding);
    out.push_str(&underline);
    if let Some(sug) = suggestion {
        out.push_str(&format!(" try: \"{sug}\""));
    }
    out
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_frequency_names_rule() {
        let err = RuleError::unsupported_frequency(Frequency::Hourly, "FREQ=HOURLY;INTERVAL=2");
        assert_eq!(
            err.to_string(),
            "unsupported frequency [HOURLY] in rrule [FREQ=HOURLY;INTERVAL=2]"
        );
        let rich = err.display_rich();
        let lines: Vec<&str> = rich.lines().collect();
        assert_eq!(lines[0], "error: unsupported frequency [HOURLY]");
        assert_eq!(lines[1], "  FREQ=HOURLY;INTERVAL=2");
        assert_eq!(lines[2], format!("{}{}", " ".repeat(7), "^".repeat(6)));
    }

    #[test]
    fn test_unsupported_frequency_span_follows_prefix() {
        let err = RuleError::unsupported_frequency(Frequency::Secondly, "RRULE:INTERVAL=5;freq=SECONDLY");
        let rich = err.display_rich();
        let lines: Vec<&str> = rich.lines().collect();
        assert_eq!(lines[0], "error: unsupported frequency [SECONDLY]");
        assert_eq!(lines[2], format!("{}{}", " ".repeat(24), "^".repeat(8)));
    }

    #[test]
    fn test_plain_errors_have_prefix() {
        let err = RuleError::cron("rule is not expressible as cron");
        assert_eq!(err.display_rich(), "error: rule is not expressible as cron");
    }

    #[test]
    fn test_rich_parse_error_underlines_span() {
        let err = RuleError::parse(
            "unknown rule part 'BYWEEKDAY'",
            Span::new(12, 21),
            "FREQ=WEEKLY;BYWEEKDAY=MO",
            Some("BYDAY".into()),
        );
        let rich = err.display_rich();
        let lines: Vec<&str> = rich.lines().collect();
        assert_eq!(lines[0], "error: unknown rule part 'BYWEEKDAY'");
        assert_eq!(lines[1], "  FREQ=WEEKLY;BYWEEKDAY=MO");
        assert_eq!(lines[2], format!("{}{} try: \"BYDAY\"", " ".repeat(14), "^".repeat(9)));
    }
}
