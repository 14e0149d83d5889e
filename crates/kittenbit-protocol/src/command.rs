use std::fmt;

use crate::error::ArgumentError;

/// Token separator inside an `M` request body.
///
/// Splitting is on every single space: `"204  50"` yields `["204", "", "50"]`.
/// Runs of spaces are not collapsed.
pub const SEPARATOR: char = ' ';

/// Command identifier as parsed from the first token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandId {
    /// A base-10 identifier.
    Number(u32),
    /// A leading token that is not a valid identifier, kept verbatim. Never registered.
    Invalid(String),
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandId::Number(id) => write!(f, "{id}"),
            CommandId::Invalid(token) => f.write_str(token),
        }
    }
}

/// A parsed `M` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub id: CommandId,
    /// Tokens after the id, unparsed.
    pub args: Vec<String>,
}

impl Command {
    /// Split a request body (class character already removed). Never fails.
    pub fn parse(body: &str) -> Self {
        let mut tokens = body.split(SEPARATOR);
        let head = tokens.next().unwrap_or_default();
        // `u32::from_str` takes a leading `+`; ids are bare digits.
        let id = match head.parse::<u32>() {
            Ok(id) if head.bytes().all(|b| b.is_ascii_digit()) => CommandId::Number(id),
            _ => CommandId::Invalid(head.to_string()),
        };

        Self {
            id,
            args: tokens.map(str::to_string).collect(),
        }
    }
}

/// How handlers treat argument tokens that are missing or not integers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArgumentMode {
    /// Missing and unparseable tokens read as `0`. Wire-compatible with the firmware.
    #[default]
    Lenient,
    /// Missing and unparseable tokens are an [`ArgumentError`].
    Strict,
}

/// Typed view over a command's argument tokens.
#[derive(Debug, Clone, Copy)]
pub struct Arguments<'a> {
    tokens: &'a [String],
    mode: ArgumentMode,
}

impl<'a> Arguments<'a> {
    pub fn new(tokens: &'a [String], mode: ArgumentMode) -> Self {
        Self { tokens, mode }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn mode(&self) -> ArgumentMode {
        self.mode
    }

    /// Raw token at `index`.
    pub fn raw(&self, index: usize) -> Option<&'a str> {
        self.tokens.get(index).map(String::as_str)
    }

    /// Required integer at `index`.
    pub fn int(&self, index: usize) -> Result<i32, ArgumentError> {
        match self.raw(index) {
            Some(token) => self.parse(index, token),
            None => match self.mode {
                ArgumentMode::Lenient => Ok(0),
                ArgumentMode::Strict => Err(ArgumentError::Missing {
                    index,
                    required: index + 1,
                }),
            },
        }
    }

    /// Optional integer at `index`; absent tokens are `None` in both modes.
    pub fn optional_int(&self, index: usize) -> Result<Option<i32>, ArgumentError> {
        self.raw(index)
            .map(|token| self.parse(index, token))
            .transpose()
    }

    fn parse(&self, index: usize, token: &str) -> Result<i32, ArgumentError> {
        match self.mode {
            ArgumentMode::Lenient => Ok(parse_lenient_int(token)),
            ArgumentMode::Strict => token.parse().map_err(|_| ArgumentError::NotNumeric {
                index,
                token: token.to_string(),
            }),
        }
    }
}

/// Leading-integer parse that never fails.
///
/// Skips leading whitespace, takes an optional sign and then as many decimal
/// digits as follow. No digits gives `0`; out-of-range values saturate.
pub fn parse_lenient_int(token: &str) -> i32 {
    let bytes = token.trim_start().as_bytes();
    let (negative, digits) = match bytes.split_first() {
        Some((b'-', rest)) => (true, rest),
        Some((b'+', rest)) => (false, rest),
        _ => (false, bytes),
    };

    let magnitude = digits
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0i64, |acc, b| {
            (acc * 10 + i64::from(b - b'0')).min(i64::from(i32::MAX) + 1)
        });

    let value = if negative { -magnitude } else { magnitude };
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_id_and_args() {
        let cmd = Command::parse("204 50 -50 100");
        assert_eq!(cmd.id, CommandId::Number(204));
        assert_eq!(cmd.args, tokens(&["50", "-50", "100"]));
    }

    #[test]
    fn id_only() {
        let cmd = Command::parse("0");
        assert_eq!(cmd.id, CommandId::Number(0));
        assert!(cmd.args.is_empty());
    }

    #[test]
    fn consecutive_separators_keep_empty_tokens() {
        let cmd = Command::parse("204  50 ");
        assert_eq!(cmd.args, tokens(&["", "50", ""]));
    }

    #[test]
    fn non_numeric_id_is_invalid_not_error() {
        assert_eq!(
            Command::parse("abc 1").id,
            CommandId::Invalid("abc".to_string())
        );
        assert_eq!(Command::parse("").id, CommandId::Invalid(String::new()));
        assert_eq!(
            Command::parse("+5 1").id,
            CommandId::Invalid("+5".to_string())
        );
        assert_eq!(
            Command::parse("-0").id,
            CommandId::Invalid("-0".to_string())
        );
        assert_eq!(
            Command::parse("-3").id,
            CommandId::Invalid("-3".to_string())
        );
        assert_eq!(
            Command::parse(" 0").id,
            CommandId::Invalid(String::new()),
            "a leading space produces an empty id token"
        );
    }

    #[test]
    fn id_display() {
        assert_eq!(CommandId::Number(42).to_string(), "42");
        assert_eq!(CommandId::Invalid("x9".to_string()).to_string(), "x9");
    }

    #[test]
    fn lenient_int_follows_leading_digits() {
        assert_eq!(parse_lenient_int("50"), 50);
        assert_eq!(parse_lenient_int("-50"), -50);
        assert_eq!(parse_lenient_int("+7"), 7);
        assert_eq!(parse_lenient_int("12abc"), 12);
        assert_eq!(parse_lenient_int("abc"), 0);
        assert_eq!(parse_lenient_int(""), 0);
        assert_eq!(parse_lenient_int("-"), 0);
        assert_eq!(parse_lenient_int("  8"), 8);
        assert_eq!(parse_lenient_int("99999999999"), i32::MAX);
        assert_eq!(parse_lenient_int("-99999999999"), i32::MIN);
    }

    #[test]
    fn lenient_arguments_coerce_to_zero() {
        let args = tokens(&["x", "5"]);
        let view = Arguments::new(&args, ArgumentMode::Lenient);
        assert_eq!(view.int(0), Ok(0));
        assert_eq!(view.int(1), Ok(5));
        assert_eq!(view.int(2), Ok(0));
        assert_eq!(view.optional_int(2), Ok(None));
    }

    #[test]
    fn strict_arguments_reject() {
        let args = tokens(&["x", "5", "7z"]);
        let view = Arguments::new(&args, ArgumentMode::Strict);
        assert_eq!(
            view.int(0),
            Err(ArgumentError::NotNumeric {
                index: 0,
                token: "x".to_string()
            })
        );
        assert_eq!(view.int(1), Ok(5));
        assert!(matches!(
            view.optional_int(2),
            Err(ArgumentError::NotNumeric { index: 2, .. })
        ));
        assert_eq!(
            view.int(3),
            Err(ArgumentError::Missing {
                index: 3,
                required: 4
            })
        );
        assert_eq!(view.optional_int(3), Ok(None));
    }
}
