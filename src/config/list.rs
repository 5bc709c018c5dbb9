//! Splitting of a single raw value into the tokens of a collection parameter.

use std::fmt::Debug;

/// Id of the built-in whitespace-separated parser.
pub const WHITESPACE: &str = "whitespace";
/// Id of the built-in comma-separated parser.
pub const COMMA: &str = "comma";

pub trait ListParser: Send + Sync + Debug {
    /// Splits `raw` into ordered, trimmed tokens. Blank input yields no tokens.
    fn split(&self, raw: &str) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    Whitespace,
    Char(char),
}

impl Delimiter {
    fn matches(self, c: char) -> bool {
        match self {
            Self::Whitespace => c.is_whitespace(),
            Self::Char(d) => c == d,
        }
    }
}

/// Delimiter-based parser with backslash escaping.
///
/// `\` before a delimiter keeps the delimiter literal, `\\` yields one
/// backslash, and any other backslash is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitParser {
    delimiter: Delimiter,
}

impl SplitParser {
    pub const fn whitespace() -> Self {
        Self {
            delimiter: Delimiter::Whitespace,
        }
    }

    pub const fn comma() -> Self {
        Self::on(',')
    }

    pub const fn on(delimiter: char) -> Self {
        Self {
            delimiter: Delimiter::Char(delimiter),
        }
    }

    /// Resolves a built-in parser id.
    pub fn builtin(id: &str) -> Option<Self> {
        match id {
            WHITESPACE => Some(Self::whitespace()),
            COMMA => Some(Self::comma()),
            _ => None,
        }
    }
}

impl Default for SplitParser {
    fn default() -> Self {
        Self::whitespace()
    }
}

impl ListParser for SplitParser {
    fn split(&self, raw: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        // (char, escaped) pairs so escaped whitespace survives trimming.
        let mut current: Vec<(char, bool)> = Vec::new();
        let mut chars = raw.chars();

        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some(next) if next == '\\' || self.delimiter.matches(next) => {
                        current.push((next, true));
                    }
                    Some(next) => current.push((next, false)),
                    None => {}
                }
            } else if self.delimiter.matches(c) {
                finish_token(&mut current, &mut tokens);
            } else {
                current.push((c, false));
            }
        }
        finish_token(&mut current, &mut tokens);
        tokens
    }
}

fn finish_token(current: &mut Vec<(char, bool)>, tokens: &mut Vec<String>) {
    let is_padding = |&(c, escaped): &(char, bool)| !escaped && c.is_whitespace();
    let start = current.iter().position(|p| !is_padding(p));
    let end = current.iter().rposition(|p| !is_padding(p));
    if let (Some(start), Some(end)) = (start, end) {
        tokens.push(current[start..=end].iter().map(|(c, _)| c).collect());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_ws(raw: &str) -> Vec<String> {
        SplitParser::whitespace().split(raw)
    }

    #[test]
    fn test_whitespace_runs() {
        assert_eq!(split_ws("a b"), vec!["a", "b"]);
        assert_eq!(split_ws("  a \t  b\nc  "), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_blank_yields_nothing() {
        assert!(split_ws("").is_empty());
        assert!(split_ws("   \t").is_empty());
        assert!(SplitParser::comma().split(" , ,").is_empty());
    }

    #[test]
    fn test_escaped_whitespace_is_literal() {
        assert_eq!(split_ws(r"a\ b c"), vec!["a b", "c"]);
        assert_eq!(split_ws(r"trailing\ "), vec!["trailing "]);
    }

    #[test]
    fn test_backslash_rules() {
        assert_eq!(split_ws(r"C:\\dir x"), vec![r"C:\dir", "x"]);
        assert_eq!(split_ws(r"a\bc"), vec!["abc"]);
        assert_eq!(split_ws(r"end\"), vec!["end"]);
    }

    #[test]
    fn test_comma_parser() {
        let parser = SplitParser::comma();
        assert_eq!(parser.split("a, b ,c"), vec!["a", "b", "c"]);
        assert_eq!(parser.split(r"x\,y, z"), vec!["x,y", "z"]);
        assert_eq!(parser.split("hello world, again"), vec!["hello world", "again"]);
    }

    #[test]
    fn test_builtin_ids() {
        assert_eq!(SplitParser::builtin(WHITESPACE), Some(SplitParser::whitespace()));
        assert_eq!(SplitParser::builtin(COMMA), Some(SplitParser::comma()));
        assert_eq!(SplitParser::builtin("semicolon"), None);
    }
}
