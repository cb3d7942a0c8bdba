//! Token scanner for the manifest and lockfile grammar.
//!
//! The grammar has three token kinds: bare words (source kinds, version
//! numbers), double-quoted strings (locators, refs, pins), and the three
//! comparison operators `==`, `>=`, `~>`. Quoted strings have no escape
//! sequences.

use crate::core::{CartelError, Result};

/// One lexical token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// An unquoted word.
    Word(String),
    /// The contents of a double-quoted string.
    Quoted(String),
    /// One of `==`, `>=`, `~>`.
    Operator(String),
}

/// Pull-based tokenizer over a slice of grammar text.
pub struct Tokenizer<'a> {
    rest: &'a str,
}

impl<'a> Tokenizer<'a> {
    /// Tokenize `input` lazily.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self { rest: input }
    }

    /// The next token, or `None` at end of input.
    pub fn next(&mut self) -> Result<Option<Token>> {
        self.rest = self.rest.trim_start();
        let Some(first) = self.rest.chars().next() else {
            return Ok(None);
        };

        if first == '"' {
            let body = &self.rest[1..];
            let Some(end) = body.find('"') else {
                return Err(CartelError::parse(
                    format!("unterminated string in '{}'", self.rest),
                    None,
                ));
            };
            let token = Token::Quoted(body[..end].to_string());
            self.rest = &body[end + 1..];
            return Ok(Some(token));
        }

        for op in ["==", ">=", "~>"] {
            if let Some(after) = self.rest.strip_prefix(op) {
                self.rest = after;
                return Ok(Some(Token::Operator(op.to_string())));
            }
        }

        let end = self
            .rest
            .find(|c: char| c.is_whitespace() || c == '"')
            .unwrap_or(self.rest.len());
        let token = Token::Word(self.rest[..end].to_string());
        self.rest = &self.rest[end..];
        Ok(Some(token))
    }

    /// Whether only whitespace remains.
    #[must_use]
    pub fn at_end(&self) -> bool {
        self.rest.trim_start().is_empty()
    }
}

/// Strip a trailing `#` comment, ignoring `#` inside quoted strings.
#[must_use]
pub fn strip_comment(line: &str) -> &str {
    let mut in_quotes = false;
    for (idx, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '#' if !in_quotes => return &line[..idx],
            _ => {}
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(input: &str) -> Vec<Token> {
        let mut tokenizer = Tokenizer::new(input);
        let mut tokens = Vec::new();
        while let Some(token) = tokenizer.next().unwrap() {
            tokens.push(token);
        }
        tokens
    }

    #[test]
    fn tokenizes_a_dependency_line() {
        assert_eq!(
            collect("github \"A/B\" ~> 1.0"),
            vec![
                Token::Word("github".into()),
                Token::Quoted("A/B".into()),
                Token::Operator("~>".into()),
                Token::Word("1.0".into()),
            ]
        );
    }

    #[test]
    fn quotes_need_no_surrounding_whitespace() {
        assert_eq!(
            collect("git\"url\"\"ref\""),
            vec![
                Token::Word("git".into()),
                Token::Quoted("url".into()),
                Token::Quoted("ref".into()),
            ]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let mut tokenizer = Tokenizer::new("\"oops");
        assert!(tokenizer.next().is_err());
    }

    #[test]
    fn strip_comment_respects_quotes() {
        assert_eq!(strip_comment("github \"A/B\" # pinned"), "github \"A/B\" ");
        assert_eq!(strip_comment("git \"u\" \"fix#1\""), "git \"u\" \"fix#1\"");
        assert_eq!(strip_comment("# whole line"), "");
    }
}
