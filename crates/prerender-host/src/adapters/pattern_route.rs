//! # Pattern Routes
//!
//! `RouteMatcher` for framework-style route strings, compiled to a regex.
//!
//! | Syntax      | Matches                          | Regex          |
//! |-------------|----------------------------------|----------------|
//! | `:name`     | one path segment                 | `([^/?]+)`     |
//! | `*name`     | the rest of the path, `/` included | `([^?]*?)`   |
//! | `( ... )`   | an optional part                 | `(?:...)?`     |
//!
//! Every route accepts a trailing `?query`, captured as the last parameter.

use crate::ports::outbound::RouteMatcher;
use regex::Regex;
use std::fmt;

/// A compiled route string.
#[derive(Clone)]
pub struct PatternRoute {
    pattern: String,
    names: Vec<String>,
    regex: Regex,
}

impl PatternRoute {
    /// Compile `pattern`.
    pub fn new(pattern: impl Into<String>) -> Result<Self, regex::Error> {
        let pattern = pattern.into();
        let (source, names) = compile(&pattern);
        let regex = Regex::new(&source)?;
        Ok(Self {
            pattern,
            names,
            regex,
        })
    }

    /// Names of the `:param` and `*splat` parts, in order.
    pub fn param_names(&self) -> &[String] {
        &self.names
    }

    /// Extracted parameters for `fragment`, one per named part followed by
    /// the query string. Unmatched optional parts are `None`.
    pub fn extract(&self, fragment: &str) -> Option<Vec<Option<String>>> {
        let captures = self.regex.captures(fragment)?;
        Some(
            captures
                .iter()
                .skip(1)
                .map(|group| group.map(|m| m.as_str().to_string()))
                .collect(),
        )
    }

    /// Compiled regex source.
    pub fn regex(&self) -> &str {
        self.regex.as_str()
    }
}

impl RouteMatcher for PatternRoute {
    fn pattern(&self) -> &str {
        &self.pattern
    }

    fn matches(&self, fragment: &str) -> bool {
        self.regex.is_match(fragment)
    }
}

impl fmt::Debug for PatternRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternRoute")
            .field("pattern", &self.pattern)
            .field("regex", &self.regex.as_str())
            .finish()
    }
}

fn compile(pattern: &str) -> (String, Vec<String>) {
    let mut source = String::from("^");
    let mut names = Vec::new();
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '(' => source.push_str("(?:"),
            ')' => source.push_str(")?"),
            ':' | '*' if chars.peek().is_some_and(|next| is_word(*next)) => {
                let mut name = String::new();
                while let Some(next) = chars.next_if(|next| is_word(*next)) {
                    name.push(next);
                }
                names.push(name);
                source.push_str(if c == ':' { "([^/?]+)" } else { "([^?]*?)" });
            }
            other => source.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }

    source.push_str(r"(?:\?([\s\S]*))?$");
    (source, names)
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
