//! # Condition Expressions
//!
//! ```text
//! expression := term ( "and" term )*
//! term       := [ "not" ] key ":" "{" expected "}"
//! ```
//!
//! `expected` may contain nested braces and whitespace; it is handed to the
//! test verbatim (trimmed).

use crate::error::{ConditionError, ConditionResult};

/// One `key:{expected}` term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    /// Test registry key.
    pub key: String,
    /// Value handed to the test's assert.
    pub expected: String,
    /// Whether the term is prefixed with `not`.
    pub negated: bool,
}

/// A parsed condition set. Empty means "always suitable".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionSet {
    conditions: Vec<Condition>,
}

impl ConditionSet {
    /// Parse an expression.
    ///
    /// # Errors
    ///
    /// Returns `ConditionError::Parse` describing the first malformed term.
    pub fn parse(expression: &str) -> ConditionResult<Self> {
        let fail = |reason: &str| ConditionError::Parse {
            expression: expression.to_owned(),
            reason: reason.to_owned(),
        };

        let mut conditions = Vec::new();
        let mut rest = expression.trim();

        while !rest.is_empty() {
            if !conditions.is_empty() {
                rest = strip_keyword(rest, "and").ok_or_else(|| fail("expected 'and' between terms"))?;
            }

            let (negated, term) = match strip_keyword(rest, "not") {
                Some(after) => (true, after),
                None => (false, rest),
            };

            let colon = term.find(':').ok_or_else(|| fail("expected ':' after test key"))?;
            let key = term[..colon].trim();
            if key.is_empty() || key.contains(char::is_whitespace) {
                return Err(fail("malformed test key"));
            }

            let body = term[colon + 1..]
                .trim_start()
                .strip_prefix('{')
                .ok_or_else(|| fail("expected '{' after ':'"))?;
            let close = matching_brace(body).ok_or_else(|| fail("unbalanced braces"))?;

            conditions.push(Condition {
                key: key.to_owned(),
                expected: body[..close].trim().to_owned(),
                negated,
            });
            rest = body[close + 1..].trim_start();
        }

        Ok(Self { conditions })
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.conditions.iter()
    }
}

/// Strip a case-insensitive keyword followed by whitespace.
fn strip_keyword<'a>(input: &'a str, keyword: &str) -> Option<&'a str> {
    let head = input.get(..keyword.len())?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    let tail = &input[keyword.len()..];
    if !tail.starts_with(char::is_whitespace) {
        return None;
    }
    Some(tail.trim_start())
}

/// Index of the `}` closing an already opened brace.
fn matching_brace(body: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (index, ch) in body.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(index);
                }
            }
            _ => {}
        }
    }
    None
}
