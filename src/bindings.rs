//! Placeholder bindings
//!
//! Query text may contain `@{name}` placeholders that are replaced by bound
//! values before the text is parsed. Substitution is purely textual: a value
//! meant as a string literal must be quoted in the query, e.g.
//! `WHERE Dept = "@{dept}"`.

use std::collections::HashMap;

use crate::error::{EngineError, EngineResult, Position};

/// Named values substituted into query text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    values: HashMap<String, String>,
}

impl Bindings {
    /// Create an empty set of bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`, replacing any earlier value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Value bound to `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Parse a `NAME=VALUE` definition, as given on the command line
    pub fn parse_definition(definition: &str) -> EngineResult<(String, String)> {
        match definition.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok((name.trim().to_string(), value.to_string()))
            }
            _ => Err(EngineError::InvalidInput(format!(
                "Invalid variable definition '{}', expected NAME=VALUE",
                definition
            ))),
        }
    }

    /// Replace every `@{name}` in `text` with its bound value
    ///
    /// # Returns
    /// * `Ok(String)` the expanded text
    /// * `Err(UnknownVariable)` for a placeholder without a binding
    /// * `Err(Syntax)` for an unterminated placeholder
    pub fn expand(&self, text: &str) -> EngineResult<String> {
        let mut result = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find("@{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find('}') else {
                let offset = text.len() - rest.len() + start;
                return Err(EngineError::syntax(
                    "unterminated placeholder, expected '}'",
                    position_of(text, offset),
                ));
            };
            let name = &after[..end];
            let value = self
                .get(name)
                .ok_or_else(|| EngineError::UnknownVariable(name.to_string()))?;
            result.push_str(value);
            rest = &after[end + 1..];
        }
        result.push_str(rest);
        Ok(result)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bindings = Bindings::new();
        for (name, value) in iter {
            bindings.insert(name, value);
        }
        bindings
    }
}

fn position_of(text: &str, offset: usize) -> Position {
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map_or(before, |nl| &before[nl + 1..])
        .chars()
        .count()
        + 1;
    Position::new(offset, line, column)
}
