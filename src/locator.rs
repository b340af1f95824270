//! Column and row locators
//!
//! A locator is a compact text that selects positions in a sheet:
//!
//! * 1-based indices: `3`
//! * symbolic positions: `first`, `second`, `third`, `last_2`, `last_1`, `last`
//! * comma-separated lists and inclusive ranges: `1,3,5-last`
//! * the complement of a locator: `inv(1-2)`
//!
//! [`resolve_columns`] additionally accepts column names, `[bracketed names]`,
//! `"quoted names"` and `#n`, which forces index interpretation even when a
//! column is named like a number.

use crate::error::{EngineError, EngineResult};
use crate::sheet::Header;

/// One end of a locator segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// 1-based index
    Index(usize),
    /// Offset from the end: 0 is `last`, 1 is `last_1`, 2 is `last_2`
    FromEnd(usize),
}

impl Position {
    fn parse(text: &str) -> Option<Self> {
        match text.to_lowercase().as_str() {
            "first" => Some(Position::Index(1)),
            "second" => Some(Position::Index(2)),
            "third" => Some(Position::Index(3)),
            "last" => Some(Position::FromEnd(0)),
            "last_1" => Some(Position::FromEnd(1)),
            "last_2" => Some(Position::FromEnd(2)),
            other => other.parse::<usize>().ok().map(Position::Index),
        }
    }

    /// 0-based index within `count` positions
    fn resolve(&self, count: usize) -> EngineResult<usize> {
        let resolved = match *self {
            Position::Index(i) if i >= 1 && i <= count => Some(i - 1),
            Position::FromEnd(back) if back < count => Some(count - 1 - back),
            _ => None,
        };
        resolved.ok_or_else(|| {
            EngineError::InvalidInput(format!(
                "Position {} is out of range (1-{})",
                self, count
            ))
        })
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::Index(i) => write!(f, "{}", i),
            Position::FromEnd(0) => write!(f, "last"),
            Position::FromEnd(back) => write!(f, "last_{}", back),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Single(Position),
    Range(Position, Position),
}

impl Segment {
    fn parse(text: &str) -> Option<Self> {
        if let Some(position) = Position::parse(text) {
            return Some(Segment::Single(position));
        }
        let (start, end) = text.split_once('-')?;
        Some(Segment::Range(
            Position::parse(start.trim())?,
            Position::parse(end.trim())?,
        ))
    }

    fn resolve(&self, count: usize, out: &mut Vec<usize>) -> EngineResult<()> {
        match self {
            Segment::Single(position) => out.push(position.resolve(count)?),
            Segment::Range(start, end) => {
                let (from, to) = (start.resolve(count)?, end.resolve(count)?);
                if from > to {
                    return Err(EngineError::InvalidInput(format!(
                        "Range {}-{} is reversed",
                        start, end
                    )));
                }
                out.extend(from..=to);
            }
        }
        Ok(())
    }
}

/// A parsed index locator, independent of any sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLocator {
    segments: Vec<Segment>,
    inverted: bool,
}

impl ColumnLocator {
    /// Parse a locator made of indices, symbolic positions, ranges and `inv(...)`
    ///
    /// # Returns
    /// * `Ok(ColumnLocator)` on success
    /// * `Err(InvalidInput)` if any item is not a position or range
    pub fn parse(text: &str) -> EngineResult<Self> {
        let (body, inverted) = strip_inverse(text.trim());
        let segments = split_items(body)?
            .into_iter()
            .map(|item| {
                Segment::parse(&item).ok_or_else(|| {
                    EngineError::InvalidInput(format!("Invalid locator item '{}'", item))
                })
            })
            .collect::<EngineResult<Vec<_>>>()?;
        Ok(ColumnLocator { segments, inverted })
    }

    /// Resolve against `count` positions (columns or rows) into 0-based indices
    ///
    /// Indices keep the order they were listed in, without duplicates. An
    /// inverted locator yields the complement in ascending order.
    pub fn resolve(&self, count: usize) -> EngineResult<Vec<usize>> {
        let mut indices = Vec::new();
        for segment in &self.segments {
            segment.resolve(count, &mut indices)?;
        }
        Ok(finish(indices, self.inverted, count))
    }
}

/// Resolve a column locator that may also name columns
///
/// # Arguments
/// * `text` - Locator text, e.g. `Dept,[Pay Grade],#3,last`
/// * `header` - Header the names and positions are resolved against
///
/// # Returns
/// * `Ok(indices)` 0-based column indices
/// * `Err(Bind)` for an unknown column name
/// * `Err(InvalidInput)` for an out-of-range position or malformed item
pub fn resolve_columns(text: &str, header: &Header) -> EngineResult<Vec<usize>> {
    let (body, inverted) = strip_inverse(text.trim());
    let count = header.len();
    let mut indices = Vec::new();

    for item in split_items(body)? {
        if let Some(name) = unquote(&item) {
            indices.push(
                header
                    .index_of(name)
                    .ok_or_else(|| EngineError::unknown_column(name))?,
            );
        } else if let Some(number) = item.strip_prefix('#') {
            let position = number
                .parse::<usize>()
                .map_err(|_| EngineError::InvalidInput(format!("Invalid column index '{}'", item)))?;
            indices.push(Position::Index(position).resolve(count)?);
        } else if let Some(col) = header.index_of(&item) {
            indices.push(col);
        } else if let Some(segment) = Segment::parse(&item) {
            segment.resolve(count, &mut indices)?;
        } else {
            return Err(EngineError::unknown_column(&item));
        }
    }

    Ok(finish(indices, inverted, count))
}

fn strip_inverse(text: &str) -> (&str, bool) {
    let prefixed = text
        .get(..4)
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case("inv("));
    if prefixed && text.ends_with(')') {
        (&text[4..text.len() - 1], true)
    } else {
        (text, false)
    }
}

fn unquote(item: &str) -> Option<&str> {
    item.strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .or_else(|| item.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
}

/// Split on commas that are not inside brackets or double quotes
fn split_items(text: &str) -> EngineResult<Vec<String>> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut closing: Option<char> = None;

    for c in text.chars() {
        match closing {
            Some(end) if c == end => {
                closing = None;
                current.push(c);
            }
            Some(_) => current.push(c),
            None => match c {
                '[' => {
                    closing = Some(']');
                    current.push(c);
                }
                '"' => {
                    closing = Some('"');
                    current.push(c);
                }
                ',' => items.push(std::mem::take(&mut current)),
                _ => current.push(c),
            },
        }
    }
    if let Some(end) = closing {
        return Err(EngineError::InvalidInput(format!(
            "Unterminated name in locator, expected '{}'",
            end
        )));
    }
    items.push(current);

    Ok(items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect())
}

fn finish(indices: Vec<usize>, inverted: bool, count: usize) -> Vec<usize> {
    if inverted {
        (0..count).filter(|i| !indices.contains(i)).collect()
    } else {
        let mut seen = Vec::with_capacity(indices.len());
        for i in indices {
            if !seen.contains(&i) {
                seen.push(i);
            }
        }
        seen
    }
}
