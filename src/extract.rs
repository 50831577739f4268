//! Field-path extraction over nested task structures
//!
//! Route conditions name the value they compare against with a small
//! path language: dotted keys for map access and bracketed integers
//! (negative counts from the end) for sequence indexing, freely mixed,
//! e.g. `messages[-1].parts[0].content` or `metadata.priority`.
//!
//! Extraction fails softly: a missing key, an out-of-range index, or
//! indexing into a scalar yields `None` rather than an error, so a
//! condition over a malformed or absent field simply does not match.

use serde_json::Value;

/// One step of a parsed field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Map key or attribute name
    Key(String),
    /// Sequence index; negative indexes from the end
    Index(i64),
}

/// Parse a path string into segments.
///
/// Returns `None` on malformed input (unbalanced brackets, non-integer
/// index, empty key); callers treat that the same as a missing field.
pub fn parse_path(path: &str) -> Option<Vec<PathSegment>> {
    if path.is_empty() {
        return None;
    }

    let mut segments = Vec::new();
    for component in path.split('.') {
        let mut rest = component;

        // Leading key portion before any bracket.
        if let Some(open) = rest.find('[') {
            let key = &rest[..open];
            if !key.is_empty() {
                segments.push(PathSegment::Key(key.to_string()));
            }
            rest = &rest[open..];
        } else {
            if rest.is_empty() {
                return None;
            }
            segments.push(PathSegment::Key(rest.to_string()));
            continue;
        }

        // Remaining bracket groups: `[0]`, `[-1]`, possibly chained.
        while !rest.is_empty() {
            if !rest.starts_with('[') {
                return None;
            }
            let close = rest.find(']')?;
            let index: i64 = rest[1..close].parse().ok()?;
            segments.push(PathSegment::Index(index));
            rest = &rest[close + 1..];
        }
    }

    if segments.is_empty() {
        None
    } else {
        Some(segments)
    }
}

/// Extract the value at `path` inside `root`, or `None` if any segment
/// is missing, out of range, or type-incompatible.
pub fn extract<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let segments = parse_path(path)?;
    let mut current = root;

    for segment in &segments {
        current = match segment {
            PathSegment::Key(key) => current.as_object()?.get(key)?,
            PathSegment::Index(index) => {
                let items = current.as_array()?;
                let resolved = if *index < 0 {
                    items.len().checked_sub(index.unsigned_abs() as usize)?
                } else {
                    *index as usize
                };
                items.get(resolved)?
            }
        };
    }

    Some(current)
}
