//! Key-path lookup against nested JSON data.
//!
//! Paths are dot-separated (`payload.user.name`) with optional bracketed
//! indices (`payload.items[0].label`, `steps['digest-step'].events`). A path
//! that is itself a verbatim key of the root object wins over segment
//! descent, so data keyed by literal dotted names stays reachable.
//!
//! Lookup never fails loudly: a missing key, an out-of-range index, or a
//! scalar where a container was expected all resolve to `None`. `null` at the
//! leaf is reported as `None` as well; callers decide whether that matters.

use serde_json::Value;

/// One step of a parsed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

/// Resolve `path` against `context`.
pub fn resolve<'a>(context: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.trim();
    if path.is_empty() {
        return non_null(context);
    }

    if let Some(value) = context.as_object().and_then(|root| root.get(path)) {
        return non_null(value);
    }

    let segments = parse_path(path)?;
    let mut current = context;
    for segment in segments {
        current = step(current, &segment)?;
    }
    non_null(current)
}

/// Split a path into segments. Returns `None` for malformed brackets.
pub fn parse_path(path: &str) -> Option<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    for part in path.split('.') {
        let (head, mut rest) = match part.find('[') {
            Some(pos) => (&part[..pos], &part[pos..]),
            None => (part, ""),
        };
        if !head.is_empty() {
            segments.push(Segment::Key(head));
        } else if rest.is_empty() {
            // `a..b` or a trailing dot
            return None;
        }
        while !rest.is_empty() {
            let close = rest.find(']')?;
            let inner = rest[1..close].trim();
            segments.push(bracket_segment(inner)?);
            rest = &rest[close + 1..];
            if !rest.is_empty() && !rest.starts_with('[') {
                return None;
            }
        }
    }
    Some(segments)
}

fn bracket_segment(inner: &str) -> Option<Segment<'_>> {
    if let Ok(index) = inner.parse::<usize>() {
        return Some(Segment::Index(index));
    }
    let quoted = inner
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| inner.strip_prefix('"').and_then(|s| s.strip_suffix('"')));
    match quoted {
        Some(key) => Some(Segment::Key(key)),
        None if !inner.is_empty() => Some(Segment::Key(inner)),
        None => None,
    }
}

fn step<'a>(current: &'a Value, segment: &Segment<'_>) -> Option<&'a Value> {
    match (current, segment) {
        (Value::Object(map), Segment::Key(key)) => map.get(*key),
        (Value::Object(map), Segment::Index(index)) => map.get(&index.to_string()),
        (Value::Array(items), Segment::Index(index)) => items.get(*index),
        (Value::Array(items), Segment::Key(key)) => {
            key.parse::<usize>().ok().and_then(|index| items.get(index))
        }
        _ => None,
    }
}

fn non_null(value: &Value) -> Option<&Value> {
    if value.is_null() { None } else { Some(value) }
}
