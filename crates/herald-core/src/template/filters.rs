//! Filters available inside `{{ }}` placeholders.
//!
//! Names and argument order follow the Liquid dialect authors already write
//! (`upcase`, `truncate: 20`, `default: 'x'`). Every filter is total: a value
//! of the wrong shape is coerced to text or treated as empty, never an error.

use minijinja::value::{Value, ValueKind};
use minijinja::{Environment, Error, ErrorKind};
use serde::Serialize;

/// Register every filter on `env`, replacing same-named builtins.
pub fn register(env: &mut Environment<'_>) {
    env.add_filter("default", default);
    env.add_filter("upcase", upcase);
    env.add_filter("downcase", downcase);
    env.add_filter("capitalize", capitalize);
    env.add_filter("strip", strip);
    env.add_filter("size", size);
    env.add_filter("join", join);
    env.add_filter("first", first);
    env.add_filter("last", last);
    env.add_filter("append", append);
    env.add_filter("prepend", prepend);
    env.add_filter("truncate", truncate);
    env.add_filter("json", json);
    env.add_filter("toSentence", to_sentence);
    env.add_filter("pluralize", pluralize);
    env.add_filter("digest", digest);
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Display text of a value; undefined and none are empty. Booleans are
/// lowercase and integral numbers have no fractional part.
pub(crate) fn text(value: &Value) -> String {
    match value.kind() {
        ValueKind::Undefined | ValueKind::None => String::new(),
        ValueKind::Bool => value.is_true().to_string(),
        ValueKind::Number => match value.as_i64() {
            Some(n) => n.to_string(),
            None => f64::try_from(value.clone())
                .map(format_count)
                .unwrap_or_else(|_| value.to_string()),
        },
        _ => match value.as_str() {
            Some(s) => s.to_string(),
            None => value.to_string(),
        },
    }
}

/// Liquid blankness: undefined, null, false, empty string, empty list.
fn is_blank(value: &Value) -> bool {
    match value.kind() {
        ValueKind::Undefined | ValueKind::None => true,
        ValueKind::Bool => !value.is_true(),
        ValueKind::String => value.as_str().is_some_and(str::is_empty),
        ValueKind::Seq => value.len() == Some(0),
        _ => false,
    }
}

fn items(value: &Value) -> Vec<Value> {
    match value.kind() {
        ValueKind::Seq | ValueKind::Iterable => value
            .try_iter()
            .map(|iter| iter.collect())
            .unwrap_or_default(),
        ValueKind::Undefined | ValueKind::None => Vec::new(),
        _ => vec![value.clone()],
    }
}

/// Items as text, optionally plucking `key` from each.
fn names(value: &Value, key: Option<&str>) -> Vec<String> {
    items(value)
        .iter()
        .map(|item| match key {
            Some(key) if !key.is_empty() => text(&item.get_attr(key).unwrap_or_default()),
            _ => text(item),
        })
        .collect()
}

fn number(value: &Value) -> Option<f64> {
    match value.as_str() {
        Some(s) => s.trim().parse().ok(),
        None => f64::try_from(value.clone()).ok(),
    }
}

fn format_count(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// "a", "a and b", "a, b, and c".
fn sentence(parts: &[String]) -> String {
    match parts {
        [] => String::new(),
        [only] => only.clone(),
        [a, b] => format!("{a} and {b}"),
        [head @ .., tail] => format!("{}, and {}", head.join(", "), tail),
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

fn default(value: Value, fallback: Option<Value>) -> Value {
    if is_blank(&value) {
        fallback.unwrap_or_else(|| Value::from(""))
    } else {
        value
    }
}

fn upcase(value: Value) -> String {
    text(&value).to_uppercase()
}

fn downcase(value: Value) -> String {
    text(&value).to_lowercase()
}

fn capitalize(value: Value) -> String {
    let s = text(&value);
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn strip(value: Value) -> String {
    text(&value).trim().to_string()
}

fn size(value: Value) -> usize {
    match value.kind() {
        ValueKind::String => value.as_str().map(|s| s.chars().count()).unwrap_or(0),
        ValueKind::Seq | ValueKind::Map => value.len().unwrap_or(0),
        _ => 0,
    }
}

fn join(value: Value, separator: Option<String>) -> String {
    let separator = separator.unwrap_or_else(|| " ".to_string());
    match value.kind() {
        ValueKind::String => text(&value),
        _ => names(&value, None).join(&separator),
    }
}

fn first(value: Value) -> Value {
    match value.as_str() {
        Some(s) => s.chars().next().map(|c| Value::from(c.to_string())).unwrap_or_default(),
        None => items(&value).into_iter().next().unwrap_or_default(),
    }
}

fn last(value: Value) -> Value {
    match value.as_str() {
        Some(s) => s.chars().last().map(|c| Value::from(c.to_string())).unwrap_or_default(),
        None => items(&value).pop().unwrap_or_default(),
    }
}

fn append(value: Value, suffix: Option<Value>) -> String {
    let suffix = suffix.map(|s| text(&s)).unwrap_or_default();
    format!("{}{}", text(&value), suffix)
}

fn prepend(value: Value, prefix: Option<Value>) -> String {
    let prefix = prefix.map(|p| text(&p)).unwrap_or_default();
    format!("{}{}", prefix, text(&value))
}

fn truncate(value: Value, length: Option<usize>, ellipsis: Option<String>) -> String {
    let s = text(&value);
    let length = length.unwrap_or(50);
    let ellipsis = ellipsis.unwrap_or_else(|| "...".to_string());
    if s.chars().count() <= length {
        return s;
    }
    let keep = length.saturating_sub(ellipsis.chars().count());
    let mut out: String = s.chars().take(keep).collect();
    out.push_str(&ellipsis);
    out
}

fn json(value: Value, spaces: Option<usize>) -> Result<String, Error> {
    let to_error = |e: serde_json::Error| Error::new(ErrorKind::InvalidOperation, e.to_string());
    match spaces {
        Some(n) if n > 0 => {
            let indent = " ".repeat(n);
            let mut buf = Vec::new();
            let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
            let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
            value.serialize(&mut serializer).map_err(to_error)?;
            String::from_utf8(buf)
                .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))
        }
        _ => serde_json::to_string(&value).map_err(to_error),
    }
}

/// `toSentence: key, limit, suffix`: "Ann, Bob, and Cy" or "Ann, Bob, and 3 others".
fn to_sentence(
    value: Value,
    key: Option<String>,
    limit: Option<usize>,
    suffix: Option<String>,
) -> String {
    let parts = names(&value, key.as_deref());
    match limit {
        Some(limit) if limit > 0 && parts.len() > limit => {
            let rest = parts.len() - limit;
            let suffix = suffix.unwrap_or_else(|| {
                if rest == 1 { "other".to_string() } else { "others".to_string() }
            });
            format!("{}, and {} {}", parts[..limit].join(", "), rest, suffix)
        }
        _ => sentence(&parts),
    }
}

/// `pluralize: 'item', 'items'` on a count: "1 item", "3 items".
fn pluralize(count: Value, singular: Option<String>, plural: Option<String>) -> String {
    let n = number(&count).unwrap_or(0.0);
    let singular = singular.unwrap_or_default();
    let word = if n == 1.0 {
        singular
    } else {
        plural.unwrap_or_else(|| format!("{singular}s"))
    };
    format!("{} {}", format_count(n), word).trim_end().to_string()
}

/// `digest: max, key, separator` over a list of actors:
/// "Ann and Bob", "Ann, Bob and 2 others".
fn digest(
    value: Value,
    max: Option<usize>,
    key: Option<String>,
    separator: Option<String>,
) -> String {
    let parts = names(&value, key.as_deref());
    let max = max.unwrap_or(2).max(1);
    let separator = separator.unwrap_or_else(|| ", ".to_string());
    match parts.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        [head @ .., tail] if parts.len() <= max => {
            format!("{} and {}", head.join(&separator), tail)
        }
        _ => {
            let rest = parts.len() - max;
            let noun = if rest == 1 { "other" } else { "others" };
            format!("{} and {} {}", parts[..max].join(&separator), rest, noun)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(items: &[&str]) -> Value {
        Value::from(items.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn test_default_liquid_blankness() {
        let fallback = Some(Value::from("fb"));
        assert_eq!(default(Value::UNDEFINED, fallback.clone()).as_str(), Some("fb"));
        assert_eq!(default(Value::from(()), fallback.clone()).as_str(), Some("fb"));
        assert_eq!(default(Value::from(false), fallback.clone()).as_str(), Some("fb"));
        assert_eq!(default(Value::from(""), fallback.clone()).as_str(), Some("fb"));
        assert_eq!(default(seq(&[]), fallback.clone()).as_str(), Some("fb"));
        assert_eq!(default(Value::from(0), fallback).to_string(), "0");
    }

    #[test]
    fn test_text_of_scalars() {
        assert_eq!(text(&Value::from(true)), "true");
        assert_eq!(text(&Value::from(false)), "false");
        assert_eq!(text(&Value::from(1.0)), "1");
        assert_eq!(text(&Value::from(2.5)), "2.5");
        assert_eq!(text(&Value::from(42)), "42");
        assert_eq!(text(&Value::UNDEFINED), "");
        assert_eq!(append(Value::from(true), Some(Value::from("!"))), "true!");
    }

    #[test]
    fn test_case_filters() {
        assert_eq!(upcase(Value::from("abc")), "ABC");
        assert_eq!(downcase(Value::from("ABC")), "abc");
        assert_eq!(capitalize(Value::from("hELLO world")), "Hello world");
        assert_eq!(strip(Value::from("  x  ")), "x");
    }

    #[test]
    fn test_size() {
        assert_eq!(size(Value::from("héllo")), 5);
        assert_eq!(size(seq(&["a", "b"])), 2);
        assert_eq!(size(Value::UNDEFINED), 0);
    }

    #[test]
    fn test_first_last_join() {
        let list = seq(&["a", "b", "c"]);
        assert_eq!(first(list.clone()).as_str(), Some("a"));
        assert_eq!(last(list.clone()).as_str(), Some("c"));
        assert_eq!(join(list, Some("-".to_string())), "a-b-c");
        assert_eq!(first(Value::from("xyz")).as_str(), Some("x"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate(Value::from("Hello world"), Some(8), None), "Hello...");
        assert_eq!(truncate(Value::from("short"), Some(8), None), "short");
        assert_eq!(truncate(Value::from("abcdef"), Some(4), Some("~".to_string())), "abc~");
    }

    #[test]
    fn test_to_sentence() {
        assert_eq!(to_sentence(seq(&["a"]), None, None, None), "a");
        assert_eq!(to_sentence(seq(&["a", "b"]), None, None, None), "a and b");
        assert_eq!(to_sentence(seq(&["a", "b", "c"]), None, None, None), "a, b, and c");
        assert_eq!(
            to_sentence(seq(&["a", "b", "c", "d"]), None, Some(2), None),
            "a, b, and 2 others"
        );
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize(Value::from(1), Some("item".into()), None), "1 item");
        assert_eq!(pluralize(Value::from(3), Some("item".into()), None), "3 items");
        assert_eq!(
            pluralize(Value::from("2"), Some("person".into()), Some("people".into())),
            "2 people"
        );
    }

    #[test]
    fn test_digest() {
        assert_eq!(digest(seq(&["Ann"]), None, None, None), "Ann");
        assert_eq!(digest(seq(&["Ann", "Bob"]), None, None, None), "Ann and Bob");
        assert_eq!(digest(seq(&["Ann", "Bob", "Cy"]), None, None, None), "Ann, Bob and 1 other");
        assert_eq!(
            digest(seq(&["Ann", "Bob", "Cy", "Di"]), Some(3), None, None),
            "Ann, Bob, Cy and 1 other"
        );
    }

    #[test]
    fn test_json_filter() {
        let value = Value::from_serialize(serde_json::json!({ "a": [1, 2] }));
        assert_eq!(json(value, None).unwrap(), r#"{"a":[1,2]}"#);
    }
}
