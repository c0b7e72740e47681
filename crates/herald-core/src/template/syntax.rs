//! Placeholder syntax translation.
//!
//! Authors write Liquid-style filter calls (`{{ name | truncate: 10, '~' }}`);
//! the engine speaks Jinja (`{{ name | truncate(10, '~') }}`). This pass
//! rewrites filter calls inside `{{ }}` blocks, and turns hyphenated path
//! segments into subscripts (`steps.digest-step.events` becomes
//! `steps['digest-step'].events`) so they are not read as subtraction.
//!
//! Outside placeholders the text is left alone, except that a literal `{#`
//! or `{%` is emitted as a string expression so it is not read as a comment
//! or statement opener.

use super::OutputMode;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Translate `template` into the engine's syntax.
pub fn to_engine_syntax(template: &str, mode: OutputMode) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        push_text(&mut out, &rest[..start]);
        let body_start = start + OPEN.len();
        match find_close(&rest[body_start..]) {
            Some(len) => {
                let body = &rest[body_start..body_start + len];
                let body = match mode {
                    OutputMode::EmbeddedJson => body.replace("\\\"", "\""),
                    OutputMode::Plain => body.to_string(),
                };
                out.push_str(OPEN);
                out.push_str(&translate_filters(&subscript_hyphenated(&body)));
                out.push_str(CLOSE);
                rest = &rest[body_start + len + CLOSE.len()..];
            }
            None => {
                // Unterminated: hand it to the engine verbatim for a syntax error.
                out.push_str(&rest[start..]);
                return out;
            }
        }
    }
    push_text(&mut out, rest);
    out
}

/// Copy literal text, quoting `{#` and `{%` openers.
fn push_text(out: &mut String, text: &str) {
    let mut copied = 0;
    for (at, _) in text.match_indices('{') {
        let opener = &text[at..];
        if at < copied || !(opener.starts_with("{#") || opener.starts_with("{%")) {
            continue;
        }
        out.push_str(&text[copied..at]);
        out.push_str("{{ '");
        out.push_str(&opener[..2]);
        out.push_str("' }}");
        copied = at + 2;
    }
    out.push_str(&text[copied..]);
}

fn is_path_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.'
}

/// Rewrite hyphenated dotted segments as subscripts, outside string literals.
fn subscript_hyphenated(body: &str) -> String {
    let bytes = body.as_bytes();
    let mut out = String::with_capacity(body.len() + 8);
    let mut quote: Option<u8> = None;
    let mut copied = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 1;
            } else if b == q {
                quote = None;
            }
            i += 1;
        } else if b == b'\'' || b == b'"' {
            quote = Some(b);
            i += 1;
        } else if is_path_byte(b) {
            let start = i;
            while i < bytes.len() && is_path_byte(bytes[i]) {
                i += 1;
            }
            out.push_str(&body[copied..start]);
            push_path(&mut out, &body[start..i]);
            copied = i;
        } else {
            i += 1;
        }
    }
    out.push_str(&body[copied..]);
    out
}

/// `steps.digest-step.events` becomes `steps['digest-step'].events`.
/// Numbers, `-` operators and a hyphenated root name are left as written.
fn push_path(out: &mut String, run: &str) {
    let named = run.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_' || c == '.');
    if !named || !run.contains('-') {
        out.push_str(run);
        return;
    }
    for (index, segment) in run.split('.').enumerate() {
        if index == 0 {
            out.push_str(segment);
        } else if segment.contains('-') {
            out.push_str("['");
            out.push_str(segment);
            out.push_str("']");
        } else {
            out.push('.');
            out.push_str(segment);
        }
    }
}

/// Byte offset of the `}}` closing a placeholder body, skipping quoted text.
fn find_close(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            _ if b == b'\\' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'\'' || b == b'"' => quote = Some(b),
            None if bytes[i..].starts_with(CLOSE.as_bytes()) => return Some(i),
            None => {}
        }
        i += 1;
    }
    None
}

/// Rewrite `| name: a, b` as `| name(a, b)` outside string literals.
fn translate_filters(body: &str) -> String {
    let segments = split_pipes(body);
    let mut out = String::with_capacity(body.len() + 8);
    for (index, segment) in segments.iter().enumerate() {
        if index == 0 {
            out.push_str(segment);
            continue;
        }
        out.push('|');
        out.push_str(&translate_call(segment));
    }
    out
}

/// Split on single `|` characters that are outside quotes. `||` is kept.
fn split_pipes(body: &str) -> Vec<&str> {
    let bytes = body.as_bytes();
    let mut segments = Vec::new();
    let mut quote: Option<u8> = None;
    let mut last = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' {
                i += 1;
            } else if b == q {
                quote = None;
            }
        } else if b == b'\'' || b == b'"' {
            quote = Some(b);
        } else if b == b'|' {
            if bytes.get(i + 1) == Some(&b'|') {
                i += 1;
            } else {
                segments.push(&body[last..i]);
                last = i + 1;
            }
        }
        i += 1;
    }
    segments.push(&body[last..]);
    segments
}

/// `" truncate: 10, '~' "` becomes `" truncate(10, '~') "`.
fn translate_call(segment: &str) -> String {
    let leading = segment.len() - segment.trim_start().len();
    let trimmed = segment.trim();
    let name_len = trimmed
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(trimmed.len());
    let (name, after) = trimmed.split_at(name_len);
    let after_name = after.trim_start();

    match after_name.strip_prefix(':') {
        Some(args) if !name.is_empty() => {
            format!("{}{}({}) ", &segment[..leading], name, args.trim())
        }
        _ => segment.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_call_with_arguments() {
        assert_eq!(
            to_engine_syntax("Hi {{ name | truncate: 10, '~' }}!", OutputMode::Plain),
            "Hi {{ name | truncate(10, '~') }}!"
        );
    }

    #[test]
    fn test_default_filter() {
        assert_eq!(
            to_engine_syntax("{{payload.name | default: 'valued customer'}}", OutputMode::Plain),
            "{{payload.name | default('valued customer') }}"
        );
    }

    #[test]
    fn test_bare_filters_untouched() {
        assert_eq!(
            to_engine_syntax("{{ name | upcase | strip }}", OutputMode::Plain),
            "{{ name | upcase | strip }}"
        );
    }

    #[test]
    fn test_chained_calls() {
        assert_eq!(
            to_engine_syntax("{{ a | append: '!' | default: 'x: y' }}", OutputMode::Plain),
            "{{ a | append('!') | default('x: y') }}"
        );
    }

    #[test]
    fn test_pipe_inside_string_literal_is_not_a_filter() {
        assert_eq!(
            to_engine_syntax("{{ a | default: 'x | y' }}", OutputMode::Plain),
            "{{ a | default('x | y') }}"
        );
    }

    #[test]
    fn test_embedded_mode_unescapes_quotes() {
        assert_eq!(
            to_engine_syntax(r#"{{ a | default: \"none\" }}"#, OutputMode::EmbeddedJson),
            r#"{{ a | default("none") }}"#
        );
    }

    #[test]
    fn test_comment_opener_in_text_is_preserved() {
        assert_eq!(
            to_engine_syntax("color {#fff}", OutputMode::Plain),
            "color {{ '{#' }}fff}"
        );
    }

    #[test]
    fn test_statement_opener_in_text_is_preserved() {
        assert_eq!(
            to_engine_syntax("Save 50{% now {{ name }}", OutputMode::Plain),
            "Save 50{{ '{%' }} now {{ name }}"
        );
        assert_eq!(
            to_engine_syntax("{%{#", OutputMode::Plain),
            "{{ '{%' }}{{ '{#' }}"
        );
    }

    #[test]
    fn test_hyphenated_segments_become_subscripts() {
        assert_eq!(
            to_engine_syntax("{{ steps.digest-step.events | size }}", OutputMode::Plain),
            "{{ steps['digest-step'].events | size }}"
        );
        assert_eq!(
            to_engine_syntax("{{ payload.items[0].sku-code }}", OutputMode::Plain),
            "{{ payload.items[0]['sku-code'] }}"
        );
        assert_eq!(
            to_engine_syntax("{{ a | default: steps.follow-up.text }}", OutputMode::Plain),
            "{{ a | default(steps['follow-up'].text) }}"
        );
    }

    #[test]
    fn test_operators_and_literals_are_not_subscripted() {
        assert_eq!(to_engine_syntax("{{ count - 1 }}", OutputMode::Plain), "{{ count - 1 }}");
        assert_eq!(
            to_engine_syntax("{{ a | default: 'x.y-z' }}", OutputMode::Plain),
            "{{ a | default('x.y-z') }}"
        );
        assert_eq!(to_engine_syntax("{{ -1 }}", OutputMode::Plain), "{{ -1 }}");
    }

    #[test]
    fn test_text_without_placeholders_is_unchanged() {
        assert_eq!(to_engine_syntax("plain text", OutputMode::Plain), "plain text");
        assert_eq!(to_engine_syntax("a-b.c-d", OutputMode::Plain), "a-b.c-d");
    }
}
