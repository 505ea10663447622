//! Rendering generated rules as BUILD file text.

use std::cmp::Reverse;
use std::fmt::Write as _;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::build_file::BuildFile;
use crate::core::rule::{AttrValue, LoadInfo, Rule};

const INDENT: &str = "    ";

/// Comment marking an attribute the generator must leave alone.
const KEEP_COMMENT: &str = "# keep";

static ARG_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\s|#[^\n]*)*([A-Za-z_][A-Za-z0-9_]*)\s*=").unwrap());

/// Render a rule call. `name` comes first, then attributes in name order.
pub fn render_rule(rule: &Rule) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}(", rule.kind());
    let _ = writeln!(out, "{INDENT}name = {},", quote(rule.name()));

    for (key, value) in rule.attrs() {
        let _ = writeln!(out, "{INDENT}{key} = {},", render_value(value));
    }

    out.push_str(")\n");
    out
}

fn render_value(value: &AttrValue) -> String {
    let mut out = String::new();
    match value {
        AttrValue::String(s) => out.push_str(&quote(s)),
        AttrValue::List(items) => render_list(&mut out, items),
        AttrValue::Glob(patterns) => {
            out.push_str("glob(");
            render_list(&mut out, patterns);
            out.push(')');
        }
    }
    out
}

/// Render a `load()` statement.
pub fn render_load(name: &str, symbols: &[&str]) -> String {
    let mut out = format!("load({}", quote(name));
    for symbol in symbols {
        let _ = write!(out, ", {}", quote(symbol));
    }
    out.push_str(")\n");
    out
}

/// Load statements needed by `rules` that `existing` does not provide yet.
///
/// Symbols of loads sharing a `.bzl` file are merged into one statement,
/// in the order the rules use them.
pub fn missing_loads(rules: &[Rule], loads: &[LoadInfo], existing: Option<&BuildFile>) -> String {
    let mut needed: Vec<(&str, Vec<&str>)> = Vec::new();

    for rule in rules {
        let kind = rule.kind().as_str();
        let Some(load) = loads.iter().find(|l| l.symbols.contains(&kind)) else {
            continue;
        };
        if existing.is_some_and(|f| f.is_loaded(load.name, kind)) {
            continue;
        }
        match needed.iter_mut().find(|(name, _)| *name == load.name) {
            Some((_, symbols)) => {
                if !symbols.contains(&kind) {
                    symbols.push(kind);
                }
            }
            None => needed.push((load.name, vec![kind])),
        }
    }

    needed
        .iter()
        .map(|(name, symbols)| render_load(name, symbols))
        .collect()
}

/// Render a complete BUILD file for freshly generated rules.
pub fn render_file(rules: &[Rule], loads: &[LoadInfo]) -> String {
    let mut out = missing_loads(rules, loads, None);
    for rule in rules {
        out.push('\n');
        out.push_str(&render_rule(rule));
    }
    out
}

/// Bring an existing BUILD file up to date.
///
/// `updates` are fresh renditions of rules the file already declares; they
/// are merged into their calls in place. `rules` are new and appended at
/// the end. Missing loads are inserted before the first non-comment line
/// so that they stay ahead of any rule that uses them.
pub fn update_file(
    existing: &BuildFile,
    rules: &[Rule],
    updates: &[Rule],
    loads: &[LoadInfo],
) -> String {
    let mut merged: Vec<(Range<usize>, String)> = updates
        .iter()
        .filter_map(|rule| {
            let declared = existing.declared(rule.kind().as_str(), rule.name())?;
            let call = &existing.content[declared.span.clone()];
            Some((declared.span.clone(), merge_rule(call, rule)))
        })
        .collect();
    merged.sort_by_key(|(span, _)| Reverse(span.start));

    let mut content = existing.content.clone();
    for (span, text) in merged {
        content.replace_range(span, &text);
    }

    let new_loads = missing_loads(rules, loads, Some(existing));
    let split = header_len(&content);
    let mut out = String::with_capacity(content.len() + new_loads.len() + 256);
    out.push_str(&content[..split]);
    out.push_str(&new_loads);
    out.push_str(&content[split..]);

    if !rules.is_empty() && !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    for rule in rules {
        out.push('\n');
        out.push_str(&render_rule(rule));
    }
    out
}

/// Merge a generated rule into the text of an existing call.
///
/// Mergeable attributes of the rule's kind are overwritten, or dropped
/// when the generated rule no longer sets them. Other generated attributes
/// are only added when the call lacks them. Attributes marked `# keep` are
/// never touched.
pub fn merge_rule(call: &str, rule: &Rule) -> String {
    let mergeable = rule.kind().info().mergeable_attrs;
    let mut out = call.to_string();

    for (key, value) in rule.attrs() {
        out = match find_arg(&out, key) {
            Some(arg) if arg.keep => continue,
            Some(arg) if mergeable.contains(&key) => {
                format!("{}{}{}", &out[..arg.value.start], render_value(value), &out[arg.value.end..])
            }
            Some(_) => continue,
            None => insert_arg(&out, key, value),
        };
    }

    for key in mergeable.iter().filter(|key| rule.attr(key).is_none()) {
        if let Some(arg) = find_arg(&out, key).filter(|arg| !arg.keep) {
            out = remove_arg(&out, &arg);
        }
    }
    out
}

/// One top-level argument of a call, split at top-level commas.
struct Segment {
    range: Range<usize>,
    comma: Option<usize>,
}

/// A `key = value` argument located in a call.
struct Arg {
    key_start: usize,
    value: Range<usize>,
    /// End of the argument, past its comma if it has one
    end: usize,
    keep: bool,
}

/// Top-level argument segments of a call and the offset of its closing
/// paren (the text length when unterminated).
fn scan_args(call: &str) -> (Vec<Segment>, usize) {
    let Some(open) = call.find('(') else {
        return (Vec::new(), call.len());
    };

    let mut segments = Vec::new();
    let mut seg_start = open + 1;
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut in_comment = false;
    let mut escaped = false;

    for (i, ch) in call[open + 1..].char_indices() {
        let i = i + open + 1;
        if in_comment {
            in_comment = ch != '\n';
            continue;
        }
        if let Some(q) = in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                in_string = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => in_string = Some(ch),
            '#' => in_comment = true,
            '(' | '[' | '{' => depth += 1,
            ')' if depth == 0 => {
                segments.push(Segment {
                    range: seg_start..i,
                    comma: None,
                });
                return (segments, i);
            }
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                segments.push(Segment {
                    range: seg_start..i,
                    comma: Some(i),
                });
                seg_start = i + 1;
            }
            _ => {}
        }
    }

    segments.push(Segment {
        range: seg_start..call.len(),
        comma: None,
    });
    (segments, call.len())
}

/// Offset just past the last character of `text` that is neither
/// whitespace nor part of a comment; 0 if there is none.
fn content_end(text: &str) -> usize {
    let mut end = 0;
    let mut in_string: Option<char> = None;
    let mut in_comment = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if in_comment {
            in_comment = ch != '\n';
            continue;
        }
        if let Some(q) = in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                in_string = None;
            }
            end = i + ch.len_utf8();
            continue;
        }
        match ch {
            '#' => in_comment = true,
            '"' | '\'' => {
                in_string = Some(ch);
                end = i + ch.len_utf8();
            }
            c if c.is_whitespace() => {}
            _ => end = i + ch.len_utf8(),
        }
    }
    end
}

fn find_arg(call: &str, key: &str) -> Option<Arg> {
    let (segments, _) = scan_args(call);
    segments.into_iter().find_map(|seg| {
        let text = &call[seg.range.clone()];
        let caps = ARG_KEY_RE.captures(text)?;
        let (name, whole) = (caps.get(1)?, caps.get(0)?);
        if name.as_str() != key {
            return None;
        }

        let key_start = seg.range.start + name.start();
        let after_eq = &text[whole.end()..];
        let value_start = seg.range.start + whole.end() + (after_eq.len() - after_eq.trim_start().len());
        let value_end = (seg.range.start + content_end(text)).max(value_start);
        let end = seg.comma.map_or(value_end, |c| c + 1);
        let line_end = call[end..].find('\n').map_or(call.len(), |n| end + n);

        Some(Arg {
            key_start,
            value: value_start..value_end,
            end,
            keep: call[key_start..line_end].contains(KEEP_COMMENT),
        })
    })
}

fn insert_arg(call: &str, key: &str, value: &AttrValue) -> String {
    let (segments, close) = scan_args(call);
    let line = format!("{INDENT}{key} = {},\n", render_value(value));

    // The last argument needs a comma before a new one can follow it
    let comma_at = segments
        .iter()
        .rev()
        .find(|seg| content_end(&call[seg.range.clone()]) > 0)
        .filter(|seg| seg.comma.is_none())
        .map(|seg| seg.range.start + content_end(&call[seg.range.clone()]));

    let before = &call[..close];
    let line_start = before.rfind('\n').map_or(0, |n| n + 1);
    let own_line = line_start > 0 && before[line_start..].trim().is_empty();

    let mut out = String::with_capacity(call.len() + line.len() + 2);
    let mut cursor = 0;
    if let Some(at) = comma_at {
        out.push_str(&call[..at]);
        out.push(',');
        cursor = at;
    }
    if own_line {
        out.push_str(&call[cursor..line_start]);
        out.push_str(&line);
        out.push_str(&call[line_start..]);
    } else {
        out.push_str(&call[cursor..close]);
        out.push('\n');
        out.push_str(&line);
        out.push_str(&call[close..]);
    }
    out
}

fn remove_arg(call: &str, arg: &Arg) -> String {
    let line_start = call[..arg.key_start].rfind('\n').map_or(0, |n| n + 1);
    let own_line = call[line_start..arg.key_start].trim().is_empty();
    let start = if own_line { line_start } else { arg.key_start };

    let mut stop = arg.end;
    if own_line {
        if let Some(nl) = call[arg.end..].find('\n') {
            if call[arg.end..arg.end + nl].trim().is_empty() {
                stop = arg.end + nl + 1;
            }
        }
    }
    format!("{}{}", &call[..start], &call[stop..])
}

/// Byte length of the leading block of comment and blank lines.
fn header_len(content: &str) -> usize {
    let mut len = 0;
    for line in content.split_inclusive('\n') {
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            break;
        }
        len += line.len();
    }
    len
}

fn render_list(out: &mut String, items: &[String]) {
    match items {
        [] => out.push_str("[]"),
        [single] => {
            let _ = write!(out, "[{}]", quote(single));
        }
        _ => {
            out.push_str("[\n");
            for item in items {
                let _ = writeln!(out, "{INDENT}{INDENT}{},", quote(item));
            }
            let _ = write!(out, "{INDENT}]");
        }
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
