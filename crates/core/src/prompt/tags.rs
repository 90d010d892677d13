//! Tag-delimited scanning over prompt text.
//!
//! The prompt vocabulary is not well-formed XML. A section is the text between
//! an exact `<tag>` and the first `</tag>` after it; nesting of same-named
//! tags and escaping are not supported. Every function here is total.

use std::sync::OnceLock;

use regex::Regex;

static OPEN_TAG: OnceLock<Option<Regex>> = OnceLock::new();

fn open_tag_pattern() -> Option<&'static Regex> {
    OPEN_TAG.get_or_init(|| Regex::new(r"<([A-Za-z0-9_][A-Za-z0-9_.\-]*)>").ok()).as_ref()
}

/// Byte span `(start, inner_start, inner_end, end)` of the first `<tag>` ...
/// `</tag>` pair at or after `from`.
fn find_span(text: &str, tag: &str, from: usize) -> Option<(usize, usize, usize, usize)> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");

    let start = from + text.get(from..)?.find(&open)?;
    let inner_start = start + open.len();
    let inner_end = inner_start + text[inner_start..].find(&close)?;
    Some((start, inner_start, inner_end, inner_end + close.len()))
}

/// Inner text of the first `<tag>` section, untrimmed.
pub fn section<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
    find_span(text, tag, 0).map(|(_, inner_start, inner_end, _)| &text[inner_start..inner_end])
}

/// Inner text of every non-overlapping `<tag>` section, in order.
pub fn sections<'a>(text: &'a str, tag: &str) -> Vec<&'a str> {
    let mut found = Vec::new();
    let mut cursor = 0;
    while let Some((_, inner_start, inner_end, end)) = find_span(text, tag, cursor) {
        found.push(&text[inner_start..inner_end]);
        cursor = end;
    }
    found
}

pub fn contains_tag(text: &str, tag: &str) -> bool {
    text.contains(&format!("<{tag}>"))
}

/// `text` with its first complete `<tag>` section cut out.
pub fn without_section(text: &str, tag: &str) -> String {
    match find_span(text, tag, 0) {
        Some((start, _, _, end)) => format!("{}{}", &text[..start], &text[end..]),
        None => text.to_string(),
    }
}

/// Immediate child elements as `(tag_name, inner_text)` pairs. Anything
/// between a child's opening tag and its matching close is skipped, so nested
/// tags are never reported as siblings.
pub fn child_elements(text: &str) -> Vec<(&str, &str)> {
    let Some(pattern) = open_tag_pattern() else {
        return Vec::new();
    };

    let mut children = Vec::new();
    let mut cursor = 0;
    while let Some(captures) = pattern.captures_at(text, cursor) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            break;
        };
        let close = format!("</{}>", name.as_str());
        match text[whole.end()..].find(&close) {
            Some(offset) => {
                let inner_end = whole.end() + offset;
                children.push((name.as_str(), &text[whole.end()..inner_end]));
                cursor = inner_end + close.len();
            }
            None => cursor = whole.end(),
        }
    }
    children
}

/// Removes the indentation shared by all non-blank lines, then trims.
pub fn clean_text(raw: &str) -> String {
    let indent = raw
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let dedented: Vec<&str> = raw
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else if line.is_char_boundary(indent) && line[..indent].trim().is_empty() {
                &line[indent..]
            } else {
                line.trim_start()
            }
        })
        .collect();

    dedented.join("\n").trim().to_string()
}

/// Cleaned text of the first `<tag>` section, or `""`.
pub fn text_of(text: &str, tag: &str) -> String {
    section(text, tag).map(clean_text).unwrap_or_default()
}

/// Cleaned, non-empty texts of every `<tag>` section.
pub fn texts_of(text: &str, tag: &str) -> Vec<String> {
    sections(text, tag).into_iter().map(clean_text).filter(|value| !value.is_empty()).collect()
}
