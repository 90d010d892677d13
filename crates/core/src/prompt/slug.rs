use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Tag-safe identifier for `value`: lowercase, diacritics stripped, every run
/// of characters outside `[a-z0-9]` collapsed to one `_`, outer `_` trimmed.
/// Returns `fallback` unchanged when nothing survives.
pub fn slugify(value: &str, fallback: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_separator = false;

    for ch in value.to_lowercase().nfd().filter(|ch| !is_combining_mark(*ch)) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.push(ch);
        } else {
            pending_separator = true;
        }
    }

    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}

/// Display label for a tag: `_`/`-` runs become single spaces and the first
/// character is uppercased.
pub fn format_label(value: &str) -> String {
    let mut spaced = String::with_capacity(value.len());
    let mut in_separator = false;

    for ch in value.chars() {
        if ch == '_' || ch == '-' {
            if !in_separator {
                spaced.push(' ');
            }
            in_separator = true;
        } else {
            in_separator = false;
            spaced.push(ch);
        }
    }

    let spaced = spaced.trim();
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
