//! Text escaping shared by the sinks.
//!
//! Plain-text cell values go through one normalization before any sink sees
//! them:
//!
//! 1. surrounding whitespace and control characters are trimmed
//! 2. the text is escaped into its literal-visible form (`\t`, `\r`, `\n`,
//!    `\uXXXX` ...)
//! 3. escaped tabs become four spaces, escaped carriage returns one space
//! 4. the literal form is unescaped again, which restores embedded newlines
//!
//! Only newlines survive the round trip; tabs and carriage returns are
//! rewritten on purpose.

use std::borrow::Cow;

/// Fragment marking a custom-grid link produced by linked-field lookups.
pub const CUSTOM_GRID_LINK: &str = "<a class='custom_grid' href='";
/// Fragment marking a custom-grid property list.
pub const CUSTOM_GRID_PROPERTY: &str = "<div class='custom_grid'>";

/// Escape control characters, quotes and backslashes into literal form.
pub fn escape_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

/// Reverse [`escape_literal`]. Unknown escapes yield the escaped character.
pub fn unescape_literal(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(c) => out.push(c),
                    None => {
                        out.push('u');
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Steps 1-3 of the cell normalization: the literal-visible form with tabs
/// and carriage returns rewritten.
pub fn escape_cell_text(raw: &str) -> String {
    let escaped = escape_literal(trim_control(raw));
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('t') => out.push_str("    "),
            Some('r') => out.push(' '),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Full normalization applied to every plain-text value.
pub fn normalize_cell_text(raw: &str) -> String {
    unescape_literal(&escape_cell_text(raw))
}

/// Trim whitespace and control characters at both ends.
pub fn trim_control(raw: &str) -> &str {
    raw.trim_matches(|c: char| c <= ' ')
}

/// Entity-escape `& < > " '` for markup output.
pub fn escape_markup(raw: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(raw)
}

/// Whether the text carries a custom-grid link or property fragment.
pub fn is_custom_grid_fragment(text: &str) -> bool {
    text.contains(CUSTOM_GRID_LINK) || text.contains(CUSTOM_GRID_PROPERTY)
}

/// Extract the text between tags, joined with `", "`.
///
/// `<div class='custom_grid'>a</div><div class='custom_grid'>b</div>` becomes
/// `a, b`. Text before the first tag is ignored.
pub fn strip_tags(html: &str) -> String {
    let mut entries = Vec::new();
    let mut current: Option<String> = None;
    for ch in html.chars() {
        match ch {
            '>' => current = Some(String::new()),
            '<' => {
                if let Some(text) = current.take() {
                    if !text.is_empty() {
                        entries.push(text);
                    }
                }
            }
            c => {
                if let Some(text) = current.as_mut() {
                    text.push(c);
                }
            }
        }
    }
    entries.join(", ")
}

/// Render linked-field entries the way custom-grid lookups deliver them.
pub fn custom_grid_list<I, S>(entries: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .map(|e| format!("{}{}</div>", CUSTOM_GRID_PROPERTY, e.as_ref()))
        .collect()
}

/// Uppercase the first character, as used for headers without a title.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
