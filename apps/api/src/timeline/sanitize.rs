//! Strips the lightweight markup Telegram-style channels embed in post text.
//!
//! Links survive as visible `label (url)` text; emphasis and code markers are
//! dropped in favour of their inner content.

use std::sync::LazyLock;

use regex::Regex;

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[([^\]]+)\]\((https?://[^\s)]+)\)").unwrap());
static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());
static UNDERLINE_BOLD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"__(.*?)__").unwrap());
static STRIKE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"~~(.*?)~~").unwrap());
static CODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)`{1,3}(.*?)`{1,3}").unwrap());
static TRAILING_SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+\n").unwrap());
static BLANK_LINES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

const ZERO_WIDTH_SPACE: char = '\u{200b}';

/// Returns `input` with markup removed and whitespace normalized.
/// `None` yields an empty string.
///
/// Passes repeat until the text stops changing: unwrapping one construct can
/// expose another (a link nested in a link label, italics inside code).
/// Every pass that changes the text also shortens it, so this terminates.
pub fn strip_telegram_formatting(input: Option<&str>) -> String {
    let text = match input {
        Some(t) if !t.is_empty() => t,
        _ => return String::new(),
    };

    let mut current = strip_once(text);
    loop {
        let next = strip_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_once(text: &str) -> String {
    let text = LINK_RE.replace_all(text, "$1 ($2)");
    let text = BOLD_RE.replace_all(&text, "$1");
    let text = UNDERLINE_BOLD_RE.replace_all(&text, "$1");
    let text = STRIKE_RE.replace_all(&text, "$1");
    let text = CODE_RE.replace_all(&text, "$1");
    let text = strip_underscore_italics(&text);

    let text = text.replace(ZERO_WIDTH_SPACE, "");
    let text = TRAILING_SPACE_RE.replace_all(&text, "\n");
    let text = BLANK_LINES_RE.replace_all(&text, "\n\n");

    text.trim().to_string()
}

/// Removes `_x_` italics whose opening underscore starts the text or follows
/// whitespace, and whose closing underscore ends the text or precedes
/// whitespace. The inner span is the shortest such match and never crosses a
/// newline, so `snake_case_names` are left alone.
fn strip_underscore_italics(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let opens = chars[i] == '_' && (i == 0 || chars[i - 1].is_whitespace());
        if opens {
            if let Some(close) = find_italic_close(&chars, i) {
                out.extend(&chars[i + 1..close]);
                i = close + 1;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }

    out
}

fn find_italic_close(chars: &[char], open: usize) -> Option<usize> {
    // At least one character of content before the closing underscore.
    let mut j = open + 2;
    while j < chars.len() {
        if chars[j - 1] == '\n' {
            return None;
        }
        if chars[j] == '_' && chars.get(j + 1).map_or(true, |c| c.is_whitespace()) {
            return Some(j);
        }
        j += 1;
    }
    None
}
