// WHY: Stage directions inside dialogue are performance notes, not spoken text

use super::normalization::collapse_inline_whitespace;
use super::patterns::ScreenplayPatterns;

/// Dialogue span split into spoken text and its parentheticals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrippedDialogue {
    pub text: String,
    pub parentheticals: Vec<String>,
}

/// Remove every `(...)` run from a dialogue span, recording inner text in order
pub fn strip_parentheticals(patterns: &ScreenplayPatterns, raw: &str) -> StrippedDialogue {
    let mut parentheticals = Vec::new();
    let mut remaining = String::with_capacity(raw.len());
    let mut last_end = 0;

    for found in patterns.parenthetical.find_iter(raw) {
        remaining.push_str(&raw[last_end..found.start()]);
        let inner = raw[found.start() + 1..found.end() - 1].trim();
        if !inner.is_empty() {
            parentheticals.push(inner.to_string());
        }
        last_end = found.end();
    }
    remaining.push_str(&raw[last_end..]);

    StrippedDialogue {
        text: collapse_inline_whitespace(&remaining),
        parentheticals,
    }
}
