// WHY: Whitespace normalization shared by name cleaning, dialogue cleanup and queries
// Kept separate from the classifiers so each rule is testable on its own

/// Collapse every whitespace run (line breaks included) to one space and trim
pub fn collapse_whitespace(text: &str) -> String {
    let mut buffer = String::with_capacity(text.len());
    collapse_whitespace_into(text, &mut buffer);
    buffer
}

/// Collapse whitespace into a supplied buffer
pub fn collapse_whitespace_into(text: &str, buffer: &mut String) {
    buffer.clear();
    buffer.reserve(text.len());

    let mut prev_was_space = false;
    for ch in text.trim().chars() {
        if ch.is_whitespace() {
            if !prev_was_space {
                buffer.push(' ');
                prev_was_space = true;
            }
        } else {
            buffer.push(ch);
            prev_was_space = false;
        }
    }
}

/// Collapse spaces and tabs within each line, trim each line, keep line breaks
pub fn collapse_inline_whitespace(text: &str) -> String {
    text.lines()
        .map(collapse_whitespace)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Canonical form of a character query: collapsed, trimmed, uppercased
pub fn normalize_name_query(query: &str) -> String {
    collapse_whitespace(query).to_uppercase()
}
