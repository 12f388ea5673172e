// WHY: Extraction reflow breaks prose across physical lines; classifiers need logical lines
// A wrapped fragment can look like a name on its own, so merging runs first

use tracing::debug;

use super::classifier::LineClassifier;

/// Split raw text into physical lines on \n, \r\n, \r and form feed
pub fn split_physical_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let normalized = text.replace("\r\n", "\n");
    let mut lines: Vec<String> = normalized
        .split(['\n', '\r', '\x0c', '\u{2028}', '\u{2029}'])
        .map(str::to_string)
        .collect();
    // A trailing terminator does not open another line
    if normalized.ends_with(['\n', '\r', '\x0c', '\u{2028}', '\u{2029}']) {
        lines.pop();
    }
    lines
}

/// Rejoin soft-wrapped prose into logical lines
///
/// Blank lines, cue lines and scene/transition lines stand alone; any other line
/// absorbs the physical lines after it until one of those is reached.
pub fn merge_soft_wraps<S: AsRef<str>>(classifier: &LineClassifier, lines: &[S]) -> Vec<String> {
    let mut merged = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        let current = lines[i].as_ref().trim_end();

        if current.is_empty() {
            merged.push(String::new());
            i += 1;
            continue;
        }

        if classifier.classify_cue_line(current).is_some() || classifier.is_scene_or_transition(current) {
            merged.push(current.to_string());
            i += 1;
            continue;
        }

        let mut buffer = current.to_string();
        let mut j = i + 1;
        while j < lines.len() {
            let next = lines[j].as_ref().trim();
            if next.is_empty()
                || classifier.classify_cue_line(next).is_some()
                || classifier.is_scene_or_transition(next)
            {
                break;
            }
            join_wrapped(&mut buffer, next);
            j += 1;
        }
        merged.push(buffer);
        i = j;
    }

    debug!("Merged {} physical lines into {} logical lines", lines.len(), merged.len());
    merged
}

/// Hyphenated wraps join directly, everything else with one space
fn join_wrapped(buffer: &mut String, next: &str) {
    if buffer.ends_with('-') {
        buffer.pop();
    } else {
        buffer.push(' ');
    }
    buffer.push_str(next);
}
