// WHY: Read-only views over a finished parse for listing and per-character retrieval

use std::collections::HashMap;

use super::normalization::normalize_name_query;
use super::{DialogueBlock, ScriptParse};

/// Ordering for `list_characters`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharacterOrder {
    /// Descending block count; ties keep first-appearance order
    #[default]
    Frequency,
    Alphabetical,
}

/// Canonical character names in the requested order
pub fn list_characters(parse: &ScriptParse, order: CharacterOrder) -> Vec<String> {
    match order {
        CharacterOrder::Alphabetical => parse.characters().keys().cloned().collect(),
        CharacterOrder::Frequency => {
            let first_seen = first_appearance(parse.blocks());
            let mut names: Vec<String> = parse.characters().keys().cloned().collect();
            names.sort_by(|a, b| {
                let count_a = parse.character_count(a);
                let count_b = parse.character_count(b);
                count_b
                    .cmp(&count_a)
                    .then_with(|| first_seen.get(a.as_str()).cmp(&first_seen.get(b.as_str())))
            });
            names
        }
    }
}

/// Character with the most blocks, ties going to whoever speaks first
pub fn top_character(parse: &ScriptParse) -> Option<&str> {
    let first_seen = first_appearance(parse.blocks());
    parse
        .characters()
        .iter()
        .min_by(|(a, count_a), (b, count_b)| {
            count_b
                .cmp(count_a)
                .then_with(|| first_seen.get(a.as_str()).cmp(&first_seen.get(b.as_str())))
        })
        .map(|(name, _)| name.as_str())
}

/// Inclusive `(start_line, end_line)` spans of the blocks a query resolves to
///
/// Lines index `ScriptParse::lines`; `end_line` never precedes `start_line`.
pub fn dialogue_spans(parse: &ScriptParse, character: &str) -> Vec<(usize, usize)> {
    blocks_for_character(parse, character)
        .into_iter()
        .map(|block| (block.start_line, block.end_line.max(block.start_line)))
        .collect()
}

/// Block index at which each speaker first talks
fn first_appearance(blocks: &[DialogueBlock]) -> HashMap<&str, usize> {
    let mut first_seen = HashMap::new();
    for (index, block) in blocks.iter().enumerate() {
        first_seen.entry(block.speaker.as_str()).or_insert(index);
    }
    first_seen
}

/// Blocks spoken by the character a query resolves to, in document order
///
/// Resolution order: exact canonical name, then alias membership, then
/// substring of a canonical speaker name.
pub fn blocks_for_character<'p>(parse: &'p ScriptParse, character: &str) -> Vec<&'p DialogueBlock> {
    let query = normalize_name_query(character);
    // An empty query would substring-match every speaker
    if query.is_empty() {
        return Vec::new();
    }

    if parse.characters().contains_key(&query) {
        return blocks_by_speaker(parse, &query);
    }

    let alias_owner = parse
        .character_aliases()
        .iter()
        .find(|(canonical, surfaces)| **canonical == query || surfaces.contains(&query))
        .map(|(canonical, _)| canonical.clone());
    if let Some(canonical) = alias_owner {
        return blocks_by_speaker(parse, &canonical);
    }

    parse
        .blocks()
        .iter()
        .filter(|block| block.speaker.contains(query.as_str()))
        .collect()
}

fn blocks_by_speaker<'p>(parse: &'p ScriptParse, speaker: &str) -> Vec<&'p DialogueBlock> {
    parse.blocks().iter().filter(|block| block.speaker == speaker).collect()
}
