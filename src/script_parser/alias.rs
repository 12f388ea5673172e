// WHY: Cue lines name the same character several ways ("JOHN", "JOHN SMITH");
// person mentions in the document text link those variants.
// Enrichment only: blocks and frequency counts are never touched here.

use anyhow::Result;
use regex_automata::meta::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

use super::patterns::MAX_ALIAS_WINDOW_CHARS;

/// Detector id used when the caller does not name one
pub const DEFAULT_PERSON_DETECTOR: &str = "titlecase";

/// Capability: find person-entity surface forms in free text
pub trait PersonDetector: Send + Sync {
    /// Identifier this detector is registered under
    fn id(&self) -> &str;

    /// Surface forms of every person mention, in any order, duplicates allowed
    fn detect_persons(&self, text: &str) -> Result<Vec<String>>;
}

/// Resolve a detector id to an instance; unknown ids or build failures yield `None`
pub fn person_detector_for(id: &str) -> Option<Box<dyn PersonDetector>> {
    match id {
        "titlecase" | "titlecase-names" => match TitleCaseNameDetector::new() {
            Ok(detector) => Some(Box::new(detector)),
            Err(e) => {
                warn!("Person detector '{}' failed to initialize: {}", id, e);
                None
            }
        },
        _ => {
            debug!("No person detector registered as '{}'", id);
            None
        }
    }
}

/// Honorifics that mark the following capitalized run as a person
const HONORIFICS: &[&str] = &["Mr", "Mrs", "Ms", "Miss", "Dr", "Prof", "Sir", "Madam", "Aunt", "Uncle"];

/// Capitalized words that start sentences or address people without naming anyone
const NON_NAME_WORDS: &[&str] = &[
    "A", "An", "And", "As", "At", "But", "By", "For", "From", "He", "Her", "Here", "His", "How", "I",
    "If", "In", "It", "Its", "Just", "Let", "My", "No", "Not", "Now", "Of", "Oh", "Ok", "Okay", "On",
    "Or", "Our", "She", "So", "That", "The", "Their", "Then", "There", "These", "They", "This",
    "Those", "To", "We", "Well", "What", "When", "Where", "Who", "Why", "With", "Yes", "You", "Your",
    "Hi", "Hello", "Hey", "Goodbye", "Please", "Thanks", "Sorry", "God", "Christ",
    "Day", "Night", "Later", "Continuous", "Int", "Ext", "Cut", "Fade",
];

/// Statistical person detector over title-case word runs
///
/// A run of capitalized words (split at common non-name words) counts as a
/// person when it recurs at least `min_mentions` times in the document, or
/// when an honorific precedes it.
#[derive(Debug)]
pub struct TitleCaseNameDetector {
    run_pattern: Regex,
    min_mentions: usize,
    non_names: HashSet<&'static str>,
    honorifics: HashSet<&'static str>,
}

impl TitleCaseNameDetector {
    pub fn new() -> Result<Self> {
        Self::with_min_mentions(2)
    }

    pub fn with_min_mentions(min_mentions: usize) -> Result<Self> {
        let word = r"\p{Lu}[\p{Ll}'\u{2019}]+\.?";
        let run_pattern = Regex::new(&format!(r"{word}(?:[ \t]+{word})*"))?;
        Ok(Self {
            run_pattern,
            min_mentions: min_mentions.max(1),
            non_names: NON_NAME_WORDS.iter().copied().collect(),
            honorifics: HONORIFICS.iter().copied().collect(),
        })
    }

    /// Split a capitalized run into candidate names, flagging honorific-led ones
    fn candidates<'t>(&self, run: &'t str, out: &mut Vec<(String, bool)>) {
        let mut current: Vec<&'t str> = Vec::new();
        let mut honorific = false;

        for word in run.split_whitespace() {
            let bare = word.trim_end_matches('.');
            if self.honorifics.contains(bare) {
                flush(&mut current, honorific, out);
                honorific = true;
                current.push(word);
            } else if self.non_names.contains(bare) {
                flush(&mut current, honorific, out);
                honorific = false;
            } else {
                current.push(word);
                // A sentence-final period ends the name
                if word.ends_with('.') {
                    flush(&mut current, honorific, out);
                    honorific = false;
                }
            }
        }
        flush(&mut current, honorific, out);
    }
}

fn flush(current: &mut Vec<&str>, honorific: bool, out: &mut Vec<(String, bool)>) {
    // A lone honorific is not a name
    let names_something = if honorific { current.len() > 1 } else { !current.is_empty() };
    if names_something {
        let surface = current.join(" ");
        out.push((surface.trim_end_matches('.').to_string(), honorific));
    }
    current.clear();
}

impl PersonDetector for TitleCaseNameDetector {
    fn id(&self) -> &str {
        DEFAULT_PERSON_DETECTOR
    }

    fn detect_persons(&self, text: &str) -> Result<Vec<String>> {
        let mut candidates = Vec::new();
        for run in self.run_pattern.find_iter(text) {
            self.candidates(&text[run.range()], &mut candidates);
        }

        let mut mentions: HashMap<&str, usize> = HashMap::new();
        let mut introduced: HashSet<&str> = HashSet::new();
        for (surface, honorific) in &candidates {
            *mentions.entry(surface.as_str()).or_insert(0) += 1;
            if *honorific {
                introduced.insert(surface.as_str());
            }
        }

        let mut seen = HashSet::new();
        let persons: Vec<String> = candidates
            .iter()
            .map(|(surface, _)| surface.as_str())
            .filter(|surface| mentions[surface] >= self.min_mentions || introduced.contains(surface))
            .filter(|surface| seen.insert(*surface))
            .map(str::to_string)
            .collect();

        debug!("Title-case detector found {} persons in {} runs", persons.len(), candidates.len());
        Ok(persons)
    }
}

/// Every character mapped only to itself
pub fn default_aliases<'a, I>(names: I) -> BTreeMap<String, Vec<String>>
where
    I: IntoIterator<Item = &'a String>,
{
    names.into_iter().map(|name| (name.clone(), vec![name.clone()])).collect()
}

/// Prefix of `text` holding at most `max_chars` characters
pub fn alias_window(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Map each uppercase name token (longer than one character) to its character
///
/// `names` is in first-appearance order; when two characters share a token the
/// later one owns it.
fn index_name_tokens(names: &[String]) -> HashMap<&str, &str> {
    let mut owners = HashMap::new();
    for name in names {
        for token in name.split_whitespace() {
            if token.chars().count() > 1 && is_upper_token(token) {
                owners.insert(token, name.as_str());
            }
        }
    }
    owners
}

/// Has cased letters and all of them are uppercase
fn is_upper_token(token: &str) -> bool {
    let mut cased = token.chars().filter(|c| c.is_lowercase() || c.is_uppercase()).peekable();
    cased.peek().is_some() && cased.all(char::is_uppercase)
}

/// Build the alias table for `names`, enriched by `detector` when one is available
pub fn unify_aliases(
    names: &[String],
    text: &str,
    detector: Option<&dyn PersonDetector>,
) -> BTreeMap<String, Vec<String>> {
    let mut aliases = default_aliases(names);
    let Some(detector) = detector else {
        return aliases;
    };
    if names.is_empty() {
        return aliases;
    }

    let owners = index_name_tokens(names);
    let window = alias_window(text, MAX_ALIAS_WINDOW_CHARS);
    let persons = match detector.detect_persons(window) {
        Ok(persons) => persons,
        Err(e) => {
            warn!("Person detector '{}' failed, skipping alias unification: {}", detector.id(), e);
            return aliases;
        }
    };

    let mut added = 0usize;
    for person in persons {
        let surface = person.to_uppercase();
        let tokens = surface
            .split_whitespace()
            .filter(|token| !token.is_empty() && token.chars().all(char::is_alphabetic));
        for token in tokens {
            if let Some(&canonical) = owners.get(token) {
                let list = aliases.entry(canonical.to_string()).or_default();
                if !list.contains(&surface) {
                    list.push(surface.clone());
                    added += 1;
                }
            }
        }
    }

    debug!("Alias unification added {} surface forms via '{}'", added, detector.id());
    aliases
}
