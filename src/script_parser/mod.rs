// WHY: Entry point and data model for screenplay structure recovery
// raw text -> soft-wrap merge -> cue index -> segmentation -> alias enrichment

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

pub mod alias;
pub mod classifier;
pub mod normalization;
pub mod parenthetical;
pub mod patterns;
pub mod query;
pub mod segmenter;
pub mod soft_wrap;

pub use alias::{person_detector_for, PersonDetector, TitleCaseNameDetector, DEFAULT_PERSON_DETECTOR};
pub use classifier::{LineClassifier, LineKind};
pub use query::{blocks_for_character, dialogue_spans, list_characters, top_character, CharacterOrder};

use crate::source::TextSource;
use segmenter::{segment_blocks, CueIndex};
use soft_wrap::{merge_soft_wraps, split_physical_lines};

/// One contiguous span of a single character's spoken dialogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueBlock {
    /// Canonical uppercase speaker name
    pub speaker: String,
    /// Spoken text with parentheticals removed; never empty
    pub text: String,
    /// The span before parenthetical stripping
    pub raw_text: String,
    /// 0-based index of the first consumed logical line
    pub start_line: usize,
    /// 0-based index of the last consumed logical line
    pub end_line: usize,
    /// Stage directions in appearance order
    pub parentheticals: Vec<String>,
}

/// Immutable result of parsing one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptParse {
    characters: BTreeMap<String, usize>,
    blocks: Vec<DialogueBlock>,
    character_aliases: BTreeMap<String, Vec<String>>,
    lines: Vec<String>,
}

impl ScriptParse {
    /// Canonical name to number of dialogue blocks
    pub fn characters(&self) -> &BTreeMap<String, usize> {
        &self.characters
    }

    /// Dialogue blocks in document order
    pub fn blocks(&self) -> &[DialogueBlock] {
        &self.blocks
    }

    /// Canonical name to the surface forms unified into it (itself first)
    pub fn character_aliases(&self) -> &BTreeMap<String, Vec<String>> {
        &self.character_aliases
    }

    /// Merged logical lines the block line indices refer to
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn character_count(&self, name: &str) -> usize {
        self.characters.get(name).copied().unwrap_or(0)
    }

    pub fn aliases_of(&self, name: &str) -> &[String] {
        self.character_aliases.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Speakers in order of their first block
    pub fn speakers_in_order(&self) -> Vec<String> {
        first_seen_speakers(&self.blocks)
    }
}

/// Caller-facing parse configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Run the alias-unification post-pass
    pub alias_boost: bool,
    /// Registered person detector id; `None` or an unknown id skips alias enrichment
    pub person_detector: Option<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            alias_boost: true,
            person_detector: Some(DEFAULT_PERSON_DETECTOR.to_string()),
        }
    }
}

impl ParseOptions {
    /// Structural parse only
    pub fn without_aliases() -> Self {
        Self {
            alias_boost: false,
            person_detector: None,
        }
    }

    /// Detector instance for these options, if enabled and registered
    pub fn resolve_detector(&self) -> Option<Box<dyn PersonDetector>> {
        if !self.alias_boost {
            return None;
        }
        self.person_detector.as_deref().and_then(person_detector_for)
    }
}

/// Screenplay parser bound to the process-wide pattern set
#[derive(Debug, Clone, Copy)]
pub struct ScriptParser {
    classifier: LineClassifier,
}

impl ScriptParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            classifier: LineClassifier::new()?,
        })
    }

    pub fn classifier(&self) -> &LineClassifier {
        &self.classifier
    }

    /// Parse with the detector named in `options`
    pub fn parse(&self, text: &str, options: &ParseOptions) -> ScriptParse {
        let detector = options.resolve_detector();
        self.parse_with_detector(text, detector.as_deref())
    }

    /// Parse with an injected detector; `None` skips alias enrichment
    pub fn parse_with_detector(&self, text: &str, detector: Option<&dyn PersonDetector>) -> ScriptParse {
        let physical = split_physical_lines(text);
        let lines = merge_soft_wraps(&self.classifier, &physical);
        let cues = CueIndex::build(&self.classifier, &lines);
        let segmentation = segment_blocks(&self.classifier, &lines, &cues);

        let names = first_seen_speakers(&segmentation.blocks);
        let character_aliases = if segmentation.blocks.is_empty() {
            alias::default_aliases(&names)
        } else {
            alias::unify_aliases(&names, text, detector)
        };

        debug!(
            "Parsed {} physical lines: {} logical, {} cues",
            physical.len(),
            lines.len(),
            cues.cue_count()
        );
        info!(
            "Parsed script: {} blocks, {} characters",
            segmentation.blocks.len(),
            segmentation.characters.len()
        );

        ScriptParse {
            characters: segmentation.characters,
            blocks: segmentation.blocks,
            character_aliases,
            lines,
        }
    }

    /// Parse the full text of an extraction collaborator
    pub fn parse_source(&self, source: &dyn TextSource, options: &ParseOptions) -> Result<ScriptParse> {
        let text = source.full_text()?;
        Ok(self.parse(&text, options))
    }
}

fn first_seen_speakers(blocks: &[DialogueBlock]) -> Vec<String> {
    let mut seen = HashSet::new();
    blocks
        .iter()
        .filter(|block| seen.insert(block.speaker.as_str()))
        .map(|block| block.speaker.clone())
        .collect()
}

/// Parse one document's extracted text
///
/// Fails only if the built-in patterns cannot be compiled; every input,
/// including empty or structureless text, yields a parse.
pub fn parse_script_text(text: &str, options: &ParseOptions) -> Result<ScriptParse> {
    let parser = ScriptParser::new()?;
    Ok(parser.parse(text, options))
}
