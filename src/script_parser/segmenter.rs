// WHY: Line-consuming state machine pairing cue lines with the dialogue that follows
// Cue positions are indexed up front so every lookahead is O(1)

use std::collections::BTreeMap;
use tracing::debug;

use super::classifier::LineClassifier;
use super::parenthetical::strip_parentheticals;
use super::DialogueBlock;

/// Canonical cue name per logical line position, `None` where the line is not a cue
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CueIndex {
    names: Vec<Option<String>>,
}

impl CueIndex {
    /// Classify every logical line once
    pub fn build<S: AsRef<str>>(classifier: &LineClassifier, lines: &[S]) -> Self {
        let names = lines
            .iter()
            .map(|line| classifier.classify_cue_line(line.as_ref()))
            .collect();
        Self { names }
    }

    pub fn name_at(&self, position: usize) -> Option<&str> {
        self.names.get(position).and_then(|name| name.as_deref())
    }

    pub fn is_cue(&self, position: usize) -> bool {
        self.name_at(position).is_some()
    }

    pub fn cue_count(&self) -> usize {
        self.names.iter().filter(|name| name.is_some()).count()
    }
}

/// Segmenter position in the walk
#[derive(Debug, Clone, PartialEq, Eq)]
enum SegmenterState {
    Scanning,
    /// Consuming dialogue for the speaker named on line `cue_line`
    InBlock { speaker: String, cue_line: usize },
}

/// Ordered dialogue blocks with per-speaker block counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmentation {
    pub blocks: Vec<DialogueBlock>,
    pub characters: BTreeMap<String, usize>,
}

/// Walk logical lines and emit one block per cue that is followed by spoken text
pub fn segment_blocks<S: AsRef<str>>(
    classifier: &LineClassifier,
    lines: &[S],
    cues: &CueIndex,
) -> Segmentation {
    let patterns = classifier.patterns();
    let mut segmentation = Segmentation::default();
    let mut state = SegmenterState::Scanning;
    let mut i = 0;

    while i < lines.len() {
        match state {
            SegmenterState::Scanning => {
                state = match cues.name_at(i) {
                    Some(speaker) => SegmenterState::InBlock {
                        speaker: speaker.to_string(),
                        cue_line: i,
                    },
                    None => {
                        i += 1;
                        SegmenterState::Scanning
                    }
                };
            }
            SegmenterState::InBlock { speaker, cue_line } => {
                let start = cue_line + 1;
                let mut end = start;
                while end < lines.len() {
                    let line = lines[end].as_ref();
                    if line.trim().is_empty() || cues.is_cue(end) || classifier.is_scene_or_transition(line) {
                        break;
                    }
                    end += 1;
                }

                let consumed = &lines[start..end];
                let raw_text = consumed
                    .iter()
                    .map(|line| line.as_ref())
                    .collect::<Vec<_>>()
                    .join("\n")
                    .trim()
                    .to_string();
                let stripped = strip_parentheticals(patterns, &raw_text);

                if !stripped.text.is_empty() {
                    let (start_line, end_line) = if consumed.is_empty() {
                        (cue_line, cue_line)
                    } else {
                        (start, end - 1)
                    };
                    *segmentation.characters.entry(speaker.clone()).or_insert(0) += 1;
                    segmentation.blocks.push(DialogueBlock {
                        speaker,
                        text: stripped.text,
                        raw_text,
                        start_line,
                        end_line,
                        parentheticals: stripped.parentheticals,
                    });
                }

                // The stopping line is left for the next scan step
                i = end;
                state = SegmenterState::Scanning;
            }
        }
    }

    debug!(
        "Segmented {} blocks for {} characters from {} cue lines",
        segmentation.blocks.len(),
        segmentation.characters.len(),
        cues.cue_count()
    );
    segmentation
}
