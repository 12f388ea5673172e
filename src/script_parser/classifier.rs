// WHY: Pure line classifiers for screenplay structure
// Scene/transition checks always run before cue detection so a heading is never a speaker

use anyhow::Result;

use super::normalization::collapse_whitespace;
use super::patterns::{ScreenplayPatterns, MAX_NAME_TOKENS, MIN_CAPS_RATIO};

/// Structural role of one logical line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    SceneOrTransition,
    /// Character cue carrying the canonical speaker name
    Cue(String),
    Prose,
}

/// Classifies trimmed lines against the process-wide screenplay patterns
#[derive(Debug, Clone, Copy)]
pub struct LineClassifier {
    patterns: &'static ScreenplayPatterns,
}

impl LineClassifier {
    pub fn new() -> Result<Self> {
        Ok(Self {
            patterns: ScreenplayPatterns::global()?,
        })
    }

    pub fn patterns(&self) -> &'static ScreenplayPatterns {
        self.patterns
    }

    pub fn classify(&self, line: &str) -> LineKind {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            LineKind::Blank
        } else if self.is_scene_or_transition(trimmed) {
            LineKind::SceneOrTransition
        } else if let Some(name) = self.classify_cue_line(trimmed) {
            LineKind::Cue(name)
        } else {
            LineKind::Prose
        }
    }

    /// Scene heading at line start or transition phrase at line end
    pub fn is_scene_or_transition(&self, line: &str) -> bool {
        let trimmed = line.trim();
        self.patterns.scene_heading.is_match(trimmed) || self.patterns.transition.is_match(trimmed)
    }

    /// Canonical speaker name when the line is a character cue
    pub fn classify_cue_line(&self, line: &str) -> Option<String> {
        let trimmed = line.trim();
        if trimmed.is_empty() || self.is_scene_or_transition(trimmed) {
            return None;
        }

        let cue = &self.patterns.cue_line;
        let mut caps = cue.create_captures();
        cue.captures(trimmed, &mut caps);
        if !caps.is_match() {
            return None;
        }
        let name_span = caps.get_group_by_name("name")?;

        let stripped = self.strip_name(&trimmed[name_span.range()]);
        let cleaned = stripped.to_uppercase();
        if cleaned.is_empty()
            || self.patterns.is_blacklisted(&cleaned)
            || cleaned.split_whitespace().count() > MAX_NAME_TOKENS
            || !is_mostly_caps(&stripped)
        {
            return None;
        }
        Some(cleaned)
    }

    /// Canonical form of a cue name: collapsed, tag-free, trimmed, uppercased
    pub fn clean_name(&self, raw: &str) -> String {
        self.strip_name(raw).to_uppercase()
    }

    /// Everything `clean_name` does except upper-casing
    fn strip_name(&self, raw: &str) -> String {
        let collapsed = collapse_whitespace(raw);
        let without_tag = match self.patterns.performance_tag_suffix.find(collapsed.as_str()) {
            Some(tag) => &collapsed[..tag.start()],
            None => collapsed.as_str(),
        };
        without_tag
            .trim_matches(|c: char| matches!(c, ' ' | '.' | '-'))
            .to_string()
    }
}

/// Share of uppercase letters among all alphabetic characters
pub fn caps_ratio(text: &str) -> Option<f64> {
    let (letters, upper) = text
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(letters, upper), c| {
            (letters + 1, upper + usize::from(c.is_uppercase()))
        });
    if letters == 0 {
        None
    } else {
        Some(upper as f64 / letters as f64)
    }
}

/// At least `MIN_CAPS_RATIO` of the letters are uppercase; false without letters
pub fn is_mostly_caps(text: &str) -> bool {
    caps_ratio(text).is_some_and(|ratio| ratio >= MIN_CAPS_RATIO)
}
