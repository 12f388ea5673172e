// WHY: Screenplay vocabulary and the compiled line patterns every parse shares
// Compiled once per process and only ever read afterwards

use anyhow::Result;
use regex_automata::meta::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::debug;

/// Phrases that end a transition line ("CUT TO:", "FADE OUT.")
pub const TRANSITION_PHRASES: &[&str] = &[
    "FADE IN:", "FADE OUT.", "FADE OUT", "FADE TO BLACK.", "CUT TO:", "CUT TO BLACK.",
    "DISSOLVE TO:", "SMASH CUT TO:", "MATCH CUT TO:", "JUMP CUT TO:", "WIPE TO:",
];

/// Performance annotations allowed in parentheses after a cue name
pub const PERFORMANCE_TAGS: &[&str] = &[
    "V.O.", "O.S.", "O.C.", "VO", "OS", "OC", "CONT'D", "CONT\u{2019}D", "CONTD", "CONT.",
    "PHONE", "ON PHONE", "FILTERED",
];

/// Cleaned names that look like cues but never name a character
pub const NAME_BLACKLIST: &[&str] = &[
    "INT", "EXT", "DAY", "NIGHT", "MORNING", "EVENING", "LATER", "MOMENTS LATER", "CONTINUOUS",
    "SAME", "CONTINUED", "CUT TO", "FADE IN", "FADE OUT", "DISSOLVE TO", "SMASH CUT TO",
    "MATCH CUT TO", "BACK TO SCENE", "INTERCUT", "INSERT", "FLASHBACK", "END FLASHBACK",
    "MONTAGE", "END MONTAGE", "SUPER", "TITLE", "CREDITS", "THE END",
];

/// Cleaned cue names with more tokens than this are prose
pub const MAX_NAME_TOKENS: usize = 5;

/// Minimum share of uppercase letters among the letters of a cue name
pub const MIN_CAPS_RATIO: f64 = 0.9;

/// Upper bound on characters handed to the person detector
pub const MAX_ALIAS_WINDOW_CHARS: usize = 500_000;

/// Scene headings: interior/exterior/establishing designators at line start
const SCENE_HEADING_PATTERN: &str = r"^(?:INT\.? ?/ ?EXT|I/E|INT|EXT|EST)\.?(?:\s|$)";

/// Name runs: letters, digits, spaces, periods, apostrophes, hyphens
const NAME_CHARS: &str = r"[\p{L}\p{N} .'\u{2019}\-]";

/// Shortest parenthesized run, no nesting
const PARENTHETICAL_PATTERN: &str = r"\([^)]+\)";

static PATTERNS: OnceLock<ScreenplayPatterns> = OnceLock::new();

/// Compiled classification patterns plus the blacklist lookup
#[derive(Debug)]
pub struct ScreenplayPatterns {
    pub scene_heading: Regex,
    pub transition: Regex,
    pub cue_line: Regex,
    pub performance_tag_suffix: Regex,
    pub parenthetical: Regex,
    blacklist: HashSet<&'static str>,
}

impl ScreenplayPatterns {
    /// Compile the full pattern set from the vocabulary constants
    pub fn compile() -> Result<Self> {
        let tags = alternation(PERFORMANCE_TAGS);
        let transitions = alternation(TRANSITION_PHRASES);

        let transition_pattern = format!(r"(?:{transitions})\s*$");
        let tag_group = format!(r"\s*\((?i:{tags})\)");
        let cue_pattern = format!(
            r"^(?P<name>{NAME_CHARS}{{2,}}(?: {NAME_CHARS}+){{0,3}})(?:{tag_group})?\s*$"
        );
        let tag_suffix_pattern = format!(r"{tag_group}\s*$");

        debug!("Compiling screenplay patterns ({} tags, {} transitions)", PERFORMANCE_TAGS.len(), TRANSITION_PHRASES.len());

        Ok(Self {
            scene_heading: Regex::new(SCENE_HEADING_PATTERN)?,
            transition: Regex::new(&transition_pattern)?,
            cue_line: Regex::new(&cue_pattern)?,
            performance_tag_suffix: Regex::new(&tag_suffix_pattern)?,
            parenthetical: Regex::new(PARENTHETICAL_PATTERN)?,
            blacklist: NAME_BLACKLIST.iter().copied().collect(),
        })
    }

    /// Process-wide pattern set, compiled on first use
    pub fn global() -> Result<&'static Self> {
        if let Some(patterns) = PATTERNS.get() {
            return Ok(patterns);
        }
        let compiled = Self::compile()?;
        Ok(PATTERNS.get_or_init(|| compiled))
    }

    pub fn is_blacklisted(&self, cleaned_name: &str) -> bool {
        self.blacklist.contains(cleaned_name)
    }
}

/// Join literals into a regex alternation, escaping metacharacters
fn alternation(literals: &[&str]) -> String {
    literals
        .iter()
        .map(|literal| escape_literal(literal))
        .collect::<Vec<_>>()
        .join("|")
}

fn escape_literal(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len() * 2);
    for ch in literal.chars() {
        if matches!(
            ch,
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$' | '#' | '&' | '-' | '~'
        ) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
