// Screenplay excerpts with known structure
// WHY: Deterministic inputs shared by batch and CLI tests

/// Short two-hander with a scene heading, a parenthetical and a wrapped line
pub const KITCHEN_SCENE: &str = "\
INT. KITCHEN - DAY

JOHN
(stirring)
What's cooking?

MARY
Soup. It was
supposed to be a surprise.
";

/// Speakers of KITCHEN_SCENE in block order
pub const KITCHEN_SPEAKERS: &[&str] = &["JOHN", "MARY"];

/// Extracted text split across pages with a form feed
pub const PAGED_SCENE: &str = "ANNA\nWho's there?\n\x0cBEN (O.S.)\nOnly me.\n";

/// Prose with no cue lines at all
pub const NO_DIALOGUE: &str = "It was a dark and stormy night.\nNobody spoke.\n";
