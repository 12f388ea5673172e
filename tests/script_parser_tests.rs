// Screenplay parser behaviour tests
// WHY: End-to-end checks through the public API, separate from per-module unit tests

use cueline::script_parser::parenthetical::strip_parentheticals;
use cueline::script_parser::patterns::ScreenplayPatterns;
use cueline::script_parser::{
    blocks_for_character, list_characters, CharacterOrder, ParseOptions, PersonDetector, ScriptParse, ScriptParser,
};
use std::sync::OnceLock;

// WHY: Single shared parser instance avoids recompiling patterns per test
static SHARED_PARSER: OnceLock<ScriptParser> = OnceLock::new();

fn get_parser() -> &'static ScriptParser {
    SHARED_PARSER.get_or_init(|| ScriptParser::new().unwrap())
}

fn parse(text: &str) -> ScriptParse {
    get_parser().parse(text, &ParseOptions::without_aliases())
}

const SCENE: &str = "\
INT. DINER - NIGHT

Rain streaks the windows. A neon sign
flickers over the counter.

SARAH CONNOR
(whispering)
They're here. We have to
go now.

KYLE
Where?

SARAH CONNOR
Out the back.

CUT TO:

EXT. ALLEY - CONTINUOUS

KYLE (O.S.)
Sarah, wait!
";

#[test]
fn test_two_speakers_in_order() {
    let result = parse("JOHN\nHello there.\n\nMARY\nHi John.");

    let blocks: Vec<_> = result.blocks().iter().map(|b| (b.speaker.as_str(), b.text.as_str())).collect();
    assert_eq!(blocks, vec![("JOHN", "Hello there."), ("MARY", "Hi John.")]);
    assert_eq!(result.characters().len(), 2);
    assert_eq!(result.character_count("JOHN"), 1);
    assert_eq!(result.character_count("MARY"), 1);
}

#[test]
fn test_scene_heading_is_skipped() {
    let result = parse("INT. KITCHEN - DAY\nJOHN\nWhat's cooking?");

    assert_eq!(result.blocks().len(), 1);
    assert_eq!(result.blocks()[0].speaker, "JOHN");
    assert_eq!(result.blocks()[0].text, "What's cooking?");
    assert!(!result.characters().contains_key("INT. KITCHEN - DAY"));
}

#[test]
fn test_voice_over_tag_stripped_from_cue() {
    let result = parse("JOHN (V.O.)\nI remember it well.");

    assert_eq!(result.blocks().len(), 1);
    assert_eq!(result.blocks()[0].speaker, "JOHN");
    assert_eq!(result.blocks()[0].text, "I remember it well.");
}

#[test]
fn test_parenthetical_extracted() {
    let result = parse("JOHN\n(angrily)\nGet out!");

    assert_eq!(result.blocks().len(), 1);
    assert_eq!(result.blocks()[0].text, "Get out!");
    assert_eq!(result.blocks()[0].parentheticals, vec!["angrily"]);
}

#[test]
fn test_sentence_case_prose_is_not_a_cue() {
    let sentence = "The old man walks slowly to the windows.";
    assert_eq!(sentence.chars().count(), 40);

    let classifier = get_parser().classifier();
    assert!(classifier.classify_cue_line(sentence).is_none());

    let result = parse(&format!("JOHN\nHello.\n\n{sentence}\nHe waits.\n"));
    assert_eq!(result.blocks().len(), 1);
    assert!(result.lines().iter().any(|line| line == "The old man walks slowly to the windows. He waits."));
}

#[test]
fn test_soft_wrapped_dialogue_merges() {
    let result = parse("JOHN\nHello there, I was\njust about to leave.\n");

    assert_eq!(result.lines(), ["JOHN", "Hello there, I was just about to leave."]);
    assert_eq!(result.blocks().len(), 1);
    assert_eq!(result.blocks()[0].text, "Hello there, I was just about to leave.");
}

#[test]
fn test_full_scene() {
    let result = parse(SCENE);

    let speakers: Vec<_> = result.blocks().iter().map(|b| b.speaker.as_str()).collect();
    assert_eq!(speakers, vec!["SARAH CONNOR", "KYLE", "SARAH CONNOR", "KYLE"]);
    assert_eq!(result.blocks()[0].text, "They're here. We have to go now.");
    assert_eq!(result.blocks()[0].parentheticals, vec!["whispering"]);
    assert_eq!(result.blocks()[3].text, "Sarah, wait!");
    assert_eq!(result.character_count("SARAH CONNOR"), 2);
    assert_eq!(result.character_count("KYLE"), 2);

    assert_eq!(
        list_characters(&result, CharacterOrder::Alphabetical),
        vec!["KYLE".to_string(), "SARAH CONNOR".to_string()]
    );
}

#[test]
fn test_query_by_first_name_substring() {
    let result = parse(SCENE);

    let blocks = blocks_for_character(&result, "  connor ");
    assert_eq!(blocks.len(), 2);
    assert!(blocks.iter().all(|b| b.speaker == "SARAH CONNOR"));
    assert!(blocks_for_character(&result, "NOBODY").is_empty());
}

#[test]
fn test_structureless_input_yields_empty_parse() {
    for text in ["", "\n\n\n", "just some lowercase prose\nspanning lines", "\u{0}\u{1}garbage"] {
        let result = parse(text);
        assert!(result.blocks().is_empty(), "unexpected blocks for {text:?}");
        assert!(result.characters().is_empty());
    }
}

struct ExplodingDetector;

impl PersonDetector for ExplodingDetector {
    fn id(&self) -> &str {
        "exploding"
    }

    fn detect_persons(&self, _text: &str) -> anyhow::Result<Vec<String>> {
        anyhow::bail!("model failed to load")
    }
}

#[test]
fn test_detector_failure_leaves_core_result_unchanged() {
    let with_failure = get_parser().parse_with_detector(SCENE, Some(&ExplodingDetector));
    let without = parse(SCENE);

    assert_eq!(with_failure.blocks(), without.blocks());
    assert_eq!(with_failure.characters(), without.characters());
    assert_eq!(with_failure.aliases_of("KYLE"), ["KYLE".to_string()]);
}

#[test]
fn test_unknown_detector_is_not_an_error() {
    let options = ParseOptions {
        alias_boost: true,
        person_detector: Some("en_core_web_sm".to_string()),
    };
    let result = get_parser().parse(SCENE, &options);
    assert_eq!(result.blocks(), parse(SCENE).blocks());
}

// Properties

fn property_corpus() -> Vec<String> {
    vec![
        SCENE.to_string(),
        "JOHN\nMARY\nHello.\n".to_string(),
        "JOHN\n\nMARY\n(beat)\n\nBOB\n(sighs) Fine. (exits)\n".to_string(),
        "ANNA\nOne (pause) two\nthree.\n\nANNA\nFour.\nFADE OUT.\n".to_string(),
        "JOHN\n".to_string(),
        "MAX\nI (pause) really (beat) mean it (smiles) this time.\n".to_string(),
        "LENA\nNo. ( quietly ) No.\nNot (looks away) again.\n".to_string(),
    ]
}

#[test]
fn test_parse_is_idempotent() {
    for text in property_corpus() {
        let first = parse(&text);
        let second = parse(&text);
        assert_eq!(first.blocks(), second.blocks());
        assert_eq!(first.characters(), second.characters());
        assert_eq!(first.lines(), second.lines());
    }
}

#[test]
fn test_no_block_has_empty_text() {
    for text in property_corpus() {
        for block in parse(&text).blocks() {
            assert!(!block.text.is_empty(), "empty block in {text:?}");
        }
    }
}

#[test]
fn test_cue_followed_by_cue_emits_no_block() {
    let result = parse("JOHN\nMARY\nHello.\n");
    assert_eq!(result.blocks().len(), 1);
    assert_eq!(result.blocks()[0].speaker, "MARY");

    let result = parse("JOHN\n\nMARY\nHello.\n");
    assert_eq!(result.blocks().len(), 1);
    assert_eq!(result.blocks()[0].speaker, "MARY");
}

/// Spoken segments and parenthetical inners of a span, scanned character by character
fn split_on_parentheticals(raw: &str) -> (Vec<String>, Vec<String>) {
    let mut segments = vec![String::new()];
    let mut inners = Vec::new();
    let mut inside = false;
    let mut run = String::new();
    for ch in raw.chars() {
        if !inside && ch == '(' {
            inside = true;
        } else if inside && ch == ')' {
            inners.push(run.trim().to_string());
            run.clear();
            segments.push(String::new());
            inside = false;
        } else if inside {
            run.push(ch);
        } else {
            segments.last_mut().unwrap().push(ch);
        }
    }
    (segments, inners)
}

fn squeeze(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[test]
fn test_parenthetical_reinsertion_round_trip() {
    let patterns = ScreenplayPatterns::global().unwrap();
    let mut checked = 0;
    for text in property_corpus() {
        for block in parse(&text).blocks() {
            let (segments, inners) = split_on_parentheticals(&block.raw_text);
            assert_eq!(inners, block.parentheticals, "parentheticals of {:?}", block.raw_text);
            assert_eq!(squeeze(&segments.concat()), squeeze(&block.text));

            // Put each parenthetical back between its neighbouring segments
            let mut rebuilt = segments[0].clone();
            for (parenthetical, segment) in block.parentheticals.iter().zip(&segments[1..]) {
                rebuilt.push('(');
                rebuilt.push_str(parenthetical);
                rebuilt.push(')');
                rebuilt.push_str(segment);
            }
            let stripped = strip_parentheticals(patterns, &rebuilt);
            assert_eq!(squeeze(&stripped.text), squeeze(&block.text));
            assert_eq!(stripped.parentheticals, block.parentheticals);
            checked += block.parentheticals.len();
        }
    }
    assert!(checked >= 6, "corpus exercised only {checked} parentheticals");
}

#[test]
fn test_mid_line_parentheticals() {
    let result = parse("MAX\nI (pause) really (beat) mean it (smiles) this time.\n");

    assert_eq!(result.blocks().len(), 1);
    assert_eq!(result.blocks()[0].text, "I really mean it this time.");
    assert_eq!(result.blocks()[0].parentheticals, vec!["pause", "beat", "smiles"]);
}

#[test]
fn test_frequency_matches_block_counts() {
    for text in property_corpus() {
        let result = parse(&text);
        for (name, count) in result.characters() {
            let blocks = result.blocks().iter().filter(|b| &b.speaker == name).count();
            assert_eq!(*count, blocks, "frequency mismatch for {name}");
        }
        let total: usize = result.characters().values().sum();
        assert_eq!(total, result.blocks().len());
    }
}
