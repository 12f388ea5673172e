pub mod batch;
pub mod discovery;
pub mod incremental;
pub mod reader;
pub mod script_parser;
pub mod source;

// Re-export main types for convenient access
pub use script_parser::{
    blocks_for_character, dialogue_spans, list_characters, parse_script_text, top_character, CharacterOrder,
    DialogueBlock, ParseOptions, PersonDetector, ScriptParse, ScriptParser,
};

pub use source::{PlainTextSource, TextSource};

// Re-export incremental processing utilities
pub use incremental::{aux_file_exists, generate_aux_file_path, load_aux_file, read_aux_file, write_aux_file};

// Re-export batch processing types and functions for benchmarking
pub use batch::{process_files_parallel, should_process_file, BatchConfig, FileStats, RunStats};
