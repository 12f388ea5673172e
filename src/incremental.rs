// WHY: Aux-file helpers so batch runs can skip scripts that were already parsed
// Each script `<stem>.<ext>` gets a sibling `<stem>_cues.json` holding its ScriptParse

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::script_parser::ScriptParse;

/// File-name suffix of parse outputs
pub const AUX_FILE_SUFFIX: &str = "_cues.json";

/// Generate auxiliary file path from source file path
pub fn generate_aux_file_path(source_path: &Path) -> PathBuf {
    let mut aux_path = source_path.to_path_buf();
    let file_stem = aux_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");
    aux_path.set_file_name(format!("{file_stem}{AUX_FILE_SUFFIX}"));
    aux_path
}

/// Check if auxiliary file exists for given source file
pub fn aux_file_exists<P: AsRef<Path>>(source_path: P) -> bool {
    generate_aux_file_path(source_path.as_ref()).exists()
}

/// Read raw auxiliary file content for given source file
///
/// # Example
/// ```no_run
/// use cueline::incremental::read_aux_file;
/// let json = read_aux_file("scripts/heist.txt").expect("Failed to read aux file");
/// ```
pub fn read_aux_file<P: AsRef<Path>>(source_path: P) -> Result<String, io::Error> {
    fs::read_to_string(generate_aux_file_path(source_path.as_ref()))
}

fn render(parse: &ScriptParse) -> Result<String> {
    let mut json = serde_json::to_string_pretty(parse).context("serializing script parse")?;
    json.push('\n');
    Ok(json)
}

/// Write the parse result next to its source as pretty JSON with a trailing newline
pub fn write_aux_file<P: AsRef<Path>>(source_path: P, parse: &ScriptParse) -> Result<PathBuf> {
    let aux_path = generate_aux_file_path(source_path.as_ref());
    fs::write(&aux_path, render(parse)?).with_context(|| format!("writing {}", aux_path.display()))?;
    Ok(aux_path)
}

/// Async variant of [`write_aux_file`] for the batch pipeline
pub async fn write_aux_file_async<P: AsRef<Path>>(source_path: P, parse: &ScriptParse) -> Result<PathBuf> {
    let aux_path = generate_aux_file_path(source_path.as_ref());
    tokio::fs::write(&aux_path, render(parse)?)
        .await
        .with_context(|| format!("writing {}", aux_path.display()))?;
    Ok(aux_path)
}

/// Load a previously written parse result
pub fn load_aux_file<P: AsRef<Path>>(source_path: P) -> Result<ScriptParse> {
    let aux_path = generate_aux_file_path(source_path.as_ref());
    let json = fs::read_to_string(&aux_path).with_context(|| format!("reading {}", aux_path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing {}", aux_path.display()))
}
