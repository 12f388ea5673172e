use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};

use cueline::batch::{process_files_parallel, BatchConfig};
use cueline::discovery::{find_script_files, DiscoveryConfig};
use cueline::reader::{read_script_async, ReaderConfig};
use cueline::script_parser::{
    blocks_for_character, dialogue_spans, list_characters, top_character, CharacterOrder, ParseOptions, ScriptParser,
};

#[derive(Parser, Debug)]
#[command(name = "cueline")]
#[command(about = "Recovers characters, dialogue blocks and aliases from extracted screenplay text")]
#[command(version)]
struct Cli {
    /// Emit debug-level logs
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse scripts and write `<stem>_cues.json` next to each
    Parse(ParseArgs),
    /// Print the characters of one script, or the dialogue of one character
    Show(ShowArgs),
}

#[derive(Args, Debug)]
struct DetectorArgs {
    /// Skip the alias-unification pass
    #[arg(long)]
    no_alias_boost: bool,

    /// Person detector used for alias unification
    #[arg(long, default_value = cueline::script_parser::DEFAULT_PERSON_DETECTOR)]
    detector: String,
}

impl DetectorArgs {
    fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            alias_boost: !self.no_alias_boost,
            person_detector: Some(self.detector.clone()),
        }
    }
}

#[derive(Args, Debug)]
struct ParseArgs {
    /// Script files or directories to scan
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    #[command(flatten)]
    detection: DetectorArgs,

    /// Overwrite existing aux files
    #[arg(long)]
    overwrite_all: bool,

    /// Abort on first error
    #[arg(long)]
    fail_fast: bool,

    /// Use memory-mapped I/O instead of async buffered
    #[arg(long)]
    use_mmap: bool,

    /// Suppress console progress bars
    #[arg(long)]
    no_progress: bool,

    /// Stats output file path
    #[arg(long, default_value = "run_stats.json")]
    stats_out: PathBuf,

    /// Files parsed concurrently (default: number of CPUs)
    #[arg(long)]
    jobs: Option<usize>,
}

#[derive(Args, Debug)]
struct ShowArgs {
    /// Script text file
    file: PathBuf,

    /// Print this character's dialogue instead of the character list
    #[arg(long)]
    character: Option<String>,

    /// Print only the inclusive line spans of the character's dialogue
    #[arg(long, requires = "character")]
    spans: bool,

    /// Print only the character with the most dialogue blocks
    #[arg(long, conflicts_with = "character")]
    top: bool,

    /// List characters alphabetically instead of by line count
    #[arg(long)]
    alphabetical: bool,

    /// Emit JSON on stdout
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    detection: DetectorArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // WHY: structured JSON logs on stderr keep stdout free for results
    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .json()
        .init();

    info!(?cli, "Parsed CLI arguments");

    match cli.command {
        Command::Parse(args) => run_parse(args).await,
        Command::Show(args) => run_show(args).await,
    }
}

async fn run_parse(args: ParseArgs) -> Result<()> {
    for path in &args.paths {
        if !path.exists() {
            anyhow::bail!("Path does not exist: {}", path.display());
        }
    }

    let discovery_config = DiscoveryConfig {
        fail_fast: args.fail_fast,
        ..Default::default()
    };
    let discovered = find_script_files(&args.paths, &discovery_config).await?;
    let (valid, invalid): (Vec<_>, Vec<_>) = discovered.into_iter().partition(|f| f.is_valid());
    for file in &invalid {
        if let Some(ref error) = file.error {
            info!("Issue with {}: {}", file.path.display(), error);
        }
    }

    let mut config = BatchConfig {
        parse: args.detection.parse_options(),
        reader: ReaderConfig {
            fail_fast: args.fail_fast,
            use_mmap: args.use_mmap,
            ..Default::default()
        },
        overwrite_all: args.overwrite_all,
        fail_fast: args.fail_fast,
        show_progress: !args.no_progress,
        ..Default::default()
    };
    if let Some(jobs) = args.jobs {
        config.concurrency = jobs.max(1);
    }

    let paths: Vec<PathBuf> = valid.into_iter().map(|f| f.path).collect();
    let run = process_files_parallel(&paths, &config).await?;
    run.write_stats(&args.stats_out).await?;

    println!("cueline v{} - parse complete", env!("CARGO_PKG_VERSION"));
    println!("  Scripts found: {}", paths.len() + invalid.len());
    println!("  Parsed: {}", run.files_processed);
    println!("  Skipped (aux file present): {}", run.files_skipped);
    println!("  Failed: {}", run.files_failed + invalid.len() as u64);
    println!("  Dialogue blocks: {}", run.total_blocks_detected);
    Ok(())
}

async fn run_show(args: ShowArgs) -> Result<()> {
    let text = read_script_async(&args.file)
        .await
        .with_context(|| format!("reading {}", args.file.display()))?;
    let parser = ScriptParser::new()?;
    let parse = parser.parse(&text, &args.detection.parse_options());

    if args.top {
        let top = top_character(&parse);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&top)?);
        } else if let Some(name) = top {
            println!("{name}");
        }
        return Ok(());
    }

    if let (true, Some(name)) = (args.spans, args.character.as_deref()) {
        let spans = dialogue_spans(&parse, name);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&spans)?);
        } else {
            for (start, end) in spans {
                println!("{start}\t{end}");
            }
        }
        return Ok(());
    }

    if let Some(name) = args.character.as_deref() {
        let blocks = blocks_for_character(&parse, name);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&blocks)?);
        } else {
            for block in blocks {
                println!("[{}-{}] {}: {}", block.start_line, block.end_line, block.speaker, block.text);
            }
        }
        return Ok(());
    }

    let order = if args.alphabetical {
        CharacterOrder::Alphabetical
    } else {
        CharacterOrder::Frequency
    };
    let names = list_characters(&parse, order);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&names)?);
    } else {
        for name in names {
            let aliases = parse.aliases_of(&name);
            let others: Vec<&str> = aliases.iter().map(String::as_str).filter(|a| *a != name).collect();
            if others.is_empty() {
                println!("{}\t{}", parse.character_count(&name), name);
            } else {
                println!("{}\t{}\t(aka {})", parse.character_count(&name), name, others.join(", "));
            }
        }
    }
    Ok(())
}
