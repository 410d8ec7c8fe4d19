use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use reflow::history::DEFAULT_MAX_DEPTH;
use reflow::segment::DEFAULT_TOKEN_PADDING;
use reflow::srt::{self, format_clock};
use reflow::{script, Editor, HistoryConfig, Measure, Timeline};

// Width of the text column in `show` before it gets cut
const MAX_TEXT_COLUMN: usize = 60;

/// Reflow: reorganize the line breaks of SRT subtitles
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log every executed, undone and redone step
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Columns of padding on each side of a word when measuring lines
    #[arg(long, default_value_t = DEFAULT_TOKEN_PADDING, global = true)]
    token_padding: usize,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// List the lines of a subtitle file
    Show {
        /// SRT file to list
        file: PathBuf,
    },

    /// Run an edit script against a subtitle file
    Apply {
        /// SRT file to edit
        file: PathBuf,

        /// Edit script, one operation per line
        #[arg(short, long)]
        script: PathBuf,

        /// Where to write the result (defaults to editing FILE in place)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stop at the first operation that has no target
        #[arg(long)]
        strict: bool,

        /// Number of undoable steps to keep (at least 1)
        #[arg(
            long,
            default_value_t = DEFAULT_MAX_DEPTH,
            value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
        )]
        history_depth: usize,
    },

    /// Check every SRT file under a directory for consistency
    Check {
        /// Directory containing SRT files
        #[arg(default_value = "data")]
        dir: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "reflow=debug" } else { "reflow=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn show(file: &Path, measure: Measure) -> Result<()> {
    let timeline = srt::read_file(file, measure)?;

    println!(
        "{:>5}  {:>12}  {:>12}  {:>7}  {:>5}  Text",
        "#", "Start", "End", "Length", "Width"
    );
    for (index, segment) in timeline.iter().enumerate() {
        let text = segment.full_text().replace('\n', " / ");
        let text = if text.chars().count() > MAX_TEXT_COLUMN {
            let cut: String = text.chars().take(MAX_TEXT_COLUMN - 3).collect();
            format!("{cut}...")
        } else {
            text
        };
        println!(
            "{:>5}  {:>12}  {:>12}  {:>7}  {:>5}  {}",
            index + 1,
            format_clock(segment.start_ms()),
            format_clock(segment.end_ms()),
            format!("{:.2}s", segment.duration_ms() as f64 / 1000.0),
            segment.width(),
            text
        );
    }
    println!(
        "{} lines, {:.2}s of subtitles",
        timeline.len(),
        timeline.total_duration() as f64 / 1000.0
    );
    Ok(())
}

fn apply(
    file: &Path,
    script_path: &Path,
    output: Option<&Path>,
    strict: bool,
    config: HistoryConfig,
    measure: Measure,
) -> Result<()> {
    let content = fs::read_to_string(script_path)
        .with_context(|| format!("Cannot read script {}", script_path.display()))?;
    let steps = script::parse(&content)?;

    let mut editor = Editor::new(config, measure);
    editor.load(file)?;
    let report = script::run(&mut editor, &steps, strict)?;

    let output = output.unwrap_or(file);
    editor.save(output)?;
    println!(
        "Applied {} steps, skipped {}. Saved {} lines to {}.",
        report.applied,
        report.skipped,
        editor.timeline().len(),
        output.display()
    );
    Ok(())
}

/// Load, validate and round-trip one file. Returns a description of the
/// first problem found.
fn check_file(path: &Path, measure: Measure) -> Result<Option<String>> {
    let timeline: Timeline = match srt::read_file(path, measure) {
        Ok(timeline) => timeline,
        Err(err) => return Ok(Some(err.to_string())),
    };
    if let Err(violation) = timeline.check_invariants() {
        return Ok(Some(violation.to_string()));
    }
    Ok(match srt::round_trip_mismatch(&timeline) {
        Ok(None) => None,
        Ok(Some(index)) => Some(format!("line {} changes when saved and reloaded", index + 1)),
        Err(err) => Some(format!("cannot reload saved output: {err}")),
    })
}

fn check(dir: &Path, measure: Measure) -> Result<bool> {
    if !dir.exists() {
        anyhow::bail!("Directory '{}' does not exist", dir.display());
    }

    let files = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "srt"))
        .map(|e| e.path().to_path_buf())
        .collect::<Vec<_>>();

    let mut failed = 0;
    for path in &files {
        match check_file(path, measure)? {
            None => println!("ok    {}", path.display()),
            Some(problem) => {
                failed += 1;
                println!("FAIL  {}: {}", path.display(), problem);
            }
        }
    }
    println!("Checked {} files, {} failed.", files.len(), failed);
    Ok(failed == 0)
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);
    let measure = Measure::new(args.token_padding);

    match args.command {
        Cmd::Show { file } => show(&file, measure)?,
        Cmd::Apply {
            file,
            script,
            output,
            strict,
            history_depth,
        } => apply(
            &file,
            &script,
            output.as_deref(),
            strict,
            HistoryConfig::new(history_depth),
            measure,
        )?,
        Cmd::Check { dir } => {
            if !check(&dir, measure)? {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
