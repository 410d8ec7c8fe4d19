//! Line-based edit scripts for running the editor without a front end.
//!
//! ```text
//! # numbers are 1-based, as printed by `reflow show`
//! merge-next 3 2
//! split-prev 5 1
//! edit 7 4 going to
//! undo
//! ```

use std::str::FromStr;

use tracing::warn;

use crate::editor::{Editor, Operation};
use crate::error::ScriptError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// `segment` and `token` are 0-based here.
    Perform {
        op: Operation,
        segment: usize,
        token: usize,
    },
    Edit {
        segment: usize,
        token: usize,
        text: String,
    },
    Undo,
    Redo,
}

/// A parsed step with the script line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    pub line: usize,
    pub step: Step,
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "merge-prev" => Ok(Operation::MergePrev),
            "merge-next" => Ok(Operation::MergeNext),
            "split-next" => Ok(Operation::SplitNext),
            "split-prev" => Ok(Operation::SplitPrev),
            other => Err(format!("unknown operation `{other}`")),
        }
    }
}

fn position(word: Option<&str>, what: &str) -> Result<usize, String> {
    let word = word.ok_or_else(|| format!("missing {what} number"))?;
    match word.parse::<usize>() {
        Ok(0) | Err(_) => Err(format!("{what} number must be a positive integer, found `{word}`")),
        Ok(n) => Ok(n - 1),
    }
}

fn parse_step(text: &str) -> Result<Step, String> {
    let mut words = text.split_whitespace();
    let keyword = words.next().unwrap_or_default();

    let step = match keyword {
        "undo" => Step::Undo,
        "redo" => Step::Redo,
        "edit" => {
            let segment = position(words.next(), "line")?;
            let token = position(words.next(), "word")?;
            let text = words.collect::<Vec<_>>().join(" ");
            return Ok(Step::Edit {
                segment,
                token,
                text,
            });
        }
        _ => {
            let op = keyword.parse::<Operation>()?;
            let segment = position(words.next(), "line")?;
            let token = position(words.next(), "word")?;
            Step::Perform { op, segment, token }
        }
    };

    match words.next() {
        Some(extra) => Err(format!("unexpected `{extra}` after `{keyword}`")),
        None => Ok(step),
    }
}

/// Parse a whole script, skipping blank lines and `#` comments.
pub fn parse(content: &str) -> Result<Vec<ScriptLine>, ScriptError> {
    content
        .lines()
        .enumerate()
        .map(|(index, text)| (index + 1, text.trim()))
        .filter(|(_, text)| !text.is_empty() && !text.starts_with('#'))
        .map(|(line, text)| {
            parse_step(text)
                .map(|step| ScriptLine { line, step })
                .map_err(|message| ScriptError { line, message })
        })
        .collect()
}

/// Outcome of running a script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Report {
    pub applied: usize,
    pub skipped: usize,
}

/// Run parsed steps against `editor`.
///
/// Steps without a target are skipped with a warning, or abort the run when
/// `strict` is set. An undo or redo with nothing to act on counts as skipped.
pub fn run(editor: &mut Editor, lines: &[ScriptLine], strict: bool) -> Result<Report, ScriptError> {
    let mut report = Report::default();

    for ScriptLine { line, step } in lines {
        let outcome = match step {
            Step::Perform { op, segment, token } => editor.perform(*op, *segment, *token),
            Step::Edit {
                segment,
                token,
                text,
            } => editor.edit_token(*segment, *token, text),
            Step::Undo | Step::Redo => {
                let label = if *step == Step::Undo {
                    editor.undo()
                } else {
                    editor.redo()
                };
                if label.is_some() {
                    report.applied += 1;
                } else {
                    report.skipped += 1;
                }
                continue;
            }
        };

        match outcome {
            Ok(()) => report.applied += 1,
            Err(err) if strict => {
                return Err(ScriptError {
                    line: *line,
                    message: err.to_string(),
                })
            }
            Err(err) => {
                warn!(line, "{err}");
                report.skipped += 1;
            }
        }
    }

    Ok(report)
}
