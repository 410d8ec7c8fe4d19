//! The orchestrating layer between a front end and the command engine.
//!
//! Front ends hand over `(segment, word)` positions and operation kinds; the
//! editor checks that the operation has a target, builds the command and runs
//! it through the history. Nothing invalid ever reaches a command.

use std::path::Path;

use tracing::{info, warn};

use crate::command::{
    ChangeToken, InsertTokens, MergeToNextLine, MergeToPrevLine, RemoveToken, SplitToNextLine,
    SplitToPrevLine,
};
use crate::error::{CodecError, EditError};
use crate::history::{History, HistoryConfig};
use crate::segment::{Measure, Segment};
use crate::srt;
use crate::timeline::Timeline;
use crate::token::tokenize;

pub const MULTI_WORD_EDIT: &str = "Change word to multiple words";

/// Line-level operations a user can drag a word into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Move the word and everything before it to the end of the previous line.
    MergePrev,
    /// Move the word and everything after it to the start of the next line.
    MergeNext,
    /// Start a new line at the word.
    SplitNext,
    /// End a new line at the word; the rest stays on this line.
    SplitPrev,
}

#[derive(Debug, Default)]
pub struct Editor {
    timeline: Timeline,
    history: History,
}

impl Editor {
    pub fn new(config: HistoryConfig, measure: Measure) -> Editor {
        Editor {
            timeline: Timeline::with_measure(measure),
            history: History::new(config),
        }
    }

    pub fn with_timeline(timeline: Timeline, config: HistoryConfig) -> Editor {
        Editor {
            timeline,
            history: History::new(config),
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Replace the timeline with the contents of an SRT file. On failure the
    /// current timeline and history are kept.
    pub fn load(&mut self, path: &Path) -> Result<(), CodecError> {
        let timeline = srt::read_file(path, self.timeline.measure())?;
        self.timeline = timeline;
        self.history.clear();
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), CodecError> {
        srt::write_file(path, &self.timeline)
    }

    pub fn perform(&mut self, op: Operation, segment: usize, token: usize) -> Result<(), EditError> {
        let line = self.line(segment)?;
        check_token(line, segment, token)?;
        let words = line.len();

        let cmd = match op {
            Operation::MergePrev => {
                if segment == 0 {
                    return Err(EditError::NoTarget(
                        "Can't merge to previous line, because this is already first line!",
                    ));
                }
                MergeToPrevLine::new(segment, token, segment - 1).into()
            }
            Operation::MergeNext => {
                if segment + 1 == self.timeline.len() {
                    return Err(EditError::NoTarget(
                        "Can't merge to next line, because this is already last line!",
                    ));
                }
                MergeToNextLine::new(segment, token, segment + 1).into()
            }
            Operation::SplitNext => {
                if token == 0 {
                    return Err(EditError::NoTarget(
                        "Can't split to next line from the first word!",
                    ));
                }
                SplitToNextLine::new(segment, token).into()
            }
            Operation::SplitPrev => {
                if token + 1 == words {
                    return Err(EditError::NoTarget(
                        "Can't split to previous line from the last word!",
                    ));
                }
                SplitToPrevLine::new(segment, token).into()
            }
        };

        self.history.execute(cmd, &mut self.timeline);
        Ok(())
    }

    /// Replace one word with the words of `text`.
    ///
    /// Blank text removes the word, a single word changes it in place and
    /// several words replace it as one undoable step.
    pub fn edit_token(&mut self, segment: usize, token: usize, text: &str) -> Result<(), EditError> {
        let line = self.line(segment)?;
        check_token(line, segment, token)?;
        let delimiter = line.tokens()[token].delimiter;

        let mut words = tokenize(text);
        words.retain(|w| !w.text.is_empty());
        match words.len() {
            0 => {
                self.history
                    .execute(RemoveToken::new(segment, token).into(), &mut self.timeline);
            }
            1 => {
                let word = words.remove(0);
                self.history
                    .execute(ChangeToken::new(segment, token, word).into(), &mut self.timeline);
            }
            _ => {
                if let Some(last) = words.last_mut() {
                    last.delimiter = delimiter;
                }
                self.history.begin_group(MULTI_WORD_EDIT);
                self.history.execute(
                    InsertTokens::new(segment, token + 1, words).into(),
                    &mut self.timeline,
                );
                self.history
                    .execute(RemoveToken::new(segment, token).into(), &mut self.timeline);
                self.history.end_group();
            }
        }
        Ok(())
    }

    pub fn undo(&mut self) -> Option<String> {
        let label = self.history.undo(&mut self.timeline);
        match &label {
            Some(step) => info!(step = %step, "undone"),
            None => warn!("nothing to undo"),
        }
        label
    }

    pub fn redo(&mut self) -> Option<String> {
        let label = self.history.redo(&mut self.timeline);
        match &label {
            Some(step) => info!(step = %step, "redone"),
            None => warn!("nothing to redo"),
        }
        label
    }

    fn line(&self, segment: usize) -> Result<&Segment, EditError> {
        self.timeline
            .get(segment)
            .ok_or(EditError::SegmentOutOfRange {
                segment,
                len: self.timeline.len(),
            })
    }
}

fn check_token(line: &Segment, segment: usize, token: usize) -> Result<(), EditError> {
    if token < line.len() {
        Ok(())
    } else {
        Err(EditError::TokenOutOfRange {
            segment,
            token,
            len: line.len(),
        })
    }
}
