//! Reversible edits of a [`Timeline`].
//!
//! A command holds only indices, operands and the state it captured while
//! applying. The timeline is passed to [`Command::apply`] and
//! [`Command::revert`] explicitly, so commands never alias it.
//!
//! Every command leaves the timeline in its at-rest shape: the last word of
//! each segment has no delimiter, every other word has one, no segment is
//! empty and the cached width/text of touched segments are fresh. Each
//! delimiter a command rewrites is captured so `revert` restores it exactly.
//!
//! # Panics
//!
//! Calling `revert` on a command that has not been applied is a programming
//! error and panics, as does applying a command whose indices are not valid
//! for the timeline. The [`Editor`](crate::editor::Editor) validates indices
//! before constructing commands.

use crate::segment::Segment;
use crate::timeline::Timeline;
use crate::token::{Delimiter, Token};

const NOT_APPLIED: &str = "command reverted before it was applied";

/// `floor(duration * moved / total)`, exact for any u64 duration.
pub fn proportional_share(duration_ms: u64, moved: usize, total: usize) -> u64 {
    debug_assert!(total > 0 && moved <= total);
    (u128::from(duration_ms) * moved as u128 / total as u128) as u64
}

/// One of the seven reversible timeline edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    MergeToPrevLine(MergeToPrevLine),
    MergeToNextLine(MergeToNextLine),
    SplitToNextLine(SplitToNextLine),
    SplitToPrevLine(SplitToPrevLine),
    ChangeToken(ChangeToken),
    InsertTokens(InsertTokens),
    RemoveToken(RemoveToken),
}

impl Command {
    pub fn apply(&mut self, timeline: &mut Timeline) {
        match self {
            Command::MergeToPrevLine(cmd) => cmd.apply(timeline),
            Command::MergeToNextLine(cmd) => cmd.apply(timeline),
            Command::SplitToNextLine(cmd) => cmd.apply(timeline),
            Command::SplitToPrevLine(cmd) => cmd.apply(timeline),
            Command::ChangeToken(cmd) => cmd.apply(timeline),
            Command::InsertTokens(cmd) => cmd.apply(timeline),
            Command::RemoveToken(cmd) => cmd.apply(timeline),
        }
    }

    pub fn revert(&mut self, timeline: &mut Timeline) {
        match self {
            Command::MergeToPrevLine(cmd) => cmd.revert(timeline),
            Command::MergeToNextLine(cmd) => cmd.revert(timeline),
            Command::SplitToNextLine(cmd) => cmd.revert(timeline),
            Command::SplitToPrevLine(cmd) => cmd.revert(timeline),
            Command::ChangeToken(cmd) => cmd.revert(timeline),
            Command::InsertTokens(cmd) => cmd.revert(timeline),
            Command::RemoveToken(cmd) => cmd.revert(timeline),
        }
    }

    /// Human readable name shown in the undo history.
    pub fn label(&self) -> &'static str {
        match self {
            Command::MergeToPrevLine(_) => "Merge to previous line",
            Command::MergeToNextLine(_) => "Merge to next line",
            Command::SplitToNextLine(_) => "Split to new line after",
            Command::SplitToPrevLine(_) => "Split to new line before",
            Command::ChangeToken(_) => "Change word",
            Command::InsertTokens(_) => "Insert words",
            Command::RemoveToken(_) => "Remove word",
        }
    }
}

macro_rules! impl_from_command {
    ($($kind:ident),* $(,)?) => {
        $(
            impl From<$kind> for Command {
                fn from(cmd: $kind) -> Command {
                    Command::$kind(cmd)
                }
            }
        )*
    };
}

impl_from_command!(
    MergeToPrevLine,
    MergeToNextLine,
    SplitToNextLine,
    SplitToPrevLine,
    ChangeToken,
    InsertTokens,
    RemoveToken,
);

// ============================================================================
// Merges
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
struct MergeUndo {
    curr_start: u64,
    curr_duration: u64,
    other_start: u64,
    other_duration: u64,
    /// Delimiter of the word that became the seam between the two lines.
    seam: Option<Delimiter>,
    /// Delimiter of the word that became segment-final in the receiving or
    /// remaining line.
    moved_tail: Option<Delimiter>,
    moved: usize,
    curr_destroyed: bool,
}

/// Move words `0..=token` of line `segment` to the end of line `prev`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeToPrevLine {
    segment: usize,
    token: usize,
    prev: usize,
    undo: Option<MergeUndo>,
}

impl MergeToPrevLine {
    pub fn new(segment: usize, token: usize, prev: usize) -> MergeToPrevLine {
        MergeToPrevLine {
            segment,
            token,
            prev,
            undo: None,
        }
    }

    fn apply(&mut self, timeline: &mut Timeline) {
        debug_assert_eq!(self.prev + 1, self.segment);
        let (curr, prev) = timeline.pair_mut(self.segment, self.prev);
        let total = curr.tokens.len();
        let moved = self.token + 1;

        let undo = MergeUndo {
            curr_start: curr.start_ms,
            curr_duration: curr.duration_ms,
            other_start: prev.start_ms,
            other_duration: prev.duration_ms,
            seam: prev.last_delimiter(),
            moved_tail: curr.tokens[self.token].delimiter,
            moved,
            curr_destroyed: moved == total,
        };

        prev.set_last_delimiter(Some(Delimiter::Space));
        prev.tokens.extend(curr.tokens.drain(..moved));
        prev.set_last_delimiter(None);

        if undo.curr_destroyed {
            prev.duration_ms += curr.duration_ms;
            timeline.remove(self.segment);
        } else {
            let delta = proportional_share(curr.duration_ms, moved, total);
            curr.start_ms += delta;
            curr.duration_ms -= delta;
            prev.duration_ms += delta;
            timeline.refresh(self.segment);
        }
        timeline.refresh(self.prev);
        self.undo = Some(undo);
    }

    fn revert(&mut self, timeline: &mut Timeline) {
        let undo = self.undo.take().expect(NOT_APPLIED);
        if undo.curr_destroyed {
            timeline.insert(
                self.segment,
                Segment::placeholder(undo.curr_start, undo.curr_duration),
            );
        }

        let (curr, prev) = timeline.pair_mut(self.segment, self.prev);
        let from = prev.tokens.len() - undo.moved;
        let head: Vec<Token> = prev.tokens.drain(from..).collect();
        curr.tokens.splice(0..0, head);
        curr.tokens[self.token].delimiter = undo.moved_tail;
        prev.set_last_delimiter(undo.seam);

        curr.start_ms = undo.curr_start;
        curr.duration_ms = undo.curr_duration;
        prev.start_ms = undo.other_start;
        prev.duration_ms = undo.other_duration;

        timeline.refresh(self.segment);
        timeline.refresh(self.prev);
    }
}

/// Move words `token..` of line `segment` to the front of line `next`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeToNextLine {
    segment: usize,
    token: usize,
    next: usize,
    undo: Option<MergeUndo>,
}

impl MergeToNextLine {
    pub fn new(segment: usize, token: usize, next: usize) -> MergeToNextLine {
        MergeToNextLine {
            segment,
            token,
            next,
            undo: None,
        }
    }

    fn apply(&mut self, timeline: &mut Timeline) {
        debug_assert_eq!(self.segment + 1, self.next);
        let (curr, next) = timeline.pair_mut(self.segment, self.next);
        let total = curr.tokens.len();
        let moved = total - self.token;

        let undo = MergeUndo {
            curr_start: curr.start_ms,
            curr_duration: curr.duration_ms,
            other_start: next.start_ms,
            other_duration: next.duration_ms,
            seam: curr.last_delimiter(),
            moved_tail: self
                .token
                .checked_sub(1)
                .and_then(|t| curr.tokens[t].delimiter),
            moved,
            curr_destroyed: self.token == 0,
        };

        curr.set_last_delimiter(Some(Delimiter::Space));
        let tail: Vec<Token> = curr.tokens.drain(self.token..).collect();
        next.tokens.splice(0..0, tail);

        if undo.curr_destroyed {
            next.duration_ms += curr.duration_ms;
            next.start_ms -= curr.duration_ms;
            timeline.remove(self.segment);
            // the next line has slid into this index
            timeline.refresh(self.segment);
        } else {
            curr.set_last_delimiter(None);
            let delta = proportional_share(curr.duration_ms, moved, total);
            curr.duration_ms -= delta;
            next.start_ms -= delta;
            next.duration_ms += delta;
            timeline.refresh(self.segment);
            timeline.refresh(self.next);
        }
        self.undo = Some(undo);
    }

    fn revert(&mut self, timeline: &mut Timeline) {
        let undo = self.undo.take().expect(NOT_APPLIED);
        if undo.curr_destroyed {
            timeline.insert(
                self.segment,
                Segment::placeholder(undo.curr_start, undo.curr_duration),
            );
        }

        let (curr, next) = timeline.pair_mut(self.segment, self.next);
        curr.tokens.extend(next.tokens.drain(..undo.moved));
        curr.set_last_delimiter(undo.seam);
        if let Some(before_tail) = self.token.checked_sub(1) {
            curr.tokens[before_tail].delimiter = undo.moved_tail;
        }

        curr.start_ms = undo.curr_start;
        curr.duration_ms = undo.curr_duration;
        next.start_ms = undo.other_start;
        next.duration_ms = undo.other_duration;

        timeline.refresh(self.segment);
        timeline.refresh(self.next);
    }
}

// ============================================================================
// Splits
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
struct SplitUndo {
    curr_start: u64,
    curr_duration: u64,
    /// Delimiter of the word that became segment-final at the cut.
    seam: Option<Delimiter>,
}

/// Carve words `token..` of line `segment` into a new line right after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitToNextLine {
    segment: usize,
    token: usize,
    undo: Option<SplitUndo>,
}

impl SplitToNextLine {
    pub fn new(segment: usize, token: usize) -> SplitToNextLine {
        SplitToNextLine {
            segment,
            token,
            undo: None,
        }
    }

    fn apply(&mut self, timeline: &mut Timeline) {
        let measure = timeline.measure();
        let curr = timeline.segment_mut(self.segment);
        let total = curr.tokens.len();
        debug_assert!(self.token > 0 && self.token < total);

        self.undo = Some(SplitUndo {
            curr_start: curr.start_ms,
            curr_duration: curr.duration_ms,
            seam: curr.tokens[self.token - 1].delimiter,
        });

        let delta = proportional_share(curr.duration_ms, total - self.token, total);
        curr.duration_ms -= delta;
        let tail = curr.tokens.split_off(self.token);
        curr.set_last_delimiter(None);

        let created = Segment::new(curr.end_ms(), delta, tail, measure);
        timeline.refresh(self.segment);
        timeline.insert(self.segment + 1, created);
    }

    fn revert(&mut self, timeline: &mut Timeline) {
        let undo = self.undo.take().expect(NOT_APPLIED);
        let created = timeline.remove(self.segment + 1);
        let curr = timeline.segment_mut(self.segment);
        curr.set_last_delimiter(undo.seam);
        curr.tokens.extend(created.tokens);
        curr.start_ms = undo.curr_start;
        curr.duration_ms = undo.curr_duration;
        timeline.refresh(self.segment);
    }
}

/// Carve words `0..=token` of line `segment` into a new line right before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitToPrevLine {
    segment: usize,
    token: usize,
    undo: Option<SplitUndo>,
}

impl SplitToPrevLine {
    pub fn new(segment: usize, token: usize) -> SplitToPrevLine {
        SplitToPrevLine {
            segment,
            token,
            undo: None,
        }
    }

    fn apply(&mut self, timeline: &mut Timeline) {
        let measure = timeline.measure();
        let curr = timeline.segment_mut(self.segment);
        let total = curr.tokens.len();
        let moved = self.token + 1;
        debug_assert!(moved < total);

        self.undo = Some(SplitUndo {
            curr_start: curr.start_ms,
            curr_duration: curr.duration_ms,
            seam: curr.tokens[self.token].delimiter,
        });

        let delta = proportional_share(curr.duration_ms, moved, total);
        let mut head: Vec<Token> = curr.tokens.drain(..moved).collect();
        if let Some(last) = head.last_mut() {
            last.delimiter = None;
        }
        let created = Segment::new(curr.start_ms, delta, head, measure);
        curr.start_ms += delta;
        curr.duration_ms -= delta;

        timeline.refresh(self.segment);
        timeline.insert(self.segment, created);
    }

    fn revert(&mut self, timeline: &mut Timeline) {
        let undo = self.undo.take().expect(NOT_APPLIED);
        let created = timeline.remove(self.segment);
        let mut head = created.tokens;
        if let Some(last) = head.last_mut() {
            last.delimiter = undo.seam;
        }
        let curr = timeline.segment_mut(self.segment);
        curr.tokens.splice(0..0, head);
        curr.start_ms = undo.curr_start;
        curr.duration_ms = undo.curr_duration;
        timeline.refresh(self.segment);
    }
}

// ============================================================================
// Word edits
// ============================================================================

/// Replace the text of one word, keeping the delimiter it already has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeToken {
    segment: usize,
    token: usize,
    replacement: Token,
    original: Option<Token>,
}

impl ChangeToken {
    /// The delimiter of `replacement` is ignored: a word's delimiter encodes
    /// its position in the line, not its content.
    pub fn new(segment: usize, token: usize, replacement: Token) -> ChangeToken {
        ChangeToken {
            segment,
            token,
            replacement,
            original: None,
        }
    }

    fn apply(&mut self, timeline: &mut Timeline) {
        let word = &mut timeline.segment_mut(self.segment).tokens[self.token];
        self.original = Some(word.clone());
        word.text.clone_from(&self.replacement.text);
        timeline.refresh(self.segment);
    }

    fn revert(&mut self, timeline: &mut Timeline) {
        let original = self.original.take().expect(NOT_APPLIED);
        timeline.segment_mut(self.segment).tokens[self.token] = original;
        timeline.refresh(self.segment);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct InsertUndo {
    count: usize,
    /// Previous delimiter of the old last word, when the run was appended.
    displaced_last: Option<Option<Delimiter>>,
}

/// Insert a run of words at position `token`.
///
/// Words inside the run that lack a delimiter get a space. The run's last
/// word ends up segment-final only when the run is appended at the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertTokens {
    segment: usize,
    token: usize,
    tokens: Vec<Token>,
    undo: Option<InsertUndo>,
}

impl InsertTokens {
    pub fn new(segment: usize, token: usize, tokens: Vec<Token>) -> InsertTokens {
        InsertTokens {
            segment,
            token,
            tokens,
            undo: None,
        }
    }

    fn apply(&mut self, timeline: &mut Timeline) {
        let line = timeline.segment_mut(self.segment);
        let appending = self.token == line.tokens.len();

        let mut run = self.tokens.clone();
        let count = run.len();
        for word in run.iter_mut().take(count.saturating_sub(1)) {
            if word.delimiter.is_none() {
                word.delimiter = Some(Delimiter::Space);
            }
        }

        let mut displaced_last = None;
        if let Some(last) = run.last_mut() {
            if appending {
                last.delimiter = None;
                if !line.tokens.is_empty() {
                    let previous = line.last_delimiter();
                    displaced_last = Some(previous);
                    line.set_last_delimiter(Some(previous.unwrap_or(Delimiter::Space)));
                }
            } else if last.delimiter.is_none() {
                last.delimiter = Some(Delimiter::Space);
            }
        }

        line.tokens.splice(self.token..self.token, run);
        timeline.refresh(self.segment);
        self.undo = Some(InsertUndo {
            count,
            displaced_last,
        });
    }

    fn revert(&mut self, timeline: &mut Timeline) {
        let undo = self.undo.take().expect(NOT_APPLIED);
        let line = timeline.segment_mut(self.segment);
        line.tokens.drain(self.token..self.token + undo.count);
        if let Some(previous) = undo.displaced_last {
            line.set_last_delimiter(previous);
        }
        timeline.refresh(self.segment);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RemoveUndo {
    removed: Token,
    /// Previous delimiter of the word that became last.
    promoted: Option<Option<Delimiter>>,
    /// Timing of the line, when removing its only word removed it too.
    destroyed: Option<(u64, u64)>,
}

/// Remove one word. A line losing its only word is removed as well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveToken {
    segment: usize,
    token: usize,
    undo: Option<RemoveUndo>,
}

impl RemoveToken {
    pub fn new(segment: usize, token: usize) -> RemoveToken {
        RemoveToken {
            segment,
            token,
            undo: None,
        }
    }

    fn apply(&mut self, timeline: &mut Timeline) {
        let line = timeline.segment_mut(self.segment);
        let removed = line.tokens.remove(self.token);
        let mut undo = RemoveUndo {
            removed,
            promoted: None,
            destroyed: None,
        };

        if line.tokens.is_empty() {
            let gone = timeline.remove(self.segment);
            undo.destroyed = Some((gone.start_ms, gone.duration_ms));
        } else {
            if self.token == line.tokens.len() {
                undo.promoted = Some(line.last_delimiter());
                line.set_last_delimiter(None);
            }
            timeline.refresh(self.segment);
        }
        self.undo = Some(undo);
    }

    fn revert(&mut self, timeline: &mut Timeline) {
        let undo = self.undo.take().expect(NOT_APPLIED);
        if let Some((start_ms, duration_ms)) = undo.destroyed {
            timeline.insert(self.segment, Segment::placeholder(start_ms, duration_ms));
        }
        let line = timeline.segment_mut(self.segment);
        if let Some(previous) = undo.promoted {
            line.set_last_delimiter(previous);
        }
        line.tokens.insert(self.token, undo.removed);
        timeline.refresh(self.segment);
    }
}
