//! Linear undo/redo stack of executed commands.
//!
//! ```text
//! execute(c3)                    undo()                      execute(c4)
//! done:   [c1, c2, c3]           done:   [c1, c2]            done:   [c1, c2, c4]
//! undone: []                     undone: [c3]                undone: []
//! ```
//!
//! Commands bracketed by [`History::begin_group`] and [`History::end_group`]
//! form one entry: a single undo reverts all of them newest first, a single
//! redo re-applies them in execution order.

use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::command::Command;
use crate::timeline::Timeline;

pub const DEFAULT_MAX_DEPTH: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum number of undoable steps kept; the oldest are dropped first.
    /// With 0 nothing stays undoable.
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl HistoryConfig {
    pub fn new(max_depth: usize) -> HistoryConfig {
        HistoryConfig { max_depth }
    }

    pub fn unlimited() -> HistoryConfig {
        HistoryConfig {
            max_depth: usize::MAX,
        }
    }
}

/// One user-visible undo step.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    Single(Command),
    Group { label: String, commands: Vec<Command> },
}

impl Entry {
    fn label(&self) -> &str {
        match self {
            Entry::Single(cmd) => cmd.label(),
            Entry::Group { label, .. } => label,
        }
    }

    fn apply(&mut self, timeline: &mut Timeline) {
        match self {
            Entry::Single(cmd) => cmd.apply(timeline),
            Entry::Group { commands, .. } => {
                for cmd in commands.iter_mut() {
                    cmd.apply(timeline);
                }
            }
        }
    }

    fn revert(&mut self, timeline: &mut Timeline) {
        match self {
            Entry::Single(cmd) => cmd.revert(timeline),
            Entry::Group { commands, .. } => {
                for cmd in commands.iter_mut().rev() {
                    cmd.revert(timeline);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct OpenGroup {
    label: String,
    depth: usize,
    commands: Vec<Command>,
}

#[derive(Debug, Default)]
pub struct History {
    done: VecDeque<Entry>,
    undone: Vec<Entry>,
    recording: Option<OpenGroup>,
    config: HistoryConfig,
}

impl History {
    pub fn new(config: HistoryConfig) -> History {
        History {
            done: VecDeque::new(),
            undone: Vec::new(),
            recording: None,
            config,
        }
    }

    /// Apply `cmd` and record it as done, discarding anything undone.
    pub fn execute(&mut self, mut cmd: Command, timeline: &mut Timeline) {
        debug!(command = cmd.label(), "execute");
        cmd.apply(timeline);
        timeline.assert_invariants();
        self.undone.clear();

        match self.recording.as_mut() {
            Some(group) => group.commands.push(cmd),
            None => self.push_done(Entry::Single(cmd)),
        }
    }

    /// Revert the newest step. Returns its label, or `None` when there is
    /// nothing to undo.
    pub fn undo(&mut self, timeline: &mut Timeline) -> Option<String> {
        self.close_open_group();
        let mut entry = self.done.pop_back()?;
        debug!(step = entry.label(), "undo");
        entry.revert(timeline);
        timeline.assert_invariants();
        let label = entry.label().to_string();
        self.undone.push(entry);
        Some(label)
    }

    /// Re-apply the newest undone step. Returns its label, or `None` when
    /// there is nothing to redo.
    pub fn redo(&mut self, timeline: &mut Timeline) -> Option<String> {
        self.close_open_group();
        let mut entry = self.undone.pop()?;
        debug!(step = entry.label(), "redo");
        entry.apply(timeline);
        timeline.assert_invariants();
        let label = entry.label().to_string();
        self.push_done(entry);
        Some(label)
    }

    /// Start recording a macro. Nested calls join the outermost group.
    pub fn begin_group(&mut self, label: impl Into<String>) {
        match self.recording.as_mut() {
            Some(group) => group.depth += 1,
            None => {
                self.recording = Some(OpenGroup {
                    label: label.into(),
                    depth: 1,
                    commands: Vec::new(),
                })
            }
        }
    }

    /// Finish the innermost open group. Closing the outermost one records it
    /// as a single step; an empty group records nothing.
    pub fn end_group(&mut self) {
        let Some(group) = self.recording.as_mut() else {
            warn!("end_group called without an open group");
            return;
        };
        group.depth -= 1;
        if group.depth == 0 {
            self.close_open_group();
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    pub fn can_undo(&self) -> bool {
        !self.done.is_empty() || self.recording.as_ref().is_some_and(|g| !g.commands.is_empty())
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.done.back().map(Entry::label)
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.undone.last().map(Entry::label)
    }

    pub fn undo_depth(&self) -> usize {
        self.done.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.undone.len()
    }

    pub fn config(&self) -> HistoryConfig {
        self.config
    }

    /// Forget every step. The timeline is left as it is.
    pub fn clear(&mut self) {
        self.done.clear();
        self.undone.clear();
        self.recording = None;
    }

    fn close_open_group(&mut self) {
        let Some(group) = self.recording.take() else {
            return;
        };
        if group.depth > 0 {
            warn!(group = %group.label, "closing a group that is still open");
        }
        if !group.commands.is_empty() {
            self.push_done(Entry::Group {
                label: group.label,
                commands: group.commands,
            });
        }
    }

    fn push_done(&mut self, entry: Entry) {
        self.done.push_back(entry);
        while self.done.len() > self.config.max_depth {
            self.done.pop_front();
        }
    }
}
