//! Reorganize the line breaks of SRT subtitles.
//!
//! Subtitle lines are [`Segment`]s of word [`Token`]s on a [`Timeline`].
//! Words move between neighbouring lines, lines split in two and words get
//! edited, all through [`Command`]s kept in a [`History`] so every edit can be
//! undone and redone exactly. When words move, the duration of the lines
//! involved is shared out in proportion to the number of words moved.

pub mod command;
pub mod editor;
pub mod error;
pub mod history;
pub mod script;
pub mod segment;
pub mod srt;
pub mod timeline;
pub mod token;

pub use command::Command;
pub use editor::{Editor, Operation};
pub use error::{AppendError, CodecError, EditError, InvariantViolation, ScriptError};
pub use history::{History, HistoryConfig};
pub use segment::{Measure, Segment};
pub use timeline::Timeline;
pub use token::{Delimiter, Token};
