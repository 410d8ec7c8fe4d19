use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to read or write a subtitle file. The timeline being loaded into
/// is never touched when one of these is returned.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Cannot access SRT file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed SRT at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Record {record}: {source}")]
    Record {
        record: usize,
        #[source]
        source: AppendError,
    },
}

/// Reasons a timed line cannot be appended to a timeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppendError {
    #[error("starts at {start_ms}ms, before the previous line ends at {previous_end_ms}ms")]
    Occupied { start_ms: u64, previous_end_ms: u64 },

    #[error("ends at {end_ms}ms, before it starts at {start_ms}ms")]
    InvertedRange { start_ms: u64, end_ms: u64 },

    #[error("has no words")]
    Empty,
}

/// An operation that cannot be performed on the current timeline.
///
/// These are reported to the user as a no-op notice; no command is ever
/// constructed for them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("{0}")]
    NoTarget(&'static str),

    #[error("Line {segment} does not exist, the timeline has {len} lines")]
    SegmentOutOfRange { segment: usize, len: usize },

    #[error("Word {token} does not exist, line {segment} has {len} words")]
    TokenOutOfRange {
        segment: usize,
        token: usize,
        len: usize,
    },
}

/// A broken timeline invariant. Seeing one of these means an engine bug.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("segment {segment} has no words")]
    EmptySegment { segment: usize },

    #[error("segment {segment} starts before segment {previous}")]
    Unordered { segment: usize, previous: usize },

    #[error("segment {segment} overlaps the segment after it")]
    Overlap { segment: usize },

    #[error("word {token} of segment {segment} has no delimiter but is not last")]
    MissingDelimiter { segment: usize, token: usize },

    #[error("last word of segment {segment} carries a delimiter")]
    TrailingDelimiter { segment: usize },

    #[error("cached width or text of segment {segment} is stale")]
    StaleCache { segment: usize },
}

/// A line of an edit script that cannot be understood.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Script line {line}: {message}")]
pub struct ScriptError {
    pub line: usize,
    pub message: String,
}
