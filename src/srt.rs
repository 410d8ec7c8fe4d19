//! Reading and writing SRT subtitle files.
//!
//! ```text
//! 1
//! 00:00:01,000 --> 00:00:02,500
//! First line of text
//! and its continuation
//!
//! 2
//! ...
//! ```

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{info, warn};

use crate::error::CodecError;
use crate::segment::{Measure, Segment};
use crate::timeline::Timeline;

fn timecode_line() -> &'static Regex {
    static TIMECODE: OnceLock<Regex> = OnceLock::new();
    TIMECODE.get_or_init(|| {
        Regex::new(r"^\s*(\d+):(\d+):(\d+),(\d+)\s*-->\s*(\d+):(\d+):(\d+),(\d+)")
            .expect("timecode pattern is valid")
    })
}

/// `None` when the time does not fit in a `u64` of milliseconds.
pub fn timecode_to_ms(hours: u64, minutes: u64, seconds: u64, millis: u64) -> Option<u64> {
    hours
        .checked_mul(3_600_000)?
        .checked_add(minutes.checked_mul(60_000)?)?
        .checked_add(seconds.checked_mul(1000)?)?
        .checked_add(millis)
}

/// `HH:MM:SS,mmm` as written to SRT files.
pub fn format_srt_timecode(ms: u64) -> String {
    format!(
        "{:02}:{:02}:{:02},{:03}",
        ms / 3_600_000,
        ms % 3_600_000 / 60_000,
        ms % 60_000 / 1000,
        ms % 1000
    )
}

/// `H:MM:SS,mmm` for listings.
pub fn format_clock(ms: u64) -> String {
    format!(
        "{}:{:02}:{:02},{:03}",
        ms / 3_600_000,
        ms % 3_600_000 / 60_000,
        ms % 60_000 / 1000,
        ms % 1000
    )
}

/// Parse the `start --> end` line of a record into milliseconds.
pub fn parse_time_range(line: &str) -> Option<(u64, u64)> {
    let caps = timecode_line().captures(line)?;
    let field = |i: usize| caps[i].parse::<u64>().ok();
    let start = timecode_to_ms(field(1)?, field(2)?, field(3)?, field(4)?)?;
    let end = timecode_to_ms(field(5)?, field(6)?, field(7)?, field(8)?)?;
    Some((start, end))
}

/// Build a timeline from SRT text.
///
/// The sequence number line is not checked. Text runs until the next empty
/// line (a line holding only spaces is still text); its lines are joined with
/// newlines before being split into words.
pub fn parse(content: &str, measure: Measure) -> Result<Timeline, CodecError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.lines().enumerate().peekable();
    let mut timeline = Timeline::with_measure(measure);
    let mut record = 0;

    loop {
        // Skip blank lines between records
        while lines.next_if(|(_, line)| line.trim().is_empty()).is_some() {}
        let Some((_, _sequence)) = lines.next() else {
            break;
        };
        record += 1;

        let Some((number, timing)) = lines.next() else {
            return Err(CodecError::Parse {
                line: content.lines().count(),
                message: format!("record {record} ends before its timecode line"),
            });
        };
        let (start_ms, end_ms) = parse_time_range(timing).ok_or_else(|| CodecError::Parse {
            line: number + 1,
            message: format!("expected `HH:MM:SS,mmm --> HH:MM:SS,mmm`, found {timing:?}"),
        })?;

        let mut text_lines = Vec::new();
        while let Some((_, line)) = lines.next_if(|(_, line)| !line.is_empty()) {
            text_lines.push(line);
        }
        if text_lines.is_empty() {
            warn!(record, "skipping record without text");
            continue;
        }

        timeline
            .append(start_ms, end_ms, &text_lines.join("\n"))
            .map_err(|source| CodecError::Record { record, source })?;
    }

    Ok(timeline)
}

/// The text block written for `segment`.
///
/// An empty line would end the record, so trailing spaces and tabs are
/// trimmed and every line left empty is written as a single space. Reading
/// the block back and writing it again gives the same block.
pub fn text_block(segment: &Segment) -> String {
    segment
        .full_text()
        .trim_end_matches([' ', '\t'])
        .split('\n')
        .map(|line| if line.is_empty() { " " } else { line })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Serialize a timeline, numbering records from 1.
pub fn render(timeline: &Timeline) -> String {
    let mut out = String::new();
    for (index, segment) in timeline.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            format_srt_timecode(segment.start_ms()),
            format_srt_timecode(segment.end_ms()),
            text_block(segment)
        ));
    }
    out
}

/// Index of the first line whose timing or text block does not survive an
/// export followed by a re-import.
pub fn round_trip_mismatch(timeline: &Timeline) -> Result<Option<usize>, CodecError> {
    let reread = parse(&render(timeline), timeline.measure())?;
    let mismatch = timeline
        .iter()
        .zip(reread.iter())
        .position(|(a, b)| {
            a.start_ms() != b.start_ms()
                || a.end_ms() != b.end_ms()
                || text_block(a) != text_block(b)
        })
        .or_else(|| (timeline.len() != reread.len()).then(|| timeline.len().min(reread.len())));
    Ok(mismatch)
}

pub fn read_file(path: &Path, measure: Measure) -> Result<Timeline, CodecError> {
    let content = fs::read_to_string(path).map_err(|source| CodecError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let timeline = parse(&content, measure)?;
    info!(path = %path.display(), lines = timeline.len(), "loaded subtitles");
    Ok(timeline)
}

pub fn write_file(path: &Path, timeline: &Timeline) -> Result<(), CodecError> {
    fs::write(path, render(timeline)).map_err(|source| CodecError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), lines = timeline.len(), "saved subtitles");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppendError;

    const SAMPLE: &str = "1\n00:00:01,000 --> 00:00:02,500\nHello world\n\n2\n00:00:03,000 --> 00:00:04,000\nTwo\nlines\n\n";

    #[test]
    fn timecodes_are_zero_padded() {
        assert_eq!(format_srt_timecode(0), "00:00:00,000");
        assert_eq!(format_srt_timecode(3_723_004), "01:02:03,004");
        assert_eq!(format_clock(3_723_004), "1:02:03,004");
        assert_eq!(format_clock(100 * 3_600_000), "100:00:00,000");
    }

    #[test]
    fn time_range_tolerates_loose_spacing() {
        assert_eq!(
            parse_time_range("0:0:1,5 -->  00:00:02,500"),
            Some((1005, 2500))
        );
        assert_eq!(parse_time_range("00:00:01.000 --> 00:00:02.000"), None);
    }

    #[test]
    fn parses_records() {
        let timeline = parse(SAMPLE, Measure::default()).unwrap();
        assert_eq!(timeline.len(), 2);
        let second = &timeline.segments()[1];
        assert_eq!(second.start_ms(), 3000);
        assert_eq!(second.duration_ms(), 1000);
        assert_eq!(second.full_text(), "Two\nlines");
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn render_matches_input() {
        let timeline = parse(SAMPLE, Measure::default()).unwrap();
        assert_eq!(render(&timeline), SAMPLE);
    }

    #[test]
    fn tolerates_bom_crlf_and_extra_blank_lines() {
        let content = "\u{feff}\r\n1\r\n00:00:01,000 --> 00:00:02,000\r\nHi\r\n\r\n\r\n2\r\n00:00:02,000 --> 00:00:03,000\r\nthere\r\n";
        let timeline = parse(content, Measure::default()).unwrap();
        let texts: Vec<_> = timeline.iter().map(|s| s.full_text()).collect();
        assert_eq!(texts, ["Hi", "there"]);
    }

    #[test]
    fn rejects_garbled_timecode() {
        let err = parse("1\nnot a timecode\nHi\n", Measure::default()).unwrap_err();
        assert!(matches!(err, CodecError::Parse { line: 2, .. }), "{err}");
    }

    #[test]
    fn rejects_overlapping_records() {
        let content = "1\n00:00:01,000 --> 00:00:03,000\nA\n\n2\n00:00:02,000 --> 00:00:04,000\nB\n";
        let err = parse(content, Measure::default()).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Record {
                record: 2,
                source: AppendError::Occupied { .. }
            }
        ));
    }

    #[test]
    fn skips_record_without_text() {
        let content = "1\n00:00:01,000 --> 00:00:02,000\n\n2\n00:00:03,000 --> 00:00:04,000\nB\n";
        let timeline = parse(content, Measure::default()).unwrap();
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.segments()[0].full_text(), "B");
    }

    #[test]
    fn parsed_files_survive_round_trip() {
        let timeline = parse(SAMPLE, Measure::default()).unwrap();
        assert_eq!(round_trip_mismatch(&timeline).unwrap(), None);
    }

    #[test]
    fn empty_lines_are_written_as_a_space() {
        let mut timeline = Timeline::new();
        timeline.append(0, 1000, "a\n\nb").unwrap();
        timeline.append(1000, 2000, "\nstart").unwrap();
        timeline.append(2000, 3000, "end\n\t").unwrap();
        timeline.append(3000, 4000, "  ").unwrap();

        let blocks: Vec<_> = timeline.iter().map(text_block).collect();
        assert_eq!(blocks, ["a\n \nb", " \nstart", "end\n ", " "]);

        let rendered = render(&timeline);
        let reread = parse(&rendered, Measure::default()).unwrap();
        assert_eq!(reread.len(), 4);
        assert_eq!(render(&reread), rendered);
        assert_eq!(round_trip_mismatch(&timeline).unwrap(), None);
    }

    #[test]
    fn whitespace_line_stays_inside_record() {
        let content = "1\n00:00:00,000 --> 00:00:03,000\na\n \nb\n\n2\n00:00:03,000 --> 00:00:04,000\nc\n";
        let timeline = parse(content, Measure::default()).unwrap();
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.segments()[0].full_text(), "a\n \nb");
        assert_eq!(timeline.segments()[1].full_text(), "c");
    }

    #[test]
    fn huge_hour_field_is_a_parse_error() {
        assert_eq!(timecode_to_ms(u64::MAX / 1000, 0, 0, 0), None);
        assert_eq!(timecode_to_ms(1, 2, 3, 4), Some(3_723_004));

        let content = "1\n9999999999999999:00:00,000 --> 9999999999999999:00:01,000\nx\n";
        let err = parse(content, Measure::default()).unwrap_err();
        assert!(matches!(err, CodecError::Parse { line: 2, .. }), "{err}");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = read_file(Path::new("/nonexistent/subs.srt"), Measure::default()).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/subs.srt"));
    }
}
