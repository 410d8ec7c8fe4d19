//! Property tests for the command engine.
//!
//! Validates:
//! - apply followed by revert restores the timeline field for field.
//! - Merges and splits conserve the total duration.
//! - Whole-line merges remove exactly one line, splits add exactly one.
//! - Every command leaves the delimiter shape intact.
//! - Random edit sequences undo back to the start and redo to the end.
//! - Export followed by import keeps timing and text.

use proptest::prelude::*;

use reflow::command::{
    ChangeToken, InsertTokens, MergeToNextLine, MergeToPrevLine, RemoveToken, SplitToNextLine,
    SplitToPrevLine,
};
use reflow::{srt, Command, History, HistoryConfig, Measure, Timeline, Token};

// ============================================================================
// Strategy helpers
// ============================================================================

#[derive(Debug, Clone)]
struct Line {
    gap: u64,
    duration: u64,
    text: Vec<String>,
}

/// One line of record text. Runs of spaces and tabs, leading and trailing
/// whitespace and whitespace-only lines all occur; an empty line would end
/// the record, so none is generated.
fn text_line_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => prop::collection::vec(("[ \t]{0,3}", "[a-zA-Z']{1,6}"), 1..5)
            .prop_flat_map(|words| ("[ \t]{0,2}", Just(words)))
            .prop_map(|(trailing, words)| {
                let mut line: String = words
                    .into_iter()
                    .map(|(run, word)| format!("{run}{word}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                line.push_str(&trailing);
                line
            }),
        1 => "[ \t]{1,3}",
    ]
}

fn line_strategy() -> impl Strategy<Value = Line> {
    (
        0u64..500,
        0u64..10_000,
        prop::collection::vec(text_line_strategy(), 1..4),
    )
        .prop_map(|(gap, duration, text)| Line {
            gap,
            duration,
            text,
        })
}

/// Timelines imported from generated SRT text.
fn timeline_strategy() -> impl Strategy<Value = Timeline> {
    prop::collection::vec(line_strategy(), 1..6).prop_map(|lines| {
        let mut content = String::new();
        let mut start = 0;
        for (index, line) in lines.iter().enumerate() {
            start += line.gap;
            content.push_str(&format!(
                "{}\n{} --> {}\n{}\n\n",
                index + 1,
                srt::format_srt_timecode(start),
                srt::format_srt_timecode(start + line.duration),
                line.text.join("\n")
            ));
            start += line.duration;
        }
        srt::parse(&content, Measure::default()).expect("generated records always import")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    MergePrev,
    MergeNext,
    SplitNext,
    SplitPrev,
    Change,
    Insert,
    Remove,
}

#[derive(Debug, Clone)]
struct Op {
    kind: Kind,
    segment_seed: usize,
    token_seed: usize,
    words: Vec<String>,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    (
        prop_oneof![
            Just(Kind::MergePrev),
            Just(Kind::MergeNext),
            Just(Kind::SplitNext),
            Just(Kind::SplitPrev),
            Just(Kind::Change),
            Just(Kind::Insert),
            Just(Kind::Remove),
        ],
        any::<usize>(),
        any::<usize>(),
        prop::collection::vec("[a-z]{1,5}", 1..4),
    )
        .prop_map(|(kind, segment_seed, token_seed, words)| Op {
            kind,
            segment_seed,
            token_seed,
            words,
        })
}

/// Turn random seeds into a command that is valid for `timeline`, the way an
/// orchestrating layer would. `None` when the kind has no target.
fn build(timeline: &Timeline, op: &Op) -> Option<Command> {
    let lines = timeline.len();
    if lines == 0 {
        return None;
    }
    let pick = |seed: usize, n: usize| seed % n;

    let cmd = match op.kind {
        Kind::MergePrev => {
            if lines < 2 {
                return None;
            }
            let i = 1 + pick(op.segment_seed, lines - 1);
            let k = pick(op.token_seed, timeline.segments()[i].len());
            MergeToPrevLine::new(i, k, i - 1).into()
        }
        Kind::MergeNext => {
            if lines < 2 {
                return None;
            }
            let i = pick(op.segment_seed, lines - 1);
            let k = pick(op.token_seed, timeline.segments()[i].len());
            MergeToNextLine::new(i, k, i + 1).into()
        }
        Kind::SplitNext | Kind::SplitPrev => {
            let i = pick(op.segment_seed, lines);
            let n = timeline.segments()[i].len();
            if n < 2 {
                return None;
            }
            if op.kind == Kind::SplitNext {
                SplitToNextLine::new(i, 1 + pick(op.token_seed, n - 1)).into()
            } else {
                SplitToPrevLine::new(i, pick(op.token_seed, n - 1)).into()
            }
        }
        Kind::Change => {
            let i = pick(op.segment_seed, lines);
            let k = pick(op.token_seed, timeline.segments()[i].len());
            ChangeToken::new(i, k, Token::last(op.words[0].clone())).into()
        }
        Kind::Insert => {
            let i = pick(op.segment_seed, lines);
            let k = pick(op.token_seed, timeline.segments()[i].len() + 1);
            let run = op.words.iter().map(|w| Token::last(w.clone())).collect();
            InsertTokens::new(i, k, run).into()
        }
        Kind::Remove => {
            let i = pick(op.segment_seed, lines);
            let k = pick(op.token_seed, timeline.segments()[i].len());
            RemoveToken::new(i, k).into()
        }
    };
    Some(cmd)
}

fn is_merge_or_split(cmd: &Command) -> bool {
    matches!(
        cmd,
        Command::MergeToPrevLine(_)
            | Command::MergeToNextLine(_)
            | Command::SplitToNextLine(_)
            | Command::SplitToPrevLine(_)
    )
}

// ============================================================================
// Single commands
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn revert_restores_exact_state(timeline in timeline_strategy(), op in op_strategy()) {
        let Some(mut cmd) = build(&timeline, &op) else {
            return Ok(());
        };
        let mut edited = timeline.clone();
        cmd.apply(&mut edited);
        prop_assert_eq!(edited.check_invariants(), Ok(()));
        cmd.revert(&mut edited);
        prop_assert_eq!(edited.check_invariants(), Ok(()));
        prop_assert_eq!(edited, timeline);
    }

    #[test]
    fn merges_and_splits_conserve_duration(timeline in timeline_strategy(), op in op_strategy()) {
        let Some(mut cmd) = build(&timeline, &op) else {
            return Ok(());
        };
        prop_assume!(is_merge_or_split(&cmd));

        let mut edited = timeline.clone();
        cmd.apply(&mut edited);
        prop_assert_eq!(edited.total_duration(), timeline.total_duration());
        cmd.revert(&mut edited);
        prop_assert_eq!(edited.total_duration(), timeline.total_duration());
    }

    #[test]
    fn line_count_moves_by_one(timeline in timeline_strategy(), op in op_strategy()) {
        let Some(mut cmd) = build(&timeline, &op) else {
            return Ok(());
        };
        let mut edited = timeline.clone();
        let words_before: usize = timeline.iter().map(|s| s.len()).sum();
        cmd.apply(&mut edited);

        match &cmd {
            Command::SplitToNextLine(_) | Command::SplitToPrevLine(_) => {
                prop_assert_eq!(edited.len(), timeline.len() + 1);
            }
            Command::MergeToPrevLine(_) | Command::MergeToNextLine(_) => {
                let words_after: usize = edited.iter().map(|s| s.len()).sum();
                prop_assert_eq!(words_after, words_before);
                prop_assert!(edited.len() == timeline.len() || edited.len() + 1 == timeline.len());
            }
            _ => {}
        }

        cmd.revert(&mut edited);
        prop_assert_eq!(edited.len(), timeline.len());
    }
}

// ============================================================================
// Sequences through the history
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn undo_all_then_redo_all(timeline in timeline_strategy(), ops in prop::collection::vec(op_strategy(), 1..25)) {
        let mut edited = timeline.clone();
        let mut history = History::new(HistoryConfig::unlimited());
        let mut executed = 0;

        for op in &ops {
            if let Some(cmd) = build(&edited, op) {
                history.execute(cmd, &mut edited);
                prop_assert_eq!(edited.check_invariants(), Ok(()));
                executed += 1;
            }
        }
        let end = edited.clone();
        prop_assert_eq!(history.undo_depth(), executed);

        while history.undo(&mut edited).is_some() {
            prop_assert_eq!(edited.check_invariants(), Ok(()));
        }
        prop_assert_eq!(&edited, &timeline);

        while history.redo(&mut edited).is_some() {}
        prop_assert_eq!(&edited, &end);
    }

    #[test]
    fn grouped_steps_undo_together(timeline in timeline_strategy(), ops in prop::collection::vec(op_strategy(), 1..10)) {
        let mut edited = timeline.clone();
        let mut history = History::new(HistoryConfig::unlimited());

        history.begin_group("batch");
        for op in &ops {
            if let Some(cmd) = build(&edited, op) {
                history.execute(cmd, &mut edited);
            }
        }
        history.end_group();

        prop_assert!(history.undo_depth() <= 1);
        history.undo(&mut edited);
        prop_assert_eq!(&edited, &timeline);
    }

    #[test]
    fn export_import_keeps_timing_and_text(timeline in timeline_strategy()) {
        let rendered = srt::render(&timeline);
        let reread = srt::parse(&rendered, timeline.measure()).unwrap();
        prop_assert_eq!(reread.len(), timeline.len());
        for (a, b) in timeline.iter().zip(reread.iter()) {
            prop_assert_eq!(a.start_ms(), b.start_ms());
            prop_assert_eq!(a.end_ms(), b.end_ms());
            prop_assert_eq!(srt::text_block(a), srt::text_block(b));
        }
        prop_assert_eq!(srt::render(&reread), rendered);
    }

    #[test]
    fn edited_timelines_still_export_cleanly(timeline in timeline_strategy(), ops in prop::collection::vec(op_strategy(), 1..15)) {
        let mut edited = timeline.clone();
        let mut history = History::default();
        for op in &ops {
            if let Some(cmd) = build(&edited, op) {
                history.execute(cmd, &mut edited);
            }
        }
        prop_assert_eq!(srt::round_trip_mismatch(&edited).unwrap(), None);
        let rendered = srt::render(&edited);
        let reread = srt::parse(&rendered, edited.measure()).unwrap();
        prop_assert_eq!(srt::render(&reread), rendered);
    }
}
