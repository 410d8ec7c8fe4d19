use crate::error::{AppendError, InvariantViolation};
use crate::segment::{Measure, Segment};
use crate::token;

/// All subtitle lines of a session, ordered by start time.
///
/// Outside of reading, the timeline is only changed by commands run through a
/// [`History`](crate::history::History).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    segments: Vec<Segment>,
    measure: Measure,
}

impl Timeline {
    pub fn new() -> Timeline {
        Timeline::default()
    }

    pub fn with_measure(measure: Measure) -> Timeline {
        Timeline {
            segments: Vec::new(),
            measure,
        }
    }

    pub fn measure(&self) -> Measure {
        self.measure
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    /// Sum of all segment durations.
    pub fn total_duration(&self) -> u64 {
        self.segments.iter().map(|s| s.duration_ms).sum()
    }

    /// Index of the segment playing at `at_ms`, if any.
    pub fn segment_at(&self, at_ms: u64) -> Option<usize> {
        let after = self.segments.partition_point(|s| s.start_ms <= at_ms);
        let index = after.checked_sub(1)?;
        (self.segments[index].end_ms() > at_ms).then_some(index)
    }

    /// Add a line after the last one, splitting `text` into words.
    pub fn append(&mut self, start_ms: u64, end_ms: u64, text: &str) -> Result<(), AppendError> {
        if end_ms < start_ms {
            return Err(AppendError::InvertedRange { start_ms, end_ms });
        }
        if let Some(last) = self.segments.last() {
            if start_ms < last.end_ms() {
                return Err(AppendError::Occupied {
                    start_ms,
                    previous_end_ms: last.end_ms(),
                });
            }
        }
        let tokens = token::tokenize(text);
        if tokens.is_empty() {
            return Err(AppendError::Empty);
        }
        self.segments
            .push(Segment::new(start_ms, end_ms - start_ms, tokens, self.measure));
        Ok(())
    }

    /// Verify the at-rest invariants that every command must preserve.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for (index, segment) in self.segments.iter().enumerate() {
            if segment.tokens.is_empty() {
                return Err(InvariantViolation::EmptySegment { segment: index });
            }
            let last = segment.tokens.len() - 1;
            for (t, tok) in segment.tokens.iter().enumerate() {
                if t < last && tok.delimiter.is_none() {
                    return Err(InvariantViolation::MissingDelimiter {
                        segment: index,
                        token: t,
                    });
                }
            }
            if segment.tokens[last].delimiter.is_some() {
                return Err(InvariantViolation::TrailingDelimiter { segment: index });
            }
            if !segment.is_cache_fresh(self.measure) {
                return Err(InvariantViolation::StaleCache { segment: index });
            }
            if let Some(next) = self.segments.get(index + 1) {
                if next.start_ms < segment.start_ms {
                    return Err(InvariantViolation::Unordered {
                        segment: index + 1,
                        previous: index,
                    });
                }
                if segment.end_ms() > next.start_ms {
                    return Err(InvariantViolation::Overlap { segment: index });
                }
            }
        }
        Ok(())
    }

    /// Panic on a broken invariant. Compiled out of release builds.
    pub fn assert_invariants(&self) {
        if cfg!(debug_assertions) {
            if let Err(violation) = self.check_invariants() {
                panic!("timeline invariant broken: {violation}");
            }
        }
    }

    pub(crate) fn segment_mut(&mut self, index: usize) -> &mut Segment {
        &mut self.segments[index]
    }

    /// Mutable access to two distinct segments at once.
    pub(crate) fn pair_mut(&mut self, a: usize, b: usize) -> (&mut Segment, &mut Segment) {
        assert_ne!(a, b, "pair_mut needs two distinct segments");
        if a < b {
            let (head, tail) = self.segments.split_at_mut(b);
            (&mut head[a], &mut tail[0])
        } else {
            let (head, tail) = self.segments.split_at_mut(a);
            (&mut tail[0], &mut head[b])
        }
    }

    pub(crate) fn insert(&mut self, index: usize, segment: Segment) {
        self.segments.insert(index, segment);
    }

    pub(crate) fn remove(&mut self, index: usize) -> Segment {
        self.segments.remove(index)
    }

    pub(crate) fn refresh(&mut self, index: usize) {
        let measure = self.measure;
        self.segments[index].refresh(measure);
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}
