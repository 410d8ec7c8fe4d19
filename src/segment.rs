use unicode_width::UnicodeWidthStr;

use crate::token::{self, Token};

// Columns of padding drawn on each side of a word block
pub const DEFAULT_TOKEN_PADDING: usize = 1;

/// How word blocks are measured for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measure {
    pub token_padding: usize,
}

impl Default for Measure {
    fn default() -> Self {
        Measure {
            token_padding: DEFAULT_TOKEN_PADDING,
        }
    }
}

impl Measure {
    pub fn new(token_padding: usize) -> Measure {
        Measure { token_padding }
    }

    /// Terminal columns taken by one word block, padding included.
    pub fn token_width(&self, token: &Token) -> usize {
        token.text.width() + 2 * self.token_padding
    }
}

/// A timed subtitle line.
///
/// `width` and `full_text` are caches derived from `tokens`; every mutation
/// of `tokens` must be followed by [`Segment::refresh`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub(crate) start_ms: u64,
    pub(crate) duration_ms: u64,
    pub(crate) tokens: Vec<Token>,
    width: usize,
    full_text: String,
}

impl Segment {
    pub fn new(start_ms: u64, duration_ms: u64, tokens: Vec<Token>, measure: Measure) -> Segment {
        let mut segment = Segment {
            start_ms,
            duration_ms,
            tokens,
            width: 0,
            full_text: String::new(),
        };
        segment.refresh(measure);
        segment
    }

    /// A segment with no words yet. Only valid as an intermediate state.
    pub(crate) fn placeholder(start_ms: u64, duration_ms: u64) -> Segment {
        Segment {
            start_ms,
            duration_ms,
            tokens: Vec::new(),
            width: 0,
            full_text: String::new(),
        }
    }

    pub fn start_ms(&self) -> u64 {
        self.start_ms
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn end_ms(&self) -> u64 {
        self.start_ms + self.duration_ms
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    pub fn recompute_width(&mut self, width_fn: impl Fn(&Token) -> usize) {
        self.width = self.tokens.iter().map(width_fn).sum();
    }

    pub fn recompute_full_text(&mut self) {
        self.full_text = token::join(&self.tokens);
    }

    pub fn refresh(&mut self, measure: Measure) {
        self.recompute_width(|t| measure.token_width(t));
        self.recompute_full_text();
    }

    pub(crate) fn is_cache_fresh(&self, measure: Measure) -> bool {
        let width: usize = self.tokens.iter().map(|t| measure.token_width(t)).sum();
        width == self.width && token::join(&self.tokens) == self.full_text
    }

    pub(crate) fn set_last_delimiter(&mut self, delimiter: Option<token::Delimiter>) {
        if let Some(last) = self.tokens.last_mut() {
            last.delimiter = delimiter;
        }
    }

    pub(crate) fn last_delimiter(&self) -> Option<token::Delimiter> {
        self.tokens.last().and_then(|t| t.delimiter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tokenize;

    #[test]
    fn caches_follow_tokens() {
        let segment = Segment::new(500, 1500, tokenize("Hi there"), Measure::default());
        assert_eq!(segment.full_text(), "Hi there");
        // "Hi" + "there" plus one column of padding on each side of each word
        assert_eq!(segment.width(), 2 + 5 + 4);
        assert_eq!(segment.end_ms(), 2000);
    }

    #[test]
    fn wide_characters_count_double() {
        let measure = Measure::new(0);
        let segment = Segment::new(0, 10, tokenize("日本"), measure);
        assert_eq!(segment.width(), 4);
    }

    #[test]
    fn refresh_after_mutation() {
        let measure = Measure::default();
        let mut segment = Segment::new(0, 10, tokenize("a b"), measure);
        segment.tokens.pop();
        segment.set_last_delimiter(None);
        assert!(!segment.is_cache_fresh(measure));
        segment.refresh(measure);
        assert!(segment.is_cache_fresh(measure));
        assert_eq!(segment.full_text(), "a");
    }
}
