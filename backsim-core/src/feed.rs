//! BarFeed — read-only, ordered traversal over historical bars.
//!
//! The feed owns a cursor over an immutable bar sequence. Consumers read
//! through `current()`/`previous()` and move the cursor with `advance()`;
//! `reset()` rewinds so the same data can be replayed without rebuilding.

use crate::domain::Bar;
use thiserror::Error;

/// Errors from feed traversal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeedError {
    #[error("feed cursor not established; call reset() or advance() first")]
    OutOfRange,
}

/// Cursor-based traversal over a bar sequence sorted ascending by date.
///
/// The upstream contract guarantees unique, strictly increasing dates; the
/// feed does not re-validate gaps or calendar correctness.
#[derive(Debug, Clone)]
pub struct BarFeed {
    bars: Vec<Bar>,
    cursor: Option<usize>,
}

impl BarFeed {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self { bars, cursor: None }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Zero-based cursor index, if traversal has started.
    pub fn position(&self) -> Option<usize> {
        self.cursor
    }

    /// The bar under the cursor.
    pub fn current(&self) -> Result<&Bar, FeedError> {
        self.cursor
            .and_then(|i| self.bars.get(i))
            .ok_or(FeedError::OutOfRange)
    }

    /// The bar immediately before the cursor; `None` at the first bar.
    pub fn previous(&self) -> Result<Option<&Bar>, FeedError> {
        match self.cursor {
            None => Err(FeedError::OutOfRange),
            Some(0) => Ok(None),
            Some(i) => Ok(self.bars.get(i - 1)),
        }
    }

    /// Move the cursor forward one position. From the unstarted state this
    /// establishes the cursor at the first bar. Returns whether a bar
    /// remains under the cursor after the move.
    pub fn advance(&mut self) -> bool {
        match self.cursor {
            None => {
                if self.bars.is_empty() {
                    false
                } else {
                    self.cursor = Some(0);
                    true
                }
            }
            Some(i) => {
                if i + 1 >= self.bars.len() {
                    false
                } else {
                    self.cursor = Some(i + 1);
                    true
                }
            }
        }
    }

    /// Rewind to the first bar (no cursor on an empty feed).
    pub fn reset(&mut self) {
        self.cursor = if self.bars.is_empty() { None } else { Some(0) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bars(n: usize) -> Vec<Bar> {
        let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        (0..n)
            .map(|i| Bar {
                date: base + chrono::Duration::days(i as i64),
                open: 10.0 + i as f64,
                high: 11.0 + i as f64,
                low: 9.0 + i as f64,
                close: 10.5 + i as f64,
                pct_chg: None,
            })
            .collect()
    }

    #[test]
    fn current_before_traversal_is_out_of_range() {
        let feed = BarFeed::new(bars(3));
        assert_eq!(feed.current().unwrap_err(), FeedError::OutOfRange);
        assert_eq!(feed.previous().unwrap_err(), FeedError::OutOfRange);
    }

    #[test]
    fn reset_establishes_first_bar() {
        let mut feed = BarFeed::new(bars(3));
        feed.reset();
        assert_eq!(feed.position(), Some(0));
        assert_eq!(feed.current().unwrap().open, 10.0);
        assert_eq!(feed.previous().unwrap(), None);
    }

    #[test]
    fn advance_walks_to_end() {
        let mut feed = BarFeed::new(bars(3));
        feed.reset();
        assert!(feed.advance());
        assert_eq!(feed.previous().unwrap().unwrap().open, 10.0);
        assert!(feed.advance());
        assert_eq!(feed.position(), Some(2));
        // at the last bar: no bar remains
        assert!(!feed.advance());
        assert_eq!(feed.position(), Some(2));
    }

    #[test]
    fn advance_from_unstarted_establishes_cursor() {
        let mut feed = BarFeed::new(bars(2));
        assert!(feed.advance());
        assert_eq!(feed.position(), Some(0));
    }

    #[test]
    fn empty_feed_never_yields() {
        let mut feed = BarFeed::new(Vec::new());
        feed.reset();
        assert!(!feed.advance());
        assert_eq!(feed.current().unwrap_err(), FeedError::OutOfRange);
    }

    #[test]
    fn reset_enables_replay() {
        let mut feed = BarFeed::new(bars(2));
        feed.reset();
        while feed.advance() {}
        feed.reset();
        assert_eq!(feed.position(), Some(0));
        assert_eq!(feed.current().unwrap().open, 10.0);
    }
}
