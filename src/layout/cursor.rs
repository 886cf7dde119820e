//! # Page Break Decisions
//!
//! The write cursor and the rules that decide when it moves to a new page.
//!
//! Two checks run at different points of a question/answer pair:
//!
//! - before a question, the question plus one more line must still fit above
//!   the bottom margin, so a question never sits alone at the foot of a page;
//! - after an answer, a cursor that has dropped below the bottom margin
//!   records a deferred break, which is taken only if another line follows.
//!
//! The functions here are pure so the policy can be checked without building
//! a document.

use crate::template::ContentBounds;

/// Where the next line goes.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    /// Index of the page being written, into the page store.
    pub page_index: usize,
    /// Baseline of the next line, in PDF user space.
    pub y: f64,
    /// Left margin offset every line starts at.
    pub left: f64,
    /// Top of the usable area; `y` starts here on a fresh page.
    pub top: f64,
    /// Bottom of the usable area.
    pub bottom: f64,
    /// A deferred break is waiting for the next line.
    pub break_pending: bool,
}

impl Cursor {
    pub fn new(page_index: usize, bounds: ContentBounds) -> Self {
        Self {
            page_index,
            y: bounds.top,
            left: bounds.left,
            top: bounds.top,
            bottom: bounds.bottom,
            break_pending: false,
        }
    }

    /// Move to the top of another page. The page index never goes back.
    pub fn reset(&mut self, page_index: usize, bounds: ContentBounds) {
        debug_assert!(page_index >= self.page_index, "cursor moved back a page");
        *self = Cursor::new(page_index, bounds);
    }

    /// Move down by one line.
    pub fn feed(&mut self, line_height: f64) {
        self.y -= line_height;
    }
}

/// What to do about the page before or after drawing a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakDecision {
    /// Keep writing on the current page.
    Stay,
    /// Start a new page before drawing.
    NewPage,
    /// The page is used up. Start a new page only when another line is drawn.
    Deferred,
}

/// Checked before a question line is drawn.
pub fn before_question(cursor: &Cursor, line_height: f64) -> BreakDecision {
    if cursor.break_pending || cursor.y - line_height < cursor.bottom {
        BreakDecision::NewPage
    } else {
        BreakDecision::Stay
    }
}

/// Checked before an answer line is drawn.
pub fn before_answer(cursor: &Cursor) -> BreakDecision {
    if cursor.break_pending {
        BreakDecision::NewPage
    } else {
        BreakDecision::Stay
    }
}

/// Checked after an answer line and its trailing space have been fed.
pub fn after_answer(cursor: &Cursor) -> BreakDecision {
    if cursor.y < cursor.bottom {
        BreakDecision::Deferred
    } else {
        BreakDecision::Stay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor_at(y: f64) -> Cursor {
        let mut cursor = Cursor::new(
            0,
            ContentBounds {
                left: 72.0,
                top: 770.0,
                bottom: 72.0,
            },
        );
        cursor.y = y;
        cursor
    }

    #[test]
    fn question_fits_with_room_for_one_more_line() {
        assert_eq!(before_question(&cursor_at(92.0), 20.0), BreakDecision::Stay);
    }

    #[test]
    fn question_moves_when_next_line_would_cross_bottom() {
        assert_eq!(before_question(&cursor_at(91.9), 20.0), BreakDecision::NewPage);
    }

    #[test]
    fn question_takes_pending_break() {
        let mut cursor = cursor_at(500.0);
        cursor.break_pending = true;
        assert_eq!(before_question(&cursor, 20.0), BreakDecision::NewPage);
    }

    #[test]
    fn answer_only_breaks_when_pending() {
        assert_eq!(before_answer(&cursor_at(10.0)), BreakDecision::Stay);
        let mut cursor = cursor_at(10.0);
        cursor.break_pending = true;
        assert_eq!(before_answer(&cursor), BreakDecision::NewPage);
    }

    #[test]
    fn answer_defers_below_bottom() {
        assert_eq!(after_answer(&cursor_at(72.0)), BreakDecision::Stay);
        assert_eq!(after_answer(&cursor_at(71.9)), BreakDecision::Deferred);
    }

    #[test]
    fn reset_returns_to_top_and_clears_pending() {
        let mut cursor = cursor_at(40.0);
        cursor.break_pending = true;
        cursor.reset(
            1,
            ContentBounds {
                left: 10.0,
                top: 300.0,
                bottom: 20.0,
            },
        );
        assert_eq!(cursor.page_index, 1);
        assert_eq!(cursor.y, 300.0);
        assert_eq!(cursor.left, 10.0);
        assert_eq!(cursor.bottom, 20.0);
        assert!(!cursor.break_pending);
    }

    #[test]
    fn feed_moves_down() {
        let mut cursor = cursor_at(100.0);
        cursor.feed(20.0);
        cursor.feed(20.0);
        assert_eq!(cursor.y, 60.0);
    }
}
