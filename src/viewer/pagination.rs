//! Cursor arithmetic for the two-page book viewer.
//!
//! Spread 0 is the cover. Spread `k >= 1` shows pages `2(k-1)` and
//! `2(k-1)+1` (0-based). A book of `n` pages has `ceil(n/2)` content spreads,
//! so the last spread is `ceil(n/2)` and an empty book never leaves the cover.

use crate::models::{Book, Illustration, Page};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    cursor: usize,
    page_count: usize,
}

impl Pagination {
    /// Starts on the cover.
    pub fn new(page_count: usize) -> Self {
        Self {
            cursor: 0,
            page_count,
        }
    }

    /// Restores a cursor carried across requests, clamped into range.
    pub fn restore(page_count: usize, cursor: usize) -> Self {
        let mut pagination = Self::new(page_count);
        pagination.cursor = cursor.min(pagination.last_spread());
        pagination
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn last_spread(&self) -> usize {
        self.page_count.div_ceil(2)
    }

    pub fn is_cover(&self) -> bool {
        self.cursor == 0
    }

    pub fn is_terminal(&self) -> bool {
        self.cursor == self.last_spread()
    }

    /// Moves one spread forward. Returns false when already on the last spread.
    pub fn advance(&mut self) -> bool {
        let next = (self.cursor + 1).min(self.last_spread());
        let moved = next != self.cursor;
        self.cursor = next;
        moved
    }

    /// Moves one spread back. Returns false when already on the cover.
    pub fn retreat(&mut self) -> bool {
        let moved = self.cursor > 0;
        self.cursor = self.cursor.saturating_sub(1);
        moved
    }

    /// Cursor one step forward, without moving.
    pub fn next(&self) -> usize {
        let mut moved = *self;
        moved.advance();
        moved.cursor
    }

    /// Cursor one step back, without moving.
    pub fn previous(&self) -> usize {
        let mut moved = *self;
        moved.retreat();
        moved.cursor
    }

    /// 0-based page index in the left slot. `None` on the cover.
    pub fn left_index(&self) -> Option<usize> {
        self.cursor.checked_sub(1).map(|spread| spread * 2)
    }

    /// May point past the last page on odd page counts.
    pub fn right_index(&self) -> Option<usize> {
        self.left_index().map(|left| left + 1)
    }
}

/// What one half of a spread shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot<'a> {
    Cover {
        title: &'a str,
        illustration: Option<&'a Illustration>,
    },
    Page(&'a Page),
    Empty,
}

impl Slot<'_> {
    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spread<'a> {
    pub cursor: usize,
    pub left: Slot<'a>,
    pub right: Slot<'a>,
}

impl<'a> Spread<'a> {
    pub fn of(book: &'a Book, pagination: &Pagination) -> Self {
        let slot = |index: Option<usize>| {
            index
                .and_then(|index| book.page(index))
                .map_or(Slot::Empty, Slot::Page)
        };

        let (left, right) = if pagination.is_cover() {
            let cover = Slot::Cover {
                title: &book.title,
                illustration: book.cover.as_ref(),
            };
            (cover, Slot::Empty)
        } else {
            (slot(pagination.left_index()), slot(pagination.right_index()))
        };

        Self {
            cursor: pagination.cursor(),
            left,
            right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookType;

    fn book_with_pages(n: usize) -> Book {
        Book::new(
            "Test",
            BookType::Story,
            (0..n).map(|i| (format!("page {i}"), Illustration::fallback(format!("picture {i}")))),
        )
    }

    #[test]
    fn starts_on_cover() {
        let pagination = Pagination::new(6);
        assert_eq!(pagination.cursor(), 0);
        assert!(pagination.is_cover());
        assert_eq!(pagination.left_index(), None);
        assert_eq!(pagination.right_index(), None);
    }

    #[test]
    fn reaches_terminal_in_ceil_half_steps() {
        for n in 0..=13 {
            let mut pagination = Pagination::new(n);
            let last = n.div_ceil(2);
            for _ in 0..last {
                assert!(pagination.advance());
            }
            assert_eq!(pagination.cursor(), last);
            assert!(pagination.is_terminal());

            assert!(!pagination.advance());
            assert!(!pagination.advance());
            assert_eq!(pagination.cursor(), last, "advance must be idempotent at n={n}");
        }
    }

    #[test]
    fn retreat_undoes_advance_away_from_boundaries() {
        for n in 0..=9 {
            for start in 0..=Pagination::new(n).last_spread() {
                let mut pagination = Pagination::restore(n, start);
                let moved = pagination.advance();
                pagination.retreat();
                if moved {
                    assert_eq!(pagination.cursor(), start);
                } else {
                    // advance clamped at the terminal spread
                    assert_eq!(pagination.cursor(), start.saturating_sub(1));
                }
            }
        }
    }

    #[test]
    fn retreat_clamps_at_cover() {
        let mut pagination = Pagination::new(4);
        assert!(!pagination.retreat());
        assert_eq!(pagination.cursor(), 0);
    }

    #[test]
    fn empty_book_is_cover_and_terminal() {
        let mut pagination = Pagination::new(0);
        assert!(pagination.is_cover());
        assert!(pagination.is_terminal());
        assert!(!pagination.advance());
        assert!(!pagination.retreat());
        assert_eq!(pagination.cursor(), 0);
    }

    #[test]
    fn restore_clamps_out_of_range_cursor() {
        assert_eq!(Pagination::restore(5, 99).cursor(), 3);
        assert_eq!(Pagination::restore(0, 4).cursor(), 0);
        assert_eq!(Pagination::restore(4, 1).cursor(), 1);
    }

    #[test]
    fn odd_page_count_leaves_right_slot_empty() {
        let book = book_with_pages(5);
        let mut pagination = Pagination::new(book.page_count());
        for _ in 0..3 {
            pagination.advance();
        }

        assert_eq!(pagination.cursor(), 3);
        assert_eq!(pagination.left_index(), Some(4));
        assert_eq!(pagination.right_index(), Some(5));

        let spread = Spread::of(&book, &pagination);
        assert_eq!(spread.left, Slot::Page(&book.pages[4]));
        assert!(spread.right.is_empty());

        pagination.advance();
        assert_eq!(pagination.cursor(), 3);
    }

    #[test]
    fn even_page_count_fills_both_slots() {
        let book = book_with_pages(4);
        let pagination = Pagination::restore(book.page_count(), 2);

        assert_eq!(pagination.left_index(), Some(2));
        assert_eq!(pagination.right_index(), Some(3));

        let spread = Spread::of(&book, &pagination);
        assert_eq!(spread.left, Slot::Page(&book.pages[2]));
        assert_eq!(spread.right, Slot::Page(&book.pages[3]));
    }

    #[test]
    fn cover_spread_shows_cover_only() {
        let book = book_with_pages(2).with_cover(Illustration::fallback("a castle"));
        let spread = Spread::of(&book, &Pagination::new(book.page_count()));

        match spread.left {
            Slot::Cover { title, illustration } => {
                assert_eq!(title, "Test");
                assert_eq!(illustration.map(|i| i.caption()), Some("a castle"));
            }
            other => panic!("expected cover, got {other:?}"),
        }
        assert!(spread.right.is_empty());
    }

    #[test]
    fn next_and_previous_do_not_move() {
        let pagination = Pagination::restore(6, 1);
        assert_eq!(pagination.next(), 2);
        assert_eq!(pagination.previous(), 0);
        assert_eq!(pagination.cursor(), 1);
        assert_eq!(Pagination::restore(6, 3).next(), 3);
    }
}
