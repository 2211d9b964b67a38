//! Page-turning book viewer.
//!
//! The viewer owns a single cursor over a book's spreads. Everything shown on
//! screen is derived from `(book, cursor)` by pure functions; the only side
//! effect the viewer knows about is the export trigger state.

pub mod export;
pub mod illustration;
pub mod pagination;

use serde::Serialize;

use crate::models::{Book, BookType};

pub use export::ExportTrigger;
pub use illustration::{resolve, ResolvedIllustration};
pub use pagination::{Pagination, Slot, Spread};

pub const MISSING_COVER_CAPTION: &str = "Cover image not available";

#[derive(Debug, Clone)]
pub struct Viewer {
    book: Book,
    pagination: Pagination,
    export: ExportTrigger,
}

impl Viewer {
    /// Opens on the cover.
    pub fn open(book: Book) -> Self {
        Self::at(book, 0)
    }

    /// Opens on a previously shown spread, clamped to the book.
    pub fn at(book: Book, cursor: usize) -> Self {
        let pagination = Pagination::restore(book.page_count(), cursor);
        let export = ExportTrigger::for_book(&book);
        Self {
            book,
            pagination,
            export,
        }
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn export(&self) -> &ExportTrigger {
        &self.export
    }

    pub fn export_mut(&mut self) -> &mut ExportTrigger {
        &mut self.export
    }

    pub fn advance(&mut self) -> bool {
        self.pagination.advance()
    }

    pub fn retreat(&mut self) -> bool {
        self.pagination.retreat()
    }

    pub fn spread(&self) -> Spread<'_> {
        Spread::of(&self.book, &self.pagination)
    }

    pub fn render(&self, images_base: &str) -> SpreadView {
        let spread = self.spread();
        let pagination = &self.pagination;

        SpreadView {
            title: self.book.title.clone(),
            book_type: self.book.book_type,
            saved_id: self.book.saved_id.clone(),
            cursor: pagination.cursor(),
            last_spread: pagination.last_spread(),
            page_count: pagination.page_count(),
            previous: pagination.previous(),
            next: pagination.next(),
            can_retreat: !pagination.is_cover(),
            can_advance: !pagination.is_terminal(),
            status: format!("Page {} of {}", pagination.cursor(), pagination.last_spread()),
            left: SlotView::render(&spread.left, images_base),
            right: SlotView::render(&spread.right, images_base),
            export: self.export.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Cover,
    Page,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotView {
    pub kind: SlotKind,
    /// 1-based page number; `None` for the cover.
    pub number: Option<usize>,
    pub text: String,
    pub illustration: ResolvedIllustration,
}

impl SlotView {
    fn render(slot: &Slot<'_>, images_base: &str) -> Option<Self> {
        match slot {
            Slot::Cover { title, illustration } => Some(Self {
                kind: SlotKind::Cover,
                number: None,
                text: title.to_string(),
                illustration: illustration.map_or_else(
                    || ResolvedIllustration::Caption {
                        text: MISSING_COVER_CAPTION.to_string(),
                    },
                    |cover| resolve(cover, images_base),
                ),
            }),
            Slot::Page(page) => Some(Self {
                kind: SlotKind::Page,
                number: Some(page.number()),
                text: page.content.clone(),
                illustration: resolve(&page.illustration, images_base),
            }),
            Slot::Empty => None,
        }
    }

    pub fn is_cover(&self) -> bool {
        self.kind == SlotKind::Cover
    }
}

/// Everything needed to draw one spread, for templates and the JSON API.
#[derive(Debug, Clone, Serialize)]
pub struct SpreadView {
    pub title: String,
    pub book_type: BookType,
    pub saved_id: Option<String>,
    pub cursor: usize,
    pub last_spread: usize,
    pub page_count: usize,
    pub previous: usize,
    pub next: usize,
    pub can_retreat: bool,
    pub can_advance: bool,
    pub status: String,
    pub left: Option<SlotView>,
    pub right: Option<SlotView>,
    pub export: ExportTrigger,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Illustration;

    fn five_page_book() -> Book {
        Book::new(
            "Five",
            BookType::NurseryRhyme,
            (1..=5).map(|i| (format!("verse {i}"), Illustration::fallback(format!("scene {i}")))),
        )
    }

    #[test]
    fn walking_a_five_page_book() {
        let mut viewer = Viewer::open(five_page_book());
        assert_eq!(viewer.pagination().cursor(), 0);

        for _ in 0..3 {
            viewer.advance();
        }
        let view = viewer.render("/api/images");
        assert_eq!(view.cursor, 3);
        assert_eq!(view.left.as_ref().and_then(|s| s.number), Some(5));
        assert!(view.right.is_none());
        assert!(!view.can_advance);
        assert_eq!(view.status, "Page 3 of 3");

        assert!(!viewer.advance());
        assert_eq!(viewer.pagination().cursor(), 3);
    }

    #[test]
    fn cover_without_image_shows_title_and_notice() {
        let view = Viewer::open(five_page_book()).render("/api/images");
        let left = view.left.expect("cover slot");
        assert!(left.is_cover());
        assert_eq!(left.text, "Five");
        assert_eq!(left.illustration.caption(), Some(MISSING_COVER_CAPTION));
        assert!(view.right.is_none());
        assert!(!view.can_retreat);
        assert_eq!(view.previous, 0);
        assert_eq!(view.next, 1);
    }

    #[test]
    fn page_with_both_sources_renders_inline_image() {
        let book = Book::new(
            "Both",
            BookType::Story,
            vec![(
                "text".to_string(),
                Illustration::from_sources(Some(vec![0xFF, 0xD8, 0xFF, 0x00]), Some("remote".to_string()), "cap"),
            )],
        );
        let view = Viewer::at(book, 1).render("/api/images");
        let src = view.left.unwrap().illustration.image_src().unwrap().to_string();
        assert!(src.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn page_without_sources_renders_caption_only() {
        let view = Viewer::at(five_page_book(), 1).render("/api/images");
        let left = view.left.unwrap();
        assert_eq!(left.illustration.image_src(), None);
        assert_eq!(left.illustration.caption(), Some("scene 1"));
        assert_eq!(view.right.unwrap().text, "verse 2");
    }

    #[test]
    fn export_failure_keeps_cursor() {
        let mut viewer = Viewer::at(five_page_book().with_saved_id("b-7"), 2);
        assert!(viewer.export_mut().begin());
        viewer.export_mut().finish(Err("timeout"));

        assert_eq!(viewer.pagination().cursor(), 2);
        assert!(viewer.export().is_enabled());
        assert!(viewer.export().failure().is_some());
    }

    #[test]
    fn empty_book_stays_on_cover() {
        let book = Book::new("Empty", BookType::Poem, Vec::new());
        let mut viewer = Viewer::open(book);
        assert!(!viewer.advance());
        assert!(!viewer.retreat());

        let view = viewer.render("/api/images");
        assert_eq!(view.last_spread, 0);
        assert!(!view.can_advance);
        assert!(!view.can_retreat);
        assert_eq!(view.status, "Page 0 of 0");
    }
}
