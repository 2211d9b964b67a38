use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::illustration::Illustration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookType {
    #[default]
    Story,
    Poem,
    NurseryRhyme,
    Propaganda,
    Educational,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown book type: {0}")]
pub struct UnknownBookType(pub String);

impl BookType {
    pub const ALL: [BookType; 5] = [
        BookType::Story,
        BookType::Poem,
        BookType::NurseryRhyme,
        BookType::Propaganda,
        BookType::Educational,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookType::Story => "story",
            BookType::Poem => "poem",
            BookType::NurseryRhyme => "nursery_rhyme",
            BookType::Propaganda => "propaganda",
            BookType::Educational => "educational",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BookType::Story => "Story Book",
            BookType::Poem => "Poem",
            BookType::NurseryRhyme => "Nursery Rhyme",
            BookType::Propaganda => "Propaganda (Satirical)",
            BookType::Educational => "Educational",
        }
    }

    /// Propaganda books are generated as satire and the form says so.
    pub fn is_satirical(&self) -> bool {
        matches!(self, BookType::Propaganda)
    }
}

impl fmt::Display for BookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookType {
    type Err = UnknownBookType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        BookType::ALL
            .into_iter()
            .find(|book_type| book_type.as_str() == normalized)
            .ok_or_else(|| UnknownBookType(s.to_string()))
    }
}

/// One unit of content. `index` is the 0-based position in `Book::pages`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub index: usize,
    pub content: String,
    pub illustration: Illustration,
}

impl Page {
    /// 1-based number shown to readers.
    pub fn number(&self) -> usize {
        self.index + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
    pub title: String,
    pub book_type: BookType,
    pub pages: Vec<Page>,
    pub cover: Option<Illustration>,
    /// Set once the backend has persisted the book.
    pub saved_id: Option<String>,
}

impl Book {
    pub const DEFAULT_TITLE: &'static str = "My Book";

    /// Builds a book, assigning page indices from reading order.
    pub fn new(
        title: impl Into<String>,
        book_type: BookType,
        pages: impl IntoIterator<Item = (String, Illustration)>,
    ) -> Self {
        let pages = pages
            .into_iter()
            .enumerate()
            .map(|(index, (content, illustration))| Page {
                index,
                content,
                illustration,
            })
            .collect();

        Self {
            title: title.into(),
            book_type,
            pages,
            cover: None,
            saved_id: None,
        }
    }

    pub fn with_cover(mut self, cover: Illustration) -> Self {
        self.cover = Some(cover);
        self
    }

    pub fn with_saved_id(mut self, saved_id: impl Into<String>) -> Self {
        self.saved_id = Some(saved_id.into());
        self
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn is_saved(&self) -> bool {
        self.saved_id.is_some()
    }
}
