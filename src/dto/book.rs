use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::{Book, BookType, Illustration};
use crate::viewer::illustration::decode_inline;

/// Page as produced by the generation backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BookPageDto {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub content: String,
    /// Illustration prompt, shown as the caption when no image exists.
    #[serde(default)]
    pub illustration: Option<String>,
    #[serde(default)]
    pub illustration_file: Option<String>,
    #[serde(default)]
    pub b64_json: Option<String>,
}

/// Generated book payload, also stored as `content` of a saved record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BookContentDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub book_type: Option<String>,
    #[serde(default)]
    pub pages: Option<u32>,
    /// `null` or missing is read as an empty book.
    #[serde(default)]
    pub book_content: Option<Vec<BookPageDto>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_b64_json: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_book_id: Option<String>,
}

/// Persisted book record from `GET /books` and `GET /books/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SavedBookDto {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<BookContentDto>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Form submitted to request a new book.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookRequest {
    pub pages: u32,
    pub book_type: BookType,
    pub topic: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SaveBookRequest {
    /// Overwritten by the backend with the caller's id.
    pub user_id: String,
    pub title: String,
    pub content: BookContentDto,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct BookListQuery {
    /// Zero-based page of the listing, 20 books per page.
    #[serde(default)]
    pub page: u32,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ViewerQuery {
    /// Spread to show; 0 is the cover. Unparseable values read as 0.
    #[serde(default, deserialize_with = "lenient_spread")]
    #[param(value_type = Option<String>)]
    pub spread: usize,
    /// Outcome flag set after an export attempt (`failed` or `busy`).
    #[serde(default)]
    pub export: Option<String>,
}

/// Spread index from user input. Junk reads as the cover and oversized
/// numbers as the last spread; the viewer clamps either way.
pub fn parse_spread(raw: &str) -> usize {
    let raw = raw.trim();
    match raw.parse::<usize>() {
        Ok(spread) => spread,
        Err(_) if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) => usize::MAX,
        Err(_) => 0,
    }
}

pub fn lenient_spread<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().map_or(0, parse_spread))
}

impl BookPageDto {
    fn illustration(&self) -> Illustration {
        Illustration::from_sources(
            self.b64_json.as_deref().and_then(decode_inline),
            self.illustration_file.clone(),
            self.illustration.clone().unwrap_or_default(),
        )
    }
}

impl BookContentDto {
    pub fn page_count(&self) -> usize {
        self.book_content.as_ref().map_or(0, Vec::len)
    }

    fn cover(&self) -> Option<Illustration> {
        let inline = self.cover_b64_json.as_deref().and_then(decode_inline);
        let remote = self.cover_file.clone().filter(|id| !id.trim().is_empty());
        if inline.is_none() && remote.is_none() {
            return None;
        }
        let caption = self
            .book_cover
            .clone()
            .or_else(|| self.title_cover.clone())
            .unwrap_or_default();
        Some(Illustration::from_sources(inline, remote, caption))
    }

    fn book_type(&self) -> BookType {
        match self.book_type.as_deref() {
            None => BookType::default(),
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("{}; showing as {}", e, BookType::default());
                BookType::default()
            }),
        }
    }

    /// Converts the wire payload into a viewer book.
    pub fn into_book(self, saved_id: Option<String>, title: Option<String>) -> Book {
        let title = title
            .or_else(|| self.title.clone())
            .or_else(|| self.title_cover.clone())
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| Book::DEFAULT_TITLE.to_string());
        let saved_id = saved_id.or_else(|| self.saved_book_id.clone());
        let book_type = self.book_type();
        let cover = self.cover();

        let pages = self
            .book_content
            .unwrap_or_default()
            .into_iter()
            .map(|page| {
                let illustration = page.illustration();
                (page.content, illustration)
            });

        let mut book = Book::new(title, book_type, pages);
        book.cover = cover;
        book.saved_id = saved_id;
        book
    }
}

impl From<SavedBookDto> for Book {
    fn from(saved: SavedBookDto) -> Self {
        saved
            .content
            .unwrap_or_default()
            .into_book(Some(saved.id), saved.title)
    }
}

impl SavedBookDto {
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(Book::DEFAULT_TITLE)
    }

    pub fn page_count(&self) -> usize {
        self.content.as_ref().map_or(0, BookContentDto::page_count)
    }
}
