//! Askama page templates. Files live under `templates/`.

use askama::Template;

use crate::models::BookType;
use crate::viewer::SpreadView;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
    pub current_user: Option<String>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub current_user: Option<String>,
    pub error: Option<String>,
    pub username: String,
    pub google_enabled: bool,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterPage {
    pub current_user: Option<String>,
    pub error: Option<String>,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub google_enabled: bool,
}

pub struct BookSummary {
    pub id: String,
    pub title: String,
    pub page_count: usize,
    pub created_at: Option<String>,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardPage {
    pub current_user: Option<String>,
    pub books: Vec<BookSummary>,
    pub page: u32,
    pub has_next: bool,
}

pub struct BookTypeOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

impl BookTypeOption {
    pub fn all(selected: BookType) -> Vec<Self> {
        BookType::ALL
            .into_iter()
            .map(|book_type| Self {
                value: book_type.as_str(),
                label: book_type.label(),
                selected: book_type == selected,
            })
            .collect()
    }
}

#[derive(Template)]
#[template(path = "create_book.html")]
pub struct CreateBookPage {
    pub current_user: Option<String>,
    pub error: Option<String>,
    pub topic: String,
    pub pages: u32,
    pub satirical: bool,
    pub book_types: Vec<BookTypeOption>,
    pub min_pages: u32,
    pub max_pages: u32,
}

#[derive(Template)]
#[template(path = "viewer.html")]
pub struct ViewerPage {
    pub current_user: Option<String>,
    pub view: SpreadView,
    /// Path the prev/next links point at, e.g. `/books/abc`.
    pub base_path: String,
    pub export_path: Option<String>,
    pub save_path: Option<String>,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
    pub status: u16,
    pub heading: String,
    pub message: String,
}
