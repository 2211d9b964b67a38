use serde::Serialize;

use crate::models::Book;

/// State of the "Export as PDF" control for one book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ExportTrigger {
    /// Book has not been persisted; nothing to export.
    Unavailable,
    Ready,
    InFlight,
    Failed { message: String },
}

impl ExportTrigger {
    pub const FAILURE_MESSAGE: &'static str = "Failed to download PDF. Please try again.";

    pub fn for_book(book: &Book) -> Self {
        if book.is_saved() {
            ExportTrigger::Ready
        } else {
            ExportTrigger::Unavailable
        }
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self, ExportTrigger::Unavailable)
    }

    /// A failed export re-enables the control.
    pub fn is_enabled(&self) -> bool {
        matches!(self, ExportTrigger::Ready | ExportTrigger::Failed { .. })
    }

    /// Marks the request outstanding. Returns false if it cannot start.
    pub fn begin(&mut self) -> bool {
        if !self.is_enabled() {
            return false;
        }
        *self = ExportTrigger::InFlight;
        true
    }

    pub fn finish<E: std::fmt::Display>(&mut self, outcome: Result<(), E>) {
        if !matches!(self, ExportTrigger::InFlight) {
            return;
        }
        *self = match outcome {
            Ok(()) => ExportTrigger::Ready,
            Err(e) => {
                tracing::warn!("PDF export failed: {}", e);
                ExportTrigger::Failed {
                    message: Self::FAILURE_MESSAGE.to_string(),
                }
            }
        };
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExportTrigger::InFlight => "Exporting...",
            _ => "Export as PDF",
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            ExportTrigger::Failed { message } => Some(message.as_str()),
            _ => None,
        }
    }
}
