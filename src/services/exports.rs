use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Books with a PDF export currently outstanding.
///
/// Held only for the duration of one backend call; the guard releases the
/// slot on every outcome, including a dropped request future.
#[derive(Clone, Default)]
pub struct ExportTracker {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

pub struct ExportGuard {
    tracker: ExportTracker,
    book_id: String,
}

impl ExportTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Claims the export slot for `book_id`, or `None` if one is running.
    pub fn try_begin(&self, book_id: &str) -> Option<ExportGuard> {
        if !self.lock().insert(book_id.to_string()) {
            tracing::debug!("Export already running for {}", book_id);
            return None;
        }

        Some(ExportGuard {
            tracker: self.clone(),
            book_id: book_id.to_string(),
        })
    }

    pub fn is_in_flight(&self, book_id: &str) -> bool {
        self.lock().contains(book_id)
    }
}

impl Drop for ExportGuard {
    fn drop(&mut self) {
        self.tracker.lock().remove(&self.book_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_export_per_book_at_a_time() {
        let tracker = ExportTracker::new();
        let guard = tracker.try_begin("b1").expect("first export starts");

        assert!(tracker.is_in_flight("b1"));
        assert!(tracker.try_begin("b1").is_none());
        assert!(tracker.try_begin("b2").is_some());

        drop(guard);
        assert!(!tracker.is_in_flight("b1"));
        assert!(tracker.try_begin("b1").is_some());
    }
}
