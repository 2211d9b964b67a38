use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dto::book::BookContentDto;

/// Generated book that has not been saved yet.
#[derive(Debug, Clone)]
pub struct Draft {
    pub owner: String,
    pub title: String,
    pub content: BookContentDto,
}

/// In-memory holding area for unsaved books, scoped per user.
#[derive(Clone)]
pub struct DraftStore {
    entries: Arc<RwLock<HashMap<Uuid, (Draft, Instant)>>>,
    ttl: Duration,
}

impl DraftStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn insert(&self, draft: Draft) -> Uuid {
        let id = Uuid::new_v4();
        let mut entries = self.entries.write().await;
        Self::prune(&mut entries, self.ttl);
        tracing::info!("Stored draft {} for {}", id, draft.owner);
        entries.insert(id, (draft, Instant::now()));
        id
    }

    /// Draft `id` if it exists, belongs to `owner` and has not expired.
    pub async fn get(&self, id: Uuid, owner: &str) -> Option<Draft> {
        let entries = self.entries.read().await;
        entries
            .get(&id)
            .filter(|(draft, created)| draft.owner == owner && created.elapsed() < self.ttl)
            .map(|(draft, _)| draft.clone())
    }

    pub async fn remove(&self, id: Uuid, owner: &str) -> Option<Draft> {
        let mut entries = self.entries.write().await;
        Self::prune(&mut entries, self.ttl);
        let owned = entries.get(&id).is_some_and(|(draft, _)| draft.owner == owner);
        if !owned {
            return None;
        }
        entries.remove(&id).map(|(draft, _)| draft)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    fn prune(entries: &mut HashMap<Uuid, (Draft, Instant)>, ttl: Duration) {
        let before = entries.len();
        entries.retain(|_, (_, created)| created.elapsed() < ttl);
        let pruned = before - entries.len();
        if pruned > 0 {
            tracing::debug!("Pruned {} expired drafts", pruned);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(owner: &str) -> Draft {
        Draft {
            owner: owner.to_string(),
            title: "Dragons".to_string(),
            content: BookContentDto::default(),
        }
    }

    #[tokio::test]
    async fn drafts_are_scoped_to_owner() {
        let store = DraftStore::new(Duration::from_secs(60));
        let id = store.insert(draft("ada")).await;

        assert!(store.get(id, "ada").await.is_some());
        assert!(store.get(id, "bob").await.is_none());
        assert!(store.remove(id, "bob").await.is_none());
        assert_eq!(store.remove(id, "ada").await.map(|d| d.title), Some("Dragons".to_string()));
        assert!(store.get(id, "ada").await.is_none());
    }

    #[tokio::test]
    async fn expired_drafts_disappear() {
        let store = DraftStore::new(Duration::from_millis(10));
        let id = store.insert(draft("ada")).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(store.get(id, "ada").await.is_none());
        store.insert(draft("ada")).await;
        assert_eq!(store.len().await, 1);
    }
}
