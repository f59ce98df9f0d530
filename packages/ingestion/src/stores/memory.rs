//! In-memory store for tests and local development.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::{IngestionError, Result};
use crate::traits::{CategoryStore, PreviewStore, TransactionStore};
use crate::types::{
    Category, NewCategory, NewTransaction, Preview, PreviewKind, Transaction, TransactionType,
};

#[derive(Default)]
struct Inner {
    previews: HashMap<Uuid, Preview>,
    categories: Vec<Category>,
    transactions: Vec<Transaction>,
}

/// Everything behind one lock, so the commit path (delete preview +
/// insert rows) is naturally atomic.
#[derive(Default)]
pub struct MemoryLedgerStore {
    inner: RwLock<Inner>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All committed transactions, for test assertions.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.inner.read().unwrap().transactions.clone()
    }

    /// All categories, for test assertions.
    pub fn categories(&self) -> Vec<Category> {
        self.inner.read().unwrap().categories.clone()
    }

    /// Number of stored previews, expired or not.
    pub fn preview_count(&self) -> usize {
        self.inner.read().unwrap().previews.len()
    }

    /// Force a preview's expiry for TTL tests.
    pub fn expire_preview(&self, id: Uuid, expires_at: DateTime<Utc>) {
        let mut inner = self.inner.write().unwrap();
        if let Some(preview) = inner.previews.get_mut(&id) {
            preview.expires_at = expires_at;
        }
    }
}

#[async_trait]
impl PreviewStore for MemoryLedgerStore {
    async fn insert_preview(&self, preview: &Preview) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        inner.previews.insert(preview.id, preview.clone());
        Ok(())
    }

    async fn find_preview(&self, id: Uuid) -> Result<Option<Preview>> {
        Ok(self.inner.read().unwrap().previews.get(&id).cloned())
    }

    async fn delete_preview(&self, id: Uuid) -> Result<bool> {
        Ok(self.inner.write().unwrap().previews.remove(&id).is_some())
    }

    async fn list_active_previews(
        &self,
        user_id: Uuid,
        kind: Option<PreviewKind>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Preview>> {
        let inner = self.inner.read().unwrap();
        let mut previews: Vec<Preview> = inner
            .previews
            .values()
            .filter(|p| p.user_id == user_id)
            .filter(|p| !p.is_expired(now))
            .filter(|p| kind.map_or(true, |k| p.kind == k))
            .cloned()
            .collect();
        previews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(previews)
    }

    async fn delete_expired_previews(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut inner = self.inner.write().unwrap();
        let before = inner.previews.len();
        inner.previews.retain(|_, p| !p.is_expired(now));
        Ok((before - inner.previews.len()) as u64)
    }
}

#[async_trait]
impl CategoryStore for MemoryLedgerStore {
    async fn list_category_names(
        &self,
        user_id: Uuid,
        kind: TransactionType,
    ) -> Result<Vec<String>> {
        let inner = self.inner.read().unwrap();
        let mut names: Vec<String> = inner
            .categories
            .iter()
            .filter(|c| c.user_id == user_id && c.kind == kind)
            .map(|c| c.name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn find_categories_by_names(
        &self,
        user_id: Uuid,
        names: &[String],
    ) -> Result<Vec<Category>> {
        let wanted: Vec<String> = names.iter().map(|n| n.trim().to_lowercase()).collect();
        let inner = self.inner.read().unwrap();
        Ok(inner
            .categories
            .iter()
            .filter(|c| c.user_id == user_id && wanted.contains(&c.name.to_lowercase()))
            .cloned()
            .collect())
    }

    async fn insert_category(&self, category: NewCategory) -> Result<Category> {
        let mut inner = self.inner.write().unwrap();
        // Mirrors the database uniqueness on (user, lower(name), type).
        let conflict = inner.categories.iter().any(|c| {
            c.user_id == category.user_id
                && c.kind == category.kind
                && c.name.to_lowercase() == category.name.to_lowercase()
        });
        if conflict {
            return Err(IngestionError::storage(format!(
                "duplicate category: {}",
                category.name
            )));
        }

        let created = Category {
            id: Uuid::new_v4(),
            user_id: category.user_id,
            name: category.name,
            kind: category.kind,
            created_at: Utc::now(),
        };
        inner.categories.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl TransactionStore for MemoryLedgerStore {
    async fn find_transactions_on_dates(
        &self,
        user_id: Uuid,
        dates: &[NaiveDate],
    ) -> Result<Vec<Transaction>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id && dates.contains(&t.occurred_at))
            .cloned()
            .collect())
    }

    async fn insert_transactions_consuming_preview(
        &self,
        preview_id: Uuid,
        rows: Vec<NewTransaction>,
    ) -> Result<Vec<Transaction>> {
        let mut inner = self.inner.write().unwrap();
        if inner.previews.remove(&preview_id).is_none() {
            return Err(IngestionError::PreviewNotFound);
        }

        let now = Utc::now();
        let created: Vec<Transaction> = rows
            .into_iter()
            .map(|row| row.into_transaction(now))
            .collect();
        inner.transactions.extend(created.iter().cloned());
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn preview(user_id: Uuid, expires_at: DateTime<Utc>) -> Preview {
        Preview {
            id: Uuid::new_v4(),
            user_id,
            kind: PreviewKind::Receipt,
            payload: json!({}),
            created_at: Utc::now(),
            expires_at,
        }
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_previews() {
        let store = MemoryLedgerStore::new();
        let user = Uuid::new_v4();
        let now = Utc::now();

        store
            .insert_preview(&preview(user, now - Duration::seconds(1)))
            .await
            .unwrap();
        store
            .insert_preview(&preview(user, now + Duration::minutes(10)))
            .await
            .unwrap();

        assert_eq!(store.delete_expired_previews(now).await.unwrap(), 1);
        assert_eq!(store.preview_count(), 1);
    }

    #[tokio::test]
    async fn consuming_a_missing_preview_inserts_nothing() {
        let store = MemoryLedgerStore::new();
        let result = store
            .insert_transactions_consuming_preview(Uuid::new_v4(), vec![])
            .await;
        assert!(matches!(result, Err(IngestionError::PreviewNotFound)));
        assert!(store.transactions().is_empty());
    }

    #[tokio::test]
    async fn duplicate_category_insert_conflicts_case_insensitively() {
        let store = MemoryLedgerStore::new();
        let user = Uuid::new_v4();
        store
            .insert_category(NewCategory {
                user_id: user,
                name: "Groceries".into(),
                kind: TransactionType::Expense,
            })
            .await
            .unwrap();

        let conflict = store
            .insert_category(NewCategory {
                user_id: user,
                name: "GROCERIES".into(),
                kind: TransactionType::Expense,
            })
            .await;
        assert!(conflict.is_err());
    }
}
