//! Category resolve-or-create.
//!
//! Suggestions travel through previews as category names; only at
//! commit time are names resolved to ids, creating entries that do not
//! exist yet. Resolution is batched: one lookup for the whole name
//! set, then creation of the missing ones, so a large statement commit
//! stays at a bounded number of store round trips.

use std::collections::{HashMap, HashSet};

use tracing::debug;
use uuid::Uuid;

use crate::error::{IngestionError, Result};
use crate::traits::CategoryStore;
use crate::types::{Category, NewCategory, TransactionType};

/// Lookup key: case-folded trimmed name plus transaction type.
pub type CategoryKey = (String, TransactionType);

/// Build the map key for a name/type pair.
pub fn category_key(name: &str, kind: TransactionType) -> CategoryKey {
    (name.trim().to_lowercase(), kind)
}

/// Resolve a single category, creating it if absent.
pub async fn resolve_or_create<S: CategoryStore + ?Sized>(
    store: &S,
    user_id: Uuid,
    name: &str,
    kind: TransactionType,
) -> Result<Category> {
    let mut wanted = HashSet::new();
    wanted.insert((name.trim().to_string(), kind));

    let mut resolved = resolve_many(store, user_id, &wanted).await?;
    resolved
        .remove(&category_key(name, kind))
        .ok_or_else(|| IngestionError::InvalidCategory(name.trim().to_string()))
}

/// Resolve a batch of `(name, type)` pairs, creating the missing ones.
///
/// Pairs with empty names are rejected up front. A creation that loses
/// a uniqueness race falls back to one more lookup; if the entry still
/// cannot be found the pair surfaces as `InvalidCategory`.
pub async fn resolve_many<S: CategoryStore + ?Sized>(
    store: &S,
    user_id: Uuid,
    pairs: &HashSet<(String, TransactionType)>,
) -> Result<HashMap<CategoryKey, Category>> {
    let mut resolved: HashMap<CategoryKey, Category> = HashMap::new();
    if pairs.is_empty() {
        return Ok(resolved);
    }

    // Collapse name variants with the same folding `category_key` uses,
    // so one lookup covers every pair that will hit the same key.
    let mut seen: HashSet<String> = HashSet::new();
    let mut names: Vec<String> = Vec::new();
    for (name, _) in pairs {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(IngestionError::InvalidCategory(
                "category name must not be empty".into(),
            ));
        }
        if seen.insert(trimmed.to_lowercase()) {
            names.push(trimmed.to_string());
        }
    }

    for category in store.find_categories_by_names(user_id, &names).await? {
        resolved.insert(category_key(&category.name, category.kind), category);
    }

    for (name, kind) in pairs {
        let key = category_key(name, *kind);
        if resolved.contains_key(&key) {
            continue;
        }

        let created = store
            .insert_category(NewCategory {
                user_id,
                name: name.trim().to_string(),
                kind: *kind,
            })
            .await;

        match created {
            Ok(category) => {
                debug!(name = %category.name, kind = %category.kind, "created category");
                resolved.insert(key, category);
            }
            Err(err) => {
                // Lost a creation race: someone else inserted the same
                // name concurrently. The retry lookup settles it.
                debug!(name = %name, error = %err, "category insert conflicted, re-fetching");
                let retry = store
                    .find_categories_by_names(user_id, std::slice::from_ref(name))
                    .await?;
                let found = retry
                    .into_iter()
                    .find(|c| category_key(&c.name, c.kind) == key)
                    .ok_or_else(|| IngestionError::InvalidCategory(name.trim().to_string()))?;
                resolved.insert(key, found);
            }
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_case_insensitive_and_trimmed() {
        assert_eq!(
            category_key("  Groceries ", TransactionType::Expense),
            category_key("groceries", TransactionType::Expense)
        );
    }

    #[test]
    fn key_distinguishes_types() {
        assert_ne!(
            category_key("Other", TransactionType::Expense),
            category_key("Other", TransactionType::Income)
        );
    }

    #[test]
    fn key_folds_beyond_ascii() {
        assert_eq!(
            category_key("CAFÉ", TransactionType::Expense),
            category_key("café", TransactionType::Expense)
        );
    }

    #[tokio::test]
    async fn unicode_case_variants_resolve_to_one_category() {
        let store = crate::stores::memory::MemoryLedgerStore::new();
        let user = Uuid::new_v4();

        let mut pairs = HashSet::new();
        pairs.insert(("Café".to_string(), TransactionType::Expense));
        pairs.insert((" CAFÉ ".to_string(), TransactionType::Expense));

        let resolved = resolve_many(&store, user, &pairs).await.unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(store.categories().len(), 1);

        // A later batch with yet another casing reuses the same entry.
        let mut again = HashSet::new();
        again.insert(("CAFé".to_string(), TransactionType::Expense));
        let resolved = resolve_many(&store, user, &again).await.unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(store.categories().len(), 1);
    }
}
