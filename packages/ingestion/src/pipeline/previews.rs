//! Preview lifecycle: lookup, ownership, lazy expiry, sweeping.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{IngestionError, Result};
use crate::traits::PreviewStore;
use crate::types::{Preview, PreviewKind};

/// Fetch a preview, enforcing ownership and expiry.
///
/// Order matters: a preview that exists but belongs to someone else is
/// `PreviewForbidden` regardless of its expiry state, and a foreign
/// reader never triggers the lazy delete. Only the owner reading an
/// expired preview deletes it and gets `PreviewExpired`; the next read
/// of the same id is `PreviewNotFound`.
pub(crate) async fn fetch_valid_preview<S: PreviewStore + ?Sized>(
    store: &S,
    preview_id: Uuid,
    user_id: Uuid,
) -> Result<Preview> {
    let preview = store
        .find_preview(preview_id)
        .await?
        .ok_or(IngestionError::PreviewNotFound)?;

    if preview.user_id != user_id {
        return Err(IngestionError::PreviewForbidden);
    }

    if preview.is_expired(Utc::now()) {
        debug!(preview_id = %preview_id, "preview expired on read, deleting");
        store.delete_preview(preview_id).await?;
        return Err(IngestionError::PreviewExpired);
    }

    Ok(preview)
}

pub(crate) async fn list_previews<S: PreviewStore + ?Sized>(
    store: &S,
    user_id: Uuid,
    kind: Option<PreviewKind>,
) -> Result<Vec<Preview>> {
    store.list_active_previews(user_id, kind, Utc::now()).await
}

/// Delete every expired preview across all users. Returns the count.
pub(crate) async fn sweep_expired<S: PreviewStore + ?Sized>(store: &S) -> Result<u64> {
    let removed = store.delete_expired_previews(Utc::now()).await?;
    if removed > 0 {
        info!(removed, "swept expired previews");
    }
    Ok(removed)
}
