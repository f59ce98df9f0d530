//! Postgres-backed store.
//!
//! Enum columns are stored as text and parsed on the way out; amounts
//! are `NUMERIC` columns mapped to `Decimal`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{IngestionError, Result};
use crate::traits::{CategoryStore, PreviewStore, TransactionStore};
use crate::types::{
    Category, NewCategory, NewTransaction, Preview, PreviewKind, Transaction, TransactionType,
};

pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PreviewRow {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    payload: serde_json::Value,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl TryFrom<PreviewRow> for Preview {
    type Error = IngestionError;

    fn try_from(row: PreviewRow) -> Result<Self> {
        Ok(Preview {
            id: row.id,
            user_id: row.user_id,
            kind: row.kind.parse()?,
            payload: row.payload,
            created_at: row.created_at,
            expires_at: row.expires_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    #[sqlx(rename = "type")]
    kind: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<CategoryRow> for Category {
    type Error = IngestionError;

    fn try_from(row: CategoryRow) -> Result<Self> {
        Ok(Category {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            kind: row.kind.parse()?,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    user_id: Uuid,
    #[sqlx(rename = "type")]
    kind: String,
    amount: Decimal,
    occurred_at: NaiveDate,
    description: String,
    merchant: Option<String>,
    category_id: Option<Uuid>,
    source: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for Transaction {
    type Error = IngestionError;

    fn try_from(row: TransactionRow) -> Result<Self> {
        Ok(Transaction {
            id: row.id,
            user_id: row.user_id,
            kind: row.kind.parse()?,
            amount: row.amount,
            occurred_at: row.occurred_at,
            description: row.description,
            merchant: row.merchant,
            category_id: row.category_id,
            source: row.source.parse()?,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl PreviewStore for PostgresLedgerStore {
    async fn insert_preview(&self, preview: &Preview) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO previews (id, user_id, kind, payload, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(preview.id)
        .bind(preview.user_id)
        .bind(preview.kind.to_string())
        .bind(&preview.payload)
        .bind(preview.created_at)
        .bind(preview.expires_at)
        .execute(&self.pool)
        .await
        .map_err(IngestionError::storage)?;
        Ok(())
    }

    async fn find_preview(&self, id: Uuid) -> Result<Option<Preview>> {
        let row: Option<PreviewRow> = sqlx::query_as(
            "SELECT id, user_id, kind, payload, created_at, expires_at FROM previews WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(IngestionError::storage)?;

        row.map(Preview::try_from).transpose()
    }

    async fn delete_preview(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM previews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(IngestionError::storage)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_active_previews(
        &self,
        user_id: Uuid,
        kind: Option<PreviewKind>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Preview>> {
        let rows: Vec<PreviewRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, kind, payload, created_at, expires_at
            FROM previews
            WHERE user_id = $1
              AND expires_at > $2
              AND ($3::text IS NULL OR kind = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(now)
        .bind(kind.map(|k| k.to_string()))
        .fetch_all(&self.pool)
        .await
        .map_err(IngestionError::storage)?;

        rows.into_iter().map(Preview::try_from).collect()
    }

    async fn delete_expired_previews(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM previews WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(IngestionError::storage)?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CategoryStore for PostgresLedgerStore {
    async fn list_category_names(
        &self,
        user_id: Uuid,
        kind: TransactionType,
    ) -> Result<Vec<String>> {
        let names: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM categories WHERE user_id = $1 AND type = $2 ORDER BY name",
        )
        .bind(user_id)
        .bind(kind.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(IngestionError::storage)?;

        Ok(names.into_iter().map(|(name,)| name).collect())
    }

    async fn find_categories_by_names(
        &self,
        user_id: Uuid,
        names: &[String],
    ) -> Result<Vec<Category>> {
        let lowered: Vec<String> = names.iter().map(|n| n.trim().to_lowercase()).collect();
        let rows: Vec<CategoryRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, name, type, created_at
            FROM categories
            WHERE user_id = $1 AND lower(name) = ANY($2)
            "#,
        )
        .bind(user_id)
        .bind(&lowered)
        .fetch_all(&self.pool)
        .await
        .map_err(IngestionError::storage)?;

        rows.into_iter().map(Category::try_from).collect()
    }

    async fn insert_category(&self, category: NewCategory) -> Result<Category> {
        let row: CategoryRow = sqlx::query_as(
            r#"
            INSERT INTO categories (id, user_id, name, type, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, name, type, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(category.user_id)
        .bind(&category.name)
        .bind(category.kind.to_string())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(IngestionError::storage)?;

        Category::try_from(row)
    }
}

#[async_trait]
impl TransactionStore for PostgresLedgerStore {
    async fn find_transactions_on_dates(
        &self,
        user_id: Uuid,
        dates: &[NaiveDate],
    ) -> Result<Vec<Transaction>> {
        let rows: Vec<TransactionRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, type, amount, occurred_at, description,
                   merchant, category_id, source, created_at
            FROM transactions
            WHERE user_id = $1 AND occurred_at = ANY($2)
            "#,
        )
        .bind(user_id)
        .bind(dates)
        .fetch_all(&self.pool)
        .await
        .map_err(IngestionError::storage)?;

        rows.into_iter().map(Transaction::try_from).collect()
    }

    async fn insert_transactions_consuming_preview(
        &self,
        preview_id: Uuid,
        rows: Vec<NewTransaction>,
    ) -> Result<Vec<Transaction>> {
        let mut tx = self.pool.begin().await.map_err(IngestionError::storage)?;

        // Delete the preview first: it doubles as the row lock that
        // serializes concurrent commits of the same preview.
        let deleted = sqlx::query("DELETE FROM previews WHERE id = $1")
            .bind(preview_id)
            .execute(&mut *tx)
            .await
            .map_err(IngestionError::storage)?;
        if deleted.rows_affected() == 0 {
            return Err(IngestionError::PreviewNotFound);
        }

        let now = Utc::now();
        let mut created = Vec::with_capacity(rows.len());
        for row in rows {
            let inserted: TransactionRow = sqlx::query_as(
                r#"
                INSERT INTO transactions
                    (id, user_id, type, amount, occurred_at, description,
                     merchant, category_id, source, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                RETURNING id, user_id, type, amount, occurred_at, description,
                          merchant, category_id, source, created_at
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(row.user_id)
            .bind(row.kind.to_string())
            .bind(row.amount)
            .bind(row.occurred_at)
            .bind(&row.description)
            .bind(&row.merchant)
            .bind(row.category_id)
            .bind(row.source.to_string())
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(IngestionError::storage)?;

            created.push(Transaction::try_from(inserted)?);
        }

        tx.commit().await.map_err(IngestionError::storage)?;
        Ok(created)
    }
}
