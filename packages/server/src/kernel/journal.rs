use async_trait::async_trait;
use chrono::{DateTime, Utc};
use durable::{Journal, JournalEntry, JournalError};
use sqlx::types::Json;
use sqlx::PgPool;

/// Step journal in the `workflow_journal` table, so a run interrupted by a
/// restart can be resumed under the same workflow id.
#[derive(Clone)]
pub struct PostgresJournal {
    pool: PgPool,
}

impl PostgresJournal {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Journal for PostgresJournal {
    async fn load(&self, key: &str) -> Result<Option<JournalEntry>, JournalError> {
        let row = sqlx::query_as::<_, (serde_json::Value,)>(
            "SELECT entry FROM workflow_journal WHERE step_key = $1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| JournalError::Backend(e.to_string()))?;

        row.map(|(entry,)| {
            serde_json::from_value(entry).map_err(|source| JournalError::Corrupt {
                key: key.to_string(),
                source,
            })
        })
        .transpose()
    }

    async fn record(&self, key: &str, entry: JournalEntry) -> Result<(), JournalError> {
        sqlx::query(
            r#"
            INSERT INTO workflow_journal (step_key, entry)
            VALUES ($1, $2)
            ON CONFLICT (step_key) DO UPDATE
            SET entry = EXCLUDED.entry, recorded_at = NOW()
            "#,
        )
        .bind(key)
        .bind(Json(&entry))
        .execute(&self.pool)
        .await
        .map_err(|e| JournalError::Backend(e.to_string()))?;

        Ok(())
    }

    async fn prune(&self, recorded_before: DateTime<Utc>) -> Result<u64, JournalError> {
        let result = sqlx::query("DELETE FROM workflow_journal WHERE recorded_at < $1")
            .bind(recorded_before)
            .execute(&self.pool)
            .await
            .map_err(|e| JournalError::Backend(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
