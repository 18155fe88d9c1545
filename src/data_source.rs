use crate::types::{DigestUser, JournalEntry, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres, Row};
use tracing::{debug, info};
use uuid::Uuid;

/// Capability returning the users eligible for digesting, each with their
/// journal entries.
///
/// The returned set is finite and safe to re-fetch on every run (no shared
/// cursor across runs). Entries are already scoped to their owner and
/// ordered ascending by creation time, but NOT time-windowed; windowing is
/// the pipeline's job using the shared reference instant.
#[async_trait]
pub trait UserDataSource: Send + Sync {
    async fn eligible_users(&self, reference_instant: DateTime<Utc>) -> Result<Vec<DigestUser>>;
}

/// Postgres-backed data source running the single aggregation query the
/// digest needs.
pub struct PostgresUserDataSource {
    db: Pool<Postgres>,
}

impl PostgresUserDataSource {
    pub async fn new(database_url: &str) -> Result<Self> {
        let db = PgPool::connect(database_url).await?;

        // Note: Database schema should be initialized with migrations before
        // running. The digest only reads users and journal_entries.

        Ok(Self { db })
    }

    pub fn with_pool(db: Pool<Postgres>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserDataSource for PostgresUserDataSource {
    async fn eligible_users(&self, reference_instant: DateTime<Utc>) -> Result<Vec<DigestUser>> {
        debug!("Fetching eligible users for reference instant {}", reference_instant);

        let rows = sqlx::query(
            r#"
            SELECT u.id AS user_id, u.email, e.created_at, e.content
            FROM users u
            LEFT JOIN journal_entries e ON e.user_id = u.id
            WHERE u.digest_enabled = true
            ORDER BY u.id, e.created_at ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        let mut users: Vec<DigestUser> = Vec::new();
        for row in rows {
            let user_id: Uuid = row.try_get("user_id")?;
            let email: String = row.try_get("email")?;
            let created_at: Option<DateTime<Utc>> = row.try_get("created_at")?;
            let content: Option<String> = row.try_get("content")?;

            if users.last().map(|u: &DigestUser| u.id) != Some(user_id) {
                users.push(DigestUser {
                    id: user_id,
                    email,
                    entries: Vec::new(),
                });
            }

            // LEFT JOIN yields a NULL entry row for users with no entries
            if let (Some(created_at), Some(content)) = (created_at, content) {
                if let Some(user) = users.last_mut() {
                    user.entries.push(JournalEntry {
                        created_at,
                        content,
                    });
                }
            }
        }

        info!("Data source returned {} eligible users", users.len());
        Ok(users)
    }
}
