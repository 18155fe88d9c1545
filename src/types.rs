use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user eligible for the sentiment digest, with the journal entries the
/// data source returned for them. Entries are owner-scoped and ordered
/// ascending by creation time, but not yet time-windowed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestUser {
    pub id: Uuid,
    pub email: String,
    pub entries: Vec<JournalEntry>,
}

/// A single journal entry. Immutable once created; the pipeline only ever
/// reads a snapshot of these per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub created_at: DateTime<Utc>,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SentimentLabel::Positive => write!(f, "positive"),
            SentimentLabel::Negative => write!(f, "negative"),
            SentimentLabel::Neutral => write!(f, "neutral"),
        }
    }
}

/// Sentiment signal for one user's concatenated window text.
/// Score is in [-1.0, 1.0]; an empty window yields the neutral result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub label: SentimentLabel,
    pub score: f64,
}

impl SentimentResult {
    /// The well-defined result for input with no sentiment signal
    /// (including the empty window).
    pub fn neutral() -> Self {
        Self {
            label: SentimentLabel::Neutral,
            score: 0.0,
        }
    }
}

/// One user that could not be digested in a run, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserFailure {
    pub user_id: Uuid,
    pub reason: String,
}

/// Summary of one pipeline run. `skipped` is nonzero only when the run was
/// cancelled before every user was attempted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub run_timestamp: DateTime<Utc>,
    pub total_users: usize,
    pub succeeded: usize,
    pub failed: Vec<UserFailure>,
    pub skipped: usize,
}

impl RunOutcome {
    pub fn was_cancelled(&self) -> bool {
        self.skipped > 0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("analysis failed: {0}")]
    Analysis(String),

    #[error("notification failed: {0}")]
    Notify(String),

    #[error("user data source unavailable: {0}")]
    DataSource(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid cadence expression: {0}")]
    Cadence(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("run cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, DigestError>;
