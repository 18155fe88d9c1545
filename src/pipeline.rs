use crate::data_source::UserDataSource;
use crate::notifier::Notifier;
use crate::sentiment::SentimentAnalyzer;
use crate::types::{
    DigestError, DigestUser, JournalEntry, Result, RunOutcome, SentimentLabel, SentimentResult,
    UserFailure,
};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Orchestrates one digest run end-to-end with per-user isolation.
///
/// One user's malformed data or one transient mail failure must never
/// prevent digesting the remaining users; per-user errors are recorded in
/// the run outcome and never propagate to the scheduler.
pub struct DigestPipeline {
    data_source: Arc<dyn UserDataSource>,
    analyzer: Arc<dyn SentimentAnalyzer>,
    notifier: Arc<dyn Notifier>,
    window: Duration,
    call_timeout: std::time::Duration,
}

impl DigestPipeline {
    /// All three collaborators are required constructor dependencies; a
    /// pipeline without a notifier cannot exist.
    pub fn new(
        data_source: Arc<dyn UserDataSource>,
        analyzer: Arc<dyn SentimentAnalyzer>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            data_source,
            analyzer,
            notifier,
            window: Duration::days(DEFAULT_WINDOW_DAYS),
            call_timeout: std::time::Duration::from_secs(30),
        }
    }

    pub fn with_window_days(mut self, days: i64) -> Self {
        self.window = Duration::days(days);
        self
    }

    /// Bound for each analyzer and notifier call; exceeding it is treated as
    /// the corresponding per-user error, not a hang.
    pub fn with_call_timeout(mut self, call_timeout: std::time::Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Execute one run. Returns an error only when the run could not start
    /// (the user data source was unreachable); everything past that point is
    /// recorded per user in the outcome.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<RunOutcome> {
        // Captured once so every user in this run shares the same cutoff,
        // even if the run takes nontrivial wall-clock time.
        let reference_instant = Utc::now();
        self.run_at(reference_instant, cancel).await
    }

    /// Like `run`, but with an explicit reference instant.
    pub async fn run_at(
        &self,
        reference_instant: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome> {
        info!("Starting digest run at reference instant {}", reference_instant);

        let users = self
            .data_source
            .eligible_users(reference_instant)
            .await
            .map_err(|e| DigestError::DataSource(e.to_string()))?;

        let total_users = users.len();
        let mut succeeded = 0usize;
        let mut failed: Vec<UserFailure> = Vec::new();
        let mut skipped = 0usize;

        for user in &users {
            if cancel.is_cancelled() {
                // No new users after cancellation; the in-flight user (if
                // any) already finished above.
                skipped = total_users - succeeded - failed.len();
                warn!("Run cancelled with {} users not yet started", skipped);
                break;
            }

            match self.digest_user(user, reference_instant).await {
                Ok(()) => {
                    succeeded += 1;
                }
                Err(e) => {
                    warn!("Digest failed for user {}: {}", user.id, e);
                    failed.push(UserFailure {
                        user_id: user.id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let outcome = RunOutcome {
            run_timestamp: reference_instant,
            total_users,
            succeeded,
            failed,
            skipped,
        };
        info!(
            "Digest run complete: {}/{} succeeded, {} failed, {} skipped",
            outcome.succeeded,
            outcome.total_users,
            outcome.failed.len(),
            outcome.skipped
        );
        Ok(outcome)
    }

    /// Window, analyze, and notify one user, strictly sequential within
    /// the user.
    async fn digest_user(&self, user: &DigestUser, reference_instant: DateTime<Utc>) -> Result<()> {
        let window_text = self.window_text(user, reference_instant);
        debug!(
            "User {}: window text is {} bytes",
            user.id,
            window_text.len()
        );

        let sentiment = match timeout(self.call_timeout, self.analyzer.analyze(&window_text)).await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(DigestError::Analysis(format!(
                    "analyzer timed out after {:?}",
                    self.call_timeout
                )))
            }
        };

        let (subject, body) =
            compose_digest_email(&sentiment, window_text.is_empty(), self.window.num_days());

        match timeout(
            self.call_timeout,
            self.notifier.notify(&user.email, &subject, &body),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(DigestError::Notify(format!(
                    "notifier timed out after {:?}",
                    self.call_timeout
                )))
            }
        }

        debug!("User {}: digest sent ({})", user.id, sentiment.label);
        Ok(())
    }

    /// Filter entries to the inclusive window [reference - 7d, reference],
    /// sort chronological ascending, and join contents with single spaces.
    /// Empty window yields the empty string.
    fn window_text(&self, user: &DigestUser, reference_instant: DateTime<Utc>) -> String {
        let cutoff = reference_instant - self.window;

        let mut windowed: Vec<&JournalEntry> = user
            .entries
            .iter()
            .filter(|e| e.created_at >= cutoff && e.created_at <= reference_instant)
            .collect();
        // Sources promise ascending order, but the cutoff guarantee must not
        // depend on it.
        windowed.sort_by_key(|e| e.created_at);

        windowed
            .iter()
            .map(|e| e.content.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Build the notification subject and body from one user's sentiment result
/// and the configured window length.
pub fn compose_digest_email(
    sentiment: &SentimentResult,
    empty_window: bool,
    window_days: i64,
) -> (String, String) {
    let subject = format!("Your journal digest: {}", sentiment.label);

    let body = if empty_window {
        format!(
            "You didn't write any journal entries in the last {} days.\n\n\
             A few minutes of journaling can make your next digest more useful.",
            window_days
        )
    } else {
        let mood_line = match sentiment.label {
            SentimentLabel::Positive => "Your recent entries read mostly positive.",
            SentimentLabel::Negative => "Your recent entries read mostly negative.",
            SentimentLabel::Neutral => "Your recent entries read fairly balanced.",
        };
        format!(
            "{}\n\nSentiment score: {:.2} (range -1.00 to 1.00)\n\n\
             This digest covers your journal entries from the last {} days.",
            mood_line, sentiment.score, window_days
        )
    };

    (subject, body)
}

/// Log a run outcome as a single structured JSON line for the embedding
/// system's observability channel.
pub fn log_run_outcome(outcome: &RunOutcome) {
    match serde_json::to_string(outcome) {
        Ok(json) => info!(target: "digest_run_summary", "{}", json),
        Err(e) => error!("Failed to serialize run outcome: {}", e),
    }
}
