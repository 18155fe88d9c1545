#![allow(dead_code)]

// Shared mocks and fixtures for the digest integration tests

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use journal_digest::{
    DigestError, DigestUser, JournalEntry, Notifier, Result, SentimentAnalyzer, SentimentResult,
    UserDataSource,
};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Data source returning a fixed set of users on every run
pub struct MockDataSource {
    users: Vec<DigestUser>,
}

impl MockDataSource {
    pub fn new(users: Vec<DigestUser>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserDataSource for MockDataSource {
    async fn eligible_users(&self, _reference_instant: DateTime<Utc>) -> Result<Vec<DigestUser>> {
        Ok(self.users.clone())
    }
}

/// Data source that is unreachable at run start
pub struct UnreachableDataSource;

#[async_trait]
impl UserDataSource for UnreachableDataSource {
    async fn eligible_users(&self, _reference_instant: DateTime<Utc>) -> Result<Vec<DigestUser>> {
        Err(DigestError::DataSource("connection refused".to_string()))
    }
}

/// One email captured by the recording notifier
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Notifier that records every dispatch, optionally failing for one
/// recipient and/or delaying each call.
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<SentEmail>>>,
    fail_for: Option<String>,
    delay_ms: u64,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail_for: None,
            delay_ms: 0,
        }
    }

    /// Fail dispatches addressed to the given recipient
    pub fn failing_for(mut self, recipient: &str) -> Self {
        self.fail_for = Some(recipient.to_string());
        self
    }

    /// Delay every dispatch, to simulate a slow mail server
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_handle(&self) -> Arc<Mutex<Vec<SentEmail>>> {
        self.sent.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }

        if self.fail_for.as_deref() == Some(recipient) {
            return Err(DigestError::Notify(format!(
                "SMTP send to {} failed: connection reset",
                recipient
            )));
        }

        self.sent.lock().unwrap().push(SentEmail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Analyzer that records every input blob and returns a neutral result
pub struct RecordingAnalyzer {
    seen: Arc<Mutex<Vec<String>>>,
}

impl RecordingAnalyzer {
    pub fn new() -> Self {
        Self {
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    pub fn seen_handle(&self) -> Arc<Mutex<Vec<String>>> {
        self.seen.clone()
    }
}

#[async_trait]
impl SentimentAnalyzer for RecordingAnalyzer {
    fn analyzer_name(&self) -> String {
        "recording".to_string()
    }

    async fn analyze(&self, text: &str) -> Result<SentimentResult> {
        self.seen.lock().unwrap().push(text.to_string());
        Ok(SentimentResult::neutral())
    }
}

/// Analyzer that rejects every input, for isolation tests
pub struct FailingAnalyzer;

#[async_trait]
impl SentimentAnalyzer for FailingAnalyzer {
    fn analyzer_name(&self) -> String {
        "failing".to_string()
    }

    async fn analyze(&self, _text: &str) -> Result<SentimentResult> {
        Err(DigestError::Analysis("unsupported encoding".to_string()))
    }
}

/// Analyzer that never completes within a sane timeout
pub struct HangingAnalyzer;

#[async_trait]
impl SentimentAnalyzer for HangingAnalyzer {
    fn analyzer_name(&self) -> String {
        "hanging".to_string()
    }

    async fn analyze(&self, _text: &str) -> Result<SentimentResult> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Ok(SentimentResult::neutral())
    }
}

/// A user with the given email and entries
pub fn user_with_entries(email: &str, entries: Vec<JournalEntry>) -> DigestUser {
    DigestUser {
        id: Uuid::new_v4(),
        email: email.to_string(),
        entries,
    }
}

/// An entry created the given number of days before `reference`
pub fn entry_days_ago(reference: DateTime<Utc>, days: i64, content: &str) -> JournalEntry {
    JournalEntry {
        created_at: reference - Duration::days(days),
        content: content.to_string(),
    }
}
