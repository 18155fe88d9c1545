use crate::types::{Result, SentimentLabel, SentimentResult};
use async_trait::async_trait;
use tracing::debug;

/// Trait for sentiment analyzers that score a user's aggregated window text.
///
/// Implementations must be deterministic for identical input and side-effect
/// free, so the pipeline can be tested against them and a real ML-backed
/// implementation can be swapped in without changing the pipeline contract.
#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    /// Human-readable name for this analyzer
    fn analyzer_name(&self) -> String;

    /// Score the given text. Empty input is a valid, expected case and must
    /// return the neutral no-signal result rather than an error.
    async fn analyze(&self, text: &str) -> Result<SentimentResult>;
}

/// Deterministic lexicon-based analyzer used as the reference implementation.
///
/// Tokenizes on whitespace, strips non-alphanumeric edges, and scores the
/// balance of positive vs. negative lexicon hits into [-1.0, 1.0].
pub struct LexiconAnalyzer {
    positive_threshold: f64,
    negative_threshold: f64,
}

impl LexiconAnalyzer {
    pub fn new() -> Self {
        Self {
            positive_threshold: 0.1,
            negative_threshold: -0.1,
        }
    }

    /// Override the score thresholds that separate the three labels
    pub fn with_thresholds(mut self, positive: f64, negative: f64) -> Self {
        self.positive_threshold = positive;
        self.negative_threshold = negative;
        self
    }

    fn label_for(&self, score: f64) -> SentimentLabel {
        if score >= self.positive_threshold {
            SentimentLabel::Positive
        } else if score <= self.negative_threshold {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

impl Default for LexiconAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SentimentAnalyzer for LexiconAnalyzer {
    fn analyzer_name(&self) -> String {
        "lexicon".to_string()
    }

    async fn analyze(&self, text: &str) -> Result<SentimentResult> {
        if text.trim().is_empty() {
            debug!("Empty window text, returning neutral sentiment");
            return Ok(SentimentResult::neutral());
        }

        let mut total_words = 0usize;
        let mut balance = 0i64;

        for token in text.split_whitespace() {
            let word: String = token
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            if word.is_empty() {
                continue;
            }
            total_words += 1;
            if is_positive_word(&word) {
                balance += 1;
            } else if is_negative_word(&word) {
                balance -= 1;
            }
        }

        if total_words == 0 {
            return Ok(SentimentResult::neutral());
        }

        // Dampen short texts so a single word does not saturate the score
        let score = balance as f64 / (total_words as f64).max(4.0);
        let score = score.clamp(-1.0, 1.0);

        let result = SentimentResult {
            label: self.label_for(score),
            score,
        };
        debug!(
            "Scored {} words: balance={}, score={:.3}, label={}",
            total_words, balance, result.score, result.label
        );
        Ok(result)
    }
}

fn is_positive_word(word: &str) -> bool {
    matches!(
        word,
        "good" | "great" | "happy" | "joy" | "joyful" | "love" | "loved" | "wonderful"
            | "excellent" | "amazing" | "fantastic" | "glad" | "grateful" | "thankful"
            | "excited" | "fun" | "peaceful" | "calm" | "proud" | "hopeful" | "relaxed"
            | "success" | "successful" | "beautiful" | "nice" | "best" | "better"
    )
}

fn is_negative_word(word: &str) -> bool {
    matches!(
        word,
        "bad" | "sad" | "angry" | "anger" | "hate" | "hated" | "terrible" | "awful"
            | "horrible" | "anxious" | "anxiety" | "worried" | "worry" | "stressed"
            | "stress" | "tired" | "exhausted" | "lonely" | "depressed" | "upset"
            | "fail" | "failed" | "failure" | "worst" | "worse" | "hurt" | "pain"
    )
}
