pub mod config;
pub mod data_source;
pub mod notifier;
pub mod pipeline;
pub mod scheduler;
pub mod sentiment;
pub mod types;

pub use config::{DigestConfig, SmtpConfig};
pub use data_source::{PostgresUserDataSource, UserDataSource};
pub use notifier::{Notifier, SmtpNotifier};
pub use pipeline::{compose_digest_email, DigestPipeline};
pub use scheduler::{DigestScheduler, SchedulerState};
pub use sentiment::{LexiconAnalyzer, SentimentAnalyzer};
pub use types::*;
