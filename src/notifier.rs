use crate::config::SmtpConfig;
use crate::types::{DigestError, Result};
use async_trait::async_trait;
use lettre::transport::smtp::client::Tls;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

/// Capability that dispatches one message to one recipient.
///
/// Each call is at-most-once: the notifier never retries internally. Retry
/// policy, if any, belongs to the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a single message. Transport or configuration failures surface as
    /// `DigestError::Notify`.
    async fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<()>;
}

/// SMTP notifier backed by lettre's async transport.
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpNotifier {
    /// Build the transport once at startup. A bad relay host is a
    /// configuration error here, not a runtime null-dispatch failure later.
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.server)
                .map_err(|e| DigestError::Config(format!("SMTP relay {}: {}", config.server, e)))?
        } else {
            // Plaintext transport for local development servers only
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.server).tls(Tls::None)
        };

        let mut builder = builder.port(config.port);
        if let Some(credentials) = config.credentials() {
            builder = builder.credentials(credentials);
        }

        info!(
            "Configured SMTP notifier for {}:{} (tls={})",
            config.server, config.port, config.use_tls
        );

        Ok(Self {
            mailer: builder.build(),
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|e| DigestError::Notify(format!("invalid sender address: {}", e)))?,
            )
            .to(recipient
                .parse()
                .map_err(|e| DigestError::Notify(format!("invalid recipient {}: {}", recipient, e)))?)
            .subject(subject)
            .body(body.to_string())
            .map_err(|e| DigestError::Notify(format!("failed to build message: {}", e)))?;

        match self.mailer.send(message).await {
            Ok(_) => {
                debug!("Sent digest email to {}", recipient);
                Ok(())
            }
            Err(e) => Err(DigestError::Notify(format!(
                "SMTP send to {} failed: {}",
                recipient, e
            ))),
        }
    }
}
