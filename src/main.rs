use clap::Parser;
use journal_digest::{
    DigestConfig, DigestPipeline, DigestScheduler, LexiconAnalyzer, PostgresUserDataSource,
    SmtpNotifier,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "journal-digest", about = "Weekly journal sentiment digest")]
struct Args {
    /// Run a single digest immediately and exit instead of scheduling
    #[arg(long)]
    once: bool,

    /// Override the cadence expression from the environment
    #[arg(long)]
    cadence: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let mut config = DigestConfig::from_env()?;
    if let Some(cadence) = args.cadence {
        config.cadence = cadence;
    }

    info!(
        "Starting journal digest ({} environment, cadence \"{}\")",
        config.environment, config.cadence
    );
    info!("Connecting to database: {}", config.redacted_database_url());

    let data_source = PostgresUserDataSource::new(&config.database_url)
        .await
        .map_err(|e| {
            error!("Failed to connect to database. Make sure PostgreSQL is running:");
            error!("  Or check connection string: {}", config.redacted_database_url());
            e
        })?;

    let notifier = SmtpNotifier::new(&config.smtp)?;
    let analyzer = LexiconAnalyzer::new();

    let pipeline = Arc::new(
        DigestPipeline::new(Arc::new(data_source), Arc::new(analyzer), Arc::new(notifier))
            .with_window_days(config.window_days)
            .with_call_timeout(std::time::Duration::from_secs(config.call_timeout_secs)),
    );

    let scheduler = Arc::new(DigestScheduler::new(&config.cadence, pipeline)?);
    let cancel = CancellationToken::new();

    if args.once {
        info!("Running one digest immediately (--once)");
        match scheduler.trigger(&cancel).await {
            Some(Ok(outcome)) => info!(
                "Digest finished: {}/{} users succeeded",
                outcome.succeeded, outcome.total_users
            ),
            Some(Err(e)) => error!("Digest failed: {}", e),
            None => error!("A run is already in progress"),
        }
        return Ok(());
    }

    let loop_scheduler = scheduler.clone();
    let loop_cancel = cancel.clone();
    let handle = tokio::spawn(async move {
        loop_scheduler.run_forever(loop_cancel).await;
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested, cancelling current run");
    cancel.cancel();
    let _ = handle.await;

    info!("Journal digest stopped");
    Ok(())
}
