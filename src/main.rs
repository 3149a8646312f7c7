use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kurobbs::config::AppConfig;
use kurobbs::error::AppError;
use kurobbs::gateway::kurobbs::KurobbsClient;
use kurobbs::notify;
use kurobbs::workflow::retry::Jitter;
use kurobbs::workflow::{report, Orchestrator};

#[derive(Parser)]
#[command(name = "kurobbs", about = "Daily Kuro BBS check-in and forum task runner")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Log at debug level regardless of the DEBUG setting
    #[arg(short, long)]
    debug: bool,
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("{default_level},hyper_util=info"))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_tracing(cli.debug);
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(cli.debug || config.debug);

    let Err(e) = run(&config).await else {
        return ExitCode::SUCCESS;
    };

    match classify(&e) {
        // Already logged and delivered by the report step
        RunFailure::Reported => {}
        RunFailure::Notification => {
            tracing::error!(error = %e, "Failed to deliver the run summary");
        }
        RunFailure::Unexpected => {
            tracing::error!(error = ?e, "An unexpected error occurred");
        }
    }
    ExitCode::FAILURE
}

#[derive(Debug, PartialEq, Eq)]
enum RunFailure {
    Reported,
    Notification,
    Unexpected,
}

fn classify(e: &anyhow::Error) -> RunFailure {
    match e.downcast_ref::<AppError>() {
        Some(AppError::Workflow(_)) => RunFailure::Reported,
        Some(AppError::Notification(_)) => RunFailure::Notification,
        _ => RunFailure::Unexpected,
    }
}

async fn run(config: &AppConfig) -> anyhow::Result<()> {
    tracing::info!(uid = %config.uid, "Starting Kurobbs tasks");

    let gateway = KurobbsClient::new(
        &config.api.base_url,
        &config.token,
        &config.uid,
        config.request_timeout(),
    )?;
    let notifier = notify::from_config(&config.notify, config.request_timeout())?;

    let outcome = Orchestrator::new(&gateway, Jitter::from(&config.pacing))
        .run()
        .await;

    report(outcome, notifier.as_ref()).await?;
    Ok(())
}
