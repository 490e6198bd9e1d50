use std::sync::Arc;

use anyhow::Context;
use tokio::signal;

use swiftride::collaborators::InMemoryPaymentGateway;
use swiftride::config::Config;
use swiftride::routes::{self, AppState};
use swiftride::{seed, AccountBook, RideLedger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .init();

    let (accounts, fleet) = if config.seed_demo_fleet {
        (AccountBook::with_users(vec![seed::demo_user()]), seed::demo_fleet())
    } else {
        (AccountBook::new(), Vec::new())
    };

    let ledger = Arc::new(
        RideLedger::with_fleet(Arc::new(accounts), fleet).context("invalid scooter fleet")?,
    );
    if config.seed_demo_fleet {
        seed::open_demo_rides(&ledger)
            .await
            .context("failed to open demo rides")?;
        tracing::info!("Demo fleet loaded");
    }

    let gateway = Arc::new(InMemoryPaymentGateway::new(config.currency.clone()));
    let addr = config.bind_address();
    let app = routes::app(AppState::new(ledger, gateway, config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
