//! Paygate - Main Entry Point
//! HTTP facade + payment monitor + job worker

mod config;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use config::{Cli, Settings};
use paygate_api_http::{create_router, AppState, LogBuffer};
use paygate_core::application::{
    shutdown_channel, AgentConfig, JobService, JobWorker, PaymentMonitor, SuperJobConfig,
    SuperJobService,
};
use paygate_core::domain::Amount;
use paygate_core::port::id_provider::UuidProvider;
use paygate_core::port::time_provider::SystemTimeProvider;
use paygate_infra_memory::{InMemoryJobRepository, InMemorySuperJobRepository};
use paygate_infra_payment::{HttpPaymentClient, HttpPurchaseClient, PaymentClientConfig};
use paygate_infra_system::{AgentCommand, SubprocessExecutor, DEFAULT_ENV_ALLOWLIST};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const WORKER_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Configuration
    let cli = Cli::parse();
    let settings = Settings::load(&cli)?;

    // 2. Logging
    let log_buffer = Arc::new(LogBuffer::default());
    let _log_guard = logging::init(&settings.log_format, &settings.log_dir, log_buffer.clone())?;

    info!("Paygate v{} starting...", VERSION);

    // 3. Adapters
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);
    let job_repo = Arc::new(InMemoryJobRepository::new());
    let super_job_repo = Arc::new(InMemorySuperJobRepository::new());

    let payment_gateway = Arc::new(
        HttpPaymentClient::new(PaymentClientConfig {
            base_url: settings.payment_service_url.clone().unwrap_or_default(),
            api_key: settings.payment_api_key.clone().unwrap_or_default(),
            network: settings.payment_network.clone(),
        })
        .context("Failed to build payment service client")?,
    );

    let purchase_gateway = Arc::new(
        HttpPurchaseClient::new(
            settings.purchase_url.clone(),
            settings.payment_token.clone(),
            settings.payment_network.clone(),
        )
        .context("Failed to build purchase client")?,
    );
    if settings.payment_token.is_none() {
        warn!("PAYMENT_TOKEN not set, /startSuper requests will be rejected");
    }

    let env_allowlist = settings.agent_env_allowlist().unwrap_or_else(|| {
        DEFAULT_ENV_ALLOWLIST
            .iter()
            .map(|name| name.to_string())
            .collect()
    });
    let agent = AgentCommand {
        program: settings.agent_command.clone(),
        args: settings.agent_args(),
        timeout: settings.agent_timeout(),
        working_dir: None,
    };
    info!(program = %agent.program, args = ?agent.args, "Agent command configured");
    let task_executor = Arc::new(SubprocessExecutor::new(
        agent,
        time_provider.clone(),
        env_allowlist,
    ));

    // 4. Services
    let (monitor, payment_events) =
        PaymentMonitor::new(payment_gateway.clone(), settings.poll_interval());
    let monitor = Arc::new(monitor);

    let jobs = Arc::new(JobService::new(
        job_repo.clone(),
        payment_gateway.clone(),
        monitor.clone(),
        id_provider.clone(),
        time_provider.clone(),
        AgentConfig {
            agent_identifier: settings.agent_identifier.clone().unwrap_or_default(),
            seller_vkey: settings.seller_vkey.clone(),
            network: settings.payment_network.clone(),
            amounts: vec![Amount::new(
                settings.payment_amount.clone(),
                settings.payment_unit.clone(),
            )],
        },
    ));

    let super_jobs = SuperJobService::new(
        super_job_repo,
        jobs.clone(),
        purchase_gateway,
        id_provider,
        time_provider.clone(),
        SuperJobConfig {
            check_interval: Duration::from_secs(settings.super_job_check_interval_secs),
            max_wait: Duration::from_secs(settings.super_job_max_wait_secs),
            wallet_balance: settings.wallet_balance.clone(),
        },
    );

    // 5. Worker (runs paid jobs)
    info!("Starting job worker...");
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let worker = Arc::new(JobWorker::new(
        job_repo,
        payment_gateway,
        task_executor,
        monitor.clone(),
        time_provider,
    ));
    let worker_handle = tokio::spawn(async move {
        if let Err(e) = worker.run(payment_events, shutdown_rx).await {
            tracing::error!(error = ?e, "Worker failed");
        }
    });

    // 6. HTTP server
    let state = Arc::new(AppState::new(jobs, super_jobs, log_buffer));
    let router = create_router(state);
    let address = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!(address = %address, "System ready, accepting jobs");
    info!("Press Ctrl+C to shutdown");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    // 7. Graceful shutdown
    info!("Shutdown signal received. Exiting gracefully...");
    shutdown_tx.shutdown();
    monitor.stop_all();
    if tokio::time::timeout(WORKER_SHUTDOWN_GRACE, worker_handle)
        .await
        .is_err()
    {
        warn!("Worker did not stop in time");
    }

    info!("Shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        // Never resolve: keep serving rather than exit on a broken signal handler
        std::future::pending::<()>().await;
    }
}
