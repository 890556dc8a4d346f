// Worker - runs paid jobs
//
// Consumes payment events from the monitor. Each confirmed job runs in its
// own task; the agent call itself is spawned once more so a panicking agent
// only fails its job.

use crate::application::payment_monitor::{PaymentEvent, PaymentMonitor};
use crate::application::shutdown::ShutdownToken;
use crate::domain::{input_hash, DomainError, JobId, PaymentId, PaymentState};
use crate::error::{AppError, Result};
use crate::port::{ExecutionStatus, JobRepository, PaymentGateway, TaskExecutor, TimeProvider};
use std::any::Any;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

pub struct JobWorker {
    job_repo: Arc<dyn JobRepository>,
    payment_gateway: Arc<dyn PaymentGateway>,
    task_executor: Arc<dyn TaskExecutor>,
    monitor: Arc<PaymentMonitor>,
    time_provider: Arc<dyn TimeProvider>,
}

impl JobWorker {
    pub fn new(
        job_repo: Arc<dyn JobRepository>,
        payment_gateway: Arc<dyn PaymentGateway>,
        task_executor: Arc<dyn TaskExecutor>,
        monitor: Arc<PaymentMonitor>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            job_repo,
            payment_gateway,
            task_executor,
            monitor,
            time_provider,
        }
    }

    /// Run until shutdown or until the monitor's channel closes
    ///
    /// Jobs still running at shutdown are aborted; when the channel closes
    /// they are allowed to finish.
    pub async fn run(
        self: Arc<Self>,
        mut events: mpsc::UnboundedReceiver<PaymentEvent>,
        mut shutdown: ShutdownToken,
    ) -> Result<()> {
        info!("Job worker started");
        let mut running = JoinSet::new();

        let drain = loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        let worker = Arc::clone(&self);
                        running.spawn(async move { worker.handle_event(event).await });
                    }
                    None => {
                        info!("Payment event channel closed");
                        break true;
                    }
                },
                Some(joined) = running.join_next(), if !running.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Job task ended abnormally");
                    }
                }
                _ = shutdown.wait() => {
                    info!("Job worker shutting down");
                    break false;
                }
            }
        };

        if !running.is_empty() && !drain {
            warn!(in_flight = running.len(), "Aborting running jobs");
            running.abort_all();
        }
        while let Some(joined) = running.join_next().await {
            if let Err(e) = joined {
                if !e.is_cancelled() {
                    error!(error = %e, "Job task ended abnormally");
                }
            }
        }
        info!("Job worker stopped");
        Ok(())
    }

    /// Act on one payment event
    pub async fn handle_event(&self, event: PaymentEvent) {
        let outcome = match event {
            PaymentEvent::Confirmed { job_id, payment_id } => {
                let outcome = self.run_job(&job_id, &payment_id).await;
                self.monitor.unwatch(&job_id);
                outcome.map_err(|e| (job_id, e))
            }
            PaymentEvent::Abandoned { job_id, state } => {
                let outcome = self.abandon(&job_id, state).await;
                self.monitor.unwatch(&job_id);
                outcome.map_err(|e| (job_id, e))
            }
        };

        if let Err((job_id, e)) = outcome {
            error!(job_id = %job_id, error = %e, "Failed to record job outcome");
        }
    }

    async fn run_job(&self, job_id: &JobId, payment_id: &PaymentId) -> Result<()> {
        let now = self.time_provider.now_millis();
        let job = match self
            .job_repo
            .modify(job_id, Box::new(move |job| job.start(now)))
            .await
        {
            Ok(job) => job,
            Err(AppError::Domain(DomainError::InvalidStateTransition { from, .. })) => {
                warn!(job_id = %job_id, status = %from, "Ignoring payment confirmation");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        info!(job_id = %job_id, "Payment confirmed, running agent");

        let executor = Arc::clone(&self.task_executor);
        let job_for_exec = job.clone();
        let joined =
            tokio::spawn(async move { executor.execute(&job_for_exec).await }).await;

        let output = match joined {
            Ok(Ok(result)) if result.status == ExecutionStatus::Success => result.output,
            Ok(Ok(result)) => {
                let stderr = result.stderr.unwrap_or_default();
                let message = match result.exit_code {
                    Some(code) => format!("Agent exited with code {}: {}", code, stderr.trim()),
                    None => format!("Agent terminated: {}", stderr.trim()),
                };
                return self.fail(job_id, message).await;
            }
            Ok(Err(e)) => return self.fail(job_id, e.to_string()).await,
            Err(join_err) if join_err.is_panic() => {
                let message = panic_message(join_err.into_panic());
                return self.fail(job_id, format!("Agent panicked: {}", message)).await;
            }
            Err(join_err) => {
                return self
                    .fail(job_id, format!("Agent task cancelled: {}", join_err))
                    .await;
            }
        };

        let result_hash = input_hash(&output);
        if let Err(e) = self
            .payment_gateway
            .complete_payment(payment_id, &result_hash)
            .await
        {
            return self
                .fail(job_id, format!("Payment completion failed: {}", e))
                .await;
        }
        info!(job_id = %job_id, result_hash = %result_hash, "Payment completed");

        let now = self.time_provider.now_millis();
        self.job_repo
            .modify(job_id, Box::new(move |job| job.complete(output, now)))
            .await?;
        info!(job_id = %job_id, "Job completed");
        Ok(())
    }

    async fn abandon(&self, job_id: &JobId, state: PaymentState) -> Result<()> {
        let now = self.time_provider.now_millis();
        let message = format!("Payment ended as {}", state);
        let recorded = state.clone();
        self.job_repo
            .modify(
                job_id,
                Box::new(move |job| {
                    job.payment_status = recorded;
                    job.fail(message, now)
                }),
            )
            .await?;
        warn!(job_id = %job_id, state = %state, "Job failed: payment abandoned");
        Ok(())
    }

    async fn fail(&self, job_id: &JobId, message: String) -> Result<()> {
        error!(job_id = %job_id, error = %message, "Job failed");
        let now = self.time_provider.now_millis();
        self.job_repo
            .modify(job_id, Box::new(move |job| job.fail(message, now)))
            .await?;
        Ok(())
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
