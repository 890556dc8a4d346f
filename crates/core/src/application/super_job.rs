// Super Job - one-click start, purchase and wait
//
// Drives a job through the same service the HTTP handlers use, buys it with
// the configured purchaser token, then polls until the job settles.

use crate::application::constants::{
    DEFAULT_SUPER_JOB_CHECK_INTERVAL, DEFAULT_SUPER_JOB_MAX_WAIT, DEFAULT_WALLET_BALANCE,
};
use crate::application::job_service::{JobService, StartJobRequest};
use crate::domain::{InputData, JobId, JobStatus, PaymentState, SuperJob, SuperJobStatus};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, PurchaseGateway, PurchaseRequest, SuperJobRepository, TimeProvider};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct SuperJobConfig {
    pub check_interval: Duration,
    pub max_wait: Duration,
    /// Portfolio summary fed to the agent
    pub wallet_balance: String,
}

impl Default for SuperJobConfig {
    fn default() -> Self {
        Self {
            check_interval: DEFAULT_SUPER_JOB_CHECK_INTERVAL,
            max_wait: DEFAULT_SUPER_JOB_MAX_WAIT,
            wallet_balance: DEFAULT_WALLET_BALANCE.to_string(),
        }
    }
}

impl SuperJobConfig {
    /// Number of status checks before giving up
    fn attempts(&self) -> u128 {
        let interval = self.check_interval.as_millis().max(1);
        (self.max_wait.as_millis() / interval).max(1)
    }
}

#[derive(Debug, Clone)]
pub struct StartSuperRequest {
    pub identifier: String,
    /// Wallet address; the balance lookup is not wired up yet
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartSuperReceipt {
    pub job_id: JobId,
    pub status: String,
    pub message: String,
}

#[derive(Clone)]
pub struct SuperJobService {
    repo: Arc<dyn SuperJobRepository>,
    jobs: Arc<JobService>,
    purchase: Arc<dyn PurchaseGateway>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    config: Arc<SuperJobConfig>,
}

impl SuperJobService {
    pub fn new(
        repo: Arc<dyn SuperJobRepository>,
        jobs: Arc<JobService>,
        purchase: Arc<dyn PurchaseGateway>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        config: SuperJobConfig,
    ) -> Self {
        Self {
            repo,
            jobs,
            purchase,
            id_provider,
            time_provider,
            config: Arc::new(config),
        }
    }

    /// Record a super job and process it in the background
    pub async fn start(&self, req: StartSuperRequest) -> Result<StartSuperReceipt> {
        if !self.purchase.has_credentials() {
            return Err(AppError::MissingApiKey(
                "PAYMENT_TOKEN is not configured".to_string(),
            ));
        }
        let identifier = req.identifier.trim().to_string();
        if identifier.is_empty() {
            return Err(AppError::Validation("identifier cannot be empty".to_string()));
        }

        let id = self.id_provider.generate_id();
        let text = format!(
            "User portfolio consists of: {}",
            self.config.wallet_balance
        );
        info!(super_job_id = %id, identifier = %identifier, "Starting super job");

        let job = SuperJob::new(id.clone(), self.time_provider.now_millis(), identifier, text);
        self.repo.insert(&job).await?;

        let service = self.clone();
        let job_id = id.clone();
        tokio::spawn(async move { service.process(job_id).await });

        Ok(StartSuperReceipt {
            message: format!(
                "Super job started. Check /superStatus?job_id={} for updates.",
                id
            ),
            job_id: id,
            status: "started".to_string(),
        })
    }

    /// Super job and the seconds elapsed since it started
    pub async fn status(&self, id: &JobId) -> Result<(SuperJob, f64)> {
        let job = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Super job not found".to_string()))?;
        let elapsed = job.elapsed_seconds(self.time_provider.now_millis());
        Ok((job, elapsed))
    }

    async fn process(&self, id: JobId) {
        if let Err(e) = self.drive(&id).await {
            error!(super_job_id = %id, error = %e, "Super job failed");
            let message = e.to_string();
            if let Err(e) = self
                .repo
                .modify(
                    &id,
                    Box::new(move |job| job.fail_with(SuperJobStatus::Error, message)),
                )
                .await
            {
                error!(super_job_id = %id, error = %e, "Could not record super job failure");
            }
        }
    }

    async fn drive(&self, id: &JobId) -> Result<()> {
        let super_job = self
            .repo
            .modify(
                id,
                Box::new(|job| job.status = SuperJobStatus::StartingJob),
            )
            .await?;

        let receipt = match self
            .jobs
            .start_job(StartJobRequest {
                identifier_from_purchaser: super_job.identifier.clone(),
                input_data: Some(InputData::Text(super_job.text.clone())),
            })
            .await
        {
            Ok(receipt) => receipt,
            Err(e) => {
                error!(super_job_id = %id, error = %e, "Failed to start job");
                let message = format!("Failed to start job: {}", e);
                self.repo
                    .modify(
                        id,
                        Box::new(move |job| job.fail_with(SuperJobStatus::Error, message)),
                    )
                    .await?;
                return Ok(());
            }
        };
        info!(super_job_id = %id, job_id = %receipt.job_id, "Job started");

        let internal_job_id = receipt.job_id.clone();
        self.repo
            .modify(
                id,
                Box::new(move |job| {
                    job.internal_job_id = Some(internal_job_id);
                    job.status = SuperJobStatus::ProcessingPayment;
                }),
            )
            .await?;

        let purchase = PurchaseRequest {
            job_id: receipt.job_id.clone(),
            blockchain_identifier: receipt.payment.blockchain_identifier,
            submit_result_time: receipt.payment.submit_result_time,
            unlock_time: receipt.payment.unlock_time,
            external_dispute_unlock_time: receipt.payment.external_dispute_unlock_time,
            agent_identifier: receipt.agent_identifier,
            seller_vkey: receipt.seller_vkey,
            identifier_from_purchaser: receipt.identifier_from_purchaser,
            amounts: receipt.amounts,
            input_hash: receipt.input_hash,
        };
        if let Err(e) = self.purchase.purchase(&purchase).await {
            error!(super_job_id = %id, error = %e, "Purchase failed");
            let message = format!("Payment API error: {}", e);
            self.repo
                .modify(
                    id,
                    Box::new(move |job| {
                        job.payment_status = PaymentState::Error;
                        job.fail_with(SuperJobStatus::PaymentError, message);
                    }),
                )
                .await?;
            return Ok(());
        }
        info!(super_job_id = %id, "Purchase submitted, waiting for result");

        self.repo
            .modify(
                id,
                Box::new(|job| {
                    job.payment_status = PaymentState::Completed;
                    job.status = SuperJobStatus::WaitingForProcessing;
                }),
            )
            .await?;

        for _ in 0..self.config.attempts() {
            match self.jobs.get_status(&receipt.job_id).await {
                Ok(job) => {
                    let status = job.status;
                    self.repo
                        .modify(
                            id,
                            Box::new(move |super_job| {
                                super_job.status = status.into();
                                match status {
                                    JobStatus::Completed => super_job.result = job.result,
                                    JobStatus::Failed => {
                                        super_job.error = Some("Job failed".to_string())
                                    }
                                    _ => {}
                                }
                            }),
                        )
                        .await?;
                    match status {
                        JobStatus::Completed => {
                            info!(super_job_id = %id, "Super job completed");
                            return Ok(());
                        }
                        JobStatus::Failed => {
                            error!(super_job_id = %id, "Job failed for super job");
                            return Ok(());
                        }
                        _ => {}
                    }
                }
                Err(e) => warn!(super_job_id = %id, error = %e, "Status check failed"),
            }
            tokio::time::sleep(self.config.check_interval).await;
        }

        warn!(super_job_id = %id, "Super job timed out");
        self.repo
            .modify(id, Box::new(|job| job.status = SuperJobStatus::TimedOut))
            .await?;
        Ok(())
    }
}
