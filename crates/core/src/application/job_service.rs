// Job Service - the operations behind the HTTP facade

use crate::application::constants::{
    LOG_INPUT_PREVIEW_CHARS, MAX_INPUT_BYTES, MAX_PURCHASER_ID_LEN,
};
use crate::application::payment_monitor::PaymentMonitor;
use crate::domain::{
    input_hash, Amount, DomainError, InputData, Job, JobId, JobStatus, PaymentReceipt,
    PaymentRequest, PaymentState,
};
use crate::error::{AppError, Result};
use crate::port::{IdProvider, JobRepository, PaymentGateway, TimeProvider};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Identity and pricing of the agent being sold
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub agent_identifier: String,
    pub seller_vkey: String,
    pub network: String,
    pub amounts: Vec<Amount>,
}

/// Start job request
#[derive(Debug, Clone)]
pub struct StartJobRequest {
    pub identifier_from_purchaser: String,
    pub input_data: Option<InputData>,
}

/// Everything a purchaser needs to pay for a started job
#[derive(Debug, Clone)]
pub struct StartJobReceipt {
    pub job_id: JobId,
    pub payment: PaymentReceipt,
    pub agent_identifier: String,
    pub seller_vkey: String,
    pub identifier_from_purchaser: String,
    pub amounts: Vec<Amount>,
    pub input_hash: String,
}

/// Answer to an availability check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    pub status: String,
    pub agent_identifier: String,
    pub message: String,
}

/// One field of the `/start_job` input form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputField {
    pub id: String,
    pub field_type: String,
    pub name: String,
    pub description: String,
    pub placeholder: String,
}

/// The input form accepted by `start_job`: a single free-text field
pub fn input_schema() -> Vec<InputField> {
    vec![InputField {
        id: "text".to_string(),
        field_type: "string".to_string(),
        name: "Task Description".to_string(),
        description: "The text input for the AI task".to_string(),
        placeholder: "Enter your task description here".to_string(),
    }]
}

/// Validate a start job request, returning the flattened input text
pub fn validate_request(req: &StartJobRequest) -> Result<String> {
    let purchaser = req.identifier_from_purchaser.trim();
    if purchaser.is_empty() {
        return Err(AppError::Validation(
            "identifier_from_purchaser cannot be empty".to_string(),
        ));
    }
    if purchaser.len() > MAX_PURCHASER_ID_LEN {
        return Err(AppError::Validation(format!(
            "identifier_from_purchaser too long (max {} characters)",
            MAX_PURCHASER_ID_LEN
        )));
    }

    let input = req
        .input_data
        .clone()
        .map(InputData::into_text)
        .unwrap_or_default();
    if input.trim().is_empty() {
        return Err(AppError::Validation(
            "input_data is missing or empty".to_string(),
        ));
    }
    if input.len() > MAX_INPUT_BYTES {
        return Err(AppError::Validation(format!(
            "input_data too large (max {} bytes)",
            MAX_INPUT_BYTES
        )));
    }

    Ok(input)
}

fn preview(text: &str) -> String {
    if text.chars().count() > LOG_INPUT_PREVIEW_CHARS {
        let head: String = text.chars().take(LOG_INPUT_PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

pub struct JobService {
    job_repo: Arc<dyn JobRepository>,
    payment_gateway: Arc<dyn PaymentGateway>,
    monitor: Arc<PaymentMonitor>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    agent: AgentConfig,
}

impl JobService {
    pub fn new(
        job_repo: Arc<dyn JobRepository>,
        payment_gateway: Arc<dyn PaymentGateway>,
        monitor: Arc<PaymentMonitor>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        agent: AgentConfig,
    ) -> Self {
        Self {
            job_repo,
            payment_gateway,
            monitor,
            id_provider,
            time_provider,
            agent,
        }
    }

    pub fn agent(&self) -> &AgentConfig {
        &self.agent
    }

    pub fn availability(&self) -> Availability {
        Availability {
            status: "available".to_string(),
            agent_identifier: self.agent.agent_identifier.clone(),
            message: "The server is running smoothly.".to_string(),
        }
    }

    /// Create a job and its payment request, then start watching the payment
    pub async fn start_job(&self, req: StartJobRequest) -> Result<StartJobReceipt> {
        let input = validate_request(&req)?;
        let purchaser = req.identifier_from_purchaser.trim().to_string();

        let job_id = self.id_provider.generate_id();
        info!(input = %preview(&input), "Received job request");
        info!(job_id = %job_id, agent = %self.agent.agent_identifier, "Starting job");

        let hash = input_hash(&input);
        let request = PaymentRequest {
            agent_identifier: self.agent.agent_identifier.clone(),
            network: self.agent.network.clone(),
            identifier_from_purchaser: purchaser.clone(),
            input_hash: hash.clone(),
            amounts: self.agent.amounts.clone(),
        };

        let receipt = self
            .payment_gateway
            .create_payment_request(&request)
            .await
            .map_err(|e| {
                error!(job_id = %job_id, error = %e, "Creating payment request failed");
                AppError::Validation(e.to_string())
            })?;
        info!(job_id = %job_id, payment_id = %receipt.blockchain_identifier, "Created payment request");

        let job = Job::new(
            job_id.clone(),
            self.time_provider.now_millis(),
            purchaser.clone(),
            receipt.blockchain_identifier.clone(),
            input,
        );
        self.job_repo.insert(&job).await?;

        self.monitor
            .watch(job_id.clone(), receipt.blockchain_identifier.clone());

        Ok(StartJobReceipt {
            job_id,
            payment: receipt,
            agent_identifier: self.agent.agent_identifier.clone(),
            seller_vkey: self.agent.seller_vkey.clone(),
            identifier_from_purchaser: purchaser,
            amounts: self.agent.amounts.clone(),
            input_hash: hash,
        })
    }

    /// Current job state; refreshes the payment status while payment is pending
    pub async fn get_status(&self, job_id: &JobId) -> Result<Job> {
        info!(job_id = %job_id, "Checking job status");
        let job = match self.job_repo.find_by_id(job_id).await? {
            Some(job) => job,
            None => {
                warn!(job_id = %job_id, "Job not found");
                return Err(AppError::job_not_found());
            }
        };

        if job.status != JobStatus::AwaitingPayment || !self.monitor.is_watching(job_id) {
            return Ok(job);
        }

        let payment_status = match self
            .payment_gateway
            .check_payment_status(&job.payment_id)
            .await
        {
            Ok(state) => state,
            Err(e) if e.is_unreadable() => {
                warn!(job_id = %job_id, error = %e, "Payment status unreadable");
                PaymentState::Unknown
            }
            Err(e) => {
                error!(job_id = %job_id, error = %e, "Payment status check failed");
                PaymentState::Error
            }
        };
        info!(job_id = %job_id, payment_status = %payment_status, "Updated payment status");

        // The worker may have moved the job on meanwhile; only touch pending jobs
        self.job_repo
            .modify(
                job_id,
                Box::new(move |job| {
                    if job.status == JobStatus::AwaitingPayment {
                        job.payment_status = payment_status;
                    }
                    Ok(())
                }),
            )
            .await
    }

    /// Replace the input of a job that has not been paid yet
    pub async fn provide_input(&self, job_id: &JobId, input_data: InputData) -> Result<Job> {
        let input = input_data.into_text();
        if input.len() > MAX_INPUT_BYTES {
            return Err(AppError::Validation(format!(
                "input_data too large (max {} bytes)",
                MAX_INPUT_BYTES
            )));
        }

        let job = self
            .job_repo
            .modify(job_id, Box::new(move |job| job.provide_input(input)))
            .await
            .map_err(|e| match e {
                AppError::Domain(DomainError::InvalidStateTransition {
                    from,
                    ..
                }) => AppError::Conflict(format!("Job is {}, input can no longer change", from)),
                AppError::Domain(DomainError::ValidationError(msg)) => {
                    AppError::Validation(msg)
                }
                other => other,
            })?;

        info!(job_id = %job_id, input_hash = %job.input_hash, "Job input updated");
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::id_provider::mocks::SequentialIdProvider;
    use crate::port::job_repository::mocks::MockJobRepository;
    use crate::port::payment_gateway::mocks::MockPaymentGateway;
    use crate::port::time_provider::mocks::ManualTimeProvider;
    use crate::port::PaymentError;
    use serde_json::json;
    use std::time::Duration;

    fn agent() -> AgentConfig {
        AgentConfig {
            agent_identifier: "agent-42".to_string(),
            seller_vkey: "vkey-1".to_string(),
            network: "Preprod".to_string(),
            amounts: vec![Amount::new("10000000", "lovelace")],
        }
    }

    struct Fixture {
        service: JobService,
        repo: Arc<MockJobRepository>,
        gateway: Arc<MockPaymentGateway>,
        monitor: Arc<PaymentMonitor>,
    }

    fn fixture() -> Fixture {
        let repo = Arc::new(MockJobRepository::new());
        let gateway = Arc::new(MockPaymentGateway::new());
        // Long interval: monitor never fires within a unit test
        let (monitor, _rx) = PaymentMonitor::new(gateway.clone(), Duration::from_secs(3600));
        let monitor = Arc::new(monitor);
        let service = JobService::new(
            repo.clone(),
            gateway.clone(),
            monitor.clone(),
            Arc::new(SequentialIdProvider::new("job")),
            Arc::new(ManualTimeProvider::new(1_000)),
            agent(),
        );
        Fixture {
            service,
            repo,
            gateway,
            monitor,
        }
    }

    fn request(input: serde_json::Value) -> StartJobRequest {
        StartJobRequest {
            identifier_from_purchaser: "purchaser-1".to_string(),
            input_data: Some(serde_json::from_value(input).unwrap()),
        }
    }

    #[test]
    fn test_validate_purchaser_empty() {
        let req = StartJobRequest {
            identifier_from_purchaser: "  ".to_string(),
            input_data: Some(InputData::from("task")),
        };
        let err = validate_request(&req).unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_validate_purchaser_too_long() {
        let req = StartJobRequest {
            identifier_from_purchaser: "a".repeat(MAX_PURCHASER_ID_LEN + 1),
            input_data: Some(InputData::from("task")),
        };
        assert!(validate_request(&req)
            .unwrap_err()
            .to_string()
            .contains("too long"));
    }

    #[test]
    fn test_validate_missing_input() {
        let req = StartJobRequest {
            identifier_from_purchaser: "p".to_string(),
            input_data: None,
        };
        assert!(validate_request(&req)
            .unwrap_err()
            .to_string()
            .contains("missing"));
    }

    #[test]
    fn test_validate_input_too_large() {
        let req = StartJobRequest {
            identifier_from_purchaser: "p".to_string(),
            input_data: Some(InputData::Text("x".repeat(MAX_INPUT_BYTES + 1))),
        };
        assert!(validate_request(&req)
            .unwrap_err()
            .to_string()
            .contains("too large"));
    }

    #[test]
    fn test_preview_truncates() {
        let long = "y".repeat(150);
        let shown = preview(&long);
        assert_eq!(shown.len(), 103);
        assert!(shown.ends_with("..."));
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn test_input_schema_has_text_field() {
        let schema = input_schema();
        assert_eq!(schema.len(), 1);
        assert_eq!(schema[0].id, "text");
        assert_eq!(schema[0].field_type, "string");
    }

    #[tokio::test]
    async fn test_availability_names_agent() {
        let f = fixture();
        let availability = f.service.availability();
        assert_eq!(availability.status, "available");
        assert_eq!(availability.agent_identifier, "agent-42");
    }

    #[tokio::test]
    async fn test_start_job_registers_payment_and_watches() {
        let f = fixture();
        let receipt = f
            .service
            .start_job(request(json!({"text": "sentiment of $NMKR"})))
            .await
            .unwrap();

        assert_eq!(receipt.job_id, "job-1");
        assert_eq!(receipt.payment.blockchain_identifier, "pay-1");
        assert_eq!(receipt.agent_identifier, "agent-42");
        assert_eq!(receipt.input_hash, input_hash("sentiment of $NMKR"));

        let created = f.gateway.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].identifier_from_purchaser, "purchaser-1");
        assert_eq!(created[0].network, "Preprod");

        let job = f.repo.find_by_id(&receipt.job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::AwaitingPayment);
        assert_eq!(job.payment_id, "pay-1");
        assert_eq!(job.created_at, 1_000);
        assert!(f.monitor.is_watching(&receipt.job_id));
    }

    #[tokio::test]
    async fn test_start_job_payment_failure_stores_nothing() {
        let f = fixture();
        f.gateway
            .fail_create_with(PaymentError::Status { code: 500, body: "down".to_string() });

        let err = f.service.start_job(request(json!("task"))).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("down")));
        assert!(f.repo.find_by_id(&"job-1".to_string()).await.unwrap().is_none());
        assert_eq!(f.monitor.watched_count(), 0);
    }

    #[tokio::test]
    async fn test_status_unknown_job() {
        let f = fixture();
        let err = f.service.get_status(&"nope".to_string()).await.unwrap_err();
        assert_eq!(err.to_string(), "Job not found");
    }

    #[tokio::test]
    async fn test_status_refreshes_payment_state() {
        let f = fixture();
        let receipt = f.service.start_job(request(json!("task"))).await.unwrap();
        f.gateway.script(
            &receipt.payment.blockchain_identifier,
            vec![Ok(PaymentState::FundsLocked)],
        );

        let job = f.service.get_status(&receipt.job_id).await.unwrap();
        // Payment side moves, job status is left to the worker
        assert_eq!(job.payment_status, PaymentState::FundsLocked);
        assert_eq!(job.status, JobStatus::AwaitingPayment);
    }

    #[tokio::test]
    async fn test_status_maps_check_errors() {
        let f = fixture();
        let receipt = f.service.start_job(request(json!("task"))).await.unwrap();
        let pid = receipt.payment.blockchain_identifier.clone();

        f.gateway
            .script(&pid, vec![Err(PaymentError::NotFound(pid.clone()))]);
        let job = f.service.get_status(&receipt.job_id).await.unwrap();
        assert_eq!(job.payment_status, PaymentState::Unknown);

        f.gateway
            .script(&pid, vec![Err(PaymentError::Transport("refused".to_string()))]);
        let job = f.service.get_status(&receipt.job_id).await.unwrap();
        assert_eq!(job.payment_status, PaymentState::Error);
    }

    #[tokio::test]
    async fn test_status_skips_refresh_once_running() {
        let f = fixture();
        let receipt = f.service.start_job(request(json!("task"))).await.unwrap();
        f.repo
            .modify(&receipt.job_id, Box::new(|job| job.start(2_000)))
            .await
            .unwrap();
        let checks = f.gateway.status_checks();

        let job = f.service.get_status(&receipt.job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(f.gateway.status_checks(), checks);
    }

    #[tokio::test]
    async fn test_status_refresh_keeps_worker_transition() {
        let f = fixture();
        let receipt = f.service.start_job(request(json!("task"))).await.unwrap();
        let job_id = receipt.job_id.clone();
        let gate = f.gateway.gate_status_checks();

        // The worker starts the job while the refresh is waiting on the payment service
        let transition = async {
            gate.entered().await;
            f.repo
                .modify(&job_id, Box::new(|job| job.start(2_000)))
                .await
                .unwrap();
            gate.release();
        };
        let (refreshed, ()) = tokio::join!(f.service.get_status(&job_id), transition);

        let job = refreshed.unwrap();
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.payment_status, PaymentState::FundsLocked);
        assert_eq!(f.gateway.status_checks(), 1);
    }

    #[tokio::test]
    async fn test_provide_input() {
        let f = fixture();
        let receipt = f.service.start_job(request(json!("first"))).await.unwrap();

        let job = f
            .service
            .provide_input(&receipt.job_id, InputData::from("second"))
            .await
            .unwrap();
        assert_eq!(job.input_data, "second");
        assert_eq!(job.input_hash, input_hash("second"));

        let err = f
            .service
            .provide_input(&receipt.job_id, InputData::from(""))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        f.repo
            .modify(&receipt.job_id, Box::new(|job| job.start(2_000)))
            .await
            .unwrap();
        let err = f
            .service
            .provide_input(&receipt.job_id, InputData::from("third"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = f
            .service
            .provide_input(&"missing".to_string(), InputData::from("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
