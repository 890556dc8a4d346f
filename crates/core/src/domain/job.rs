// Job Domain Model

use super::error::{DomainError, Result};
use super::input::input_hash;
use super::payment::{PaymentId, PaymentState};
use serde::{Deserialize, Serialize};

/// Job ID (UUID v4)
pub type JobId = String;

/// Job Status
///
/// `AwaitingPayment -> Running -> Completed`, or `Failed` from any
/// non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    AwaitingPayment,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::AwaitingPayment => write!(f, "awaiting_payment"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Job Entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub identifier_from_purchaser: String,

    pub status: JobStatus,
    pub payment_status: PaymentState,
    pub payment_id: PaymentId,

    pub input_data: String,
    pub input_hash: String,
    pub result: Option<String>,
    pub error: Option<String>,

    pub created_at: i64, // epoch ms
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,
}

impl Job {
    /// Create a new job awaiting payment
    ///
    /// # Arguments
    ///
    /// * `id` - Unique job ID (injected, not generated)
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    /// * `identifier_from_purchaser` - Purchaser-chosen identifier
    /// * `payment_id` - Blockchain identifier of the registered payment request
    /// * `input_data` - Free-text task input
    pub fn new(
        id: impl Into<String>,
        created_at: i64,
        identifier_from_purchaser: impl Into<String>,
        payment_id: impl Into<String>,
        input_data: impl Into<String>,
    ) -> Self {
        let input_data = input_data.into();
        Self {
            id: id.into(),
            identifier_from_purchaser: identifier_from_purchaser.into(),
            status: JobStatus::AwaitingPayment,
            payment_status: PaymentState::Pending,
            payment_id: payment_id.into(),
            input_hash: input_hash(&input_data),
            input_data,
            result: None,
            error: None,
            created_at,
            started_at: None,
            finished_at: None,
        }
    }

    /// Whether the job can no longer change status
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, JobStatus::Completed | JobStatus::Failed)
    }

    /// Payment confirmed: AwaitingPayment -> Running
    pub fn start(&mut self, now_millis: i64) -> Result<()> {
        if self.status != JobStatus::AwaitingPayment {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: JobStatus::Running.to_string(),
            });
        }
        self.status = JobStatus::Running;
        self.payment_status = PaymentState::FundsLocked;
        self.started_at = Some(now_millis);
        Ok(())
    }

    /// Task finished and payment completed: Running -> Completed
    pub fn complete(&mut self, result: impl Into<String>, now_millis: i64) -> Result<()> {
        if self.status != JobStatus::Running {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: JobStatus::Completed.to_string(),
            });
        }
        self.status = JobStatus::Completed;
        self.payment_status = PaymentState::Completed;
        self.result = Some(result.into());
        self.finished_at = Some(now_millis);
        Ok(())
    }

    /// Mark as Failed with explicit timestamp
    pub fn fail(&mut self, error: impl Into<String>, now_millis: i64) -> Result<()> {
        if self.is_terminal() {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: JobStatus::Failed.to_string(),
            });
        }
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
        self.finished_at = Some(now_millis);
        Ok(())
    }

    /// Replace the pending input (only before the agent has picked it up)
    pub fn provide_input(&mut self, input_data: impl Into<String>) -> Result<()> {
        if self.status != JobStatus::AwaitingPayment {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: "input update".to_string(),
            });
        }
        let input_data = input_data.into();
        if input_data.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "input_data must not be empty".to_string(),
            ));
        }
        self.input_hash = input_hash(&input_data);
        self.input_data = input_data;
        Ok(())
    }
}
