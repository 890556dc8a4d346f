// Super Job Domain Model
// One-click flow: start job -> purchase -> wait for the result

use super::job::{JobId, JobStatus};
use super::payment::PaymentState;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuperJobStatus {
    Initializing,
    StartingJob,
    ProcessingPayment,
    PaymentError,
    WaitingForProcessing,
    AwaitingPayment,
    Running,
    Completed,
    Failed,
    TimedOut,
    Error,
}

impl SuperJobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SuperJobStatus::PaymentError
                | SuperJobStatus::Completed
                | SuperJobStatus::Failed
                | SuperJobStatus::TimedOut
                | SuperJobStatus::Error
        )
    }
}

impl From<JobStatus> for SuperJobStatus {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::AwaitingPayment => SuperJobStatus::AwaitingPayment,
            JobStatus::Running => SuperJobStatus::Running,
            JobStatus::Completed => SuperJobStatus::Completed,
            JobStatus::Failed => SuperJobStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuperJob {
    pub id: JobId,
    pub identifier: String,
    pub text: String,
    pub status: SuperJobStatus,
    pub payment_status: PaymentState,
    pub internal_job_id: Option<JobId>,
    pub result: Option<String>,
    pub error: Option<String>,
    pub started_at: i64, // epoch ms
}

impl SuperJob {
    pub fn new(
        id: impl Into<String>,
        started_at: i64,
        identifier: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            identifier: identifier.into(),
            text: text.into(),
            status: SuperJobStatus::Initializing,
            payment_status: PaymentState::Pending,
            internal_job_id: None,
            result: None,
            error: None,
            started_at,
        }
    }

    /// Seconds since start, rounded to one decimal
    pub fn elapsed_seconds(&self, now_millis: i64) -> f64 {
        let elapsed_ms = (now_millis - self.started_at).max(0) as f64;
        (elapsed_ms / 100.0).round() / 10.0
    }

    pub fn fail_with(&mut self, status: SuperJobStatus, error: impl Into<String>) {
        self.status = status;
        self.error = Some(error.into());
    }
}
