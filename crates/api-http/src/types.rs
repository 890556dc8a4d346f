//! Request and response bodies
//!
//! Field names follow the MIP-003 agent API, which mixes snake_case and
//! camelCase.

use paygate_core::application::{Availability, InputField, StartJobReceipt, StartSuperReceipt};
use paygate_core::domain::{Amount, InputData, Job, JobStatus, PaymentState, SuperJob, SuperJobStatus};
use serde::{Deserialize, Serialize};

// ============================================================================
// /start_job
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartJobBody {
    #[serde(default)]
    pub identifier_from_purchaser: String,
    #[serde(default)]
    pub input_data: Option<InputData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartJobResponse {
    pub status: String,
    #[serde(rename = "job_id")]
    pub job_id: String,
    pub blockchain_identifier: String,
    pub submit_result_time: String,
    pub unlock_time: String,
    pub external_dispute_unlock_time: String,
    pub agent_identifier: String,
    pub seller_vkey: String,
    pub identifier_from_purchaser: String,
    pub amounts: Vec<Amount>,
    #[serde(rename = "input_hash")]
    pub input_hash: String,
}

impl From<StartJobReceipt> for StartJobResponse {
    fn from(receipt: StartJobReceipt) -> Self {
        Self {
            status: "success".to_string(),
            job_id: receipt.job_id,
            blockchain_identifier: receipt.payment.blockchain_identifier,
            submit_result_time: receipt.payment.submit_result_time,
            unlock_time: receipt.payment.unlock_time,
            external_dispute_unlock_time: receipt.payment.external_dispute_unlock_time,
            agent_identifier: receipt.agent_identifier,
            seller_vkey: receipt.seller_vkey,
            identifier_from_purchaser: receipt.identifier_from_purchaser,
            amounts: receipt.amounts,
            input_hash: receipt.input_hash,
        }
    }
}

// ============================================================================
// /status and /superStatus
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct JobIdQuery {
    pub job_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub payment_status: PaymentState,
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Job> for JobStatusResponse {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.id,
            status: job.status,
            payment_status: job.payment_status,
            result: job.result,
            error: job.error,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuperStatusResponse {
    pub job_id: String,
    pub status: SuperJobStatus,
    pub payment_status: PaymentState,
    pub elapsed_seconds: f64,
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SuperStatusResponse {
    pub fn new(job: SuperJob, elapsed_seconds: f64) -> Self {
        Self {
            job_id: job.id,
            status: job.status,
            payment_status: job.payment_status,
            elapsed_seconds,
            result: job.result,
            error: job.error,
        }
    }
}

// ============================================================================
// /provide_input
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ProvideInputBody {
    pub job_id: String,
    #[serde(default)]
    pub input_data: Option<InputData>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProvideInputResponse {
    pub status: String,
    pub job_id: String,
    pub input_hash: String,
}

// ============================================================================
// /availability, /input_schema, /health
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub status: String,
    pub agent_identifier: String,
    pub message: String,
}

impl From<Availability> for AvailabilityResponse {
    fn from(a: Availability) -> Self {
        Self {
            status: a.status,
            agent_identifier: a.agent_identifier,
            message: a.message,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InputFieldData {
    pub description: String,
    pub placeholder: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InputFieldResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub name: String,
    pub data: InputFieldData,
}

impl From<InputField> for InputFieldResponse {
    fn from(field: InputField) -> Self {
        Self {
            id: field.id,
            field_type: field.field_type,
            name: field.name,
            data: InputFieldData {
                description: field.description,
                placeholder: field.placeholder,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InputSchemaResponse {
    pub input_data: Vec<InputFieldResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

// ============================================================================
// /startSuper
// ============================================================================

/// Purchaser identifier used when `/startSuper` is called without one
pub const DEFAULT_SUPER_IDENTIFIER: &str = "123123123123123";

fn default_super_identifier() -> String {
    DEFAULT_SUPER_IDENTIFIER.to_string()
}

#[derive(Debug, Deserialize)]
pub struct StartSuperBody {
    #[serde(default = "default_super_identifier")]
    pub identifier: String,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartSuperResponse {
    pub job_id: String,
    pub status: String,
    pub message: String,
}

impl From<StartSuperReceipt> for StartSuperResponse {
    fn from(receipt: StartSuperReceipt) -> Self {
        Self {
            job_id: receipt.job_id,
            status: receipt.status,
            message: receipt.message,
        }
    }
}
