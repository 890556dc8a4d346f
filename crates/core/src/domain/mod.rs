// Domain Layer - Pure business logic and entities

pub mod error;
pub mod input;
pub mod job;
pub mod payment;
pub mod super_job;

// Re-exports
pub use error::DomainError;
pub use input::{input_hash, InputData};
pub use job::{Job, JobId, JobStatus};
pub use payment::{Amount, PaymentId, PaymentReceipt, PaymentRequest, PaymentState};
pub use super_job::{SuperJob, SuperJobStatus};
