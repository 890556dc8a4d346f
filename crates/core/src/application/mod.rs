// Application Layer - Use Cases and Business Logic

pub mod constants;
pub mod job_service;
pub mod payment_monitor;
pub mod shutdown;
pub mod super_job;
pub mod worker;

// Re-exports
pub use job_service::{
    input_schema, AgentConfig, Availability, InputField, JobService, StartJobReceipt,
    StartJobRequest,
};
pub use payment_monitor::{PaymentEvent, PaymentMonitor};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use super_job::{StartSuperReceipt, StartSuperRequest, SuperJobConfig, SuperJobService};
pub use worker::JobWorker;
