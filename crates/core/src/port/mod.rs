// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod job_repository;
pub mod payment_gateway;
pub mod task_executor;
pub mod time_provider;

// Re-exports
pub use id_provider::IdProvider;
pub use job_repository::{JobMutation, JobRepository, SuperJobMutation, SuperJobRepository};
pub use payment_gateway::{PaymentError, PaymentGateway, PurchaseGateway, PurchaseRequest};
pub use task_executor::{ExecutionError, ExecutionResult, ExecutionStatus, TaskExecutor};
pub use time_provider::TimeProvider;
