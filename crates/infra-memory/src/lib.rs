// Paygate Infrastructure - In-Memory Adapter
// Implements: JobRepository, SuperJobRepository
//
// Job state lives for the lifetime of the process only.

mod job_repository;
mod super_job_repository;

pub use job_repository::InMemoryJobRepository;
pub use super_job_repository::InMemorySuperJobRepository;
