// Job Repository Port (Interface)

use crate::domain::{error::Result as DomainResult, Job, JobId, JobStatus, SuperJob};
use crate::error::Result;
use async_trait::async_trait;

/// Mutation applied atomically by [`JobRepository::modify`]
///
/// If the closure returns an error the stored job is left untouched.
pub type JobMutation = Box<dyn FnOnce(&mut Job) -> DomainResult<()> + Send>;

/// Mutation applied atomically by [`SuperJobRepository::modify`]
pub type SuperJobMutation = Box<dyn FnOnce(&mut SuperJob) + Send>;

/// Repository interface for Job state
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Insert a new job (Conflict if the id already exists)
    async fn insert(&self, job: &Job) -> Result<()>;

    /// Find job by ID
    async fn find_by_id(&self, id: &JobId) -> Result<Option<Job>>;

    /// Read-modify-write under the repository lock, returns the updated job
    async fn modify(&self, id: &JobId, mutation: JobMutation) -> Result<Job>;

    /// All jobs currently in `status`
    async fn list_by_status(&self, status: JobStatus) -> Result<Vec<Job>>;
}

/// Repository interface for super jobs
#[async_trait]
pub trait SuperJobRepository: Send + Sync {
    async fn insert(&self, job: &SuperJob) -> Result<()>;

    async fn find_by_id(&self, id: &JobId) -> Result<Option<SuperJob>>;

    async fn modify(&self, id: &JobId, mutation: SuperJobMutation) -> Result<SuperJob>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Mutex-backed job store for unit tests
    #[derive(Default)]
    pub struct MockJobRepository {
        jobs: Mutex<HashMap<JobId, Job>>,
    }

    impl MockJobRepository {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl JobRepository for MockJobRepository {
        async fn insert(&self, job: &Job) -> Result<()> {
            let mut jobs = self.jobs.lock().unwrap();
            if jobs.contains_key(&job.id) {
                return Err(AppError::Conflict(format!("Job {} already exists", job.id)));
            }
            jobs.insert(job.id.clone(), job.clone());
            Ok(())
        }

        async fn find_by_id(&self, id: &JobId) -> Result<Option<Job>> {
            Ok(self.jobs.lock().unwrap().get(id).cloned())
        }

        async fn modify(&self, id: &JobId, mutation: JobMutation) -> Result<Job> {
            let mut jobs = self.jobs.lock().unwrap();
            let stored = jobs.get_mut(id).ok_or_else(AppError::job_not_found)?;
            let mut updated = stored.clone();
            mutation(&mut updated)?;
            *stored = updated.clone();
            Ok(updated)
        }

        async fn list_by_status(&self, status: JobStatus) -> Result<Vec<Job>> {
            Ok(self
                .jobs
                .lock()
                .unwrap()
                .values()
                .filter(|job| job.status == status)
                .cloned()
                .collect())
        }
    }

    /// Mutex-backed super job store for unit tests
    #[derive(Default)]
    pub struct MockSuperJobRepository {
        jobs: Mutex<HashMap<JobId, SuperJob>>,
    }

    impl MockSuperJobRepository {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl SuperJobRepository for MockSuperJobRepository {
        async fn insert(&self, job: &SuperJob) -> Result<()> {
            self.jobs
                .lock()
                .unwrap()
                .insert(job.id.clone(), job.clone());
            Ok(())
        }

        async fn find_by_id(&self, id: &JobId) -> Result<Option<SuperJob>> {
            Ok(self.jobs.lock().unwrap().get(id).cloned())
        }

        async fn modify(&self, id: &JobId, mutation: SuperJobMutation) -> Result<SuperJob> {
            let mut jobs = self.jobs.lock().unwrap();
            let stored = jobs
                .get_mut(id)
                .ok_or_else(|| AppError::NotFound("Super job not found".to_string()))?;
            mutation(stored);
            Ok(stored.clone())
        }
    }
}
