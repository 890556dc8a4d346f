// In-memory JobRepository Implementation

use async_trait::async_trait;
use paygate_core::domain::{Job, JobId, JobStatus};
use paygate_core::error::{AppError, Result};
use paygate_core::port::{JobMutation, JobRepository};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Jobs keyed by id behind a single `RwLock`
///
/// `modify` holds the write lock for the whole read-modify-write, so
/// concurrent status refreshes and worker transitions are serialized.
#[derive(Default)]
pub struct InMemoryJobRepository {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn insert(&self, job: &Job) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(AppError::Conflict(format!("Job {} already exists", job.id)));
        }
        jobs.insert(job.id.clone(), job.clone());
        debug!(job_id = %job.id, "Job stored");
        Ok(())
    }

    async fn find_by_id(&self, id: &JobId) -> Result<Option<Job>> {
        Ok(self.jobs.read().await.get(id).cloned())
    }

    async fn modify(&self, id: &JobId, mutation: JobMutation) -> Result<Job> {
        let mut jobs = self.jobs.write().await;
        let stored = jobs.get_mut(id).ok_or_else(AppError::job_not_found)?;

        // Mutate a copy so a rejected transition leaves the stored job intact
        let mut updated = stored.clone();
        mutation(&mut updated)?;
        *stored = updated.clone();

        debug!(job_id = %id, status = %updated.status, "Job updated");
        Ok(updated)
    }

    async fn list_by_status(&self, status: JobStatus) -> Result<Vec<Job>> {
        let jobs = self.jobs.read().await;
        let mut matching: Vec<Job> = jobs
            .values()
            .filter(|job| job.status == status)
            .cloned()
            .collect();
        matching.sort_by_key(|job| job.created_at);
        Ok(matching)
    }
}
