// In-memory SuperJobRepository Implementation

use async_trait::async_trait;
use paygate_core::domain::{JobId, SuperJob};
use paygate_core::error::{AppError, Result};
use paygate_core::port::{SuperJobMutation, SuperJobRepository};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
pub struct InMemorySuperJobRepository {
    jobs: RwLock<HashMap<JobId, SuperJob>>,
}

impl InMemorySuperJobRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SuperJobRepository for InMemorySuperJobRepository {
    async fn insert(&self, job: &SuperJob) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(AppError::Conflict(format!(
                "Super job {} already exists",
                job.id
            )));
        }
        jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &JobId) -> Result<Option<SuperJob>> {
        Ok(self.jobs.read().await.get(id).cloned())
    }

    async fn modify(&self, id: &JobId, mutation: SuperJobMutation) -> Result<SuperJob> {
        let mut jobs = self.jobs.write().await;
        let stored = jobs
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound("Super job not found".to_string()))?;
        mutation(stored);
        debug!(super_job_id = %id, status = ?stored.status, "Super job updated");
        Ok(stored.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paygate_core::domain::SuperJobStatus;

    #[tokio::test]
    async fn test_insert_modify_find() {
        let repo = InMemorySuperJobRepository::new();
        repo.insert(&SuperJob::new("s-1", 0, "buyer", "task"))
            .await
            .unwrap();

        let updated = repo
            .modify(
                &"s-1".to_string(),
                Box::new(|job| job.status = SuperJobStatus::StartingJob),
            )
            .await
            .unwrap();
        assert_eq!(updated.status, SuperJobStatus::StartingJob);

        let found = repo.find_by_id(&"s-1".to_string()).await.unwrap().unwrap();
        assert_eq!(found.status, SuperJobStatus::StartingJob);
    }

    #[tokio::test]
    async fn test_unknown_super_job() {
        let repo = InMemorySuperJobRepository::new();
        let err = repo
            .modify(&"nope".to_string(), Box::new(|_| {}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Super job not found");
        assert!(repo.insert(&SuperJob::new("s", 0, "b", "t")).await.is_ok());
        assert!(repo.insert(&SuperJob::new("s", 0, "b", "t")).await.is_err());
    }
}
