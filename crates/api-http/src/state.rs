//! Application state shared across handlers

use crate::logs::LogBuffer;
use paygate_core::application::{JobService, SuperJobService};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<JobService>,
    pub super_jobs: SuperJobService,
    /// Recent log entries served by `/logs`
    pub logs: Arc<LogBuffer>,
}

impl AppState {
    pub fn new(jobs: Arc<JobService>, super_jobs: SuperJobService, logs: Arc<LogBuffer>) -> Self {
        Self {
            jobs,
            super_jobs,
            logs,
        }
    }
}
