// Task Executor Port
// Abstraction for running the agent on a paid job

use crate::domain::Job;
use async_trait::async_trait;
use thiserror::Error;

/// Result of task execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub status: ExecutionStatus,
    pub duration_ms: i64,
    pub exit_code: Option<i32>,
    pub output: String,
    pub stderr: Option<String>,
}

/// Execution status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    Success,
    Failed,
}

/// Execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Agent timeout after {0}ms")]
    Timeout(i64),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Task Executor trait
///
/// Implementations:
/// - SubprocessExecutor: runs the configured agent command
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Run the agent on the job's input
    ///
    /// # Errors
    /// - ExecutionError::SpawnFailed if the agent cannot be started
    /// - ExecutionError::Timeout if execution exceeds the configured limit
    async fn execute(&self, job: &Job) -> Result<ExecutionResult, ExecutionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Mock executor behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Succeed, echoing the input with a prefix
        Success,
        /// Exit non-zero with stderr
        ExitFailure(String),
        /// Fail to start with message
        Fail(String),
        /// Panic with message (for panic isolation testing)
        Panic(String),
        /// Succeed after a delay
        Slow(Duration),
    }

    /// Mock Task Executor for testing
    pub struct MockTaskExecutor {
        behavior: Arc<Mutex<MockBehavior>>,
        call_count: Arc<Mutex<usize>>,
    }

    impl MockTaskExecutor {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                call_count: Arc::new(Mutex::new(0)),
            }
        }
        pub fn new_success() -> Self {
            Self::new(MockBehavior::Success)
        }
        pub fn new_fail(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Fail(message.into()))
        }
        pub fn new_panic_inducing(message: impl Into<String>) -> Self {
            Self::new(MockBehavior::Panic(message.into()))
        }
        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    /// Output produced by `MockBehavior::Success`
    pub fn mock_output(input: &str) -> String {
        format!("analysis of: {}", input)
    }

    #[async_trait]
    impl TaskExecutor for MockTaskExecutor {
        async fn execute(&self, job: &Job) -> Result<ExecutionResult, ExecutionError> {
            *self.call_count.lock().unwrap() += 1;

            let behavior = self.behavior.lock().unwrap().clone();

            match behavior {
                MockBehavior::Success => Ok(ExecutionResult {
                    status: ExecutionStatus::Success,
                    duration_ms: 100,
                    exit_code: Some(0),
                    output: mock_output(&job.input_data),
                    stderr: None,
                }),
                MockBehavior::ExitFailure(stderr) => Ok(ExecutionResult {
                    status: ExecutionStatus::Failed,
                    duration_ms: 100,
                    exit_code: Some(1),
                    output: String::new(),
                    stderr: Some(stderr),
                }),
                MockBehavior::Fail(msg) => Err(ExecutionError::SpawnFailed(msg)),
                MockBehavior::Panic(msg) => {
                    panic!("{}", msg); // Actually panic for panic isolation testing
                }
                MockBehavior::Slow(delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(ExecutionResult {
                        status: ExecutionStatus::Success,
                        duration_ms: delay.as_millis() as i64,
                        exit_code: Some(0),
                        output: mock_output(&job.input_data),
                        stderr: None,
                    })
                }
            }
        }
    }
}
