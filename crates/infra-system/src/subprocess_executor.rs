// Subprocess executor: runs the configured agent command on a job's input
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use paygate_core::domain::Job;
use paygate_core::port::task_executor::{
    ExecutionError, ExecutionResult, ExecutionStatus, TaskExecutor,
};
use paygate_core::port::TimeProvider;

/// Placeholder in agent arguments replaced by the job input
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Environment variables passed to the agent when none are configured
pub const DEFAULT_ENV_ALLOWLIST: &[&str] = &["PATH", "HOME", "USER", "LANG", "TMPDIR"];

/// How to launch the agent
#[derive(Debug, Clone)]
pub struct AgentCommand {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
    pub working_dir: Option<String>,
}

/// Spawns the agent as an isolated child process with an allowlisted environment
pub struct SubprocessExecutor {
    agent: AgentCommand,
    time_provider: Arc<dyn TimeProvider>,
    env_allowlist: Vec<String>,
}

impl SubprocessExecutor {
    /// # Example
    /// ```ignore
    /// let executor = SubprocessExecutor::new(
    ///     AgentCommand {
    ///         program: "python".to_string(),
    ///         args: vec!["agent.py".to_string(), "{input}".to_string()],
    ///         timeout: Duration::from_secs(600),
    ///         working_dir: None,
    ///     },
    ///     Arc::new(SystemTimeProvider),
    ///     vec!["PATH".to_string(), "OPENAI_API_KEY".to_string()],
    /// );
    /// ```
    pub fn new(
        agent: AgentCommand,
        time_provider: Arc<dyn TimeProvider>,
        env_allowlist: Vec<String>,
    ) -> Self {
        Self {
            agent,
            time_provider,
            env_allowlist,
        }
    }

    /// Current process environment restricted to the allowlist
    fn filtered_env(&self) -> Vec<(String, String)> {
        std::env::vars()
            .filter(|(k, _)| self.env_allowlist.contains(k))
            .collect()
    }

    fn render_args(&self, input: &str) -> Vec<String> {
        self.agent
            .args
            .iter()
            .map(|arg| arg.replace(INPUT_PLACEHOLDER, input))
            .collect()
    }

    /// Spawn the agent, feed it the input on stdin and wait for output
    async fn spawn_and_wait(
        &self,
        args: &[String],
        input: &str,
    ) -> Result<std::process::Output, ExecutionError> {
        let mut command = Command::new(&self.agent.program);
        command
            .args(args)
            .env_clear()
            .envs(self.filtered_env())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.agent.working_dir {
            command.current_dir(dir);
        }

        let mut child = command
            .spawn()
            .map_err(|e| ExecutionError::SpawnFailed(format!("{}: {}", self.agent.program, e)))?;

        // Written from a separate task so a chatty agent can't deadlock on a full stdout pipe
        if let Some(mut stdin) = child.stdin.take() {
            let input = input.to_owned();
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(input.as_bytes()).await {
                    debug!(error = %e, "Agent did not read its stdin");
                }
            });
        }

        let timeout_ms = self.agent.timeout.as_millis() as i64;
        match timeout(self.agent.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(ExecutionError::IoError(e.to_string())),
            Err(_) => {
                warn!(timeout_ms = %timeout_ms, "Agent timed out, killing it");
                Err(ExecutionError::Timeout(timeout_ms))
            }
        }
    }

    fn build_result(&self, output: std::process::Output, duration_ms: i64) -> ExecutionResult {
        let status = if output.status.success() {
            ExecutionStatus::Success
        } else {
            ExecutionStatus::Failed
        };
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        ExecutionResult {
            status,
            exit_code: output.status.code(),
            duration_ms,
            output: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: (!stderr.is_empty()).then_some(stderr),
        }
    }
}

#[async_trait]
impl TaskExecutor for SubprocessExecutor {
    async fn execute(&self, job: &Job) -> Result<ExecutionResult, ExecutionError> {
        if job.input_data.trim().is_empty() {
            return Err(ExecutionError::InvalidInput("job has no input".to_string()));
        }

        let args = self.render_args(&job.input_data);
        let start_time = self.time_provider.now_millis();
        info!(
            job_id = %job.id,
            command = %self.agent.program,
            timeout_ms = %self.agent.timeout.as_millis(),
            "Starting agent"
        );

        let output = self.spawn_and_wait(&args, &job.input_data).await?;

        let duration_ms = self.time_provider.now_millis() - start_time;
        let result = self.build_result(output, duration_ms);

        info!(
            job_id = %job.id,
            duration_ms = %duration_ms,
            exit_code = ?result.exit_code,
            status = ?result.status,
            "Agent finished"
        );
        Ok(result)
    }
}
