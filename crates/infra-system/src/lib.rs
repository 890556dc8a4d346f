// Paygate Infrastructure - System Adapters
// Implements: TaskExecutor (agent subprocess)

pub mod subprocess_executor;

pub use subprocess_executor::{AgentCommand, SubprocessExecutor, DEFAULT_ENV_ALLOWLIST};
