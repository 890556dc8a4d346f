// Application constants (no magic values)
use std::time::Duration;

/// How often a watched payment is polled (payment service default: 60s)
pub const DEFAULT_PAYMENT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Super job: delay between job status checks
pub const DEFAULT_SUPER_JOB_CHECK_INTERVAL: Duration = Duration::from_secs(10);

/// Super job: give up waiting for the result after this long
pub const DEFAULT_SUPER_JOB_MAX_WAIT: Duration = Duration::from_secs(600);

/// Placeholder portfolio used to build super job tasks
pub const DEFAULT_WALLET_BALANCE: &str = "100 ADA, 9000 NMKR";

/// Payment network used for payment requests
pub const DEFAULT_NETWORK: &str = "Preprod";

/// Default price: 10 ADA
pub const DEFAULT_PAYMENT_AMOUNT: &str = "10000000";
pub const DEFAULT_PAYMENT_UNIT: &str = "lovelace";

/// Validation limits for /start_job
pub const MAX_PURCHASER_ID_LEN: usize = 256;
pub const MAX_INPUT_BYTES: usize = 64 * 1024;

/// Input longer than this is truncated in logs
pub const LOG_INPUT_PREVIEW_CHARS: usize = 100;
