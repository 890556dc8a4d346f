//! Daemon settings
//!
//! Sources, lowest precedence first: built-in defaults, an optional
//! `paygate.toml` (or the file given with `--config`), process environment
//! variables, then `--host` / `--port`.

use anyhow::{bail, Context, Result};
use clap::Parser;
use config::{Config, Environment, File};
use paygate_core::application::constants::{
    DEFAULT_NETWORK, DEFAULT_PAYMENT_AMOUNT, DEFAULT_PAYMENT_POLL_INTERVAL, DEFAULT_PAYMENT_UNIT,
    DEFAULT_SUPER_JOB_CHECK_INTERVAL, DEFAULT_SUPER_JOB_MAX_WAIT, DEFAULT_WALLET_BALANCE,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "paygate";

#[derive(Debug, Parser)]
#[command(name = "paygate", version, about = "Paid AI agent service")]
pub struct Cli {
    /// Settings file (toml); defaults to ./paygate.toml when present
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Bind address
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub payment_service_url: Option<String>,
    pub payment_api_key: Option<String>,
    pub agent_identifier: Option<String>,
    #[serde(default)]
    pub seller_vkey: String,

    #[serde(default = "default_payment_amount")]
    pub payment_amount: String,
    #[serde(default = "default_payment_unit")]
    pub payment_unit: String,
    #[serde(default = "default_network")]
    pub payment_network: String,
    #[serde(default = "default_poll_interval")]
    pub payment_poll_interval_secs: u64,

    /// Purchaser token used by super jobs
    #[serde(default)]
    pub payment_token: Option<String>,
    #[serde(default = "default_purchase_url")]
    pub purchase_url: String,
    #[serde(default = "default_check_interval")]
    pub super_job_check_interval_secs: u64,
    #[serde(default = "default_max_wait")]
    pub super_job_max_wait_secs: u64,
    #[serde(default = "default_wallet_balance")]
    pub wallet_balance: String,

    #[serde(default = "default_agent_command")]
    pub agent_command: String,
    /// Whitespace separated; `{input}` is replaced with the job input
    #[serde(default)]
    pub agent_args: String,
    #[serde(default = "default_agent_timeout")]
    pub agent_timeout_secs: u64,
    /// Comma separated variable names passed through to the agent
    #[serde(default)]
    pub agent_env_allowlist: Option<String>,

    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

fn default_payment_amount() -> String {
    DEFAULT_PAYMENT_AMOUNT.to_string()
}

fn default_payment_unit() -> String {
    DEFAULT_PAYMENT_UNIT.to_string()
}

fn default_network() -> String {
    DEFAULT_NETWORK.to_string()
}

fn default_poll_interval() -> u64 {
    DEFAULT_PAYMENT_POLL_INTERVAL.as_secs()
}

fn default_purchase_url() -> String {
    "https://payment.masumi.network/api/v1/purchase/".to_string()
}

fn default_check_interval() -> u64 {
    DEFAULT_SUPER_JOB_CHECK_INTERVAL.as_secs()
}

fn default_max_wait() -> u64 {
    DEFAULT_SUPER_JOB_MAX_WAIT.as_secs()
}

fn default_wallet_balance() -> String {
    DEFAULT_WALLET_BALANCE.to_string()
}

fn default_agent_command() -> String {
    "cat".to_string()
}

fn default_agent_timeout() -> u64 {
    600
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_format() -> LogFormat {
    LogFormat::Pretty
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Settings {
    /// Load from the file, the process environment and the CLI
    pub fn load(cli: &Cli) -> Result<Self> {
        Self::load_with_env(cli, None)
    }

    /// `env` replaces the process environment (tests)
    pub fn load_with_env(cli: &Cli, env: Option<HashMap<String, String>>) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => File::from(path.as_path()).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(Environment::default().source(env))
            .set_override_option("host", cli.host.clone())?
            .set_override_option("port", cli.port.map(i64::from))?
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.payment_api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            bail!("Missing API key: PAYMENT_API_KEY is not set");
        }
        if self.payment_service_url.as_deref().map_or(true, |u| u.trim().is_empty()) {
            bail!("PAYMENT_SERVICE_URL is not set");
        }
        if self.agent_identifier.as_deref().map_or(true, |a| a.trim().is_empty()) {
            bail!("AGENT_IDENTIFIER is not set");
        }
        if self.payment_poll_interval_secs == 0 || self.super_job_check_interval_secs == 0 {
            bail!("Polling intervals must be at least one second");
        }
        Ok(())
    }

    pub fn agent_args(&self) -> Vec<String> {
        self.agent_args.split_whitespace().map(str::to_string).collect()
    }

    /// `None` when unset, so the executor falls back to its defaults
    pub fn agent_env_allowlist(&self) -> Option<Vec<String>> {
        self.agent_env_allowlist.as_ref().map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.payment_poll_interval_secs)
    }

    pub fn agent_timeout(&self) -> Duration {
        Duration::from_secs(self.agent_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
