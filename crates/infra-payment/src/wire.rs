// Payment service wire format and response handling

use paygate_core::port::PaymentError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// All payment service responses wrap their payload in `data`
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatePaymentBody<'a> {
    pub agent_identifier: &'a str,
    pub network: &'a str,
    pub payment_type: &'a str,
    pub input_hash: &'a str,
    pub identifier_from_purchaser: &'a str,
    pub amounts: &'a [paygate_core::domain::Amount],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreatedPayment {
    pub blockchain_identifier: String,
    #[serde(default)]
    pub submit_result_time: Value,
    #[serde(default)]
    pub unlock_time: Value,
    #[serde(default)]
    pub external_dispute_unlock_time: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PaymentList {
    #[serde(default)]
    pub payments: Vec<PaymentEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PaymentEntry {
    pub blockchain_identifier: String,
    pub on_chain_state: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmitResultBody<'a> {
    pub network: &'a str,
    pub blockchain_identifier: &'a str,
    pub submit_result_hash: &'a str,
}

/// Timestamps arrive as numbers or strings depending on the service version
pub(crate) fn time_field(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub(crate) fn transport(err: reqwest::Error) -> PaymentError {
    PaymentError::Transport(err.to_string())
}

/// Turn a response into `T`, mapping non-2xx statuses and undecodable bodies
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, PaymentError> {
    let status = response.status();
    let body = response.text().await.map_err(transport)?;
    if !status.is_success() {
        return Err(PaymentError::Status {
            code: status.as_u16(),
            body,
        });
    }
    serde_json::from_str(&body).map_err(|e| PaymentError::Malformed(e.to_string()))
}

/// Like [`read_json`] for endpoints whose body we don't need
pub(crate) async fn read_success(response: reqwest::Response) -> Result<(), PaymentError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.map_err(transport)?;
    Err(PaymentError::Status {
        code: status.as_u16(),
        body,
    })
}
