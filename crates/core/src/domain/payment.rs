// Payment Domain Model

use serde::{Deserialize, Serialize};

/// Blockchain identifier of a payment request
pub type PaymentId = String;

/// Price component of a payment request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub amount: String,
    pub unit: String,
}

impl Amount {
    pub fn new(amount: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            unit: unit.into(),
        }
    }
}

/// Payment request registered for a job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub agent_identifier: String,
    pub network: String,
    pub identifier_from_purchaser: String,
    pub input_hash: String,
    pub amounts: Vec<Amount>,
}

/// What the payment service returns for a registered request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub blockchain_identifier: PaymentId,
    pub submit_result_time: String,
    pub unlock_time: String,
    pub external_dispute_unlock_time: String,
}

/// Payment-side status of a job
///
/// Remote variants mirror the payment service's `onChainState`; `Completed`,
/// `Unknown` and `Error` are set locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Pending,
    FundsLocked,
    ResultSubmitted,
    RefundRequested,
    Disputed,
    Withdrawn,
    RefundWithdrawn,
    DisputedWithdrawn,
    FundsOrDatumInvalid,
    Completed,
    Unknown,
    Error,
}

impl PaymentState {
    /// Parse the payment service's `onChainState` (None = nothing on chain yet)
    pub fn from_on_chain(state: Option<&str>) -> Self {
        match state {
            None => PaymentState::Pending,
            Some("FundsLocked") => PaymentState::FundsLocked,
            Some("ResultSubmitted") => PaymentState::ResultSubmitted,
            Some("RefundRequested") => PaymentState::RefundRequested,
            Some("Disputed") => PaymentState::Disputed,
            Some("Withdrawn") => PaymentState::Withdrawn,
            Some("RefundWithdrawn") => PaymentState::RefundWithdrawn,
            Some("DisputedWithdrawn") => PaymentState::DisputedWithdrawn,
            Some("FundsOrDatumInvalid") => PaymentState::FundsOrDatumInvalid,
            Some(_) => PaymentState::Unknown,
        }
    }

    /// Purchaser has paid; the agent may run
    pub fn is_confirmed(&self) -> bool {
        matches!(self, PaymentState::FundsLocked)
    }

    /// Final states reached without the funds ever being locked for us
    pub fn is_abandoned(&self) -> bool {
        matches!(
            self,
            PaymentState::RefundWithdrawn
                | PaymentState::DisputedWithdrawn
                | PaymentState::FundsOrDatumInvalid
        )
    }
}

impl std::fmt::Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentState::Pending => "pending",
            PaymentState::FundsLocked => "funds_locked",
            PaymentState::ResultSubmitted => "result_submitted",
            PaymentState::RefundRequested => "refund_requested",
            PaymentState::Disputed => "disputed",
            PaymentState::Withdrawn => "withdrawn",
            PaymentState::RefundWithdrawn => "refund_withdrawn",
            PaymentState::DisputedWithdrawn => "disputed_withdrawn",
            PaymentState::FundsOrDatumInvalid => "funds_or_datum_invalid",
            PaymentState::Completed => "completed",
            PaymentState::Unknown => "unknown",
            PaymentState::Error => "error",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_chain_parsing() {
        assert_eq!(PaymentState::from_on_chain(None), PaymentState::Pending);
        assert_eq!(
            PaymentState::from_on_chain(Some("FundsLocked")),
            PaymentState::FundsLocked
        );
        assert_eq!(
            PaymentState::from_on_chain(Some("SomethingNew")),
            PaymentState::Unknown
        );
    }

    #[test]
    fn test_confirmation_and_abandonment() {
        assert!(PaymentState::FundsLocked.is_confirmed());
        assert!(!PaymentState::Pending.is_confirmed());
        assert!(PaymentState::RefundWithdrawn.is_abandoned());
        assert!(!PaymentState::RefundRequested.is_abandoned());
        assert!(!PaymentState::FundsLocked.is_abandoned());
    }

    #[test]
    fn test_serialized_form_matches_display() {
        let json = serde_json::to_value(PaymentState::FundsOrDatumInvalid).unwrap();
        assert_eq!(json, "funds_or_datum_invalid");
        assert_eq!(
            PaymentState::FundsOrDatumInvalid.to_string(),
            "funds_or_datum_invalid"
        );
    }
}
