// Payment Gateway Port
// Abstraction over the external payment service (seller side) and the
// purchase endpoint (buyer side, used by super jobs)

use crate::domain::{Amount, PaymentId, PaymentReceipt, PaymentRequest, PaymentState};
use async_trait::async_trait;
use thiserror::Error;

/// Payment service errors
#[derive(Error, Debug, Clone)]
pub enum PaymentError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Payment service returned {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Payment not found: {0}")]
    NotFound(String),
}

impl PaymentError {
    /// Errors where the payment service answered but we can't read a state
    /// (reported as `unknown` rather than `error`)
    pub fn is_unreadable(&self) -> bool {
        matches!(self, PaymentError::Malformed(_) | PaymentError::NotFound(_))
    }
}

/// Seller-side payment operations
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Register a payment request for a job
    async fn create_payment_request(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentReceipt, PaymentError>;

    /// Current state of a payment
    async fn check_payment_status(&self, payment_id: &PaymentId)
        -> Result<PaymentState, PaymentError>;

    /// Submit the result hash, completing the payment
    async fn complete_payment(
        &self,
        payment_id: &PaymentId,
        result_hash: &str,
    ) -> Result<(), PaymentError>;
}

/// Purchase of a registered payment request (buyer side)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseRequest {
    pub job_id: String,
    pub blockchain_identifier: PaymentId,
    pub submit_result_time: String,
    pub unlock_time: String,
    pub external_dispute_unlock_time: String,
    pub agent_identifier: String,
    pub seller_vkey: String,
    pub identifier_from_purchaser: String,
    pub amounts: Vec<Amount>,
    pub input_hash: String,
}

#[async_trait]
pub trait PurchaseGateway: Send + Sync {
    /// Whether a purchaser token is configured
    fn has_credentials(&self) -> bool;

    async fn purchase(&self, request: &PurchaseRequest) -> Result<(), PaymentError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::sync::Notify;

    /// Holds status checks after they have read their state
    #[derive(Default)]
    pub struct StatusGate {
        entered: Notify,
        release: Notify,
    }

    impl StatusGate {
        /// Wait until a status check is held at the gate
        pub async fn entered(&self) {
            self.entered.notified().await;
        }

        /// Let one held status check return
        pub fn release(&self) {
            self.release.notify_one();
        }
    }

    /// Scripted payment service
    ///
    /// Each payment id walks through the scripted states; the last state
    /// repeats. Unscripted payments stay `Pending`.
    pub struct MockPaymentGateway {
        counter: AtomicU64,
        scripts: Mutex<HashMap<PaymentId, VecDeque<Result<PaymentState, PaymentError>>>>,
        default_script: Mutex<Vec<Result<PaymentState, PaymentError>>>,
        fail_create: Mutex<Option<PaymentError>>,
        fail_complete: Mutex<Option<PaymentError>>,
        completed: Mutex<Vec<(PaymentId, String)>>,
        created: Mutex<Vec<PaymentRequest>>,
        status_checks: AtomicU64,
        status_gate: Mutex<Option<Arc<StatusGate>>>,
    }

    impl Default for MockPaymentGateway {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockPaymentGateway {
        pub fn new() -> Self {
            Self {
                counter: AtomicU64::new(1),
                scripts: Mutex::new(HashMap::new()),
                default_script: Mutex::new(vec![Ok(PaymentState::Pending)]),
                fail_create: Mutex::new(None),
                fail_complete: Mutex::new(None),
                completed: Mutex::new(Vec::new()),
                created: Mutex::new(Vec::new()),
                status_checks: AtomicU64::new(0),
                status_gate: Mutex::new(None),
            }
        }

        /// Every payment confirms on its first status check
        pub fn new_confirming() -> Self {
            let gateway = Self::new();
            gateway.set_default_script(vec![Ok(PaymentState::FundsLocked)]);
            gateway
        }

        /// Script used for payments created after this call
        pub fn set_default_script(&self, script: Vec<Result<PaymentState, PaymentError>>) {
            *self.default_script.lock().unwrap() = script;
        }

        pub fn script(&self, payment_id: &str, states: Vec<Result<PaymentState, PaymentError>>) {
            self.scripts
                .lock()
                .unwrap()
                .insert(payment_id.to_string(), states.into());
        }

        pub fn fail_create_with(&self, err: PaymentError) {
            *self.fail_create.lock().unwrap() = Some(err);
        }

        pub fn fail_complete_with(&self, err: PaymentError) {
            *self.fail_complete.lock().unwrap() = Some(err);
        }

        pub fn completed(&self) -> Vec<(PaymentId, String)> {
            self.completed.lock().unwrap().clone()
        }

        pub fn created(&self) -> Vec<PaymentRequest> {
            self.created.lock().unwrap().clone()
        }

        pub fn status_checks(&self) -> u64 {
            self.status_checks.load(Ordering::SeqCst)
        }

        /// Make every later status check wait on the returned gate
        pub fn gate_status_checks(&self) -> Arc<StatusGate> {
            let gate = Arc::new(StatusGate::default());
            *self.status_gate.lock().unwrap() = Some(Arc::clone(&gate));
            gate
        }
    }

    #[async_trait]
    impl PaymentGateway for MockPaymentGateway {
        async fn create_payment_request(
            &self,
            request: &PaymentRequest,
        ) -> Result<PaymentReceipt, PaymentError> {
            if let Some(err) = self.fail_create.lock().unwrap().clone() {
                return Err(err);
            }
            let n = self.counter.fetch_add(1, Ordering::SeqCst);
            let payment_id = format!("pay-{}", n);
            let script = self.default_script.lock().unwrap().clone();
            self.scripts
                .lock()
                .unwrap()
                .entry(payment_id.clone())
                .or_insert_with(|| script.into());
            self.created.lock().unwrap().push(request.clone());

            Ok(PaymentReceipt {
                blockchain_identifier: payment_id,
                submit_result_time: "1700000600000".to_string(),
                unlock_time: "1700001200000".to_string(),
                external_dispute_unlock_time: "1700001800000".to_string(),
            })
        }

        async fn check_payment_status(
            &self,
            payment_id: &PaymentId,
        ) -> Result<PaymentState, PaymentError> {
            self.status_checks.fetch_add(1, Ordering::SeqCst);
            let state = {
                let mut scripts = self.scripts.lock().unwrap();
                match scripts.get_mut(payment_id) {
                    None => Ok(PaymentState::Pending),
                    Some(script) if script.len() > 1 => {
                        script.pop_front().unwrap_or(Ok(PaymentState::Pending))
                    }
                    Some(script) => script.front().cloned().unwrap_or(Ok(PaymentState::Pending)),
                }
            };

            let gate = self.status_gate.lock().unwrap().clone();
            if let Some(gate) = gate {
                gate.entered.notify_one();
                gate.release.notified().await;
            }
            state
        }

        async fn complete_payment(
            &self,
            payment_id: &PaymentId,
            result_hash: &str,
        ) -> Result<(), PaymentError> {
            if let Some(err) = self.fail_complete.lock().unwrap().clone() {
                return Err(err);
            }
            self.completed
                .lock()
                .unwrap()
                .push((payment_id.clone(), result_hash.to_string()));
            Ok(())
        }
    }

    /// Records purchases, optionally failing them
    pub struct MockPurchaseGateway {
        has_credentials: bool,
        failure: Mutex<Option<PaymentError>>,
        purchases: Mutex<Vec<PurchaseRequest>>,
    }

    impl MockPurchaseGateway {
        pub fn new() -> Self {
            Self {
                has_credentials: true,
                failure: Mutex::new(None),
                purchases: Mutex::new(Vec::new()),
            }
        }

        pub fn without_credentials() -> Self {
            Self {
                has_credentials: false,
                ..Self::new()
            }
        }

        pub fn fail_with(&self, err: PaymentError) {
            *self.failure.lock().unwrap() = Some(err);
        }

        pub fn purchases(&self) -> Vec<PurchaseRequest> {
            self.purchases.lock().unwrap().clone()
        }
    }

    impl Default for MockPurchaseGateway {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl PurchaseGateway for MockPurchaseGateway {
        fn has_credentials(&self) -> bool {
            self.has_credentials
        }

        async fn purchase(&self, request: &PurchaseRequest) -> Result<(), PaymentError> {
            if let Some(err) = self.failure.lock().unwrap().clone() {
                return Err(err);
            }
            self.purchases.lock().unwrap().push(request.clone());
            Ok(())
        }
    }
}
