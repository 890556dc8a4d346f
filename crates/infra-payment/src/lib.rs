// Paygate Infrastructure - Payment Service Adapters
// Implements: PaymentGateway (seller side), PurchaseGateway (buyer side)

mod payment_client;
mod purchase_client;
mod wire;

pub use payment_client::{HttpPaymentClient, PaymentClientConfig};
pub use purchase_client::HttpPurchaseClient;

/// Payment type sent with every request
pub const PAYMENT_TYPE: &str = "Web3CardanoV1";

/// Per-request timeout for payment service calls
pub const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);
