// HTTP PaymentGateway Implementation

use crate::wire::{
    read_json, read_success, time_field, transport, CreatePaymentBody, CreatedPayment, Envelope,
    PaymentList, SubmitResultBody,
};
use crate::{PAYMENT_TYPE, REQUEST_TIMEOUT};
use async_trait::async_trait;
use paygate_core::domain::{PaymentId, PaymentReceipt, PaymentRequest, PaymentState};
use paygate_core::port::{PaymentError, PaymentGateway};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct PaymentClientConfig {
    /// Payment service base URL, e.g. `http://localhost:3001/api/v1`
    pub base_url: String,
    pub api_key: String,
    pub network: String,
}

/// Seller-side client for the payment service REST API
pub struct HttpPaymentClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    network: String,
}

impl HttpPaymentClient {
    pub fn new(config: PaymentClientConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(transport)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            network: config.network,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentClient {
    async fn create_payment_request(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentReceipt, PaymentError> {
        let body = CreatePaymentBody {
            agent_identifier: &request.agent_identifier,
            network: &request.network,
            payment_type: PAYMENT_TYPE,
            input_hash: &request.input_hash,
            identifier_from_purchaser: &request.identifier_from_purchaser,
            amounts: &request.amounts,
        };

        let response = self
            .client
            .post(self.url("payment/"))
            .header("token", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let created: Envelope<CreatedPayment> = read_json(response).await?;
        let data = created.data;

        info!(payment_id = %data.blockchain_identifier, "Payment request registered");
        Ok(PaymentReceipt {
            submit_result_time: time_field(&data.submit_result_time),
            unlock_time: time_field(&data.unlock_time),
            external_dispute_unlock_time: time_field(&data.external_dispute_unlock_time),
            blockchain_identifier: data.blockchain_identifier,
        })
    }

    async fn check_payment_status(
        &self,
        payment_id: &PaymentId,
    ) -> Result<PaymentState, PaymentError> {
        let response = self
            .client
            .get(self.url("payment/"))
            .header("token", &self.api_key)
            .query(&[
                ("network", self.network.as_str()),
                ("blockchainIdentifier", payment_id.as_str()),
            ])
            .send()
            .await
            .map_err(transport)?;
        let list: Envelope<PaymentList> = read_json(response).await?;

        let entry = list
            .data
            .payments
            .into_iter()
            .find(|p| &p.blockchain_identifier == payment_id)
            .ok_or_else(|| PaymentError::NotFound(payment_id.clone()))?;

        let state = PaymentState::from_on_chain(entry.on_chain_state.as_deref());
        debug!(payment_id = %payment_id, state = %state, "Payment status");
        Ok(state)
    }

    async fn complete_payment(
        &self,
        payment_id: &PaymentId,
        result_hash: &str,
    ) -> Result<(), PaymentError> {
        let body = SubmitResultBody {
            network: &self.network,
            blockchain_identifier: payment_id,
            submit_result_hash: result_hash,
        };
        let response = self
            .client
            .post(self.url("payment/submit-result"))
            .header("token", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        read_success(response).await?;

        info!(payment_id = %payment_id, "Result submitted");
        Ok(())
    }
}
