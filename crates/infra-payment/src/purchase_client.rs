// HTTP PurchaseGateway Implementation (buyer side, used by super jobs)

use crate::wire::{read_success, transport};
use crate::{PAYMENT_TYPE, REQUEST_TIMEOUT};
use async_trait::async_trait;
use paygate_core::domain::Amount;
use paygate_core::port::{PaymentError, PurchaseGateway, PurchaseRequest};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PurchaseBody<'a> {
    status: &'a str,
    network: &'a str,
    payment_type: &'a str,
    #[serde(rename = "job_id")]
    job_id: &'a str,
    blockchain_identifier: &'a str,
    submit_result_time: &'a str,
    unlock_time: &'a str,
    external_dispute_unlock_time: &'a str,
    agent_identifier: &'a str,
    seller_vkey: &'a str,
    identifier_from_purchaser: &'a str,
    amounts: &'a [Amount],
    input_hash: &'a str,
}

pub struct HttpPurchaseClient {
    client: reqwest::Client,
    purchase_url: String,
    token: Option<String>,
    network: String,
}

impl HttpPurchaseClient {
    /// `token` is the purchaser's API token; without it every purchase is refused
    pub fn new(
        purchase_url: impl Into<String>,
        token: Option<String>,
        network: impl Into<String>,
    ) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(transport)?;
        Ok(Self {
            client,
            purchase_url: purchase_url.into(),
            token: token.filter(|t| !t.trim().is_empty()),
            network: network.into(),
        })
    }
}

#[async_trait]
impl PurchaseGateway for HttpPurchaseClient {
    fn has_credentials(&self) -> bool {
        self.token.is_some()
    }

    async fn purchase(&self, request: &PurchaseRequest) -> Result<(), PaymentError> {
        let token = self.token.as_deref().ok_or_else(|| PaymentError::Status {
            code: 401,
            body: "No purchaser token configured".to_string(),
        })?;

        let body = PurchaseBody {
            status: "success",
            network: &self.network,
            payment_type: PAYMENT_TYPE,
            job_id: &request.job_id,
            blockchain_identifier: &request.blockchain_identifier,
            submit_result_time: &request.submit_result_time,
            unlock_time: &request.unlock_time,
            external_dispute_unlock_time: &request.external_dispute_unlock_time,
            agent_identifier: &request.agent_identifier,
            seller_vkey: &request.seller_vkey,
            identifier_from_purchaser: &request.identifier_from_purchaser,
            amounts: &request.amounts,
            input_hash: &request.input_hash,
        };

        let response = self
            .client
            .post(&self.purchase_url)
            .header("token", token)
            .header("accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        read_success(response).await?;

        info!(
            job_id = %request.job_id,
            payment_id = %request.blockchain_identifier,
            "Purchase submitted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn purchase() -> PurchaseRequest {
        PurchaseRequest {
            job_id: "job-1".to_string(),
            blockchain_identifier: "bc-1".to_string(),
            submit_result_time: "1".to_string(),
            unlock_time: "2".to_string(),
            external_dispute_unlock_time: "3".to_string(),
            agent_identifier: "agent-42".to_string(),
            seller_vkey: "vkey".to_string(),
            identifier_from_purchaser: "buyer".to_string(),
            amounts: vec![Amount::new("10000000", "lovelace")],
            input_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_purchase_posts_receipt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/purchase/"))
            .and(header("token", "buyer-token"))
            .and(body_partial_json(json!({
                "network": "Preprod",
                "paymentType": "Web3CardanoV1",
                "job_id": "job-1",
                "blockchainIdentifier": "bc-1",
                "externalDisputeUnlockTime": "3",
                "sellerVkey": "vkey",
                "identifierFromPurchaser": "buyer",
                "inputHash": "hash"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpPurchaseClient::new(
            format!("{}/api/v1/purchase/", server.uri()),
            Some("buyer-token".to_string()),
            "Preprod",
        )
        .unwrap();
        assert!(client.has_credentials());
        client.purchase(&purchase()).await.unwrap();
    }

    #[tokio::test]
    async fn test_purchase_failure_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("insufficient funds"))
            .mount(&server)
            .await;

        let client =
            HttpPurchaseClient::new(server.uri(), Some("t".to_string()), "Preprod").unwrap();
        let err = client.purchase(&purchase()).await.unwrap_err();
        assert!(err.to_string().contains("insufficient funds"));
    }

    #[tokio::test]
    async fn test_blank_token_means_no_credentials() {
        let client =
            HttpPurchaseClient::new("http://127.0.0.1:9/", Some("  ".to_string()), "Preprod")
                .unwrap();
        assert!(!client.has_credentials());
        let err = client.purchase(&purchase()).await.unwrap_err();
        assert!(matches!(err, PaymentError::Status { code: 401, .. }));
    }
}
