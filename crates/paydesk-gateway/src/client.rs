//! Signed HTTP client for the payment gateway.

use async_trait::async_trait;
use paydesk_core::{PaydeskError, PaymentCreated, PaymentRecord, PaymentRequest, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::gateway::PaymentGateway;
use crate::signer::RsaSigner;
use crate::wire::{
    value_text, CheckPaymentBody, CheckPaymentReply, CreatePaymentBody, CreatePaymentReply,
    Envelope,
};

pub const SECRET_ID_HEADER: &str = "X-Secret-Id";
pub const SIGN_HEADER: &str = "X-Sign";
pub const SIGN_VERSION_HEADER: &str = "X-Sign-Version";
pub const SIGN_VERSION: &str = "1";

/// Client for the gateway's signed JSON API.
#[derive(Debug, Clone)]
pub struct SignedRequestClient {
    /// Base URL without trailing slash.
    api_url: String,

    project_id: String,
    secret_id: String,
    signer: RsaSigner,

    /// HTTP client.
    http_client: reqwest::Client,
}

impl SignedRequestClient {
    /// Build a client, loading the private key once.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let signer = RsaSigner::from_key_material(&config.private_key)?;
        Self::with_signer(config, signer)
    }

    /// Build a client around an already loaded signer.
    pub fn with_signer(config: &GatewayConfig, signer: RsaSigner) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| PaydeskError::Internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            secret_id: config.secret_id.clone(),
            signer,
            http_client,
        })
    }

    /// Serialize, sign and send a request body, returning the raw reply of a
    /// successful (`code == 0`) response.
    async fn post_signed<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<Vec<u8>> {
        // These exact bytes are both signed and sent.
        let payload = serde_json::to_vec(body)?;
        let signature = self.signer.sign(&payload)?;

        let url = format!("{}/{}", self.api_url, endpoint);
        debug!(url = %url, bytes = payload.len(), "Sending signed request");

        let response = self
            .http_client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(SECRET_ID_HEADER, &self.secret_id)
            .header(SIGN_HEADER, signature)
            .header(SIGN_VERSION_HEADER, SIGN_VERSION)
            .body(payload)
            .send()
            .await
            .map_err(|e| PaydeskError::Network(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            warn!(url = %url, status = status.as_u16(), body = %text, "Gateway returned HTTP error");
            return Err(PaydeskError::Http {
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PaydeskError::Network(e.to_string()))?;

        let envelope: Envelope = serde_json::from_slice(&bytes)?;
        if envelope.code != 0 {
            let message = envelope.error.unwrap_or_else(|| "unknown error".to_string());
            warn!(url = %url, code = envelope.code, message = %message, "Gateway rejected request");
            return Err(PaydeskError::GatewayRejected {
                code: envelope.code,
                message,
            });
        }

        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl PaymentGateway for SignedRequestClient {
    async fn create_payment(&self, request: &PaymentRequest) -> Result<PaymentCreated> {
        info!(
            order_id = %request.order_id,
            amount = %request.amount,
            methods = ?request.preferred_methods,
            "Creating payment"
        );

        let body = CreatePaymentBody::new(&self.project_id, request);
        let raw = self.post_signed("payment/create", &body).await?;
        let reply: CreatePaymentReply = serde_json::from_slice(&raw)?;

        info!(order_id = %request.order_id, payment_id = %reply.payment_id, "Payment created");

        Ok(PaymentCreated {
            order_id: request.order_id,
            payment_id: reply.payment_id,
            payment_url: reply.payment_url,
            amount: request.amount,
        })
    }

    async fn check_status(&self, order_id: Uuid) -> Result<PaymentRecord> {
        debug!(order_id = %order_id, "Checking payment status");

        let body = CheckPaymentBody {
            project_identificator: &self.project_id,
            order_id,
        };
        let raw = self.post_signed("payment/check", &body).await?;
        let reply: CheckPaymentReply = serde_json::from_slice(&raw)?;

        Ok(PaymentRecord {
            order_id,
            payment_id: reply.payment_id.unwrap_or_default(),
            status: reply.status,
            amount: reply.original_amount,
            fee: reply.fee,
            received_amount: reply.amount,
            pay_method: reply.pay_method,
            pay_data: value_text(reply.pay_data),
            created_at: value_text(reply.ctime),
        })
    }
}
