use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::auth::{RequestSigner, SignedParameters};
use crate::config::ClientConfig;
use crate::error::ExchangeError;
use crate::types::{AssociateWalletParams, OrderAck, OrderParams};

const WALLETS_PATH: &str = "v4/wallets";
const ORDERS_PATH: &str = "v4/orders";

pub const API_KEY_HEADER: &str = "IDEX-API-Key";
pub const HMAC_SIGNATURE_HEADER: &str = "IDEX-HMAC-Signature";

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The two exchange operations the harness relies on.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Bind a wallet to the API account. Required once before placing orders.
    async fn associate_wallet(&self, wallet: &str, nonce: &str) -> Result<(), ExchangeError>;

    /// Submit one order. Every successful call is a real order on the exchange.
    async fn create_order(&self, params: &OrderParams) -> Result<OrderAck, ExchangeError>;
}

#[derive(Serialize)]
struct SignedRequest<'a, P> {
    parameters: &'a P,
    signature: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// Authenticated REST client.
///
/// Each request body is `{"parameters": ..., "signature": ...}` where the
/// signature is the wallet's EIP-712 signature over the typed parameters; the
/// whole body is then HMAC-signed with the API secret.
pub struct RestExchangeClient {
    http: reqwest::Client,
    base_url: Url,
    signer: RequestSigner,
}

impl RestExchangeClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ExchangeError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ExchangeError::Setup(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            signer: RequestSigner::from_config(config)?,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ExchangeError> {
        self.base_url
            .join(path)
            .map_err(|e| ExchangeError::Setup(format!("invalid endpoint {path}: {e}")))
    }

    async fn post_signed<P, R>(&self, path: &str, parameters: &P) -> Result<R, ExchangeError>
    where
        P: Serialize + SignedParameters + Sync,
        R: DeserializeOwned,
    {
        let request = SignedRequest {
            parameters,
            signature: self.signer.wallet_signature(parameters)?,
        };
        let body = serde_json::to_string(&request)?;
        let hmac = self.signer.hmac_signature(&body)?;

        let url = self.endpoint(path)?;
        debug!("POST {url}");
        let response = self
            .http
            .post(url)
            .header("Content-Type", "application/json")
            .header(API_KEY_HEADER, self.signer.api_key())
            .header(HMAC_SIGNATURE_HEADER, hmac)
            .body(body)
            .send()
            .await
            .map_err(|e| ExchangeError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ExchangeError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(error_from_response(status, &text));
        }

        let payload = if text.trim().is_empty() { "{}" } else { text.as_str() };
        Ok(serde_json::from_str(payload)?)
    }
}

fn error_from_response(status: StatusCode, body: &str) -> ExchangeError {
    let parsed: Option<ApiErrorBody> = serde_json::from_str(body).ok();
    let code = parsed.as_ref().and_then(|b| b.code.clone());
    let message = parsed
        .and_then(|b| b.message)
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ExchangeError::Authentication(format!("{status}: {message}"))
        }
        _ => ExchangeError::Rejected {
            status: status.as_u16(),
            code,
            message,
        },
    }
}

#[async_trait]
impl ExchangeClient for RestExchangeClient {
    async fn associate_wallet(&self, wallet: &str, nonce: &str) -> Result<(), ExchangeError> {
        let params = AssociateWalletParams {
            nonce: nonce.to_string(),
            wallet: wallet.to_string(),
        };
        let _: serde_json::Value = self.post_signed(WALLETS_PATH, &params).await?;
        Ok(())
    }

    async fn create_order(&self, params: &OrderParams) -> Result<OrderAck, ExchangeError> {
        self.post_signed(ORDERS_PATH, params).await
    }
}
