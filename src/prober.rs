use sha2::{Digest, Sha256};
use tokio::time::Instant;
use uuid::Uuid;

use crate::client::ExchangeClient;
use crate::error::ExchangeError;
use crate::types::{OrderAck, OrderParams, OrderTemplate};

/// Mints UUID v1 nonces, one per signed request.
#[derive(Debug, Clone)]
pub struct NonceSource {
    node_id: [u8; 6],
}

impl NonceSource {
    /// Node id is the first six bytes of SHA-256 over the lowercased address.
    pub fn for_wallet(wallet: &str) -> Self {
        let digest = Sha256::digest(wallet.to_lowercase().as_bytes());
        let mut node_id = [0u8; 6];
        node_id.copy_from_slice(&digest[..6]);
        Self { node_id }
    }

    pub fn next_nonce(&self) -> String {
        Uuid::now_v1(&self.node_id).to_string()
    }
}

/// Everything a run needs, built once and shared read-only by setup, prober and loop.
pub struct ProbeContext<C> {
    client: C,
    wallet: String,
    order: OrderTemplate,
    nonces: NonceSource,
}

impl<C: ExchangeClient> ProbeContext<C> {
    pub fn new(client: C, wallet: impl Into<String>, order: OrderTemplate) -> Self {
        let wallet = wallet.into();
        let nonces = NonceSource::for_wallet(&wallet);
        Self {
            client,
            wallet,
            order,
            nonces,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn wallet(&self) -> &str {
        &self.wallet
    }

    pub fn order(&self) -> &OrderTemplate {
        &self.order
    }

    /// Order parameters with a freshly minted nonce.
    pub fn next_order(&self) -> OrderParams {
        self.order.order_params(&self.wallet, self.nonces.next_nonce())
    }

    pub async fn associate_wallet(&self) -> Result<(), ExchangeError> {
        let nonce = self.nonces.next_nonce();
        self.client.associate_wallet(&self.wallet, &nonce).await
    }

    /// Submit one order without timing it.
    pub async fn submit_order(&self) -> Result<OrderAck, ExchangeError> {
        self.client.create_order(&self.next_order()).await
    }

    /// Time one order-creation round trip, in whole milliseconds.
    ///
    /// Errors are returned as-is; there is no retry.
    pub async fn measure_latency(&self) -> Result<u64, ExchangeError> {
        let start = Instant::now();
        let params = self.next_order();
        self.client.create_order(&params).await?;
        let elapsed = start.elapsed().as_millis();
        Ok(u64::try_from(elapsed).unwrap_or(u64::MAX))
    }
}
