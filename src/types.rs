use std::path::PathBuf;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Number of fractional digits the exchange expects on quantity and price.
const DECIMAL_PLACES: usize = 8;

// Enum discriminants below are the codes used in signed order payloads.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy = 0,
    Sell = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Limit = 1,
}

/// Order lifetime qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    /// Good till cancelled
    Gtc = 0,
    /// Good till crossing (post-only)
    Gtx = 1,
    /// Immediate or cancel
    Ioc = 2,
    /// Fill or kill
    Fok = 3,
}

/// Self-matching behaviour passed through to the matching engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelfTradePrevention {
    /// Decrement and cancel
    Dc = 0,
    /// Cancel oldest
    Co = 1,
    /// Cancel newest
    Cn = 2,
    /// Cancel both
    Cb = 3,
}

/// Fixed shape of the limit order submitted on every probe.
///
/// Everything except the wallet and the nonce, which are filled in per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderTemplate {
    pub market: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub price: Decimal,
    pub time_in_force: TimeInForce,
    pub self_trade_prevention: SelfTradePrevention,
}

impl Default for OrderTemplate {
    fn default() -> Self {
        Self {
            market: "ETH-USD".to_string(),
            side: OrderSide::Buy,
            quantity: dec!(0.05),
            price: dec!(2200),
            time_in_force: TimeInForce::Fok,
            self_trade_prevention: SelfTradePrevention::Cn,
        }
    }
}

impl OrderTemplate {
    /// Build the wire parameters for one submission.
    pub fn order_params(&self, wallet: &str, nonce: String) -> OrderParams {
        OrderParams {
            nonce,
            wallet: wallet.to_string(),
            market: self.market.clone(),
            order_type: OrderType::Limit,
            side: self.side,
            quantity: format_decimal(self.quantity),
            price: format_decimal(self.price),
            time_in_force: self.time_in_force,
            self_trade_prevention: self.self_trade_prevention,
        }
    }
}

/// Parameters of a single `createOrder` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderParams {
    pub nonce: String,
    pub wallet: String,
    pub market: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub side: OrderSide,
    pub quantity: String,
    pub price: String,
    pub time_in_force: TimeInForce,
    pub self_trade_prevention: SelfTradePrevention,
}

/// Parameters of the one-time `associateWallet` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociateWalletParams {
    pub nonce: String,
    pub wallet: String,
}

/// Subset of the exchange's order response the harness cares about.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAck {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// One successful order-creation round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatencyRecord {
    pub timestamp: DateTime<Utc>,
    pub latency_ms: u64,
}

impl LatencyRecord {
    /// Stamp a measurement with the current wall-clock time.
    pub fn now(latency_ms: u64) -> Self {
        Self {
            timestamp: Utc::now(),
            latency_ms,
        }
    }

    /// Render as a newline-terminated `<timestamp>,<n>ms` log line.
    pub fn to_line(&self) -> String {
        format!(
            "{},{}ms\n",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.latency_ms
        )
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub log_path: PathBuf,
}

impl RunSummary {
    pub fn new(log_path: PathBuf) -> Self {
        Self {
            attempts: 0,
            successes: 0,
            failures: 0,
            log_path,
        }
    }
}

fn format_decimal(value: Decimal) -> String {
    format!("{value:.prec$}", prec = DECIMAL_PLACES)
}
