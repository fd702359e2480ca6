use std::str::FromStr;

use ethers::signers::{Signer, Wallet};
use ethers::types::transaction::eip712::{Eip712, TypedData};
use ethers::types::{Address, H256, U256};
use ethers::utils::to_checksum;
use hmac::{Hmac, Mac};
use serde_json::{Value, json};
use sha2::Sha256;
use uuid::Uuid;

use crate::config::{ClientConfig, ConfigError};
use crate::error::ExchangeError;
use crate::types::{AssociateWalletParams, OrderParams};

type HmacSha256 = Hmac<Sha256>;

/// Concrete signer type built from a raw secp256k1 key.
pub type PrivateKeySigner = Wallet<k256::ecdsa::SigningKey>;

/// Parse a hex-encoded private key (with or without `0x` prefix).
pub fn signer_from_private_key(private_key: &str) -> Result<PrivateKeySigner, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        var: "WALLET_PRIVATE_KEY",
        reason,
    };

    let trimmed = private_key.trim();
    let hex_key = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let bytes = hex::decode(hex_key).map_err(|e| invalid(e.to_string()))?;
    let key = k256::ecdsa::SigningKey::from_slice(&bytes)
        .map_err(|_| invalid("not a valid secp256k1 private key".to_string()))?;

    Ok(PrivateKeySigner::from(key))
}

/// EIP-55 checksummed address of the signer.
pub fn checksum_address(signer: &PrivateKeySigner) -> String {
    to_checksum(&signer.address(), None)
}

/// Hex-encoded HMAC-SHA256 of a request body, keyed by the API secret.
pub fn hmac_signature(secret: &str, body: &str) -> Result<String, ExchangeError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ExchangeError::Signing(e.to_string()))?;
    mac.update(body.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// EIP-712 domain name the exchange contract verifies signatures against.
pub const SIGNATURE_DOMAIN_NAME: &str = "IDEX";
/// EIP-712 domain version the exchange contract verifies signatures against.
pub const SIGNATURE_DOMAIN_VERSION: &str = "4.0.0";

/// Chain and exchange contract that wallet signatures are bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigningDomain {
    pub chain_id: u64,
    pub contract: Address,
}

impl SigningDomain {
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        let chain_id = config.chain_id.ok_or(ConfigError::Missing("CHAIN_ID"))?;
        let raw = config
            .exchange_contract_address
            .as_deref()
            .ok_or(ConfigError::Missing("EXCHANGE_CONTRACT_ADDRESS"))?;
        let contract = Address::from_str(raw).map_err(|e| ConfigError::Invalid {
            var: "EXCHANGE_CONTRACT_ADDRESS",
            reason: e.to_string(),
        })?;
        Ok(Self { chain_id, contract })
    }

    fn to_json(self) -> Value {
        json!({
            "name": SIGNATURE_DOMAIN_NAME,
            "version": SIGNATURE_DOMAIN_VERSION,
            "chainId": self.chain_id,
            "verifyingContract": self.contract,
        })
    }
}

fn domain_type() -> Value {
    json!([
        {"name": "name", "type": "string"},
        {"name": "version", "type": "string"},
        {"name": "chainId", "type": "uint256"},
        {"name": "verifyingContract", "type": "address"}
    ])
}

/// Request parameters that carry a wallet signature.
pub trait SignedParameters {
    /// Typed data whose EIP-712 digest the wallet signs.
    fn typed_data(&self, domain: SigningDomain) -> Result<TypedData, ExchangeError>;
}

/// UUID nonces are signed as the `uint128` of their 16 bytes.
fn nonce_to_uint(nonce: &str) -> Result<U256, ExchangeError> {
    let uuid = Uuid::parse_str(nonce)
        .map_err(|e| ExchangeError::Signing(format!("invalid nonce {nonce}: {e}")))?;
    Ok(U256::from_big_endian(uuid.as_bytes()))
}

impl SignedParameters for AssociateWalletParams {
    fn typed_data(&self, domain: SigningDomain) -> Result<TypedData, ExchangeError> {
        let nonce = nonce_to_uint(&self.nonce)?;
        let typed_json = json!({
            "types": {
                "EIP712Domain": domain_type(),
                "AssociateWallet": [
                    {"name": "nonce", "type": "uint128"},
                    {"name": "wallet", "type": "address"}
                ]
            },
            "primaryType": "AssociateWallet",
            "domain": domain.to_json(),
            "message": { "nonce": nonce, "wallet": self.wallet }
        });
        Ok(serde_json::from_value(typed_json)?)
    }
}

impl SignedParameters for OrderParams {
    fn typed_data(&self, domain: SigningDomain) -> Result<TypedData, ExchangeError> {
        let nonce = nonce_to_uint(&self.nonce)?;
        let typed_json = json!({
            "types": {
                "EIP712Domain": domain_type(),
                "Order": [
                    {"name": "nonce", "type": "uint128"},
                    {"name": "wallet", "type": "address"},
                    {"name": "marketSymbol", "type": "string"},
                    {"name": "orderType", "type": "uint8"},
                    {"name": "orderSide", "type": "uint8"},
                    {"name": "quantity", "type": "string"},
                    {"name": "limitPrice", "type": "string"},
                    {"name": "triggerPrice", "type": "string"},
                    {"name": "triggerType", "type": "uint8"},
                    {"name": "callbackRate", "type": "string"},
                    {"name": "conditionalOrderId", "type": "uint128"},
                    {"name": "isReduceOnly", "type": "bool"},
                    {"name": "timeInForce", "type": "uint8"},
                    {"name": "selfTradePrevention", "type": "uint8"},
                    {"name": "isLiquidationAcquisitionOnly", "type": "bool"},
                    {"name": "delegatedPublicKey", "type": "address"},
                    {"name": "clientOrderId", "type": "string"}
                ]
            },
            "primaryType": "Order",
            "domain": domain.to_json(),
            "message": {
                "nonce": nonce,
                "wallet": self.wallet,
                "marketSymbol": self.market,
                "orderType": self.order_type as u8,
                "orderSide": self.side as u8,
                "quantity": self.quantity,
                "limitPrice": self.price,
                "triggerPrice": "",
                "triggerType": 0,
                "callbackRate": "",
                "conditionalOrderId": 0,
                "isReduceOnly": false,
                "timeInForce": self.time_in_force as u8,
                "selfTradePrevention": self.self_trade_prevention as u8,
                "isLiquidationAcquisitionOnly": false,
                "delegatedPublicKey": Address::zero(),
                "clientOrderId": ""
            }
        });
        Ok(serde_json::from_value(typed_json)?)
    }
}

/// Sign the EIP-712 digest of `typed`, returning `0x`-prefixed `r ‖ s ‖ v` hex.
pub fn sign_typed_data(
    wallet: &PrivateKeySigner,
    typed: &TypedData,
) -> Result<String, ExchangeError> {
    let digest = typed
        .encode_eip712()
        .map_err(|e| ExchangeError::Signing(e.to_string()))?;
    let signature = wallet
        .sign_hash(H256::from(digest))
        .map_err(|e| ExchangeError::Signing(e.to_string()))?;
    Ok(format!("0x{}", hex::encode(signature.to_vec())))
}

/// Credentials needed to authenticate every REST request.
pub struct RequestSigner {
    wallet: PrivateKeySigner,
    api_key: String,
    api_secret: String,
    domain: SigningDomain,
}

impl RequestSigner {
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            wallet: config.signer()?,
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            domain: SigningDomain::from_config(config)?,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn wallet_address(&self) -> String {
        checksum_address(&self.wallet)
    }

    pub fn domain(&self) -> SigningDomain {
        self.domain
    }

    pub fn hmac_signature(&self, body: &str) -> Result<String, ExchangeError> {
        hmac_signature(&self.api_secret, body)
    }

    pub fn wallet_signature<P: SignedParameters>(&self, params: &P) -> Result<String, ExchangeError> {
        sign_typed_data(&self.wallet, &params.typed_data(self.domain)?)
    }
}
