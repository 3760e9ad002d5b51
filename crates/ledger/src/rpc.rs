use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use shared::domain::Address;
use tracing::debug;

use crate::{LedgerError, LedgerResult, TxHash, USER_REJECTED_CODE};

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: String,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl TransactionReceipt {
    /// Pre-Byzantium receipts carry no status and are treated as successful.
    pub fn succeeded(&self) -> bool {
        match self.status.as_deref() {
            Some(status) => parse_quantity(status).map(|v| v == 1).unwrap_or(false),
            None => true,
        }
    }

    pub fn block_number(&self) -> Option<u64> {
        self.block_number
            .as_deref()
            .and_then(|raw| parse_quantity(raw).ok())
    }
}

pub fn parse_quantity(raw: &str) -> LedgerResult<u64> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| LedgerError::Decode(format!("quantity without 0x prefix: {raw}")))?;
    u64::from_str_radix(digits, 16)
        .map_err(|err| LedgerError::Decode(format!("invalid quantity {raw}: {err}")))
}

pub fn encode_bytes(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn decode_bytes(raw: &str) -> LedgerResult<Vec<u8>> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(digits).map_err(|err| LedgerError::Decode(format!("invalid hex data: {err}")))
}

#[derive(Clone)]
pub struct JsonRpcClient {
    http: Client,
    url: String,
    next_id: Arc<AtomicU64>,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            url: url.into(),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> LedgerResult<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, "rpc request");

        let response: RpcResponse = self
            .http
            .post(&self.url)
            .json(&RpcRequest {
                jsonrpc: "2.0",
                id,
                method,
                params,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            debug!(method, id, code = error.code, "rpc error");
            return Err(if error.code == USER_REJECTED_CODE {
                LedgerError::UserRejected(error.message)
            } else {
                LedgerError::Rpc {
                    code: error.code,
                    message: error.message,
                }
            });
        }

        serde_json::from_value(response.result)
            .map_err(|err| LedgerError::Decode(format!("{method} result: {err}")))
    }

    pub async fn request_accounts(&self) -> LedgerResult<Vec<Address>> {
        let raw: Vec<String> = self.request("eth_requestAccounts", json!([])).await?;
        raw.iter()
            .map(|account| {
                account
                    .parse()
                    .map_err(|err| LedgerError::Decode(format!("account {account}: {err}")))
            })
            .collect()
    }

    pub async fn call(&self, from: Address, to: Address, data: &[u8]) -> LedgerResult<Vec<u8>> {
        let raw: String = self
            .request(
                "eth_call",
                json!([
                    {
                        "from": from.to_string(),
                        "to": to.to_string(),
                        "data": encode_bytes(data),
                    },
                    "latest"
                ]),
            )
            .await?;
        decode_bytes(&raw)
    }

    pub async fn send_transaction(
        &self,
        from: Address,
        to: Address,
        data: &[u8],
    ) -> LedgerResult<TxHash> {
        let hash: String = self
            .request(
                "eth_sendTransaction",
                json!([
                    {
                        "from": from.to_string(),
                        "to": to.to_string(),
                        "data": encode_bytes(data),
                    }
                ]),
            )
            .await?;
        Ok(TxHash(hash))
    }

    pub async fn transaction_receipt(
        &self,
        tx_hash: &TxHash,
    ) -> LedgerResult<Option<TransactionReceipt>> {
        self.request("eth_getTransactionReceipt", json!([tx_hash.0]))
            .await
    }
}

#[cfg(test)]
#[path = "tests/rpc_tests.rs"]
mod tests;
