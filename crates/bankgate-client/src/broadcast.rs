//! Submitting signed transactions to a Tendermint node

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use bankgate_types::request::u64_string;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::{ClientError, Result};

/// Outcome of a broadcast as reported by the node
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResult {
    /// Hex transaction hash
    pub hash: String,
    /// Block height, known only once the transaction is committed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,
    /// Zero when the node accepted the transaction
    pub code: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub codespace: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub log: String,
}

impl BroadcastResult {
    pub fn is_accepted(&self) -> bool {
        self.code == 0
    }
}

/// Hands signed transaction bytes to the network
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Submit and wait for the node's verdict
    async fn broadcast_sync(&self, tx: &[u8]) -> Result<BroadcastResult>;

    /// Submit and return as soon as the node has received the bytes
    async fn broadcast_async(&self, tx: &[u8]) -> Result<BroadcastResult>;
}

/// Connection settings for [`RpcBroadcaster`]
#[derive(Debug, Clone)]
pub struct RpcConfig {
    pub url: Url,
    pub timeout: Duration,
    /// Synchronous broadcasts wait for the block (`broadcast_tx_commit`)
    /// instead of only the mempool check (`broadcast_tx_sync`)
    pub wait_for_commit: bool,
}

impl RpcConfig {
    pub fn new(url: &str) -> Result<Self> {
        Ok(Self {
            url: Url::parse(url)?,
            timeout: Duration::from_secs(30),
            wait_for_commit: true,
        })
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn wait_for_commit(mut self, wait: bool) -> Self {
        self.wait_for_commit = wait;
        self
    }
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// `broadcast_tx_sync` / `broadcast_tx_async` result, also the `check_tx`
/// and `deliver_tx` parts of a commit result
#[derive(Deserialize, Default)]
struct TxOutcome {
    #[serde(default)]
    code: u32,
    #[serde(default)]
    codespace: String,
    #[serde(default)]
    log: String,
    #[serde(default)]
    hash: String,
}

#[derive(Deserialize)]
struct CommitResult {
    check_tx: TxOutcome,
    #[serde(default, alias = "tx_result")]
    deliver_tx: Option<TxOutcome>,
    hash: String,
    #[serde(with = "u64_string")]
    height: u64,
}

impl From<TxOutcome> for BroadcastResult {
    fn from(outcome: TxOutcome) -> Self {
        BroadcastResult {
            hash: outcome.hash,
            height: None,
            code: outcome.code,
            codespace: outcome.codespace,
            log: outcome.log,
        }
    }
}

impl From<CommitResult> for BroadcastResult {
    fn from(result: CommitResult) -> Self {
        // Report whichever phase rejected the transaction
        let deliver = result.deliver_tx.unwrap_or_default();
        let phase = if result.check_tx.code != 0 {
            result.check_tx
        } else {
            deliver
        };
        BroadcastResult {
            hash: result.hash,
            height: (result.height > 0).then_some(result.height),
            code: phase.code,
            codespace: phase.codespace,
            log: phase.log,
        }
    }
}

/// Broadcaster speaking Tendermint JSON-RPC over HTTP
pub struct RpcBroadcaster {
    config: RpcConfig,
    http_client: HttpClient,
}

impl RpcBroadcaster {
    pub fn new(config: RpcConfig) -> Result<Self> {
        let http_client = HttpClient::builder().timeout(config.timeout).build()?;
        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    async fn rpc_request<T>(&self, method: &str, params: serde_json::Value) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };

        debug!(method = %method, url = %self.config.url, "sending rpc request");
        let response = self
            .http_client
            .post(self.config.url.clone())
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let rpc_response: RpcResponse<T> = response.json().await?;
        if let Some(error) = rpc_response.error {
            let message = match error.data {
                Some(serde_json::Value::String(data)) if !data.is_empty() => {
                    format!("{}: {data}", error.message)
                }
                _ => error.message,
            };
            return Err(ClientError::Rpc {
                code: error.code,
                message,
            });
        }

        rpc_response
            .result
            .ok_or_else(|| ClientError::InvalidResponse("missing result field".to_string()))
    }

    fn tx_params(tx: &[u8]) -> serde_json::Value {
        serde_json::json!({ "tx": general_purpose::STANDARD.encode(tx) })
    }
}

#[async_trait]
impl Broadcaster for RpcBroadcaster {
    async fn broadcast_sync(&self, tx: &[u8]) -> Result<BroadcastResult> {
        let result: BroadcastResult = if self.config.wait_for_commit {
            self.rpc_request::<CommitResult>("broadcast_tx_commit", Self::tx_params(tx))
                .await?
                .into()
        } else {
            self.rpc_request::<TxOutcome>("broadcast_tx_sync", Self::tx_params(tx))
                .await?
                .into()
        };
        info!(
            hash = %result.hash,
            code = result.code,
            height = ?result.height,
            "broadcast transaction"
        );
        Ok(result)
    }

    async fn broadcast_async(&self, tx: &[u8]) -> Result<BroadcastResult> {
        let result: BroadcastResult = self
            .rpc_request::<TxOutcome>("broadcast_tx_async", Self::tx_params(tx))
            .await?
            .into();
        info!(hash = %result.hash, "submitted transaction asynchronously");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    /// Stand-in Tendermint node that records every request it receives
    async fn fake_node(reply: fn(&str) -> Value) -> (String, Arc<Mutex<Vec<Value>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorded = seen.clone();
        let app = Router::new().route(
            "/",
            post(move |Json(request): Json<Value>| {
                let recorded = recorded.clone();
                async move {
                    let method = request["method"].as_str().unwrap_or_default().to_string();
                    recorded.lock().unwrap().push(request);
                    Json(reply(&method))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/"), seen)
    }

    fn tendermint_reply(method: &str) -> Value {
        match method {
            "broadcast_tx_commit" => json!({
                "jsonrpc": "2.0", "id": 1,
                "result": {
                    "check_tx": {"code": 0, "log": "[]"},
                    "deliver_tx": {"code": 5, "codespace": "sdk", "log": "insufficient funds"},
                    "hash": "C0FFEE",
                    "height": "42"
                }
            }),
            _ => json!({
                "jsonrpc": "2.0", "id": 1,
                "result": {"code": 0, "data": "", "log": "", "hash": "BEEF"}
            }),
        }
    }

    #[tokio::test]
    async fn test_async_broadcast_sends_base64_tx() {
        let (url, seen) = fake_node(tendermint_reply).await;
        let broadcaster = RpcBroadcaster::new(RpcConfig::new(&url).unwrap()).unwrap();

        let result = broadcaster.broadcast_async(b"{\"tx\":1}").await.unwrap();
        assert_eq!(result.hash, "BEEF");
        assert!(result.is_accepted());
        assert_eq!(result.height, None);

        let requests = seen.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["method"], "broadcast_tx_async");
        assert_eq!(requests[0]["params"]["tx"], "eyJ0eCI6MX0=");
    }

    #[tokio::test]
    async fn test_sync_broadcast_waits_for_commit() {
        let (url, seen) = fake_node(tendermint_reply).await;
        let broadcaster = RpcBroadcaster::new(RpcConfig::new(&url).unwrap()).unwrap();

        let result = broadcaster.broadcast_sync(b"tx").await.unwrap();
        assert_eq!(seen.lock().unwrap()[0]["method"], "broadcast_tx_commit");
        assert_eq!(result.height, Some(42));
        assert_eq!(result.code, 5);
        assert_eq!(result.codespace, "sdk");
        assert!(!result.is_accepted());
    }

    #[tokio::test]
    async fn test_sync_broadcast_without_commit() {
        let (url, seen) = fake_node(tendermint_reply).await;
        let config = RpcConfig::new(&url).unwrap().wait_for_commit(false);
        let broadcaster = RpcBroadcaster::new(config).unwrap();

        let result = broadcaster.broadcast_sync(b"tx").await.unwrap();
        assert_eq!(seen.lock().unwrap()[0]["method"], "broadcast_tx_sync");
        assert_eq!(result.hash, "BEEF");
    }

    #[tokio::test]
    async fn test_rpc_error_object() {
        let (url, _) = fake_node(|_| {
            json!({
                "jsonrpc": "2.0", "id": 1,
                "error": {
                    "code": -32603,
                    "message": "Internal error",
                    "data": "tx already exists in cache"
                }
            })
        })
        .await;
        let broadcaster = RpcBroadcaster::new(RpcConfig::new(&url).unwrap()).unwrap();

        let err = broadcaster.broadcast_async(b"tx").await.unwrap_err();
        match err {
            ClientError::Rpc { code, message } => {
                assert_eq!(code, -32603);
                assert_eq!(message, "Internal error: tx already exists in cache");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_node() {
        // Bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let broadcaster = RpcBroadcaster::new(RpcConfig::new(&url).unwrap()).unwrap();
        assert!(matches!(
            broadcaster.broadcast_sync(b"tx").await,
            Err(ClientError::Http(_))
        ));
    }

    #[test]
    fn test_commit_result_check_failure_wins() {
        let result: CommitResult = serde_json::from_value(json!({
            "check_tx": {"code": 4, "log": "unauthorized"},
            "deliver_tx": {},
            "hash": "AA",
            "height": "0"
        }))
        .unwrap();
        let result = BroadcastResult::from(result);
        assert_eq!(result.code, 4);
        assert_eq!(result.log, "unauthorized");
        assert_eq!(result.height, None);
    }
}
