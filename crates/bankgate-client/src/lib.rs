//! Transaction signing and broadcast for bankgate
//!
//! Turns messages plus a signing context into signed transaction bytes, and
//! hands those bytes to a Tendermint node over JSON-RPC.

pub mod broadcast;
pub mod context;
pub mod tx;

pub use broadcast::{BroadcastResult, Broadcaster, RpcBroadcaster, RpcConfig};
pub use context::{ContextError, SignError, TxContext};
pub use tx::{StdSignature, StdTx};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
