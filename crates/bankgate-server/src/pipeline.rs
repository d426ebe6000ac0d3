//! The send-coins request pipeline
//!
//! Decodes a transfer request, builds the bank message and then either
//! returns it unsigned or signs it and hands it to the node. Transport
//! agnostic: the HTTP layer adapts itself through [`SendRequestSource`]
//! and writes back a [`PipelineResponse`].

use std::sync::Arc;

use bankgate_client::{Broadcaster, ClientError, SignError, TxContext};
use bankgate_keyring::{Keyring, KeyringError};
use bankgate_math::parse_coins;
use bankgate_types::msgs::bank::build_msg;
use bankgate_types::msgs::SdkMsg;
use bankgate_types::{AccAddress, Codec, CodecError, Msg, SendRequest, DEFAULT_BECH32_PREFIX};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub const FLAG_GENERATE_ONLY: &str = "generate_only";
pub const FLAG_ASYNC: &str = "async";

/// What to do with the transaction once it is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Return the unsigned transaction; nothing is signed or sent
    GenerateOnly,
    /// Sign, broadcast and wait for the node's verdict
    SyncBroadcast,
    /// Sign, broadcast and return once the node has the bytes
    AsyncBroadcast,
}

impl Mode {
    /// `generate_only` takes precedence over `async`
    pub fn from_flags(generate_only: bool, async_broadcast: bool) -> Self {
        match (generate_only, async_broadcast) {
            (true, _) => Mode::GenerateOnly,
            (false, true) => Mode::AsyncBroadcast,
            (false, false) => Mode::SyncBroadcast,
        }
    }
}

/// Boolean flag syntax: `1 t T TRUE true True` and `0 f F FALSE false False`
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// A pipeline failure and how the caller should see it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Internal(String),
}

impl PipelineError {
    /// HTTP status for this classification
    pub fn status(&self) -> u16 {
        match self {
            PipelineError::BadRequest(_) => 400,
            PipelineError::Unauthorized(_) => 401,
            PipelineError::Internal(_) => 500,
        }
    }
}

impl From<SignError> for PipelineError {
    fn from(err: SignError) -> Self {
        match err {
            SignError::Context(e) => PipelineError::BadRequest(e.to_string()),
            SignError::Auth(e) => e.into(),
            SignError::Verification(e) => PipelineError::Unauthorized(e.to_string()),
            SignError::Codec(e) => PipelineError::Internal(e.to_string()),
        }
    }
}

impl From<KeyringError> for PipelineError {
    fn from(err: KeyringError) -> Self {
        if err.is_auth() {
            PipelineError::Unauthorized(err.to_string())
        } else {
            PipelineError::Internal(err.to_string())
        }
    }
}

impl From<ClientError> for PipelineError {
    fn from(err: ClientError) -> Self {
        PipelineError::Internal(err.to_string())
    }
}

impl From<CodecError> for PipelineError {
    fn from(err: CodecError) -> Self {
        PipelineError::Internal(err.to_string())
    }
}

/// Where the pipeline reads its inputs from
pub trait SendRequestSource: Send + Sync {
    /// Raw recipient address from the request path
    fn address_param(&self) -> &str;

    /// Raw value of a request flag; `None` when absent
    fn flag(&self, name: &str) -> Option<&str>;

    /// Undecoded request body
    fn body(&self) -> &[u8];
}

/// Status plus serialized body, written back by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    code: u16,
}

impl PipelineResponse {
    pub fn ok(body: Vec<u8>) -> Self {
        Self { status: 200, body }
    }

    pub fn from_error(err: &PipelineError) -> Self {
        let status = err.status();
        let message = err.to_string();
        let body = serde_json::to_vec(&ErrorBody {
            error: &message,
            code: status,
        })
        .unwrap_or_else(|_| message.clone().into_bytes());
        Self { status, body }
    }
}

/// Orchestrates one send request at a time; shareable across requests
pub struct SendPipeline {
    keyring: Arc<dyn Keyring>,
    broadcaster: Arc<dyn Broadcaster>,
    codec: Codec,
    bech32_prefix: String,
}

impl SendPipeline {
    pub fn new(keyring: Arc<dyn Keyring>, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self {
            keyring,
            broadcaster,
            codec: Codec::new(),
            bech32_prefix: DEFAULT_BECH32_PREFIX.to_string(),
        }
    }

    /// Recipients must carry this human readable part
    pub fn with_bech32_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.bech32_prefix = prefix.into();
        self
    }

    pub fn keyring(&self) -> &Arc<dyn Keyring> {
        &self.keyring
    }

    pub fn bech32_prefix(&self) -> &str {
        &self.bech32_prefix
    }

    /// Run the pipeline and turn the outcome into a response
    pub async fn handle(&self, source: &dyn SendRequestSource) -> PipelineResponse {
        match self.execute(source).await {
            Ok(body) => PipelineResponse::ok(body),
            Err(err) => {
                match &err {
                    PipelineError::Internal(message) => {
                        error!(error = %message, "send request failed")
                    }
                    other => warn!(
                        status = other.status(),
                        error = %other,
                        "send request rejected"
                    ),
                }
                PipelineResponse::from_error(&err)
            }
        }
    }

    /// Run the pipeline, returning the serialized success body
    pub async fn execute(&self, source: &dyn SendRequestSource) -> Result<Vec<u8>, PipelineError> {
        let to = AccAddress::from_bech32_with_prefix(source.address_param(), &self.bech32_prefix)
            .map_err(|e| PipelineError::BadRequest(e.to_string()))?;

        let generate_only = read_flag(source, FLAG_GENERATE_ONLY)?;
        let async_broadcast = read_flag(source, FLAG_ASYNC)?;
        let mode = Mode::from_flags(generate_only, async_broadcast);

        let req: SendRequest = self
            .codec
            .unmarshal_json(source.body())
            .map_err(|e| PipelineError::BadRequest(e.to_string()))?;
        let base_tx = &req.base_tx;
        debug!(
            recipient = %source.address_param(),
            mode = ?mode,
            key = %base_tx.local_account_name,
            "decoded send request"
        );

        let from = self
            .keyring
            .get_key(&base_tx.local_account_name)
            .await
            .map_err(PipelineError::from)?
            .address
            .with_prefix(&self.bech32_prefix)
            .map_err(|e| PipelineError::Internal(e.to_string()))?;

        // Re-validate the amount through its canonical text form
        let amount = parse_coins(&req.amount.to_string())
            .map_err(|e| PipelineError::Internal(e.to_string()))?;

        let msg: Msg = build_msg(from, to, amount).into();
        msg.validate_basic()
            .map_err(|e| PipelineError::BadRequest(e.to_string()))?;

        let ctx = TxContext::from_base_tx(base_tx);
        let msgs = vec![msg];

        if mode == Mode::GenerateOnly {
            let sign_msg = ctx
                .build_sign_msg(msgs)
                .map_err(|e| PipelineError::BadRequest(e.to_string()))?;
            debug!("returning unsigned transaction");
            return Ok(self.codec.marshal_json_indent(&sign_msg)?);
        }

        let tx_bytes = ctx
            .build_and_sign(
                self.keyring.as_ref(),
                &base_tx.local_account_name,
                &base_tx.password,
                msgs,
            )
            .await?;

        let result = match mode {
            Mode::AsyncBroadcast => self.broadcaster.broadcast_async(&tx_bytes).await?,
            _ => self.broadcaster.broadcast_sync(&tx_bytes).await?,
        };
        info!(
            mode = ?mode,
            hash = %result.hash,
            code = result.code,
            "broadcast send transaction"
        );

        Ok(self.codec.marshal_json_indent(&result)?)
    }
}

fn read_flag(source: &dyn SendRequestSource, name: &str) -> Result<bool, PipelineError> {
    match source.flag(name) {
        None | Some("") => Ok(false),
        Some(raw) => parse_bool(raw).ok_or_else(|| {
            PipelineError::BadRequest(format!("invalid value for {name}: {raw:?}"))
        }),
    }
}
