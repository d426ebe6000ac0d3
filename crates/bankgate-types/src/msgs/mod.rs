//! Message types and the trait every message implements

pub mod bank;

pub use bank::MsgSend;

use crate::address::AccAddress;
use bankgate_errors::ClassifiedError;
use serde::{Deserialize, Serialize};

/// Contract for messages carried inside a transaction
pub trait SdkMsg: Send + Sync {
    /// Module the message is routed to
    fn route(&self) -> &'static str;

    /// Message type inside the route
    fn msg_type(&self) -> &'static str;

    /// Stateless validation
    fn validate_basic(&self) -> Result<(), ClassifiedError>;

    /// Addresses that must sign the transaction
    fn get_signers(&self) -> Vec<AccAddress>;
}

/// Any message the gateway can put in a transaction, tagged with its
/// registered name in JSON: `{"type": "cosmos-sdk/Send", "value": {...}}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Msg {
    #[serde(rename = "cosmos-sdk/Send")]
    Send(MsgSend),
}

impl Msg {
    fn inner(&self) -> &dyn SdkMsg {
        match self {
            Msg::Send(msg) => msg,
        }
    }
}

impl From<MsgSend> for Msg {
    fn from(msg: MsgSend) -> Self {
        Msg::Send(msg)
    }
}

impl SdkMsg for Msg {
    fn route(&self) -> &'static str {
        self.inner().route()
    }

    fn msg_type(&self) -> &'static str {
        self.inner().msg_type()
    }

    fn validate_basic(&self) -> Result<(), ClassifiedError> {
        self.inner().validate_basic()
    }

    fn get_signers(&self) -> Vec<AccAddress> {
        self.inner().get_signers()
    }
}
