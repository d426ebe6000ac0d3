//! Core types for bankgate
//!
//! Addresses, transfer messages, fee and sign documents, the inbound send
//! request, and the JSON codec used for both payloads and transaction bytes.

pub mod address;
pub mod codec;
pub mod msgs;
pub mod request;
pub mod tx;

pub use address::{AccAddress, AddressError, DEFAULT_BECH32_PREFIX};
pub use codec::{Codec, CodecError};
pub use msgs::{Msg, MsgSend, SdkMsg};
pub use request::{BaseTx, SendRequest};
pub use tx::{StdFee, StdSignMsg};
