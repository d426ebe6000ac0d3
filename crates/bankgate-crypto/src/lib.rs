//! Signing keys and signatures for bankgate
//!
//! Thin wrappers over the RustCrypto secp256k1 and ed25519 implementations
//! with the address derivation and JSON shapes the gateway uses.

pub mod keys;
pub mod signature;

pub use keys::{KeyType, PrivateKey, PublicKey};
pub use signature::{sign_message, verify_signature, SignatureError};
