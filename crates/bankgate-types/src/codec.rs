//! JSON codec for request payloads, responses and transaction bytes

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("json decode error: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("json encode error: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Encodes and decodes the gateway's JSON payloads.
///
/// Transaction bytes handed to the node are the compact JSON encoding of the
/// signed transaction; sign bytes are the same with object keys sorted.
#[derive(Debug, Clone, Copy, Default)]
pub struct Codec;

impl Codec {
    pub fn new() -> Self {
        Self
    }

    pub fn unmarshal_json<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(CodecError::Decode)
    }

    pub fn marshal_json<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(CodecError::Encode)
    }

    /// Two-space indented JSON, used for every response body
    pub fn marshal_json_indent<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec_pretty(value).map_err(CodecError::Encode)
    }

    /// Deterministic bytes to sign: compact JSON with object keys sorted
    pub fn sign_bytes<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        // serde_json's default map is ordered by key
        let canonical = serde_json::to_value(value).map_err(CodecError::Encode)?;
        serde_json::to_vec(&canonical).map_err(CodecError::Encode)
    }

    pub fn encode_tx<T: Serialize>(&self, tx: &T) -> Result<Vec<u8>, CodecError> {
        self.marshal_json(tx)
    }

    pub fn decode_tx<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        self.unmarshal_json(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Sample {
        zeta: u32,
        alpha: String,
    }

    #[test]
    fn test_sign_bytes_sorted_and_compact() {
        let sample = Sample {
            zeta: 1,
            alpha: "a".to_string(),
        };
        let bytes = Codec::new().sign_bytes(&sample).unwrap();
        assert_eq!(bytes, br#"{"alpha":"a","zeta":1}"#);
    }

    #[test]
    fn test_indent_uses_two_spaces() {
        let sample = Sample {
            zeta: 1,
            alpha: "a".to_string(),
        };
        let bytes = Codec::new().marshal_json_indent(&sample).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\n  \"zeta\": 1"));
    }

    #[test]
    fn test_decode_error() {
        let err = Codec::new().unmarshal_json::<Sample>(b"{").unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }

    #[test]
    fn test_tx_round_trip() {
        let codec = Codec::new();
        let sample = Sample {
            zeta: 9,
            alpha: "tx".to_string(),
        };
        let bytes = codec.encode_tx(&sample).unwrap();
        assert_eq!(codec.decode_tx::<Sample>(&bytes).unwrap(), sample);
    }
}
