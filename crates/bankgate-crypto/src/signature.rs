//! Signature operations

use crate::keys::{PrivateKey, PublicKey};
use signature::{Signer, Verifier};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignatureError {
    #[error("signing failed: {0}")]
    SigningFailed(String),

    #[error("verification failed")]
    VerificationFailed,
}

/// Sign a message with a private key.
///
/// secp256k1 signatures are the 64-byte `r || s` form with low-S.
pub fn sign_message(key: &PrivateKey, message: &[u8]) -> Result<Vec<u8>, SignatureError> {
    match key {
        PrivateKey::Secp256k1(k) => {
            use k256::ecdsa::Signature;
            let sig: Signature = k
                .try_sign(message)
                .map_err(|e| SignatureError::SigningFailed(e.to_string()))?;
            let sig = sig.normalize_s().unwrap_or(sig);
            Ok(sig.to_bytes().to_vec())
        }
        PrivateKey::Ed25519(k) => {
            use ed25519_dalek::Signature;
            let sig: Signature = k
                .try_sign(message)
                .map_err(|e| SignatureError::SigningFailed(e.to_string()))?;
            Ok(sig.to_bytes().to_vec())
        }
    }
}

/// Verify a signature with a public key
pub fn verify_signature(
    key: &PublicKey,
    message: &[u8],
    signature: &[u8],
) -> Result<(), SignatureError> {
    match key {
        PublicKey::Secp256k1(k) => {
            use k256::ecdsa::Signature;
            let sig =
                Signature::from_slice(signature).map_err(|_| SignatureError::VerificationFailed)?;
            k.verify(message, &sig)
                .map_err(|_| SignatureError::VerificationFailed)
        }
        PublicKey::Ed25519(k) => {
            use ed25519_dalek::Signature;
            let sig = Signature::from_slice(signature)
                .map_err(|_| SignatureError::VerificationFailed)?;
            k.verify(message, &sig)
                .map_err(|_| SignatureError::VerificationFailed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyType;

    #[test]
    fn test_sign_and_verify() {
        for key_type in [KeyType::Secp256k1, KeyType::Ed25519] {
            let key = PrivateKey::generate(key_type);
            let sig = sign_message(&key, b"transfer").unwrap();
            assert_eq!(sig.len(), 64);
            assert!(verify_signature(&key.public_key(), b"transfer", &sig).is_ok());
        }
    }

    #[test]
    fn test_tampered_message_fails() {
        let key = PrivateKey::generate(KeyType::Secp256k1);
        let sig = sign_message(&key, b"transfer 10").unwrap();
        assert!(matches!(
            verify_signature(&key.public_key(), b"transfer 99", &sig),
            Err(SignatureError::VerificationFailed)
        ));
    }

    #[test]
    fn test_wrong_key_fails() {
        let key = PrivateKey::generate(KeyType::Ed25519);
        let other = PrivateKey::generate(KeyType::Ed25519);
        let sig = sign_message(&key, b"msg").unwrap();
        assert!(verify_signature(&other.public_key(), b"msg", &sig).is_err());
    }
}
