//! Signing context and transaction signing

use bankgate_crypto::{verify_signature, SignatureError};
use bankgate_keyring::{Keyring, KeyringError};
use bankgate_math::Coins;
use bankgate_types::{BaseTx, Codec, CodecError, Msg, StdFee, StdSignMsg};
use thiserror::Error;
use tracing::debug;

use crate::tx::{StdSignature, StdTx};

/// Structural problems with the signing parameters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("chain id required but not specified")]
    MissingChainId,

    #[error("gas limit must be greater than zero")]
    ZeroGas,

    #[error("no messages to sign")]
    NoMessages,
}

#[derive(Error, Debug)]
pub enum SignError {
    #[error(transparent)]
    Context(#[from] ContextError),

    /// Wrong password, unknown key or unusable key material
    #[error(transparent)]
    Auth(#[from] KeyringError),

    #[error("produced signature does not verify:: {0}")]
    Verification(#[from] SignatureError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Chain id, account number, sequence, gas and fees a transaction is signed under
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxContext {
    pub chain_id: String,
    pub account_number: u64,
    pub sequence: u64,
    pub gas: u64,
    pub fees: Coins,
    pub memo: String,
}

impl TxContext {
    pub fn new(chain_id: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
            account_number: 0,
            sequence: 0,
            gas: 0,
            fees: Coins::empty(),
            memo: String::new(),
        }
    }

    /// Pure field mapping; call [`TxContext::validate`] before signing
    pub fn from_base_tx(base_tx: &BaseTx) -> Self {
        Self::new(base_tx.chain_id.clone())
            .account_number(base_tx.account_number)
            .sequence(base_tx.sequence)
            .gas(base_tx.gas)
            .fees(base_tx.fees.clone())
            .memo(base_tx.memo.clone())
    }

    pub fn account_number(mut self, account_number: u64) -> Self {
        self.account_number = account_number;
        self
    }

    pub fn sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn gas(mut self, gas: u64) -> Self {
        self.gas = gas;
        self
    }

    pub fn fees(mut self, fees: Coins) -> Self {
        self.fees = fees;
        self
    }

    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }

    pub fn validate(&self) -> Result<(), ContextError> {
        if self.chain_id.trim().is_empty() {
            return Err(ContextError::MissingChainId);
        }
        if self.gas == 0 {
            return Err(ContextError::ZeroGas);
        }
        Ok(())
    }

    pub fn fee(&self) -> StdFee {
        StdFee::new(self.fees.clone(), self.gas)
    }

    /// The document signers commit to
    pub fn build_sign_msg(&self, msgs: Vec<Msg>) -> Result<StdSignMsg, ContextError> {
        self.validate()?;
        if msgs.is_empty() {
            return Err(ContextError::NoMessages);
        }
        Ok(StdSignMsg {
            chain_id: self.chain_id.clone(),
            account_number: self.account_number,
            sequence: self.sequence,
            fee: self.fee(),
            msgs,
            memo: self.memo.clone(),
        })
    }

    /// Sign `msgs` with the named key. The keyring is called exactly once.
    pub async fn sign(
        &self,
        keyring: &dyn Keyring,
        name: &str,
        password: &str,
        msgs: Vec<Msg>,
    ) -> Result<StdTx, SignError> {
        let sign_msg = self.build_sign_msg(msgs)?;
        let sign_bytes = Codec::new().sign_bytes(&sign_msg)?;

        let (signature, pub_key) = keyring.sign(name, password, &sign_bytes).await?;
        verify_signature(&pub_key, &sign_bytes, &signature)?;
        debug!(
            key = %name,
            chain_id = %sign_msg.chain_id,
            sequence = sign_msg.sequence,
            "signed transaction"
        );

        Ok(StdTx {
            msg: sign_msg.msgs,
            fee: sign_msg.fee,
            signatures: vec![StdSignature {
                pub_key,
                signature,
                account_number: sign_msg.account_number,
                sequence: sign_msg.sequence,
            }],
            memo: sign_msg.memo,
        })
    }

    /// Sign and encode to the bytes a node accepts
    pub async fn build_and_sign(
        &self,
        keyring: &dyn Keyring,
        name: &str,
        password: &str,
        msgs: Vec<Msg>,
    ) -> Result<Vec<u8>, SignError> {
        let tx = self.sign(keyring, name, password, msgs).await?;
        Ok(Codec::new().encode_tx(&tx)?)
    }
}
