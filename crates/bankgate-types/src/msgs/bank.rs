//! Bank module message types

use crate::{address::AccAddress, msgs::SdkMsg};
use bankgate_errors::{root, ClassifiedError, Code, Codespace, ErrorRegistry};
use bankgate_math::Coins;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const DEFAULT_CODESPACE: Codespace = 2;

pub const CODE_INVALID_INPUT: Code = 101;
pub const CODE_INVALID_OUTPUT: Code = 102;

/// Registry holding the bank module's defaults
pub fn registry() -> &'static ErrorRegistry {
    static REGISTRY: OnceLock<ErrorRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut registry = ErrorRegistry::new();
        let _ = registry.register(DEFAULT_CODESPACE, CODE_INVALID_INPUT, "invalid input coins");
        let _ = registry.register(DEFAULT_CODESPACE, CODE_INVALID_OUTPUT, "invalid output coins");
        registry
    })
}

/// Build a bank module error; an empty `msg` picks the registered default
pub fn new_error(code: Code, msg: &str) -> ClassifiedError {
    registry().build(DEFAULT_CODESPACE, code, msg)
}

/// Build a transfer message. Pure; validation happens in `validate_basic`.
pub fn build_msg(from: AccAddress, to: AccAddress, amount: Coins) -> MsgSend {
    MsgSend::new(from, to, amount)
}

/// MsgSend moves coins from one account to another
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSend {
    /// The sender's address
    pub from_address: AccAddress,
    /// The recipient's address
    pub to_address: AccAddress,
    /// The amount to send
    pub amount: Coins,
}

impl MsgSend {
    /// Create a new MsgSend
    pub fn new(from_address: AccAddress, to_address: AccAddress, amount: Coins) -> Self {
        Self {
            from_address,
            to_address,
            amount,
        }
    }
}

impl SdkMsg for MsgSend {
    fn route(&self) -> &'static str {
        "bank"
    }

    fn msg_type(&self) -> &'static str {
        "send"
    }

    fn validate_basic(&self) -> Result<(), ClassifiedError> {
        if self.from_address.same_account(&self.to_address) {
            return Err(new_error(
                CODE_INVALID_OUTPUT,
                "cannot send coins to the same address",
            ));
        }

        if self.amount.is_empty() {
            return Err(new_error(root::INVALID_COINS, ""));
        }

        if !self.amount.is_all_positive() {
            return Err(new_error(
                CODE_INVALID_INPUT,
                &format!("amount must be positive: {}", self.amount),
            ));
        }

        Ok(())
    }

    fn get_signers(&self) -> Vec<AccAddress> {
        vec![self.from_address]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msgs::Msg;
    use bankgate_math::parse_coins;

    fn addrs() -> (AccAddress, AccAddress) {
        (
            AccAddress::from_pubkey(&[1u8; 33]),
            AccAddress::from_pubkey(&[2u8; 33]),
        )
    }

    #[test]
    fn test_msg_send_validation_basic() {
        let (from, to) = addrs();

        let msg = build_msg(from, to, parse_coins("100uatom").unwrap());
        assert!(msg.validate_basic().is_ok());

        let err = build_msg(from, from, parse_coins("100uatom").unwrap())
            .validate_basic()
            .unwrap_err();
        assert!(err.is(DEFAULT_CODESPACE, CODE_INVALID_OUTPUT));

        let same_account = from.with_prefix("iaa").unwrap();
        let err = build_msg(from, same_account, parse_coins("1uatom").unwrap())
            .validate_basic()
            .unwrap_err();
        assert!(err.is(DEFAULT_CODESPACE, CODE_INVALID_OUTPUT));

        let err = build_msg(from, to, Coins::empty())
            .validate_basic()
            .unwrap_err();
        assert!(err.is(DEFAULT_CODESPACE, root::INVALID_COINS));
        assert_eq!(err.message, "invalid coins");
    }

    #[test]
    fn test_registry_defaults() {
        assert_eq!(new_error(CODE_INVALID_INPUT, "").message, "invalid input coins");
        assert_eq!(new_error(CODE_INVALID_OUTPUT, "x").message, "x");
    }

    #[test]
    fn test_msg_send_signers() {
        let (from, to) = addrs();
        let msg = build_msg(from, to, parse_coins("1stake").unwrap());
        assert_eq!(msg.get_signers(), vec![from]);
        assert_eq!(msg.route(), "bank");
        assert_eq!(msg.msg_type(), "send");
    }

    #[test]
    fn test_tagged_json() {
        let (from, to) = addrs();
        let msg: Msg = build_msg(from, to, parse_coins("3stake").unwrap()).into();
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "cosmos-sdk/Send");
        assert_eq!(json["value"]["from_address"], from.to_string());
        assert_eq!(json["value"]["amount"][0]["amount"], "3");

        let back: Msg = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }
}
