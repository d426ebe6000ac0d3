//! Root codes shared by every codespace.
//!
//! Module registries fall back to this table before reporting an unknown
//! request, so a module only has to register the codes it adds.

use crate::Code;

pub const INTERNAL: Code = 1;
pub const TX_DECODE: Code = 2;
pub const INVALID_SEQUENCE: Code = 3;
pub const UNAUTHORIZED: Code = 4;
pub const INSUFFICIENT_FUNDS: Code = 5;
pub const UNKNOWN_REQUEST: Code = 6;
pub const INVALID_ADDRESS: Code = 7;
pub const INVALID_PUBKEY: Code = 8;
pub const UNKNOWN_ADDRESS: Code = 9;
pub const INSUFFICIENT_COINS: Code = 10;
pub const INVALID_COINS: Code = 11;
pub const OUT_OF_GAS: Code = 12;
pub const MEMO_TOO_LARGE: Code = 13;
pub const INSUFFICIENT_FEE: Code = 14;
pub const TOO_MANY_SIGNATURES: Code = 15;

/// Message used when neither the module nor the root table knows a code
pub const UNKNOWN_REQUEST_MSG: &str = "unknown request";

/// Default message for a root code, if it is one
pub fn default_message(code: Code) -> Option<&'static str> {
    let msg = match code {
        INTERNAL => "internal error",
        TX_DECODE => "tx parse error",
        INVALID_SEQUENCE => "invalid sequence",
        UNAUTHORIZED => "unauthorized",
        INSUFFICIENT_FUNDS => "insufficient funds",
        UNKNOWN_REQUEST => UNKNOWN_REQUEST_MSG,
        INVALID_ADDRESS => "invalid address",
        INVALID_PUBKEY => "invalid pubkey",
        UNKNOWN_ADDRESS => "unknown address",
        INSUFFICIENT_COINS => "insufficient coins",
        INVALID_COINS => "invalid coins",
        OUT_OF_GAS => "out of gas",
        MEMO_TOO_LARGE => "memo too large",
        INSUFFICIENT_FEE => "insufficient fee",
        TOO_MANY_SIGNATURES => "too many signatures",
        _ => return None,
    };
    Some(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_root_codes() {
        assert_eq!(default_message(INTERNAL), Some("internal error"));
        assert_eq!(default_message(UNKNOWN_REQUEST), Some("unknown request"));
        assert_eq!(default_message(INVALID_COINS), Some("invalid coins"));
    }

    #[test]
    fn test_unknown_root_code() {
        assert_eq!(default_message(0), None);
        assert_eq!(default_message(999), None);
    }
}
