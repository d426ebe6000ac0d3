//! Error codes for the upgrade module

use crate::{root, ClassifiedError, Code, Codespace, ErrorRegistry};
use std::sync::OnceLock;

pub const DEFAULT_CODESPACE: Codespace = 1;

pub const CODE_INVALID_MSG_TYPE: Code = 200;
pub const CODE_UNKNOWN_REQUEST: Code = root::UNKNOWN_REQUEST;

/// Registry holding the upgrade module's defaults
pub fn registry() -> &'static ErrorRegistry {
    static REGISTRY: OnceLock<ErrorRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut registry = ErrorRegistry::new();
        // Fresh registry, cannot collide
        let _ = registry.register(DEFAULT_CODESPACE, CODE_INVALID_MSG_TYPE, "Invalid msg type");
        registry
    })
}

/// Build an upgrade module error; an empty `msg` picks the registered default
pub fn new_error(codespace: Codespace, code: Code, msg: &str) -> ClassifiedError {
    registry().build(codespace, code, msg)
}

pub fn err_invalid_msg_type(codespace: Codespace, msg: &str) -> ClassifiedError {
    new_error(codespace, CODE_INVALID_MSG_TYPE, msg)
}
