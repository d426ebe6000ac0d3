//! Error classification for bankgate modules.
//!
//! Every module owns a small integer codespace and a set of numeric codes.
//! A [`ClassifiedError`] pairs those with a human readable message, and an
//! [`ErrorRegistry`] supplies a stable default message whenever the caller
//! does not provide one.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod registry;
pub mod root;
pub mod upgrade;

pub use registry::{ErrorRegistry, RegistryError};

/// Module-scoped namespace for error codes
pub type Codespace = u16;

/// Error code inside a codespace
pub type Code = u32;

/// Codespace shared by the root (base) codes
pub const ROOT_CODESPACE: Codespace = 0;

/// An error tagged with the codespace and code of the module that raised it
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message} (codespace: {codespace}, code: {code})")]
pub struct ClassifiedError {
    pub codespace: Codespace,
    pub code: Code,
    pub message: String,
}

impl ClassifiedError {
    /// Create an error with an explicit message.
    ///
    /// Prefer [`ErrorRegistry::build`] when the message may be empty.
    pub fn new(codespace: Codespace, code: Code, message: impl Into<String>) -> Self {
        Self {
            codespace,
            code,
            message: message.into(),
        }
    }

    /// Whether this error carries the given codespace and code
    pub fn is(&self, codespace: Codespace, code: Code) -> bool {
        self.codespace == codespace && self.code == code
    }
}

/// Result type alias for operations failing with a classified error
pub type Result<T> = std::result::Result<T, ClassifiedError>;
