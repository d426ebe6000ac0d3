//! Default messages keyed by (codespace, code)

use crate::{root, ClassifiedError, Code, Codespace};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate registration:: codespace {codespace} code {code}")]
    Duplicate { codespace: Codespace, code: Code },
}

/// Table of default messages for module error codes.
///
/// Codespaces are picked by each module; nothing enforces global uniqueness
/// beyond rejecting a second registration of the same pair.
#[derive(Debug, Default, Clone)]
pub struct ErrorRegistry {
    messages: HashMap<(Codespace, Code), String>,
}

impl ErrorRegistry {
    /// Create an empty registry. Root codes are always consulted on lookup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the default message for a code
    pub fn register(
        &mut self,
        codespace: Codespace,
        code: Code,
        default_message: impl Into<String>,
    ) -> Result<(), RegistryError> {
        if self.messages.contains_key(&(codespace, code)) {
            return Err(RegistryError::Duplicate { codespace, code });
        }
        self.messages
            .insert((codespace, code), default_message.into());
        Ok(())
    }

    /// Chainable form of [`register`](Self::register) for static tables
    pub fn with(
        mut self,
        codespace: Codespace,
        code: Code,
        default_message: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        self.register(codespace, code, default_message)?;
        Ok(self)
    }

    /// Whether a module-level message exists for the pair
    pub fn is_registered(&self, codespace: Codespace, code: Code) -> bool {
        self.messages.contains_key(&(codespace, code))
    }

    /// Default message for a pair: module table, then root codes, then "unknown request"
    pub fn default_message(&self, codespace: Codespace, code: Code) -> &str {
        if let Some(msg) = self.messages.get(&(codespace, code)) {
            return msg;
        }
        root::default_message(code).unwrap_or(root::UNKNOWN_REQUEST_MSG)
    }

    /// Build a classified error, falling back to the default message when `message` is empty
    pub fn build(&self, codespace: Codespace, code: Code, message: &str) -> ClassifiedError {
        let message = if message.is_empty() {
            self.default_message(codespace, code).to_string()
        } else {
            message.to_string()
        };
        ClassifiedError::new(codespace, code, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ErrorRegistry {
        ErrorRegistry::new()
            .with(1, 200, "invalid msg type")
            .unwrap()
            .with(2, 101, "invalid input coins")
            .unwrap()
    }

    #[test]
    fn test_registered_default_message() {
        let err = registry().build(1, 200, "");
        assert_eq!(err.message, "invalid msg type");
        assert_eq!(err.codespace, 1);
        assert_eq!(err.code, 200);
    }

    #[test]
    fn test_explicit_message_wins() {
        let err = registry().build(1, 200, "custom");
        assert_eq!(err.message, "custom");
    }

    #[test]
    fn test_codespaces_do_not_collide() {
        let reg = registry();
        assert_eq!(reg.build(2, 101, "").message, "invalid input coins");
        // Same code in a codespace that never registered it
        assert_eq!(reg.build(1, 101, "").message, "unknown request");
    }

    #[test]
    fn test_root_fallback() {
        let reg = registry();
        assert_eq!(reg.build(1, root::UNAUTHORIZED, "").message, "unauthorized");
        assert_eq!(reg.build(7, root::INTERNAL, "").message, "internal error");
    }

    #[test]
    fn test_unregistered_code() {
        assert_eq!(registry().build(1, 4242, "").message, "unknown request");
    }

    #[test]
    fn test_duplicate_registration() {
        let mut reg = registry();
        assert_eq!(
            reg.register(1, 200, "again"),
            Err(RegistryError::Duplicate {
                codespace: 1,
                code: 200
            })
        );
        assert!(reg.is_registered(1, 200));
        assert!(!reg.is_registered(3, 200));
    }
}
