//! Error types for dataset convention handling.

use thiserror::Error;

/// Errors raised while resolving a dataset convention.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConventionError {
    /// The tag does not name one of the supported datasets.
    #[error("unknown dataset convention {0:?}, expected one of \"hcp\", \"adni\", \"dhcp\"")]
    InvalidConvention(String),
}

impl ConventionError {
    /// Creates an invalid convention error for the offending tag.
    pub fn invalid(tag: impl Into<String>) -> Self {
        Self::InvalidConvention(tag.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_value() {
        let err = ConventionError::invalid("foo");
        let msg = err.to_string();
        assert!(msg.contains("\"foo\""));
        assert!(msg.contains("hcp"));
    }
}
