use thiserror::Error;

/// Errors raised by the invoicing core.
///
/// Business-level transmission outcomes (rejection, provider fault,
/// indeterminate response) are *not* errors - they are reported through
/// `TransmissionResult`. Only transport-level failures surface here.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EfaturaError {
    /// Tenant configuration is missing or malformed (document series,
    /// supplier identity). Fatal to the attempt; requires operator
    /// intervention, never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Order data failed validation (unparseable amount, empty line set).
    /// Fatal to the attempt; carries the offending field.
    #[error("validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    /// XML document generation failed.
    #[error("XML error: {0}")]
    Xml(String),

    /// Connection, DNS, or timeout failure during transmission.
    /// Retryable by the caller with the *same* built document.
    #[error("transport error: {0}")]
    Transport(String),
}

impl EfaturaError {
    /// Shorthand for a validation error naming the offending field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether the caller may retry the attempt without changing its input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
