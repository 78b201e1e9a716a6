//! # Checkout Error Types
//!
//! Typed error handling for the quote and checkout flow.
//! Pricing itself never fails; everything that can fail returns
//! `Result<T, CheckoutError>`.

use thiserror::Error;

/// The four failure categories callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed buyer input, caught before pricing or checkout
    Validation,
    /// Unknown promo code, ineligible buyer, or exhausted capacity
    InvalidPromoCode,
    /// Network failure, timeout, or non-2xx answer from the provider
    Transport,
    /// Bad credentials or a request shape the provider can never accept
    Configuration,
}

/// Core error type for all checkout operations
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Buyer-supplied data failed validation
    #[error("Validation error: {field}: {message}")]
    Validation { field: String, message: String },

    /// Promo code could not be applied
    #[error("Invalid promo code '{code}': {message}")]
    InvalidPromoCode { code: String, message: String },

    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Request shape the provider would reject (zero amount, no line items)
    #[error("Invalid checkout request: {0}")]
    InvalidRequest(String),

    /// Provider refused our credentials
    #[error("Provider authentication failed [{provider}]: {message}")]
    ProviderAuthentication { provider: String, message: String },

    /// Payment provider answered with a non-2xx status
    #[error("Provider error [{provider}] (HTTP {status}): {message}")]
    ProviderError {
        provider: String,
        status: u16,
        message: String,
    },

    /// Network/HTTP error communicating with provider
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Provider did not answer within the client timeout
    #[error("Provider request timed out after {0} seconds")]
    Timeout(u64),

    /// Provider response could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CheckoutError {
    /// Shorthand for a validation failure on one field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CheckoutError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Which category of the taxonomy this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckoutError::Validation { .. } => ErrorKind::Validation,
            CheckoutError::InvalidPromoCode { .. } => ErrorKind::InvalidPromoCode,
            CheckoutError::NetworkError(_)
            | CheckoutError::Timeout(_)
            | CheckoutError::ProviderError { .. }
            | CheckoutError::Serialization(_) => ErrorKind::Transport,
            CheckoutError::Configuration(_)
            | CheckoutError::InvalidRequest(_)
            | CheckoutError::ProviderAuthentication { .. }
            | CheckoutError::Internal(_) => ErrorKind::Configuration,
        }
    }

    /// Returns true if a caller may reasonably try the same request again.
    ///
    /// The adapter never retries on its own.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    /// Returns true if an operator has to intervene before checkout can work
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            CheckoutError::Validation { .. } => 400,
            CheckoutError::InvalidPromoCode { .. } => 422,
            CheckoutError::InvalidRequest(_) => 400,
            CheckoutError::ProviderError { .. } => 502,
            CheckoutError::NetworkError(_) => 503,
            CheckoutError::Timeout(_) => 504,
            CheckoutError::Serialization(_) => 502,
            CheckoutError::Configuration(_)
            | CheckoutError::ProviderAuthentication { .. }
            | CheckoutError::Internal(_) => 500,
        }
    }

    /// Message safe to show to the buyer.
    ///
    /// Transport and configuration details stay in the logs.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::InvalidPromoCode => self.to_string(),
            ErrorKind::Transport => {
                "We couldn't reach the payment provider. Please try again in a moment.".to_string()
            }
            ErrorKind::Configuration => match self {
                CheckoutError::InvalidRequest(msg) => msg.clone(),
                _ => "Checkout is temporarily unavailable. Please contact us to complete your order."
                    .to_string(),
            },
        }
    }
}

/// Result type alias for checkout operations
pub type CheckoutResult<T> = Result<T, CheckoutError>;
