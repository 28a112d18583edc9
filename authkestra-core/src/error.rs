use crate::client::FetchError;

/// Errors surfaced to the surrounding authentication flow.
///
/// Every variant is terminal for the current attempt; retrying means
/// restarting the whole authorization handshake.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Generic failure reported by a provider.
    #[error("Provider error: {0}")]
    Provider(String),
    /// The upstream HTTP call failed.
    #[error("{message}")]
    Upstream {
        /// Message taken from the upstream error body, or a fixed fallback.
        message: String,
        /// The failure reported by the OAuth2 client.
        #[source]
        source: FetchError,
    },
    /// A response body could not be decoded.
    #[error("{0}")]
    Parse(String),
    /// A profile field mapping could not be applied.
    #[error("Mapping error: {0}")]
    Mapping(String),
    /// The user denied the authorization request.
    #[error("Access denied: {0}")]
    AccessDenied(String),
    /// The state returned to the callback does not match the one issued.
    #[error("CSRF state mismatch")]
    CsrfMismatch,
    /// The callback carried no usable authorization code.
    #[error("Invalid code")]
    InvalidCode,
    /// The provider was configured with invalid options.
    #[error("Configuration error: {0}")]
    Config(String),
}
