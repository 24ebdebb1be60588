use thiserror::Error;

/// Main error type for the Retrosheet interceptor.
/// Aggregates errors from the standard library, dependencies, and internal modules.
#[derive(Error, Debug)]
pub enum RetrosheetError {
    /// Failure reported by the underlying transport
    #[error("{0}")]
    TransportError(#[from] anyhow::Error),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    // Third-party library errors
    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    UrlParseError(#[from] url::ParseError),

    // Resolver module errors
    #[error("{0}")]
    ResolverError(#[from] crate::resolver::ResolverError),

    #[error("{0}")]
    OptionsError(#[from] crate::resolver::options::OptionsError),

    // Transcoder module errors
    #[error("{0}")]
    TranscoderError(#[from] crate::transcoder::TranscoderError),
}

impl RetrosheetError {
    /// Returns true if the error came from the transport rather than from the
    /// spreadsheet pipeline itself.
    pub fn is_transport(&self) -> bool {
        matches!(self, RetrosheetError::TransportError(_))
    }
}
