//! Error types for the rendering pipeline.

use thiserror::Error;

/// Result type alias for rendering operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while turning a request into an encoded image.
///
/// Every variant is request-scoped: nothing is retried and no state survives
/// the failed call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Missing text, bad size, unknown enum value or a limit exceeded.
    #[error("{0}")]
    Validation(String),

    /// The symbol encoder handed back a degenerate module grid.
    #[error("Invalid module matrix: {0}")]
    InvalidMatrix(String),

    /// The drawing surface could not be allocated or serialized.
    #[error("Rendering failed: {0}")]
    Render(String),

    /// The output encoding step rejected the rendered image.
    #[error("Output encoding failed: {0}")]
    Encode(String),

    /// The external symbol encoder refused the text (e.g. too long).
    #[error("QR encoding failed: {0}")]
    Symbol(String),
}

impl Error {
    /// Stable tag reported to callers alongside the message.
    pub fn category(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::InvalidMatrix(_) => "invalid_matrix",
            Error::Render(_) => "render_failure",
            Error::Encode(_) => "encode_failure",
            Error::Symbol(_) => "symbol_encoding_error",
        }
    }

    /// HTTP status the transport answers with for this failure.
    pub fn status(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::Symbol(_) => 422,
            Error::InvalidMatrix(_) | Error::Render(_) | Error::Encode(_) => 500,
        }
    }

    /// True when the caller sent bad input rather than the server failing.
    pub fn is_client_error(&self) -> bool {
        self.status() < 500
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Render(err.to_string())
    }
}
