use thiserror::Error;

pub type JwaResult<T> = Result<T, JwaError>;

#[derive(Debug, Error)]
pub enum JwaError {
    /// Tag mismatch. Carries no detail about where the mismatch occurred.
    #[error("authentication failed")]
    AuthenticationFailure,

    #[error("malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("invalid key material: expected {expected} bytes, got {actual}")]
    InvalidKeyMaterial { expected: usize, actual: usize },

    #[error("secure random source failed: {0}")]
    Random(String),

    #[error("algorithm registered by more than one suite: {0}")]
    DuplicateAlgorithm(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
