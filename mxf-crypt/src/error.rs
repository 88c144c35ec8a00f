use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptError {
    #[error("key file \"{0}\" did not contain 32 hex characters (16 bytes)")]
    BadKeyFile(String),

    #[error("triplet is shorter than the fixed 48-byte EncryptedTriplet prefix")]
    TruncatedTriplet,

    #[error("cipher error: {0}")]
    Cipher(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] mxf_core::CoreError),

    #[error(transparent)]
    Container(#[from] mxf_container::ContainerError),
}

pub type Result<T> = std::result::Result<T, CryptError>;
