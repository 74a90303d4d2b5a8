#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("checksum mismatch: expected {}, got {}", hex::encode(expected), hex::encode(actual))]
    HashMismatch { expected: Vec<u8>, actual: Vec<u8> },

    #[error("invalid hex digest '{0}'")]
    InvalidDigest(String),
}

pub type Result<T> = std::result::Result<T, VerifyError>;
