use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid mnemonic word count {0}, expected 12, 15, 18, 21 or 24")]
    InvalidWordCount(usize),

    #[error("invalid mnemonic phrase: {0}")]
    InvalidMnemonic(String),

    #[error("key derivation failed: {0}")]
    Derivation(String),

    #[error("invalid private key")]
    InvalidKey,

    #[error("signing failed: {0}")]
    Signing(String),
}
