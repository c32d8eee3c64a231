use tessera_crypto::CryptoError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u128, available: u128 },

    #[error("amount arithmetic overflowed")]
    Overflow,

    #[error("signing failed: {0}")]
    Signing(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
