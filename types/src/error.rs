//! Errors raised while parsing or combining shared value types.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid amount '{0}'")]
    InvalidAmount(String),

    #[error("amount '{value}' has more than {max} fractional digits")]
    TooPrecise { value: String, max: u32 },

    #[error("amount overflow")]
    Overflow,

    #[error("unknown chain '{0}'")]
    UnknownChain(String),

    #[error("unknown network '{0}'")]
    UnknownNetwork(String),

    #[error("invalid account id '{0}'")]
    InvalidAccountId(String),

    #[error("invalid hash: {0}")]
    InvalidHash(String),
}
