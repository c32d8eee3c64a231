use tessera_crypto::CryptoError;
use tessera_service::ServiceError;
use tessera_transactions::TxError;
use tessera_types::TypesError;
use thiserror::Error;

/// Every failure the engine reports to its callers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Wrong password or token. Deliberately carries no detail.
    #[error("authentication failed")]
    Authentication,

    #[error("encryption error: {0}")]
    Encryption(String),

    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u128, available: u128 },

    #[error("transaction rejected: {reason}")]
    Broadcast { reason: String },

    #[error("sync failed with code {code}: {payload}")]
    Sync { code: u16, payload: String },

    #[error("wallet is not unlocked")]
    NotUnlocked,

    #[error("engine is not initialized")]
    NotInitialized,

    #[error("keystore storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl WalletError {
    /// Stable identifier for the error category, suitable for bindings.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidParameter(_) => "invalid_parameter",
            Self::Authentication => "authentication_error",
            Self::Encryption(_) => "encryption_error",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::Broadcast { .. } => "broadcast_error",
            Self::Sync { .. } => "sync_error",
            Self::NotUnlocked => "not_unlocked",
            Self::NotInitialized => "not_initialized",
            Self::Storage(_) => "storage_error",
            Self::Config(_) => "config_error",
            Self::Cancelled => "cancelled",
        }
    }
}

impl From<CryptoError> for WalletError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidWordCount(_) | CryptoError::InvalidMnemonic(_) => {
                Self::InvalidParameter(err.to_string())
            }
            CryptoError::Derivation(_) | CryptoError::InvalidKey | CryptoError::Signing(_) => {
                Self::Encryption(err.to_string())
            }
        }
    }
}

impl From<TxError> for WalletError {
    fn from(err: TxError) -> Self {
        match err {
            TxError::InvalidParameter(msg) => Self::InvalidParameter(msg),
            TxError::InsufficientFunds { needed, available } => {
                Self::InsufficientFunds { needed, available }
            }
            TxError::Overflow => Self::InvalidParameter(err.to_string()),
            TxError::Signing(msg) => Self::Encryption(msg),
            TxError::Crypto(inner) => inner.into(),
        }
    }
}

impl From<TypesError> for WalletError {
    fn from(err: TypesError) -> Self {
        Self::InvalidParameter(err.to_string())
    }
}

impl From<ServiceError> for WalletError {
    fn from(err: ServiceError) -> Self {
        Self::Sync {
            code: err.code,
            payload: err.payload,
        }
    }
}
