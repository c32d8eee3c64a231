use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure talking to the transaction service.
///
/// `code` is the HTTP status when the service answered, or
/// [`ServiceError::NO_RESPONSE`] when the request never completed.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("service error {code}: {payload}")]
pub struct ServiceError {
    pub code: u16,
    pub payload: String,
}

impl ServiceError {
    pub const NO_RESPONSE: u16 = 0;

    pub fn new(code: u16, payload: impl Into<String>) -> Self {
        Self {
            code,
            payload: payload.into(),
        }
    }

    pub fn transport(payload: impl Into<String>) -> Self {
        Self::new(Self::NO_RESPONSE, payload)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.code, 401 | 403)
    }
}
