use std::fmt;

use ream_beacon_chain::error::ChainError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Code {
    InvalidArgument,
    NotFound,
    FailedPrecondition,
    Aborted,
    Canceled,
    Unavailable,
    Internal,
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InvalidArgument => "invalid argument",
            Self::NotFound => "not found",
            Self::FailedPrecondition => "failed precondition",
            Self::Aborted => "aborted",
            Self::Canceled => "canceled",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal",
        })
    }
}

/// The outcome of a failed request, or the reason a stream ended.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct Status {
    pub code: Code,
    pub message: String,
}

impl Status {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(Code::InvalidArgument, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Code::Internal, message)
    }

    pub fn aborted(message: impl Into<String>) -> Self {
        Self::new(Code::Aborted, message)
    }

    pub fn canceled(message: impl Into<String>) -> Self {
        Self::new(Code::Canceled, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(Code::Unavailable, message)
    }
}

impl From<ChainError> for Status {
    fn from(error: ChainError) -> Self {
        let code = match &error {
            ChainError::Cancelled => Code::Canceled,
            ChainError::UninitializedChain(_) => Code::FailedPrecondition,
            ChainError::OrphanBlock { .. }
            | ChainError::InvalidCheckpoint { .. }
            | ChainError::UnknownBlockRoot(_)
            | ChainError::BlockBeforeFinalized { .. }
            | ChainError::TooManySkippedSlots { .. }
            | ChainError::FutureBlock { .. }
            | ChainError::StateTransition(_)
            | ChainError::InvalidAttestation(_) => Code::InvalidArgument,
            _ => Code::Internal,
        };
        Self::new(code, error.to_string())
    }
}
