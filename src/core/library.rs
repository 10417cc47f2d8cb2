use std::fmt;
use std::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum LibraryError {
    NotFound {
        message: String,
    },
    // The operation is legal in general but not in the entity's current
    // state; reason_code narrows the precondition that failed, e.g.
    // "book_has_hold" or "over_limit".
    InvalidState {
        message: String,
        reason_code: Option<String>,
    },
    AlreadyExists {
        message: String,
    },
    Serialization {
        message: String,
    },
    Runtime {
        message: String,
        reason_code: Option<String>,
    },
}

impl LibraryError {
    pub fn not_found(message: &str) -> LibraryError {
        LibraryError::NotFound { message: message.to_string() }
    }

    pub fn invalid_state(message: &str, reason_code: Option<String>) -> LibraryError {
        LibraryError::InvalidState { message: message.to_string(), reason_code }
    }

    pub fn already_exists(message: &str) -> LibraryError {
        LibraryError::AlreadyExists { message: message.to_string() }
    }

    pub fn serialization(message: &str) -> LibraryError {
        LibraryError::Serialization { message: message.to_string() }
    }

    pub fn runtime(message: &str, reason_code: Option<String>) -> LibraryError {
        LibraryError::Runtime { message: message.to_string(), reason_code }
    }

    pub fn reason_code(&self) -> Option<&str> {
        match self {
            LibraryError::InvalidState { reason_code, .. } => reason_code.as_deref(),
            LibraryError::Runtime { reason_code, .. } => reason_code.as_deref(),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LibraryError {
    fn from(err: std::io::Error) -> Self {
        LibraryError::runtime(
            format!("snapshot io {:?}", err).as_str(), None)
    }
}

impl From<serde_json::Error> for LibraryError {
    fn from(err: serde_json::Error) -> Self {
        LibraryError::serialization(
            format!("serde json parsing {:?}", err).as_str())
    }
}

impl Display for LibraryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LibraryError::NotFound { message } => {
                write!(f, "{}", message)
            }
            LibraryError::InvalidState { message, reason_code } => {
                write!(f, "{} {:?}", message, reason_code)
            }
            LibraryError::AlreadyExists { message } => {
                write!(f, "{}", message)
            }
            LibraryError::Serialization { message } => {
                write!(f, "{}", message)
            }
            LibraryError::Runtime { message, reason_code } => {
                write!(f, "{} {:?}", message, reason_code)
            }
        }
    }
}

impl std::error::Error for LibraryError {}

/// A specialized Result type for lending and hold operations.
pub type LibraryResult<T> = Result<T, LibraryError>;

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub enum BookStatus {
    Available,
    CheckedOut,
}

impl Display for BookStatus {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            BookStatus::Available => write!(f, "Available"),
            BookStatus::CheckedOut => write!(f, "CheckedOut"),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub enum TransactionKind {
    Issued,
    Returned,
    Renewed,
}

impl Display for TransactionKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            TransactionKind::Issued => write!(f, "Issued"),
            TransactionKind::Returned => write!(f, "Returned"),
            TransactionKind::Renewed => write!(f, "Renewed"),
        }
    }
}
