//! Unified error type for the edition CMS.
//!
//! Every fallible operation in `core`, `storage` and `web` returns [`Result`].
//! The HTTP layer turns these variants into status codes in `web::error`.

use sea_orm::DbErr;
use thiserror::Error;

/// Errors raised by the edition CMS
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// A content item, block or registration was not found
    #[error("{kind} '{id}' not found")]
    ItemNotFound {
        /// What was looked up (e.g. "slide", "registration")
        kind: String,
        /// The identifier that was looked up
        id: String,
    },

    /// An index passed to the collection editor is out of range
    #[error("Index {index} is out of range for a list of {len} items")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Current list length
        len: usize,
    },

    /// An uploaded file failed validation; nothing was written
    #[error("Upload rejected: {reason}")]
    UploadRejected {
        /// Why the upload was rejected
        reason: String,
    },

    /// Input failed validation before reaching the database
    #[error("Invalid input: {message}")]
    Validation {
        /// Description of the invalid input
        message: String,
    },

    /// An irreversible action was attempted without confirmation
    #[error("Action '{action}' requires explicit confirmation")]
    ConfirmationRequired {
        /// The action that was refused
        action: String,
    },

    /// Settings were modified by someone else since they were read
    #[error("Settings revision conflict: expected {expected}, found {actual}")]
    RevisionConflict {
        /// Revision the caller read
        expected: i32,
        /// Revision currently stored
        actual: i32,
    },

    /// Edition rollover would not move the current year forward
    #[error("Edition {next_year} does not advance current edition {current_year}")]
    EditionNotAdvanced {
        /// Currently active edition year
        current_year: i32,
        /// Year the rollover computed
        next_year: i32,
    },

    /// A registration was refused (closed, full, missing answers)
    #[error("Registration rejected: {reason}")]
    RegistrationRejected {
        /// Why the registration was refused
        reason: String,
    },

    /// A batch save stopped partway through
    #[error("Save failed after {saved} item(s): {source}")]
    SaveFailed {
        /// Number of items written before the failure
        saved: usize,
        /// The failure that stopped the batch
        #[source]
        source: Box<Error>,
    },

    /// Object storage failed (remote API error, unexpected response)
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage failure
        message: String,
    },

    /// Database error from `SeaORM`
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client error talking to the file-sharing API
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON payload could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a not-found error on a numeric id
    #[must_use]
    pub fn not_found(kind: impl Into<String>, id: impl ToString) -> Self {
        Self::ItemNotFound {
            kind: kind.into(),
            id: id.to_string(),
        }
    }

    /// Whether this error is caused by the caller's input rather than a failing backend
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::IndexOutOfRange { .. }
                | Self::UploadRejected { .. }
                | Self::Validation { .. }
                | Self::ConfirmationRequired { .. }
                | Self::EditionNotAdvanced { .. }
                | Self::RegistrationRejected { .. }
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
