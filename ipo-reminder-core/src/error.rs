//! Error types for the ipo-reminder core.

use thiserror::Error;

/// Errors that can occur while preparing or sending notifications.
#[derive(Error, Debug)]
pub enum ReminderError {
    /// Required configuration is absent. Fatal before any network or ledger
    /// activity; the CLI maps this to exit code 2.
    #[error("Missing configuration: {0}")]
    Config(String),

    /// An offering row lacks a field it cannot be tracked without.
    /// Recoverable: the caller skips that offering and continues.
    #[error("Offering is missing {0}")]
    MissingField(&'static str),

    /// The closing date is absent or not a calendar date. Recoverable the
    /// same way as a missing field.
    #[error("Invalid closing date: {0:?}")]
    InvalidDate(String),

    /// The persisted ledger exists but cannot be parsed. Fatal: proceeding
    /// with an empty ledger would re-send every recorded notification.
    #[error("Ledger is corrupt: {0}")]
    CorruptLedger(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Mail transport failure. Not recovered locally; aborts the run.
    #[error("Mail transport error: {0}")]
    Transport(String),
}

/// Result type alias for ipo-reminder operations.
pub type ReminderResult<T> = Result<T, ReminderError>;
