use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by StayBook operations
#[derive(Debug, Error)]
pub enum HotelError {
    /// Form input rejected before touching the database
    #[error("{0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Room {0} is occupied. Please cancel the reservation first.")]
    RoomOccupied(i64),

    #[error("Room {0} is not available")]
    RoomUnavailable(i64),

    #[error("Room {0} can only become occupied through a reservation")]
    InvalidStatusChange(i64),

    #[error("Branch '{0}' already exists")]
    DuplicateBranch(String),

    #[error("Invalid branch name '{0}': use letters, digits, spaces, '-', '_' or '.'")]
    InvalidBranchName(String),

    #[error("{0}")]
    InvalidCredentials(&'static str),

    #[error("An administrator already exists")]
    AdminExists,

    #[error("No administrator detected. Please create one.")]
    NoAdministrator,

    #[error("The administrator has no branch database")]
    NoBranchDatabase,

    #[error("Timeout waiting for lock on {0:?} - another process may be editing branches")]
    LockTimeout(PathBuf),

    #[error("Database schema version {found} is newer than supported version {supported}")]
    SchemaVersion { found: i32, supported: i32 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HotelError {
    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        HotelError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        HotelError::Validation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, HotelError>;
