use rusqlite::ffi;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

/// Gateway failures, classified so callers can tell "already exists"
/// noise apart from real faults without string matching.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("duplicate row: {0}")]
    Duplicate(String),

    #[error("foreign key violation: {0}")]
    ForeignKey(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Sqlite(rusqlite::Error),
}

impl DbError {
    /// True for errors an idempotent insert should treat as "already exists".
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::Duplicate(_) | Self::ForeignKey(_) | Self::Constraint(_)
        )
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        let rusqlite::Error::SqliteFailure(code, msg) = &err else {
            return Self::Sqlite(err);
        };
        if code.code != rusqlite::ErrorCode::ConstraintViolation {
            return Self::Sqlite(err);
        }

        let detail = msg.clone().unwrap_or_else(|| err.to_string());
        match code.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                Self::Duplicate(detail)
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Self::ForeignKey(detail),
            _ => Self::Constraint(detail),
        }
    }
}
