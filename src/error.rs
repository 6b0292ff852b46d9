//! Error types shared by the scheduler, the highlight model and the persistence layer.
use std::fmt;
use thiserror::Error;

/// Input rejected before anything is persisted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("unknown rating '{0}', expected one of again, hard, good, easy")]
    UnknownRating(String),

    #[error("unknown highlight color '{0}'")]
    UnknownColor(String),

    #[error("highlight text is empty")]
    EmptySelection,

    #[error("page has no size yet ({width}x{height}), retry after layout")]
    PageNotLaidOut { width: f64, height: f64 },

    #[error("{field} = {value} is outside [0, 100]")]
    PercentOutOfRange { field: &'static str, value: f64 },

    #[error("selection has zero area after conversion")]
    ZeroAreaSelection,

    #[error("highlight geometry is incomplete: {0}")]
    MissingGeometry(String),

    #[error("study pack name is empty")]
    EmptyPackName,

    #[error("study pack '{0}' already exists")]
    DuplicatePack(String),

    #[error("page numbers start at 1, got {0}")]
    InvalidPageNumber(u32),
}

#[derive(Debug, Error)]
pub enum StudyError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StudyError>;

/// A stored highlight that cannot be drawn. Reported, never fatal for the rest of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct DataIntegrityWarning {
    pub highlight_id: i64,
    pub reason: String,
}

impl fmt::Display for DataIntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "highlight {}: {}", self.highlight_id, self.reason)
    }
}
