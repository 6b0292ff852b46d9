pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod handlers;
pub mod models;

pub use error::{DataIntegrityWarning, Result, StudyError, ValidationError};
pub use models::{Flashcard, FlashcardReview, Highlight, Rating, ReviewSession, StudyPack};
