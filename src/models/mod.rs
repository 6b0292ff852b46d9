pub mod anchor;
pub mod flashcard;
pub mod highlight;
pub mod review;
pub mod review_session;
pub mod scheduler;
pub mod study_pack;
pub mod study_timer;

pub use anchor::{Rect, RenderedHighlight};
pub use flashcard::Flashcard;
pub use highlight::{Coordinates, Highlight, HighlightColor, StoredCoordinates};
pub use review::{FlashcardReview, MasteryLevel, Rating};
pub use review_session::{ReviewSession, SessionPhase};
pub use scheduler::ReviewStats;
pub use study_pack::StudyPack;
pub use study_timer::{StudyTimer, TimerSnapshot, TimerStore, load_timer, sync_tick};
