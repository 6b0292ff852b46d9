pub mod db;
pub mod timer_store;

pub use timer_store::SqliteTimerStore;
