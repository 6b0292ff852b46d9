//! Study timer shown while reviewing a pack.
//!
//! The timer is a small state machine; its state is pushed to a [`TimerStore`]
//! on a fixed period so another session can pick it up where it was left.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StudyTimer {
    #[default]
    Idle,
    Running {
        started_at: DateTime<Utc>,
        accumulated_secs: i64,
    },
    Paused {
        accumulated_secs: i64,
    },
}

/// Serializable state exchanged with the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub running: bool,
    pub elapsed_secs: i64,
    pub updated_at: DateTime<Utc>,
}

impl StudyTimer {
    pub fn start(&mut self, now: DateTime<Utc>) {
        let accumulated_secs = match *self {
            StudyTimer::Idle => 0,
            StudyTimer::Paused { accumulated_secs } => accumulated_secs,
            StudyTimer::Running { .. } => return,
        };
        *self = StudyTimer::Running {
            started_at: now,
            accumulated_secs,
        };
    }

    pub fn pause(&mut self, now: DateTime<Utc>) {
        if let StudyTimer::Running { .. } = self {
            *self = StudyTimer::Paused {
                accumulated_secs: self.elapsed_secs(now),
            };
        }
    }

    pub fn reset(&mut self) {
        *self = StudyTimer::Idle;
    }

    pub fn is_running(&self) -> bool {
        matches!(self, StudyTimer::Running { .. })
    }

    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> i64 {
        match *self {
            StudyTimer::Idle => 0,
            StudyTimer::Paused { accumulated_secs } => accumulated_secs,
            StudyTimer::Running {
                started_at,
                accumulated_secs,
            } => accumulated_secs + (now - started_at).num_seconds().max(0),
        }
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> TimerSnapshot {
        TimerSnapshot {
            running: self.is_running(),
            elapsed_secs: self.elapsed_secs(now),
            updated_at: now,
        }
    }

    /// Rebuilds a timer from a stored snapshot. A timer that was running keeps
    /// counting the time since the snapshot was written.
    pub fn restore(snapshot: &TimerSnapshot, now: DateTime<Utc>) -> Self {
        if snapshot.running {
            StudyTimer::Running {
                started_at: snapshot.updated_at.min(now),
                accumulated_secs: snapshot.elapsed_secs,
            }
        } else if snapshot.elapsed_secs > 0 {
            StudyTimer::Paused {
                accumulated_secs: snapshot.elapsed_secs,
            }
        } else {
            StudyTimer::Idle
        }
    }
}

/// Remote side of the timer: plain get/set of the latest snapshot per key.
pub trait TimerStore {
    fn load(&self, key: &str) -> Result<Option<TimerSnapshot>>;
    fn save(&self, key: &str, snapshot: &TimerSnapshot) -> Result<()>;
}

/// One periodic sync step: writes the local state and returns what was written.
pub fn sync_tick<S: TimerStore + ?Sized>(
    timer: &StudyTimer,
    store: &S,
    key: &str,
    now: DateTime<Utc>,
) -> Result<TimerSnapshot> {
    let snapshot = timer.snapshot(now);
    store.save(key, &snapshot)?;
    log::debug!("Synced timer '{}': {}s", key, snapshot.elapsed_secs);
    Ok(snapshot)
}

/// Timer state for `key` from the store, or a fresh timer.
pub fn load_timer<S: TimerStore + ?Sized>(store: &S, key: &str, now: DateTime<Utc>) -> Result<StudyTimer> {
    Ok(store
        .load(key)?
        .map(|snapshot| StudyTimer::restore(&snapshot, now))
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryStore(RefCell<HashMap<String, TimerSnapshot>>);

    impl TimerStore for MemoryStore {
        fn load(&self, key: &str) -> Result<Option<TimerSnapshot>> {
            Ok(self.0.borrow().get(key).copied())
        }

        fn save(&self, key: &str, snapshot: &TimerSnapshot) -> Result<()> {
            self.0.borrow_mut().insert(key.to_string(), *snapshot);
            Ok(())
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 18, 0, 0).unwrap()
    }

    #[test]
    fn test_pause_and_resume_accumulate() {
        let mut timer = StudyTimer::default();
        assert_eq!(timer.elapsed_secs(t0()), 0);

        timer.start(t0());
        timer.pause(t0() + Duration::seconds(90));
        assert_eq!(timer.elapsed_secs(t0() + Duration::hours(1)), 90);

        timer.start(t0() + Duration::seconds(200));
        // starting twice keeps the original start
        timer.start(t0() + Duration::seconds(250));
        assert_eq!(timer.elapsed_secs(t0() + Duration::seconds(300)), 190);

        timer.reset();
        assert_eq!(timer, StudyTimer::Idle);
    }

    #[test]
    fn test_sync_and_restore() {
        let store = MemoryStore::default();
        let mut timer = StudyTimer::default();
        timer.start(t0());

        let written = sync_tick(&timer, &store, "timer:1", t0() + Duration::seconds(30)).unwrap();
        assert!(written.running);
        assert_eq!(written.elapsed_secs, 30);

        let restored = load_timer(&store, "timer:1", t0() + Duration::seconds(45)).unwrap();
        assert!(restored.is_running());
        assert_eq!(restored.elapsed_secs(t0() + Duration::seconds(60)), 60);

        let missing = load_timer(&store, "timer:2", t0()).unwrap();
        assert_eq!(missing, StudyTimer::Idle);
    }

    #[test]
    fn test_restore_paused() {
        let snapshot = TimerSnapshot {
            running: false,
            elapsed_secs: 600,
            updated_at: t0(),
        };
        let timer = StudyTimer::restore(&snapshot, t0() + Duration::days(1));
        assert_eq!(timer, StudyTimer::Paused { accumulated_secs: 600 });
    }
}
