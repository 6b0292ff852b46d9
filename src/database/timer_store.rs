//! Study timer snapshots kept in the `app_state` table.
use super::db;
use crate::error::Result;
use crate::models::{TimerSnapshot, TimerStore};
use rusqlite::Connection;

pub struct SqliteTimerStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteTimerStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl TimerStore for SqliteTimerStore<'_> {
    fn load(&self, key: &str) -> Result<Option<TimerSnapshot>> {
        match db::get_state(key, self.conn)? {
            Some(value) => Ok(Some(serde_json::from_str(&value)?)),
            None => Ok(None),
        }
    }

    fn save(&self, key: &str, snapshot: &TimerSnapshot) -> Result<()> {
        db::set_state(key, &serde_json::to_string(snapshot)?, self.conn)
    }
}

/// Key under which the timer of a study pack is stored.
pub fn timer_key(study_pack_id: i64) -> String {
    format!("timer:{}", study_pack_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StudyTimer, load_timer, sync_tick};
    use chrono::{Duration, Utc};

    #[test]
    fn test_snapshot_survives_store() {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let store = SqliteTimerStore::new(&conn);

        let now = Utc::now();
        let mut timer = StudyTimer::default();
        timer.start(now);
        timer.pause(now + Duration::seconds(42));

        sync_tick(&timer, &store, &timer_key(3), now + Duration::seconds(50)).unwrap();
        let restored = load_timer(&store, &timer_key(3), now + Duration::minutes(5)).unwrap();
        assert_eq!(restored, StudyTimer::Paused { accumulated_secs: 42 });
        assert!(store.load(&timer_key(4)).unwrap().is_none());
    }
}
