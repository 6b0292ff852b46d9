//! Runtime configuration read from environment variables.
use std::{env, fmt::Display, str::FromStr};

use log::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: String,
    pub user_id: String,
    pub timer_sync_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "db.sqlite3".to_string(),
            user_id: "local".to_string(),
            timer_sync_secs: 5,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset or invalid values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            db_path: try_load(&lookup, "STUDY_DB_PATH", defaults.db_path),
            user_id: try_load(&lookup, "STUDY_USER_ID", defaults.user_id),
            timer_sync_secs: try_load(&lookup, "STUDY_TIMER_SYNC_SECS", defaults.timer_sync_secs)
                .max(1),
        }
    }
}

fn try_load<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => {
            info!("{key} not set, using default: {default}");
            default
        }
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value '{raw}': {e}, using default: {default}");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(Config::from_lookup(lookup_from(&[])), Config::default());
    }

    #[test]
    fn test_values_from_environment() {
        let config = Config::from_lookup(lookup_from(&[
            ("STUDY_DB_PATH", "/tmp/study.sqlite3"),
            ("STUDY_USER_ID", "alex"),
            ("STUDY_TIMER_SYNC_SECS", "30"),
        ]));
        assert_eq!(config.db_path, "/tmp/study.sqlite3");
        assert_eq!(config.user_id, "alex");
        assert_eq!(config.timer_sync_secs, 30);
    }

    #[test]
    fn test_invalid_number_falls_back() {
        let config = Config::from_lookup(lookup_from(&[("STUDY_TIMER_SYNC_SECS", "soon")]));
        assert_eq!(config.timer_sync_secs, 5);
        let config = Config::from_lookup(lookup_from(&[("STUDY_TIMER_SYNC_SECS", "0")]));
        assert_eq!(config.timer_sync_secs, 1);
    }
}
