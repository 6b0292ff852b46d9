//! Per-user review state of a flashcard.
use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Answer quality picked by the user after revealing the back of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Again, Rating::Hard, Rating::Good, Rating::Easy];

    pub fn as_str(self) -> &'static str {
        match self {
            Rating::Again => "again",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        }
    }

    /// Only `good` and `easy` count towards accuracy.
    pub fn is_correct(self) -> bool {
        matches!(self, Rating::Good | Rating::Easy)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "again" => Ok(Rating::Again),
            "hard" => Ok(Rating::Hard),
            "good" => Ok(Rating::Good),
            "easy" => Ok(Rating::Easy),
            _ => Err(ValidationError::UnknownRating(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MasteryLevel {
    Learning,
    Young,
    Mature,
    Mastered,
}

impl MasteryLevel {
    /// Interval (days) from which a card with a settled streak counts as mastered.
    pub const MASTERED_INTERVAL: i64 = 21;

    pub fn classify(repetitions: i64, interval: i64) -> Self {
        match repetitions {
            r if r <= 0 => MasteryLevel::Learning,
            1 | 2 => MasteryLevel::Young,
            _ if interval < Self::MASTERED_INTERVAL => MasteryLevel::Mature,
            _ => MasteryLevel::Mastered,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MasteryLevel::Learning => "learning",
            MasteryLevel::Young => "young",
            MasteryLevel::Mature => "mature",
            MasteryLevel::Mastered => "mastered",
        }
    }
}

impl FromStr for MasteryLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "learning" => Ok(MasteryLevel::Learning),
            "young" => Ok(MasteryLevel::Young),
            "mature" => Ok(MasteryLevel::Mature),
            "mastered" => Ok(MasteryLevel::Mastered),
            other => Err(format!("unknown mastery level '{other}'")),
        }
    }
}

/// Review record of one flashcard for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardReview {
    pub flashcard_id: i64,
    pub user_id: String,
    pub ease_factor: f64,
    pub interval: i64,
    pub repetitions: i64,
    pub next_review_date: DateTime<Utc>,
    pub last_review_date: Option<DateTime<Utc>>,
    pub last_review_rating: Option<Rating>,
    pub total_reviews: i64,
    pub correct_reviews: i64,
    pub mastery_level: MasteryLevel,
}

impl FlashcardReview {
    /// State of a card that has never been rated.
    pub fn fresh(flashcard_id: i64, user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            flashcard_id,
            user_id: user_id.to_string(),
            ease_factor: DEFAULT_EASE_FACTOR,
            interval: 0,
            repetitions: 0,
            next_review_date: now,
            last_review_date: None,
            last_review_rating: None,
            total_reviews: 0,
            correct_reviews: 0,
            mastery_level: MasteryLevel::Learning,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_date <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_parse() {
        assert_eq!("good".parse::<Rating>(), Ok(Rating::Good));
        assert_eq!("easy".parse::<Rating>(), Ok(Rating::Easy));
        assert_eq!(
            " Easy ".parse::<Rating>(),
            Err(ValidationError::UnknownRating(" Easy ".to_string()))
        );
        assert_eq!(
            "perfect".parse::<Rating>(),
            Err(ValidationError::UnknownRating("perfect".to_string()))
        );
    }

    #[test]
    fn test_rating_serializes_lowercase() {
        let json = serde_json::to_string(&Rating::Again).unwrap();
        assert_eq!(json, "\"again\"");
    }

    #[test]
    fn test_hard_is_not_correct() {
        assert!(!Rating::Again.is_correct());
        assert!(!Rating::Hard.is_correct());
        assert!(Rating::Good.is_correct());
        assert!(Rating::Easy.is_correct());
    }

    #[test]
    fn test_mastery_tiers() {
        assert_eq!(MasteryLevel::classify(0, 0), MasteryLevel::Learning);
        assert_eq!(MasteryLevel::classify(1, 1), MasteryLevel::Young);
        assert_eq!(MasteryLevel::classify(2, 30), MasteryLevel::Young);
        assert_eq!(MasteryLevel::classify(3, 20), MasteryLevel::Mature);
        assert_eq!(MasteryLevel::classify(4, 21), MasteryLevel::Mastered);
    }

    #[test]
    fn test_review_json_field_names() {
        let review = FlashcardReview::fresh(7, "u1", Utc::now());
        let value = serde_json::to_value(&review).unwrap();
        assert_eq!(value["flashcardId"], 7);
        assert_eq!(value["easeFactor"], 2.5);
        assert_eq!(value["masteryLevel"], "learning");
    }
}
