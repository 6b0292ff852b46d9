//! Spaced-repetition scheduler (SM-2 family with four answer buttons).
//!
//! Each rating moves a card's review state forward:
//! - `again`: the streak resets and the card is due immediately, ease drops by 0.2
//! - `hard`: the interval grows by 20% (at least one day), ease drops by 0.15
//! - `good`: the interval is multiplied by the ease factor (first success: 1 day)
//! - `easy`: like `good` with a 1.3 bonus, ease rises by 0.15
//!
//! The ease factor never falls below 1.3 and intervals are capped at
//! `MAX_INTERVAL_DAYS`. Everything here is pure: the caller
//! supplies "now" and persists the returned record.

use super::review::{FlashcardReview, MIN_EASE_FACTOR, MasteryLevel, Rating};
use super::Flashcard;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const HARD_INTERVAL_FACTOR: f64 = 1.2;
const EASY_BONUS: f64 = 1.3;
const AGAIN_EASE_PENALTY: f64 = 0.2;
const HARD_EASE_PENALTY: f64 = 0.15;
const EASY_EASE_BONUS: f64 = 0.15;

/// Upper bound for a scheduled interval (about a century).
pub const MAX_INTERVAL_DAYS: i64 = 36_500;

/// Applies `rating` to the previous review state of a card.
///
/// `previous` is `None` for the first rating of a card; the identity arguments
/// are only used in that case.
pub fn rate(
    previous: Option<&FlashcardReview>,
    flashcard_id: i64,
    user_id: &str,
    rating: Rating,
    now: DateTime<Utc>,
) -> FlashcardReview {
    let prev = match previous {
        Some(review) => review.clone(),
        None => FlashcardReview::fresh(flashcard_id, user_id, now),
    };

    let ef = prev.ease_factor.max(MIN_EASE_FACTOR);
    let interval = prev.interval.clamp(0, MAX_INTERVAL_DAYS);

    let (new_interval, new_repetitions, new_ef) = match rating {
        Rating::Again => (0, 0, ef - AGAIN_EASE_PENALTY),
        Rating::Hard => (
            ((interval as f64 * HARD_INTERVAL_FACTOR).round() as i64).max(1),
            prev.repetitions + 1,
            ef - HARD_EASE_PENALTY,
        ),
        Rating::Good => (grown_interval(interval, ef).round() as i64, prev.repetitions + 1, ef),
        Rating::Easy => (
            (grown_interval(interval, ef) * EASY_BONUS).round() as i64,
            prev.repetitions + 1,
            ef + EASY_EASE_BONUS,
        ),
    };
    let new_ef = new_ef.max(MIN_EASE_FACTOR);
    let new_interval = new_interval.clamp(0, MAX_INTERVAL_DAYS);

    FlashcardReview {
        flashcard_id: prev.flashcard_id,
        user_id: prev.user_id,
        ease_factor: new_ef,
        interval: new_interval,
        repetitions: new_repetitions,
        next_review_date: now + Duration::days(new_interval),
        last_review_date: Some(now),
        last_review_rating: Some(rating),
        total_reviews: prev.total_reviews + 1,
        correct_reviews: prev.correct_reviews + i64::from(rating.is_correct()),
        mastery_level: MasteryLevel::classify(new_repetitions, new_interval),
    }
}

fn grown_interval(interval: i64, ease_factor: f64) -> f64 {
    if interval == 0 {
        1.0
    } else {
        interval as f64 * ease_factor
    }
}

/// Interval (days) each button would produce, in `Rating::ALL` order.
pub fn preview_intervals(previous: Option<&FlashcardReview>, now: DateTime<Utc>) -> [i64; 4] {
    Rating::ALL.map(|rating| rate(previous, 0, "", rating, now).interval)
}

/// Cards without a review record or whose next review date has passed, in input order.
pub fn due_cards<'a>(
    cards: &'a [Flashcard],
    reviews: &[FlashcardReview],
    now: DateTime<Utc>,
) -> Vec<&'a Flashcard> {
    let by_card = index_reviews(reviews);
    cards
        .iter()
        .filter(|card| by_card.get(&card.id).is_none_or(|review| review.is_due(now)))
        .collect()
}

fn index_reviews(reviews: &[FlashcardReview]) -> HashMap<i64, &FlashcardReview> {
    reviews.iter().map(|r| (r.flashcard_id, r)).collect()
}

/// Aggregated progress of one study pack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_cards: usize,
    pub reviewed_cards: usize,
    pub due_cards: usize,
    pub mastered_cards: usize,
    pub learning_cards: usize,
    pub young_cards: usize,
    pub mature_cards: usize,
    pub total_reviews: i64,
    /// Percentage of `good`/`easy` answers, 0 when nothing was reviewed yet.
    pub accuracy: u32,
}

pub fn compute_stats(
    cards: &[Flashcard],
    reviews: &[FlashcardReview],
    now: DateTime<Utc>,
) -> ReviewStats {
    let by_card = index_reviews(reviews);
    let mut stats = ReviewStats {
        total_cards: cards.len(),
        due_cards: due_cards(cards, reviews, now).len(),
        ..Default::default()
    };

    let mut correct = 0i64;
    for review in cards.iter().filter_map(|card| by_card.get(&card.id)) {
        stats.reviewed_cards += 1;
        stats.total_reviews += review.total_reviews;
        correct += review.correct_reviews;
        match MasteryLevel::classify(review.repetitions, review.interval) {
            MasteryLevel::Learning => stats.learning_cards += 1,
            MasteryLevel::Young => stats.young_cards += 1,
            MasteryLevel::Mature => stats.mature_cards += 1,
            MasteryLevel::Mastered => stats.mastered_cards += 1,
        }
    }

    stats.accuracy = accuracy_percent(correct, stats.total_reviews);
    stats
}

fn accuracy_percent(correct: i64, total: i64) -> u32 {
    if total <= 0 {
        return 0;
    }
    let pct = (correct as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u32
}

/// Short label for an interval in days.
pub fn format_interval(days: i64) -> String {
    match days {
        d if d <= 0 => "now".to_string(),
        d if d < 7 => format!("{}d", d),
        d if d < 30 => format!("{}w", d / 7),
        d if d < 365 => format!("{}mo", d / 30),
        d => format!("{}y", d / 365),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn card(id: i64) -> Flashcard {
        Flashcard {
            id,
            study_pack_id: 1,
            front: format!("front {id}"),
            back: format!("back {id}"),
        }
    }

    fn review_for(id: i64, ratings: &[Rating]) -> FlashcardReview {
        let mut review: Option<FlashcardReview> = None;
        for &rating in ratings {
            review = Some(rate(review.as_ref(), id, "u1", rating, now()));
        }
        review.unwrap()
    }

    #[test]
    fn test_interval_is_capped_after_many_easy_ratings() {
        let review = review_for(1, &[Rating::Easy; 40]);
        assert_eq!(review.interval, MAX_INTERVAL_DAYS);
        assert_eq!(review.next_review_date, now() + Duration::days(MAX_INTERVAL_DAYS));
        assert_eq!(review.mastery_level, MasteryLevel::Mastered);

        let previews = preview_intervals(Some(&review), now());
        assert!(previews.iter().all(|&days| days <= MAX_INTERVAL_DAYS));
        assert_eq!(previews[0], 0);
    }

    #[test]
    fn test_oversized_stored_interval_is_clamped() {
        let mut stored = review_for(1, &[Rating::Good]);
        stored.interval = i64::MAX / 2;
        let next = rate(Some(&stored), 1, "u1", Rating::Good, now());
        assert_eq!(next.interval, MAX_INTERVAL_DAYS);
    }

    #[test]
    fn test_first_review_good() {
        let next = rate(None, 1, "u1", Rating::Good, now());
        assert_eq!(next.interval, 1);
        assert_eq!(next.repetitions, 1);
        assert_eq!(next.ease_factor, 2.5);
        assert_eq!(next.total_reviews, 1);
        assert_eq!(next.correct_reviews, 1);
        assert_eq!(next.next_review_date, now() + Duration::days(1));
        assert_eq!(next.mastery_level, MasteryLevel::Young);
    }

    #[test]
    fn test_second_review_good() {
        let first = rate(None, 1, "u1", Rating::Good, now());
        let second = rate(Some(&first), 1, "u1", Rating::Good, now());
        // round(1 * 2.5)
        assert_eq!(second.interval, 3);
        assert_eq!(second.repetitions, 2);
    }

    #[test]
    fn test_again_resets_and_respects_floor() {
        let mut review = review_for(1, &[Rating::Good, Rating::Good, Rating::Easy]);
        for _ in 0..20 {
            review = rate(Some(&review), 1, "u1", Rating::Again, now());
            assert_eq!(review.repetitions, 0);
            assert_eq!(review.interval, 0);
            assert!(review.ease_factor >= MIN_EASE_FACTOR);
            assert_eq!(review.mastery_level, MasteryLevel::Learning);
        }
        assert_eq!(review.ease_factor, MIN_EASE_FACTOR);
        assert!(review.is_due(now()));
    }

    #[test]
    fn test_hard_grows_slowly_and_is_not_correct() {
        let fresh_hard = rate(None, 1, "u1", Rating::Hard, now());
        assert_eq!(fresh_hard.interval, 1);
        assert_eq!(fresh_hard.correct_reviews, 0);
        assert!((fresh_hard.ease_factor - 2.35).abs() < 1e-9);

        let mut review = fresh_hard.clone();
        review.interval = 10;
        let next = rate(Some(&review), 1, "u1", Rating::Hard, now());
        assert_eq!(next.interval, 12);
        assert_eq!(next.total_reviews, 2);
        assert_eq!(next.correct_reviews, 0);
    }

    #[test]
    fn test_easy_applies_bonus() {
        let first = rate(None, 1, "u1", Rating::Easy, now());
        // round(1 * 1.3)
        assert_eq!(first.interval, 1);
        assert!((first.ease_factor - 2.65).abs() < 1e-9);

        let second = rate(Some(&first), 1, "u1", Rating::Easy, now());
        // round(1 * 2.65 * 1.3) = round(3.445)
        assert_eq!(second.interval, 3);
    }

    #[test]
    fn test_successful_ratings_never_shrink_interval() {
        for pattern in [[Rating::Good; 8], [Rating::Easy; 8]] {
            let mut review: Option<FlashcardReview> = None;
            let mut last_interval = 0;
            for (n, &rating) in pattern.iter().enumerate() {
                let next = rate(review.as_ref(), 1, "u1", rating, now());
                assert!(next.interval >= last_interval);
                assert_eq!(next.repetitions, n as i64 + 1);
                last_interval = next.interval;
                review = Some(next);
            }
        }
    }

    #[test]
    fn test_same_input_same_output() {
        let first = rate(None, 1, "u1", Rating::Good, now());
        let a = rate(Some(&first), 1, "u1", Rating::Easy, now());
        let b = rate(Some(&first), 1, "u1", Rating::Easy, now());
        assert_eq!(a, b);
    }

    #[test]
    fn test_unreviewed_cards_always_due() {
        let cards = vec![card(1), card(2), card(3)];
        let reviews = vec![review_for(2, &[Rating::Good, Rating::Good])];

        let long_ago = Utc.with_ymd_and_hms(1990, 1, 1, 0, 0, 0).unwrap();
        for at in [long_ago, now()] {
            let due: Vec<i64> = due_cards(&cards, &reviews, at).iter().map(|c| c.id).collect();
            assert_eq!(due, vec![1, 3]);
        }

        let later = now() + Duration::days(3);
        let due: Vec<i64> = due_cards(&cards, &reviews, later).iter().map(|c| c.id).collect();
        assert_eq!(due, vec![1, 2, 3]);
    }

    #[test]
    fn test_stats_without_reviews() {
        let cards = vec![card(1), card(2)];
        let stats = compute_stats(&cards, &[], now());
        assert_eq!(stats.accuracy, 0);
        assert_eq!(stats.due_cards, 2);
        assert_eq!(stats.reviewed_cards, 0);
    }

    #[test]
    fn test_stats_tiers_and_accuracy() {
        let cards = vec![card(1), card(2), card(3), card(4)];
        let mut mastered = review_for(3, &[Rating::Good, Rating::Good, Rating::Good]);
        mastered.interval = 30;
        mastered.repetitions = 5;
        let reviews = vec![
            review_for(1, &[Rating::Again]),
            review_for(2, &[Rating::Good, Rating::Hard]),
            mastered,
        ];

        let stats = compute_stats(&cards, &reviews, now());
        assert_eq!(stats.total_cards, 4);
        assert_eq!(stats.reviewed_cards, 3);
        assert_eq!(stats.learning_cards, 1);
        assert_eq!(stats.young_cards, 1);
        assert_eq!(stats.mature_cards, 0);
        assert_eq!(stats.mastered_cards, 1);
        assert_eq!(
            stats.learning_cards + stats.young_cards + stats.mature_cards + stats.mastered_cards,
            stats.reviewed_cards
        );
        // card 1 (again) is due now, card 4 was never reviewed
        assert_eq!(stats.due_cards, 2);
        // 4 correct out of 6 ratings
        assert_eq!(stats.total_reviews, 6);
        assert_eq!(stats.accuracy, 67);
    }

    #[test]
    fn test_preview_intervals() {
        assert_eq!(preview_intervals(None, now()), [0, 1, 1, 1]);
        let mut review = review_for(1, &[Rating::Good]);
        review.interval = 4;
        assert_eq!(preview_intervals(Some(&review), now()), [0, 5, 10, 13]);
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(0), "now");
        assert_eq!(format_interval(1), "1d");
        assert_eq!(format_interval(14), "2w");
        assert_eq!(format_interval(90), "3mo");
        assert_eq!(format_interval(730), "2y");
    }
}
