//! Review session for one study pack.
//! Walks through the due cards in rounds; cards rated `again` come back in the next round.

use super::{Flashcard, FlashcardReview, Rating};
use crate::error::Result;
use crate::handlers::{self, SubmitReviewRequest};
use chrono::{DateTime, Utc};
use rusqlite::Connection;

/// Where the user is on the current card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Question,
    Answer,
    Completed,
}

pub struct SessionCard {
    pub flashcard: Flashcard,
    pub review: Option<FlashcardReview>,
    /// Rated something other than `again` during this session.
    pub passed: bool,
}

pub struct ReviewSession {
    pub study_pack_id: i64,
    pub pack_name: String,
    pub cards: Vec<SessionCard>,
    pub current_round_cards: Vec<usize>,
    pub current_index: usize,
    pub phase: SessionPhase,
    pub round_number: usize,
}

impl ReviewSession {
    /// Starts a session over the cards that are due, each with its review record if any.
    pub fn new(
        study_pack_id: i64,
        pack_name: String,
        due: Vec<(Flashcard, Option<FlashcardReview>)>,
    ) -> Self {
        let cards: Vec<SessionCard> = due
            .into_iter()
            .map(|(flashcard, review)| SessionCard {
                flashcard,
                review,
                passed: false,
            })
            .collect();
        let phase = if cards.is_empty() {
            SessionPhase::Completed
        } else {
            SessionPhase::Question
        };

        Self {
            study_pack_id,
            pack_name,
            current_round_cards: (0..cards.len()).collect(),
            cards,
            current_index: 0,
            phase,
            round_number: 1,
        }
    }

    pub fn current_card(&self) -> Option<&SessionCard> {
        if self.phase == SessionPhase::Completed {
            return None;
        }
        self.current_round_cards
            .get(self.current_index)
            .and_then(|&idx| self.cards.get(idx))
    }

    pub fn reveal_answer(&mut self) {
        if self.phase == SessionPhase::Question {
            self.phase = SessionPhase::Answer;
        }
    }

    /// Stores a rating of the current card through the review handler and moves on.
    pub fn grade_current_card(
        &mut self,
        conn: &Connection,
        user_id: &str,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if self.phase != SessionPhase::Answer {
            return Ok(());
        }
        let Some(card) = self.current_card() else {
            return Ok(());
        };
        let request = SubmitReviewRequest {
            study_pack_id: self.study_pack_id,
            flashcard_id: card.flashcard.id,
            rating: rating.to_string(),
        };
        let response = handlers::submit_review(conn, user_id, &request, now)?;
        self.apply_review(response.review);
        Ok(())
    }

    /// Records the stored outcome of the current card and advances the session.
    pub fn apply_review(&mut self, review: FlashcardReview) {
        if self.phase != SessionPhase::Answer {
            return;
        }
        let Some(&idx) = self.current_round_cards.get(self.current_index) else {
            return;
        };
        if let Some(card) = self.cards.get_mut(idx) {
            card.passed = review.last_review_rating != Some(Rating::Again);
            card.review = Some(review);
        }
        self.next_card();
    }

    fn next_card(&mut self) {
        if self.current_index + 1 < self.current_round_cards.len() {
            self.current_index += 1;
            self.phase = SessionPhase::Question;
        } else {
            self.start_next_round();
        }
    }

    fn start_next_round(&mut self) {
        let failed: Vec<usize> = self
            .current_round_cards
            .iter()
            .copied()
            .filter(|&idx| self.cards.get(idx).is_some_and(|card| !card.passed))
            .collect();

        if failed.is_empty() {
            self.phase = SessionPhase::Completed;
            return;
        }

        self.current_round_cards = failed;
        self.current_index = 0;
        self.phase = SessionPhase::Question;
        self.round_number += 1;
    }

    pub fn passed_count(&self) -> usize {
        self.current_round_cards
            .iter()
            .filter(|&&idx| self.cards.get(idx).is_some_and(|card| card.passed))
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.current_round_cards.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count() - self.passed_count()
    }

    pub fn is_completed(&self) -> bool {
        self.phase == SessionPhase::Completed
    }

    pub fn phase_message(&self) -> String {
        if self.round_number == 1 {
            format!("Round {}: {} cards", self.round_number, self.total_count())
        } else {
            format!(
                "Round {} (Again): {} cards to retry",
                self.round_number,
                self.total_count()
            )
        }
    }
}
