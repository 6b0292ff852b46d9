//! Request handlers for flashcard reviews and highlights.
//!
//! Each handler takes a typed request body, validates it, runs the pure core
//! and persists the result. Bodies and responses serialize with camelCase keys.

use crate::database::db;
use crate::error::{Result, StudyError, ValidationError};
use crate::models::anchor::derive_percentages;
use crate::models::highlight::{filter_highlights, quiz_source_text, validate_selection_text};
use crate::models::scheduler::{self, ReviewStats};
use crate::models::{FlashcardReview, Highlight, HighlightColor, Rating, StoredCoordinates};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReviewRequest {
    pub study_pack_id: i64,
    pub flashcard_id: i64,
    pub rating: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextReview {
    pub interval: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReviewResponse {
    pub review: FlashcardReview,
    pub next_review: NextReview,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewListResponse {
    pub reviews: Vec<FlashcardReview>,
    pub due_flashcard_ids: Vec<i64>,
    pub stats: ReviewStats,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHighlightRequest {
    pub study_pack_id: i64,
    pub page_number: u32,
    pub coordinates: StoredCoordinates,
    pub color: String,
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHighlightRequest {
    #[serde(default)]
    pub note: Option<String>,
}

/// Source material handed to the quiz generator for one highlight color.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRequest {
    pub study_pack_id: i64,
    pub color: HighlightColor,
    pub highlight_count: usize,
    pub source_text: String,
}

fn ensure_study_pack(study_pack_id: i64, conn: &Connection) -> Result<()> {
    db::get_study_pack_name(study_pack_id, conn)?
        .map(|_| ())
        .ok_or_else(|| StudyError::NotFound(format!("study pack {}", study_pack_id)))
}

/// Rates one flashcard and stores the updated review record.
///
/// The read-modify-write runs in a single transaction so two ratings of the
/// same card cannot interleave.
pub fn submit_review(
    conn: &Connection,
    user_id: &str,
    request: &SubmitReviewRequest,
    now: DateTime<Utc>,
) -> Result<SubmitReviewResponse> {
    let rating: Rating = request.rating.parse()?;

    let tx = conn.unchecked_transaction()?;
    let card = db::get_flashcard(request.flashcard_id, &tx)?
        .filter(|card| card.study_pack_id == request.study_pack_id)
        .ok_or_else(|| {
            StudyError::NotFound(format!(
                "flashcard {} in study pack {}",
                request.flashcard_id, request.study_pack_id
            ))
        })?;

    let previous = db::get_review(card.id, user_id, &tx)?;
    let review = scheduler::rate(previous.as_ref(), card.id, user_id, rating, now);
    db::upsert_review(&review, &tx)?;
    tx.commit()?;

    log::debug!(
        "Card {} rated {} by {}: interval {}d, ease {:.2}",
        card.id,
        rating,
        user_id,
        review.interval,
        review.ease_factor
    );

    Ok(SubmitReviewResponse {
        next_review: NextReview {
            interval: review.interval,
        },
        review,
    })
}

/// Review records of a pack together with the due set and aggregated stats.
pub fn list_reviews(
    conn: &Connection,
    user_id: &str,
    study_pack_id: i64,
    now: DateTime<Utc>,
) -> Result<ReviewListResponse> {
    ensure_study_pack(study_pack_id, conn)?;
    let cards = db::get_flashcards_for_pack(study_pack_id, conn)?;
    let reviews = db::get_reviews_for_pack(study_pack_id, user_id, conn)?;

    let due_flashcard_ids = scheduler::due_cards(&cards, &reviews, now)
        .iter()
        .map(|card| card.id)
        .collect();
    let stats = scheduler::compute_stats(&cards, &reviews, now);

    Ok(ReviewListResponse {
        reviews,
        due_flashcard_ids,
        stats,
    })
}

/// Validates and stores a new highlight.
///
/// Percentages are always stored; for legacy pixel-only bodies they are
/// derived from the recorded page size.
pub fn create_highlight(
    conn: &Connection,
    request: &CreateHighlightRequest,
    now: DateTime<Utc>,
) -> Result<Highlight> {
    let text = validate_selection_text(&request.text)?;
    if request.page_number == 0 {
        return Err(ValidationError::InvalidPageNumber(request.page_number).into());
    }
    let color: HighlightColor = request.color.parse()?;

    let coords = derive_percentages(&request.coordinates).map_err(ValidationError::MissingGeometry)?;
    coords.validate()?;
    if !coords.has_area() {
        log::warn!(
            "Rejecting zero-area highlight on page {} of pack {}",
            request.page_number,
            request.study_pack_id
        );
        return Err(ValidationError::ZeroAreaSelection.into());
    }

    ensure_study_pack(request.study_pack_id, conn)?;

    let stored = StoredCoordinates {
        x_percent: Some(coords.x_percent),
        y_percent: Some(coords.y_percent),
        width_percent: Some(coords.width_percent),
        height_percent: Some(coords.height_percent),
        ..request.coordinates.clone()
    };
    let highlight = db::insert_highlight(
        request.study_pack_id,
        request.page_number,
        &stored,
        color,
        text,
        now,
        conn,
    )?;
    log::info!(
        "Created {} highlight {} on page {}",
        color,
        highlight.id,
        highlight.page_number
    );
    Ok(highlight)
}

/// Replaces the note of a highlight. Geometry and text never change after creation.
pub fn update_highlight_note(
    conn: &Connection,
    highlight_id: i64,
    request: &UpdateHighlightRequest,
) -> Result<Highlight> {
    let note = request
        .note
        .as_deref()
        .map(str::trim)
        .filter(|note| !note.is_empty());

    if db::update_highlight_note(highlight_id, note, conn)? == 0 {
        return Err(StudyError::NotFound(format!("highlight {}", highlight_id)));
    }
    db::get_highlight(highlight_id, conn)?
        .ok_or_else(|| StudyError::NotFound(format!("highlight {}", highlight_id)))
}

pub fn delete_highlight(conn: &Connection, highlight_id: i64) -> Result<()> {
    if db::delete_highlight(highlight_id, conn)? == 0 {
        return Err(StudyError::NotFound(format!("highlight {}", highlight_id)));
    }
    log::info!("Deleted highlight {}", highlight_id);
    Ok(())
}

pub fn list_highlights(
    conn: &Connection,
    study_pack_id: i64,
    color: Option<HighlightColor>,
    page_number: Option<u32>,
) -> Result<Vec<Highlight>> {
    ensure_study_pack(study_pack_id, conn)?;
    let all = db::get_highlights_for_pack(study_pack_id, conn)?;
    Ok(filter_highlights(&all, color, page_number)
        .into_iter()
        .cloned()
        .collect())
}

/// Collects the highlights of one color into a quiz-generation request.
pub fn quiz_request(conn: &Connection, study_pack_id: i64, color: HighlightColor) -> Result<QuizRequest> {
    let highlights = list_highlights(conn, study_pack_id, Some(color), None)?;
    if highlights.is_empty() {
        return Err(StudyError::NotFound(format!(
            "{} highlights in study pack {}",
            color, study_pack_id
        )));
    }
    Ok(QuizRequest {
        study_pack_id,
        color,
        highlight_count: highlights.len(),
        source_text: quiz_source_text(&highlights, color),
    })
}
