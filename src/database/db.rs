//! Database operations for the study application
//!
//! Handles SQLite schema setup, CRUD for study packs, flashcards and highlights,
//! and storage of per-user flashcard review state.

use crate::error::Result;
use crate::models::{
    Flashcard, FlashcardReview, Highlight, HighlightColor, MasteryLevel, Rating, StoredCoordinates,
    StudyPack,
};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::str::FromStr;

/// Opens (or creates) the database file and makes sure all tables exist.
pub fn init_database(path: &str) -> Result<Connection> {
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    log::info!("Opened study database at {}", path);
    Ok(conn)
}

/// Creates the tables on an already open connection.
///
/// Reviews and highlights are removed together with their study pack.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS study_packs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS flashcards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            study_pack_id INTEGER NOT NULL,
            front TEXT NOT NULL,
            back TEXT NOT NULL,
            FOREIGN KEY (study_pack_id) REFERENCES study_packs(id) ON DELETE CASCADE,
            UNIQUE(study_pack_id, front)
        );

        CREATE TABLE IF NOT EXISTS flashcard_reviews (
            flashcard_id INTEGER NOT NULL,
            user_id TEXT NOT NULL,
            ease_factor REAL NOT NULL DEFAULT 2.5,
            interval_days INTEGER NOT NULL DEFAULT 0,
            repetitions INTEGER NOT NULL DEFAULT 0,
            next_review_date TEXT NOT NULL,
            last_review_date TEXT,
            last_review_rating TEXT,
            total_reviews INTEGER NOT NULL DEFAULT 0,
            correct_reviews INTEGER NOT NULL DEFAULT 0,
            mastery_level TEXT NOT NULL DEFAULT 'learning',
            PRIMARY KEY (flashcard_id, user_id),
            FOREIGN KEY (flashcard_id) REFERENCES flashcards(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS highlights (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            study_pack_id INTEGER NOT NULL,
            page_number INTEGER NOT NULL,
            coordinates TEXT NOT NULL,
            color TEXT NOT NULL,
            text TEXT NOT NULL,
            note TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY (study_pack_id) REFERENCES study_packs(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        INSERT OR IGNORE INTO app_state (key, value) VALUES ('day_offset', '0');",
    )?;
    Ok(())
}

pub(crate) fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn parse_timestamp(column: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn parse_column<T: FromStr>(column: usize, value: &str) -> rusqlite::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

// ==================== App state ====================

pub fn get_state(key: &str, conn: &Connection) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM app_state WHERE key = ?1", params![key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}

pub fn set_state(key: &str, value: &str, conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT INTO app_state (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}

/// Current date as seen by the scheduler: wall clock plus the simulated day offset.
pub fn get_current_date(conn: &Connection) -> Result<DateTime<Utc>> {
    let offset = get_state("day_offset", conn)?
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(0);
    Ok(Utc::now() + Duration::days(offset))
}

/// Moves the simulated date one day forward (for trying out the schedule)
pub fn advance_day(conn: &Connection) -> Result<()> {
    conn.execute(
        "UPDATE app_state SET value = CAST(value AS INTEGER) + 1 WHERE key = 'day_offset'",
        (),
    )?;
    Ok(())
}

// ==================== Study packs and flashcards ====================

/// Creates a new study pack and returns its id
pub fn new_study_pack(name: &str, conn: &Connection) -> Result<i64> {
    conn.execute("INSERT INTO study_packs (name) VALUES (?1)", params![name])?;
    let id = conn.last_insert_rowid();
    log::info!("Study pack '{}' created with id {}", name, id);
    Ok(id)
}

pub fn get_study_pack_name(study_pack_id: i64, conn: &Connection) -> Result<Option<String>> {
    let name = conn
        .query_row(
            "SELECT name FROM study_packs WHERE id = ?1",
            params![study_pack_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(name)
}

pub fn find_study_pack_by_name(name: &str, conn: &Connection) -> Result<Option<i64>> {
    let id = conn
        .query_row("SELECT id FROM study_packs WHERE name = ?1", params![name], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(id)
}

/// Deletes a study pack; its flashcards, reviews and highlights go with it.
pub fn delete_study_pack(study_pack_id: i64, conn: &Connection) -> Result<usize> {
    let removed = conn.execute("DELETE FROM study_packs WHERE id = ?1", params![study_pack_id])?;
    Ok(removed)
}

/// Adds a flashcard to a study pack and returns its id.
///
/// A card with the same front in the same pack is kept as is.
pub fn add_flashcard(study_pack_id: i64, front: &str, back: &str, conn: &Connection) -> Result<i64> {
    conn.execute(
        "INSERT OR IGNORE INTO flashcards (study_pack_id, front, back) VALUES (?1, ?2, ?3)",
        params![study_pack_id, front, back],
    )?;

    let flashcard_id: i64 = conn.query_row(
        "SELECT id FROM flashcards WHERE study_pack_id = ?1 AND front = ?2",
        params![study_pack_id, front],
        |row| row.get(0),
    )?;

    Ok(flashcard_id)
}

fn flashcard_from_row(row: &Row) -> rusqlite::Result<Flashcard> {
    Ok(Flashcard {
        id: row.get(0)?,
        study_pack_id: row.get(1)?,
        front: row.get(2)?,
        back: row.get(3)?,
    })
}

pub fn get_flashcard(flashcard_id: i64, conn: &Connection) -> Result<Option<Flashcard>> {
    let card = conn
        .query_row(
            "SELECT id, study_pack_id, front, back FROM flashcards WHERE id = ?1",
            params![flashcard_id],
            flashcard_from_row,
        )
        .optional()?;
    Ok(card)
}

pub fn get_flashcards_for_pack(study_pack_id: i64, conn: &Connection) -> Result<Vec<Flashcard>> {
    let mut stmt = conn.prepare(
        "SELECT id, study_pack_id, front, back FROM flashcards WHERE study_pack_id = ?1 ORDER BY id",
    )?;
    let cards = stmt
        .query_map(params![study_pack_id], flashcard_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(cards)
}

/// Loads every study pack with its flashcards
pub fn load_all_study_packs(conn: &Connection) -> Result<Vec<StudyPack>> {
    let mut stmt = conn.prepare("SELECT id, name FROM study_packs ORDER BY id")?;
    let packs = stmt
        .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    packs
        .into_iter()
        .map(|(id, name)| {
            Ok(StudyPack {
                id,
                name,
                flashcards: get_flashcards_for_pack(id, conn)?,
            })
        })
        .collect()
}

// ==================== Flashcard reviews ====================

const REVIEW_COLUMNS: &str = "flashcard_id, user_id, ease_factor, interval_days, repetitions,
    next_review_date, last_review_date, last_review_rating, total_reviews, correct_reviews,
    mastery_level";

fn review_from_row(row: &Row) -> rusqlite::Result<FlashcardReview> {
    let next_review: String = row.get(5)?;
    let last_review: Option<String> = row.get(6)?;
    let last_rating: Option<String> = row.get(7)?;
    let mastery: String = row.get(10)?;

    Ok(FlashcardReview {
        flashcard_id: row.get(0)?,
        user_id: row.get(1)?,
        ease_factor: row.get(2)?,
        interval: row.get(3)?,
        repetitions: row.get(4)?,
        next_review_date: parse_timestamp(5, &next_review)?,
        last_review_date: last_review.map(|v| parse_timestamp(6, &v)).transpose()?,
        last_review_rating: last_rating
            .map(|v| parse_column::<Rating>(7, &v))
            .transpose()?,
        total_reviews: row.get(8)?,
        correct_reviews: row.get(9)?,
        mastery_level: MasteryLevel::from_str(&mastery).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(10, rusqlite::types::Type::Text, e.into())
        })?,
    })
}

pub fn get_review(flashcard_id: i64, user_id: &str, conn: &Connection) -> Result<Option<FlashcardReview>> {
    let review = conn
        .query_row(
            &format!("SELECT {REVIEW_COLUMNS} FROM flashcard_reviews WHERE flashcard_id = ?1 AND user_id = ?2"),
            params![flashcard_id, user_id],
            review_from_row,
        )
        .optional()?;
    Ok(review)
}

/// Inserts the first review of a card or updates the existing row in place.
pub fn upsert_review(review: &FlashcardReview, conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT INTO flashcard_reviews (flashcard_id, user_id, ease_factor, interval_days, repetitions,
            next_review_date, last_review_date, last_review_rating, total_reviews, correct_reviews,
            mastery_level)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
         ON CONFLICT(flashcard_id, user_id) DO UPDATE SET
            ease_factor = excluded.ease_factor,
            interval_days = excluded.interval_days,
            repetitions = excluded.repetitions,
            next_review_date = excluded.next_review_date,
            last_review_date = excluded.last_review_date,
            last_review_rating = excluded.last_review_rating,
            total_reviews = excluded.total_reviews,
            correct_reviews = excluded.correct_reviews,
            mastery_level = excluded.mastery_level",
        params![
            review.flashcard_id,
            review.user_id,
            review.ease_factor,
            review.interval,
            review.repetitions,
            format_timestamp(review.next_review_date),
            review.last_review_date.map(format_timestamp),
            review.last_review_rating.map(|r| r.as_str()),
            review.total_reviews,
            review.correct_reviews,
            review.mastery_level.as_str(),
        ],
    )?;
    Ok(())
}

/// All review records of one user for the cards of a study pack
pub fn get_reviews_for_pack(
    study_pack_id: i64,
    user_id: &str,
    conn: &Connection,
) -> Result<Vec<FlashcardReview>> {
    let mut stmt = conn.prepare(
        "SELECT r.flashcard_id, r.user_id, r.ease_factor, r.interval_days, r.repetitions,
                r.next_review_date, r.last_review_date, r.last_review_rating, r.total_reviews,
                r.correct_reviews, r.mastery_level
         FROM flashcard_reviews r
         JOIN flashcards f ON f.id = r.flashcard_id
         WHERE f.study_pack_id = ?1 AND r.user_id = ?2
         ORDER BY r.flashcard_id",
    )?;
    let reviews = stmt
        .query_map(params![study_pack_id, user_id], review_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(reviews)
}

// ==================== Highlights ====================

const HIGHLIGHT_COLUMNS: &str =
    "id, study_pack_id, page_number, coordinates, color, text, note, created_at";

fn highlight_from_row(row: &Row) -> rusqlite::Result<Highlight> {
    let coordinates: String = row.get(3)?;
    let color: String = row.get(4)?;
    let created_at: String = row.get(7)?;

    Ok(Highlight {
        id: row.get(0)?,
        study_pack_id: row.get(1)?,
        page_number: row.get(2)?,
        coordinates: serde_json::from_str::<StoredCoordinates>(&coordinates).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?,
        color: parse_column::<HighlightColor>(4, &color)?,
        text: row.get(5)?,
        note: row.get(6)?,
        created_at: parse_timestamp(7, &created_at)?,
    })
}

/// Stores a new highlight and returns it with its assigned id.
pub fn insert_highlight(
    study_pack_id: i64,
    page_number: u32,
    coordinates: &StoredCoordinates,
    color: HighlightColor,
    text: &str,
    created_at: DateTime<Utc>,
    conn: &Connection,
) -> Result<Highlight> {
    conn.execute(
        "INSERT INTO highlights (study_pack_id, page_number, coordinates, color, text, note, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6)",
        params![
            study_pack_id,
            page_number,
            serde_json::to_string(coordinates)?,
            color.as_str(),
            text,
            format_timestamp(created_at),
        ],
    )?;

    Ok(Highlight {
        id: conn.last_insert_rowid(),
        study_pack_id,
        page_number,
        coordinates: coordinates.clone(),
        color,
        text: text.to_string(),
        note: None,
        created_at,
    })
}

pub fn get_highlight(highlight_id: i64, conn: &Connection) -> Result<Option<Highlight>> {
    let highlight = conn
        .query_row(
            &format!("SELECT {HIGHLIGHT_COLUMNS} FROM highlights WHERE id = ?1"),
            params![highlight_id],
            highlight_from_row,
        )
        .optional()?;
    Ok(highlight)
}

pub fn get_highlights_for_pack(study_pack_id: i64, conn: &Connection) -> Result<Vec<Highlight>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {HIGHLIGHT_COLUMNS} FROM highlights WHERE study_pack_id = ?1 ORDER BY page_number, id"
    ))?;
    let highlights = stmt
        .query_map(params![study_pack_id], highlight_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(highlights)
}

/// Replaces the note of a highlight. Returns the number of rows touched.
pub fn update_highlight_note(highlight_id: i64, note: Option<&str>, conn: &Connection) -> Result<usize> {
    let updated = conn.execute(
        "UPDATE highlights SET note = ?1 WHERE id = ?2",
        params![note, highlight_id],
    )?;
    Ok(updated)
}

pub fn delete_highlight(highlight_id: i64, conn: &Connection) -> Result<usize> {
    let removed = conn.execute("DELETE FROM highlights WHERE id = ?1", params![highlight_id])?;
    Ok(removed)
}
