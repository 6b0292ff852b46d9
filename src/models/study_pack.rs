//! A study pack is the set of flashcards generated from one upload
use super::Flashcard;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPack {
    #[serde(default)]
    pub id: i64,
    pub name: String,
    pub flashcards: Vec<Flashcard>,
}
