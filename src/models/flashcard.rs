//! Flashcard generated from an uploaded document: a prompt on the front, the answer on the back.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub study_pack_id: i64,
    pub front: String,
    pub back: String,
}

impl Flashcard {
    pub fn new(front: &str, back: &str) -> Self {
        Self {
            id: 0,
            study_pack_id: 0,
            front: front.to_string(),
            back: back.to_string(),
        }
    }
}
