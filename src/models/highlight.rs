//! Highlights drawn over rendered document pages.
use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightColor {
    Yellow,
    Green,
    Blue,
    Pink,
    Red,
}

impl HighlightColor {
    pub const PALETTE: [HighlightColor; 5] = [
        HighlightColor::Yellow,
        HighlightColor::Green,
        HighlightColor::Blue,
        HighlightColor::Pink,
        HighlightColor::Red,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HighlightColor::Yellow => "yellow",
            HighlightColor::Green => "green",
            HighlightColor::Blue => "blue",
            HighlightColor::Pink => "pink",
            HighlightColor::Red => "red",
        }
    }

    /// RGB used when painting the highlight.
    pub fn rgb(self) -> [u8; 3] {
        match self {
            HighlightColor::Yellow => [253, 224, 71],
            HighlightColor::Green => [134, 239, 172],
            HighlightColor::Blue => [147, 197, 253],
            HighlightColor::Pink => [249, 168, 212],
            HighlightColor::Red => [252, 165, 165],
        }
    }
}

impl fmt::Display for HighlightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HighlightColor {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HighlightColor::PALETTE
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownColor(s.to_string()))
    }
}

/// Position of a highlight as percentages of the page box. Independent of zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub x_percent: f64,
    pub y_percent: f64,
    pub width_percent: f64,
    pub height_percent: f64,
}

impl Coordinates {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("xPercent", self.x_percent),
            ("yPercent", self.y_percent),
            ("widthPercent", self.width_percent),
            ("heightPercent", self.height_percent),
        ];
        for (field, value) in fields {
            if !(0.0..=100.0).contains(&value) {
                return Err(ValidationError::PercentOutOfRange { field, value });
            }
        }
        Ok(())
    }

    pub fn has_area(&self) -> bool {
        self.width_percent > 0.0 && self.height_percent > 0.0
    }
}

/// Coordinates as stored and sent over the wire.
///
/// Percentages are authoritative. Older records only carry pixel values
/// together with the page size they were measured against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCoordinates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_height: Option<f64>,
}

impl From<Coordinates> for StoredCoordinates {
    fn from(c: Coordinates) -> Self {
        Self {
            x_percent: Some(c.x_percent),
            y_percent: Some(c.y_percent),
            width_percent: Some(c.width_percent),
            height_percent: Some(c.height_percent),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub id: i64,
    pub study_pack_id: i64,
    pub page_number: u32,
    pub coordinates: StoredCoordinates,
    pub color: HighlightColor,
    pub text: String,
    #[serde(default)]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Trims the selected text, rejecting selections with nothing in them.
pub fn validate_selection_text(text: &str) -> Result<&str, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptySelection);
    }
    Ok(trimmed)
}

pub fn group_by_color(highlights: &[Highlight]) -> BTreeMap<HighlightColor, Vec<&Highlight>> {
    let mut groups: BTreeMap<HighlightColor, Vec<&Highlight>> = BTreeMap::new();
    for h in highlights {
        groups.entry(h.color).or_default().push(h);
    }
    groups
}

pub fn filter_highlights(
    highlights: &[Highlight],
    color: Option<HighlightColor>,
    page_number: Option<u32>,
) -> Vec<&Highlight> {
    highlights
        .iter()
        .filter(|h| color.is_none_or(|c| h.color == c))
        .filter(|h| page_number.is_none_or(|p| h.page_number == p))
        .collect()
}

/// Text of every highlight of one color in page order, used as the source
/// material of a "quiz me on this color" request.
pub fn quiz_source_text(highlights: &[Highlight], color: HighlightColor) -> String {
    let mut selected = filter_highlights(highlights, Some(color), None);
    selected.sort_by_key(|h| (h.page_number, h.id));
    selected
        .iter()
        .map(|h| match &h.note {
            Some(note) if !note.trim().is_empty() => format!("{} (note: {})", h.text, note.trim()),
            _ => h.text.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn highlight(id: i64, page: u32, color: HighlightColor, text: &str) -> Highlight {
        Highlight {
            id,
            study_pack_id: 1,
            page_number: page,
            coordinates: StoredCoordinates::default(),
            color,
            text: text.to_string(),
            note: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_group_by_color() {
        let list = vec![
            highlight(1, 1, HighlightColor::Yellow, "a"),
            highlight(2, 2, HighlightColor::Yellow, "b"),
            highlight(3, 1, HighlightColor::Blue, "c"),
        ];
        let groups = group_by_color(&list);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&HighlightColor::Yellow].len(), 2);
        assert_eq!(groups[&HighlightColor::Blue].len(), 1);
        assert!(!groups.contains_key(&HighlightColor::Red));
    }

    #[test]
    fn test_filter_by_color_and_page() {
        let list = vec![
            highlight(1, 1, HighlightColor::Yellow, "a"),
            highlight(2, 2, HighlightColor::Yellow, "b"),
            highlight(3, 1, HighlightColor::Blue, "c"),
        ];
        let ids = |v: Vec<&Highlight>| v.iter().map(|h| h.id).collect::<Vec<_>>();
        assert_eq!(ids(filter_highlights(&list, Some(HighlightColor::Yellow), None)), vec![1, 2]);
        assert_eq!(ids(filter_highlights(&list, None, Some(1))), vec![1, 3]);
        assert_eq!(ids(filter_highlights(&list, Some(HighlightColor::Blue), Some(2))), Vec::<i64>::new());
        assert_eq!(filter_highlights(&list, None, None).len(), 3);
    }

    #[test]
    fn test_quiz_source_text_orders_by_page() {
        let mut list = vec![
            highlight(5, 3, HighlightColor::Green, "third"),
            highlight(2, 1, HighlightColor::Green, "first"),
            highlight(9, 2, HighlightColor::Red, "ignored"),
        ];
        list[0].note = Some("check the figure".to_string());
        assert_eq!(
            quiz_source_text(&list, HighlightColor::Green),
            "first\nthird (note: check the figure)"
        );
    }

    #[test]
    fn test_empty_selection_rejected() {
        assert_eq!(validate_selection_text("   \n"), Err(ValidationError::EmptySelection));
        assert_eq!(validate_selection_text("  cell wall "), Ok("cell wall"));
    }

    #[test]
    fn test_color_parse() {
        assert_eq!("pink".parse::<HighlightColor>(), Ok(HighlightColor::Pink));
        assert!("Pink".parse::<HighlightColor>().is_err());
        assert!("orange".parse::<HighlightColor>().is_err());
    }

    #[test]
    fn test_coordinates_validate() {
        let ok = Coordinates { x_percent: 0.0, y_percent: 100.0, width_percent: 10.0, height_percent: 2.0 };
        assert!(ok.validate().is_ok());
        let bad = Coordinates { x_percent: 101.0, ..ok };
        assert!(matches!(
            bad.validate(),
            Err(ValidationError::PercentOutOfRange { field: "xPercent", .. })
        ));
    }

    #[test]
    fn test_legacy_record_deserializes() {
        let stored: StoredCoordinates = serde_json::from_str(
            r#"{"x": 10, "y": 20, "width": 50, "height": 12, "pageWidth": 600, "pageHeight": 800}"#,
        )
        .unwrap();
        assert_eq!(stored.x_percent, None);
        assert_eq!(stored.page_width, Some(600.0));
    }
}
