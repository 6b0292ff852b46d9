//! Highlight anchoring: mapping between on-screen pixel rectangles and
//! page-relative percentages.
//!
//! A selection is stored as percentages of the rendered page box, so the same
//! record lands on the same words at any zoom level.

use super::highlight::{Coordinates, Highlight, HighlightColor, StoredCoordinates};
use crate::error::{DataIntegrityWarning, ValidationError};
use serde::{Deserialize, Serialize};

/// Slack for floating-point noise at the page edges.
const EDGE_EPSILON: f64 = 1e-9;

/// Axis-aligned rectangle in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }
}

fn percent_of(value: f64, total: f64, field: &'static str) -> Result<f64, ValidationError> {
    let pct = value / total * 100.0;
    if !pct.is_finite() || pct < -EDGE_EPSILON || pct > 100.0 + EDGE_EPSILON {
        return Err(ValidationError::PercentOutOfRange { field, value: pct });
    }
    Ok(pct.clamp(0.0, 100.0))
}

fn ensure_laid_out(page: &Rect) -> Result<(), ValidationError> {
    if page.width <= 0.0 || page.height <= 0.0 {
        return Err(ValidationError::PageNotLaidOut {
            width: page.width,
            height: page.height,
        });
    }
    Ok(())
}

/// Converts a selection box into page-relative percentages.
pub fn anchor(selection: &Rect, page: &Rect) -> Result<Coordinates, ValidationError> {
    ensure_laid_out(page)?;

    let coords = Coordinates {
        x_percent: percent_of(selection.left - page.left, page.width, "xPercent")?,
        y_percent: percent_of(selection.top - page.top, page.height, "yPercent")?,
        width_percent: percent_of(selection.width, page.width, "widthPercent")?,
        height_percent: percent_of(selection.height, page.height, "heightPercent")?,
    };

    if !coords.has_area() {
        log::warn!(
            "Selection {:?} on page {:?} has zero area, was the page laid out?",
            selection,
            page
        );
        return Err(ValidationError::ZeroAreaSelection);
    }
    Ok(coords)
}

/// Like [`anchor`], but also keeps the pixel values and page size at creation time.
pub fn anchor_with_pixels(selection: &Rect, page: &Rect) -> Result<StoredCoordinates, ValidationError> {
    let coords = anchor(selection, page)?;
    Ok(StoredCoordinates {
        x: Some(selection.left - page.left),
        y: Some(selection.top - page.top),
        width: Some(selection.width),
        height: Some(selection.height),
        page_width: Some(page.width),
        page_height: Some(page.height),
        ..StoredCoordinates::from(coords)
    })
}

/// Places anchored coordinates on a page rendered at any size.
pub fn render(coords: &Coordinates, page: &Rect) -> Rect {
    Rect {
        left: page.left + coords.x_percent / 100.0 * page.width,
        top: page.top + coords.y_percent / 100.0 * page.height,
        width: coords.width_percent / 100.0 * page.width,
        height: coords.height_percent / 100.0 * page.height,
    }
}

/// Reads the percentages of a stored record, deriving them from pixels for
/// records that predate percentage storage. Range is not checked here.
pub fn derive_percentages(stored: &StoredCoordinates) -> Result<Coordinates, String> {
    if let (Some(x_percent), Some(y_percent), Some(width_percent), Some(height_percent)) = (
        stored.x_percent,
        stored.y_percent,
        stored.width_percent,
        stored.height_percent,
    ) {
        return Ok(Coordinates {
            x_percent,
            y_percent,
            width_percent,
            height_percent,
        });
    }

    let (Some(x), Some(y), Some(width), Some(height)) =
        (stored.x, stored.y, stored.width, stored.height)
    else {
        return Err("no percentage or pixel geometry".to_string());
    };
    let (page_width, page_height) = match (stored.page_width, stored.page_height) {
        (Some(w), Some(h)) if w > 0.0 && h > 0.0 => (w, h),
        _ => return Err("legacy pixel record without page dimensions".to_string()),
    };
    Ok(Coordinates {
        x_percent: x / page_width * 100.0,
        y_percent: y / page_height * 100.0,
        width_percent: width / page_width * 100.0,
        height_percent: height / page_height * 100.0,
    })
}

/// Coordinates of a stored highlight ready for rendering, or the reason it can't be drawn.
pub fn resolve_coordinates(
    highlight_id: i64,
    stored: &StoredCoordinates,
) -> Result<Coordinates, DataIntegrityWarning> {
    let warn = |reason: String| DataIntegrityWarning { highlight_id, reason };
    let coords = derive_percentages(stored).map_err(warn)?;
    coords.validate().map_err(|e| warn(e.to_string()))?;
    Ok(coords)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedHighlight {
    pub highlight_id: i64,
    pub color: HighlightColor,
    pub rect: Rect,
}

/// Lays out every highlight of `page_number` on the current page box.
///
/// Records that cannot be resolved are skipped and reported; the rest of the
/// page still renders.
pub fn render_page_highlights(
    highlights: &[Highlight],
    page_number: u32,
    page: &Rect,
) -> (Vec<RenderedHighlight>, Vec<DataIntegrityWarning>) {
    let mut rendered = Vec::new();
    let mut warnings = Vec::new();

    for h in highlights.iter().filter(|h| h.page_number == page_number) {
        match resolve_coordinates(h.id, &h.coordinates) {
            Ok(coords) => rendered.push(RenderedHighlight {
                highlight_id: h.id,
                color: h.color,
                rect: render(&coords, page),
            }),
            Err(warning) => {
                log::warn!("Skipping highlight: {}", warning);
                warnings.push(warning);
            }
        }
    }

    (rendered, warnings)
}
