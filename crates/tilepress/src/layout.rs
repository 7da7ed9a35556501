//! Layout planning
//!
//! Pure geometry: given the pattern dimensions and page configuration,
//! decide the page orientation and the tile grid. No hidden state; the
//! same options always produce the same layout.

use crate::options::TileOptions;
use crate::types::*;

/// Derived layout, recomputed whenever the options change
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResolvedLayout {
    /// Page width after orientation swap (cm)
    pub page_width_cm: f32,
    /// Page height after orientation swap (cm)
    pub page_height_cm: f32,
    /// Tile content width: page width minus twice bleed minus overlap (cm)
    pub tile_width_cm: f32,
    /// Tile content height (cm)
    pub tile_height_cm: f32,
    /// Number of grid columns
    pub cols: u32,
    /// Number of grid rows
    pub rows: u32,
    /// Resolved page orientation
    pub orientation: Orientation,
}

impl ResolvedLayout {
    /// Total number of tiles in the grid
    pub fn tile_count(&self) -> u32 {
        self.cols * self.rows
    }
}

/// Tile grid for one candidate page orientation, or `None` when bleed
/// and overlap consume the whole page.
fn candidate_grid(
    pattern_w: f32,
    pattern_h: f32,
    page_w: f32,
    page_h: f32,
    bleed: f32,
    overlap: f32,
) -> Option<(f32, f32, u32, u32)> {
    let tile_w = page_w - 2.0 * bleed - overlap;
    let tile_h = page_h - 2.0 * bleed - overlap;
    if tile_w <= 0.0 || tile_h <= 0.0 {
        return None;
    }
    let cols = (pattern_w / tile_w).ceil().max(1.0) as u32;
    let rows = (pattern_h / tile_h).ceil().max(1.0) as u32;
    Some((tile_w, tile_h, cols, rows))
}

/// Compute the resolved layout for the given options.
///
/// For `Automatic` orientation both candidates are evaluated and the
/// one with the fewer total tiles wins; ties keep the page's native
/// portrait orientation. Fails with `InvalidDimension` when the tile
/// content size degenerates to zero or below.
pub fn plan_layout(options: &TileOptions) -> Result<ResolvedLayout> {
    options.validate()?;

    let (base_w, base_h) = options.page_size.dimensions_cm();
    let bleed = options.bleed_margin_cm;
    let overlap = options.overlap_width_cm();
    let (pattern_w, pattern_h) = (options.pattern_width_cm, options.pattern_height_cm);

    let orientation = match options.orientation {
        OrientationPref::Portrait => Orientation::Portrait,
        OrientationPref::Landscape => Orientation::Landscape,
        OrientationPref::Automatic => {
            let portrait = candidate_grid(pattern_w, pattern_h, base_w, base_h, bleed, overlap);
            let landscape = candidate_grid(pattern_w, pattern_h, base_h, base_w, bleed, overlap);
            match (portrait, landscape) {
                (Some((.., pc, pr)), Some((.., lc, lr))) if lc * lr < pc * pr => {
                    Orientation::Landscape
                }
                (Some(_), _) => Orientation::Portrait,
                (None, Some(_)) => Orientation::Landscape,
                (None, None) => return Err(degenerate_content_error()),
            }
        }
    };

    let (page_w, page_h) = options.page_size.dimensions_with_orientation(orientation);
    let (tile_w, tile_h, cols, rows) =
        candidate_grid(pattern_w, pattern_h, page_w, page_h, bleed, overlap)
            .ok_or_else(degenerate_content_error)?;

    Ok(ResolvedLayout {
        page_width_cm: page_w,
        page_height_cm: page_h,
        tile_width_cm: tile_w,
        tile_height_cm: tile_h,
        cols,
        rows,
        orientation,
    })
}

fn degenerate_content_error() -> TileError {
    TileError::InvalidDimension(
        "Bleed margin and overlap leave no printable tile area on the page.".to_string(),
    )
}
