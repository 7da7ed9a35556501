//! Shared constants for pattern tiling
//!
//! This module centralizes magic numbers and constants used throughout
//! the tiling and export process.

// =============================================================================
// Unit Conversion
// =============================================================================

/// Centimeters per inch
pub const CM_PER_INCH: f32 = 2.54;

/// Millimeters per centimeter
pub const MM_PER_CM: f32 = 10.0;

/// Points per centimeter (1 inch = 72 points, 1 inch = 2.54 cm)
pub const POINTS_PER_CM: f32 = 72.0 / CM_PER_INCH; // ≈ 28.3465

/// Convert centimeters to points
#[inline]
pub fn cm_to_pt(cm: f32) -> f32 {
    cm * POINTS_PER_CM
}

/// Convert points to centimeters
#[inline]
pub fn pt_to_cm(pt: f32) -> f32 {
    pt / POINTS_PER_CM
}

// =============================================================================
// Tiling Geometry
// =============================================================================

/// Width of the duplicated overlap strip when overlap is enabled (cm)
pub const OVERLAP_WIDTH_CM: f32 = 1.0;

/// Default bleed margin (cm)
pub const DEFAULT_BLEED_MARGIN_CM: f32 = 1.5;

/// Default notch size (cm)
pub const DEFAULT_NOTCH_SIZE_CM: f32 = 0.5;

// =============================================================================
// Tile Drawing
// =============================================================================

/// Width of the solid border around the tile content region (px)
pub const BORDER_WIDTH_PX: u32 = 2;

/// Width of the dashed overlap divider line (px)
pub const DIVIDER_WIDTH_PX: u32 = 2;

/// Dash pattern for the overlap divider (on/off pixel runs)
pub const DIVIDER_DASH_PATTERN: [u32; 4] = [2, 2, 10, 2];

/// Glyph pixel scale for the tile label
pub const TILE_LABEL_SCALE: u32 = 5;

/// Glyph pixel scale for the "Overlap" marker label
pub const OVERLAP_LABEL_SCALE: u32 = 2;

/// Alpha applied to tile labels (0..=255)
pub const LABEL_ALPHA: u8 = 128;

/// Offset of the tile label from the content origin (px)
pub const TILE_LABEL_OFFSET_PX: (u32, u32) = (10, 10);

// =============================================================================
// Assembly Guide
// =============================================================================

/// Font size for the assembly guide page (points)
pub const GUIDE_FONT_SIZE: f32 = 10.0;

/// Line spacing for the assembly guide page (points)
pub const GUIDE_LINE_HEIGHT: f32 = 14.0;

/// Margin around the assembly guide text (cm)
pub const GUIDE_MARGIN_CM: f32 = 1.0;

/// Approximate character width ratio for Helvetica
pub const HELVETICA_CHAR_WIDTH_RATIO: f32 = 0.5;

// =============================================================================
// Session
// =============================================================================

/// Debounce window for coalescing configuration changes
pub const DEBOUNCE_WINDOW: std::time::Duration = std::time::Duration::from_millis(500);
