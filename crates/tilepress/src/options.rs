use crate::constants::{DEFAULT_BLEED_MARGIN_CM, DEFAULT_NOTCH_SIZE_CM, OVERLAP_WIDTH_CM};
use crate::types::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default free-text notes, with placeholders substituted at export
pub const DEFAULT_NOTES: &str = "Assembly Guide\nTotal Tiles: [Total Tiles] ([TilesX] x [TilesY])\nInstructions: Print at \"Actual size\", cut along any outside border which has a notch. Align notches and overlap (if overlap is used) and glue or tape tiles together.";

/// Complete tiling configuration
///
/// All lengths are stored in centimeters (the canonical unit). The
/// struct is replaced wholesale on each edit; the layout planner reads
/// it but never mutates it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TileOptions {
    // Pattern dimensions (canonical cm, 0.0 = not yet entered)
    pub pattern_width_cm: f32,
    pub pattern_height_cm: f32,

    // Output page
    pub page_size: PageSize,
    pub orientation: OrientationPref,

    // Tiling geometry
    pub bleed_margin_cm: f32,
    pub notch_size_cm: f32,
    pub overlap_enabled: bool,

    // Rendering and export
    pub quality: Quality,
    pub output_format: ExportFormat,

    // Free-text notes appended to the assembly guide
    pub notes: String,
}

impl Default for TileOptions {
    fn default() -> Self {
        Self {
            pattern_width_cm: 0.0,
            pattern_height_cm: 0.0,
            page_size: PageSize::A4,
            orientation: OrientationPref::Automatic,
            bleed_margin_cm: DEFAULT_BLEED_MARGIN_CM,
            notch_size_cm: DEFAULT_NOTCH_SIZE_CM,
            overlap_enabled: true,
            quality: Quality::Standard,
            output_format: ExportFormat::Pdf,
            notes: DEFAULT_NOTES.to_string(),
        }
    }
}

impl TileOptions {
    /// Effective overlap strip width in centimeters
    pub fn overlap_width_cm(&self) -> f32 {
        if self.overlap_enabled {
            OVERLAP_WIDTH_CM
        } else {
            0.0
        }
    }

    /// Load options from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options = serde_json::from_slice(&bytes)
            .map_err(|e| TileError::InvalidInput(format!("Failed to parse config: {}", e)))?;
        Ok(options)
    }

    /// Save options to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| TileError::InvalidInput(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Validate the numeric fields.
    ///
    /// Checks everything that can be rejected before rendering starts:
    /// pattern and page dimensions must be positive finite numbers,
    /// bleed margin and notch size non-negative finite numbers.
    pub fn validate(&self) -> Result<()> {
        if !self.pattern_width_cm.is_finite()
            || !self.pattern_height_cm.is_finite()
            || self.pattern_width_cm <= 0.0
            || self.pattern_height_cm <= 0.0
        {
            return Err(TileError::InvalidInput(
                "Invalid file or dimensions. Please enter valid width and height.".to_string(),
            ));
        }

        let (page_w, page_h) = self.page_size.dimensions_cm();
        if !page_w.is_finite() || !page_h.is_finite() || page_w <= 0.0 || page_h <= 0.0 {
            return Err(TileError::InvalidInput("Invalid page size.".to_string()));
        }

        if !self.bleed_margin_cm.is_finite() || self.bleed_margin_cm < 0.0 {
            return Err(TileError::InvalidInput("Invalid bleed margin.".to_string()));
        }

        if !self.notch_size_cm.is_finite() || self.notch_size_cm < 0.0 {
            return Err(TileError::InvalidInput(
                "Negative values are not allowed for dimensions, bleed margin, or notch size."
                    .to_string(),
            ));
        }

        Ok(())
    }
}
