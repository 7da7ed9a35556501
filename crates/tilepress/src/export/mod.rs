//! Export encoders
//!
//! Three encoders consume the finished tile set: a multi-page PDF, a
//! per-tile SVG archive, and a single-file SVG archive. Dispatch is by
//! the configured output format; all three ship the same assembly
//! guide text.

mod archive;
mod guide;
mod pdf;
mod svg;

pub use guide::{assembly_guide, substitute_notes};

use crate::compose::TileSet;
use crate::layout::ResolvedLayout;
use crate::options::TileOptions;
use crate::types::*;

/// What kind of file an export produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// A PDF document
    Pdf,
    /// A gzip-compressed tar archive
    Archive,
}

/// A finished export: suggested file name plus the serialized bytes
pub struct ExportArtifact {
    pub file_name: String,
    pub kind: ArtifactKind,
    pub bytes: Vec<u8>,
}

/// Serialize the tile set in the configured output format.
///
/// Fails with `Export` when the tile set is empty; degraded sets
/// export whatever cells rendered.
pub fn export_tiles(
    tile_set: &TileSet,
    layout: &ResolvedLayout,
    options: &TileOptions,
) -> Result<ExportArtifact> {
    if tile_set.is_empty() {
        return Err(TileError::Export("No tiles to export.".to_string()));
    }

    match options.output_format {
        ExportFormat::Pdf => {
            let bytes = pdf::encode_pdf(tile_set, layout, options)?;
            Ok(ExportArtifact {
                file_name: "tiled_pattern.pdf".to_string(),
                kind: ArtifactKind::Pdf,
                bytes,
            })
        }
        ExportFormat::SvgPerTile => {
            let mut files = Vec::with_capacity(tile_set.len() + 1);
            for tile in &tile_set.tiles {
                files.push((
                    format!("tile_{}-{}.svg", tile.row + 1, tile.col + 1),
                    svg::tile_svg(tile)?.into_bytes(),
                ));
            }
            files.push((
                "assembly_guide.txt".to_string(),
                assembly_guide(tile_set, options).into_bytes(),
            ));
            Ok(ExportArtifact {
                file_name: "tiled_pattern.tar.gz".to_string(),
                kind: ArtifactKind::Archive,
                bytes: archive::pack_archive(&files)?,
            })
        }
        ExportFormat::SvgSingle => {
            let files = vec![
                (
                    "tiled_pattern.svg".to_string(),
                    svg::single_svg(tile_set)?.into_bytes(),
                ),
                (
                    "assembly_guide.txt".to_string(),
                    assembly_guide(tile_set, options).into_bytes(),
                ),
            ];
            Ok(ExportArtifact {
                file_name: "tiled_pattern_single_svg.tar.gz".to_string(),
                kind: ArtifactKind::Archive,
                bytes: archive::pack_archive(&files)?,
            })
        }
    }
}
