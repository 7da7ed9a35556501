//! Vector encoders
//!
//! Tiles are embedded as base64 PNG data URIs inside hand-built SVG
//! markup: either one document per tile at page size, or a single
//! document spanning the whole grid with tiles at absolute page
//! offsets. The single-file variant keeps each tile's bleed and
//! overlap regions intact.

use crate::compose::{Tile, TileSet};
use crate::types::*;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::RgbaImage;

const SVG_NS: &str =
    "xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\"";

fn png_data_uri(surface: &RgbaImage) -> Result<String> {
    let mut png = std::io::Cursor::new(Vec::new());
    surface.write_to(&mut png, image::ImageFormat::Png)?;
    Ok(format!(
        "data:image/png;base64,{}",
        STANDARD.encode(png.into_inner())
    ))
}

/// One SVG document covering a single tile at full page size
pub fn tile_svg(tile: &Tile) -> Result<String> {
    let (w, h) = (tile.surface.width(), tile.surface.height());
    let uri = png_data_uri(&tile.surface)?;
    Ok(format!(
        "<svg {SVG_NS} width=\"{w}\" height=\"{h}\">\n  <image href=\"{uri}\" width=\"{w}\" height=\"{h}\"/>\n</svg>\n"
    ))
}

/// One SVG document spanning the whole grid, each tile at its absolute
/// (col x page width, row x page height) pixel offset
pub fn single_svg(tile_set: &TileSet) -> Result<String> {
    let (page_w, page_h) = tile_set
        .tiles
        .first()
        .map(|t| (t.surface.width(), t.surface.height()))
        .ok_or_else(|| TileError::Export("No tiles to export.".to_string()))?;

    let total_w = tile_set.cols * page_w;
    let total_h = tile_set.rows * page_h;

    let mut svg = format!("<svg {SVG_NS} width=\"{total_w}\" height=\"{total_h}\">\n");
    for tile in &tile_set.tiles {
        let x = tile.col * page_w;
        let y = tile.row * page_h;
        let uri = png_data_uri(&tile.surface)?;
        svg.push_str(&format!(
            "  <image href=\"{uri}\" x=\"{x}\" y=\"{y}\" width=\"{page_w}\" height=\"{page_h}\"/>\n"
        ));
    }
    svg.push_str("</svg>\n");
    Ok(svg)
}
