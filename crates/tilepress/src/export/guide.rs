//! Assembly guide text
//!
//! Every export format ships the same textual guide: a header with the
//! total tile count, a grid diagram of tile labels, and the user's
//! notes with the count placeholders substituted.

use crate::compose::TileSet;
use crate::options::TileOptions;

/// Placeholder substituted with the total tile count
pub const PLACEHOLDER_TOTAL: &str = "[Total Tiles]";
/// Placeholder substituted with the column count
pub const PLACEHOLDER_TILES_X: &str = "[TilesX]";
/// Placeholder substituted with the row count
pub const PLACEHOLDER_TILES_Y: &str = "[TilesY]";

/// Substitute the grid placeholders in the user's notes
pub fn substitute_notes(notes: &str, total: usize, cols: u32, rows: u32) -> String {
    notes
        .replacen(PLACEHOLDER_TOTAL, &total.to_string(), 1)
        .replacen(PLACEHOLDER_TILES_X, &cols.to_string(), 1)
        .replacen(PLACEHOLDER_TILES_Y, &rows.to_string(), 1)
}

/// The grid diagram: one line per row of "Tile r-c" labels
fn grid_diagram(cols: u32, rows: u32) -> String {
    (1..=rows)
        .map(|r| {
            (1..=cols)
                .map(|c| format!("Tile {}-{}", r, c))
                .collect::<Vec<_>>()
                .join("  ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the full assembly guide text for a tile set
pub fn assembly_guide(tile_set: &TileSet, options: &TileOptions) -> String {
    format!(
        "Assembly Guide\nTotal Tiles: {} ({} x {})\n{}\n{}",
        tile_set.len(),
        tile_set.cols,
        tile_set.rows,
        grid_diagram(tile_set.cols, tile_set.rows),
        substitute_notes(
            &options.notes,
            tile_set.len(),
            tile_set.cols,
            tile_set.rows
        ),
    )
}
