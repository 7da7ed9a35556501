use crate::layout::{plan_layout, ResolvedLayout};
use crate::options::TileOptions;
use crate::types::*;

/// Statistics about a planned tiling
#[derive(Debug, Clone, PartialEq)]
pub struct TilingStatistics {
    /// The resolved layout the statistics describe
    pub layout: ResolvedLayout,
    /// Total number of printed pages including the assembly guide
    pub output_pages: u32,
    /// Tile count the rejected orientation would have produced, when
    /// orientation was chosen automatically
    pub rejected_tile_count: Option<u32>,
}

/// Calculate statistics for the tiling without rendering anything
pub fn calculate_statistics(options: &TileOptions) -> Result<TilingStatistics> {
    let layout = plan_layout(options)?;

    let rejected_tile_count = match options.orientation {
        OrientationPref::Automatic => {
            let mut flipped = options.clone();
            flipped.orientation = match layout.orientation {
                Orientation::Portrait => OrientationPref::Landscape,
                Orientation::Landscape => OrientationPref::Portrait,
            };
            plan_layout(&flipped).ok().map(|l| l.tile_count())
        }
        _ => None,
    };

    Ok(TilingStatistics {
        layout,
        output_pages: layout.tile_count() + 1,
        rejected_tile_count,
    })
}
