pub mod compose;
pub mod constants;
mod debounce;
mod glyphs;
mod layout;
mod options;
pub mod session;
mod source;
mod stats;
mod types;
pub mod units;

pub mod export;

pub use compose::{render_tiles, Tile, TileFailure, TileSet};
pub use debounce::Debouncer;
pub use export::{assembly_guide, export_tiles, ArtifactKind, ExportArtifact};
pub use layout::{plan_layout, ResolvedLayout};
pub use options::{TileOptions, DEFAULT_NOTES};
pub use session::{run_session, SessionCommand, SessionUpdate};
pub use source::{PatternSource, RasterDecoder, SourceDecode, SourceKind};
pub use stats::{calculate_statistics, TilingStatistics};
pub use types::*;
