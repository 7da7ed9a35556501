use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use tilepress::units::{to_cm, Unit};
use tilepress::{
    calculate_statistics, export_tiles, render_tiles, ExportFormat, Orientation, OrientationPref,
    PageSize, PatternSource, Quality, RasterDecoder, SourceDecode, SourceKind, TileError,
    TileOptions,
};

#[derive(Parser)]
#[command(name = "tilepress", about = "Split oversized patterns into printable tiles", version)]
struct Cli {
    /// Input pattern file (PNG or JPG)
    #[arg(short, long)]
    input: PathBuf,

    /// Output file (defaults to the format's standard name)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Real-world pattern width
    #[arg(long)]
    width: Option<f32>,

    /// Real-world pattern height
    #[arg(long)]
    height: Option<f32>,

    /// Unit for --width and --height
    #[arg(long, default_value = "cm", value_enum)]
    unit: UnitArg,

    /// Output page size
    #[arg(long, value_enum)]
    page: Option<PageArg>,

    /// Custom page width in cm (overrides --page together with --page-height)
    #[arg(long)]
    page_width: Option<f32>,

    /// Custom page height in cm
    #[arg(long)]
    page_height: Option<f32>,

    /// Page orientation
    #[arg(long, value_enum)]
    orientation: Option<OrientationArg>,

    /// Bleed margin in cm
    #[arg(long)]
    bleed: Option<f32>,

    /// Notch size in cm
    #[arg(long)]
    notch: Option<f32>,

    /// Disable the duplicated overlap strip between tiles
    #[arg(long)]
    no_overlap: bool,

    /// Rendering quality
    #[arg(long, value_enum)]
    quality: Option<QualityArg>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    /// Free-text notes for the assembly guide
    #[arg(long)]
    notes: Option<String>,

    /// Load base options from a JSON config file; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Show statistics only, don't render or export
    #[arg(long)]
    stats_only: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum UnitArg {
    Mm,
    Cm,
    In,
}

#[derive(Clone, Copy, ValueEnum)]
enum PageArg {
    A4,
    A3,
    Letter,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrientationArg {
    Portrait,
    Landscape,
    Auto,
}

#[derive(Clone, Copy, ValueEnum)]
enum QualityArg {
    Low,
    Standard,
    High,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Pdf,
    SvgPerTile,
    SvgSingle,
}

impl From<UnitArg> for Unit {
    fn from(arg: UnitArg) -> Self {
        match arg {
            UnitArg::Mm => Self::Mm,
            UnitArg::Cm => Self::Cm,
            UnitArg::In => Self::In,
        }
    }
}

impl From<PageArg> for PageSize {
    fn from(arg: PageArg) -> Self {
        match arg {
            PageArg::A4 => Self::A4,
            PageArg::A3 => Self::A3,
            PageArg::Letter => Self::Letter,
        }
    }
}

impl From<OrientationArg> for OrientationPref {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::Portrait => Self::Portrait,
            OrientationArg::Landscape => Self::Landscape,
            OrientationArg::Auto => Self::Automatic,
        }
    }
}

impl From<QualityArg> for Quality {
    fn from(arg: QualityArg) -> Self {
        match arg {
            QualityArg::Low => Self::Low,
            QualityArg::Standard => Self::Standard,
            QualityArg::High => Self::High,
        }
    }
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Pdf => Self::Pdf,
            FormatArg::SvgPerTile => Self::SvgPerTile,
            FormatArg::SvgSingle => Self::SvgSingle,
        }
    }
}

/// Merge command line flags over the config-file (or default) options
fn build_options(cli: &Cli, mut options: TileOptions) -> TileOptions {
    let unit: Unit = cli.unit.into();
    if let Some(w) = cli.width {
        options.pattern_width_cm = to_cm(w, unit);
    }
    if let Some(h) = cli.height {
        options.pattern_height_cm = to_cm(h, unit);
    }
    if let (Some(w), Some(h)) = (cli.page_width, cli.page_height) {
        options.page_size = PageSize::Custom {
            width_cm: w,
            height_cm: h,
        };
    } else if let Some(page) = cli.page {
        options.page_size = page.into();
    }
    if let Some(orientation) = cli.orientation {
        options.orientation = orientation.into();
    }
    if let Some(bleed) = cli.bleed {
        options.bleed_margin_cm = bleed;
    }
    if let Some(notch) = cli.notch {
        options.notch_size_cm = notch;
    }
    if cli.no_overlap {
        options.overlap_enabled = false;
    }
    if let Some(quality) = cli.quality {
        options.quality = quality.into();
    }
    if let Some(format) = cli.format {
        options.output_format = format.into();
    }
    if let Some(notes) = &cli.notes {
        options.notes = notes.clone();
    }
    options
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let base = match &cli.config {
        Some(path) => TileOptions::load(path).await?,
        None => TileOptions::default(),
    };
    let options = build_options(&cli, base);

    let bytes = tokio::fs::read(&cli.input).await?;
    let source = PatternSource::new(bytes, &cli.input.to_string_lossy())?;
    let kind = source.kind();
    let mut decoder: Box<dyn SourceDecode> = match kind {
        SourceKind::Raster => Box::new(RasterDecoder::new(&source)?),
        SourceKind::Vector | SourceKind::Document => {
            anyhow::bail!("only raster patterns (PNG, JPG) are supported from the command line")
        }
    };

    let stats = calculate_statistics(&options)?;
    let layout = stats.layout;
    println!("Tiling Statistics:");
    println!(
        "  Page: {} x {} cm ({:?})",
        layout.page_width_cm, layout.page_height_cm, layout.orientation
    );
    println!(
        "  Tile content: {:.2} x {:.2} cm",
        layout.tile_width_cm, layout.tile_height_cm
    );
    println!(
        "  Tiles: {} ({} x {})",
        layout.tile_count(),
        layout.cols,
        layout.rows
    );
    println!("  Output pages: {}", stats.output_pages);
    if let Some(rejected) = stats.rejected_tile_count {
        let other = match layout.orientation {
            Orientation::Portrait => Orientation::Landscape,
            Orientation::Landscape => Orientation::Portrait,
        };
        println!("  Rejected {:?} orientation: {} tiles", other, rejected);
    }

    if cli.stats_only {
        return Ok(());
    }

    let render_options = options.clone();
    let (failures, artifact) = tokio::task::spawn_blocking(move || {
        let tile_set = render_tiles(decoder.as_mut(), kind, &layout, &render_options)?;
        let artifact = export_tiles(&tile_set, &layout, &render_options)?;
        Ok::<_, TileError>((tile_set.failures, artifact))
    })
    .await??;

    for failure in &failures {
        eprintln!(
            "Warning: tile {}-{} failed to render: {}",
            failure.row + 1,
            failure.col + 1,
            failure.reason
        );
    }

    let output = cli
        .output
        .unwrap_or_else(|| PathBuf::from(&artifact.file_name));
    tokio::fs::write(&output, &artifact.bytes).await?;
    println!(
        "Exported {} tiles → {}",
        layout.tile_count() as usize - failures.len(),
        output.display()
    );

    Ok(())
}
