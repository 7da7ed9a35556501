use image::{Rgba, RgbaImage};
use tilepress::*;

const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Decoder that fills the requested surface with a horizontal gradient
/// and can be told to fail on the nth decode call.
struct FakeDecoder {
    calls: u32,
    fail_on_call: Option<u32>,
}

impl FakeDecoder {
    fn new() -> Self {
        Self {
            calls: 0,
            fail_on_call: None,
        }
    }

    fn failing_on(call: u32) -> Self {
        Self {
            calls: 0,
            fail_on_call: Some(call),
        }
    }
}

impl SourceDecode for FakeDecoder {
    fn decode(&mut self, width: u32, height: u32) -> Result<RgbaImage> {
        self.calls += 1;
        if self.fail_on_call == Some(self.calls) {
            return Err(TileError::InvalidInput("damaged page".to_string()));
        }
        Ok(RgbaImage::from_fn(width, height, |x, _| {
            Rgba([(x % 256) as u8, 200, 0, 255])
        }))
    }

    fn native_size(&self) -> Option<(u32, u32)> {
        None
    }
}

/// Small square custom page so test surfaces stay tiny:
/// 4 x 4 cm page, 0.5 cm bleed, no overlap, 36 px/cm.
fn small_options(pattern_w: f32, pattern_h: f32) -> TileOptions {
    TileOptions {
        pattern_width_cm: pattern_w,
        pattern_height_cm: pattern_h,
        page_size: PageSize::Custom {
            width_cm: 4.0,
            height_cm: 4.0,
        },
        orientation: OrientationPref::Portrait,
        bleed_margin_cm: 0.5,
        notch_size_cm: 0.5,
        overlap_enabled: false,
        quality: Quality::Low,
        ..Default::default()
    }
}

fn render(options: &TileOptions, decoder: &mut FakeDecoder, kind: SourceKind) -> TileSet {
    let layout = plan_layout(options).unwrap();
    render_tiles(decoder, kind, &layout, options).unwrap()
}

#[test]
fn test_grid_covers_every_cell() {
    let options = small_options(10.0, 10.0);
    let mut decoder = FakeDecoder::new();
    let tile_set = render(&options, &mut decoder, SourceKind::Raster);

    assert_eq!((tile_set.cols, tile_set.rows), (4, 4));
    assert_eq!(tile_set.len(), 16);
    assert!(!tile_set.is_degraded());
    for row in 0..4 {
        for col in 0..4 {
            let tile = tile_set.get(col, row).unwrap();
            // 4 cm page at 36 px/cm
            assert_eq!((tile.surface.width(), tile.surface.height()), (144, 144));
        }
    }
}

#[test]
fn test_still_image_decodes_once() {
    let options = small_options(10.0, 10.0);
    let mut decoder = FakeDecoder::new();
    render(&options, &mut decoder, SourceKind::Raster);
    assert_eq!(decoder.calls, 1);
}

#[test]
fn test_document_decodes_per_tile() {
    let options = small_options(10.0, 10.0);
    let mut decoder = FakeDecoder::new();
    render(&options, &mut decoder, SourceKind::Document);
    assert_eq!(decoder.calls, 16);
}

#[test]
fn test_notches_only_on_shared_edges() {
    // 3 x 3 grid; page 144 px, bleed 18 px, notch 18 px.
    let options = small_options(9.0, 9.0);
    let mut decoder = FakeDecoder::new();
    let tile_set = render(&options, &mut decoder, SourceKind::Raster);
    assert_eq!((tile_set.cols, tile_set.rows), (3, 3));

    // Sample points just outside the border, inside each notch square.
    let left = (10, 72);
    let right = (130, 72);
    let top = (72, 10);
    let bottom = (72, 130);

    let corner = &tile_set.get(0, 0).unwrap().surface;
    assert_eq!(*corner.get_pixel(left.0, left.1), WHITE);
    assert_eq!(*corner.get_pixel(top.0, top.1), WHITE);
    assert_eq!(*corner.get_pixel(right.0, right.1), BLACK);
    assert_eq!(*corner.get_pixel(bottom.0, bottom.1), BLACK);

    let center = &tile_set.get(1, 1).unwrap().surface;
    for (x, y) in [left, right, top, bottom] {
        assert_eq!(*center.get_pixel(x, y), BLACK);
    }

    let far_corner = &tile_set.get(2, 2).unwrap().surface;
    assert_eq!(*far_corner.get_pixel(left.0, left.1), BLACK);
    assert_eq!(*far_corner.get_pixel(top.0, top.1), BLACK);
    assert_eq!(*far_corner.get_pixel(right.0, right.1), WHITE);
    assert_eq!(*far_corner.get_pixel(bottom.0, bottom.1), WHITE);
}

#[test]
fn test_overlap_splice_duplicates_neighbor_strip() {
    // 5 x 5 cm page, bleed 0.5, overlap 1 cm: 180 px page, 18 px bleed,
    // 36 px overlap, two columns.
    let mut options = small_options(6.0, 3.0);
    options.page_size = PageSize::Custom {
        width_cm: 5.0,
        height_cm: 5.0,
    };
    options.overlap_enabled = true;
    let mut decoder = FakeDecoder::new();
    let tile_set = render(&options, &mut decoder, SourceKind::Raster);
    assert_eq!((tile_set.cols, tile_set.rows), (2, 1));

    let first = &tile_set.get(0, 0).unwrap().surface;
    let second = &tile_set.get(1, 0).unwrap().surface;

    // The left overlap strip of the second tile is a copy of the strip
    // just left of the first tile's right bleed margin.
    for oy in [0, 50, 100] {
        for ox in [0, 10, 30] {
            assert_eq!(
                *second.get_pixel(18 + ox, 18 + oy),
                *first.get_pixel(180 - 36 - 18 + ox, 18 + oy),
                "strip mismatch at ({ox}, {oy})"
            );
        }
    }

    // Dashed red divider at bleed + overlap. The top border covers the
    // first dash run; sample inside the third run (rows 22..32) and the
    // gap after it (rows 32..34), where the pattern gradient shows.
    assert_eq!(*second.get_pixel(54, 25), RED);
    assert_eq!(*second.get_pixel(54, 32), Rgba([144, 200, 0, 255]));

    // The first tile has no left divider.
    assert_ne!(*first.get_pixel(54, 25), RED);
}

#[test]
fn test_decode_failure_degrades_but_keeps_siblings() {
    let options = small_options(10.0, 10.0);
    // Third decode call is row 0, col 2 in row-major order.
    let mut decoder = FakeDecoder::failing_on(3);
    let tile_set = render(&options, &mut decoder, SourceKind::Document);

    assert!(tile_set.is_degraded());
    assert_eq!(tile_set.len(), 15);
    assert_eq!(tile_set.failures.len(), 1);
    assert_eq!((tile_set.failures[0].col, tile_set.failures[0].row), (2, 0));
    assert!(tile_set.get(2, 0).is_none());
    assert!(tile_set.get(1, 0).is_some());
    assert!(tile_set.get(3, 3).is_some());
}

#[test]
fn test_assembly_guide_format() {
    let options = small_options(10.0, 5.0);
    let mut decoder = FakeDecoder::new();
    let tile_set = render(&options, &mut decoder, SourceKind::Raster);
    assert_eq!((tile_set.cols, tile_set.rows), (4, 2));

    let guide = assembly_guide(&tile_set, &options);
    assert!(guide.starts_with("Assembly Guide\nTotal Tiles: 8 (4 x 2)\n"));
    assert!(guide.contains("Tile 1-1  Tile 1-2  Tile 1-3  Tile 1-4"));
    assert!(guide.contains("Tile 2-1  Tile 2-2  Tile 2-3  Tile 2-4"));
    // Notes placeholders are substituted.
    assert!(!guide.contains("[Total Tiles]"));
    assert!(!guide.contains("[TilesX]"));
    assert!(!guide.contains("[TilesY]"));
}

#[test]
fn test_pdf_export_has_one_page_per_tile_plus_guide() {
    let options = small_options(9.0, 9.0);
    let mut decoder = FakeDecoder::new();
    let layout = plan_layout(&options).unwrap();
    let tile_set = render_tiles(&mut decoder, SourceKind::Raster, &layout, &options).unwrap();

    let artifact = export_tiles(&tile_set, &layout, &options).unwrap();
    assert_eq!(artifact.file_name, "tiled_pattern.pdf");
    assert_eq!(artifact.kind, ArtifactKind::Pdf);

    let doc = lopdf::Document::load_mem(&artifact.bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 10);
}

#[test]
fn test_degraded_set_still_exports() {
    let options = small_options(10.0, 10.0);
    let mut decoder = FakeDecoder::failing_on(6);
    let layout = plan_layout(&options).unwrap();
    let tile_set = render_tiles(&mut decoder, SourceKind::Document, &layout, &options).unwrap();
    assert!(tile_set.is_degraded());

    let artifact = export_tiles(&tile_set, &layout, &options).unwrap();
    let doc = lopdf::Document::load_mem(&artifact.bytes).unwrap();
    // 15 surviving tiles plus the guide page
    assert_eq!(doc.get_pages().len(), 16);
}

#[test]
fn test_empty_tile_set_export_fails() {
    let options = small_options(10.0, 10.0);
    let layout = plan_layout(&options).unwrap();
    let tile_set = TileSet {
        tiles: Vec::new(),
        cols: 0,
        rows: 0,
        failures: Vec::new(),
    };
    let result = export_tiles(&tile_set, &layout, &options);
    assert!(matches!(result, Err(TileError::Export(_))));
}

#[test]
fn test_svg_per_tile_archive_contents() {
    use std::io::Read;

    let mut options = small_options(9.0, 5.0);
    options.output_format = ExportFormat::SvgPerTile;
    let mut decoder = FakeDecoder::new();
    let layout = plan_layout(&options).unwrap();
    let tile_set = render_tiles(&mut decoder, SourceKind::Raster, &layout, &options).unwrap();
    assert_eq!((tile_set.cols, tile_set.rows), (3, 2));

    let artifact = export_tiles(&tile_set, &layout, &options).unwrap();
    assert_eq!(artifact.file_name, "tiled_pattern.tar.gz");
    assert_eq!(artifact.kind, ArtifactKind::Archive);

    let gz = flate2::read::GzDecoder::new(artifact.bytes.as_slice());
    let mut archive = tar::Archive::new(gz);
    let mut names = Vec::new();
    for entry in archive.entries().unwrap() {
        let mut entry = entry.unwrap();
        names.push(entry.path().unwrap().to_string_lossy().into_owned());
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        assert!(!content.is_empty());
    }
    assert_eq!(names.len(), 7);
    assert_eq!(names[0], "tile_1-1.svg");
    assert_eq!(names[5], "tile_2-3.svg");
    assert_eq!(names[6], "assembly_guide.txt");
}

#[test]
fn test_svg_single_archive_contents() {
    let mut options = small_options(9.0, 5.0);
    options.output_format = ExportFormat::SvgSingle;
    let mut decoder = FakeDecoder::new();
    let layout = plan_layout(&options).unwrap();
    let tile_set = render_tiles(&mut decoder, SourceKind::Raster, &layout, &options).unwrap();

    let artifact = export_tiles(&tile_set, &layout, &options).unwrap();
    assert_eq!(artifact.file_name, "tiled_pattern_single_svg.tar.gz");

    let gz = flate2::read::GzDecoder::new(artifact.bytes.as_slice());
    let mut archive = tar::Archive::new(gz);
    let names: Vec<String> = archive
        .entries()
        .unwrap()
        .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["tiled_pattern.svg", "assembly_guide.txt"]);
}

#[tokio::test]
async fn test_options_save_and_load_round_trip() {
    use tempfile::NamedTempFile;

    let temp = NamedTempFile::new().unwrap();
    let mut options = TileOptions::default();
    options.pattern_width_cm = 120.0;
    options.pattern_height_cm = 80.0;
    options.page_size = PageSize::Custom {
        width_cm: 20.0,
        height_cm: 25.0,
    };
    options.quality = Quality::High;
    options.notes = "Custom notes".to_string();

    options.save(temp.path()).await.unwrap();
    let loaded = TileOptions::load(temp.path()).await.unwrap();
    assert_eq!(loaded, options);
}

#[tokio::test]
async fn test_options_load_rejects_garbage() {
    use tempfile::NamedTempFile;

    let temp = NamedTempFile::new().unwrap();
    std::fs::write(temp.path(), b"not json").unwrap();
    let result = TileOptions::load(temp.path()).await;
    assert!(matches!(result, Err(TileError::InvalidInput(_))));
}
