//! Tile compositing
//!
//! Renders one pixel surface per grid cell: clipped pattern content,
//! overlap strips spliced from already-rendered neighbors, notches,
//! border, and labels. Traversal is strictly row-major left-to-right,
//! top-to-bottom; the overlap splice for a cell reads pixel data from
//! its left and top neighbors, so cells that share an overlap edge
//! must never be rendered out of order or in parallel.

use crate::constants::*;
use crate::glyphs;
use crate::layout::ResolvedLayout;
use crate::options::TileOptions;
use crate::source::{SourceDecode, SourceKind};
use crate::types::*;
use image::{imageops, Rgba, RgbaImage};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const DIVIDER_RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// One rendered grid cell
pub struct Tile {
    /// Zero-based column index
    pub col: u32,
    /// Zero-based row index
    pub row: u32,
    /// Page-sized surface at the configured rendering density
    pub surface: RgbaImage,
}

/// A cell that could not be rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileFailure {
    pub col: u32,
    pub row: u32,
    pub reason: String,
}

/// The full rendered grid, in row-major traversal order.
///
/// Produced atomically by one compositing pass; a degraded set is
/// missing the cells listed in `failures` but keeps every sibling that
/// rendered successfully.
pub struct TileSet {
    pub tiles: Vec<Tile>,
    pub cols: u32,
    pub rows: u32,
    pub failures: Vec<TileFailure>,
}

impl TileSet {
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// True when one or more cells failed to render
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Look up a tile by grid position
    pub fn get(&self, col: u32, row: u32) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.col == col && t.row == row)
    }
}

/// Pixel-space geometry shared by every cell of one compositing pass
struct CellGeometry {
    page_w: u32,
    page_h: u32,
    bleed: u32,
    overlap: u32,
    content_w: u32,
    content_h: u32,
    notch: u32,
    pattern_w: u32,
    pattern_h: u32,
    tile_step_x: f32,
    tile_step_y: f32,
}

impl CellGeometry {
    fn new(layout: &ResolvedLayout, options: &TileOptions) -> Self {
        let density = options.quality.px_per_cm();
        let px = |cm: f32| (cm * density).round().max(0.0) as u32;

        let page_w = px(layout.page_width_cm).max(1);
        let page_h = px(layout.page_height_cm).max(1);
        let bleed = px(options.bleed_margin_cm);
        Self {
            page_w,
            page_h,
            bleed,
            overlap: px(options.overlap_width_cm()),
            content_w: page_w.saturating_sub(2 * bleed).max(1),
            content_h: page_h.saturating_sub(2 * bleed).max(1),
            notch: px(options.notch_size_cm),
            pattern_w: px(options.pattern_width_cm).max(1),
            pattern_h: px(options.pattern_height_cm).max(1),
            tile_step_x: layout.tile_width_cm * density,
            tile_step_y: layout.tile_height_cm * density,
        }
    }
}

/// Render every grid cell into a fresh [`TileSet`].
///
/// Still images are decoded once at the full pattern size and
/// repositioned per cell; paginated documents are decoded per cell.
/// A decode failure skips that cell, records it, and continues.
pub fn render_tiles(
    decoder: &mut dyn SourceDecode,
    kind: SourceKind,
    layout: &ResolvedLayout,
    options: &TileOptions,
) -> Result<TileSet> {
    let geom = CellGeometry::new(layout, options);

    // Decode cache for still images: one decode shared by all cells.
    let mut still_cache: Option<std::result::Result<RgbaImage, String>> = None;

    let mut tiles: Vec<Tile> = Vec::with_capacity((layout.cols * layout.rows) as usize);
    let mut failures = Vec::new();

    for row in 0..layout.rows {
        for col in 0..layout.cols {
            let cell_decode;
            let pattern: &RgbaImage = if kind.is_still_image() {
                let cached = still_cache.get_or_insert_with(|| {
                    decoder
                        .decode(geom.pattern_w, geom.pattern_h)
                        .map_err(|e| e.to_string())
                });
                match cached {
                    Ok(img) => img,
                    Err(reason) => {
                        let reason = reason.clone();
                        record_failure(&mut failures, col, row, reason);
                        continue;
                    }
                }
            } else {
                match decoder.decode(geom.pattern_w, geom.pattern_h) {
                    Ok(img) => {
                        cell_decode = img;
                        &cell_decode
                    }
                    Err(e) => {
                        record_failure(&mut failures, col, row, e.to_string());
                        continue;
                    }
                }
            };

            let surface = compose_cell(pattern, col, row, layout, options, &geom, &tiles);
            tiles.push(Tile { col, row, surface });
        }
    }

    if !failures.is_empty() {
        log::warn!(
            "tile set degraded: {} of {} cells failed",
            failures.len(),
            layout.cols * layout.rows
        );
    }

    Ok(TileSet {
        tiles,
        cols: layout.cols,
        rows: layout.rows,
        failures,
    })
}

fn record_failure(failures: &mut Vec<TileFailure>, col: u32, row: u32, reason: String) {
    log::warn!("decode failed at tile {}-{}: {}", row + 1, col + 1, reason);
    failures.push(TileFailure { col, row, reason });
}

/// Compose one cell surface. `rendered` holds the already-finished
/// tiles of this pass, which the overlap splice reads from.
fn compose_cell(
    pattern: &RgbaImage,
    col: u32,
    row: u32,
    layout: &ResolvedLayout,
    options: &TileOptions,
    geom: &CellGeometry,
    rendered: &[Tile],
) -> RgbaImage {
    let mut surface = RgbaImage::from_pixel(geom.page_w, geom.page_h, WHITE);

    // Pattern content, clipped to the bleed inset
    let offset_x = (col as f32 * geom.tile_step_x).round() as i64;
    let offset_y = (row as f32 * geom.tile_step_y).round() as i64;
    draw_image_clipped(
        &mut surface,
        pattern,
        geom.bleed as i64 - offset_x,
        geom.bleed as i64 - offset_y,
        (geom.bleed, geom.bleed, geom.content_w, geom.content_h),
    );

    if options.overlap_enabled && geom.overlap > 0 {
        splice_overlap(&mut surface, col, row, geom, rendered);
    }

    draw_border(&mut surface, geom);
    draw_notches(&mut surface, col, row, layout, geom);
    draw_tile_label(&mut surface, col, row, geom);

    surface
}

/// Copy overlap strips from the left and top neighbors and mark the
/// boundary. Column overlap is applied first, then row overlap; only
/// nearest neighbors are consulted, which keeps the corner region
/// correct as long as traversal stays row-major.
fn splice_overlap(surface: &mut RgbaImage, col: u32, row: u32, geom: &CellGeometry, rendered: &[Tile]) {
    if col > 0 {
        if let Some(prev) = rendered.iter().find(|t| t.col == col - 1 && t.row == row) {
            let src_x = prev.surface.width() - geom.overlap - geom.bleed;
            copy_region(
                surface,
                &prev.surface,
                (src_x, geom.bleed, geom.overlap, geom.content_h),
                (geom.bleed, geom.bleed),
            );
        }
        let divider_x = geom.bleed + geom.overlap;
        draw_dashed_vline(
            surface,
            divider_x,
            geom.bleed,
            geom.bleed + geom.content_h,
            DIVIDER_WIDTH_PX,
            DIVIDER_RED,
        );
        draw_overlap_label_vertical(surface, divider_x + 4, geom.page_h / 2);
    }

    if row > 0 {
        if let Some(prev) = rendered.iter().find(|t| t.col == col && t.row == row - 1) {
            let src_y = prev.surface.height() - geom.overlap - geom.bleed;
            copy_region(
                surface,
                &prev.surface,
                (geom.bleed, src_y, geom.content_w, geom.overlap),
                (geom.bleed, geom.bleed),
            );
        }
        let divider_y = geom.bleed + geom.overlap;
        draw_dashed_hline(
            surface,
            geom.bleed,
            geom.bleed + geom.content_w,
            divider_y,
            DIVIDER_WIDTH_PX,
            DIVIDER_RED,
        );
        draw_overlap_label(surface, geom.page_w / 2, divider_y + 4);
    }
}

/// Solid border around the content region
fn draw_border(surface: &mut RgbaImage, geom: &CellGeometry) {
    let (x, y) = (geom.bleed, geom.bleed);
    let (w, h) = (geom.content_w, geom.content_h);
    let t = BORDER_WIDTH_PX;
    fill_rect(surface, x, y, w, t, BLACK);
    fill_rect(surface, x, y + h.saturating_sub(t), w, t, BLACK);
    fill_rect(surface, x, y, t, h, BLACK);
    fill_rect(surface, x + w.saturating_sub(t), y, t, h, BLACK);
}

/// Filled alignment squares centered on each edge shared with a
/// neighboring tile; outward-facing edges of the overall pattern get
/// none.
fn draw_notches(
    surface: &mut RgbaImage,
    col: u32,
    row: u32,
    layout: &ResolvedLayout,
    geom: &CellGeometry,
) {
    if geom.notch == 0 {
        return;
    }
    let half = geom.notch / 2;
    let cx = geom.page_w / 2;
    let cy = geom.page_h / 2;

    if col > 0 {
        fill_rect_signed(
            surface,
            geom.bleed as i64 - half as i64,
            cy as i64 - half as i64,
            geom.notch,
            geom.notch,
            BLACK,
        );
    }
    if col < layout.cols - 1 {
        fill_rect_signed(
            surface,
            (geom.page_w - geom.bleed) as i64 - half as i64,
            cy as i64 - half as i64,
            geom.notch,
            geom.notch,
            BLACK,
        );
    }
    if row > 0 {
        fill_rect_signed(
            surface,
            cx as i64 - half as i64,
            geom.bleed as i64 - half as i64,
            geom.notch,
            geom.notch,
            BLACK,
        );
    }
    if row < layout.rows - 1 {
        fill_rect_signed(
            surface,
            cx as i64 - half as i64,
            (geom.page_h - geom.bleed) as i64 - half as i64,
            geom.notch,
            geom.notch,
            BLACK,
        );
    }
}

/// Semi-transparent "Tile {row}-{col}" label near the content origin
fn draw_tile_label(surface: &mut RgbaImage, col: u32, row: u32, geom: &CellGeometry) {
    let label = format!("Tile {}-{}", row + 1, col + 1);
    let (dx, dy) = TILE_LABEL_OFFSET_PX;
    draw_text(
        surface,
        &label,
        (geom.bleed + dx) as i64,
        (geom.bleed + dy) as i64,
        TILE_LABEL_SCALE,
        Rgba([0, 0, 0, LABEL_ALPHA]),
    );
}

fn draw_overlap_label(surface: &mut RgbaImage, center_x: u32, top_y: u32) {
    let w = glyphs::text_width("Overlap", OVERLAP_LABEL_SCALE);
    draw_text(
        surface,
        "Overlap",
        center_x as i64 - w as i64 / 2,
        top_y as i64,
        OVERLAP_LABEL_SCALE,
        Rgba([0, 0, 0, LABEL_ALPHA]),
    );
}

/// "Overlap" rotated 90° counter-clockwise, for the vertical divider
fn draw_overlap_label_vertical(surface: &mut RgbaImage, left_x: u32, center_y: u32) {
    let w = glyphs::text_width("Overlap", OVERLAP_LABEL_SCALE);
    let h = glyphs::text_height(OVERLAP_LABEL_SCALE);
    let mut strip = RgbaImage::from_pixel(w.max(1), h, Rgba([0, 0, 0, 0]));
    draw_text(
        &mut strip,
        "Overlap",
        0,
        0,
        OVERLAP_LABEL_SCALE,
        Rgba([0, 0, 0, LABEL_ALPHA]),
    );
    let rotated = imageops::rotate270(&strip);
    let y = center_y as i64 - rotated.height() as i64 / 2;
    blend_image(surface, &rotated, left_x as i64, y);
}

// =============================================================================
// Raster primitives
// =============================================================================

/// Source-over blend of a single pixel
fn blend_pixel(dst: &mut RgbaImage, x: u32, y: u32, color: Rgba<u8>) {
    let base = *dst.get_pixel(x, y);
    let a = color.0[3] as u32;
    let inv = 255 - a;
    let mix = |c: u8, b: u8| ((c as u32 * a + b as u32 * inv) / 255) as u8;
    dst.put_pixel(
        x,
        y,
        Rgba([
            mix(color.0[0], base.0[0]),
            mix(color.0[1], base.0[1]),
            mix(color.0[2], base.0[2]),
            255,
        ]),
    );
}

fn fill_rect(dst: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    fill_rect_signed(dst, x as i64, y as i64, w, h, color);
}

/// Fill with clamping; the rect may extend past any image edge
fn fill_rect_signed(dst: &mut RgbaImage, x: i64, y: i64, w: u32, h: u32, color: Rgba<u8>) {
    let x0 = x.max(0) as u32;
    let y0 = y.max(0) as u32;
    let x1 = ((x + w as i64).max(0) as u32).min(dst.width());
    let y1 = ((y + h as i64).max(0) as u32).min(dst.height());
    for py in y0..y1 {
        for px in x0..x1 {
            dst.put_pixel(px, py, color);
        }
    }
}

/// Draw `src` positioned at (`dx`, `dy`), keeping only pixels inside
/// the clip rect (x, y, w, h). Source alpha is blended over the
/// existing background.
fn draw_image_clipped(
    dst: &mut RgbaImage,
    src: &RgbaImage,
    dx: i64,
    dy: i64,
    clip: (u32, u32, u32, u32),
) {
    let (cx, cy, cw, ch) = clip;
    let x1 = (cx + cw).min(dst.width());
    let y1 = (cy + ch).min(dst.height());
    for py in cy..y1 {
        let sy = py as i64 - dy;
        if sy < 0 || sy >= src.height() as i64 {
            continue;
        }
        for px in cx..x1 {
            let sx = px as i64 - dx;
            if sx < 0 || sx >= src.width() as i64 {
                continue;
            }
            let p = *src.get_pixel(sx as u32, sy as u32);
            if p.0[3] > 0 {
                blend_pixel(dst, px, py, p);
            }
        }
    }
}

/// Overwrite a destination region with pixels copied from another
/// surface (no blending; the splice replaces what step 4 drew there)
fn copy_region(
    dst: &mut RgbaImage,
    src: &RgbaImage,
    src_rect: (u32, u32, u32, u32),
    dst_origin: (u32, u32),
) {
    let (sx, sy, w, h) = src_rect;
    let (dx, dy) = dst_origin;
    for oy in 0..h {
        for ox in 0..w {
            let (px, py) = (sx + ox, sy + oy);
            let (qx, qy) = (dx + ox, dy + oy);
            if px < src.width() && py < src.height() && qx < dst.width() && qy < dst.height() {
                dst.put_pixel(qx, qy, *src.get_pixel(px, py));
            }
        }
    }
}

fn blend_image(dst: &mut RgbaImage, src: &RgbaImage, dx: i64, dy: i64) {
    for sy in 0..src.height() {
        for sx in 0..src.width() {
            let px = dx + sx as i64;
            let py = dy + sy as i64;
            if px < 0 || py < 0 || px >= dst.width() as i64 || py >= dst.height() as i64 {
                continue;
            }
            let p = *src.get_pixel(sx, sy);
            if p.0[3] > 0 {
                blend_pixel(dst, px as u32, py as u32, p);
            }
        }
    }
}

fn draw_dashed_vline(dst: &mut RgbaImage, x: u32, y0: u32, y1: u32, width: u32, color: Rgba<u8>) {
    let mut y = y0;
    let mut seg = 0usize;
    while y < y1 {
        let run = DIVIDER_DASH_PATTERN[seg % DIVIDER_DASH_PATTERN.len()];
        let end = (y + run).min(y1);
        if seg % 2 == 0 {
            fill_rect(dst, x, y, width, end - y, color);
        }
        y = end;
        seg += 1;
    }
}

fn draw_dashed_hline(dst: &mut RgbaImage, x0: u32, x1: u32, y: u32, width: u32, color: Rgba<u8>) {
    let mut x = x0;
    let mut seg = 0usize;
    while x < x1 {
        let run = DIVIDER_DASH_PATTERN[seg % DIVIDER_DASH_PATTERN.len()];
        let end = (x + run).min(x1);
        if seg % 2 == 0 {
            fill_rect(dst, x, y, end - x, width, color);
        }
        x = end;
        seg += 1;
    }
}

/// Stamp text from the embedded glyph table, alpha-blended
fn draw_text(dst: &mut RgbaImage, text: &str, x: i64, y: i64, scale: u32, color: Rgba<u8>) {
    let mut pen_x = x;
    for c in text.chars() {
        if let Some(rows) = glyphs::glyph(c) {
            for (gy, row_bits) in rows.iter().enumerate() {
                for gx in 0..glyphs::GLYPH_WIDTH {
                    if row_bits & (1 << (glyphs::GLYPH_WIDTH - 1 - gx)) != 0 {
                        let px = pen_x + (gx * scale) as i64;
                        let py = y + (gy as u32 * scale) as i64;
                        fill_rect_blend(dst, px, py, scale, scale, color);
                    }
                }
            }
        }
        pen_x += (glyphs::GLYPH_ADVANCE * scale) as i64;
    }
}

fn fill_rect_blend(dst: &mut RgbaImage, x: i64, y: i64, w: u32, h: u32, color: Rgba<u8>) {
    let x0 = x.max(0) as u32;
    let y0 = y.max(0) as u32;
    let x1 = ((x + w as i64).max(0) as u32).min(dst.width());
    let y1 = ((y + h as i64).max(0) as u32).min(dst.height());
    for py in y0..y1 {
        for px in x0..x1 {
            blend_pixel(dst, px, py, color);
        }
    }
}
