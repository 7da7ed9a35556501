//! Uploaded pattern artifacts and the decode capability boundary
//!
//! The core never decodes vector or paginated-document sources itself;
//! it only requires the [`SourceDecode`] capability "render this
//! artifact into a pixel surface at a given size". A raster-backed
//! implementation is provided since the `image` crate covers it; SVG
//! and PDF adapters are supplied by the embedding application.

use crate::types::*;
use image::RgbaImage;
use image::imageops::FilterType;

/// Discriminated kind of an uploaded artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SourceKind {
    /// Raster still image (PNG, JPEG)
    Raster,
    /// Vector still image (SVG)
    Vector,
    /// Paginated document (PDF); only the first page is used
    Document,
}

impl SourceKind {
    /// Still images decode once and are repositioned per tile;
    /// paginated documents are re-rendered per tile at the target
    /// resolution.
    pub fn is_still_image(self) -> bool {
        matches!(self, SourceKind::Raster | SourceKind::Vector)
    }
}

/// The uploaded pattern artifact: immutable bytes plus detected kind.
///
/// Replaced wholesale on re-upload, never mutated in place.
#[derive(Debug, Clone)]
pub struct PatternSource {
    bytes: Vec<u8>,
    kind: SourceKind,
}

impl PatternSource {
    /// Wrap raw upload bytes, sniffing the content kind.
    ///
    /// `file_name` is used as a fallback when the bytes carry no
    /// recognizable signature. Zero-byte uploads and unrecognized
    /// content are rejected with `InvalidInput`.
    pub fn new(bytes: Vec<u8>, file_name: &str) -> Result<Self> {
        if bytes.is_empty() {
            return Err(TileError::InvalidInput(
                "Uploaded file is empty.".to_string(),
            ));
        }
        let kind = detect_kind(&bytes, file_name).ok_or_else(|| {
            TileError::InvalidInput(
                "Unsupported file type. Please upload SVG, PDF, PNG, or JPG files.".to_string(),
            )
        })?;
        Ok(Self { bytes, kind })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }
}

/// Sniff the artifact kind from magic bytes, falling back to the file
/// extension.
fn detect_kind(bytes: &[u8], file_name: &str) -> Option<SourceKind> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") || bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(SourceKind::Raster);
    }
    if bytes.starts_with(b"%PDF-") {
        return Some(SourceKind::Document);
    }
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(1024)]);
    if head.contains("<svg") {
        return Some(SourceKind::Vector);
    }

    let ext = file_name.rsplit('.').next()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" | "jpg" | "jpeg" => Some(SourceKind::Raster),
        "svg" => Some(SourceKind::Vector),
        "pdf" => Some(SourceKind::Document),
        _ => None,
    }
}

/// Capability to render a source artifact into a pixel surface.
///
/// Implementations scale the full pattern to exactly the requested
/// pixel size; the compositor handles per-tile positioning and
/// clipping. For paginated documents, implementations must fail when
/// the document has no pages.
pub trait SourceDecode: Send + Sync {
    fn decode(&mut self, target_width_px: u32, target_height_px: u32) -> Result<RgbaImage>;

    /// Native pixel dimensions of the artifact, once known
    fn native_size(&self) -> Option<(u32, u32)>;
}

/// Raster decoder backed by the `image` crate.
///
/// Decodes the artifact bytes once up front; each `decode` call only
/// resamples to the requested size.
pub struct RasterDecoder {
    decoded: image::DynamicImage,
}

impl RasterDecoder {
    pub fn new(source: &PatternSource) -> Result<Self> {
        if source.kind() != SourceKind::Raster {
            return Err(TileError::InvalidInput(
                "RasterDecoder only handles raster images.".to_string(),
            ));
        }
        let decoded = image::load_from_memory(source.bytes())?;
        Ok(Self { decoded })
    }
}

impl SourceDecode for RasterDecoder {
    fn decode(&mut self, target_width_px: u32, target_height_px: u32) -> Result<RgbaImage> {
        if target_width_px == 0 || target_height_px == 0 {
            return Err(TileError::InvalidDimension(
                "Decode target size must be non-zero.".to_string(),
            ));
        }
        Ok(self
            .decoded
            .resize_exact(target_width_px, target_height_px, FilterType::Triangle)
            .into_rgba8())
    }

    fn native_size(&self) -> Option<(u32, u32)> {
        Some((self.decoded.width(), self.decoded.height()))
    }
}
