use thiserror::Error;

#[derive(Error, Debug)]
pub enum TileError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid dimensions: {0}")]
    InvalidDimension(String),
    #[error("Rendering error at tile {}-{}: {reason}", row + 1, col + 1)]
    Decode { col: u32, row: u32, reason: String },
    #[error("Export failed: {0}")]
    Export(String),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, TileError>;

/// Page orientation preference
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OrientationPref {
    Portrait,
    Landscape,
    /// Pick whichever orientation yields the fewer tiles
    #[default]
    Automatic,
}

/// Resolved page orientation after planning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    /// Portrait: page dimensions as given
    #[default]
    Portrait,
    /// Landscape: width and height swapped
    Landscape,
}

/// Standard output page sizes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PageSize {
    A4,
    A3,
    Letter,
    Custom { width_cm: f32, height_cm: f32 },
}

impl PageSize {
    /// Get base dimensions in centimeters (portrait: width < height)
    pub fn dimensions_cm(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (21.0, 29.7),
            PageSize::A3 => (29.7, 42.0),
            PageSize::Letter => (21.59, 27.94),
            PageSize::Custom {
                width_cm,
                height_cm,
            } => (width_cm, height_cm),
        }
    }

    /// Get dimensions with orientation applied
    pub fn dimensions_with_orientation(self, orientation: Orientation) -> (f32, f32) {
        let (w, h) = self.dimensions_cm();
        match orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }
}

/// Output quality tier, mapping to a fixed rendering density
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Quality {
    /// 36 px per cm
    Low,
    /// 72 px per cm
    #[default]
    Standard,
    /// 300 px per cm
    High,
}

impl Quality {
    /// Rendering density in pixels per centimeter
    pub fn px_per_cm(self) -> f32 {
        match self {
            Quality::Low => 36.0,
            Quality::Standard => 72.0,
            Quality::High => 300.0,
        }
    }
}

/// Output format for the tiled pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExportFormat {
    /// Multi-page PDF, one page per tile plus an assembly-guide page
    #[default]
    Pdf,
    /// One SVG per tile, packed into an archive with the guide
    SvgPerTile,
    /// Single SVG spanning the whole grid, packed with the guide
    SvgSingle,
}

#[cfg(feature = "serde")]
mod serde_impls {
    use super::*;
    use serde::de::{self, MapAccess, Visitor};
    use serde::ser::SerializeStruct;
    use serde::{Deserialize, Serialize};
    use std::fmt;

    impl Serialize for PageSize {
        fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            match self {
                PageSize::A4 => serializer.serialize_str("A4"),
                PageSize::A3 => serializer.serialize_str("A3"),
                PageSize::Letter => serializer.serialize_str("Letter"),
                PageSize::Custom {
                    width_cm,
                    height_cm,
                } => {
                    let mut s = serializer.serialize_struct("Custom", 2)?;
                    s.serialize_field("width_cm", width_cm)?;
                    s.serialize_field("height_cm", height_cm)?;
                    s.end()
                }
            }
        }
    }

    impl<'de> Deserialize<'de> for PageSize {
        fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            struct PageSizeVisitor;

            impl<'de> Visitor<'de> for PageSizeVisitor {
                type Value = PageSize;

                fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                    formatter.write_str("a page size")
                }

                fn visit_str<E>(self, value: &str) -> std::result::Result<PageSize, E>
                where
                    E: de::Error,
                {
                    match value {
                        "A4" => Ok(PageSize::A4),
                        "A3" => Ok(PageSize::A3),
                        "Letter" => Ok(PageSize::Letter),
                        _ => Err(de::Error::unknown_variant(
                            value,
                            &["A4", "A3", "Letter", "Custom"],
                        )),
                    }
                }

                fn visit_map<M>(self, mut map: M) -> std::result::Result<PageSize, M::Error>
                where
                    M: MapAccess<'de>,
                {
                    let mut width_cm = None;
                    let mut height_cm = None;

                    while let Some(key) = map.next_key::<String>()? {
                        match key.as_str() {
                            "width_cm" => width_cm = Some(map.next_value()?),
                            "height_cm" => height_cm = Some(map.next_value()?),
                            _ => {
                                let _: serde::de::IgnoredAny = map.next_value()?;
                            }
                        }
                    }

                    match (width_cm, height_cm) {
                        (Some(w), Some(h)) => Ok(PageSize::Custom {
                            width_cm: w,
                            height_cm: h,
                        }),
                        _ => Err(de::Error::missing_field("width_cm or height_cm")),
                    }
                }
            }

            deserializer.deserialize_any(PageSizeVisitor)
        }
    }
}
