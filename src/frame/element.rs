//! Numeric element types and row shapes carried by point-cloud frames.

use std::fmt;

use thiserror::Error;

/// Primitive element type of a point block.
///
/// Values are stored little-endian on the wire; the type only determines the
/// element width and how consumers should interpret the bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
}

impl ElementType {
    /// Width of a single element in bytes.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    /// Canonical short tag used when encoding chunk metadata.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::I8 => "i8",
            Self::U16 => "u16",
            Self::I16 => "i16",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    /// Parse a tag produced by [`ElementType::tag`].
    ///
    /// The long-form names used by common array libraries (`"float32"`,
    /// `"uint8"` and friends) are accepted as aliases so heterogeneous
    /// producers can share a consumer.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        let parsed = match tag {
            "u8" | "uint8" => Self::U8,
            "i8" | "int8" => Self::I8,
            "u16" | "uint16" => Self::U16,
            "i16" | "int16" => Self::I16,
            "u32" | "uint32" => Self::U32,
            "i32" | "int32" => Self::I32,
            "f32" | "float32" => Self::F32,
            "f64" | "float64" => Self::F64,
            _ => return None,
        };
        Some(parsed)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.tag()) }
}

/// Number of columns in each point row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RowWidth {
    /// `x, y, z`
    Xyz,
    /// `x, y, z, intensity`
    Xyzi,
}

impl RowWidth {
    /// Column count as carried on the wire.
    #[must_use]
    pub const fn get(self) -> u8 {
        match self {
            Self::Xyz => 3,
            Self::Xyzi => 4,
        }
    }

    /// Column count as a `usize` for size arithmetic.
    #[must_use]
    pub const fn columns(self) -> usize { self.get() as usize }
}

/// Raised when a row width other than 3 or 4 is requested.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("row width must be 3 or 4 columns, found {0}")]
pub struct InvalidRowWidth(pub u8);

impl TryFrom<u8> for RowWidth {
    type Error = InvalidRowWidth;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            3 => Ok(Self::Xyz),
            4 => Ok(Self::Xyzi),
            other => Err(InvalidRowWidth(other)),
        }
    }
}

impl fmt::Display for RowWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.get()) }
}
