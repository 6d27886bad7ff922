// This file is part of xcfkit.
// Copyright (C) 2023 xcfkit contributors
//
// xcfkit is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// As additional permission under section 7, you are allowed to distribute
// the software through an app store, even if that store has restrictive
// terms and conditions that are incompatible with the GPL, provided that
// the source is also available under the GPL with or without this permission
// through a channel without those restrictive terms and conditions.
//
// xcfkit is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with xcfkit.  If not, see <https://www.gnu.org/licenses/>.

use num_enum::IntoPrimitive;
use num_enum::TryFromPrimitive;
use std::{fmt, io};

use xcfcore::paint::Canvas;

mod cursor;
mod hierarchy;
mod layer;
mod mask;
mod property;
mod reader;
mod rle;

pub use cursor::XcfCursor;
pub use reader::{can_read, read_info, read_size, read_xcf, read_xcf_with_limits};
pub use reader::{LayerInfo, XcfInfo};
pub use rle::decode_rle;

/// Highest file format version this reader understands
pub const MAX_SUPPORTED_VERSION: u32 = 11;

#[derive(Debug)]
pub enum XcfError {
    Io(io::Error),
    /// The input ended in the middle of a structure
    Truncated,
    /// Not an XCF file, or a structure this reader cannot interpret
    Format(String),
    /// Values that are out of bounds or inconsistent with each other
    Corrupt(String),
    Unsupported(String),
    NoVisibleLayers,
}

impl fmt::Display for XcfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XcfError::Io(e) => e.fmt(f),
            XcfError::Truncated => write!(f, "unexpected end of file"),
            XcfError::Format(msg) => write!(f, "invalid XCF file: {msg}"),
            XcfError::Corrupt(msg) => write!(f, "corrupt XCF file: {msg}"),
            XcfError::Unsupported(msg) => write!(f, "unsupported XCF feature: {msg}"),
            XcfError::NoVisibleLayers => write!(f, "no visible layers"),
        }
    }
}

impl std::error::Error for XcfError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            XcfError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for XcfError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Self::Truncated,
            _ => Self::Io(err),
        }
    }
}

pub type XcfResult<T> = Result<T, XcfError>;

impl Limits {
    /// Check a declared raster size against the dimension and pixel caps
    pub fn check_size(&self, what: &str, width: u32, height: u32) -> XcfResult<()> {
        if width > self.max_dimension
            || height > self.max_dimension
            || width as u64 * height as u64 > self.max_pixels
        {
            return Err(XcfError::Corrupt(format!(
                "{} is too large ({}x{})",
                what, width, height
            )));
        }
        Ok(())
    }
}

/// Sanity caps applied while parsing untrusted input
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Limits {
    /// Largest accepted layer width or height
    pub max_dimension: u32,
    /// Largest accepted pixel count of the image or of one layer
    pub max_pixels: u64,
    /// Largest accepted payload of an ordinary property
    pub max_property_size: u32,
    /// Most properties accepted in one property list
    pub max_properties: u32,
    /// Most entries accepted in the layer offset table
    pub max_layers: u32,
    /// Most entries accepted in a hierarchy's level offset list
    pub max_levels: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_dimension: 32767,
            max_pixels: 1 << 28,
            max_property_size: 256000,
            max_properties: 10000,
            max_layers: 65536,
            max_levels: 32,
        }
    }
}

/// Property record tags
#[derive(Copy, Clone, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum PropType {
    End = 0,
    Colormap,
    ActiveLayer,
    ActiveChannel,
    Selection,
    FloatingSelection,
    Opacity,
    Mode,
    Visible,
    Linked,
    LockAlpha,
    ApplyMask,
    EditMask,
    ShowMask,
    ShowMasked,
    Offsets,
    Color,
    Compression,
    Guides,
    Resolution,
    Tattoo,
    Parasites,
    Unit,
    Paths,
    UserUnit,
    Vectors,
    TextLayerFlags,
    OldSamplePoints,
    LockContent,
    GroupItem,
    ItemPath,
    GroupItemFlags,
    LockPosition,
    FloatOpacity,
    ColorTag,
    CompositeMode,
    CompositeSpace,
    BlendSpace,
    FloatColor,
    SamplePoints,
}

/// Tile compression methods
#[derive(Copy, Clone, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Compression {
    None = 0,
    Rle,
    Zlib,
    Fractal,
}

/// The document's base color model
#[derive(Copy, Clone, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum BaseType {
    Rgb = 0,
    Gray,
    Indexed,
}

/// A decoded and flattened XCF document
#[derive(Clone, Debug)]
pub struct XcfImage {
    pub version: u32,
    pub canvas: Canvas,
    /// The "gimp-comment" parasite
    pub comment: Option<String>,
    /// The "gimp-image-metadata" parasite
    pub metadata: Option<String>,
    /// The "icc-profile" parasite
    pub icc_profile: Option<Vec<u8>>,
    /// Horizontal and vertical resolution in dots per meter
    pub dots_per_meter: Option<(i32, i32)>,
}

impl XcfImage {
    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }
}
