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

use image::error::ImageError;
use image::DynamicImage;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::{fmt, io};

use xcfcore::paint::Canvas;

pub mod conv;
pub mod xcf;

pub use xcf::{XcfError, XcfImage};

#[derive(Debug)]
pub enum ImpexError {
    IoError(io::Error),
    CodecError(ImageError),
    XcfError(XcfError),
    UnsupportedFormat,
}

impl fmt::Display for ImpexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImpexError::IoError(e) => e.fmt(f),
            ImpexError::CodecError(e) => e.fmt(f),
            ImpexError::XcfError(e) => e.fmt(f),
            ImpexError::UnsupportedFormat => write!(f, "unsupported format"),
        }
    }
}

impl std::error::Error for ImpexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImpexError::IoError(e) => Some(e),
            ImpexError::CodecError(e) => Some(e),
            ImpexError::XcfError(e) => Some(e),
            ImpexError::UnsupportedFormat => None,
        }
    }
}

impl From<io::Error> for ImpexError {
    fn from(err: io::Error) -> Self {
        Self::IoError(err)
    }
}

impl From<ImageError> for ImpexError {
    fn from(err: ImageError) -> Self {
        Self::CodecError(err)
    }
}

impl From<XcfError> for ImpexError {
    fn from(err: XcfError) -> Self {
        match err {
            XcfError::Io(e) => Self::IoError(e),
            e => Self::XcfError(e),
        }
    }
}

pub type ImageImportResult = Result<XcfImage, ImpexError>;
pub type ImageExportResult = Result<(), ImpexError>;

/// Load and flatten an XCF file
pub fn load_xcf<P>(path: P) -> ImageImportResult
where
    P: AsRef<Path>,
{
    fn inner(path: &Path) -> ImageImportResult {
        let file = BufReader::new(File::open(path)?);
        Ok(xcf::read_xcf(file)?)
    }
    inner(path.as_ref())
}

/// Load an XCF file with custom sanity limits
pub fn load_xcf_with_limits<P>(path: P, limits: &xcf::Limits) -> ImageImportResult
where
    P: AsRef<Path>,
{
    fn inner(path: &Path, limits: &xcf::Limits) -> ImageImportResult {
        let file = BufReader::new(File::open(path)?);
        Ok(xcf::read_xcf_with_limits(file, limits)?)
    }
    inner(path.as_ref(), limits)
}

/// Save a flattened image in the format given by the file extension
pub fn save_flat_image<P>(path: P, canvas: &Canvas) -> ImageExportResult
where
    P: AsRef<Path>,
{
    fn inner(path: &Path, canvas: &Canvas) -> ImageExportResult {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase());

        let img = conv::to_dynamic_image(canvas);
        let img = match ext.as_deref() {
            // No alpha channel support
            Some("jpg") | Some("jpeg") => DynamicImage::ImageRgb8(img.to_rgb8()),
            Some(_) => img,
            None => return Err(ImpexError::UnsupportedFormat),
        };

        img.save(path)?;
        Ok(())
    }
    inner(path.as_ref(), canvas)
}
