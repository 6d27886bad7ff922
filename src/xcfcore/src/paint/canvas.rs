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

use super::color::*;
use super::image::{Image8, IndexImage};
use super::layer::LayerKind;

/// Pixel format of the flattened image
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CanvasFormat {
    /// 1 bit palette image
    Mono,
    /// 8 bit palette image
    Indexed8,
    /// 8 bit palette image with a gray ramp palette
    Gray8,
    /// Opaque RGB
    Rgb32,
    /// RGB with alpha
    Argb32,
}

impl CanvasFormat {
    pub fn is_indexed(self) -> bool {
        matches!(
            self,
            CanvasFormat::Mono | CanvasFormat::Indexed8 | CanvasFormat::Gray8
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            CanvasFormat::Mono => "1-bit indexed",
            CanvasFormat::Indexed8 => "8-bit indexed",
            CanvasFormat::Gray8 => "8-bit grayscale",
            CanvasFormat::Rgb32 => "32-bit RGB",
            CanvasFormat::Argb32 => "32-bit RGBA",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CanvasPixels {
    Indexed(IndexImage),
    Color(Image8),
}

/// The flattened image all layers are composited into
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    format: CanvasFormat,
    palette: Vec<Pixel8>,
    pixels: CanvasPixels,
}

impl Canvas {
    pub fn new_color(width: u32, height: u32, alpha: bool, fill: Pixel8) -> Canvas {
        let (format, fill) = if alpha {
            (CanvasFormat::Argb32, fill)
        } else {
            (
                CanvasFormat::Rgb32,
                pixel_from_rgb(pixel_rgb(fill), OPAQUE_OPACITY),
            )
        };
        Canvas {
            format,
            palette: Vec::new(),
            pixels: CanvasPixels::Color(Image8::filled(width as usize, height as usize, fill)),
        }
    }

    pub fn new_indexed(
        width: u32,
        height: u32,
        format: CanvasFormat,
        palette: Vec<Pixel8>,
        fill: u8,
    ) -> Canvas {
        debug_assert!(format.is_indexed());
        Canvas {
            format,
            palette,
            pixels: CanvasPixels::Indexed(IndexImage::filled(
                width as usize,
                height as usize,
                fill,
            )),
        }
    }

    /// Create the canvas the first visible layer is copied onto.
    ///
    /// The pixel format depends on the layer's kind and opacity and on
    /// the size of the document palette. Palettes of layers with alpha get
    /// a transparent entry at index 0, shifting the document colors up by
    /// one, unless they are too large to fit in an 8 bit palette.
    ///
    /// Returns None if an indexed layer's palette does not fit in 8 bits.
    pub fn for_first_layer(
        width: u32,
        height: u32,
        kind: LayerKind,
        opacity: u8,
        palette: &[Rgb8],
    ) -> Option<Canvas> {
        let colors = || palette.iter().map(|&c| pixel_from_rgb(c, OPAQUE_OPACITY));

        Some(match kind {
            LayerKind::Rgb if opacity == OPAQUE_OPACITY => {
                Self::new_color(width, height, false, WHITE_PIXEL8)
            }
            LayerKind::Rgb | LayerKind::Rgba | LayerKind::GrayA => {
                Self::new_color(width, height, true, TRANSPARENT_WHITE_PIXEL8)
            }
            LayerKind::Gray if opacity == OPAQUE_OPACITY => Self::new_indexed(
                width,
                height,
                CanvasFormat::Gray8,
                GRAY_PALETTE.clone(),
                255,
            ),
            LayerKind::Gray => Self::new_color(width, height, true, TRANSPARENT_WHITE_PIXEL8),
            LayerKind::Indexed => {
                let format = match palette.len() {
                    0..=2 => CanvasFormat::Mono,
                    3..=256 => CanvasFormat::Indexed8,
                    _ => return None,
                };
                Self::new_indexed(width, height, format, colors().collect(), 0)
            }
            LayerKind::IndexedA => {
                if palette.len() >= 256 {
                    Self::new_color(width, height, true, TRANSPARENT_WHITE_PIXEL8)
                } else {
                    let format = if palette.len() == 1 {
                        CanvasFormat::Mono
                    } else {
                        CanvasFormat::Indexed8
                    };
                    let promoted = std::iter::once(TRANSPARENT_WHITE_PIXEL8)
                        .chain(colors())
                        .collect();
                    Self::new_indexed(width, height, format, promoted, 0)
                }
            }
        })
    }

    pub fn format(&self) -> CanvasFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        match &self.pixels {
            CanvasPixels::Indexed(img) => img.width as u32,
            CanvasPixels::Color(img) => img.width as u32,
        }
    }

    pub fn height(&self) -> u32 {
        match &self.pixels {
            CanvasPixels::Indexed(img) => img.height as u32,
            CanvasPixels::Color(img) => img.height as u32,
        }
    }

    /// The palette of an indexed canvas (empty for RGB canvases)
    pub fn palette(&self) -> &[Pixel8] {
        &self.palette
    }

    /// Can a layer of this kind be composited onto this canvas?
    pub fn accepts(&self, kind: LayerKind) -> bool {
        match self.format {
            CanvasFormat::Rgb32 | CanvasFormat::Argb32 => true,
            CanvasFormat::Gray8 => kind.is_gray(),
            CanvasFormat::Mono | CanvasFormat::Indexed8 => kind.is_indexed(),
        }
    }

    /// Palette index (or gray level) at the given position.
    /// RGB canvases return the pixel's gray level.
    pub fn index(&self, x: u32, y: u32) -> u8 {
        match &self.pixels {
            CanvasPixels::Indexed(img) => img.pixel(x as usize, y as usize),
            CanvasPixels::Color(img) => gray_level(pixel_rgb(img.pixel(x as usize, y as usize))),
        }
    }

    /// Set a palette index. Indices outside the palette are ignored.
    pub fn set_index(&mut self, x: u32, y: u32, index: u8) {
        if (index as usize) >= self.palette.len() {
            return;
        }
        if let CanvasPixels::Indexed(img) = &mut self.pixels {
            img.set_pixel(x as usize, y as usize, index);
        }
    }

    /// Color at the given position, with palettes resolved
    pub fn color(&self, x: u32, y: u32) -> Pixel8 {
        match &self.pixels {
            CanvasPixels::Indexed(img) => self
                .palette
                .get(img.pixel(x as usize, y as usize) as usize)
                .copied()
                .unwrap_or(ZERO_PIXEL8),
            CanvasPixels::Color(img) => img.pixel(x as usize, y as usize),
        }
    }

    /// Set a pixel of an RGB canvas. Alpha is ignored on opaque canvases.
    pub fn set_color(&mut self, x: u32, y: u32, color: Pixel8) {
        let opaque = self.format == CanvasFormat::Rgb32;
        if let CanvasPixels::Color(img) = &mut self.pixels {
            let color = if opaque {
                pixel_from_rgb(pixel_rgb(color), OPAQUE_OPACITY)
            } else {
                color
            };
            img.set_pixel(x as usize, y as usize, color);
        }
    }

    /// Convert to a straight alpha BGRA image
    pub fn to_image8(&self) -> Image8 {
        match &self.pixels {
            CanvasPixels::Color(img) => img.clone(),
            CanvasPixels::Indexed(img) => Image8 {
                pixels: img
                    .pixels
                    .iter()
                    .map(|&i| self.palette.get(i as usize).copied().unwrap_or(ZERO_PIXEL8))
                    .collect(),
                width: img.width,
                height: img.height,
            },
        }
    }
}
