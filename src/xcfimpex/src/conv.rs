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

use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

use xcfcore::paint::color::*;
use xcfcore::paint::{Canvas, CanvasFormat};

/// Expand a canvas of any format to straight alpha RGBA
pub fn to_rgba_image(canvas: &Canvas) -> RgbaImage {
    let img = canvas.to_image8();

    // BGRA to RGBA
    let mut rgba = bytemuck::cast_slice::<Pixel8, u8>(&img.pixels).to_vec();
    rgba.chunks_exact_mut(4)
        .for_each(|px| px.swap(BLUE_CHANNEL, RED_CHANNEL));

    RgbaImage::from_raw(canvas.width(), canvas.height(), rgba)
        .unwrap_or_else(|| RgbaImage::new(canvas.width(), canvas.height()))
}

/// Convert a canvas to the closest image buffer type.
///
/// Opaque RGB canvases become RGB images and grayscale canvases become
/// 8 bit luma images. Everything else is expanded to RGBA.
pub fn to_dynamic_image(canvas: &Canvas) -> DynamicImage {
    let (w, h) = (canvas.width(), canvas.height());
    match canvas.format() {
        CanvasFormat::Rgb32 => DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
            image::Rgb(pixel_rgb(canvas.color(x, y)))
        })),
        CanvasFormat::Gray8 => DynamicImage::ImageLuma8(GrayImage::from_fn(w, h, |x, y| {
            image::Luma([canvas.index(x, y)])
        })),
        _ => DynamicImage::ImageRgba8(to_rgba_image(canvas)),
    }
}
