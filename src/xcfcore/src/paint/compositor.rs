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

use tracing::debug;

use super::canvas::Canvas;
use super::color::*;
use super::dissolve::dissolve_tile;
use super::layer::{Layer, LayerKind};
use super::rasterop::{blend_gray, blend_rgb, composite_alpha, composite_rgb, mix_channel};
use super::tile::{Tile, TilePixels, TILE_SIZE};

/// A layer pixel that lands on the canvas
struct CoveredPixel<'a> {
    row: u32,
    col: u32,
    tile: &'a Tile,
    /// Offset of the pixel inside its tile
    i: usize,
    x: u32,
    y: u32,
}

fn covered_pixels<'a>(
    layer: &'a Layer,
    width: u32,
    height: u32,
) -> impl Iterator<Item = CoveredPixel<'a>> + 'a {
    layer.tiles.iter().flat_map(move |(row, col, tile)| {
        let (ox, oy) = layer.tile_origin(row, col);
        (0..tile.height)
            .flat_map(move |l| (0..tile.width).map(move |k| (k, l)))
            .filter_map(move |(k, l)| {
                let x = ox + k as i64;
                let y = oy + l as i64;
                if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
                    return None;
                }
                Some(CoveredPixel {
                    row,
                    col,
                    tile,
                    i: (l * tile.width + k) as usize,
                    x: x as u32,
                    y: y as u32,
                })
            })
    })
}

/// Source alpha with the layer opacity and the mask (if applied) folded in
fn effective_alpha(layer: &Layer, px: &CoveredPixel, alpha: u8) -> u32 {
    let a = u8_mult(alpha as u32, layer.props.opacity as u32);
    match layer.mask_value(px.row, px.col, px.i) {
        Some(m) => u8_mult(a, m as u32),
        None => a,
    }
}

fn palette_color(palette: &[Rgb8], index: u8) -> Rgb8 {
    palette.get(index as usize).copied().unwrap_or([0, 0, 0])
}

/// Indexed pixels cannot be mixed, so alpha is thresholded
fn threshold(alpha: u32) -> bool {
    alpha > 127
}

fn source_color(layer: &Layer, px: &CoveredPixel, palette: &[Rgb8]) -> Rgb8 {
    match &px.tile.pixels {
        TilePixels::Color(p) => pixel_rgb(p[px.i]),
        _ if layer.kind.is_indexed() => palette_color(palette, px.tile.index_at(px.i)),
        _ => [px.tile.index_at(px.i); 3],
    }
}

/// Apply the dissolve effect to every tile of a dissolve-mode layer.
///
/// Only layers with an alpha channel stored alongside the color are affected.
fn apply_dissolve(layer: &mut Layer) {
    if !layer.props.mode.is_dissolve()
        || !matches!(layer.kind, LayerKind::Rgba | LayerKind::GrayA)
    {
        return;
    }
    for (row, col, tile) in layer.tiles.iter_mut() {
        dissolve_tile(tile, col * TILE_SIZE, row * TILE_SIZE);
    }
}

/// Copy the first visible layer onto a freshly initialized canvas.
///
/// Blend modes do not apply to the bottom layer, except for the
/// dissolve effect.
pub fn copy_layer(canvas: &mut Canvas, layer: &mut Layer, palette: &[Rgb8]) {
    apply_dissolve(layer);
    let layer = &*layer;

    let (width, height) = (canvas.width(), canvas.height());
    let indexed_canvas = canvas.format().is_indexed();

    for px in covered_pixels(layer, width, height) {
        let alpha = px.tile.alpha_at(px.i);

        if indexed_canvas {
            let index = px.tile.index_at(px.i);
            match layer.kind {
                LayerKind::IndexedA => {
                    if threshold(effective_alpha(layer, &px, alpha)) {
                        canvas.set_index(px.x, px.y, index.saturating_add(1));
                    } else {
                        canvas.set_index(px.x, px.y, 0);
                    }
                }
                _ => canvas.set_index(px.x, px.y, index),
            }
        } else {
            let color = source_color(layer, &px, palette);
            let a = effective_alpha(layer, &px, alpha);
            let a = if layer.kind.is_indexed() {
                if threshold(a) {
                    OPAQUE_OPACITY
                } else {
                    0
                }
            } else {
                a as u8
            };
            canvas.set_color(px.x, px.y, pixel_from_rgb(color, a));
        }
    }
}

/// Composite a layer onto the canvas with the layer's blend mode.
///
/// The canvas must accept the layer's kind (see [`Canvas::accepts`]);
/// layers it does not accept are skipped.
pub fn merge_layer(canvas: &mut Canvas, layer: &mut Layer, palette: &[Rgb8]) {
    if layer.props.opacity == 0 {
        return;
    }

    if !canvas.accepts(layer.kind) {
        debug!(
            "Cannot merge {:?} layer \"{}\" into {:?} canvas",
            layer.kind,
            layer.props.name,
            canvas.format()
        );
        return;
    }

    if layer.props.blend_space != 0 || layer.props.composite_space != 0 {
        debug!(
            "Layer \"{}\": unhandled blend space {} / composite space {}",
            layer.props.name, layer.props.blend_space, layer.props.composite_space
        );
    }
    if layer.props.composite_mode != 0 {
        debug!(
            "Layer \"{}\": unhandled composite mode {}",
            layer.props.name, layer.props.composite_mode
        );
    }

    apply_dissolve(layer);
    let layer = &*layer;

    let (width, height) = (canvas.width(), canvas.height());
    let indexed_canvas = canvas.format().is_indexed();
    let mode = layer.props.mode;

    for px in covered_pixels(layer, width, height) {
        let alpha = px.tile.alpha_at(px.i);

        if layer.kind.is_indexed() {
            let index = px.tile.index_at(px.i);
            if indexed_canvas {
                if layer.kind == LayerKind::Indexed {
                    canvas.set_index(px.x, px.y, index);
                } else if threshold(effective_alpha(layer, &px, alpha)) {
                    canvas.set_index(px.x, px.y, index.saturating_add(1));
                }
            } else if threshold(effective_alpha(layer, &px, alpha)) {
                canvas.set_color(
                    px.x,
                    px.y,
                    pixel_from_rgb(palette_color(palette, index), OPAQUE_OPACITY),
                );
            }
            continue;
        }

        if alpha == 0 {
            continue;
        }

        if layer.kind.is_gray() {
            let src = px.tile.index_at(px.i);
            let dst = canvas.index(px.x, px.y);
            let blended = blend_gray(mode.blendmode, src, dst);

            if indexed_canvas {
                let src_a = effective_alpha(layer, &px, alpha) as u8;
                canvas.set_index(px.x, px.y, mix_channel(blended, dst, src_a, OPAQUE_OPACITY));
            } else {
                let dst_a = canvas.color(px.x, px.y)[ALPHA_CHANNEL];
                let mut src_a = alpha;
                if mode.blendmode.has_gray_op() {
                    src_a = src_a.min(dst_a);
                }
                let src_a = effective_alpha(layer, &px, src_a) as u8;
                let new_a = composite_alpha(src_a, dst_a);
                let g = mix_channel(blended, dst, src_a, new_a);
                canvas.set_color(
                    px.x,
                    px.y,
                    rgba8(g, g, g, if mode.affects_alpha { new_a } else { dst_a }),
                );
            }
        } else {
            let dst = canvas.color(px.x, px.y);
            let src = source_color(layer, &px, palette);
            let blended = blend_rgb(mode.blendmode, src, pixel_rgb(dst));

            let mut src_a = alpha;
            if mode.blendmode.has_color_op() {
                src_a = src_a.min(dst[ALPHA_CHANNEL]);
            }
            let src_a = effective_alpha(layer, &px, src_a) as u8;

            canvas.set_color(
                px.x,
                px.y,
                composite_rgb(blended, src_a, dst, mode.affects_alpha),
            );
        }
    }
}
