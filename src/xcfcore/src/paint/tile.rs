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
use super::layer::LayerKind;

pub const TILE_SIZE: u32 = 64;

/// Decoded pixel content of a tile
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TilePixels {
    /// RGB and RGBA layers. Alpha is 255 for layers without an alpha channel
    Color(Vec<Pixel8>),
    /// Gray levels, palette indices or mask values
    Index(Vec<u8>),
    /// Gray levels or palette indices with a parallel alpha plane
    IndexAlpha { index: Vec<u8>, alpha: Vec<u8> },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    pub width: u32,
    pub height: u32,
    pub pixels: TilePixels,
}

impl Tile {
    pub fn div_up(x: u32) -> u32 {
        (x + TILE_SIZE - 1) / TILE_SIZE
    }

    /// Width (or height) of the tile at the given column (or row)
    /// of a layer `total` pixels wide (or high).
    pub fn extent(index: u32, total: u32) -> u32 {
        (total - index * TILE_SIZE).min(TILE_SIZE)
    }

    /// Assemble a tile of the given layer kind from decoded channel bytes.
    ///
    /// `data` holds `width*height` pixels with their channels interleaved
    /// `stride` bytes apart. Channels beyond the stride read as zero, except
    /// a missing alpha channel, which reads as opaque.
    /// Palette indices at or past `palette_len` are replaced with index 0.
    pub fn assemble(
        kind: LayerKind,
        width: u32,
        height: u32,
        data: &[u8],
        stride: usize,
        palette_len: usize,
    ) -> Tile {
        let len = (width * height) as usize;
        let channel = |i: usize, c: usize, default: u8| -> u8 {
            if c < stride {
                data.get(i * stride + c).copied().unwrap_or(default)
            } else {
                default
            }
        };
        let checked_index = |v: u8| -> u8 {
            if (v as usize) < palette_len {
                v
            } else {
                0
            }
        };

        let pixels = match kind {
            LayerKind::Rgb => TilePixels::Color(
                (0..len)
                    .map(|i| rgb8(channel(i, 0, 0), channel(i, 1, 0), channel(i, 2, 0)))
                    .collect(),
            ),
            LayerKind::Rgba => TilePixels::Color(
                (0..len)
                    .map(|i| {
                        rgba8(
                            channel(i, 0, 0),
                            channel(i, 1, 0),
                            channel(i, 2, 0),
                            channel(i, 3, 255),
                        )
                    })
                    .collect(),
            ),
            LayerKind::Gray => TilePixels::Index((0..len).map(|i| channel(i, 0, 0)).collect()),
            LayerKind::Indexed => TilePixels::Index(
                (0..len)
                    .map(|i| checked_index(channel(i, 0, 0)))
                    .collect(),
            ),
            LayerKind::GrayA => TilePixels::IndexAlpha {
                index: (0..len).map(|i| channel(i, 0, 0)).collect(),
                alpha: (0..len).map(|i| channel(i, 1, 255)).collect(),
            },
            LayerKind::IndexedA => TilePixels::IndexAlpha {
                index: (0..len)
                    .map(|i| checked_index(channel(i, 0, 0)))
                    .collect(),
                alpha: (0..len).map(|i| channel(i, 1, 255)).collect(),
            },
        };

        Tile {
            width,
            height,
            pixels,
        }
    }

    /// Assemble a single channel mask tile
    pub fn assemble_mask(width: u32, height: u32, data: &[u8], stride: usize) -> Tile {
        let len = (width * height) as usize;
        Tile {
            width,
            height,
            pixels: TilePixels::Index(
                (0..len)
                    .map(|i| data.get(i * stride).copied().unwrap_or(0))
                    .collect(),
            ),
        }
    }

    /// A tile with no stored content
    pub fn blank(kind: LayerKind, width: u32, height: u32) -> Tile {
        let zeros = vec![0; (width * height) as usize * kind.bytes_per_pixel()];
        Self::assemble(kind, width, height, &zeros, kind.bytes_per_pixel(), 0)
    }

    pub fn blank_mask(width: u32, height: u32) -> Tile {
        Self::assemble_mask(width, height, &[], 1)
    }

    /// Gray level, palette index or mask value at the given pixel offset
    pub fn index_at(&self, i: usize) -> u8 {
        match &self.pixels {
            TilePixels::Index(index) | TilePixels::IndexAlpha { index, .. } => index[i],
            TilePixels::Color(px) => gray_level(pixel_rgb(px[i])),
        }
    }

    pub fn alpha_at(&self, i: usize) -> u8 {
        match &self.pixels {
            TilePixels::Color(px) => px[i][ALPHA_CHANNEL],
            TilePixels::IndexAlpha { alpha, .. } => alpha[i],
            TilePixels::Index(_) => 255,
        }
    }
}

/// A layer's tiles, stored row-major and addressed by (row, column)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileGrid<T> {
    rows: u32,
    cols: u32,
    tiles: Vec<T>,
}

impl<T> TileGrid<T> {
    /// Number of (rows, columns) needed to cover an image of the given size
    pub fn dimensions(width: u32, height: u32) -> (u32, u32) {
        (Tile::div_up(height), Tile::div_up(width))
    }

    /// Build a grid from a row-major tile vector.
    ///
    /// Returns None if the vector does not hold exactly the number of
    /// tiles an image of this size needs.
    pub fn new(width: u32, height: u32, tiles: Vec<T>) -> Option<Self> {
        let (rows, cols) = Self::dimensions(width, height);
        if tiles.len() != (rows * cols) as usize {
            return None;
        }
        Some(TileGrid { rows, cols, tiles })
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn get(&self, row: u32, col: u32) -> Option<&T> {
        if row < self.rows && col < self.cols {
            self.tiles.get((row * self.cols + col) as usize)
        } else {
            None
        }
    }

    /// Iterate through all tiles as (row, col, tile)
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, &T)> {
        let cols = self.cols;
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, t)| (i as u32 / cols, i as u32 % cols, t))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, u32, &mut T)> {
        let cols = self.cols;
        self.tiles
            .iter_mut()
            .enumerate()
            .map(move |(i, t)| (i as u32 / cols, i as u32 % cols, t))
    }
}
