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

use lazy_static::lazy_static;

use super::color::ALPHA_CHANNEL;
use super::tile::{Tile, TilePixels};

const RANDOM_TABLE_SIZE: usize = 4096;
const RANDOM_SEED: u32 = 314159265;

/// glibc's rand_r
fn rand_r(seed: &mut u32) -> u32 {
    let mut next = *seed;

    next = next.wrapping_mul(1103515245).wrapping_add(12345);
    let mut result = (next / 65536) % 2048;

    next = next.wrapping_mul(1103515245).wrapping_add(12345);
    result <<= 10;
    result ^= (next / 65536) % 1024;

    next = next.wrapping_mul(1103515245).wrapping_add(12345);
    result <<= 10;
    result ^= (next / 65536) % 1024;

    *seed = next;
    result
}

lazy_static! {
    /// Per-row seeds: a fixed-seed sequence, shuffled with the same generator
    static ref RANDOM_TABLE: Vec<u32> = {
        let mut next = RANDOM_SEED;
        let mut values: Vec<u32> = (0..RANDOM_TABLE_SIZE).map(|_| rand_r(&mut next)).collect();

        for i in 0..RANDOM_TABLE_SIZE {
            let swap = i + rand_r(&mut next) as usize % (RANDOM_TABLE_SIZE - i);
            values.swap(i, swap);
        }

        values
    };
}

/// The random bytes for one row of a tile.
///
/// `x` and `y` are the layer coordinates of the row's first pixel. The
/// generator is wound forward past the pixels left of the tile, so a row
/// gets the same sequence regardless of how it is split into tiles.
fn row_sequence(x: u32, y: u32) -> impl Iterator<Item = u8> {
    let mut next = RANDOM_TABLE[y as usize % RANDOM_TABLE_SIZE];
    for _ in 0..x {
        rand_r(&mut next);
    }
    std::iter::repeat_with(move || (rand_r(&mut next) & 0xff) as u8)
}

/// Apply the dissolve effect to a tile whose top-left pixel is at (x, y)
/// in layer coordinates.
///
/// Each pixel is kept if its random byte is at most the pixel's alpha and
/// made fully transparent otherwise.
pub fn dissolve_tile(tile: &mut Tile, x: u32, y: u32) {
    let width = tile.width as usize;
    match &mut tile.pixels {
        TilePixels::Color(pixels) => {
            for (l, row) in pixels.chunks_mut(width).enumerate() {
                for (px, r) in row.iter_mut().zip(row_sequence(x, y + l as u32)) {
                    if r > px[ALPHA_CHANNEL] {
                        px[ALPHA_CHANNEL] = 0;
                    }
                }
            }
        }
        TilePixels::IndexAlpha { alpha, .. } => {
            for (l, row) in alpha.chunks_mut(width).enumerate() {
                for (a, r) in row.iter_mut().zip(row_sequence(x, y + l as u32)) {
                    if r > *a {
                        *a = 0;
                    }
                }
            }
        }
        TilePixels::Index(_) => {}
    }
}
