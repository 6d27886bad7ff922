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

use std::io::{Read, Seek};
use tracing::{debug, warn};

use xcfcore::paint::{LayerKind, Tile, TileGrid, TILE_SIZE};

use super::cursor::XcfCursor;
use super::rle::decode_tile;
use super::{Compression, Limits, XcfError, XcfResult};

/// Largest plausible size of one stored tile: an uncompressed RGBA tile
/// plus the worst case RLE expansion.
pub const MAX_TILE_DATA_LENGTH: u64 = (TILE_SIZE * TILE_SIZE * 4) as u64 * 3 / 2;

/// What a pixel hierarchy holds
#[derive(Copy, Clone, Debug)]
pub enum TileContent {
    Layer { kind: LayerKind, palette_len: usize },
    Mask,
}

impl TileContent {
    fn expected_bpp(self) -> u32 {
        match self {
            TileContent::Layer { kind, .. } => kind.bytes_per_pixel() as u32,
            TileContent::Mask => 1,
        }
    }

    fn assemble(self, width: u32, height: u32, data: &[u8], stride: usize) -> Tile {
        match self {
            TileContent::Layer { kind, palette_len } => {
                Tile::assemble(kind, width, height, data, stride, palette_len)
            }
            TileContent::Mask => Tile::assemble_mask(width, height, data, stride),
        }
    }

    fn blank(self, width: u32, height: u32) -> Tile {
        match self {
            TileContent::Layer { kind, .. } => Tile::blank(kind, width, height),
            TileContent::Mask => Tile::blank_mask(width, height),
        }
    }
}

/// Load the top level of the pixel hierarchy at the cursor's position.
///
/// `width` and `height` are the dimensions of the layer (or mask)
/// the hierarchy belongs to.
pub fn read_hierarchy<R: Read + Seek>(
    cursor: &mut XcfCursor<R>,
    width: u32,
    height: u32,
    content: TileContent,
    compression: Compression,
    limits: &Limits,
) -> XcfResult<TileGrid<Tile>> {
    let h_width = cursor.read_i32()?;
    let h_height = cursor.read_i32()?;
    let bpp = cursor.read_u32()?;
    let level_offset = cursor.read_offset()?;

    if h_width != width as i32 || h_height != height as i32 {
        debug!(
            "Hierarchy size {}x{} differs from {}x{}",
            h_width, h_height, width, height
        );
    }

    if bpp == 0 || bpp > 4 {
        return Err(XcfError::Format(format!(
            "unsupported hierarchy depth of {} bytes per pixel",
            bpp
        )));
    }
    // The pixel layout follows the layer type. The declared depth only
    // sets the stride the stored channels are read at.
    if bpp != content.expected_bpp() {
        warn!(
            "{:?} hierarchy has {} bytes per pixel, expected {}",
            content,
            bpp,
            content.expected_bpp()
        );
    }

    // The lower resolution levels are never used, but the list
    // must be terminated.
    let mut levels = 0;
    while cursor.read_offset()? != 0 {
        levels += 1;
        if levels >= limits.max_levels {
            return Err(XcfError::Corrupt(format!(
                "more than {} hierarchy levels",
                limits.max_levels
            )));
        }
    }

    let saved_pos = cursor.position()?;
    cursor.seek(level_offset)?;
    let tiles = read_level(cursor, width, height, bpp as usize, content, compression)?;
    cursor.seek(saved_pos)?;

    Ok(tiles)
}

fn read_level<R: Read + Seek>(
    cursor: &mut XcfCursor<R>,
    width: u32,
    height: u32,
    bpp: usize,
    content: TileContent,
    compression: Compression,
) -> XcfResult<TileGrid<Tile>> {
    let _level_width = cursor.read_i32()?;
    let _level_height = cursor.read_i32()?;
    let mut offset = cursor.read_offset()?;

    let (rows, cols) = TileGrid::<Tile>::dimensions(width, height);
    let mut tiles = Vec::with_capacity((rows * cols) as usize);

    if offset == 0 {
        // A level without tile data: everything is blank
        for row in 0..rows {
            for col in 0..cols {
                tiles.push(content.blank(Tile::extent(col, width), Tile::extent(row, height)));
            }
        }
        return TileGrid::new(width, height, tiles)
            .ok_or_else(|| XcfError::Corrupt("tile count mismatch".into()));
    }

    for row in 0..rows {
        for col in 0..cols {
            if offset == 0 {
                return Err(XcfError::Corrupt(format!(
                    "expected {} tiles, got {}",
                    rows * cols,
                    tiles.len()
                )));
            }

            let saved_pos = cursor.position()?;
            let mut next_offset = cursor.read_offset()?;

            // The last tile's end is not stored
            if next_offset == 0 {
                next_offset = offset + MAX_TILE_DATA_LENGTH;
            }

            let tile_w = Tile::extent(col, width);
            let tile_h = Tile::extent(row, height);
            let pixels = (tile_w * tile_h) as usize;

            cursor.seek(offset)?;

            let data = match compression {
                Compression::None => cursor.read_bytes(pixels * bpp)?,
                Compression::Rle => {
                    let data_length = next_offset
                        .checked_sub(offset)
                        .filter(|&len| len <= MAX_TILE_DATA_LENGTH)
                        .ok_or_else(|| {
                            XcfError::Corrupt(format!(
                                "invalid tile data length ({} to {})",
                                offset, next_offset
                            ))
                        })?;

                    let (data, got) = cursor.read_up_to(data_length as usize)?;
                    if got == 0 && data_length > 0 {
                        return Err(XcfError::Truncated);
                    }
                    decode_tile(&data, pixels, bpp)?
                }
                other => {
                    return Err(XcfError::Unsupported(format!(
                        "{:?} tile compression",
                        other
                    )))
                }
            };

            tiles.push(content.assemble(tile_w, tile_h, &data, bpp));

            cursor.seek(saved_pos)?;
            offset = cursor.read_offset()?;
        }
    }

    TileGrid::new(width, height, tiles)
        .ok_or_else(|| XcfError::Corrupt("tile count mismatch".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use xcfcore::paint::color::rgb8;
    use xcfcore::paint::TilePixels;

    fn be(values: &[u32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_be_bytes()).collect()
    }

    /// A hierarchy at offset 0 whose level starts at offset 100
    fn hierarchy(width: u32, height: u32, bpp: u32, tiles: &[Vec<u8>]) -> Vec<u8> {
        let mut data = be(&[width, height, bpp, 100, 0]);
        data.resize(100, 0xee);

        data.extend(be(&[width, height]));
        let table_len = (tiles.len() as u32 + 1) * 4;
        let mut tile_offset = data.len() as u32 + table_len;
        for t in tiles {
            data.extend(be(&[tile_offset]));
            tile_offset += t.len() as u32;
        }
        data.extend(be(&[0]));
        for t in tiles {
            data.extend(t);
        }
        data
    }

    fn read(
        data: Vec<u8>,
        width: u32,
        height: u32,
        content: TileContent,
        compression: Compression,
    ) -> XcfResult<TileGrid<Tile>> {
        let mut cursor = XcfCursor::new(Cursor::new(data));
        read_hierarchy(
            &mut cursor,
            width,
            height,
            content,
            compression,
            &Limits::default(),
        )
    }

    const GRAY: TileContent = TileContent::Layer {
        kind: LayerKind::Gray,
        palette_len: 0,
    };

    #[test]
    fn test_uncompressed_edge_tiles() {
        // 100x65: tiles are 64x64, 36x64, 64x1 and 36x1
        let tiles: Vec<Vec<u8>> = [(64, 64, 1), (36, 64, 2), (64, 1, 3), (36, 1, 4)]
            .iter()
            .map(|&(w, h, v)| vec![v; w * h])
            .collect();
        let grid = read(
            hierarchy(100, 65, 1, &tiles),
            100,
            65,
            GRAY,
            Compression::None,
        )
        .unwrap();

        assert_eq!((grid.rows(), grid.cols()), (2, 2));
        let t = grid.get(1, 1).unwrap();
        assert_eq!((t.width, t.height), (36, 1));
        assert_eq!(t.pixels, TilePixels::Index(vec![4; 36]));
        assert_eq!(grid.get(0, 1).unwrap().index_at(0), 2);
    }

    #[test]
    fn test_rle_last_tile_implicit_end() {
        // 2x2 gray+alpha: repeat 7 four times, then a literal alpha run
        let tile = vec![3, 7, 0xfc, 10, 20, 30, 40];
        let grid = read(
            hierarchy(2, 2, 2, &[tile]),
            2,
            2,
            TileContent::Layer {
                kind: LayerKind::GrayA,
                palette_len: 0,
            },
            Compression::Rle,
        )
        .unwrap();

        assert_eq!(
            grid.get(0, 0).unwrap().pixels,
            TilePixels::IndexAlpha {
                index: vec![7; 4],
                alpha: vec![10, 20, 30, 40],
            }
        );
    }

    #[test]
    fn test_blank_level() {
        let mut data = be(&[10, 10, 1, 100, 0]);
        data.resize(100, 0);
        data.extend(be(&[10, 10, 0]));

        let grid = read(data, 10, 10, TileContent::Mask, Compression::Rle).unwrap();
        assert_eq!(grid.get(0, 0).unwrap().pixels, TilePixels::Index(vec![0; 100]));
    }

    #[test]
    fn test_missing_tiles() {
        let tiles = vec![vec![1u8; 64 * 64]];
        let r = read(hierarchy(100, 10, 1, &tiles), 100, 10, GRAY, Compression::None);
        assert!(matches!(r, Err(XcfError::Corrupt(_))));
    }

    #[test]
    fn test_bad_bpp() {
        let r = read(hierarchy(1, 1, 5, &[vec![0; 5]]), 1, 1, GRAY, Compression::None);
        assert!(matches!(r, Err(XcfError::Format(_))));

        let r = read(hierarchy(1, 1, 0, &[vec![]]), 1, 1, GRAY, Compression::None);
        assert!(matches!(r, Err(XcfError::Format(_))));
    }

    #[test]
    fn test_mismatched_bpp_uses_declared_stride() {
        // An RGBA layer stored with 3 bytes per pixel reads as opaque
        let grid = read(
            hierarchy(1, 1, 3, &[vec![1, 2, 3]]),
            1,
            1,
            TileContent::Layer {
                kind: LayerKind::Rgba,
                palette_len: 0,
            },
            Compression::None,
        )
        .unwrap();
        assert_eq!(grid.get(0, 0).unwrap().alpha_at(0), 255);
    }

    #[test]
    fn test_extra_channels_are_skipped() {
        // An RGB layer stored with 4 bytes per pixel ignores the 4th byte
        let grid = read(
            hierarchy(2, 1, 4, &[vec![1, 2, 3, 77, 4, 5, 6, 88]]),
            2,
            1,
            TileContent::Layer {
                kind: LayerKind::Rgb,
                palette_len: 0,
            },
            Compression::None,
        )
        .unwrap();
        assert_eq!(
            grid.get(0, 0).unwrap().pixels,
            TilePixels::Color(vec![rgb8(1, 2, 3), rgb8(4, 5, 6)])
        );
    }

    #[test]
    fn test_rle_overrun_fails() {
        // Repeat 5 bytes into a 2x2 tile
        let tile = vec![4, 1];
        let r = read(hierarchy(2, 2, 1, &[tile]), 2, 2, GRAY, Compression::Rle);
        assert!(matches!(r, Err(XcfError::Corrupt(_))));
    }

    #[test]
    fn test_unsupported_compression() {
        let r = read(hierarchy(1, 1, 1, &[vec![0]]), 1, 1, GRAY, Compression::Zlib);
        assert!(matches!(r, Err(XcfError::Unsupported(_))));
    }

    #[test]
    fn test_unterminated_level_list() {
        let mut data = be(&[1, 1, 1, 100]);
        data.extend(be(&[200; 40]));
        let r = read(data, 1, 1, GRAY, Compression::None);
        assert!(matches!(r, Err(XcfError::Corrupt(_))));
    }
}
