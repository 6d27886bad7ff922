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

use super::{XcfError, XcfResult};

fn bogus(msg: &str) -> XcfError {
    XcfError::Corrupt(format!("bad RLE data: {msg}"))
}

/// Decode one run length encoded channel.
///
/// Exactly `count` bytes are written to `dst`, `stride` bytes apart.
/// The control byte `v` is followed by either:
///
///  * `v >= 128`: a literal run of `256 - v` bytes
///  * `v < 128`: one byte repeated `v + 1` times
///
/// Runs of length 128 (`v == 128` and `v == 127`) are escapes: the
/// actual length follows as a 16 bit big endian value.
///
/// Returns the number of source bytes consumed.
pub fn decode_rle(src: &[u8], dst: &mut [u8], count: usize, stride: usize) -> XcfResult<usize> {
    if count > 0 && (count - 1) * stride >= dst.len() {
        return Err(bogus("destination too small"));
    }

    let mut pos = 0;
    let mut written = 0;

    let next = |pos: &mut usize| -> XcfResult<u8> {
        let b = *src.get(*pos).ok_or_else(|| bogus("unexpected end of data"))?;
        *pos += 1;
        Ok(b)
    };

    while written < count {
        let control = next(&mut pos)?;
        let literal = control >= 128;

        let mut length = if literal {
            256 - control as usize
        } else {
            control as usize + 1
        };
        if length == 128 {
            let hi = next(&mut pos)? as usize;
            let lo = next(&mut pos)? as usize;
            length = (hi << 8) | lo;
        }

        if length > count - written {
            return Err(bogus("run overflows the tile"));
        }

        if literal {
            let run = src
                .get(pos..pos + length)
                .ok_or_else(|| bogus("literal run past end of data"))?;
            for &b in run {
                dst[written * stride] = b;
                written += 1;
            }
            pos += length;
        } else {
            let b = next(&mut pos)?;
            for _ in 0..length {
                dst[written * stride] = b;
                written += 1;
            }
        }
    }

    Ok(pos)
}

/// Decode a whole tile: `bpp` channels of `pixels` bytes each, stored one
/// after another, into one interleaved buffer.
pub fn decode_tile(src: &[u8], pixels: usize, bpp: usize) -> XcfResult<Vec<u8>> {
    let mut tile = vec![0; pixels * bpp];
    if pixels == 0 {
        return Ok(tile);
    }

    let mut pos = 0;

    for channel in 0..bpp {
        pos += decode_rle(&src[pos..], &mut tile[channel..], pixels, bpp)?;
    }

    Ok(tile)
}
