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

//! In-memory XCF writer for tests

#![allow(dead_code)]

pub const RGB: u32 = 0;
pub const RGBA: u32 = 1;
pub const GRAY: u32 = 2;
pub const GRAYA: u32 = 3;
pub const INDEXED: u32 = 4;
pub const INDEXEDA: u32 = 5;

pub const COMPRESS_NONE: u8 = 0;
pub const COMPRESS_RLE: u8 = 1;

pub fn prop(tag: u32, payload: &[u8]) -> Vec<u8> {
    let mut v = tag.to_be_bytes().to_vec();
    v.extend((payload.len() as u32).to_be_bytes());
    v.extend_from_slice(payload);
    v
}

pub fn opacity(value: u32) -> Vec<u8> {
    prop(6, &value.to_be_bytes())
}

pub fn mode(id: u32) -> Vec<u8> {
    prop(7, &id.to_be_bytes())
}

pub fn visible(v: bool) -> Vec<u8> {
    prop(8, &(v as u32).to_be_bytes())
}

pub fn apply_mask(v: bool) -> Vec<u8> {
    prop(11, &(v as u32).to_be_bytes())
}

pub fn offsets(x: i32, y: i32) -> Vec<u8> {
    let mut payload = x.to_be_bytes().to_vec();
    payload.extend(y.to_be_bytes());
    prop(15, &payload)
}

pub fn resolution(x: f32, y: f32) -> Vec<u8> {
    let mut payload = x.to_be_bytes().to_vec();
    payload.extend(y.to_be_bytes());
    prop(19, &payload)
}

pub fn parasite(name: &str, data: &[u8]) -> Vec<u8> {
    let mut payload = (name.len() as u32 + 1).to_be_bytes().to_vec();
    payload.extend(name.as_bytes());
    payload.push(0);
    payload.extend(0u32.to_be_bytes());
    payload.extend((data.len() as u32).to_be_bytes());
    payload.extend_from_slice(data);
    prop(21, &payload)
}

/// The colormap record, with its size field written the way GIMP does
/// (not counting the color triplets correctly)
pub fn colormap(colors: &[[u8; 3]]) -> Vec<u8> {
    let mut v = 1u32.to_be_bytes().to_vec();
    v.extend((colors.len() as u32 + 4).to_be_bytes());
    v.extend((colors.len() as u32).to_be_bytes());
    for c in colors {
        v.extend(c);
    }
    v
}

/// Encode one byte plane as literal runs
pub fn rle_plane(plane: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for chunk in plane.chunks(127) {
        out.push((256 - chunk.len()) as u8);
        out.extend_from_slice(chunk);
    }
    out
}

pub struct TestMask {
    pub values: Vec<u8>,
    pub props: Vec<Vec<u8>>,
}

pub struct TestLayer {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub kind: u32,
    pub bpp: u32,
    /// Interleaved pixel bytes, row major
    pub pixels: Vec<u8>,
    pub props: Vec<Vec<u8>>,
    pub mask: Option<TestMask>,
    /// Stored tile data to use instead of encoding `pixels`
    pub raw_tiles: Option<Vec<Vec<u8>>>,
    /// Write this hierarchy offset instead of a real hierarchy
    pub bogus_hierarchy: Option<u64>,
}

impl TestLayer {
    pub fn new(name: &str, width: u32, height: u32, kind: u32, pixels: Vec<u8>) -> Self {
        let bpp = match kind {
            RGB => 3,
            RGBA => 4,
            GRAY | INDEXED => 1,
            _ => 2,
        };
        assert_eq!(pixels.len(), (width * height * bpp) as usize);
        Self {
            name: name.to_string(),
            width,
            height,
            kind,
            bpp,
            pixels,
            props: Vec::new(),
            mask: None,
            raw_tiles: None,
            bogus_hierarchy: None,
        }
    }

    /// A layer filled with one pixel value
    pub fn solid(name: &str, width: u32, height: u32, kind: u32, pixel: &[u8]) -> Self {
        Self::new(name, width, height, kind, pixel.repeat((width * height) as usize))
    }

    pub fn prop(mut self, p: Vec<u8>) -> Self {
        self.props.push(p);
        self
    }

    pub fn mask(mut self, values: Vec<u8>, props: Vec<Vec<u8>>) -> Self {
        assert_eq!(values.len(), (self.width * self.height) as usize);
        self.mask = Some(TestMask { values, props });
        self
    }

    pub fn raw_tiles(mut self, tiles: Vec<Vec<u8>>) -> Self {
        self.raw_tiles = Some(tiles);
        self
    }

    pub fn bogus_hierarchy(mut self, offset: u64) -> Self {
        self.bogus_hierarchy = Some(offset);
        self
    }
}

pub struct XcfBuilder {
    pub version: u32,
    pub width: u32,
    pub height: u32,
    pub base_type: u32,
    pub compression: u8,
    pub props: Vec<Vec<u8>>,
    /// Layers in file order: top layer first
    pub layers: Vec<TestLayer>,
}

impl XcfBuilder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            version: 0,
            width,
            height,
            base_type: 0,
            compression: COMPRESS_NONE,
            props: Vec::new(),
            layers: Vec::new(),
        }
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn base_type(mut self, base_type: u32) -> Self {
        self.base_type = base_type;
        self
    }

    pub fn compression(mut self, compression: u8) -> Self {
        self.compression = compression;
        self
    }

    pub fn prop(mut self, p: Vec<u8>) -> Self {
        self.props.push(p);
        self
    }

    /// Add a layer on top of the existing ones
    pub fn layer(mut self, layer: TestLayer) -> Self {
        self.layers.insert(0, layer);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut w = Writer {
            out: Vec::new(),
            wide: self.version >= 11,
        };

        if self.version == 0 {
            w.out.extend(b"gimp xcf file\0");
        } else {
            w.out
                .extend(format!("gimp xcf v{:03}\0", self.version).as_bytes());
        }
        w.u32(self.width);
        w.u32(self.height);
        w.u32(self.base_type);
        if self.version >= 4 {
            w.u32(150);
        }

        let mut props = self.props.clone();
        props.insert(0, prop(17, &[self.compression]));
        w.props(&props);

        let table: Vec<usize> = self.layers.iter().map(|_| w.offset_placeholder()).collect();
        w.offset(0);

        for (layer, slot) in self.layers.iter().zip(table) {
            w.patch(slot);
            self.write_layer(&mut w, layer);
        }

        w.out
    }

    fn write_layer(&self, w: &mut Writer, layer: &TestLayer) {
        w.u32(layer.width);
        w.u32(layer.height);
        w.u32(layer.kind);
        w.string(&layer.name);
        w.props(&layer.props);

        let hierarchy = w.offset_placeholder();
        let mask = w.offset_placeholder();

        match layer.bogus_hierarchy {
            Some(offset) => w.patch_value(hierarchy, offset),
            None => {
                w.patch(hierarchy);
                let tiles = match &layer.raw_tiles {
                    Some(t) => t.clone(),
                    None => self.encode_tiles(layer.width, layer.height, layer.bpp, &layer.pixels),
                };
                w.hierarchy(layer.width, layer.height, layer.bpp, &tiles);
            }
        }

        if let Some(m) = &layer.mask {
            w.patch(mask);
            w.u32(layer.width);
            w.u32(layer.height);
            w.string("mask");
            w.props(&m.props);
            let mask_hierarchy = w.offset_placeholder();
            w.patch(mask_hierarchy);
            let tiles = self.encode_tiles(layer.width, layer.height, 1, &m.values);
            w.hierarchy(layer.width, layer.height, 1, &tiles);
        }
    }

    /// Split a layer into stored tiles
    fn encode_tiles(&self, width: u32, height: u32, bpp: u32, pixels: &[u8]) -> Vec<Vec<u8>> {
        let bpp = bpp as usize;
        let mut tiles = Vec::new();
        for ty in (0..height).step_by(64) {
            for tx in (0..width).step_by(64) {
                let tw = (width - tx).min(64);
                let th = (height - ty).min(64);

                let mut interleaved = Vec::new();
                for y in ty..ty + th {
                    let start = ((y * width + tx) as usize) * bpp;
                    interleaved.extend_from_slice(&pixels[start..start + tw as usize * bpp]);
                }

                let tile = if self.compression == COMPRESS_RLE {
                    (0..bpp)
                        .flat_map(|c| {
                            let plane: Vec<u8> =
                                interleaved.iter().skip(c).step_by(bpp).copied().collect();
                            rle_plane(&plane)
                        })
                        .collect()
                } else {
                    interleaved
                };
                tiles.push(tile);
            }
        }
        tiles
    }
}

struct Writer {
    out: Vec<u8>,
    wide: bool,
}

impl Writer {
    fn u32(&mut self, v: u32) {
        self.out.extend(v.to_be_bytes());
    }

    fn offset(&mut self, v: u64) {
        if self.wide {
            self.out.extend(v.to_be_bytes());
        } else {
            self.out.extend((v as u32).to_be_bytes());
        }
    }

    fn offset_placeholder(&mut self) -> usize {
        let pos = self.out.len();
        self.offset(0);
        pos
    }

    /// Point an offset slot at the current end of the output
    fn patch(&mut self, slot: usize) {
        let here = self.out.len() as u64;
        self.patch_value(slot, here);
    }

    fn patch_value(&mut self, slot: usize, value: u64) {
        if self.wide {
            self.out[slot..slot + 8].copy_from_slice(&value.to_be_bytes());
        } else {
            self.out[slot..slot + 4].copy_from_slice(&(value as u32).to_be_bytes());
        }
    }

    fn string(&mut self, s: &str) {
        self.u32(s.len() as u32 + 1);
        self.out.extend(s.as_bytes());
        self.out.push(0);
    }

    fn props(&mut self, props: &[Vec<u8>]) {
        for p in props {
            self.out.extend(p);
        }
        self.out.extend(prop(0, &[]));
    }

    fn hierarchy(&mut self, width: u32, height: u32, bpp: u32, tiles: &[Vec<u8>]) {
        self.u32(width);
        self.u32(height);
        self.u32(bpp);
        let level = self.offset_placeholder();
        // one dummy lower resolution level
        let dummy = self.offset_placeholder();
        self.offset(0);

        self.patch(level);
        self.u32(width);
        self.u32(height);
        let slots: Vec<usize> = tiles.iter().map(|_| self.offset_placeholder()).collect();
        self.offset(0);
        for (tile, slot) in tiles.iter().zip(slots) {
            self.patch(slot);
            self.out.extend(tile);
        }

        self.patch(dummy);
        self.u32(1);
        self.u32(1);
        self.offset(0);
    }
}
