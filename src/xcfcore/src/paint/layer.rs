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

use super::blendmode::LayerMode;
use super::tile::{Tile, TileGrid, TILE_SIZE};

/// Pixel layout of a layer
#[derive(Copy, Clone, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum LayerKind {
    Rgb = 0,
    Rgba,
    Gray,
    GrayA,
    Indexed,
    IndexedA,
}

impl LayerKind {
    /// Number of channels the layer's pixel hierarchy stores
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            LayerKind::Rgb => 3,
            LayerKind::Rgba => 4,
            LayerKind::Gray | LayerKind::Indexed => 1,
            LayerKind::GrayA | LayerKind::IndexedA => 2,
        }
    }

    pub fn is_gray(self) -> bool {
        matches!(self, LayerKind::Gray | LayerKind::GrayA)
    }

    pub fn is_indexed(self) -> bool {
        matches!(self, LayerKind::Indexed | LayerKind::IndexedA)
    }
}

/// The layer's "apply mask" flag.
///
/// A layer that never states the flag applies its mask if it has one.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MaskApply {
    Off,
    On,
    Unspecified,
}

impl Default for MaskApply {
    fn default() -> Self {
        MaskApply::Unspecified
    }
}

impl MaskApply {
    /// Settle the flag once it is known whether the layer has a mask.
    ///
    /// An unspecified flag turns on when a mask exists, and any flag
    /// turns off when there is no mask.
    pub fn resolve(self, has_mask: bool) -> MaskApply {
        match (self, has_mask) {
            (_, false) => MaskApply::Off,
            (MaskApply::Unspecified, true) => MaskApply::On,
            (flag, true) => flag,
        }
    }
}

/// Properties stored on a channel (a layer mask)
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelProperties {
    pub name: String,
    pub opacity: u8,
    pub float_opacity: Option<f32>,
    pub visible: bool,
    pub show_masked: bool,
    pub color: [u8; 3],
    pub float_color: Option<[f32; 3]>,
    pub tattoo: u32,
}

impl Default for ChannelProperties {
    fn default() -> Self {
        Self {
            name: String::new(),
            opacity: 255,
            float_opacity: None,
            visible: true,
            show_masked: false,
            color: [0, 0, 0],
            float_color: None,
            tattoo: 0,
        }
    }
}

/// A layer mask: one 8 bit value per layer pixel
#[derive(Clone, Debug)]
pub struct Mask {
    pub width: u32,
    pub height: u32,
    pub props: ChannelProperties,
    pub tiles: TileGrid<Tile>,
}

/// Properties stored on a layer
#[derive(Clone, Debug, PartialEq)]
pub struct LayerProperties {
    pub name: String,
    pub opacity: u8,
    pub float_opacity: Option<f32>,
    pub visible: bool,
    pub active: bool,
    pub linked: bool,
    pub lock_alpha: bool,
    pub apply_mask: MaskApply,
    pub edit_mask: bool,
    pub show_mask: bool,
    pub x_offset: i32,
    pub y_offset: i32,
    pub mode: LayerMode,
    pub tattoo: u32,
    pub blend_space: i32,
    pub composite_space: i32,
    pub composite_mode: i32,
}

impl Default for LayerProperties {
    fn default() -> Self {
        Self {
            name: String::new(),
            opacity: 255,
            float_opacity: None,
            visible: true,
            active: false,
            linked: false,
            lock_alpha: false,
            apply_mask: MaskApply::Unspecified,
            edit_mask: false,
            show_mask: false,
            x_offset: 0,
            y_offset: 0,
            mode: LayerMode::NORMAL,
            tattoo: 0,
            blend_space: 0,
            composite_space: 0,
            composite_mode: 0,
        }
    }
}

/// A decoded layer ready for compositing
#[derive(Clone, Debug)]
pub struct Layer {
    pub width: u32,
    pub height: u32,
    pub kind: LayerKind,
    pub props: LayerProperties,
    pub tiles: TileGrid<Tile>,
    pub mask: Option<Mask>,
}

impl Layer {
    /// Does compositing multiply the source alpha by the mask?
    pub fn mask_applies(&self) -> bool {
        self.props.apply_mask == MaskApply::On && self.mask.is_some()
    }

    /// Mask value for pixel `i` of the tile at (row, col), if the mask applies
    pub fn mask_value(&self, row: u32, col: u32, i: usize) -> Option<u8> {
        if !self.mask_applies() {
            return None;
        }
        self.mask
            .as_ref()
            .and_then(|m| m.tiles.get(row, col))
            .map(|t| t.index_at(i))
    }

    /// Canvas coordinates of the top-left pixel of the tile at (row, col)
    pub fn tile_origin(&self, row: u32, col: u32) -> (i64, i64) {
        (
            (col * TILE_SIZE) as i64 + self.props.x_offset as i64,
            (row * TILE_SIZE) as i64 + self.props.y_offset as i64,
        )
    }
}
