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

pub mod blendmode;
pub mod canvas;
pub mod color;
pub mod compositor;
pub mod dissolve;
pub mod image;
pub mod layer;
pub mod rasterop;
pub mod tile;

pub use blendmode::{Blendmode, LayerMode};
pub use canvas::{Canvas, CanvasFormat};
pub use compositor::{copy_layer, merge_layer};
pub use image::{Image, Image8, IndexImage};
pub use layer::{ChannelProperties, Layer, LayerKind, LayerProperties, Mask, MaskApply};
pub use tile::{Tile, TileGrid, TilePixels, TILE_SIZE};
