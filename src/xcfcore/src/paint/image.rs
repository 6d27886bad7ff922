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

use super::color::Pixel8;

/// A flat image buffer
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Image<T>
where
    T: Copy + Default + Eq,
{
    pub pixels: Vec<T>,
    pub width: usize,
    pub height: usize,
}

pub type Image8 = Image<Pixel8>;
pub type IndexImage = Image<u8>;

impl<T> Image<T>
where
    T: Copy + Default + Eq,
{
    pub fn filled(width: usize, height: usize, value: T) -> Image<T> {
        Image {
            pixels: vec![value; width * height],
            width,
            height,
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> T {
        self.pixels[y * self.width + x]
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, value: T) {
        self.pixels[y * self.width + x] = value;
    }
}
