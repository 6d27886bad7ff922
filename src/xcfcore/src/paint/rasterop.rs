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

use super::blendmode::Blendmode;
use super::color::*;

/// Per-channel blend function. Arguments are (backdrop, source)
type ChannelOp = fn(u32, u32) -> u32;

fn channel_op(mode: Blendmode) -> Option<ChannelOp> {
    use Blendmode::*;
    Some(match mode {
        Multiply => comp_op_multiply,
        Screen => comp_op_screen,
        Overlay => comp_op_overlay,
        Difference => comp_op_difference,
        Addition => comp_op_addition,
        Subtract => comp_op_subtract,
        DarkenOnly => comp_op_darken,
        LightenOnly => comp_op_lighten,
        Divide => comp_op_divide,
        Dodge => comp_op_dodge,
        Burn => comp_op_burn,
        HardLight => comp_op_hard_light,
        SoftLight => comp_op_soft_light,
        GrainExtract => comp_op_grain_extract,
        GrainMerge => comp_op_grain_merge,
        Normal | Dissolve | Behind | Hue | Saturation | Color | Value => return None,
    })
}

/// Compute the color a source RGB pixel contributes over a backdrop
/// pixel in the given mode. Alpha is handled separately.
pub fn blend_rgb(mode: Blendmode, src: Rgb8, dst: Rgb8) -> Rgb8 {
    match mode {
        Blendmode::Hue => replace_hsv_component(src, dst, 0),
        Blendmode::Saturation => replace_hsv_component(src, dst, 1),
        Blendmode::Value => replace_hsv_component(src, dst, 2),
        Blendmode::Color => {
            let s = rgb_to_hls(src);
            let d = rgb_to_hls(dst);
            hls_to_rgb([s[0], d[1], s[2]])
        }
        _ => match channel_op(mode) {
            Some(op) => [
                op(dst[0] as u32, src[0] as u32) as u8,
                op(dst[1] as u32, src[1] as u32) as u8,
                op(dst[2] as u32, src[2] as u32) as u8,
            ],
            None => src,
        },
    }
}

/// Gray counterpart of [`blend_rgb`]
pub fn blend_gray(mode: Blendmode, src: u8, dst: u8) -> u8 {
    if !mode.has_gray_op() {
        return src;
    }
    match channel_op(mode) {
        Some(op) => op(dst as u32, src as u32) as u8,
        None => src,
    }
}

fn replace_hsv_component(src: Rgb8, dst: Rgb8, component: usize) -> Rgb8 {
    let s = rgb_to_hsv(src);
    let mut d = rgb_to_hsv(dst);
    d[component] = s[component];
    hsv_to_rgb(d)
}

/// Alpha of a source-over composite
pub fn composite_alpha(src_a: u8, dst_a: u8) -> u8 {
    (dst_a as u32 + u8_mult(255 - dst_a as u32, src_a as u32)) as u8
}

/// Straight color mix of one channel weighted by src_a/new_a.
///
/// This is the exact integer equivalent of truncating
/// `src * src_a/new_a + dst * (1 - src_a/new_a)`.
pub fn mix_channel(src: u8, dst: u8, src_a: u8, new_a: u8) -> u8 {
    if new_a == 0 {
        return src;
    }
    let src_a = src_a as u32;
    let new_a = new_a as u32;
    debug_assert!(src_a <= new_a);
    ((src_a * src as u32 + (new_a - src_a) * dst as u32) / new_a) as u8
}

/// Composite an already mode-blended source color over a backdrop pixel.
///
/// `src_a` is the effective source alpha (layer alpha, opacity and mask
/// applied). When `affects_alpha` is false the backdrop alpha is kept.
pub fn composite_rgb(src: Rgb8, src_a: u8, dst: Pixel8, affects_alpha: bool) -> Pixel8 {
    let dst_a = dst[ALPHA_CHANNEL];
    let new_a = composite_alpha(src_a, dst_a);
    let d = pixel_rgb(dst);

    pixel_from_rgb(
        [
            mix_channel(src[0], d[0], src_a, new_a),
            mix_channel(src[1], d[1], src_a, new_a),
            mix_channel(src[2], d[2], src_a, new_a),
        ],
        if affects_alpha { new_a } else { dst_a },
    )
}

fn comp_op_multiply(a: u32, b: u32) -> u32 {
    u8_mult(b, a)
}

fn comp_op_screen(a: u32, b: u32) -> u32 {
    255 - u8_mult(255 - a, 255 - b)
}

fn comp_op_overlay(a: u32, b: u32) -> u32 {
    u8_mult(a, a + u8_mult(2 * b, 255 - a))
}

fn comp_op_difference(a: u32, b: u32) -> u32 {
    if a > b {
        a - b
    } else {
        b - a
    }
}

fn comp_op_addition(a: u32, b: u32) -> u32 {
    255.min(a + b)
}

fn comp_op_subtract(a: u32, b: u32) -> u32 {
    a.saturating_sub(b)
}

fn comp_op_darken(a: u32, b: u32) -> u32 {
    a.min(b)
}

fn comp_op_lighten(a: u32, b: u32) -> u32 {
    a.max(b)
}

fn comp_op_divide(a: u32, b: u32) -> u32 {
    255.min(a * 256 / (1 + b))
}

fn comp_op_dodge(a: u32, b: u32) -> u32 {
    255.min((a << 8) / (256 - b))
}

fn comp_op_burn(a: u32, b: u32) -> u32 {
    255 - 255.min(((255 - a) << 8) / (b + 1))
}

fn comp_op_hard_light(a: u32, b: u32) -> u32 {
    if b > 128 {
        let tmp = (255 - a) * (255 - ((b - 128) << 1));
        255 - (tmp >> 8)
    } else {
        255.min((a * (b << 1)) >> 8)
    }
}

fn comp_op_soft_light(a: u32, b: u32) -> u32 {
    let multiply = u8_mult(a, b);
    let screen = 255 - u8_mult(255 - a, 255 - b);
    u8_mult(255 - a, multiply) + u8_mult(a, screen)
}

fn comp_op_grain_extract(a: u32, b: u32) -> u32 {
    (a as i32 - b as i32 + 128).clamp(0, 255) as u32
}

fn comp_op_grain_merge(a: u32, b: u32) -> u32 {
    (a as i32 + b as i32 - 128).clamp(0, 255) as u32
}
