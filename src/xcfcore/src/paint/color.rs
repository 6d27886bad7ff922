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

/// A straight (non-premultiplied) 8 bit BGRA pixel
pub type Pixel8 = [u8; 4];

pub const BLUE_CHANNEL: usize = 0;
pub const GREEN_CHANNEL: usize = 1;
pub const RED_CHANNEL: usize = 2;
pub const ALPHA_CHANNEL: usize = 3;

pub const ZERO_PIXEL8: Pixel8 = [0; 4];
pub const WHITE_PIXEL8: Pixel8 = [255; 4];
pub const TRANSPARENT_WHITE_PIXEL8: Pixel8 = [255, 255, 255, 0];

/// Layer opacity value meaning "fully opaque"
pub const OPAQUE_OPACITY: u8 = 255;

/// An RGB triple, in red, green, blue order
pub type Rgb8 = [u8; 3];

pub const fn rgba8(r: u8, g: u8, b: u8, a: u8) -> Pixel8 {
    [b, g, r, a]
}

pub const fn rgb8(r: u8, g: u8, b: u8) -> Pixel8 {
    rgba8(r, g, b, 255)
}

pub fn pixel_rgb(p: Pixel8) -> Rgb8 {
    [p[RED_CHANNEL], p[GREEN_CHANNEL], p[BLUE_CHANNEL]]
}

pub fn pixel_from_rgb(rgb: Rgb8, alpha: u8) -> Pixel8 {
    rgba8(rgb[0], rgb[1], rgb[2], alpha)
}

/// 8 bit fixed point multiplication (a*b/255, rounded)
pub fn u8_mult(a: u32, b: u32) -> u32 {
    let c = a * b + 0x80;
    ((c >> 8) + c) >> 8
}

/// Luminance weighting used when a gray layer meets an RGB pixel
pub fn gray_level(rgb: Rgb8) -> u8 {
    ((rgb[0] as u32 * 11 + rgb[1] as u32 * 16 + rgb[2] as u32 * 5) / 32) as u8
}

lazy_static! {
    /// The palette of an 8 bit grayscale canvas: index n is gray level n
    pub static ref GRAY_PALETTE: Vec<Pixel8> = (0..=255u8).map(|v| rgb8(v, v, v)).collect();
}

fn min_max(r: i32, g: i32, b: i32) -> (i32, i32) {
    if r > g {
        (g.min(b), r.max(b))
    } else {
        (r.min(b), g.max(b))
    }
}

/// Convert RGB to GIMP's 8 bit HSV, where hue is scaled to 0..255
pub fn rgb_to_hsv(rgb: Rgb8) -> [u8; 3] {
    let (r, g, b) = (rgb[0] as i32, rgb[1] as i32, rgb[2] as i32);
    let (min, max) = min_max(r, g, b);

    let v = max as f64;
    let s = if max != 0 {
        ((max - min) * 255) as f64 / max as f64
    } else {
        0.0
    };

    let mut h = 0.0;
    if s != 0.0 {
        let delta = (max - min) as f64;
        h = if r == max {
            (g - b) as f64 / delta
        } else if g == max {
            2.0 + (b - r) as f64 / delta
        } else {
            4.0 + (r - g) as f64 / delta
        };
        h *= 42.5;

        if h < 0.0 {
            h += 255.0;
        }
        if h > 255.0 {
            h -= 255.0;
        }
    }

    [h as u8, s as u8, v as u8]
}

pub fn hsv_to_rgb(hsv: [u8; 3]) -> Rgb8 {
    let [hue, saturation, value] = hsv;
    if saturation == 0 {
        return [value, value, value];
    }

    let h = hue as f64 * 6.0 / 255.0;
    let s = saturation as f64 / 255.0;
    let v = value as f64 / 255.0;

    let f = h - h.trunc();
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let c = |x: f64| (x * 255.0) as u8;

    match h as i32 {
        0 => [c(v), c(t), c(p)],
        1 => [c(q), c(v), c(p)],
        2 => [c(p), c(v), c(t)],
        3 => [c(p), c(q), c(v)],
        4 => [c(t), c(p), c(v)],
        5 => [c(v), c(p), c(q)],
        // hue 255 wraps to sector 6, which has no conversion
        _ => hsv,
    }
}

/// Convert RGB to GIMP's 8 bit HLS (hue, lightness, saturation)
pub fn rgb_to_hls(rgb: Rgb8) -> [u8; 3] {
    let (r, g, b) = (rgb[0] as i32, rgb[1] as i32, rgb[2] as i32);
    let (min, max) = min_max(r, g, b);

    let l = (max + min) as f64 / 2.0;
    let mut h = 0.0;
    let mut s = 0.0;

    if max != min {
        let delta = (max - min) as f64;

        s = if l < 128.0 {
            255.0 * delta / (max + min) as f64
        } else {
            255.0 * delta / (511 - max - min) as f64
        };

        h = if r == max {
            (g - b) as f64 / delta
        } else if g == max {
            2.0 + (b - r) as f64 / delta
        } else {
            4.0 + (r - g) as f64 / delta
        };
        h *= 42.5;

        if h < 0.0 {
            h += 255.0;
        } else if h > 255.0 {
            h -= 255.0;
        }
    }

    [h as u8, l as u8, s as u8]
}

fn hls_value(n1: f64, n2: f64, mut hue: f64) -> u8 {
    if hue > 255.0 {
        hue -= 255.0;
    } else if hue < 0.0 {
        hue += 255.0;
    }

    let value = if hue < 42.5 {
        n1 + (n2 - n1) * (hue / 42.5)
    } else if hue < 127.5 {
        n2
    } else if hue < 170.0 {
        n1 + (n2 - n1) * ((170.0 - hue) / 42.5)
    } else {
        n1
    };

    (value * 255.0) as i32 as u8
}

pub fn hls_to_rgb(hls: [u8; 3]) -> Rgb8 {
    let h = hls[0] as f64;
    let l = hls[1] as f64;
    let s = hls[2] as f64;

    if s == 0.0 {
        return [hls[1]; 3];
    }

    let m2 = if l < 128.0 {
        (l * (255.0 + s)) / 65025.0
    } else {
        (l + s - (l * s) / 255.0) / 255.0
    };
    let m1 = (l / 127.5) - m2;

    [
        hls_value(m1, m2, h + 85.0),
        hls_value(m1, m2, h),
        hls_value(m1, m2, h - 85.0),
    ]
}
