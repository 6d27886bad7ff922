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

/// The blend modes a layer can be composited with.
///
/// Discriminants are GIMP's legacy layer mode ids, which is also how
/// pre-2.10 files store them.
#[derive(Copy, Clone, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum Blendmode {
    Normal = 0,
    Dissolve,
    Behind,
    Multiply,
    Screen,
    Overlay,
    Difference,
    Addition,
    Subtract,
    DarkenOnly,
    LightenOnly,
    Hue,
    Saturation,
    Color,
    Value,
    Divide,
    Dodge,
    Burn,
    HardLight,
    SoftLight,
    GrainExtract,
    GrainMerge,
}

impl Blendmode {
    /// Is there per-channel color math for this mode when merging RGB pixels?
    ///
    /// Modes with color math also clip the source alpha to the backdrop alpha.
    pub fn has_color_op(self) -> bool {
        !matches!(
            self,
            Blendmode::Normal | Blendmode::Dissolve | Blendmode::Behind
        )
    }

    /// Is there color math for this mode when the source is a gray layer?
    ///
    /// Hue, saturation, color and value have no meaning for gray pixels.
    pub fn has_gray_op(self) -> bool {
        self.has_color_op()
            && !matches!(
                self,
                Blendmode::Hue | Blendmode::Saturation | Blendmode::Color | Blendmode::Value
            )
    }

    pub fn name(self) -> &'static str {
        use Blendmode::*;
        match self {
            Normal => "normal",
            Dissolve => "dissolve",
            Behind => "behind",
            Multiply => "multiply",
            Screen => "screen",
            Overlay => "overlay",
            Difference => "difference",
            Addition => "addition",
            Subtract => "subtract",
            DarkenOnly => "darken-only",
            LightenOnly => "lighten-only",
            Hue => "hue",
            Saturation => "saturation",
            Color => "color",
            Value => "value",
            Divide => "divide",
            Dodge => "dodge",
            Burn => "burn",
            HardLight => "hard-light",
            SoftLight => "soft-light",
            GrainExtract => "grain-extract",
            GrainMerge => "grain-merge",
        }
    }
}

impl Default for Blendmode {
    fn default() -> Self {
        Blendmode::Normal
    }
}

/// Number of layer mode ids GIMP defines (legacy and 2.10 modes together)
pub const GIMP_LAYER_MODE_COUNT: u32 = 62;

const GIMP_MODE_OVERLAY: u32 = 23;
const GIMP_MODE_NORMAL: u32 = 28;
const GIMP_MODE_BEHIND: u32 = 29;
const GIMP_MODE_MULTIPLY: u32 = 30;
const GIMP_MODE_SCREEN: u32 = 31;
const GIMP_MODE_DIFFERENCE: u32 = 32;
const GIMP_MODE_ADDITION: u32 = 33;
const GIMP_MODE_SUBTRACT: u32 = 34;
const GIMP_MODE_DARKEN_ONLY: u32 = 35;
const GIMP_MODE_LIGHTEN_ONLY: u32 = 36;
const GIMP_MODE_DIVIDE: u32 = 41;

/// A layer's mode as stored in the file, resolved to the blend function
/// used to composite it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LayerMode {
    /// The raw GIMP mode id
    pub id: u32,
    pub blendmode: Blendmode,
    /// When false, compositing leaves the backdrop alpha unchanged
    pub affects_alpha: bool,
}

impl LayerMode {
    pub const NORMAL: LayerMode = LayerMode {
        id: 0,
        blendmode: Blendmode::Normal,
        affects_alpha: true,
    };

    /// Resolve a GIMP layer mode id.
    ///
    /// Returns None if the id is outside the range GIMP defines.
    /// GIMP 2.10 modes without a legacy counterpart resolve to a plain
    /// source pass-through.
    pub fn from_gimp(id: u32) -> Option<LayerMode> {
        if id >= GIMP_LAYER_MODE_COUNT {
            return None;
        }

        let (blendmode, affects_alpha) = match Blendmode::try_from(id) {
            Ok(mode) => (
                mode,
                matches!(
                    mode,
                    Blendmode::Normal | Blendmode::Dissolve | Blendmode::Behind
                ),
            ),
            Err(_) => (
                match id {
                    GIMP_MODE_OVERLAY => Blendmode::Overlay,
                    GIMP_MODE_BEHIND => Blendmode::Behind,
                    GIMP_MODE_MULTIPLY => Blendmode::Multiply,
                    GIMP_MODE_SCREEN => Blendmode::Screen,
                    GIMP_MODE_DIFFERENCE => Blendmode::Difference,
                    GIMP_MODE_ADDITION => Blendmode::Addition,
                    GIMP_MODE_SUBTRACT => Blendmode::Subtract,
                    GIMP_MODE_DARKEN_ONLY => Blendmode::DarkenOnly,
                    GIMP_MODE_LIGHTEN_ONLY => Blendmode::LightenOnly,
                    GIMP_MODE_DIVIDE => Blendmode::Divide,
                    _ => Blendmode::Normal,
                },
                id == GIMP_MODE_NORMAL,
            ),
        };

        Some(LayerMode {
            id,
            blendmode,
            affects_alpha,
        })
    }

    pub fn is_dissolve(&self) -> bool {
        self.blendmode == Blendmode::Dissolve
    }
}

impl Default for LayerMode {
    fn default() -> Self {
        LayerMode::NORMAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_modes() {
        for id in 0..22 {
            let mode = LayerMode::from_gimp(id).unwrap();
            assert_eq!(u32::from(mode.blendmode), id);
        }
        assert!(LayerMode::from_gimp(0).unwrap().affects_alpha);
        assert!(LayerMode::from_gimp(1).unwrap().affects_alpha);
        assert!(LayerMode::from_gimp(2).unwrap().affects_alpha);
        assert!(!LayerMode::from_gimp(3).unwrap().affects_alpha);
        assert!(!LayerMode::from_gimp(21).unwrap().affects_alpha);
    }

    #[test]
    fn test_new_modes() {
        let normal = LayerMode::from_gimp(28).unwrap();
        assert_eq!(normal.blendmode, Blendmode::Normal);
        assert!(normal.affects_alpha);

        let behind = LayerMode::from_gimp(29).unwrap();
        assert_eq!(behind.blendmode, Blendmode::Behind);
        assert!(!behind.affects_alpha);

        assert_eq!(
            LayerMode::from_gimp(41).unwrap().blendmode,
            Blendmode::Divide
        );
        assert_eq!(
            LayerMode::from_gimp(23).unwrap().blendmode,
            Blendmode::Overlay
        );

        // LCH hue has no legacy counterpart
        let lch = LayerMode::from_gimp(24).unwrap();
        assert_eq!(lch.blendmode, Blendmode::Normal);
        assert!(!lch.affects_alpha);
    }

    #[test]
    fn test_out_of_range_mode() {
        assert!(LayerMode::from_gimp(61).is_some());
        assert!(LayerMode::from_gimp(62).is_none());
        assert!(LayerMode::from_gimp(u32::MAX).is_none());
    }

    #[test]
    fn test_op_classes() {
        assert!(!Blendmode::Normal.has_color_op());
        assert!(!Blendmode::Behind.has_color_op());
        assert!(Blendmode::Hue.has_color_op());
        assert!(!Blendmode::Hue.has_gray_op());
        assert!(Blendmode::Multiply.has_gray_op());
    }
}
