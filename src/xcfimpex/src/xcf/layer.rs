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

use std::convert::TryFrom;
use std::io::{Read, Seek};
use tracing::{debug, warn};

use xcfcore::paint::{Layer, LayerKind, LayerMode, LayerProperties, MaskApply};

use super::cursor::XcfCursor;
use super::hierarchy::{read_hierarchy, TileContent};
use super::mask::read_mask;
use super::property::{read_properties, Payload};
use super::{Compression, Limits, PropType, XcfError, XcfResult};

/// Everything stored about a layer before its pixel data
#[derive(Clone, Debug)]
pub struct LayerHeader {
    pub width: u32,
    pub height: u32,
    pub kind: LayerKind,
    pub props: LayerProperties,
    pub hierarchy_offset: u64,
    pub mask_offset: u64,
}

/// Decode one property of a layer
pub fn apply_layer_property(
    props: &mut LayerProperties,
    prop: PropType,
    payload: &mut Payload,
) -> XcfResult<()> {
    match prop {
        PropType::ActiveLayer => props.active = true,
        PropType::Opacity => props.opacity = payload.read_u32()?.min(255) as u8,
        PropType::FloatOpacity => {
            if payload.len() == 4 {
                props.float_opacity = Some(payload.read_f32()?);
            } else {
                debug!("Invalid float opacity size: {}", payload.len());
            }
        }
        PropType::Visible => props.visible = payload.read_flag()?,
        PropType::Linked => props.linked = payload.read_flag()?,
        PropType::LockAlpha => props.lock_alpha = payload.read_flag()?,
        PropType::ApplyMask => {
            props.apply_mask = if payload.read_flag()? {
                MaskApply::On
            } else {
                MaskApply::Off
            };
        }
        PropType::EditMask => props.edit_mask = payload.read_flag()?,
        PropType::ShowMask => props.show_mask = payload.read_flag()?,
        PropType::Offsets => {
            props.x_offset = payload.read_i32()?;
            props.y_offset = payload.read_i32()?;
        }
        PropType::Mode => {
            let id = payload.read_u32()?;
            props.mode = LayerMode::from_gimp(id).unwrap_or_else(|| {
                warn!(
                    "Layer \"{}\" has unsupported mode {}, using normal mode",
                    props.name, id
                );
                LayerMode::NORMAL
            });
        }
        PropType::Tattoo => props.tattoo = payload.read_u32()?,
        PropType::CompositeSpace => props.composite_space = payload.read_i32()?,
        PropType::CompositeMode => props.composite_mode = payload.read_i32()?,
        PropType::BlendSpace => props.blend_space = payload.read_i32()?,
        PropType::ColorTag | PropType::LockContent | PropType::LockPosition => {}
        other => debug!(
            "Unhandled layer property {:?} ({} bytes)",
            other,
            payload.len()
        ),
    }
    Ok(())
}

/// Read a layer record's header and properties at the cursor's position
pub fn read_layer_header<R: Read + Seek>(
    cursor: &mut XcfCursor<R>,
    limits: &Limits,
) -> XcfResult<LayerHeader> {
    let width = cursor.read_u32()?;
    let height = cursor.read_u32()?;
    let raw_kind = cursor.read_u32()?;
    let kind = LayerKind::try_from(raw_kind)
        .map_err(|_| XcfError::Format(format!("unknown layer type {}", raw_kind)))?;

    let mut props = LayerProperties {
        name: cursor.read_string()?,
        ..LayerProperties::default()
    };

    read_properties(cursor, limits, |prop, payload| {
        apply_layer_property(&mut props, prop, payload)
    })?;

    let hierarchy_offset = cursor.read_offset()?;
    let mask_offset = cursor.read_offset()?;

    debug!(
        "Layer \"{}\": {}x{} {:?}, mode {}, opacity {}, visible {}, offset {},{}",
        props.name,
        width,
        height,
        kind,
        props.mode.blendmode.name(),
        props.opacity,
        props.visible,
        props.x_offset,
        props.y_offset
    );

    Ok(LayerHeader {
        width,
        height,
        kind,
        props,
        hierarchy_offset,
        mask_offset,
    })
}

/// Load the pixels (and mask, if any) of a layer
pub fn read_layer<R: Read + Seek>(
    cursor: &mut XcfCursor<R>,
    header: LayerHeader,
    compression: Compression,
    palette_len: usize,
    limits: &Limits,
) -> XcfResult<Layer> {
    limits.check_size(
        &format!("layer \"{}\"", header.props.name),
        header.width,
        header.height,
    )?;

    cursor.seek(header.hierarchy_offset)?;
    let tiles = read_hierarchy(
        cursor,
        header.width,
        header.height,
        TileContent::Layer {
            kind: header.kind,
            palette_len,
        },
        compression,
        limits,
    )?;

    let mask = if header.mask_offset != 0 {
        cursor.seek(header.mask_offset)?;
        Some(read_mask(
            cursor,
            header.width,
            header.height,
            compression,
            limits,
        )?)
    } else {
        None
    };

    let mut props = header.props;
    props.apply_mask = props.apply_mask.resolve(mask.is_some());

    Ok(Layer {
        width: header.width,
        height: header.height,
        kind: header.kind,
        props,
        tiles,
        mask,
    })
}
