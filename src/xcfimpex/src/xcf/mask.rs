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
use tracing::debug;

use xcfcore::paint::{ChannelProperties, Mask};

use super::cursor::XcfCursor;
use super::hierarchy::{read_hierarchy, TileContent};
use super::property::{read_properties, Payload};
use super::{Compression, Limits, PropType, XcfError, XcfResult};

/// Decode one property of a channel
pub fn apply_channel_property(
    props: &mut ChannelProperties,
    prop: PropType,
    payload: &mut Payload,
) -> XcfResult<()> {
    match prop {
        PropType::Opacity => props.opacity = payload.read_u32()?.min(255) as u8,
        PropType::FloatOpacity => {
            if payload.len() == 4 {
                props.float_opacity = Some(payload.read_f32()?);
            } else {
                debug!("Invalid float opacity size: {}", payload.len());
            }
        }
        PropType::Visible => props.visible = payload.read_flag()?,
        PropType::ShowMasked => props.show_masked = payload.read_flag()?,
        PropType::Color => {
            props.color = [payload.read_u8()?, payload.read_u8()?, payload.read_u8()?];
        }
        PropType::FloatColor => {
            props.float_color = Some([
                payload.read_f32()?,
                payload.read_f32()?,
                payload.read_f32()?,
            ]);
        }
        PropType::Tattoo => props.tattoo = payload.read_u32()?,
        PropType::Linked
        | PropType::ColorTag
        | PropType::LockContent
        | PropType::LockPosition => {}
        other => debug!(
            "Unhandled channel property {:?} ({} bytes)",
            other,
            payload.len()
        ),
    }
    Ok(())
}

/// Load the layer mask at the cursor's position.
///
/// The mask must be exactly as large as its layer.
pub fn read_mask<R: Read + Seek>(
    cursor: &mut XcfCursor<R>,
    layer_width: u32,
    layer_height: u32,
    compression: Compression,
    limits: &Limits,
) -> XcfResult<Mask> {
    let width = cursor.read_u32()?;
    let height = cursor.read_u32()?;
    let mut props = ChannelProperties {
        name: cursor.read_string()?,
        ..ChannelProperties::default()
    };

    read_properties(cursor, limits, |prop, payload| {
        apply_channel_property(&mut props, prop, payload)
    })?;

    if width != layer_width || height != layer_height {
        return Err(XcfError::Corrupt(format!(
            "mask size {}x{} does not match layer size {}x{}",
            width, height, layer_width, layer_height
        )));
    }

    let hierarchy_offset = cursor.read_offset()?;
    cursor.seek(hierarchy_offset)?;

    let tiles = read_hierarchy(
        cursor,
        width,
        height,
        TileContent::Mask,
        compression,
        limits,
    )?;

    Ok(Mask {
        width,
        height,
        props,
        tiles,
    })
}
