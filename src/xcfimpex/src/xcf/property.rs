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

use byteorder::{BigEndian, ReadBytesExt};
use std::convert::TryFrom;
use std::io::{self, Read, Seek};
use tracing::{debug, warn};

use super::cursor::XcfCursor;
use super::{Limits, PropType, XcfError, XcfResult};

/// Tags at or above this value are skipped without interpretation
const MAX_SUPPORTED_PROPTYPE: u32 = 40;

/// Largest colormap record accepted, in bytes
const MAX_COLORMAP_SIZE: u64 = 65535;

/// Big endian reader over a property's payload
pub struct Payload<'a> {
    data: io::Cursor<&'a [u8]>,
}

impl<'a> Payload<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data: io::Cursor::new(data),
        }
    }

    pub fn len(&self) -> usize {
        self.data.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn at_end(&self) -> bool {
        self.data.position() >= self.len() as u64
    }

    pub fn read_u8(&mut self) -> XcfResult<u8> {
        Ok(self.data.read_u8()?)
    }

    pub fn read_u32(&mut self) -> XcfResult<u32> {
        Ok(self.data.read_u32::<BigEndian>()?)
    }

    pub fn read_i32(&mut self) -> XcfResult<i32> {
        Ok(self.data.read_i32::<BigEndian>()?)
    }

    pub fn read_f32(&mut self) -> XcfResult<f32> {
        Ok(self.data.read_f32::<BigEndian>()?)
    }

    pub fn read_bytes(&mut self, len: usize) -> XcfResult<Vec<u8>> {
        if len > self.len() {
            return Err(XcfError::Truncated);
        }
        let mut buf = vec![0; len];
        self.data.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// A boolean stored as a 32 bit integer
    pub fn read_flag(&mut self) -> XcfResult<bool> {
        Ok(self.read_u32()? != 0)
    }
}

/// Read one property record.
///
/// Returns None for tags this reader does not know about. Their payload
/// has already been skipped.
fn read_property<R: Read + Seek>(
    cursor: &mut XcfCursor<R>,
    limits: &Limits,
) -> XcfResult<Option<(PropType, Vec<u8>)>> {
    let raw_type = cursor.read_u32()?;

    let prop = match PropType::try_from(raw_type) {
        Ok(p) if raw_type < MAX_SUPPORTED_PROPTYPE => p,
        _ => {
            let size = cursor.read_u32()?;
            debug!("Skipping unknown property {} ({} bytes)", raw_type, size);
            cursor.skip(size as u64)?;
            return Ok(None);
        }
    };

    let payload = match prop {
        PropType::Colormap => {
            // The stored size is not reliable: the payload is always
            // the color count followed by one RGB triplet per color.
            let _ = cursor.read_u32()?;
            let colors = cursor.read_u32()?;
            let size = colors as u64 * 3 + 4;
            if size > MAX_COLORMAP_SIZE {
                return Err(XcfError::Corrupt(format!(
                    "colormap of {} colors is too large",
                    colors
                )));
            }

            let mut payload = Vec::with_capacity(size as usize);
            payload.extend_from_slice(&colors.to_be_bytes());
            let (triplets, got) = cursor.read_up_to(colors as usize * 3)?;
            if got < triplets.len() {
                debug!("Short colormap: {} of {} bytes", got, triplets.len());
            }
            payload.extend_from_slice(&triplets);
            payload
        }
        PropType::UserUnit => {
            // The stored size does not cover the unit strings
            let _ = cursor.read_u32()?;
            let _factor = cursor.read_f32()?;
            let _digits = cursor.read_i32()?;
            for _ in 0..5 {
                cursor.read_string()?;
            }
            Vec::new()
        }
        _ => {
            let size = cursor.read_u32()?;
            if size > limits.max_property_size {
                return Err(XcfError::Corrupt(format!(
                    "property {:?} is too large ({} bytes)",
                    prop, size
                )));
            }
            let (payload, got) = cursor.read_up_to(size as usize)?;
            if got < payload.len() {
                debug!(
                    "Property {:?}: read {} of {} bytes",
                    prop,
                    got,
                    payload.len()
                );
            }
            payload
        }
    };

    Ok(Some((prop, payload)))
}

/// Read a property list up to its terminator, passing each known property
/// to `handler`.
///
/// A property whose payload is too short for what the handler tries to
/// read from it is ignored with a warning.
pub fn read_properties<R, F>(
    cursor: &mut XcfCursor<R>,
    limits: &Limits,
    mut handler: F,
) -> XcfResult<()>
where
    R: Read + Seek,
    F: FnMut(PropType, &mut Payload) -> XcfResult<()>,
{
    for _ in 0..limits.max_properties {
        let (prop, bytes) = match read_property(cursor, limits)? {
            Some((PropType::End, _)) => return Ok(()),
            Some(p) => p,
            None => continue,
        };

        match handler(prop, &mut Payload::new(&bytes)) {
            Err(XcfError::Truncated) => {
                warn!("Property {:?} payload too short ({} bytes)", prop, bytes.len());
            }
            r => r?,
        }
    }

    Err(XcfError::Corrupt(format!(
        "more than {} properties in one list",
        limits.max_properties
    )))
}

/// A named blob attached to the image
pub struct Parasite {
    pub name: String,
    pub flags: u32,
    pub data: Vec<u8>,
}

/// Parse the payload of a parasite list property.
///
/// Parsing stops at the first malformed record; the records before it
/// are returned.
pub fn parse_parasites(payload: &mut Payload) -> Vec<Parasite> {
    let mut parasites = Vec::new();

    while !payload.at_end() {
        match parse_parasite(payload) {
            Ok(p) => parasites.push(p),
            Err(e) => {
                warn!("Malformed parasite: {}", e);
                break;
            }
        }
    }

    parasites
}

fn parse_parasite(payload: &mut Payload) -> XcfResult<Parasite> {
    let name_len = payload.read_u32()?;
    let mut name = payload.read_bytes(name_len as usize)?;
    if let Some(nul) = name.iter().position(|&b| b == 0) {
        name.truncate(nul);
    }

    let flags = payload.read_u32()?;
    let data_len = payload.read_u32()?;
    let data = payload.read_bytes(data_len as usize)?;

    Ok(Parasite {
        name: String::from_utf8_lossy(&name).into_owned(),
        flags,
        data,
    })
}
