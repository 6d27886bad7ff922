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
use std::io::{Read, Seek, SeekFrom};
use tracing::{debug, warn};

use xcfcore::paint::color::Rgb8;
use xcfcore::paint::{copy_layer, merge_layer, Canvas, LayerKind, LayerMode};

use super::cursor::XcfCursor;
use super::layer::{read_layer, read_layer_header};
use super::property::{parse_parasites, read_properties, Payload};
use super::{BaseType, Compression, Limits, PropType, XcfError, XcfImage, XcfResult};
use super::MAX_SUPPORTED_VERSION;

const MAGIC: &[u8; 8] = b"gimp xcf";
const INCHES_PER_METER: f32 = 100.0 / 2.54;

struct Header {
    version: u32,
    width: u32,
    height: u32,
    base_type: BaseType,
    precision: Option<u32>,
}

/// Image level properties
struct ImageProperties {
    compression: Compression,
    resolution: Option<(f32, f32)>,
    tattoo: u32,
    unit: u32,
    palette: Vec<Rgb8>,
    comment: Option<String>,
    metadata: Option<String>,
    icc_profile: Option<Vec<u8>>,
}

impl Default for ImageProperties {
    fn default() -> Self {
        Self {
            compression: Compression::Rle,
            resolution: None,
            tattoo: 0,
            unit: 0,
            palette: Vec::new(),
            comment: None,
            metadata: None,
            icc_profile: None,
        }
    }
}

fn parasite_text(data: &[u8]) -> String {
    let text: Vec<u8> = data.iter().copied().filter(|&b| b != 0).collect();
    String::from_utf8_lossy(&text).into_owned()
}

fn read_header<R: Read + Seek>(cursor: &mut XcfCursor<R>) -> XcfResult<Header> {
    let tag = cursor.read_bytes(14)?;
    if !tag.starts_with(MAGIC) || tag[13] != 0 {
        return Err(XcfError::Format("not an XCF file".into()));
    }

    let version = match &tag[9..13] {
        b"file" => 0,
        [b'v', digits @ ..] => std::str::from_utf8(digits)
            .ok()
            .and_then(|d| d.parse::<u32>().ok())
            .ok_or_else(|| {
                XcfError::Format(format!(
                    "bad version tag \"{}\"",
                    String::from_utf8_lossy(&tag[9..13])
                ))
            })?,
        _ => {
            return Err(XcfError::Format(format!(
                "bad version tag \"{}\"",
                String::from_utf8_lossy(&tag[9..13])
            )))
        }
    };

    if version > MAX_SUPPORTED_VERSION {
        return Err(XcfError::Unsupported(format!("file format version {}", version)));
    }
    cursor.set_version(version);

    let width = cursor.read_u32()?;
    let height = cursor.read_u32()?;
    let raw_type = cursor.read_u32()?;
    let base_type = BaseType::try_from(raw_type)
        .map_err(|_| XcfError::Format(format!("unknown image type {}", raw_type)))?;

    let precision = if version >= 4 {
        let p = cursor.read_u32()?;
        debug!("Precision {}", p);
        Some(p)
    } else {
        None
    };

    debug!(
        "XCF version {}, {}x{}, {:?}",
        version, width, height, base_type
    );

    Ok(Header {
        version,
        width,
        height,
        base_type,
        precision,
    })
}

fn apply_image_property(
    props: &mut ImageProperties,
    prop: PropType,
    payload: &mut Payload,
) -> XcfResult<()> {
    match prop {
        PropType::Compression => {
            let c = payload.read_u8()?;
            props.compression = Compression::try_from(c)
                .map_err(|_| XcfError::Unsupported(format!("compression method {}", c)))?;
        }
        PropType::Resolution => {
            props.resolution = Some((payload.read_f32()?, payload.read_f32()?));
        }
        PropType::Tattoo => props.tattoo = payload.read_u32()?,
        PropType::Unit => props.unit = payload.read_u32()?,
        PropType::Parasites => {
            for p in parse_parasites(payload) {
                if p.data.is_empty() {
                    continue;
                }
                match p.name.as_str() {
                    "gimp-comment" => props.comment = Some(parasite_text(&p.data)),
                    "gimp-image-metadata" => props.metadata = Some(parasite_text(&p.data)),
                    "icc-profile" => props.icc_profile = Some(p.data),
                    other => debug!("Ignoring parasite \"{}\"", other),
                }
            }
        }
        PropType::Paths | PropType::UserUnit => {}
        PropType::Colormap => {
            let colors = payload.read_u32()?;
            if colors > 65535 {
                return Err(XcfError::Corrupt(format!("{} colormap entries", colors)));
            }
            props.palette = (0..colors)
                .map(|_| -> XcfResult<Rgb8> {
                    Ok([payload.read_u8()?, payload.read_u8()?, payload.read_u8()?])
                })
                .collect::<XcfResult<Vec<Rgb8>>>()?;
        }
        other => debug!(
            "Unhandled image property {:?} ({} bytes)",
            other,
            payload.len()
        ),
    }
    Ok(())
}

fn read_image_properties<R: Read + Seek>(
    cursor: &mut XcfCursor<R>,
    limits: &Limits,
) -> XcfResult<ImageProperties> {
    let mut props = ImageProperties::default();
    read_properties(cursor, limits, |prop, payload| {
        apply_image_property(&mut props, prop, payload)
    })?;
    debug!(
        "Compression {:?}, unit {}, tattoo {}, {} colors",
        props.compression,
        props.unit,
        props.tattoo,
        props.palette.len()
    );
    Ok(props)
}

/// Read the layer offset table. Offsets are returned in file order (top
/// layer first).
fn read_layer_offsets<R: Read + Seek>(
    cursor: &mut XcfCursor<R>,
    limits: &Limits,
) -> XcfResult<Vec<u64>> {
    let mut offsets = Vec::new();
    loop {
        let offset = cursor.read_offset()?;
        if offset == 0 {
            break;
        }
        if offsets.len() as u32 >= limits.max_layers {
            return Err(XcfError::Corrupt(format!(
                "more than {} layers",
                limits.max_layers
            )));
        }
        offsets.push(offset);
    }
    debug!("{} layers", offsets.len());
    Ok(offsets)
}

/// Convert a resolution in dots per inch to dots per meter
fn dots_per_meter(resolution: Option<(f32, f32)>) -> XcfResult<Option<(i32, i32)>> {
    let (x, y) = match resolution {
        Some((x, y)) if x > 0.0 && y > 0.0 => (x, y),
        _ => return Ok(None),
    };

    let convert = |dpi: f32| -> XcfResult<i32> {
        let dpm = dpi * INCHES_PER_METER;
        if dpm > i32::MAX as f32 {
            return Err(XcfError::Corrupt(format!("resolution of {} dpi", dpi)));
        }
        Ok(dpm as i32)
    };

    Ok(Some((convert(x)?, convert(y)?)))
}

/// Decode an XCF document and flatten its visible layers
pub fn read_xcf<R: Read + Seek>(reader: R) -> XcfResult<XcfImage> {
    read_xcf_with_limits(reader, &Limits::default())
}

pub fn read_xcf_with_limits<R: Read + Seek>(reader: R, limits: &Limits) -> XcfResult<XcfImage> {
    let mut cursor = XcfCursor::new(reader);

    let header = read_header(&mut cursor)?;
    limits.check_size("image", header.width, header.height)?;

    let props = read_image_properties(&mut cursor, limits)?;
    let offsets = read_layer_offsets(&mut cursor, limits)?;

    let mut canvas: Option<Canvas> = None;

    // Layers are stored top to bottom and composited bottom up
    for &offset in offsets.iter().rev() {
        cursor.seek(offset)?;
        let layer_header = read_layer_header(&mut cursor, limits)?;
        if !layer_header.props.visible {
            continue;
        }

        let mut layer = read_layer(
            &mut cursor,
            layer_header,
            props.compression,
            props.palette.len(),
            limits,
        )?;

        match canvas.as_mut() {
            None => {
                let mut c = Canvas::for_first_layer(
                    header.width,
                    header.height,
                    layer.kind,
                    layer.props.opacity,
                    &props.palette,
                )
                .ok_or_else(|| {
                    XcfError::Corrupt(format!(
                        "{} colors do not fit in an indexed image",
                        props.palette.len()
                    ))
                })?;
                debug!("Canvas format: {}", c.format().name());
                copy_layer(&mut c, &mut layer, &props.palette);
                canvas = Some(c);
            }
            Some(c) => {
                if !c.accepts(layer.kind) {
                    return Err(XcfError::Format(format!(
                        "cannot merge {:?} layer \"{}\" into a {} image",
                        layer.kind,
                        layer.props.name,
                        c.format().name()
                    )));
                }
                merge_layer(c, &mut layer, &props.palette);
            }
        }
    }

    let canvas = canvas.ok_or(XcfError::NoVisibleLayers)?;

    Ok(XcfImage {
        version: header.version,
        canvas,
        comment: props.comment,
        metadata: props.metadata,
        icc_profile: props.icc_profile,
        dots_per_meter: dots_per_meter(props.resolution)?,
    })
}

/// Check for the XCF magic bytes.
///
/// The stream position is restored afterwards.
pub fn can_read<R: Read + Seek>(reader: &mut R) -> XcfResult<bool> {
    let pos = reader.stream_position()?;
    let mut head = Vec::with_capacity(MAGIC.len());
    reader.by_ref().take(MAGIC.len() as u64).read_to_end(&mut head)?;
    reader.seek(SeekFrom::Start(pos))?;
    Ok(head == MAGIC)
}

/// Read only the image dimensions from the header.
///
/// The stream position is restored afterwards.
pub fn read_size<R: Read + Seek>(reader: &mut R) -> XcfResult<(u32, u32)> {
    let pos = reader.stream_position()?;
    let result = read_header(&mut XcfCursor::new(&mut *reader)).map(|h| (h.width, h.height));
    reader.seek(SeekFrom::Start(pos))?;
    result
}

/// Summary of a layer, without its pixels
#[derive(Clone, Debug)]
pub struct LayerInfo {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub kind: LayerKind,
    pub mode: LayerMode,
    pub opacity: u8,
    pub visible: bool,
    pub x_offset: i32,
    pub y_offset: i32,
    pub has_mask: bool,
}

/// Summary of a document
#[derive(Clone, Debug)]
pub struct XcfInfo {
    pub version: u32,
    pub width: u32,
    pub height: u32,
    pub base_type: BaseType,
    pub precision: Option<u32>,
    pub compression: Compression,
    pub palette_len: usize,
    /// Resolution in dots per inch
    pub resolution: Option<(f32, f32)>,
    pub comment: Option<String>,
    /// Layers in file order (top layer first)
    pub layers: Vec<LayerInfo>,
}

/// Read the document structure without decoding any pixels
pub fn read_info<R: Read + Seek>(reader: R) -> XcfResult<XcfInfo> {
    let limits = Limits::default();
    let mut cursor = XcfCursor::new(reader);

    let header = read_header(&mut cursor)?;
    let props = read_image_properties(&mut cursor, &limits)?;
    let offsets = read_layer_offsets(&mut cursor, &limits)?;

    let mut layers = Vec::with_capacity(offsets.len());
    for offset in offsets {
        cursor.seek(offset)?;
        let h = read_layer_header(&mut cursor, &limits)?;
        if h.kind.is_indexed() && props.palette.is_empty() {
            warn!("Indexed layer \"{}\" without a colormap", h.props.name);
        }
        layers.push(LayerInfo {
            name: h.props.name,
            width: h.width,
            height: h.height,
            kind: h.kind,
            mode: h.props.mode,
            opacity: h.props.opacity,
            visible: h.props.visible,
            x_offset: h.props.x_offset,
            y_offset: h.props.y_offset,
            has_mask: h.mask_offset != 0,
        });
    }

    Ok(XcfInfo {
        version: header.version,
        width: header.width,
        height: header.height,
        base_type: header.base_type,
        precision: header.precision,
        compression: props.compression,
        palette_len: props.palette.len(),
        resolution: props.resolution,
        comment: props.comment,
        layers,
    })
}
