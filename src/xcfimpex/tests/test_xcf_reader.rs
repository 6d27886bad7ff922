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

mod common;

use common::*;
use std::io::Cursor;

use xcfcore::paint::color::rgba8;
use xcfcore::paint::CanvasFormat;
use xcfimpex::xcf::{read_info, read_size, read_xcf, read_xcf_with_limits, Limits};
use xcfimpex::xcf::{BaseType, Compression};
use xcfimpex::XcfError;

fn decode(builder: &XcfBuilder) -> Result<xcfimpex::XcfImage, XcfError> {
    read_xcf(Cursor::new(builder.build()))
}

#[test]
fn test_single_uncompressed_rgb_layer() {
    let pixels: Vec<u8> = (0..4 * 3).flat_map(|i| [i * 10, 100, 255 - i]).collect();
    let doc = XcfBuilder::new(4, 3).layer(TestLayer::new("bg", 4, 3, RGB, pixels));

    let img = decode(&doc).unwrap();
    let canvas = &img.canvas;
    assert_eq!(canvas.format(), CanvasFormat::Rgb32);
    assert!(canvas.palette().is_empty());
    assert_eq!((img.width(), img.height()), (4, 3));
    assert_eq!(canvas.color(0, 0), rgba8(0, 100, 255, 255));
    assert_eq!(canvas.color(3, 2), rgba8(110, 100, 244, 255));
    assert_eq!(img.comment, None);
    assert_eq!(img.dots_per_meter, None);
}

#[test]
fn test_half_opaque_layer_over_opaque_layer() {
    let doc = XcfBuilder::new(8, 8)
        .compression(COMPRESS_RLE)
        .layer(TestLayer::solid("red", 8, 8, RGB, &[255, 0, 0]))
        .layer(TestLayer::solid("blue", 8, 8, RGB, &[0, 0, 255]).prop(opacity(128)));

    let img = decode(&doc).unwrap();
    assert_eq!(img.canvas.format(), CanvasFormat::Rgb32);
    for y in 0..8 {
        for x in 0..8 {
            assert_eq!(img.canvas.color(x, y), rgba8(127, 0, 128, 255));
        }
    }
}

#[test]
fn test_no_visible_layers() {
    let doc = XcfBuilder::new(4, 4)
        .layer(TestLayer::solid("hidden", 4, 4, RGB, &[1, 2, 3]).prop(visible(false)));
    assert!(matches!(decode(&doc), Err(XcfError::NoVisibleLayers)));

    let empty = XcfBuilder::new(4, 4);
    assert!(matches!(decode(&empty), Err(XcfError::NoVisibleLayers)));
}

#[test]
fn test_invisible_layer_is_never_decoded() {
    let doc = XcfBuilder::new(2, 2)
        .layer(TestLayer::solid("bg", 2, 2, GRAY, &[40]))
        .layer(
            TestLayer::solid("broken", 2, 2, GRAY, &[0])
                .prop(visible(false))
                .bogus_hierarchy(0xffff_fff0),
        );

    let img = decode(&doc).unwrap();
    assert_eq!(img.canvas.format(), CanvasFormat::Gray8);
    assert_eq!(img.canvas.index(1, 1), 40);
}

#[test]
fn test_unknown_properties_are_skipped() {
    let doc = XcfBuilder::new(2, 2)
        .prop(prop(99, &[1, 2, 3, 4, 5]))
        .prop(prop(25, &[0; 12]))
        .layer(
            TestLayer::solid("bg", 2, 2, RGB, &[9, 8, 7])
                .prop(prop(1234, &[0xff; 40]))
                .prop(prop(34, &[0, 0, 0, 3])),
        );

    let img = decode(&doc).unwrap();
    assert_eq!(img.canvas.color(0, 1), rgba8(9, 8, 7, 255));
}

#[test]
fn test_partial_edge_tiles() {
    // 100x65 splits into tiles of 64x64, 36x64, 64x1 and 36x1
    let (w, h) = (100u32, 65u32);
    let pixels: Vec<u8> = (0..h)
        .flat_map(|y| (0..w).flat_map(move |x| [x as u8, y as u8, 7, 255]))
        .collect();

    for compression in [COMPRESS_NONE, COMPRESS_RLE] {
        let doc = XcfBuilder::new(w, h)
            .compression(compression)
            .layer(TestLayer::new("gradient", w, h, RGBA, pixels.clone()));

        let img = decode(&doc).unwrap();
        assert_eq!(img.canvas.format(), CanvasFormat::Argb32);
        for &(x, y) in &[(0, 0), (63, 63), (64, 0), (99, 63), (5, 64), (99, 64)] {
            assert_eq!(
                img.canvas.color(x, y),
                rgba8(x as u8, y as u8, 7, 255),
                "pixel {},{} with compression {}",
                x,
                y,
                compression
            );
        }
    }
}

#[test]
fn test_layer_offsets_are_clipped() {
    let doc = XcfBuilder::new(4, 4)
        .layer(TestLayer::solid("white", 4, 4, RGB, &[255, 255, 255]))
        .layer(TestLayer::solid("black", 2, 2, RGB, &[0, 0, 0]).prop(offsets(3, 3)));

    let img = decode(&doc).unwrap();
    assert_eq!(img.canvas.color(3, 3), rgba8(0, 0, 0, 255));
    assert_eq!(img.canvas.color(2, 3), rgba8(255, 255, 255, 255));
    assert_eq!(img.canvas.color(3, 2), rgba8(255, 255, 255, 255));
}

#[test]
fn test_mask_applies_by_default() {
    let layer = || TestLayer::solid("masked", 2, 2, RGBA, &[255, 0, 0, 255]);

    let doc = XcfBuilder::new(2, 2).layer(layer().mask(vec![128; 4], vec![]));
    let img = decode(&doc).unwrap();
    assert_eq!(img.canvas.color(0, 0), rgba8(255, 0, 0, 128));

    let doc = XcfBuilder::new(2, 2).layer(
        layer()
            .prop(apply_mask(false))
            .mask(vec![128; 4], vec![opacity(255)]),
    );
    let img = decode(&doc).unwrap();
    assert_eq!(img.canvas.color(0, 0), rgba8(255, 0, 0, 255));
}

#[test]
fn test_rle_overrun_is_corrupt() {
    // A run of 8 pixels in a 2x2 tile
    let doc = XcfBuilder::new(2, 2)
        .compression(COMPRESS_RLE)
        .layer(TestLayer::solid("bad", 2, 2, GRAY, &[0]).raw_tiles(vec![vec![7, 50]]));

    assert!(matches!(decode(&doc), Err(XcfError::Corrupt(_))));
}

#[test]
fn test_truncated_file() {
    let doc = XcfBuilder::new(2, 2).layer(TestLayer::solid("bg", 2, 2, RGB, &[1, 2, 3]));
    let mut data = doc.build();
    data.truncate(data.len() - 30);

    assert!(matches!(
        read_xcf(Cursor::new(data)),
        Err(XcfError::Truncated)
    ));
}

#[test]
fn test_64bit_offsets() {
    let build = |version| {
        XcfBuilder::new(3, 3)
            .version(version)
            .compression(COMPRESS_RLE)
            .layer(TestLayer::solid("bg", 3, 3, RGB, &[10, 20, 30]))
            .layer(TestLayer::solid("top", 3, 3, RGBA, &[200, 100, 50, 128]).prop(mode(3)))
    };

    let old = decode(&build(3)).unwrap();
    let new = decode(&build(11)).unwrap();
    assert_eq!(new.version, 11);
    assert_eq!(old.canvas, new.canvas);
}

#[test]
fn test_indexed_document() {
    let palette = [[255, 0, 0], [0, 255, 0], [0, 0, 255]];
    let doc = XcfBuilder::new(3, 1)
        .base_type(2)
        .prop(colormap(&palette))
        .layer(TestLayer::new("bg", 3, 1, INDEXED, vec![2, 1, 0]));

    let img = decode(&doc).unwrap();
    assert_eq!(img.canvas.format(), CanvasFormat::Indexed8);
    assert_eq!(img.canvas.palette().len(), 3);
    assert_eq!(img.canvas.index(0, 0), 2);
    assert_eq!(img.canvas.color(0, 0), rgba8(0, 0, 255, 255));
    assert_eq!(img.canvas.color(2, 0), rgba8(255, 0, 0, 255));
}

#[test]
fn test_incompatible_layer_kind() {
    let doc = XcfBuilder::new(2, 2)
        .base_type(2)
        .prop(colormap(&[[0, 0, 0], [255, 255, 255], [9, 9, 9]]))
        .layer(TestLayer::solid("bg", 2, 2, INDEXED, &[1]))
        .layer(TestLayer::solid("rgb", 2, 2, RGB, &[1, 2, 3]));

    assert!(matches!(decode(&doc), Err(XcfError::Format(_))));
}

#[test]
fn test_metadata() {
    let doc = XcfBuilder::new(1, 1)
        .prop(resolution(72.0, 300.0))
        .prop(parasite("gimp-comment", b"Created with GIMP\0"))
        .layer(TestLayer::solid("bg", 1, 1, RGB, &[0, 0, 0]));

    let img = decode(&doc).unwrap();
    assert_eq!(img.comment.as_deref(), Some("Created with GIMP"));
    assert_eq!(img.dots_per_meter, Some((2834, 11811)));
}

#[test]
fn test_limits() {
    let doc = XcfBuilder::new(16, 16).layer(TestLayer::solid("bg", 16, 16, RGB, &[0, 0, 0]));
    let limits = Limits {
        max_dimension: 8,
        ..Limits::default()
    };
    assert!(matches!(
        read_xcf_with_limits(Cursor::new(doc.build()), &limits),
        Err(XcfError::Corrupt(_))
    ));
}

#[test]
fn test_huge_canvas_is_rejected() {
    let doc =
        XcfBuilder::new(32767, 32767).layer(TestLayer::solid("dot", 1, 1, RGB, &[1, 2, 3]));
    assert!(matches!(decode(&doc), Err(XcfError::Corrupt(_))));

    let limits = Limits {
        max_pixels: 15,
        ..Limits::default()
    };
    let doc = XcfBuilder::new(4, 4).layer(TestLayer::solid("bg", 4, 4, RGB, &[1, 2, 3]));
    assert!(matches!(
        read_xcf_with_limits(Cursor::new(doc.build()), &limits),
        Err(XcfError::Corrupt(_))
    ));

    // The cap also applies to layers larger than the image
    let limits = Limits {
        max_pixels: 16,
        ..Limits::default()
    };
    let doc = XcfBuilder::new(4, 4).layer(TestLayer::solid("big", 5, 4, RGB, &[1, 2, 3]));
    assert!(matches!(
        read_xcf_with_limits(Cursor::new(doc.build()), &limits),
        Err(XcfError::Corrupt(_))
    ));
}

#[test]
fn test_document_info() {
    let doc = XcfBuilder::new(5, 6)
        .version(3)
        .layer(TestLayer::solid("bottom", 5, 6, RGB, &[0, 0, 0]))
        .layer(
            TestLayer::solid("top", 2, 2, GRAYA, &[0, 255])
                .prop(offsets(-1, 2))
                .prop(visible(false))
                .mask(vec![0; 4], vec![]),
        );
    let data = doc.build();

    let mut c = Cursor::new(data.clone());
    assert_eq!(read_size(&mut c).unwrap(), (5, 6));

    let info = read_info(Cursor::new(data)).unwrap();
    assert_eq!(info.version, 3);
    assert_eq!(info.base_type, BaseType::Rgb);
    assert_eq!(info.compression, Compression::None);
    assert_eq!(info.layers.len(), 2);

    let top = &info.layers[0];
    assert_eq!(top.name, "top");
    assert!(!top.visible);
    assert!(top.has_mask);
    assert_eq!((top.x_offset, top.y_offset), (-1, 2));
    assert_eq!(info.layers[1].name, "bottom");
    assert!(!info.layers[1].has_mask);
}
