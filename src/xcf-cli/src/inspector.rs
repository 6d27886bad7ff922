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

use anyhow::Context;

use std::fs::File;
use std::io::BufReader;

use xcfimpex::xcf::{read_info, LayerInfo, XcfInfo};

pub struct InfoOpts<'a> {
    /// Name of the input XCF file
    pub input_file: &'a str,

    /// List hidden layers too
    pub show_hidden: bool,
}

pub fn print_info(opts: &InfoOpts) -> anyhow::Result<()> {
    let file = File::open(opts.input_file)
        .with_context(|| format!("could not open {}", opts.input_file))?;

    let info = read_info(BufReader::new(file))
        .with_context(|| format!("could not read {}", opts.input_file))?;

    print!("{}", format_info(&info, opts.show_hidden));
    Ok(())
}

fn format_layer(layer: &LayerInfo) -> String {
    format!(
        "  {:<24} {:>5}x{:<5} {:>6},{:<6} {:<9} {:<16} {:>3}{}{}\n",
        format!("\"{}\"", layer.name),
        layer.width,
        layer.height,
        layer.x_offset,
        layer.y_offset,
        format!("{:?}", layer.kind),
        layer.mode.blendmode.name(),
        layer.opacity,
        if layer.has_mask { " mask" } else { "" },
        if layer.visible { "" } else { " hidden" },
    )
}

/// Human readable summary of a document
pub fn format_info(info: &XcfInfo, show_hidden: bool) -> String {
    let mut out = format!(
        "XCF version {}\nSize: {}x{}\nType: {:?}\n",
        info.version, info.width, info.height, info.base_type
    );

    if let Some(p) = info.precision {
        out += &format!("Precision: {}\n", p);
    }
    out += &format!("Compression: {:?}\n", info.compression);
    if info.palette_len > 0 {
        out += &format!("Colormap: {} colors\n", info.palette_len);
    }
    if let Some((x, y)) = info.resolution {
        out += &format!("Resolution: {}x{} dpi\n", x, y);
    }
    if let Some(comment) = &info.comment {
        out += &format!("Comment: {}\n", comment);
    }

    let visible = info.layers.iter().filter(|l| l.visible).count();
    out += &format!("Layers: {} ({} visible)\n", info.layers.len(), visible);

    for layer in info.layers.iter().filter(|l| show_hidden || l.visible) {
        out += &format_layer(layer);
    }

    out
}
