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
use tracing::info;

use std::time::Instant;

use xcfimpex::xcf::Limits;
use xcfimpex::{load_xcf_with_limits, save_flat_image};

pub struct RenderOpts<'a> {
    /// Name of the input XCF file
    pub input_file: &'a str,

    /// Name of the output image file
    pub output_file: &'a str,

    /// Override the maximum accepted number of layers
    pub max_layers: Option<u32>,

    /// Override the maximum accepted layer width and height
    pub max_dimension: Option<u32>,
}

impl RenderOpts<'_> {
    pub fn limits(&self) -> Limits {
        let defaults = Limits::default();
        Limits {
            max_layers: self.max_layers.unwrap_or(defaults.max_layers),
            max_dimension: self.max_dimension.unwrap_or(defaults.max_dimension),
            ..defaults
        }
    }
}

pub fn render_xcf(opts: &RenderOpts) -> anyhow::Result<()> {
    let start = Instant::now();

    let image = load_xcf_with_limits(opts.input_file, &opts.limits())
        .with_context(|| format!("could not read {}", opts.input_file))?;

    let decode_time = start.elapsed();
    info!(
        "Decoded {}x{} {} image (XCF version {})",
        image.width(),
        image.height(),
        image.canvas.format().name(),
        image.version
    );
    if let Some((x, y)) = image.dots_per_meter {
        info!("Resolution: {}x{} dots per meter", x, y);
    }

    let now = Instant::now();
    info!("Saving {}", opts.output_file);
    save_flat_image(opts.output_file, &image.canvas)
        .with_context(|| format!("could not write {}", opts.output_file))?;

    info!("Decode time: {:.3} s", decode_time.as_secs_f64());
    info!("Save time: {:.3} s", now.elapsed().as_secs_f64());
    info!("Total time: {:.3} s", start.elapsed().as_secs_f64());

    Ok(())
}
