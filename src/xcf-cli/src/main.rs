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

use tracing::Level;

use std::path::Path;
use std::process::exit;

use xcf_cli::inspector::{print_info, InfoOpts};
use xcf_cli::renderer::{render_xcf, RenderOpts};

fn main() -> anyhow::Result<()> {
    let flags = xflags::parse_or_exit! {
        /// Displays version information and exits.
        optional -v,--version
        /// Print extra debugging information.
        optional -V,--verbose
        /// Print the layer structure of the input file instead of rendering it.
        optional -i,--info
        /// With --info, also list hidden layers.
        optional -a,--all
        /// Output file. The format is chosen by the file extension. The default
        /// is the input file name with a .png extension.
        optional -o,--out output: String
        /// Refuse files with more layers than this.
        optional --max-layers max_layers: u32
        /// Refuse layers wider or taller than this.
        optional --max-dimension max_dimension: u32
        /// Input XCF file.
        optional input: String
    };

    if flags.version {
        println!("xcf-cli {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    tracing_subscriber::fmt::Subscriber::builder()
        .with_max_level(if flags.verbose {
            Level::DEBUG
        } else {
            Level::WARN
        })
        .with_writer(std::io::stderr)
        .init();

    let input = match flags.input {
        Some(input) => input,
        None => {
            eprintln!("No input given");
            exit(2);
        }
    };

    if flags.info {
        if flags.out.is_some() {
            eprintln!("Warning: -o/--out has no effect with -i/--info");
        }
        let opts = InfoOpts {
            input_file: &input,
            show_hidden: flags.all,
        };
        print_info(&opts)
    } else {
        if flags.all {
            eprintln!("Warning: -a/--all has no effect without -i/--info");
        }
        let default_output = default_output_name(&input);
        let opts = RenderOpts {
            input_file: &input,
            output_file: flags.out.as_deref().unwrap_or(&default_output),
            max_layers: flags.max_layers,
            max_dimension: flags.max_dimension,
        };
        render_xcf(&opts)
    }
}

/// The input file name with its extension replaced by ".png"
fn default_output_name(input: &str) -> String {
    Path::new(input)
        .with_extension("png")
        .to_string_lossy()
        .into_owned()
}
