// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::io::{self, Write};
use std::process;
use tracing_subscriber::EnvFilter;

use mandelbrot_dlb::{cluster, output, Config, Error};

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(config: &Config) -> Result<(), Error> {
    let render = cluster::run(config)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, ">>> Done!")?;
    writeln!(out, ">>> Elapsed time is {:.6}", render.elapsed.as_secs_f64())?;
    writeln!(out, ">>> Tiles per worker: {:?}", render.tiles_per_worker)?;
    if config.print {
        output::print_matrix(&mut out, &render.image)?;
    }
    if let Some(path) = &config.output {
        output::write_image(path, &render.image, config.iterations)?;
    }
    Ok(())
}

fn main() {
    let config = match Config::from_args(std::env::args_os()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(">> {}", e);
            process::exit(e.exit_code());
        }
    };
    init_logging(config.verbose);

    if let Err(e) = run(&config) {
        eprintln!("Render failure: {}", e);
        process::exit(e.exit_code());
    }
}
