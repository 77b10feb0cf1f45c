// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Command line configuration.
//!
//! Every way the arguments can be wrong has its own exit status, and
//! all of them are caught before any worker is started.

use clap::{App, Arg, ArgMatches, ErrorKind};
use failure::Fail;
use std::ffi::OsString;
use std::path::PathBuf;
use std::str::FromStr;

use crate::kernel::Count;
use crate::tiles::{self, TileGrid};

/// Default image size.
pub const DEFAULT_RESOLUTION: &str = "1920x1080";

/// Default iteration bound.
pub const DEFAULT_ITERATIONS: &str = "10000";

const GRID: &str = "grid";
const DENSITY: &str = "k";
const RESOLUTION: &str = "resolution";
const ITERATIONS: &str = "iterations";
const PROCESSES: &str = "processes";
const OUTPUT: &str = "output";
const PRINT: &str = "print";
const VERBOSE: &str = "verbose";

/// Bad arguments.
#[derive(Debug, Fail, PartialEq)]
pub enum ConfigError {
    /// Missing or unrecognised arguments.
    #[fail(display = "{}", _0)]
    Usage(String),
    /// The process count is not a positive number.
    #[fail(display = "Could not parse process count '{}'", _0)]
    Processes(String),
    /// The grid is not `NxM` with both sides positive.
    #[fail(display = "Something went wrong during grid parsing: '{}'", _0)]
    Grid(String),
    /// K is not a number.
    #[fail(display = "Something went wrong during K parsing: '{}'", _0)]
    DensityNumber(String),
    /// The resolution is not `WxH` with both sides positive.
    #[fail(display = "Something went wrong during image resolution parsing: '{}'", _0)]
    Resolution(String),
    /// The iteration bound is not a number in range.
    #[fail(
        display = "Something went wrong during max iterations parsing: '{}' (must be 1..={})",
        _0, _1
    )]
    Iterations(String, Count),
    /// The grid needs more processes than there are.
    #[fail(
        display = "You need {} processes in a grid {} and you have {} processes",
        needed, grid, available
    )]
    TooFewProcesses {
        /// The grid as given.
        grid: Grid,
        /// Processes the grid needs.
        needed: usize,
        /// Processes available.
        available: usize,
    },
    /// K is a number but not an allowed one.
    #[fail(display = "K must be one of these values: [0.25, 0.5, 0.75, 1], not {}", _0)]
    Density(f64),
    /// The tiles would be less than a pixel across.
    #[fail(
        display = "A {} grid with K = {} leaves no pixels per tile in a {} image",
        grid, density, resolution
    )]
    TilesTooSmall {
        /// The grid.
        grid: Grid,
        /// The density factor.
        density: f64,
        /// The image size.
        resolution: Resolution,
    },
}

impl ConfigError {
    /// Exit status, one per kind of failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConfigError::Usage(_) => 3,
            ConfigError::Processes(_) => 4,
            ConfigError::Grid(_) => 5,
            ConfigError::DensityNumber(_) => 6,
            ConfigError::Resolution(_) => 7,
            ConfigError::Iterations(..) => 8,
            ConfigError::TooFewProcesses { .. } => 9,
            ConfigError::Density(_) => 10,
            ConfigError::TilesTooSmall { .. } => 11,
        }
    }
}

/// Given a string and a separator, returns the two values separated
/// by the separator.
pub fn parse_pair<T: FromStr>(s: &str, separator: char) -> Option<(T, T)> {
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

/// The process grid, `groups_x` by `groups_y`.  One process
/// coordinates; the rest are workers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Grid {
    /// Columns of the grid.
    pub x: u32,
    /// Rows of the grid.
    pub y: u32,
}

impl Grid {
    /// Processes the grid occupies, coordinator included.
    pub fn processes(&self) -> usize {
        self.x as usize * self.y as usize
    }

    /// Workers in the grid.
    pub fn workers(&self) -> usize {
        self.processes() - 1
    }
}

impl FromStr for Grid {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        match parse_pair::<u32>(s, 'x') {
            Some((x, y)) if x > 0 && y > 0 => Ok(Grid { x, y }),
            _ => Err(ConfigError::Grid(s.to_string())),
        }
    }
}

impl std::fmt::Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}x{}", self.x, self.y)
    }
}

/// Image size in pixels.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Resolution {
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

impl FromStr for Resolution {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        match parse_pair::<u32>(s, 'x') {
            Some((width, height)) if width > 0 && height > 0 => Ok(Resolution { width, height }),
            _ => Err(ConfigError::Resolution(s.to_string())),
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// The density factor k.  Each tile is k times the size of a
/// one-tile-per-process split, so there are about 1/k² tiles per
/// process.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Density {
    /// k = 0.25
    Quarter,
    /// k = 0.5
    Half,
    /// k = 0.75
    ThreeQuarters,
    /// k = 1
    Full,
}

impl Density {
    /// The allowed value matching `k` exactly, if any.
    pub fn from_factor(k: f64) -> Option<Density> {
        if k == 0.25 {
            Some(Density::Quarter)
        } else if k == 0.5 {
            Some(Density::Half)
        } else if k == 0.75 {
            Some(Density::ThreeQuarters)
        } else if k == 1.0 {
            Some(Density::Full)
        } else {
            None
        }
    }

    /// The factor as a number.
    pub fn factor(self) -> f64 {
        match self {
            Density::Quarter => 0.25,
            Density::Half => 0.5,
            Density::ThreeQuarters => 0.75,
            Density::Full => 1.0,
        }
    }
}

/// A validated run configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// The process grid.
    pub grid: Grid,
    /// The density factor.
    pub density: Density,
    /// The image size.
    pub resolution: Resolution,
    /// Per-pixel iteration bound.
    pub iterations: Count,
    /// Processes available to the run.
    pub processes: usize,
    /// Where to write a grayscale image, if anywhere.
    pub output: Option<PathBuf>,
    /// Dump the result matrix to stdout.
    pub print: bool,
    /// Debug-level logging.
    pub verbose: bool,
}

fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("mandelbrot-dlb")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Mandelbrot renderer with dynamic load balancing")
        .arg(
            Arg::with_name(GRID)
                .required(true)
                .index(1)
                .help("Process grid, e.g. 2x3, 4x4, 8x2"),
        )
        .arg(
            Arg::with_name(DENSITY)
                .required(true)
                .index(2)
                .help("Tile density factor, one of 0.25, 0.5, 0.75, 1"),
        )
        .arg(
            Arg::with_name(RESOLUTION)
                .index(3)
                .default_value(DEFAULT_RESOLUTION)
                .help("Image resolution"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .index(4)
                .default_value(DEFAULT_ITERATIONS)
                .help("Maximum iterations per pixel"),
        )
        .arg(
            Arg::with_name(PROCESSES)
                .long(PROCESSES)
                .short("p")
                .takes_value(true)
                .help("Size of the process group (default: number of CPUs)"),
        )
        .arg(
            Arg::with_name(OUTPUT)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Write the result as a grayscale PGM image"),
        )
        .arg(
            Arg::with_name(PRINT)
                .long(PRINT)
                .help("Print the result matrix"),
        )
        .arg(
            Arg::with_name(VERBOSE)
                .long(VERBOSE)
                .short("v")
                .help("Log every dispatch and collection"),
        )
}

impl Config {
    /// Parses and validates a full argument list, program name first.
    /// Prints help or version and exits when asked for them.
    pub fn from_args<I, T>(args: I) -> Result<Config, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = match app().get_matches_from_safe(args) {
            Ok(matches) => matches,
            Err(e) => match e.kind {
                ErrorKind::HelpDisplayed | ErrorKind::VersionDisplayed => e.exit(),
                _ => return Err(ConfigError::Usage(e.message)),
            },
        };
        Config::from_matches(&matches)
    }

    fn from_matches(matches: &ArgMatches) -> Result<Config, ConfigError> {
        let value = |name: &str| matches.value_of(name).unwrap_or_default();

        let grid: Grid = value(GRID).parse()?;
        let k = f64::from_str(value(DENSITY))
            .map_err(|_| ConfigError::DensityNumber(value(DENSITY).to_string()))?;
        let resolution: Resolution = value(RESOLUTION).parse()?;
        let iterations = match Count::from_str(value(ITERATIONS)) {
            Ok(i) if i > 0 => i,
            _ => {
                return Err(ConfigError::Iterations(
                    value(ITERATIONS).to_string(),
                    Count::max_value(),
                ))
            }
        };
        let processes = match matches.value_of(PROCESSES) {
            None => num_cpus::get(),
            Some(p) => match usize::from_str(p) {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::Processes(p.to_string())),
            },
        };

        Config::new(grid, k, resolution, iterations, processes).map(|config| Config {
            output: matches.value_of(OUTPUT).map(PathBuf::from),
            print: matches.is_present(PRINT),
            verbose: matches.is_present(VERBOSE),
            ..config
        })
    }

    /// Validates an already-parsed configuration against the process
    /// group size.
    pub fn new(
        grid: Grid,
        k: f64,
        resolution: Resolution,
        iterations: Count,
        processes: usize,
    ) -> Result<Config, ConfigError> {
        if grid.processes() > processes {
            return Err(ConfigError::TooFewProcesses {
                grid,
                needed: grid.processes(),
                available: processes,
            });
        }
        let density = Density::from_factor(k).ok_or(ConfigError::Density(k))?;
        let config = Config {
            grid,
            density,
            resolution,
            iterations,
            processes,
            output: None,
            print: false,
            verbose: false,
        };
        config.tile_grid()?;
        Ok(config)
    }

    /// Workers that take part in the run.
    pub fn workers(&self) -> usize {
        self.grid.workers()
    }

    /// Processes beyond the grid, which sit the run out.
    pub fn unused_processes(&self) -> usize {
        self.processes - self.grid.processes()
    }

    /// The tiles this configuration produces.
    pub fn tile_grid(&self) -> Result<TileGrid, ConfigError> {
        let Resolution { width, height } = self.resolution;
        tiles::steps(width, height, self.grid.x, self.grid.y, self.density.factor())
            .and_then(|(step_x, step_y)| TileGrid::with_steps(width, height, step_x, step_y))
            .ok_or(ConfigError::TilesTooSmall {
                grid: self.grid,
                density: self.density.factor(),
                resolution: self.resolution,
            })
    }
}
