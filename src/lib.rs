#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot renderer with dynamic load balancing
//!
//! The image is cut into more tiles than there are workers.  The
//! escape-time count of a pixel depends on how close it sits to the
//! border of the Mandelbrot set, so some tiles finish in a blink and
//! others take ages; nobody can say in advance which.  Rather than fix
//! each worker's share up front, a single coordinator hands out one
//! tile at a time and, whenever it runs out of idle workers, waits for
//! whichever worker finishes first and gives it the next tile.  Every
//! worker stays busy until the image is done.
//!
//! Coordinator and workers share nothing but point-to-point channels:
//! descriptors go out, flat buffers of counts come back, and the
//! coordinator stitches each buffer into the full image.

extern crate crossbeam;
extern crate image;
extern crate itertools;
extern crate num;
extern crate num_cpus;

pub mod assemble;
pub mod cluster;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod kernel;
pub mod output;
pub mod planes;
pub mod slots;
pub mod tiles;
pub mod transport;
pub mod wire;
pub mod worker;

pub use assemble::ResultBuffer;
pub use config::{Config, ConfigError};
pub use coordinator::{Coordinator, Render};
pub use error::Error;
pub use kernel::{Count, EscapeTime, Kernel};
pub use tiles::{TileDescriptor, TileGrid};
pub use transport::{Transport, WorkerId};
