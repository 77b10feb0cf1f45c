// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The per-tile compute kernel.
//!
//! The scheduler does not care what is computed, only that a tile goes
//! in and exactly `size_x * size_y` counts come out, row-major.  The
//! `EscapeTime` kernel is the classic Mandelbrot escape-time count:
//! the number of times `z = z * z + c` can be applied, starting from
//! zero, before `z` leaves the circle of radius two.

use num::Complex;

use crate::planes::{Pixel, PlaneMapper, PlaneError};
use crate::tiles::TileDescriptor;

/// The value type of every result buffer.
pub type Count = u16;

/// Anything that can fill in a tile.  Implementations must be pure:
/// the same tile always produces the same counts.
pub trait Kernel: Sync {
    /// Computes the tile into `out`, which is cleared first and holds
    /// exactly `tile.area()` values afterwards.
    fn compute_into(&self, tile: &TileDescriptor, out: &mut Vec<Count>);

    /// Convenience wrapper that allocates a fresh buffer.
    fn compute(&self, tile: &TileDescriptor) -> Vec<Count> {
        let mut out = Vec::with_capacity(tile.area());
        self.compute_into(tile, &mut out);
        out
    }
}

/// Escape-time iteration over the Mandelbrot window.
#[derive(Debug, Clone)]
pub struct EscapeTime {
    plane: PlaneMapper,
    max_iterations: Count,
}

impl EscapeTime {
    /// A kernel for a `width` x `height` image, bounding each pixel at
    /// `max_iterations`.
    pub fn new(width: u32, height: u32, max_iterations: Count) -> Result<Self, PlaneError> {
        Ok(EscapeTime {
            plane: PlaneMapper::mandelbrot(width, height)?,
            max_iterations,
        })
    }

    /// The iteration bound.
    pub fn max_iterations(&self) -> Count {
        self.max_iterations
    }

    /// The escape count of a single point.
    pub fn escape(&self, c: Complex<f64>) -> Count {
        let mut z: Complex<f64> = Complex { re: 0.0, im: 0.0 };
        let mut iteration = 0;
        while z.norm_sqr() < 4.0 && iteration < self.max_iterations {
            z = z * z + c;
            iteration += 1;
        }
        iteration
    }
}

impl Kernel for EscapeTime {
    fn compute_into(&self, tile: &TileDescriptor, out: &mut Vec<Count>) {
        out.clear();
        out.reserve(tile.area());
        for row in tile.origin_y..tile.origin_y + tile.size_y {
            for column in tile.origin_x..tile.origin_x + tile.size_x {
                let c = self.plane.pixel_to_point(Pixel(column, row));
                out.push(self.escape(c));
            }
        }
    }
}
