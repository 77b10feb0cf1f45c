// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Tiles and the raster walk that produces them.
//!
//! The image is cut into a grid of rectangles whose size is a fraction
//! of what a one-tile-per-worker split would give.  The last tile in
//! each row and column takes whatever is left over, so the tiles cover
//! the whole image exactly once no matter how badly the dimensions
//! divide.

use itertools::{iproduct, Product};
use std::iter::StepBy;
use std::ops::Range;

/// Describes one rectangle of the image to be computed, or, when
/// `terminate` is set, tells the receiving worker to stop.  The
/// origin is inclusive; the extent runs `size_x` columns right and
/// `size_y` rows down from it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TileDescriptor {
    /// Leftmost column of the tile.
    pub origin_x: u32,
    /// Topmost row of the tile.
    pub origin_y: u32,
    /// Width of the tile in pixels.
    pub size_x: u32,
    /// Height of the tile in pixels.
    pub size_y: u32,
    /// When set, the descriptor carries no tile.
    pub terminate: bool,
}

impl TileDescriptor {
    /// A descriptor for real work.
    pub fn new(origin_x: u32, origin_y: u32, size_x: u32, size_y: u32) -> Self {
        TileDescriptor {
            origin_x,
            origin_y,
            size_x,
            size_y,
            terminate: false,
        }
    }

    /// The shutdown instruction.
    pub fn terminate() -> Self {
        TileDescriptor {
            terminate: true,
            ..TileDescriptor::default()
        }
    }

    /// Number of pixels in the tile.
    pub fn area(&self) -> usize {
        self.size_x as usize * self.size_y as usize
    }
}

/// The raster partition of a `width` x `height` image into tiles of
/// `step_x` x `step_y`.  Iterating it yields rows outer, columns inner.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TileGrid {
    width: u32,
    height: u32,
    step_x: u32,
    step_y: u32,
}

impl TileGrid {
    /// Builds the grid directly from step sizes.  Returns None if
    /// either step is zero, since the walk would never advance.
    pub fn with_steps(width: u32, height: u32, step_x: u32, step_y: u32) -> Option<Self> {
        if step_x == 0 || step_y == 0 {
            return None;
        }
        Some(TileGrid {
            width,
            height,
            step_x,
            step_y,
        })
    }

    /// Builds the grid for a `groups_x` x `groups_y` process grid and a
    /// density factor `k`.  The steps are `k * width / groups_x` and
    /// `k * height / groups_y`, truncated.
    pub fn new(width: u32, height: u32, groups_x: u32, groups_y: u32, k: f64) -> Option<Self> {
        let (step_x, step_y) = steps(width, height, groups_x, groups_y, k)?;
        TileGrid::with_steps(width, height, step_x, step_y)
    }

    /// The image width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// The image height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Column and row step.
    pub fn steps(&self) -> (u32, u32) {
        (self.step_x, self.step_y)
    }

    /// Number of tiles the walk will produce.
    pub fn len(&self) -> usize {
        let across = (self.width + self.step_x - 1) / self.step_x;
        let down = (self.height + self.step_y - 1) / self.step_y;
        across as usize * down as usize
    }

    /// True when the image has no pixels.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The tiles, in raster order.
    pub fn tiles(&self) -> Tiles {
        Tiles {
            grid: *self,
            origins: iproduct!(
                (0..self.height).step_by(self.step_y as usize),
                (0..self.width).step_by(self.step_x as usize)
            ),
        }
    }
}

impl IntoIterator for TileGrid {
    type Item = TileDescriptor;
    type IntoIter = Tiles;

    fn into_iter(self) -> Tiles {
        self.tiles()
    }
}

/// Truncated step sizes for a process grid and density factor, or None
/// when the grid is empty or a step would be zero.
pub fn steps(width: u32, height: u32, groups_x: u32, groups_y: u32, k: f64) -> Option<(u32, u32)> {
    if groups_x == 0 || groups_y == 0 {
        return None;
    }
    let step_x = (k * f64::from(width) / f64::from(groups_x)) as u32;
    let step_y = (k * f64::from(height) / f64::from(groups_y)) as u32;
    if step_x == 0 || step_y == 0 {
        None
    } else {
        Some((step_x, step_y))
    }
}

/// Iterator over the tiles of a `TileGrid`.
pub struct Tiles {
    grid: TileGrid,
    origins: Product<StepBy<Range<u32>>, StepBy<Range<u32>>>,
}

impl Iterator for Tiles {
    type Item = TileDescriptor;

    fn next(&mut self) -> Option<TileDescriptor> {
        let (y, x) = self.origins.next()?;
        let g = &self.grid;
        // Edge tiles absorb the remainder.
        let size_x = if x + g.step_x > g.width {
            g.width % g.step_x
        } else {
            g.step_x
        };
        let size_y = if y + g.step_y > g.height {
            g.height % g.step_y
        } else {
            g.step_y
        };
        Some(TileDescriptor::new(x, y, size_x, size_y))
    }
}
