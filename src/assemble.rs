// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Stitching tile results back into the full image.

use failure::Fail;

use crate::kernel::Count;
use crate::tiles::TileDescriptor;

/// A tile result that cannot be placed.
#[derive(Debug, Fail, PartialEq)]
pub enum AssembleError {
    /// The result does not have one value per pixel of its tile.
    #[fail(display = "tile {:?} needs {} values, got {}", tile, expected, actual)]
    Length {
        /// The tile the result was for.
        tile: TileDescriptor,
        /// The tile's area.
        expected: usize,
        /// The length of the result.
        actual: usize,
    },
    /// The tile reaches outside the image.
    #[fail(display = "tile {:?} does not fit in a {}x{} image", tile, width, height)]
    OutOfBounds {
        /// The offending tile.
        tile: TileDescriptor,
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
    },
}

/// Copies a tile's row-major `counts` into `buffer`, an image `width`
/// pixels wide, at the tile's origin.
pub fn assemble(
    buffer: &mut [Count],
    width: u32,
    tile: &TileDescriptor,
    counts: &[Count],
) -> Result<(), AssembleError> {
    if counts.len() != tile.area() {
        return Err(AssembleError::Length {
            tile: *tile,
            expected: tile.area(),
            actual: counts.len(),
        });
    }
    let height = if width == 0 {
        0
    } else {
        (buffer.len() / width as usize) as u32
    };
    let fits = u64::from(tile.origin_x) + u64::from(tile.size_x) <= u64::from(width)
        && u64::from(tile.origin_y) + u64::from(tile.size_y) <= u64::from(height);
    if !fits {
        return Err(AssembleError::OutOfBounds {
            tile: *tile,
            width,
            height,
        });
    }
    if tile.size_x == 0 {
        return Ok(());
    }

    let width = width as usize;
    let (ox, oy, sx) = (
        tile.origin_x as usize,
        tile.origin_y as usize,
        tile.size_x as usize,
    );
    for (row, source) in counts.chunks(sx).enumerate() {
        let start = (oy + row) * width + ox;
        buffer[start..start + sx].copy_from_slice(source);
    }
    Ok(())
}

/// The full `width` x `height` image, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Count>,
}

impl ResultBuffer {
    /// A zeroed image.
    pub fn new(width: u32, height: u32) -> Self {
        ResultBuffer {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    /// Places one tile's counts.
    pub fn assemble(&mut self, tile: &TileDescriptor, counts: &[Count]) -> Result<(), AssembleError> {
        assemble(&mut self.pixels, self.width, tile, counts)
    }

    /// Image width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The pixels, row-major.
    pub fn pixels(&self) -> &[Count] {
        &self.pixels
    }

    /// The image one row at a time.
    pub fn rows(&self) -> std::slice::Chunks<'_, Count> {
        self.pixels.chunks(self.width.max(1) as usize)
    }

    /// Gives up the pixels.
    pub fn into_pixels(self) -> Vec<Count> {
        self.pixels
    }
}
