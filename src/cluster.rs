// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Bringing the pool up and down around a render.
//!
//! Each worker is a scoped thread with nothing but its two channel
//! ends; the coordinator runs on the calling thread.  With a 1x1 grid
//! there are no workers at all, and the coordinator computes the tiles
//! itself.

use std::time::Instant;
use tracing::{info, warn};

use crate::assemble::ResultBuffer;
use crate::config::Config;
use crate::coordinator::{Coordinator, Render};
use crate::error::Error;
use crate::kernel::{EscapeTime, Kernel};
use crate::tiles::TileGrid;
use crate::transport::star;
use crate::worker::WorkerAgent;

/// Renders the Mandelbrot set as configured.
pub fn run(config: &Config) -> Result<Render, Error> {
    let kernel = EscapeTime::new(
        config.resolution.width,
        config.resolution.height,
        config.iterations,
    )?;
    render(config, &kernel)
}

/// Renders `kernel` over the configured tiles and pool.
pub fn render<K: Kernel>(config: &Config, kernel: &K) -> Result<Render, Error> {
    let grid = config.tile_grid()?;
    let (step_x, step_y) = grid.steps();
    info!(
        grid = %config.grid,
        resolution = %config.resolution,
        iterations = config.iterations,
        k = config.density.factor(),
        "starting dynamic load balancing"
    );
    info!(step_x, step_y, tiles = grid.len(), workers = config.workers(), "tiling");
    if config.unused_processes() > 0 {
        warn!(
            unused = config.unused_processes(),
            "processes beyond the grid sit idle"
        );
    }
    render_tiles(config.workers(), grid, kernel)
}

/// Spawns `workers` workers, schedules every tile of `grid` across
/// them, and joins them again.
pub fn render_tiles<K: Kernel>(workers: usize, grid: TileGrid, kernel: &K) -> Result<Render, Error> {
    if workers == 0 {
        return render_inline(grid, kernel);
    }

    let (transport, links) = star(workers);
    let (step_x, step_y) = grid.steps();
    let outcome = crossbeam::scope(|scope| {
        let handles: Vec<_> = links
            .into_iter()
            .map(|link| scope.spawn(move |_| WorkerAgent::new(link, kernel).run()))
            .collect();

        // Dropping the coordinator's links releases any worker still
        // waiting, so the joins below cannot block.
        let render = Coordinator::new(transport, grid.width(), grid.height())
            .with_scratch_capacity(step_x as usize * step_y as usize)
            .run(grid);

        let mut panicked = false;
        for handle in handles {
            panicked |= handle.join().is_err();
        }
        if panicked {
            Err(Error::WorkerPanicked)
        } else {
            render
        }
    });
    outcome.map_err(|_| Error::WorkerPanicked)?
}

/// The degenerate pool: the coordinator computes each tile in raster
/// order and assembles it itself.
fn render_inline<K: Kernel>(grid: TileGrid, kernel: &K) -> Result<Render, Error> {
    let start = Instant::now();
    let mut image = ResultBuffer::new(grid.width(), grid.height());
    let mut buffer = Vec::new();
    let mut tiles = 0;
    for tile in grid {
        kernel.compute_into(&tile, &mut buffer);
        image.assemble(&tile, &buffer)?;
        tiles += 1;
    }
    let elapsed = start.elapsed();
    info!(tiles, ?elapsed, "render complete without workers");
    Ok(Render {
        image,
        tiles,
        tiles_per_worker: Vec::new(),
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Count;
    use crate::tiles::TileDescriptor;

    struct Panicky;

    impl Kernel for Panicky {
        fn compute_into(&self, tile: &TileDescriptor, out: &mut Vec<Count>) {
            if tile.origin_x > 0 {
                panic!("cannot compute {:?}", tile);
            }
            out.clear();
            out.resize(tile.area(), 1);
        }
    }

    #[test]
    fn inline_render_covers_the_grid() {
        let kernel = EscapeTime::new(5, 3, 50).unwrap();
        let grid = TileGrid::new(5, 3, 1, 1, 0.5).unwrap();
        let render = render_tiles(0, grid, &kernel).unwrap();
        assert_eq!(render.tiles, 9);
        assert!(render.tiles_per_worker.is_empty());
        let whole = kernel.compute(&TileDescriptor::new(0, 0, 5, 3));
        assert_eq!(render.image.pixels(), &whole[..]);
    }

    #[test]
    fn panicking_worker_fails_the_render() {
        let grid = TileGrid::with_steps(8, 2, 2, 2).unwrap();
        match render_tiles(2, grid, &Panicky) {
            Err(Error::WorkerPanicked) => {}
            other => panic!("unexpected {:?}", other.map(|r| r.tiles)),
        }
    }
}
