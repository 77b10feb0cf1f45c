// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The dynamic load-balancing scheduler.
//!
//! There are more tiles than workers.  The coordinator walks the tiles
//! in raster order and hands each one to the lowest-numbered idle
//! worker.  When nobody is idle it waits for whichever worker finishes
//! first, stitches that result into the image, and gives the freed
//! worker the next tile.  Fast workers, and workers that happen to
//! draw cheap tiles, therefore end up doing more of the image.  Once
//! the tiles run out it drains the outstanding results and sends every
//! worker a terminate descriptor.
//!
//! The wait has no timeout.  A worker that stays alive but never
//! answers stalls the render; one whose link drops is reported as a
//! `TransportError::Disconnected`.

use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::assemble::ResultBuffer;
use crate::error::Error;
use crate::kernel::Count;
use crate::slots::WorkerSlotTable;
use crate::tiles::TileDescriptor;
use crate::transport::{Transport, WorkerId};

/// The outcome of a finished render.
#[derive(Debug, Clone)]
pub struct Render {
    /// The assembled image.
    pub image: ResultBuffer,
    /// Tiles dispatched, not counting terminate descriptors.
    pub tiles: usize,
    /// Tiles each worker computed, indexed by `WorkerId`.
    pub tiles_per_worker: Vec<usize>,
    /// Wall-clock time from the first dispatch to the last terminate.
    pub elapsed: Duration,
}

/// Owns the slot table, the image and the scratch buffer, and drives
/// the workers through a `Transport`.
pub struct Coordinator<T: Transport> {
    transport: T,
    slots: WorkerSlotTable,
    image: ResultBuffer,
    scratch: Vec<Count>,
    tiles_per_worker: Vec<usize>,
}

impl<T: Transport> Coordinator<T> {
    /// A coordinator for a `width` x `height` image over every worker
    /// the transport reaches.
    pub fn new(transport: T, width: u32, height: u32) -> Self {
        let workers = transport.workers();
        Coordinator {
            transport,
            slots: WorkerSlotTable::new(workers),
            image: ResultBuffer::new(width, height),
            scratch: Vec::new(),
            tiles_per_worker: vec![0; workers],
        }
    }

    /// Reserves room in the scratch buffer for the largest tile.
    pub fn with_scratch_capacity(mut self, area: usize) -> Self {
        self.scratch.reserve(area);
        self
    }

    /// Schedules every tile, collects every result, then shuts the
    /// pool down.
    pub fn run<I>(mut self, tiles: I) -> Result<Render, Error>
    where
        I: IntoIterator<Item = TileDescriptor>,
    {
        let start = Instant::now();
        let mut dispatched = 0;

        for tile in tiles {
            let worker = loop {
                if let Some(worker) = self.slots.find_idle() {
                    break worker;
                }
                self.collect()?;
            };
            self.dispatch(worker, tile)?;
            dispatched += 1;
        }

        debug!(outstanding = self.slots.busy(), "tiles exhausted, draining");
        while self.slots.any_busy() {
            self.collect()?;
        }

        self.terminate()?;
        let elapsed = start.elapsed();
        info!(tiles = dispatched, ?elapsed, "render complete");

        Ok(Render {
            image: self.image,
            tiles: dispatched,
            tiles_per_worker: self.tiles_per_worker,
            elapsed,
        })
    }

    fn dispatch(&mut self, worker: WorkerId, tile: TileDescriptor) -> Result<(), Error> {
        debug!(%worker, ?tile, "dispatch");
        self.transport.send(worker, &tile)?;
        self.slots.mark_busy(worker, tile);
        self.tiles_per_worker[worker.0] += 1;
        Ok(())
    }

    /// Waits for the first worker to finish, places its result, and
    /// frees its slot.
    fn collect(&mut self) -> Result<WorkerId, Error> {
        let status = self.transport.probe()?;
        let tile = *self
            .slots
            .in_flight(status.source)
            .ok_or(Error::Unsolicited(status.source))?;
        self.transport.receive(&status, &mut self.scratch)?;
        self.image.assemble(&tile, &self.scratch)?;
        self.slots.mark_idle(status.source);
        debug!(worker = %status.source, count = status.count, "collected");
        Ok(status.source)
    }

    fn terminate(&mut self) -> Result<(), Error> {
        debug!(workers = self.slots.len(), "sending terminate");
        let stop = TileDescriptor::terminate();
        for worker in 0..self.slots.len() {
            self.transport.send(WorkerId(worker), &stop)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::Kernel;
    use crate::tiles::TileGrid;
    use crate::transport::{Status, TransportError};
    use std::collections::VecDeque;

    /// Writes each pixel's own row-major index.
    struct Index {
        width: u32,
    }

    impl Kernel for Index {
        fn compute_into(&self, tile: &TileDescriptor, out: &mut Vec<Count>) {
            out.clear();
            for y in tile.origin_y..tile.origin_y + tile.size_y {
                for x in tile.origin_x..tile.origin_x + tile.size_x {
                    out.push((y * self.width + x) as Count);
                }
            }
        }
    }

    #[derive(Debug, PartialEq)]
    enum Event {
        Send(usize, TileDescriptor),
        Collect(usize),
    }

    /// Computes every tile the moment it is sent, and replies either
    /// oldest-first or newest-first.
    struct Loopback {
        kernel: Index,
        workers: usize,
        newest_first: bool,
        queue: VecDeque<(WorkerId, Vec<Count>)>,
        probed: Option<(WorkerId, Vec<Count>)>,
        events: Vec<Event>,
    }

    impl Loopback {
        fn new(width: u32, workers: usize) -> Self {
            Loopback {
                kernel: Index { width },
                workers,
                newest_first: false,
                queue: VecDeque::new(),
                probed: None,
                events: Vec::new(),
            }
        }
    }

    impl<'a> Transport for &'a mut Loopback {
        fn workers(&self) -> usize {
            self.workers
        }

        fn send(&mut self, worker: WorkerId, tile: &TileDescriptor) -> Result<(), TransportError> {
            self.events.push(Event::Send(worker.0, *tile));
            if !tile.terminate {
                let counts = self.kernel.compute(tile);
                self.queue.push_back((worker, counts));
            }
            Ok(())
        }

        fn probe(&mut self) -> Result<Status, TransportError> {
            if self.probed.is_none() {
                let next = if self.newest_first {
                    self.queue.pop_back()
                } else {
                    self.queue.pop_front()
                };
                let (source, counts) = next.ok_or(TransportError::NoWorkers)?;
                self.events.push(Event::Collect(source.0));
                self.probed = Some((source, counts));
            }
            match &self.probed {
                Some((source, counts)) => Ok(Status {
                    source: *source,
                    count: counts.len(),
                }),
                None => Err(TransportError::NoWorkers),
            }
        }

        fn receive(
            &mut self,
            status: &Status,
            scratch: &mut Vec<Count>,
        ) -> Result<(), TransportError> {
            let (_, counts) = self
                .probed
                .take()
                .ok_or(TransportError::NotProbed(status.source))?;
            scratch.clear();
            scratch.extend_from_slice(&counts);
            Ok(())
        }
    }

    fn quadrant(x: u32, y: u32) -> TileDescriptor {
        TileDescriptor::new(x, y, 2, 2)
    }

    #[test]
    fn fourth_tile_waits_for_the_first_completion() {
        let mut loopback = Loopback::new(4, 3);
        let grid = TileGrid::new(4, 4, 2, 2, 1.0).unwrap();
        let render = Coordinator::new(&mut loopback, 4, 4).run(grid).unwrap();

        let stop = TileDescriptor::terminate();
        assert_eq!(
            loopback.events,
            vec![
                Event::Send(0, quadrant(0, 0)),
                Event::Send(1, quadrant(2, 0)),
                Event::Send(2, quadrant(0, 2)),
                Event::Collect(0),
                Event::Send(0, quadrant(2, 2)),
                Event::Collect(1),
                Event::Collect(2),
                Event::Collect(0),
                Event::Send(0, stop),
                Event::Send(1, stop),
                Event::Send(2, stop),
            ]
        );
        assert_eq!(render.tiles, 4);
        assert_eq!(render.tiles_per_worker, vec![2, 1, 1]);
        let expected: Vec<Count> = (0..16).collect();
        assert_eq!(render.image.pixels(), &expected[..]);
    }

    #[test]
    fn first_finisher_gets_the_next_tile() {
        let mut loopback = Loopback::new(6, 3);
        loopback.newest_first = true;
        let grid = TileGrid::with_steps(6, 1, 1, 1).unwrap();
        let render = Coordinator::new(&mut loopback, 6, 1).run(grid).unwrap();

        // Worker 2 keeps finishing first, so it takes every later tile.
        assert_eq!(render.tiles_per_worker, vec![1, 1, 4]);
        assert_eq!(render.image.pixels(), &[0, 1, 2, 3, 4, 5][..]);
    }

    #[test]
    fn every_worker_is_terminated_once_after_the_last_collection() {
        let mut loopback = Loopback::new(17, 4);
        let grid = TileGrid::new(17, 13, 2, 3, 0.5).unwrap();
        let tiles = grid.len();
        let render = Coordinator::new(&mut loopback, 17, 13).run(grid).unwrap();
        assert_eq!(render.tiles, tiles);
        assert_eq!(render.tiles_per_worker.iter().sum::<usize>(), tiles);

        let last_collect = loopback
            .events
            .iter()
            .rposition(|e| matches!(e, Event::Collect(_)))
            .unwrap();
        let stops: Vec<usize> = loopback
            .events
            .iter()
            .enumerate()
            .filter_map(|(i, e)| match e {
                Event::Send(w, t) if t.terminate => {
                    assert!(i > last_collect);
                    Some(*w)
                }
                _ => None,
            })
            .collect();
        assert_eq!(stops, vec![0, 1, 2, 3]);

        let collects = loopback
            .events
            .iter()
            .filter(|e| matches!(e, Event::Collect(_)))
            .count();
        assert_eq!(collects, tiles);
    }

    #[test]
    fn slots_stay_conserved_through_a_run() {
        let mut loopback = Loopback::new(9, 2);
        let grid = TileGrid::with_steps(9, 9, 2, 4).unwrap();
        let mut coordinator = Coordinator::new(&mut loopback, 9, 9);
        for tile in grid.tiles() {
            let worker = loop {
                assert_eq!(coordinator.slots.idle() + coordinator.slots.busy(), 2);
                if let Some(worker) = coordinator.slots.find_idle() {
                    break worker;
                }
                coordinator.collect().unwrap();
            };
            coordinator.dispatch(worker, tile).unwrap();
        }
        while coordinator.slots.any_busy() {
            coordinator.collect().unwrap();
            assert_eq!(coordinator.slots.idle() + coordinator.slots.busy(), 2);
        }
        let expected: Vec<Count> = (0..81).collect();
        assert_eq!(coordinator.image.pixels(), &expected[..]);
    }

    #[test]
    fn result_from_an_idle_worker_is_an_error() {
        let mut loopback = Loopback::new(1, 2);
        loopback.queue.push_back((WorkerId(1), vec![0]));
        let grid = TileGrid::with_steps(1, 1, 1, 1).unwrap();
        // The only tile goes to worker 0; the drain then meets the
        // stray reply from worker 1 first.
        match Coordinator::new(&mut loopback, 1, 1).run(grid) {
            Err(Error::Unsolicited(WorkerId(1))) => {}
            other => panic!("unexpected {:?}", other.map(|r| r.tiles)),
        }
    }

    #[test]
    fn empty_pool_cannot_schedule() {
        let mut loopback = Loopback::new(4, 0);
        let grid = TileGrid::new(4, 4, 1, 1, 1.0).unwrap();
        match Coordinator::new(&mut loopback, 4, 4).run(grid) {
            Err(Error::Transport(TransportError::NoWorkers)) => {}
            other => panic!("unexpected {:?}", other.map(|r| r.tiles)),
        }
    }
}
