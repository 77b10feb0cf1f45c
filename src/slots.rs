// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The coordinator's bookkeeping: one slot per worker, idle or holding
//! the tile that worker is computing.  Slots are created with the pool
//! and only ever toggled.

use crate::tiles::TileDescriptor;
use crate::transport::WorkerId;

/// What a worker is doing, as far as the coordinator knows.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Slot {
    /// Waiting for a tile.
    Idle,
    /// Computing this tile.
    Busy(TileDescriptor),
}

/// Per-worker slots, keyed by `WorkerId`.  Scans are linear; the pool
/// is small.
#[derive(Debug, Clone)]
pub struct WorkerSlotTable {
    slots: Vec<Slot>,
}

impl WorkerSlotTable {
    /// A table of `workers` idle slots.
    pub fn new(workers: usize) -> Self {
        WorkerSlotTable {
            slots: vec![Slot::Idle; workers],
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True for a pool with no workers.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The lowest-numbered idle worker.
    pub fn find_idle(&self) -> Option<WorkerId> {
        self.slots
            .iter()
            .position(|slot| *slot == Slot::Idle)
            .map(WorkerId)
    }

    /// Records that `worker` was sent `tile`.  Returns false, and
    /// changes nothing, if the worker is unknown or already busy.
    pub fn mark_busy(&mut self, worker: WorkerId, tile: TileDescriptor) -> bool {
        match self.slots.get_mut(worker.0) {
            Some(slot) if *slot == Slot::Idle => {
                *slot = Slot::Busy(tile);
                true
            }
            _ => false,
        }
    }

    /// Frees `worker` and hands back the tile it was computing.  None
    /// if the worker is unknown or was not busy.
    pub fn mark_idle(&mut self, worker: WorkerId) -> Option<TileDescriptor> {
        match self.slots.get_mut(worker.0) {
            Some(slot) => match *slot {
                Slot::Busy(tile) => {
                    *slot = Slot::Idle;
                    Some(tile)
                }
                Slot::Idle => None,
            },
            None => None,
        }
    }

    /// The tile `worker` is computing, if any.
    pub fn in_flight(&self, worker: WorkerId) -> Option<&TileDescriptor> {
        match self.slots.get(worker.0) {
            Some(Slot::Busy(tile)) => Some(tile),
            _ => None,
        }
    }

    /// True while any tile is outstanding.
    pub fn any_busy(&self) -> bool {
        self.slots.iter().any(|slot| *slot != Slot::Idle)
    }

    /// Number of outstanding tiles.
    pub fn busy(&self) -> usize {
        self.slots.iter().filter(|slot| **slot != Slot::Idle).count()
    }

    /// Number of workers waiting for a tile.
    pub fn idle(&self) -> usize {
        self.len() - self.busy()
    }
}
