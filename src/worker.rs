// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The loop every worker runs: take a tile, compute it, send it back,
//! until told to stop.

use tracing::{debug, trace};

use crate::kernel::{Count, Kernel};
use crate::transport::{TransportError, WorkerLink};

/// A worker bound to its link and a kernel.
pub struct WorkerAgent<'k, K: Kernel> {
    link: WorkerLink,
    kernel: &'k K,
}

impl<'k, K: Kernel> WorkerAgent<'k, K> {
    /// Pairs a link with the kernel it will run.
    pub fn new(link: WorkerLink, kernel: &'k K) -> Self {
        WorkerAgent { link, kernel }
    }

    /// Serves tiles until a terminate descriptor arrives.  Returns the
    /// number of tiles computed.  Never has more than one tile in
    /// flight.
    pub fn run(self) -> Result<usize, TransportError> {
        let id = self.link.id();
        debug!(%id, "worker online");
        let mut buffer: Vec<Count> = Vec::new();
        let mut computed = 0;
        loop {
            let tile = self.link.recv_descriptor()?;
            if tile.terminate {
                break;
            }
            trace!(%id, ?tile, "computing");
            self.kernel.compute_into(&tile, &mut buffer);
            self.link.send_result(&buffer)?;
            computed += 1;
        }
        debug!(%id, computed, "worker received order to exit");
        Ok(computed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::TileDescriptor;
    use crate::transport::{star, Transport, WorkerId};
    use crossbeam::thread;

    struct Area;

    impl Kernel for Area {
        fn compute_into(&self, tile: &TileDescriptor, out: &mut Vec<Count>) {
            out.clear();
            out.resize(tile.area(), tile.area() as Count);
        }
    }

    #[test]
    fn worker_answers_each_tile_and_stops() {
        let (mut transport, mut links) = star(1);
        let link = links.remove(0);
        thread::scope(|s| {
            let handle = s.spawn(|_| WorkerAgent::new(link, &Area).run());

            let mut scratch = Vec::new();
            for &(w, h) in &[(2, 3), (1, 1), (4, 2)] {
                transport
                    .send(WorkerId(0), &TileDescriptor::new(0, 0, w, h))
                    .unwrap();
                let status = transport.probe().unwrap();
                assert_eq!(status.source, WorkerId(0));
                assert_eq!(status.count, (w * h) as usize);
                transport.receive(&status, &mut scratch).unwrap();
                assert!(scratch.iter().all(|&c| c == (w * h) as Count));
            }
            transport
                .send(WorkerId(0), &TileDescriptor::terminate())
                .unwrap();
            assert_eq!(handle.join().unwrap(), Ok(3));
        })
        .unwrap();
    }

    #[test]
    fn worker_exits_when_coordinator_vanishes() {
        let (transport, mut links) = star(1);
        drop(transport);
        let result = WorkerAgent::new(links.remove(0), &Area).run();
        assert_eq!(result, Err(TransportError::Disconnected(WorkerId(0))));
    }
}
