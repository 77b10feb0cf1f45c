// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Point-to-point links between the coordinator and its workers.
//!
//! The topology is a star: every worker has its own descriptor channel
//! in and result channel out, and workers never talk to each other.
//! Receiving on the coordinator side is split in two, the way a
//! message-passing probe works: `probe` blocks until *some* worker has
//! a result and says who and how long, then `receive` decodes that
//! result into a caller-owned scratch buffer.

use crossbeam::channel::{unbounded, Receiver, Select, Sender, TryRecvError};
use failure::Fail;
use std::fmt;

use crate::kernel::Count;
use crate::tiles::TileDescriptor;
use crate::wire::{self, DescriptorFrame, WireError};

/// Identity of a worker, handed out densely from zero when the pool
/// is built.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerId(pub usize);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "worker {}", self.0)
    }
}

/// What a probe learned: which worker has a result waiting and how
/// many counts it holds.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Status {
    /// The worker that replied.
    pub source: WorkerId,
    /// Number of counts in the reply.
    pub count: usize,
}

/// Link failures.
#[derive(Debug, Fail, PartialEq)]
pub enum TransportError {
    /// The other end of a worker's link has gone away.
    #[fail(display = "{} hung up", _0)]
    Disconnected(WorkerId),
    /// A frame could not be decoded.
    #[fail(display = "{}", _0)]
    Frame(#[cause] WireError),
    /// `receive` was called for a message no probe reported.
    #[fail(display = "no probed message from {}", _0)]
    NotProbed(WorkerId),
    /// A probe on a pool with no workers would wait forever.
    #[fail(display = "no workers to wait on")]
    NoWorkers,
}

impl From<WireError> for TransportError {
    fn from(e: WireError) -> Self {
        TransportError::Frame(e)
    }
}

/// The coordinator's view of the links.
pub trait Transport {
    /// Size of the pool.
    fn workers(&self) -> usize;

    /// Sends a descriptor to one worker.
    fn send(&mut self, worker: WorkerId, tile: &TileDescriptor) -> Result<(), TransportError>;

    /// Blocks until any worker has a result ready.  Probing again
    /// before `receive` reports the same message.
    fn probe(&mut self) -> Result<Status, TransportError>;

    /// Decodes the probed message into `scratch`, resized to exactly
    /// `status.count` values.
    fn receive(&mut self, status: &Status, scratch: &mut Vec<Count>) -> Result<(), TransportError>;
}

/// Channel-backed coordinator end of the star.
pub struct ChannelTransport {
    descriptors: Vec<Sender<DescriptorFrame>>,
    results: Vec<Receiver<Vec<u8>>>,
    pending: Option<(WorkerId, Vec<u8>)>,
}

/// One worker's end of the star.
pub struct WorkerLink {
    id: WorkerId,
    descriptors: Receiver<DescriptorFrame>,
    results: Sender<Vec<u8>>,
}

/// Builds a star of `workers` links.  The links are numbered in the
/// order they are returned.
pub fn star(workers: usize) -> (ChannelTransport, Vec<WorkerLink>) {
    let mut transport = ChannelTransport {
        descriptors: Vec::with_capacity(workers),
        results: Vec::with_capacity(workers),
        pending: None,
    };
    let links = (0..workers)
        .map(|i| {
            let (descriptor_tx, descriptor_rx) = unbounded();
            let (result_tx, result_rx) = unbounded();
            transport.descriptors.push(descriptor_tx);
            transport.results.push(result_rx);
            WorkerLink {
                id: WorkerId(i),
                descriptors: descriptor_rx,
                results: result_tx,
            }
        })
        .collect();
    (transport, links)
}

impl Transport for ChannelTransport {
    fn workers(&self) -> usize {
        self.descriptors.len()
    }

    fn send(&mut self, worker: WorkerId, tile: &TileDescriptor) -> Result<(), TransportError> {
        let link = self
            .descriptors
            .get(worker.0)
            .ok_or(TransportError::Disconnected(worker))?;
        link.send(wire::encode_descriptor(tile))
            .map_err(|_| TransportError::Disconnected(worker))
    }

    fn probe(&mut self) -> Result<Status, TransportError> {
        if let Some((source, frame)) = &self.pending {
            return Ok(Status {
                source: *source,
                count: wire::count_len(frame)?,
            });
        }
        if self.results.is_empty() {
            return Err(TransportError::NoWorkers);
        }

        let mut select = Select::new();
        for receiver in &self.results {
            select.recv(receiver);
        }
        loop {
            let index = select.ready();
            let source = WorkerId(index);
            match self.results[index].try_recv() {
                Ok(frame) => {
                    let count = wire::count_len(&frame)?;
                    self.pending = Some((source, frame));
                    return Ok(Status { source, count });
                }
                // ready() may wake spuriously
                Err(TryRecvError::Empty) => continue,
                Err(TryRecvError::Disconnected) => {
                    return Err(TransportError::Disconnected(source))
                }
            }
        }
    }

    fn receive(&mut self, status: &Status, scratch: &mut Vec<Count>) -> Result<(), TransportError> {
        match self.pending.take() {
            Some((source, frame)) if source == status.source => {
                wire::decode_counts(&frame, scratch)?;
                Ok(())
            }
            other => {
                self.pending = other;
                Err(TransportError::NotProbed(status.source))
            }
        }
    }
}

impl WorkerLink {
    /// This link's worker.
    pub fn id(&self) -> WorkerId {
        self.id
    }

    /// Blocks for the next descriptor.
    pub fn recv_descriptor(&self) -> Result<TileDescriptor, TransportError> {
        self.descriptors
            .recv()
            .map(|frame| wire::decode_descriptor(&frame))
            .map_err(|_| TransportError::Disconnected(self.id))
    }

    /// Sends a tile's counts back.
    pub fn send_result(&self, counts: &[Count]) -> Result<(), TransportError> {
        self.results
            .send(wire::encode_counts(counts))
            .map_err(|_| TransportError::Disconnected(self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_reaches_its_worker() {
        let (mut transport, links) = star(3);
        let tile = TileDescriptor::new(2, 0, 2, 2);
        transport.send(WorkerId(1), &tile).unwrap();
        assert_eq!(links[1].recv_descriptor().unwrap(), tile);
        assert_eq!(links[1].id(), WorkerId(1));
    }

    #[test]
    fn probe_reports_source_and_length() {
        let (mut transport, links) = star(3);
        links[2].send_result(&[4, 5, 6, 7, 8, 9]).unwrap();
        let status = transport.probe().unwrap();
        assert_eq!(
            status,
            Status {
                source: WorkerId(2),
                count: 6
            }
        );
        // A second probe sees the same message.
        assert_eq!(transport.probe().unwrap(), status);

        let mut scratch = Vec::with_capacity(16);
        transport.receive(&status, &mut scratch).unwrap();
        assert_eq!(scratch, vec![4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn receive_without_probe_fails() {
        let (mut transport, _links) = star(1);
        let status = Status {
            source: WorkerId(0),
            count: 1,
        };
        let mut scratch = Vec::new();
        assert_eq!(
            transport.receive(&status, &mut scratch),
            Err(TransportError::NotProbed(WorkerId(0)))
        );
    }

    #[test]
    fn dropped_worker_is_reported() {
        let (mut transport, mut links) = star(2);
        links.pop();
        assert_eq!(
            transport.probe(),
            Err(TransportError::Disconnected(WorkerId(1)))
        );
        assert_eq!(
            transport.send(WorkerId(1), &TileDescriptor::terminate()),
            Err(TransportError::Disconnected(WorkerId(1)))
        );
    }

    #[test]
    fn dropped_coordinator_releases_workers() {
        let (transport, links) = star(1);
        drop(transport);
        assert_eq!(
            links[0].recv_descriptor(),
            Err(TransportError::Disconnected(WorkerId(0)))
        );
    }

    #[test]
    fn empty_star_refuses_to_wait() {
        let (mut transport, links) = star(0);
        assert!(links.is_empty());
        assert_eq!(transport.probe(), Err(TransportError::NoWorkers));
    }
}
