// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Frame layouts for the two messages of the protocol.
//!
//! A descriptor is five little-endian `u32`s: origin x, origin y,
//! size x, size y, and the terminate flag.  A result is a bare run of
//! little-endian counts with no length prefix; the receiver learns the
//! length from the frame itself.

use failure::Fail;
use std::mem::size_of;

use crate::kernel::Count;
use crate::tiles::TileDescriptor;

/// Size of an encoded descriptor.
pub const DESCRIPTOR_LEN: usize = 5 * size_of::<u32>();

/// Width of one encoded count.
pub const COUNT_LEN: usize = size_of::<Count>();

/// An encoded descriptor.
pub type DescriptorFrame = [u8; DESCRIPTOR_LEN];

/// Malformed frames.
#[derive(Debug, Fail, PartialEq)]
pub enum WireError {
    /// A result frame that does not hold a whole number of counts.
    #[fail(display = "result frame of {} bytes does not hold whole counts", _0)]
    Ragged(usize),
}

/// Packs a descriptor.
pub fn encode_descriptor(tile: &TileDescriptor) -> DescriptorFrame {
    let fields = [
        tile.origin_x,
        tile.origin_y,
        tile.size_x,
        tile.size_y,
        tile.terminate as u32,
    ];
    let mut frame = [0u8; DESCRIPTOR_LEN];
    for (chunk, field) in frame.chunks_mut(size_of::<u32>()).zip(fields.iter()) {
        chunk.copy_from_slice(&field.to_le_bytes());
    }
    frame
}

/// Unpacks a descriptor.  Any nonzero flag means terminate.
pub fn decode_descriptor(frame: &DescriptorFrame) -> TileDescriptor {
    let mut fields = [0u32; 5];
    for (field, chunk) in fields.iter_mut().zip(frame.chunks(size_of::<u32>())) {
        *field = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    TileDescriptor {
        origin_x: fields[0],
        origin_y: fields[1],
        size_x: fields[2],
        size_y: fields[3],
        terminate: fields[4] != 0,
    }
}

/// Packs a tile's counts.
pub fn encode_counts(counts: &[Count]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(counts.len() * COUNT_LEN);
    for count in counts {
        frame.extend_from_slice(&count.to_le_bytes());
    }
    frame
}

/// Number of counts carried by a result frame.
pub fn count_len(frame: &[u8]) -> Result<usize, WireError> {
    if frame.len() % COUNT_LEN != 0 {
        return Err(WireError::Ragged(frame.len()));
    }
    Ok(frame.len() / COUNT_LEN)
}

/// Unpacks a result frame into `scratch`, resizing it to exactly the
/// number of counts in the frame.
pub fn decode_counts(frame: &[u8], scratch: &mut Vec<Count>) -> Result<(), WireError> {
    let len = count_len(frame)?;
    scratch.resize(len, 0);
    for (slot, chunk) in scratch.iter_mut().zip(frame.chunks_exact(COUNT_LEN)) {
        *slot = Count::from_le_bytes([chunk[0], chunk[1]]);
    }
    Ok(())
}
