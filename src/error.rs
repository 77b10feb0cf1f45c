// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The crate-wide error.

use failure::Fail;
use std::io;

use crate::assemble::AssembleError;
use crate::config::ConfigError;
use crate::planes::PlaneError;
use crate::transport::{TransportError, WorkerId};

/// Everything that can stop a render.
#[derive(Debug, Fail)]
pub enum Error {
    /// Bad arguments.
    #[fail(display = "{}", _0)]
    Config(#[cause] ConfigError),
    /// A link failed.
    #[fail(display = "{}", _0)]
    Transport(#[cause] TransportError),
    /// A result did not fit its tile.
    #[fail(display = "{}", _0)]
    Assemble(#[cause] AssembleError),
    /// The image cannot be mapped onto the complex plane.
    #[fail(display = "{}", _0)]
    Plane(#[cause] PlaneError),
    /// A worker replied while it had no tile.
    #[fail(display = "{} sent a result with no tile in flight", _0)]
    Unsolicited(WorkerId),
    /// A worker thread panicked.
    #[fail(display = "a worker panicked")]
    WorkerPanicked,
    /// Writing output failed.
    #[fail(display = "{}", _0)]
    Io(#[cause] io::Error),
}

impl Error {
    /// The process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(e) => e.exit_code(),
            _ => 1,
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Error::Transport(e)
    }
}

impl From<AssembleError> for Error {
    fn from(e: AssembleError) -> Self {
        Error::Assemble(e)
    }
}

impl From<PlaneError> for Error {
    fn from(e: PlaneError) -> Self {
        Error::Plane(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
