// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Everything that can go wrong in the flame core.

use std::io;

/// Errors raised while loading, editing or iterating a flame.
#[derive(Debug, Fail)]
pub enum FlameError {
    /// The stream did not start with `FlamEd V1`.
    #[fail(display = "not a FlamEd V1 file (found header {:?})", _0)]
    BadHeader(String),

    /// The map list was not closed by `----`.
    #[fail(display = "expected map terminator \"----\", found {:?}", _0)]
    BadTerminator(String),

    /// The stream ended in the middle of a record.
    #[fail(display = "unexpected end of input while reading {}", _0)]
    UnexpectedEof(&'static str),

    /// A numeric field could not be parsed.
    #[fail(display = "could not parse {:?} as a number for {}", token, field)]
    BadNumber {
        /// The offending token.
        token: String,
        /// What was being read.
        field: &'static str,
    },

    /// A variation name is not in the catalog.
    #[fail(display = "unknown variation {:?}", _0)]
    UnknownVariation(String),

    /// The Jacobian of a parameter fit could not be inverted, so no
    /// update was applied.
    #[fail(display = "parameter Jacobian is not invertible (determinant {})", _0)]
    NonInvertible(f64),

    /// Point generation was asked to run over an empty map list.
    #[fail(display = "flame has no maps to iterate")]
    NoMaps,

    /// An index outside the map list.
    #[fail(display = "map index {} out of range for {} maps", index, len)]
    NoSuchMap {
        /// The requested index.
        index: usize,
        /// The number of maps.
        len: usize,
    },

    /// A generator worker thread panicked.
    #[fail(display = "point generator worker failed")]
    WorkerFailed,

    /// Reading or writing the underlying stream failed.
    #[fail(display = "I/O error: {}", _0)]
    Io(#[cause] io::Error),
}

impl From<io::Error> for FlameError {
    fn from(e: io::Error) -> Self {
        FlameError::Io(e)
    }
}
