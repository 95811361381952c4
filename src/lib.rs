#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Fractal flame editor core
//!
//! A fractal flame is the attractor of an iterated function system
//! whose transforms are not merely affine: each one is an affine map,
//! followed by a nonlinear "variation", followed by a second affine
//! map.  Playing the chaos game over such a system (picking a
//! transform at random, applying it to a running point, and recording
//! where the point lands) traces out the flame as a cloud of points,
//! each tinted by a color that drifts toward the colors of the
//! transforms it has recently passed through.
//!
//! This crate holds the model and the two engines that act on it:
//!
//! * [`fit`] turns a drag on screen (a sample point plus a desired
//!   displacement) into a change of one affine stage of one mapping,
//!   by inverting a finite-difference Jacobian;
//! * [`generate`] runs the chaos game and fills a caller-owned buffer
//!   with colored points for a renderer to accumulate.
//!
//! Flames are saved and loaded in the plain-text `FlamEd V1` format
//! (see [`maps`]).

extern crate crossbeam;
#[macro_use]
extern crate failure;
extern crate itertools;
extern crate num;
extern crate rand;
extern crate tracing;

pub mod error;
pub mod fit;
pub mod generate;
pub mod linalg;
pub mod mapping;
pub mod maps;
pub mod variation;

pub use error::FlameError;
pub use fit::EditMode;
pub use generate::{generate, generate_parallel, IfsPoint, IndexSource, PointBuffer, PointCloud};
pub use linalg::{AffineMap, Color3, Matrix2, Vector2};
pub use mapping::{AffineStage, FlameMapping};
pub use maps::FlameMaps;
pub use variation::Variation;
