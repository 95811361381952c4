// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The nonlinear functions that sit between a mapping's pre- and
//! post-affine stages.  Each one is a pure function of its input
//! point; none of them carry state or parameters of their own.
//!
//! Angles follow the flam3 convention, `theta = atan2(x, y)`.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::error::FlameError;
use crate::linalg::Vector2;

// Keeps the radial variations finite at the origin.
const EPS: f64 = 1e-10;

/// A named nonlinear 2D→2D function.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Variation {
    /// The identity.
    Linear,
    /// `(sin x, sin y)`
    Sinusoidal,
    /// Inversion in the unit circle.
    Spherical,
    /// Rotation by an angle of `r²`.
    Swirl,
    /// Doubles the polar angle.
    Horseshoe,
    /// Unrolls polar coordinates onto a strip.
    Polar,
    /// Handkerchief.
    Handkerchief,
    /// Heart.
    Heart,
    /// Disc.
    Disc,
    /// Spiral.
    Spiral,
    /// Hyperbolic.
    Hyperbolic,
    /// Diamond.
    Diamond,
}

impl Variation {
    /// Every variation in the catalog, in a stable order.
    pub const ALL: [Variation; 12] = [
        Variation::Linear,
        Variation::Sinusoidal,
        Variation::Spherical,
        Variation::Swirl,
        Variation::Horseshoe,
        Variation::Polar,
        Variation::Handkerchief,
        Variation::Heart,
        Variation::Disc,
        Variation::Spiral,
        Variation::Hyperbolic,
        Variation::Diamond,
    ];

    /// The token used for this variation in flame files.
    pub fn name(self) -> &'static str {
        match self {
            Variation::Linear => "linear",
            Variation::Sinusoidal => "sinusoidal",
            Variation::Spherical => "spherical",
            Variation::Swirl => "swirl",
            Variation::Horseshoe => "horseshoe",
            Variation::Polar => "polar",
            Variation::Handkerchief => "handkerchief",
            Variation::Heart => "heart",
            Variation::Disc => "disc",
            Variation::Spiral => "spiral",
            Variation::Hyperbolic => "hyperbolic",
            Variation::Diamond => "diamond",
        }
    }

    /// Apply the variation to a point.
    pub fn apply(self, p: Vector2) -> Vector2 {
        let (x, y) = (p.x, p.y);
        let r2 = x * x + y * y;
        let r = r2.sqrt();
        let theta = x.atan2(y);
        match self {
            Variation::Linear => p,
            Variation::Sinusoidal => Vector2::new(x.sin(), y.sin()),
            Variation::Spherical => p / (r2 + EPS),
            Variation::Swirl => {
                let (s, c) = r2.sin_cos();
                Vector2::new(x * s - y * c, x * c + y * s)
            }
            Variation::Horseshoe => {
                let r = r + EPS;
                Vector2::new((x - y) * (x + y) / r, 2.0 * x * y / r)
            }
            Variation::Polar => Vector2::new(theta / PI, r - 1.0),
            Variation::Handkerchief => {
                Vector2::new(r * (theta + r).sin(), r * (theta - r).cos())
            }
            Variation::Heart => {
                let (s, c) = (theta * r).sin_cos();
                Vector2::new(r * s, -r * c)
            }
            Variation::Disc => {
                let (s, c) = (PI * r).sin_cos();
                Vector2::new(s, c) * (theta / PI)
            }
            Variation::Spiral => {
                let (st, ct) = theta.sin_cos();
                let (sr, cr) = r.sin_cos();
                Vector2::new(ct + sr, st - cr) / (r + EPS)
            }
            Variation::Hyperbolic => {
                let (st, ct) = theta.sin_cos();
                Vector2::new(st / (r + EPS), r * ct)
            }
            Variation::Diamond => {
                let (st, ct) = theta.sin_cos();
                let (sr, cr) = r.sin_cos();
                Vector2::new(st * cr, ct * sr)
            }
        }
    }
}

impl Default for Variation {
    fn default() -> Self {
        Variation::Linear
    }
}

impl fmt::Display for Variation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variation {
    type Err = FlameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variation::ALL
            .iter()
            .cloned()
            .find(|v| v.name() == s)
            .ok_or_else(|| FlameError::UnknownVariation(s.to_string()))
    }
}
