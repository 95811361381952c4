// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Direct manipulation of a mapping's affine stages.
//!
//! The user grabs a point `p` of the cloud and drags it by `df`.  We
//! want the smallest change to two parameters of one affine stage
//! (pre or post) that moves `mapping.map(p)` by `df`.  The variation
//! in between is opaque, so the sensitivity of the output to each
//! parameter is measured numerically: nudge the parameter by a fixed
//! step on a scratch copy of the mapping, re-evaluate the whole
//! composed map, and take the forward difference.  The two difference
//! vectors are the columns of a 2x2 Jacobian, and since there are
//! exactly two unknowns the update is simply `J⁻¹·df`.
//!
//! Three parameter families are supported:
//!
//! * **translate**: the two components of the translation;
//! * **scale**: independent scale factors on the two matrix columns;
//! * **rotate**: a rotation angle plus a uniform scale.
//!
//! If the Jacobian is singular or badly conditioned (or the solved
//! update is not finite) the mapping is left untouched and
//! [`FlameError::NonInvertible`] is returned.

use tracing::{debug, warn};

use crate::error::FlameError;
use crate::linalg::{AffineMap, Matrix2, Vector2};
use crate::mapping::{AffineStage, FlameMapping};

/// Absolute step used for every finite-difference probe.
pub const PROBE_DELTA: f64 = 0.001;

/// Translation updates longer than this are shortened to this length.
pub const MAX_TRANSLATION_STEP: f64 = 2.0;

/// A Jacobian whose determinant is smaller than this fraction of the
/// product of its column lengths is treated as singular.
pub const MIN_CONDITION: f64 = 1e-6;

/// The three ways a drag can edit an affine stage.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EditMode {
    /// Move the translation.
    Translate,
    /// Rotate and uniformly scale the matrix.
    Rotate,
    /// Scale the two matrix columns independently.
    Scale,
}

impl FlameMapping {
    /// Apply a drag of `df` at sample point `p` to the stage selected
    /// by `stage`, using the parameter family named by `mode`.
    pub fn edit(
        &mut self,
        mode: EditMode,
        p: Vector2,
        df: Vector2,
        stage: AffineStage,
    ) -> Result<(), FlameError> {
        match mode {
            EditMode::Translate => self.translate(p, df, stage),
            EditMode::Rotate => self.rotate(p, df, stage),
            EditMode::Scale => self.scale(p, df, stage),
        }
    }

    /// Shift the translation of one stage so that the output at `p`
    /// moves by `df`.  The shift is capped at
    /// [`MAX_TRANSLATION_STEP`].
    pub fn translate(&mut self, p: Vector2, df: Vector2, stage: AffineStage) -> Result<(), FlameError> {
        let jacobian = self.jacobian(
            p,
            stage,
            |aff| aff.c.x += PROBE_DELTA,
            |aff| aff.c.y += PROBE_DELTA,
        );
        let mut dc = solve(jacobian, df)?;
        let length = dc.length();
        if length > MAX_TRANSLATION_STEP {
            dc *= MAX_TRANSLATION_STEP / length;
        }
        debug!(?stage, dx = dc.x, dy = dc.y, "translate");
        self.affine_mut(stage).c += dc;
        Ok(())
    }

    /// Rescale the two matrix columns of one stage so that the output
    /// at `p` moves by `df`.  The factors are applied multiplicatively:
    /// column `(a, c)` by `1 + dx` and column `(b, d)` by `1 + dy`.
    pub fn scale(&mut self, p: Vector2, df: Vector2, stage: AffineStage) -> Result<(), FlameError> {
        let factor = 1.0 + PROBE_DELTA;
        let jacobian = self.jacobian(
            p,
            stage,
            |aff| aff.m.scale_first_column(factor),
            |aff| aff.m.scale_second_column(factor),
        );
        let ds = solve(jacobian, df)?;
        debug!(?stage, dx = ds.x, dy = ds.y, "scale");
        let m = &mut self.affine_mut(stage).m;
        m.scale_first_column(1.0 + ds.x);
        m.scale_second_column(1.0 + ds.y);
        Ok(())
    }

    /// Rotate and uniformly rescale the matrix of one stage so that the
    /// output at `p` moves by `df`.  The update is left-multiplied:
    /// `m ← (1 + dscale)·R(dtheta)·m`.
    pub fn rotate(&mut self, p: Vector2, df: Vector2, stage: AffineStage) -> Result<(), FlameError> {
        let jacobian = self.jacobian(
            p,
            stage,
            |aff| aff.m = Matrix2::rotation(PROBE_DELTA) * aff.m,
            |aff| aff.m *= 1.0 + PROBE_DELTA,
        );
        let solved = solve(jacobian, df)?;
        let (dtheta, dscale) = (solved.x, solved.y);
        debug!(?stage, dtheta, dscale, "rotate");
        let aff = self.affine_mut(stage);
        aff.m = (1.0 + dscale) * Matrix2::rotation(dtheta) * aff.m;
        Ok(())
    }

    /// Finite-difference Jacobian of `self.map(p)` with respect to the
    /// two parameters perturbed by `probe_first` and `probe_second`.
    /// Each probe runs on its own fresh copy of `self`.
    fn jacobian<F, G>(&self, p: Vector2, stage: AffineStage, probe_first: F, probe_second: G) -> Matrix2
    where
        F: Fn(&mut AffineMap),
        G: Fn(&mut AffineMap),
    {
        let r0 = self.map(p);

        let mut probe = *self;
        probe_first(probe.affine_mut(stage));
        let dr_first = (probe.map(p) - r0) / PROBE_DELTA;

        let mut probe = *self;
        probe_second(probe.affine_mut(stage));
        let dr_second = (probe.map(p) - r0) / PROBE_DELTA;

        Matrix2::from_columns(dr_first, dr_second)
    }
}

/// Solve `jacobian · x = df` for `x`.
fn solve(jacobian: Matrix2, df: Vector2) -> Result<Vector2, FlameError> {
    let det = jacobian.determinant();
    let first = Vector2::new(jacobian.a, jacobian.c).length();
    let second = Vector2::new(jacobian.b, jacobian.d).length();
    if det.abs() < MIN_CONDITION * first * second {
        warn!(det, first, second, "ill-conditioned parameter Jacobian; edit skipped");
        return Err(FlameError::NonInvertible(det));
    }
    let inverse = match jacobian.inverse() {
        Some(inverse) => inverse,
        None => {
            warn!(det, "singular parameter Jacobian; edit skipped");
            return Err(FlameError::NonInvertible(det));
        }
    };
    let x = inverse * df;
    if !x.is_finite() {
        warn!(det, "non-finite parameter update; edit skipped");
        return Err(FlameError::NonInvertible(det));
    }
    Ok(x)
}
