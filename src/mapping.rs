// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A single transform of the iterated function system.

use crate::linalg::{AffineMap, Color3, Vector2};
use crate::variation::Variation;

/// Which of a mapping's two affine stages an edit applies to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AffineStage {
    /// The affine map applied before the variation.
    Pre,
    /// The affine map applied after the variation.
    Post,
}

impl From<bool> for AffineStage {
    /// `true` selects the pre-transform, matching the editor's
    /// "edit pre-transform" toggle.
    fn from(edit_pre: bool) -> Self {
        if edit_pre {
            AffineStage::Pre
        } else {
            AffineStage::Post
        }
    }
}

/// One transform of the flame: `post ∘ variation ∘ pre`, together with
/// the color it pulls the running color toward.
///
/// `color_speed` is the blend weight used when this mapping is chosen
/// during iteration.  It is meant to lie in `[0, 1]` but is not
/// clamped here.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FlameMapping {
    /// Affine map applied first.
    pub pre_map: AffineMap,
    /// Nonlinear function applied between the two affine stages.
    pub variation: Variation,
    /// Affine map applied last.
    pub post_map: AffineMap,
    /// The color of this mapping.
    pub color: Color3,
    /// How strongly `color` overrides the running color.
    pub color_speed: f64,
}

impl FlameMapping {
    /// Constructor.
    pub fn new(
        pre_map: AffineMap,
        variation: Variation,
        post_map: AffineMap,
        color: Color3,
        color_speed: f64,
    ) -> Self {
        FlameMapping {
            pre_map,
            variation,
            post_map,
            color,
            color_speed,
        }
    }

    /// Apply the full composed transform to a point.
    #[inline]
    pub fn map(&self, p: Vector2) -> Vector2 {
        self.post_map.map(self.variation.apply(self.pre_map.map(p)))
    }

    /// Mutable access to the affine stage selected by `stage`.
    pub fn affine_mut(&mut self, stage: AffineStage) -> &mut AffineMap {
        match stage {
            AffineStage::Pre => &mut self.pre_map,
            AffineStage::Post => &mut self.post_map,
        }
    }

    /// Pull the running color toward this mapping's color.
    #[inline]
    pub fn blend_color(&self, running: Color3) -> Color3 {
        self.color.blend(running, self.color_speed)
    }
}

impl Default for FlameMapping {
    /// Identity stages, linear variation, white, color speed one half.
    fn default() -> Self {
        FlameMapping::new(
            AffineMap::identity(),
            Variation::Linear,
            AffineMap::identity(),
            Color3::white(),
            0.5,
        )
    }
}
