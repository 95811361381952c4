// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The chaos game.
//!
//! Starting from the origin and unit white, repeatedly pick one of the
//! flame's mappings uniformly at random, push the running point
//! through it, and pull the running color toward that mapping's color
//! by the mapping's own color speed.  The first
//! [`DISCARD_ITERATIONS`] steps only let the point settle onto the
//! attractor; after that every step emits one point, positioned by
//! the final map (which never feeds back into the running point) and
//! colored by the running color.
//!
//! Output goes into a caller-owned [`PointBuffer`], written inside a
//! single acquire/release window.  Randomness comes from an
//! [`IndexSource`] so callers can make runs reproducible.

use num::Zero;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::FlameError;
use crate::linalg::{Color3, Vector2};
use crate::maps::FlameMaps;

/// Number of initial iterations whose points are thrown away.
pub const DISCARD_ITERATIONS: usize = 20;

/// One colored point of the cloud.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IfsPoint {
    /// Position after the final map.
    pub position: Vector2,
    /// The running color at the time the point was emitted.
    pub color: Color3,
}

impl Default for IfsPoint {
    fn default() -> Self {
        IfsPoint {
            position: Vector2::zero(),
            color: Color3::white(),
        }
    }
}

/// Where mapping indices come from.
pub trait IndexSource {
    /// A uniformly distributed index in `[0, n)`.  `n` is never zero.
    fn next_index(&mut self, n: usize) -> usize;
}

/// Uniform indices drawn from any `rand` generator.
pub struct UniformIndex<R: Rng>(R);

impl UniformIndex<StdRng> {
    /// A reproducible source.
    pub fn seeded(seed: u64) -> Self {
        UniformIndex(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> IndexSource for UniformIndex<R> {
    fn next_index(&mut self, n: usize) -> usize {
        self.0.gen_range(0, n)
    }
}

/// Replays a fixed list of indices, cycling when it runs out.  Values
/// are reduced modulo the number of mappings.  An empty list, or a
/// request with `n == 0`, yields zero.
#[derive(Clone, Debug, Default)]
pub struct FixedSequence {
    indices: Vec<usize>,
    position: usize,
}

impl FixedSequence {
    /// Constructor.
    pub fn new(indices: Vec<usize>) -> Self {
        FixedSequence {
            indices,
            position: 0,
        }
    }

    /// How many indices have been handed out so far.
    pub fn drawn(&self) -> usize {
        self.position
    }
}

impl IndexSource for FixedSequence {
    fn next_index(&mut self, n: usize) -> usize {
        let index = if self.indices.is_empty() || n == 0 {
            0
        } else {
            self.indices[self.position % self.indices.len()] % n
        };
        self.position += 1;
        index
    }
}

/// An externally owned array of points the generator fills.
///
/// Writes happen only between [`acquire`](PointBuffer::acquire) and
/// [`release`](PointBuffer::release); the generator keeps no hold on
/// the storage afterwards.
pub trait PointBuffer {
    /// Number of points the buffer holds.
    fn size(&self) -> usize;

    /// Open the buffer for exclusive writing.
    fn acquire(&mut self) -> &mut [IfsPoint];

    /// Close the write window opened by `acquire`.
    fn release(&mut self) {}
}

impl PointBuffer for [IfsPoint] {
    fn size(&self) -> usize {
        self.len()
    }

    fn acquire(&mut self) -> &mut [IfsPoint] {
        self
    }
}

impl PointBuffer for Vec<IfsPoint> {
    fn size(&self) -> usize {
        self.len()
    }

    fn acquire(&mut self) -> &mut [IfsPoint] {
        self.as_mut_slice()
    }
}

/// A fixed-size point store that tracks its write window, in the
/// manner of a mapped vertex buffer.
#[derive(Clone, Debug)]
pub struct PointCloud {
    points: Vec<IfsPoint>,
    mapped: bool,
}

impl PointCloud {
    /// A cloud of `size` default points.
    pub fn new(size: usize) -> Self {
        PointCloud {
            points: vec![IfsPoint::default(); size],
            mapped: false,
        }
    }

    /// The points, readable once the write window is closed.
    pub fn points(&self) -> &[IfsPoint] {
        &self.points
    }

    /// True while a writer holds the buffer.
    pub fn is_mapped(&self) -> bool {
        self.mapped
    }
}

impl PointBuffer for PointCloud {
    fn size(&self) -> usize {
        self.points.len()
    }

    fn acquire(&mut self) -> &mut [IfsPoint] {
        self.mapped = true;
        &mut self.points
    }

    fn release(&mut self) {
        self.mapped = false;
    }
}

/// The running state of one chaos game.
pub struct ChaosGame<'a, S: IndexSource + ?Sized> {
    flame: &'a FlameMaps,
    source: &'a mut S,
    point: Vector2,
    color: Color3,
}

impl<'a, S: IndexSource + ?Sized> ChaosGame<'a, S> {
    /// Start a game at the origin with unit white.  Fails if the flame
    /// has no mappings to choose from.
    pub fn new(flame: &'a FlameMaps, source: &'a mut S) -> Result<Self, FlameError> {
        if flame.is_empty() {
            return Err(FlameError::NoMaps);
        }
        Ok(ChaosGame {
            flame,
            source,
            point: Vector2::zero(),
            color: Color3::white(),
        })
    }

    /// Advance by one randomly chosen mapping.
    #[inline]
    pub fn step(&mut self) {
        let flame = self.flame;
        let mapping = &flame.maps[self.source.next_index(flame.maps.len())];
        self.point = mapping.map(self.point);
        self.color = mapping.blend_color(self.color);
    }

    /// Run the discarded settling iterations.
    pub fn burn_in(&mut self) {
        for _ in 0..DISCARD_ITERATIONS {
            self.step();
        }
    }

    /// Advance one step and return the point to emit.
    #[inline]
    pub fn next_point(&mut self) -> IfsPoint {
        self.step();
        IfsPoint {
            position: self.flame.final_map.map(self.point),
            color: self.color,
        }
    }
}

/// Fill `buffer` with exactly `buffer.size()` points of `flame`.
pub fn generate<B, S>(flame: &FlameMaps, buffer: &mut B, source: &mut S) -> Result<(), FlameError>
where
    B: PointBuffer + ?Sized,
    S: IndexSource + ?Sized,
{
    let mut game = ChaosGame::new(flame, source)?;
    game.burn_in();

    let written = buffer.size();
    for slot in buffer.acquire().iter_mut() {
        *slot = game.next_point();
    }
    buffer.release();

    debug!(points = written, maps = flame.len(), "generated point cloud");
    Ok(())
}

/// Generate `total` points on `threads` workers.  Each worker iterates
/// its own copy of the flame with its own generator seeded from `seed`
/// and its worker number, so the result depends only on the
/// arguments.
pub fn generate_parallel(
    flame: &FlameMaps,
    total: usize,
    threads: usize,
    seed: u64,
) -> Result<Vec<IfsPoint>, FlameError> {
    if flame.is_empty() {
        return Err(FlameError::NoMaps);
    }
    let threads = threads.max(1);
    let chunk = ((total + threads - 1) / threads).max(1);
    let mut points = vec![IfsPoint::default(); total];

    let results = crossbeam::scope(|spawner| {
        let handles: Vec<_> = points
            .chunks_mut(chunk)
            .enumerate()
            .map(|(worker, region)| {
                let own = flame.clone();
                spawner.spawn(move |_| {
                    let mut source = UniformIndex::seeded(seed.wrapping_add(worker as u64));
                    generate(&own, region, &mut source)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().map_err(|_| FlameError::WorkerFailed)?)
            .collect::<Result<Vec<()>, FlameError>>()
    })
    .map_err(|_| FlameError::WorkerFailed)?;
    results?;

    debug!(points = total, threads, "parallel generation finished");
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::{AffineMap, Matrix2};
    use crate::mapping::FlameMapping;
    use crate::variation::Variation;

    fn single_map_flame(color: Color3, color_speed: f64) -> FlameMaps {
        let mut mapping = FlameMapping::default();
        mapping.color = color;
        mapping.color_speed = color_speed;
        FlameMaps::new(FlameMapping::default(), vec![mapping])
    }

    fn two_map_flame() -> FlameMaps {
        let left = FlameMapping::new(
            AffineMap::new(Matrix2::identity() * 0.5, Vector2::new(-0.5, 0.0)),
            Variation::Linear,
            AffineMap::identity(),
            Color3::new(1.0, 0.0, 0.0),
            1.0,
        );
        let mut right = left;
        right.pre_map.c = Vector2::new(0.5, 0.0);
        right.color = Color3::new(0.0, 0.0, 1.0);
        FlameMaps::new(FlameMapping::default(), vec![left, right])
    }

    #[test]
    fn zero_points_still_burns_in() {
        let flame = single_map_flame(Color3::white(), 0.5);
        let mut buffer: Vec<IfsPoint> = Vec::new();
        let mut source = FixedSequence::new(vec![0]);
        generate(&flame, &mut buffer, &mut source).unwrap();
        assert!(buffer.is_empty());
        assert_eq!(source.drawn(), DISCARD_ITERATIONS);
    }

    #[test]
    fn one_index_per_iteration() {
        let flame = two_map_flame();
        let mut buffer = vec![IfsPoint::default(); 7];
        let mut source = FixedSequence::new(vec![0, 1]);
        generate(&flame, &mut buffer, &mut source).unwrap();
        assert_eq!(source.drawn(), DISCARD_ITERATIONS + 7);
    }

    #[test]
    fn identity_flame_sits_at_origin_and_converges_to_map_color() {
        let color = Color3::new(0.2, 0.6, 0.9);
        let flame = single_map_flame(color, 0.5);
        let mut cloud = PointCloud::new(50);
        generate(&flame, &mut cloud, &mut UniformIndex::seeded(7)).unwrap();
        for point in cloud.points() {
            assert_eq!(point.position, Vector2::new(0.0, 0.0));
            assert!((point.color.r - color.r).abs() < 1e-6);
            assert!((point.color.g - color.g).abs() < 1e-6);
            assert!((point.color.b - color.b).abs() < 1e-6);
        }
    }

    #[test]
    fn color_blends_once_per_iteration() {
        let flame = single_map_flame(Color3::gray(0.0), 0.5);
        let mut buffer = vec![IfsPoint::default(); 2];
        generate(&flame, &mut buffer, &mut FixedSequence::new(vec![0])).unwrap();
        let expected = 0.5f64.powi(DISCARD_ITERATIONS as i32 + 1);
        assert!((buffer[0].color.r - expected).abs() < 1e-15);
        assert!((buffer[1].color.r - expected / 2.0).abs() < 1e-15);
    }

    #[test]
    fn final_map_moves_output_but_not_running_point() {
        let mut flame = single_map_flame(Color3::new(0.1, 0.2, 0.3), 1.0);
        flame.final_map.post_map.c = Vector2::new(1.0, -2.0);
        flame.final_map.color = Color3::gray(0.0);
        let mut buffer = vec![IfsPoint::default(); 10];
        generate(&flame, &mut buffer, &mut FixedSequence::new(vec![0])).unwrap();
        for point in &buffer {
            assert_eq!(point.position, Vector2::new(1.0, -2.0));
            assert_eq!(point.color, Color3::new(0.1, 0.2, 0.3));
        }
    }

    #[test]
    fn fixed_sequence_runs_are_bit_identical() {
        let flame = FlameMaps::default();
        let sequence: Vec<usize> = (0..97).map(|i| (i * 7 + 3) % 5).collect();
        let mut first = vec![IfsPoint::default(); 500];
        let mut second = vec![IfsPoint::default(); 500];
        generate(&flame, &mut first, &mut FixedSequence::new(sequence.clone())).unwrap();
        generate(&flame, &mut second, &mut FixedSequence::new(sequence)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_flame_fails_without_touching_buffer() {
        let flame = FlameMaps::new(FlameMapping::default(), vec![]);
        let mut cloud = PointCloud::new(3);
        match generate(&flame, &mut cloud, &mut FixedSequence::new(vec![0])) {
            Err(FlameError::NoMaps) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert!(!cloud.is_mapped());
        assert!(cloud.points().iter().all(|p| *p == IfsPoint::default()));
    }

    #[test]
    fn buffer_is_released_after_generation() {
        let mut cloud = PointCloud::new(4);
        generate(&FlameMaps::default(), &mut cloud, &mut UniformIndex::seeded(1)).unwrap();
        assert!(!cloud.is_mapped());
    }

    #[test]
    fn uniform_selection_visits_every_map() {
        let flame = two_map_flame();
        let mut buffer = vec![IfsPoint::default(); 200];
        generate(&flame, &mut buffer, &mut UniformIndex::seeded(42)).unwrap();
        assert!(buffer.iter().any(|p| p.color.r == 1.0));
        assert!(buffer.iter().any(|p| p.color.b == 1.0));
    }

    #[test]
    fn fixed_sequence_wraps_and_tolerates_zero_maps() {
        let mut source = FixedSequence::new(vec![4, 7]);
        assert_eq!(source.next_index(3), 1);
        assert_eq!(source.next_index(3), 1);
        assert_eq!(source.next_index(0), 0);
        assert_eq!(source.next_index(5), 2);
        assert_eq!(source.drawn(), 4);
        assert_eq!(FixedSequence::default().next_index(0), 0);
    }

    #[test]
    fn uniform_index_stays_in_range() {
        let mut source = UniformIndex::seeded(3);
        for n in 1..20 {
            for _ in 0..50 {
                assert!(source.next_index(n) < n);
            }
        }
    }

    #[test]
    fn parallel_generation_is_reproducible() {
        let flame = FlameMaps::default();
        let a = generate_parallel(&flame, 1001, 4, 99).unwrap();
        let b = generate_parallel(&flame, 1001, 4, 99).unwrap();
        assert_eq!(a.len(), 1001);
        assert_eq!(a, b);
    }

    #[test]
    fn parallel_generation_handles_degenerate_sizes() {
        let flame = FlameMaps::default();
        assert!(generate_parallel(&flame, 0, 3, 1).unwrap().is_empty());
        assert_eq!(generate_parallel(&flame, 5, 0, 1).unwrap().len(), 5);
        let empty = FlameMaps::new(FlameMapping::default(), vec![]);
        assert!(generate_parallel(&empty, 5, 2, 1).is_err());
    }
}
