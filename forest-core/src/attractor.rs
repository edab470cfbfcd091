use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

/// Fixed set of 2D attraction points feeding a [`crate::density::DensityField`].
///
/// Coordinates are in grid cells.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttractionPoints {
    pub points: Vec<Vec2>,
}

impl AttractionPoints {
    pub fn from_positions(points: Vec<Vec2>) -> Self {
        Self { points }
    }

    pub fn random_in_rect(
        center: Vec2,
        half_extents: Vec2,
        count: usize,
        rng: &mut impl Rng,
    ) -> Self {
        let h = half_extents.abs();
        let points = (0..count)
            .map(|_| {
                let x = rng.random_range(-h.x..=h.x);
                let y = rng.random_range(-h.y..=h.y);
                center + Vec2::new(x, y)
            })
            .collect();

        Self::from_positions(points)
    }

    /// Uniformly distributed points inside an axis-aligned ellipse.
    pub fn random_in_oval(center: Vec2, radii: Vec2, count: usize, rng: &mut impl Rng) -> Self {
        let points = (0..count)
            .map(|_| {
                let r: f32 = rng.random_range(0.0f32..=1.0).sqrt();
                let t: f32 = rng.random_range(0.0..TAU);
                center + Vec2::new(t.cos(), t.sin()) * radii * r
            })
            .collect();

        Self::from_positions(points)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn as_slice(&self) -> &[Vec2] {
        &self.points
    }
}
