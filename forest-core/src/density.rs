//! Attraction density fields.
//!
//! Every attraction point contributes `exp(-falloff * distance)` (scaled to
//! `0..=255`) to the cells around it. Contributions below 1% are skipped
//! entirely by limiting each point to a cutoff radius, which keeps the
//! per-point work proportional to `cutoff²` instead of the grid size.
//!
//! Building happens in two phases:
//! 1. Each point splats into its own [`IntensityBuffer`] covering only its
//!    clipped bounding box. Points run in parallel on the rayon pool and
//!    share no mutable state.
//! 2. Once every splat exists, they are merged into the grid one after the
//!    other with saturating addition.

use glam::{UVec2, Vec2};
use rand::Rng;
use rayon::prelude::*;

use crate::intensity_buffer::IntensityBuffer;

/// Relative intensity below which a contribution is dropped.
pub const NEGLIGIBLE_INTENSITY: f32 = 0.01;

/// Smallest falloff accepted; anything lower (or non-finite) is clamped to it.
const MIN_FALLOFF: f32 = 1e-6;

/// Distance at which a point's contribution falls to [`NEGLIGIBLE_INTENSITY`].
#[inline]
pub fn cutoff_distance(falloff: f32) -> f32 {
    -NEGLIGIBLE_INTENSITY.ln() / falloff
}

#[derive(Clone, Debug, PartialEq)]
pub struct DensityField {
    grid: IntensityBuffer,
    falloff: f32,
    total: u64,
}

/// Splats one point into a private buffer covering its clipped bounding box.
///
/// Returns `None` when the box misses the grid entirely.
fn splat(pos: Vec2, size: UVec2, falloff: f32, cutoff: f32) -> Option<IntensityBuffer> {
    let cutoff2 = cutoff * cutoff;
    let lo_x = ((pos.x - cutoff).floor() as i64).max(0);
    let lo_y = ((pos.y - cutoff).floor() as i64).max(0);
    let hi_x = ((pos.x + cutoff).ceil() as i64).min(size.x as i64 - 1);
    let hi_y = ((pos.y + cutoff).ceil() as i64).min(size.y as i64 - 1);
    if lo_x > hi_x || lo_y > hi_y {
        return None;
    }

    let origin = UVec2::new(lo_x as u32, lo_y as u32);
    let extent = UVec2::new((hi_x - lo_x + 1) as u32, (hi_y - lo_y + 1) as u32);
    let mut buf = IntensityBuffer::with_region(origin, extent);

    for y in lo_y..=hi_y {
        let dy = y as f32 - pos.y;
        for x in lo_x..=hi_x {
            let dx = x as f32 - pos.x;
            let d2 = dx * dx + dy * dy;
            if d2 <= cutoff2 {
                let intensity = (-falloff * d2.sqrt()).exp();
                // `as` truncates and saturates into 0..=255.
                buf.add(UVec2::new(x as u32, y as u32), (intensity * 255.0) as u8);
            }
        }
    }
    Some(buf)
}

impl DensityField {
    /// Builds a field of `width × height` cells from attraction points.
    ///
    /// Point coordinates are in cells; cell `(x, y)` is sampled at its
    /// integer coordinate. Points outside the grid still contribute to the
    /// cells within their cutoff radius.
    ///
    /// ### Parameters
    /// - `points` - Attraction points.
    /// - `width`, `height` - Grid size in cells.
    /// - `falloff` - Exponential decay rate per cell of distance; clamped to
    ///   a small positive value if non-positive or non-finite.
    ///
    /// ### Returns
    /// The merged field. With no points (or none near the grid) every cell
    /// is zero.
    pub fn build(points: &[Vec2], width: u32, height: u32, falloff: f32) -> Self {
        let falloff = if falloff.is_finite() && falloff > MIN_FALLOFF {
            falloff
        } else {
            MIN_FALLOFF
        };
        let size = UVec2::new(width, height);
        let cutoff = cutoff_distance(falloff);

        let splats: Vec<IntensityBuffer> = points
            .par_iter()
            .filter_map(|&p| splat(p, size, falloff, cutoff))
            .collect();

        let mut grid = IntensityBuffer::with_size(size);
        for part in &splats {
            grid.merge_from(part);
        }
        let total = grid.total();

        log::debug!(
            target: "density",
            "built {}x{} field from {} points (cutoff {:.2}, total {})",
            width,
            height,
            points.len(),
            cutoff,
            total
        );

        Self {
            grid,
            falloff,
            total,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.grid.size().x
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.grid.size().y
    }

    #[inline]
    pub fn size(&self) -> UVec2 {
        self.grid.size()
    }

    #[inline]
    pub fn falloff(&self) -> f32 {
        self.falloff
    }

    #[inline]
    pub fn cutoff(&self) -> f32 {
        cutoff_distance(self.falloff)
    }

    /// Intensity of a cell, `0` outside the grid.
    #[inline]
    pub fn intensity(&self, x: u32, y: u32) -> u8 {
        self.grid.get(UVec2::new(x, y))
    }

    /// `255` for cells touched by any point, `0` otherwise.
    #[inline]
    pub fn alpha(&self, x: u32, y: u32) -> u8 {
        self.grid.alpha(UVec2::new(x, y))
    }

    /// Row-major intensities.
    #[inline]
    pub fn intensities(&self) -> &[u8] {
        self.grid.values()
    }

    #[inline]
    pub fn total_intensity(&self) -> u64 {
        self.total
    }

    pub fn max_intensity(&self) -> u8 {
        self.intensities().iter().copied().max().unwrap_or(0)
    }

    /// Grey RGBA8 pixels, row-major, for renderers and image writers.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.intensities()
            .iter()
            .zip(self.grid.alphas())
            .flat_map(|(&v, &a)| [v, v, v, a])
            .collect()
    }

    /// Draws a cell with probability proportional to its intensity.
    ///
    /// Draws `r` uniformly from `1..=total` and walks the cells row-major,
    /// returning the first one where the running sum reaches `r`. Zero
    /// cells are never returned unless the whole field is zero, in which
    /// case the origin cell is returned.
    pub fn sample_weighted(&self, rng: &mut impl Rng) -> UVec2 {
        if self.total == 0 {
            return UVec2::ZERO;
        }

        let target = rng.random_range(1..=self.total);
        let width = self.width() as usize;
        let mut acc = 0u64;
        for (i, &v) in self.intensities().iter().enumerate() {
            acc += v as u64;
            if acc >= target {
                return UVec2::new((i % width) as u32, (i / width) as u32);
            }
        }
        // The running sum ends at `total`, so the loop always returns.
        UVec2::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn single_point_peaks_at_center_and_vanishes_past_cutoff() {
        let center = Vec2::new(10.0, 10.0);
        let field = DensityField::build(&[center], 20, 20, 1.0);
        let cutoff = field.cutoff();
        assert!((cutoff - 4.605).abs() < 1e-2);

        assert_eq!(field.intensity(10, 10), 255);
        assert_eq!(field.max_intensity(), 255);

        for y in 0..20 {
            for x in 0..20 {
                let d = Vec2::new(x as f32, y as f32).distance(center);
                if d > cutoff {
                    assert_eq!(field.intensity(x, y), 0, "({x}, {y}) at {d}");
                    assert_eq!(field.alpha(x, y), 0);
                } else {
                    assert_eq!(field.alpha(x, y), 255);
                    assert!(field.intensity(x, y) <= field.intensity(10, 10));
                }
            }
        }
    }

    #[test]
    fn intensity_decays_with_distance() {
        let field = DensityField::build(&[Vec2::new(10.0, 10.0)], 20, 20, 1.0);
        // exp(-1) * 255 = 93.8, exp(-2) * 255 = 34.5
        assert_eq!(field.intensity(11, 10), 93);
        assert_eq!(field.intensity(10, 12), 34);
        assert!(field.intensity(13, 10) < field.intensity(12, 10));
    }

    #[test]
    fn no_points_gives_zero_field_and_origin_sample() {
        let field = DensityField::build(&[], 8, 8, 0.5);
        assert_eq!(field.total_intensity(), 0);
        assert_eq!(field.intensities().len(), 64);
        assert!(field.to_rgba8().iter().all(|&b| b == 0));

        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(field.sample_weighted(&mut rng), UVec2::ZERO);
    }

    #[test]
    fn far_away_points_contribute_nothing() {
        let field = DensityField::build(&[Vec2::new(-100.0, 500.0)], 16, 16, 1.0);
        assert_eq!(field.total_intensity(), 0);
    }

    #[test]
    fn point_near_edge_is_clipped() {
        let field = DensityField::build(&[Vec2::new(0.0, 0.0)], 10, 10, 1.0);
        assert_eq!(field.intensity(0, 0), 255);
        assert_eq!(field.intensity(1, 0), 93);
    }

    #[test]
    fn overlapping_points_saturate() {
        let p = Vec2::new(5.0, 5.0);
        let field = DensityField::build(&[p, p], 10, 10, 1.0);
        assert_eq!(field.intensity(5, 5), 255);
        // 93 + 93
        assert_eq!(field.intensity(6, 5), 186);
    }

    #[test]
    fn point_order_does_not_change_field() {
        let a = Vec2::new(6.0, 6.0);
        let b = Vec2::new(7.5, 6.0);
        let c = Vec2::new(6.0, 8.2);

        let abc = DensityField::build(&[a, b, c], 16, 16, 0.3);
        assert_eq!(abc, DensityField::build(&[c, a, b], 16, 16, 0.3));
        assert_eq!(abc, DensityField::build(&[b, c, a], 16, 16, 0.3));
    }

    #[test]
    fn high_falloff_concentrates_samples_on_the_point() {
        let field = DensityField::build(&[Vec2::new(12.0, 3.0)], 20, 20, 50.0);
        let mut rng = StdRng::seed_from_u64(77);
        for _ in 0..100 {
            assert_eq!(field.sample_weighted(&mut rng), UVec2::new(12, 3));
        }
    }

    #[test]
    fn samples_only_land_on_weighted_cells() {
        let field = DensityField::build(&[Vec2::new(3.0, 3.0), Vec2::new(15.0, 12.0)], 20, 16, 0.8);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..500 {
            let c = field.sample_weighted(&mut rng);
            assert!(c.x < 20 && c.y < 16);
            assert!(field.intensity(c.x, c.y) > 0);
        }
    }

    #[test]
    fn rgba_export_matches_grid() {
        let field = DensityField::build(&[Vec2::new(1.0, 1.0)], 3, 2, 1.0);
        let rgba = field.to_rgba8();
        assert_eq!(rgba.len(), 3 * 2 * 4);
        // Cell (1, 1) of a 3-wide grid.
        let i = (3 + 1) * 4;
        assert_eq!(&rgba[i..i + 4], &[255, 255, 255, 255]);
    }

    #[test]
    fn invalid_falloff_is_clamped() {
        let field = DensityField::build(&[Vec2::new(2.0, 2.0)], 5, 5, 0.0);
        assert!(field.falloff() > 0.0);
        // Nearly flat: every cell is touched.
        assert!((0..5).all(|x| field.alpha(x, 4) == 255));
    }
}
