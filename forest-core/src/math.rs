//! Rotation and ring helpers shared by the generators.

use std::f32::consts::TAU;

use glam::{EulerRot, Quat, Vec2, Vec3};
use rand::Rng;

/// Builds a rotation from per-axis angles in degrees.
///
/// The rotation applies Z first, then X, then Y, matching the usual
/// "pitch/yaw/roll" Euler convention for a Y-up world.
#[inline]
pub fn euler_degrees(x: f32, y: f32, z: f32) -> Quat {
    Quat::from_euler(EulerRot::YXZ, y.to_radians(), x.to_radians(), z.to_radians())
}

/// Draws a rotation with each axis angle uniform in `[-max_degrees, max_degrees]`.
///
/// Draw order is x, y, z. A zero bound still consumes three draws so the
/// random sequence does not depend on the bound.
pub fn euler_jitter(max_degrees: f32, rng: &mut impl Rng) -> Quat {
    let b = max_degrees.abs();
    let x = rng.random_range(-b..=b);
    let y = rng.random_range(-b..=b);
    let z = rng.random_range(-b..=b);
    euler_degrees(x, y, z)
}

/// Rotates `direction` by a bounded random jitter.
#[inline]
pub fn offset_direction(direction: Vec3, max_degrees: f32, rng: &mut impl Rng) -> Vec3 {
    euler_jitter(max_degrees, rng) * direction
}

/// Rotation of `degrees` around `axis`; a degenerate axis falls back to +Y.
#[inline]
pub fn axis_angle_degrees(axis: Vec3, degrees: f32) -> Quat {
    Quat::from_axis_angle(axis.normalize_or(Vec3::Y), degrees.to_radians())
}

/// Unit vector perpendicular to `direction`, as close to +X as possible.
///
/// Keeping the reference tied to a fixed world axis keeps consecutive rings
/// of a branch from twisting against each other.
pub fn ring_reference(direction: Vec3) -> Vec3 {
    let d = direction.normalize_or(Vec3::Y);
    (Vec3::X - d * d.dot(Vec3::X))
        .try_normalize()
        .unwrap_or_else(|| d.any_orthonormal_vector())
}

/// Points of a circle around `center`, perpendicular to `direction`.
///
/// ### Parameters
/// - `center` - Circle center.
/// - `direction` - Circle normal; need not be normalized.
/// - `radius` - Circle radius.
/// - `count` - Number of evenly spaced points.
///
/// ### Returns
/// `count` points, the first one along [`ring_reference`].
pub fn ring_vertices(center: Vec3, direction: Vec3, radius: f32, count: usize) -> Vec<Vec3> {
    let axis = direction.normalize_or(Vec3::Y);
    let offset = ring_reference(axis) * radius;
    (0..count)
        .map(|i| {
            let angle = TAU * i as f32 / count as f32;
            center + Quat::from_axis_angle(axis, angle) * offset
        })
        .collect()
}

/// Smallest distance from `p` to any of `others`, or `f32::INFINITY` if
/// there are none.
pub fn min_distance(p: Vec3, others: impl IntoIterator<Item = Vec3>) -> f32 {
    others
        .into_iter()
        .map(|o| o.distance(p))
        .fold(f32::INFINITY, f32::min)
}

/// Maps `p` in `[0, size]` onto the ground square `[-bound, bound]²` at y = 0.
pub fn grid_to_ground(p: Vec2, size: Vec2, bound: f32) -> Vec3 {
    let t = p / size.max(Vec2::ONE);
    let xz = (t * 2.0 - Vec2::ONE) * bound;
    Vec3::new(xz.x, 0.0, xz.y)
}
