//! Element-wise geometry transforms over slices.
//!
//! Every operation has a portable reference form in [`generic`]. With the
//! `parallel` feature the top-level functions forward to the data-parallel
//! forms in `parallel` instead; both agree within floating-point tolerance.
//! None of them allocate, and all of them are safe to run on disjoint
//! sub-slices from different threads.

pub mod generic;

#[cfg(feature = "parallel")]
pub mod parallel;

use glam::{Vec2, Vec3, Vec4};
use std::ops::MulAssign;

#[cfg(not(feature = "parallel"))]
use generic as backend;

#[cfg(feature = "parallel")]
use parallel as backend;

/// Axis-aligned bounds of a point set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    /// Bounds of a single point.
    pub fn from_point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    /// Grow to include another bounds.
    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Vectors whose X component can be mirrored.
pub trait MirrorX: Copy + Send + Sync {
    fn mirror_x(&mut self);
}

impl MirrorX for Vec3 {
    #[inline]
    fn mirror_x(&mut self) {
        self.x = -self.x;
    }
}

impl MirrorX for Vec4 {
    #[inline]
    fn mirror_x(&mut self) {
        self.x = -self.x;
    }
}

/// Multiply every element by `s`.
pub fn scale<T>(dst: &mut [T], s: f32)
where
    T: MulAssign<f32> + Send,
{
    backend::scale(dst, s);
}

/// Negate the X component of every element (mirroring).
pub fn invert_x<T: MirrorX>(dst: &mut [T]) {
    backend::invert_x(dst);
}

/// Flip texture coordinates vertically: `v = 1 - v`.
pub fn invert_v(dst: &mut [Vec2]) {
    backend::invert_v(dst);
}

/// Component-wise min/max of `points`, or `None` when empty.
pub fn compute_bounds(points: &[Vec3]) -> Option<Bounds> {
    backend::compute_bounds(points)
}

/// Renormalize every vector to unit length. Zero vectors stay zero.
pub fn normalize(dst: &mut [Vec3]) {
    backend::normalize(dst);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_points() {
        let mut points = vec![Vec3::new(1.0, 2.0, 3.0), Vec3::new(-1.0, 0.5, 0.0)];
        scale(&mut points, 2.0);
        assert_eq!(points[0], Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(points[1], Vec3::new(-2.0, 1.0, 0.0));

        let mut weights = vec![0.25_f32, 4.0];
        scale(&mut weights, 0.5);
        assert_eq!(weights, vec![0.125, 2.0]);
    }

    #[test]
    fn test_invert_x() {
        let mut points = vec![Vec3::new(1.0, 2.0, 3.0)];
        invert_x(&mut points);
        assert_eq!(points[0], Vec3::new(-1.0, 2.0, 3.0));

        let mut tangents = vec![Vec4::new(0.5, 0.0, 0.0, -1.0)];
        invert_x(&mut tangents);
        assert_eq!(tangents[0], Vec4::new(-0.5, 0.0, 0.0, -1.0));
    }

    #[test]
    fn test_invert_v() {
        let mut uv = vec![Vec2::new(0.25, 0.0), Vec2::new(0.75, 0.75)];
        invert_v(&mut uv);
        assert_eq!(uv[0], Vec2::new(0.25, 1.0));
        assert_eq!(uv[1], Vec2::new(0.75, 0.25));
    }

    #[test]
    fn test_compute_bounds() {
        assert_eq!(compute_bounds(&[]), None);

        let points = [
            Vec3::new(1.0, -2.0, 0.5),
            Vec3::new(-3.0, 4.0, 0.0),
            Vec3::new(0.0, 0.0, 9.0),
        ];
        let bounds = compute_bounds(&points).unwrap();
        assert_eq!(bounds.min, Vec3::new(-3.0, -2.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 4.0, 9.0));
        assert_eq!(bounds.size(), Vec3::new(4.0, 6.0, 9.0));
    }

    #[test]
    fn test_normalize_keeps_zero() {
        let mut normals = vec![Vec3::new(0.0, 3.0, 4.0), Vec3::ZERO];
        normalize(&mut normals);
        assert!((normals[0].length() - 1.0).abs() < 1e-6);
        assert_eq!(normals[1], Vec3::ZERO);
        assert!(!normals[1].is_nan());
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_generic() {
        // Longer than one rayon run so the input is actually sharded
        let points: Vec<Vec3> = (0..10_000)
            .map(|i| {
                let t = i as f32 * 0.37;
                Vec3::new(t.sin() * 10.0, t.cos() * 3.0, t * 0.01 - 2.0)
            })
            .collect();

        let a = parallel::compute_bounds(&points).unwrap();
        let b = generic::compute_bounds(&points).unwrap();
        assert!((a.min - b.min).abs().max_element() < 1e-6);
        assert!((a.max - b.max).abs().max_element() < 1e-6);

        let mut n1 = points.clone();
        let mut n2 = points.clone();
        parallel::normalize(&mut n1);
        generic::normalize(&mut n2);
        for (x, y) in n1.iter().zip(&n2) {
            assert!((*x - *y).abs().max_element() < 1e-5);
        }

        parallel::scale(&mut n1, 3.0);
        generic::scale(&mut n2, 3.0);
        parallel::invert_x(&mut n1);
        generic::invert_x(&mut n2);
        assert_eq!(n1, n2);

        let mut uv1: Vec<Vec2> = points.iter().map(|p| p.truncate()).collect();
        let mut uv2 = uv1.clone();
        parallel::invert_v(&mut uv1);
        generic::invert_v(&mut uv2);
        assert_eq!(uv1, uv2);
    }
}
