//! Portable reference implementations of the bulk ops.

use super::{Bounds, MirrorX};
use glam::{Vec2, Vec3};
use std::ops::MulAssign;

pub fn scale<T: MulAssign<f32>>(dst: &mut [T], s: f32) {
    for v in dst {
        *v *= s;
    }
}

pub fn invert_x<T: MirrorX>(dst: &mut [T]) {
    for v in dst {
        v.mirror_x();
    }
}

pub fn invert_v(dst: &mut [Vec2]) {
    for uv in dst {
        uv.y = 1.0 - uv.y;
    }
}

pub fn compute_bounds(points: &[Vec3]) -> Option<Bounds> {
    let (first, rest) = points.split_first()?;
    Some(
        rest.iter()
            .fold(Bounds::from_point(*first), |b, &p| Bounds {
                min: b.min.min(p),
                max: b.max.max(p),
            }),
    )
}

pub fn normalize(dst: &mut [Vec3]) {
    for v in dst {
        *v = v.normalize_or_zero();
    }
}
