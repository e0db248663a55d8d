//! Data-parallel implementations of the bulk ops.
//!
//! Slices are split into fixed-size runs so short inputs stay on the
//! calling thread.

use super::{Bounds, MirrorX, generic};
use glam::{Vec2, Vec3};
use rayon::prelude::*;
use std::ops::MulAssign;

/// Elements per rayon task.
const CHUNK: usize = 4096;

pub fn scale<T: MulAssign<f32> + Send>(dst: &mut [T], s: f32) {
    dst.par_chunks_mut(CHUNK)
        .for_each(|chunk| generic::scale(chunk, s));
}

pub fn invert_x<T: MirrorX>(dst: &mut [T]) {
    dst.par_chunks_mut(CHUNK).for_each(generic::invert_x);
}

pub fn invert_v(dst: &mut [Vec2]) {
    dst.par_chunks_mut(CHUNK).for_each(generic::invert_v);
}

pub fn compute_bounds(points: &[Vec3]) -> Option<Bounds> {
    points
        .par_chunks(CHUNK)
        .filter_map(generic::compute_bounds)
        .reduce_with(Bounds::union)
}

pub fn normalize(dst: &mut [Vec3]) {
    dst.par_chunks_mut(CHUNK).for_each(generic::normalize);
}
