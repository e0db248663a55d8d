//! Normal synthesis for polygon soups.
//!
//! Face normals come from the first three corners of each polygon:
//! `cross(p1 - p0, p2 - p0)`. Colinear corners give a zero normal, and
//! normalizing zero yields zero, so degenerate faces never produce NaN.

use crate::bulk;
use crate::connectivity::Connectivity;
use crate::error::MeshError;
use crate::soup::PolygonSoup;
use glam::Vec3;

/// Slack subtracted from the smoothing threshold so faces sitting exactly on
/// the angle still merge.
pub const SMOOTH_ANGLE_EPSILON: f32 = 0.001;

/// Un-normalized face normal (length is twice the area of the first triangle).
#[inline]
pub fn raw_face_normal(points: &[Vec3], face: &[u32]) -> Vec3 {
    let p0 = points[face[0] as usize];
    let p1 = points[face[1] as usize];
    let p2 = points[face[2] as usize];
    (p1 - p0).cross(p2 - p0)
}

/// One unit normal per face (zero for degenerate faces).
pub fn face_normals(soup: &PolygonSoup) -> Vec<Vec3> {
    let points = soup.points();
    soup.faces()
        .map(|face| raw_face_normal(points, face).normalize_or_zero())
        .collect()
}

/// Flat mode: one normal per point.
///
/// Each face's un-normalized normal is accumulated into every point it
/// touches, so larger faces weigh more. `dst` must hold exactly one entry per
/// point.
pub fn generate_normals(dst: &mut [Vec3], soup: &PolygonSoup) -> Result<(), MeshError> {
    if dst.len() != soup.point_count() {
        return Err(MeshError::ShapeMismatch {
            expected: soup.point_count(),
            actual: dst.len(),
        });
    }
    dst.fill(Vec3::ZERO);

    let points = soup.points();
    for face in soup.faces() {
        let n = raw_face_normal(points, face);
        for &vi in face {
            dst[vi as usize] += n;
        }
    }
    bulk::normalize(dst);
    Ok(())
}

/// Smoothing-angle mode: one normal per corner.
///
/// A corner sums the normals of every face sharing its point whose angle to
/// the corner's own face is below `smooth_angle` degrees. `dst` must hold
/// exactly one entry per corner, and `connectivity` must have been built
/// from `soup` in its current state.
pub fn generate_normals_with_angle(
    dst: &mut [Vec3],
    soup: &PolygonSoup,
    connectivity: &Connectivity,
    smooth_angle: f32,
) -> Result<(), MeshError> {
    if dst.len() != soup.corner_count() {
        return Err(MeshError::ShapeMismatch {
            expected: soup.corner_count(),
            actual: dst.len(),
        });
    }
    if !connectivity.is_current(soup) {
        return Err(MeshError::StaleConnectivity {
            built: connectivity.version(),
            current: soup.version(),
        });
    }

    let face_normals = face_normals(soup);
    let threshold = smooth_angle.to_radians().cos() - SMOOTH_ANGLE_EPSILON;

    for (fi, face) in soup.faces().enumerate() {
        let offset = soup.offsets()[fi] as usize;
        let face_normal = face_normals[fi];
        for (ci, &vi) in face.iter().enumerate() {
            let normal: Vec3 = connectivity
                .face_indices_of(vi)
                .iter()
                .map(|&other| face_normals[other as usize])
                .filter(|n| face_normal.dot(*n) > threshold)
                .sum();
            dst[offset + ci] = normal;
        }
    }
    bulk::normalize(dst);
    Ok(())
}

/// Negate every normal in place.
pub fn flip_normals(dst: &mut [Vec3]) {
    bulk::scale(dst, -1.0);
}
