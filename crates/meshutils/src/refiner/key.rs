//! Vertex keys for corner deduplication.
//!
//! A key carries only the fields that take part in the comparison for the
//! current attribute layout. The layout is chosen once per refine pass;
//! the scan loop in [`find_or_add_vertex`] is shared by every layout.

use super::RefinedMesh;
use crate::attribute::AttributeScope;
use crate::connectivity::Connectivity;
use glam::{Vec2, Vec3, Vec4};

/// Component-wise tolerance for treating two attribute values as equal.
pub const NEAR_EQUAL_EPSILON: f32 = 1e-5;

/// Which attributes a refined vertex is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLayout {
    Position,
    PositionNormal,
    PositionNormalUv,
    PositionNormalTangentUv,
    PositionUv,
}

/// The attribute tuple of one corner.
///
/// The tangent is carried into the output but never compared: it is a
/// function of position, normal and uv, and comparing it would split
/// otherwise identical vertices on numeric noise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VertexKey {
    Position {
        point: Vec3,
    },
    PositionNormal {
        point: Vec3,
        normal: Vec3,
    },
    PositionNormalUv {
        point: Vec3,
        normal: Vec3,
        uv: Vec2,
    },
    PositionNormalTangentUv {
        point: Vec3,
        normal: Vec3,
        tangent: Vec4,
        uv: Vec2,
    },
    PositionUv {
        point: Vec3,
        uv: Vec2,
    },
}

impl VertexKey {
    /// Whether refined vertex `id` in `out` carries this key's values.
    pub fn matches(&self, out: &RefinedMesh, id: usize) -> bool {
        let eq3 = |a: Vec3, b: Vec3| a.abs_diff_eq(b, NEAR_EQUAL_EPSILON);
        let eq2 = |a: Vec2, b: Vec2| a.abs_diff_eq(b, NEAR_EQUAL_EPSILON);
        match *self {
            Self::Position { point } => eq3(out.points[id], point),
            Self::PositionNormal { point, normal } => {
                eq3(out.points[id], point) && eq3(out.normals[id], normal)
            }
            Self::PositionNormalUv { point, normal, uv }
            | Self::PositionNormalTangentUv {
                point, normal, uv, ..
            } => {
                eq3(out.points[id], point)
                    && eq3(out.normals[id], normal)
                    && eq2(out.uv[id], uv)
            }
            Self::PositionUv { point, uv } => eq3(out.points[id], point) && eq2(out.uv[id], uv),
        }
    }

    /// Append a refined vertex with this key's values, returning its id.
    pub fn push(&self, out: &mut RefinedMesh) -> u32 {
        let id = out.points.len() as u32;
        match *self {
            Self::Position { point } => {
                out.points.push(point);
            }
            Self::PositionNormal { point, normal } => {
                out.points.push(point);
                out.normals.push(normal);
            }
            Self::PositionNormalUv { point, normal, uv } => {
                out.points.push(point);
                out.normals.push(normal);
                out.uv.push(uv);
            }
            Self::PositionNormalTangentUv {
                point,
                normal,
                tangent,
                uv,
            } => {
                out.points.push(point);
                out.normals.push(normal);
                out.tangents.push(tangent);
                out.uv.push(uv);
            }
            Self::PositionUv { point, uv } => {
                out.points.push(point);
                out.uv.push(uv);
            }
        }
        id
    }
}

/// Builds the key of each corner from the borrowed input arrays.
pub(crate) struct KeySource<'s> {
    pub layout: KeyLayout,
    pub points: &'s [Vec3],
    pub normals: &'s [Vec3],
    pub uv: &'s [Vec2],
    pub tangents: &'s [Vec4],
    pub normal_scope: AttributeScope,
    pub uv_scope: AttributeScope,
    pub tangent_scope: AttributeScope,
}

impl KeySource<'_> {
    #[inline]
    pub fn key(&self, point: u32, corner: usize) -> VertexKey {
        let p = self.points[point as usize];
        match self.layout {
            KeyLayout::Position => VertexKey::Position { point: p },
            KeyLayout::PositionNormal => VertexKey::PositionNormal {
                point: p,
                normal: self.normals[self.normal_scope.index(point, corner)],
            },
            KeyLayout::PositionNormalUv => VertexKey::PositionNormalUv {
                point: p,
                normal: self.normals[self.normal_scope.index(point, corner)],
                uv: self.uv[self.uv_scope.index(point, corner)],
            },
            KeyLayout::PositionNormalTangentUv => VertexKey::PositionNormalTangentUv {
                point: p,
                normal: self.normals[self.normal_scope.index(point, corner)],
                tangent: self.tangents[self.tangent_scope.index(point, corner)],
                uv: self.uv[self.uv_scope.index(point, corner)],
            },
            KeyLayout::PositionUv => VertexKey::PositionUv {
                point: p,
                uv: self.uv[self.uv_scope.index(point, corner)],
            },
        }
    }
}

/// Resolve the refined vertex for `corner` (whose point is `point`).
///
/// Scans the corners sharing the point in ascending order; the first one
/// already mapped to a refined vertex with matching values wins. Otherwise a
/// new refined vertex is appended. Either way `corner` is mapped to the
/// result in `old2new`. Cost is bounded by the point's valence.
pub fn find_or_add_vertex(
    connectivity: &Connectivity,
    old2new: &mut [Option<u32>],
    out: &mut RefinedMesh,
    point: u32,
    corner: usize,
    key: &VertexKey,
) -> u32 {
    let found = connectivity
        .corners_of(point)
        .iter()
        .filter_map(|&c| old2new[c as usize])
        .find(|&id| key.matches(out, id as usize));

    let id = match found {
        Some(id) => id,
        None => key.push(out),
    };
    old2new[corner] = Some(id);
    id
}
