//! Tangent generation through a pluggable tangent-space solver.
//!
//! The solver only sees a [`TangentGeometry`]: face and corner counts,
//! per-(face, corner) position/normal/uv getters and a tangent setter.
//! [`TangentContext`] implements it over a polygon soup, resolving each
//! attribute through its own scope (per point or per corner).
//!
//! Tangents are written as `(x, y, z, w)` where `w` is `+1` when the
//! tangent basis preserves orientation and `-1` when it is mirrored.

use crate::attribute::AttributeScope;
use crate::error::MeshError;
use crate::soup::PolygonSoup;
use glam::{Vec2, Vec3, Vec4};
use tracing::{debug, warn};

/// Mesh data as seen by a tangent-space solver.
pub trait TangentGeometry {
    fn num_faces(&self) -> usize;
    fn num_vertices_of_face(&self, face: usize) -> usize;
    fn position(&self, face: usize, vert: usize) -> [f32; 3];
    fn normal(&self, face: usize, vert: usize) -> [f32; 3];
    fn tex_coord(&self, face: usize, vert: usize) -> [f32; 2];
    /// Store `(tangent.xyz, sign)` for one corner.
    fn set_tangent(&mut self, tangent: [f32; 4], face: usize, vert: usize);
}

/// A tangent-space algorithm.
pub trait TangentSolver {
    /// Compute tangents for every corner of `geometry`, returning `false` on failure.
    fn solve(&self, geometry: &mut dyn TangentGeometry) -> bool;
}

/// Solver backed by the `mikktspace` crate.
///
/// MikkTSpace only handles triangles and quads; corners of larger polygons
/// are left untouched (zero).
#[cfg(feature = "mikktspace")]
#[derive(Debug, Clone, Copy, Default)]
pub struct MikkTSpace;

#[cfg(feature = "mikktspace")]
impl TangentSolver for MikkTSpace {
    fn solve(&self, geometry: &mut dyn TangentGeometry) -> bool {
        mikktspace::generate_tangents(&mut MikkAdapter(geometry))
    }
}

#[cfg(feature = "mikktspace")]
struct MikkAdapter<'g>(&'g mut dyn TangentGeometry);

#[cfg(feature = "mikktspace")]
impl mikktspace::Geometry for MikkAdapter<'_> {
    fn num_faces(&self) -> usize {
        self.0.num_faces()
    }

    fn num_vertices_of_face(&self, face: usize) -> usize {
        self.0.num_vertices_of_face(face)
    }

    fn position(&self, face: usize, vert: usize) -> [f32; 3] {
        self.0.position(face, vert)
    }

    fn normal(&self, face: usize, vert: usize) -> [f32; 3] {
        self.0.normal(face, vert)
    }

    fn tex_coord(&self, face: usize, vert: usize) -> [f32; 2] {
        self.0.tex_coord(face, vert)
    }

    fn set_tangent_encoded(&mut self, tangent: [f32; 4], face: usize, vert: usize) {
        self.0.set_tangent(tangent, face, vert);
    }
}

/// Solver that always fails; used when no tangent backend is compiled in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTangentSolver;

impl TangentSolver for NoTangentSolver {
    fn solve(&self, _geometry: &mut dyn TangentGeometry) -> bool {
        false
    }
}

/// The solver used when the caller does not inject one.
pub fn default_solver() -> Box<dyn TangentSolver + Send + Sync> {
    #[cfg(feature = "mikktspace")]
    {
        Box::new(MikkTSpace)
    }
    #[cfg(not(feature = "mikktspace"))]
    {
        Box::new(NoTangentSolver)
    }
}

/// [`TangentGeometry`] over a polygon soup and its attribute arrays.
pub struct TangentContext<'a> {
    soup: &'a PolygonSoup,
    normals: &'a [Vec3],
    uv: &'a [Vec2],
    dst: &'a mut [Vec4],
    normal_scope: AttributeScope,
    uv_scope: AttributeScope,
    dst_scope: AttributeScope,
}

impl<'a> TangentContext<'a> {
    pub fn new(
        dst: &'a mut [Vec4],
        soup: &'a PolygonSoup,
        normals: &'a [Vec3],
        uv: &'a [Vec2],
    ) -> Result<Self, MeshError> {
        let normal_scope = AttributeScope::resolve("normals", normals.len(), soup)?;
        let uv_scope = AttributeScope::resolve("uv", uv.len(), soup)?;
        let dst_scope = AttributeScope::resolve("tangents", dst.len(), soup)?;

        if !normal_scope.is_present() || !uv_scope.is_present() {
            return Err(MeshError::UnsupportedAttributeLayout(
                "tangents need both normals and uv".to_string(),
            ));
        }
        if !dst_scope.is_present() {
            return Err(MeshError::ShapeMismatch {
                expected: soup.corner_count(),
                actual: 0,
            });
        }

        Ok(Self {
            soup,
            normals,
            uv,
            dst,
            normal_scope,
            uv_scope,
            dst_scope,
        })
    }

    #[inline]
    fn corner(&self, face: usize, vert: usize) -> (u32, usize) {
        let corner = self.soup.offsets()[face] as usize + vert;
        (self.soup.indices()[corner], corner)
    }
}

impl TangentGeometry for TangentContext<'_> {
    fn num_faces(&self) -> usize {
        self.soup.face_count()
    }

    fn num_vertices_of_face(&self, face: usize) -> usize {
        self.soup.counts()[face] as usize
    }

    fn position(&self, face: usize, vert: usize) -> [f32; 3] {
        let (point, _) = self.corner(face, vert);
        self.soup.points()[point as usize].to_array()
    }

    fn normal(&self, face: usize, vert: usize) -> [f32; 3] {
        let (point, corner) = self.corner(face, vert);
        self.normals[self.normal_scope.index(point, corner)].to_array()
    }

    fn tex_coord(&self, face: usize, vert: usize) -> [f32; 2] {
        let (point, corner) = self.corner(face, vert);
        self.uv[self.uv_scope.index(point, corner)].to_array()
    }

    fn set_tangent(&mut self, tangent: [f32; 4], face: usize, vert: usize) {
        let (point, corner) = self.corner(face, vert);
        self.dst[self.dst_scope.index(point, corner)] = Vec4::from_array(tangent);
    }
}

/// Generate tangents into `dst` (one per point or one per corner).
///
/// `dst` is cleared first. On solver failure the recommended recovery is to
/// keep the zero tangents and carry on; see [`generate_tangents_or_zero`].
pub fn generate_tangents(
    dst: &mut [Vec4],
    soup: &PolygonSoup,
    normals: &[Vec3],
    uv: &[Vec2],
    solver: &dyn TangentSolver,
) -> Result<(), MeshError> {
    dst.fill(Vec4::ZERO);
    let mut context = TangentContext::new(dst, soup, normals, uv)?;
    if !solver.solve(&mut context) {
        return Err(MeshError::TangentSolverFailed);
    }
    debug!(
        "generate_tangents: {} tangents over {} faces",
        dst.len(),
        soup.face_count()
    );
    Ok(())
}

/// Like [`generate_tangents`], but a solver failure leaves zero tangents.
///
/// Layout errors are still reported.
pub fn generate_tangents_or_zero(
    dst: &mut [Vec4],
    soup: &PolygonSoup,
    normals: &[Vec3],
    uv: &[Vec2],
    solver: &dyn TangentSolver,
) -> Result<(), MeshError> {
    match generate_tangents(dst, soup, normals, uv, solver) {
        Err(MeshError::TangentSolverFailed) => {
            warn!("generate_tangents: solver failed, falling back to zero tangents");
            dst.fill(Vec4::ZERO);
            Ok(())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Writes `(face, vert, 0, +1)` into every corner.
    struct StampSolver;

    impl TangentSolver for StampSolver {
        fn solve(&self, geometry: &mut dyn TangentGeometry) -> bool {
            for f in 0..geometry.num_faces() {
                for v in 0..geometry.num_vertices_of_face(f) {
                    geometry.set_tangent([f as f32, v as f32, 0.0, 1.0], f, v);
                }
            }
            true
        }
    }

    /// Records what the solver sees, then writes nothing.
    struct InspectSolver {
        expected_uv: [f32; 2],
    }

    impl TangentSolver for InspectSolver {
        fn solve(&self, geometry: &mut dyn TangentGeometry) -> bool {
            geometry.tex_coord(1, 2) == self.expected_uv && geometry.position(1, 0) == [1.0, 0.0, 0.0]
        }
    }

    fn two_triangles() -> PolygonSoup {
        let points = vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::new(1.0, 1.0, 0.0)];
        PolygonSoup::new(points, vec![3, 3], vec![0, 1, 2, 1, 3, 2]).unwrap()
    }

    #[test]
    fn test_per_corner_destination() {
        let soup = two_triangles();
        let normals = vec![Vec3::Z; 4];
        let uv = vec![Vec2::ZERO; 6];
        let mut tangents = vec![Vec4::ONE; 6];
        generate_tangents(&mut tangents, &soup, &normals, &uv, &StampSolver).unwrap();
        assert_eq!(tangents[4], Vec4::new(1.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn test_per_point_destination() {
        let soup = two_triangles();
        let normals = vec![Vec3::Z; 6];
        let uv = vec![Vec2::ZERO; 4];
        let mut tangents = vec![Vec4::ZERO; 4];
        generate_tangents(&mut tangents, &soup, &normals, &uv, &StampSolver).unwrap();
        // Point 3 only appears in face 1, corner 1
        assert_eq!(tangents[3], Vec4::new(1.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn test_getters_follow_scope() {
        let soup = two_triangles();
        let normals = vec![Vec3::Z; 4];

        // Per corner: face 1 corner 2 is flat corner 5
        let uv: Vec<Vec2> = (0..6).map(|i| Vec2::new(i as f32, 0.0)).collect();
        let mut tangents = vec![Vec4::ZERO; 6];
        let inspect = InspectSolver { expected_uv: [5.0, 0.0] };
        assert!(generate_tangents(&mut tangents, &soup, &normals, &uv, &inspect).is_ok());

        // Per point: face 1 corner 2 is point 2
        let uv: Vec<Vec2> = (0..4).map(|i| Vec2::new(i as f32, 0.0)).collect();
        let inspect = InspectSolver { expected_uv: [2.0, 0.0] };
        assert!(generate_tangents(&mut tangents, &soup, &normals, &uv, &inspect).is_ok());
    }

    #[test]
    fn test_solver_failure() {
        let soup = two_triangles();
        let normals = vec![Vec3::Z; 4];
        let uv = vec![Vec2::ZERO; 4];
        let mut tangents = vec![Vec4::ONE; 4];
        assert_eq!(
            generate_tangents(&mut tangents, &soup, &normals, &uv, &NoTangentSolver),
            Err(MeshError::TangentSolverFailed)
        );

        generate_tangents_or_zero(&mut tangents, &soup, &normals, &uv, &NoTangentSolver).unwrap();
        assert!(tangents.iter().all(|t| *t == Vec4::ZERO));
    }

    #[test]
    fn test_requires_normals_and_uv() {
        let soup = two_triangles();
        let mut tangents = vec![Vec4::ZERO; 4];
        let err = generate_tangents(&mut tangents, &soup, &[], &[Vec2::ZERO; 4], &StampSolver)
            .unwrap_err();
        assert!(matches!(err, MeshError::UnsupportedAttributeLayout(_)));
    }

    #[cfg(feature = "mikktspace")]
    #[test]
    fn test_mikktspace_planar_quad() {
        let points = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let soup = PolygonSoup::new(points.clone(), vec![4], vec![0, 1, 2, 3]).unwrap();
        let normals = vec![Vec3::Z; 4];
        let uv: Vec<Vec2> = points.iter().map(|p| p.truncate()).collect();
        let mut tangents = vec![Vec4::ZERO; 4];

        generate_tangents(&mut tangents, &soup, &normals, &uv, &MikkTSpace).unwrap();
        for t in &tangents {
            // u runs along +X with an unmirrored basis
            assert!((t.truncate() - Vec3::X).length() < 1e-4);
            assert_eq!(t.w, 1.0);
        }
    }

    #[cfg(feature = "mikktspace")]
    #[test]
    fn test_mikktspace_mirrored_uv_flips_sign() {
        let points = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let soup = PolygonSoup::new(points.clone(), vec![4], vec![0, 1, 2, 3]).unwrap();
        let normals = vec![Vec3::Z; 4];
        // u runs along -X: the basis is mirrored
        let uv: Vec<Vec2> = points.iter().map(|p| Vec2::new(1.0 - p.x, p.y)).collect();
        let mut tangents = vec![Vec4::ZERO; 4];

        generate_tangents(&mut tangents, &soup, &normals, &uv, &MikkTSpace).unwrap();
        for t in &tangents {
            assert!((t.truncate() - Vec3::NEG_X).length() < 1e-4, "tangent {t:?}");
            assert_eq!(t.w, -1.0);
        }
    }
}
