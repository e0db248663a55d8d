//! Polygon soup: points plus a flat corner index buffer.
//!
//! Faces may have any number of corners (three or more). `offsets` is always
//! the prefix sum of `counts`, so face `f` occupies
//! `indices[offsets[f]..offsets[f] + counts[f]]`.

use crate::error::MeshError;
use glam::Vec3;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of version stamps, shared by every soup in the process.
static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

fn next_version() -> u64 {
    NEXT_VERSION.fetch_add(1, Ordering::Relaxed)
}

/// Type-safe face identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceId(pub u32);

/// A validated polygon soup.
///
/// Every mutation through this API changes [`PolygonSoup::version`], which
/// caches derived from the soup (connectivity) compare against.
#[derive(Debug, Clone, Default)]
pub struct PolygonSoup {
    points: Vec<Vec3>,
    counts: Vec<u32>,
    offsets: Vec<u32>,
    indices: Vec<u32>,
    version: u64,
}

impl PolygonSoup {
    /// Build a soup from points, per-face corner counts and the flat index buffer.
    ///
    /// Offsets are derived from `counts`.
    pub fn new(points: Vec<Vec3>, counts: Vec<u32>, indices: Vec<u32>) -> Result<Self, MeshError> {
        let offsets = prefix_sum(&counts);
        validate(&points, &counts, &offsets, &indices)?;
        Ok(Self {
            points,
            counts,
            offsets,
            indices,
            version: next_version(),
        })
    }

    /// Build a soup with caller-supplied offsets, checking them against `counts`.
    pub fn from_raw_parts(
        points: Vec<Vec3>,
        counts: Vec<u32>,
        offsets: Vec<u32>,
        indices: Vec<u32>,
    ) -> Result<Self, MeshError> {
        validate(&points, &counts, &offsets, &indices)?;
        Ok(Self {
            points,
            counts,
            offsets,
            indices,
            version: next_version(),
        })
    }

    /// Build a soup of triangles from a triangle-list index buffer.
    pub fn from_triangles(points: Vec<Vec3>, indices: Vec<u32>) -> Result<Self, MeshError> {
        if indices.len() % 3 != 0 {
            return Err(MeshError::CornerCountMismatch {
                expected: indices.len() / 3 * 3,
                actual: indices.len(),
            });
        }
        let counts = vec![3; indices.len() / 3];
        Self::new(points, counts, indices)
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of points
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Number of faces
    pub fn face_count(&self) -> usize {
        self.counts.len()
    }

    /// Number of corners (length of the index buffer)
    pub fn corner_count(&self) -> usize {
        self.indices.len()
    }

    /// Triangles produced by fan-triangulating every face.
    pub fn triangle_count(&self) -> usize {
        self.counts.iter().map(|&c| (c as usize).saturating_sub(2)).sum()
    }

    /// Version stamp; unique per soup and changes on every mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Point ids of one face, in corner order.
    pub fn face(&self, face: FaceId) -> &[u32] {
        let range = self.face_range(face);
        &self.indices[range]
    }

    /// Corner range of one face within the index buffer.
    pub fn face_range(&self, face: FaceId) -> std::ops::Range<usize> {
        let offset = self.offsets[face.0 as usize] as usize;
        offset..offset + self.counts[face.0 as usize] as usize
    }

    /// Iterate faces as point-id slices.
    pub fn faces(&self) -> impl Iterator<Item = &[u32]> + '_ {
        self.counts
            .iter()
            .zip(&self.offsets)
            .map(|(&count, &offset)| &self.indices[offset as usize..(offset + count) as usize])
    }

    /// Mutable access to positions. Topology stays valid, but the version moves.
    pub fn points_mut(&mut self) -> &mut [Vec3] {
        self.bump();
        &mut self.points
    }

    /// Replace the topology while keeping the points.
    pub fn set_topology(&mut self, counts: Vec<u32>, indices: Vec<u32>) -> Result<(), MeshError> {
        let offsets = prefix_sum(&counts);
        validate(&self.points, &counts, &offsets, &indices)?;
        self.counts = counts;
        self.offsets = offsets;
        self.indices = indices;
        self.bump();
        Ok(())
    }

    /// Replace the points. The new point set must cover every index.
    pub fn set_points(&mut self, points: Vec<Vec3>) -> Result<(), MeshError> {
        validate(&points, &self.counts, &self.offsets, &self.indices)?;
        self.points = points;
        self.bump();
        Ok(())
    }

    fn bump(&mut self) {
        self.version = next_version();
    }
}

fn prefix_sum(counts: &[u32]) -> Vec<u32> {
    let mut offset = 0;
    counts
        .iter()
        .map(|&c| {
            let o = offset;
            offset += c;
            o
        })
        .collect()
}

fn validate(points: &[Vec3], counts: &[u32], offsets: &[u32], indices: &[u32]) -> Result<(), MeshError> {
    if offsets.len() != counts.len() {
        return Err(MeshError::ShapeMismatch {
            expected: counts.len(),
            actual: offsets.len(),
        });
    }

    let mut expected_offset = 0u32;
    for (face, (&count, &offset)) in counts.iter().zip(offsets).enumerate() {
        if count < 3 {
            return Err(MeshError::DegenerateFace { face, count });
        }
        if offset != expected_offset {
            return Err(MeshError::OffsetMismatch {
                face,
                expected: expected_offset,
                actual: offset,
            });
        }
        expected_offset += count;
    }

    if expected_offset as usize != indices.len() {
        return Err(MeshError::CornerCountMismatch {
            expected: expected_offset as usize,
            actual: indices.len(),
        });
    }

    if let Some((corner, &index)) = indices
        .iter()
        .enumerate()
        .find(|&(_, &i)| i as usize >= points.len())
    {
        return Err(MeshError::IndexOutOfRange {
            corner,
            index,
            points: points.len(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_quads() -> PolygonSoup {
        let points = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(2.0, 1.0, 0.0),
        ];
        PolygonSoup::new(points, vec![4, 4], vec![0, 1, 4, 3, 1, 2, 5, 4]).unwrap()
    }

    #[test]
    fn test_offsets_are_prefix_sum() {
        let soup = two_quads();
        assert_eq!(soup.offsets(), &[0, 4]);
        assert_eq!(soup.face(FaceId(1)), &[1, 2, 5, 4]);
        assert_eq!(soup.triangle_count(), 4);
        assert_eq!(soup.faces().count(), 2);
    }

    #[test]
    fn test_rejects_out_of_range_index() {
        let points = vec![Vec3::ZERO; 3];
        let err = PolygonSoup::new(points, vec![3], vec![0, 1, 3]).unwrap_err();
        assert_eq!(
            err,
            MeshError::IndexOutOfRange {
                corner: 2,
                index: 3,
                points: 3
            }
        );
    }

    #[test]
    fn test_rejects_bad_offsets() {
        let points = vec![Vec3::ZERO; 4];
        let err = PolygonSoup::from_raw_parts(points, vec![3, 3], vec![0, 2], vec![0, 1, 2, 1, 2, 3])
            .unwrap_err();
        assert!(matches!(err, MeshError::OffsetMismatch { face: 1, .. }));
    }

    #[test]
    fn test_rejects_short_faces_and_count_mismatch() {
        let points = vec![Vec3::ZERO; 4];
        assert!(matches!(
            PolygonSoup::new(points.clone(), vec![2], vec![0, 1]),
            Err(MeshError::DegenerateFace { face: 0, count: 2 })
        ));
        assert!(matches!(
            PolygonSoup::new(points, vec![3], vec![0, 1, 2, 3]),
            Err(MeshError::CornerCountMismatch { .. })
        ));
    }

    #[test]
    fn test_mutation_bumps_version() {
        let mut soup = two_quads();
        let v0 = soup.version();
        soup.points_mut()[0].z = 1.0;
        assert_ne!(soup.version(), v0);

        let v1 = soup.version();
        soup.set_topology(vec![3, 3], vec![0, 1, 4, 0, 4, 3]).unwrap();
        assert_ne!(soup.version(), v1);
        assert_eq!(soup.point_count(), 6);
    }

    #[test]
    fn test_distinct_soups_get_distinct_versions() {
        let a = two_quads();
        let b = two_quads();
        assert_ne!(a.version(), b.version());

        // A clone describes the same data, so it shares the stamp until mutated
        let mut c = a.clone();
        assert_eq!(c.version(), a.version());
        c.points_mut()[0].x = 5.0;
        assert_ne!(c.version(), a.version());
        assert_ne!(c.version(), b.version());
    }

    #[test]
    fn test_failed_mutation_keeps_version() {
        let mut soup = two_quads();
        let v0 = soup.version();
        assert!(soup.set_points(vec![Vec3::ZERO; 2]).is_err());
        assert_eq!(soup.version(), v0);
        assert_eq!(soup.point_count(), 6);
    }

    #[test]
    fn test_from_triangles() {
        let points = vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::ONE];
        let soup = PolygonSoup::from_triangles(points, vec![0, 1, 2, 1, 3, 2]).unwrap();
        assert_eq!(soup.counts(), &[3, 3]);
        assert_eq!(soup.offsets(), &[0, 3]);
    }
}
