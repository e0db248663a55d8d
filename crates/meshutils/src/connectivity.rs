//! Point → corner adjacency for a polygon soup.
//!
//! Built in three linear passes: count corners per point, prefix-sum the
//! counts into offsets, then scatter every corner using a per-point write
//! cursor. Corners of one point are therefore stored in ascending corner
//! order, which is what makes first-match dedup deterministic.

use crate::soup::{FaceId, PolygonSoup};

/// Per point, the (face, corner) occurrences referencing it.
#[derive(Debug, Clone, Default)]
pub struct Connectivity {
    counts: Vec<u32>,
    offsets: Vec<u32>,
    faces: Vec<u32>,
    corners: Vec<u32>,
    /// Soup version this table was built from
    version: u64,
}

impl Connectivity {
    /// Build the table for `soup`.
    pub fn build(soup: &PolygonSoup) -> Self {
        let num_points = soup.point_count();
        let num_corners = soup.corner_count();

        let mut counts = vec![0u32; num_points];
        for &vi in soup.indices() {
            counts[vi as usize] += 1;
        }

        let mut offsets = Vec::with_capacity(num_points);
        let mut offset = 0u32;
        for &c in &counts {
            offsets.push(offset);
            offset += c;
        }

        let mut cursor = vec![0u32; num_points];
        let mut faces = vec![0u32; num_corners];
        let mut corners = vec![0u32; num_corners];
        for (fi, face) in soup.faces().enumerate() {
            let base = soup.offsets()[fi];
            for (ci, &vi) in face.iter().enumerate() {
                let vi = vi as usize;
                let slot = (offsets[vi] + cursor[vi]) as usize;
                cursor[vi] += 1;
                faces[slot] = fi as u32;
                corners[slot] = base + ci as u32;
            }
        }

        Self {
            counts,
            offsets,
            faces,
            corners,
            version: soup.version(),
        }
    }

    /// Whether this table still describes `soup`.
    pub fn is_current(&self, soup: &PolygonSoup) -> bool {
        self.version == soup.version()
            && self.counts.len() == soup.point_count()
            && self.corners.len() == soup.corner_count()
    }

    /// Version of the soup this table was built from.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of corners referencing `point`.
    pub fn valence(&self, point: u32) -> usize {
        self.counts[point as usize] as usize
    }

    /// Flat corner indices referencing `point`, ascending.
    pub fn corners_of(&self, point: u32) -> &[u32] {
        &self.corners[self.range(point)]
    }

    /// Faces referencing `point`, one entry per corner.
    pub fn faces_of(&self, point: u32) -> impl Iterator<Item = FaceId> + '_ {
        self.faces[self.range(point)].iter().map(|&f| FaceId(f))
    }

    /// Face ids as raw indices, parallel to [`Connectivity::corners_of`].
    pub(crate) fn face_indices_of(&self, point: u32) -> &[u32] {
        &self.faces[self.range(point)]
    }

    pub fn point_count(&self) -> usize {
        self.counts.len()
    }

    fn range(&self, point: u32) -> std::ops::Range<usize> {
        let start = self.offsets[point as usize] as usize;
        start..start + self.counts[point as usize] as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn fan() -> PolygonSoup {
        // Three triangles around point 0
        let points = vec![
            Vec3::ZERO,
            Vec3::X,
            Vec3::Y,
            Vec3::NEG_X,
            Vec3::NEG_Y,
        ];
        PolygonSoup::new(points, vec![3, 3, 3], vec![0, 1, 2, 0, 2, 3, 0, 3, 4]).unwrap()
    }

    #[test]
    fn test_counts_and_corners() {
        let soup = fan();
        let conn = Connectivity::build(&soup);

        assert_eq!(conn.point_count(), 5);
        assert_eq!(conn.valence(0), 3);
        assert_eq!(conn.corners_of(0), &[0, 3, 6]);
        assert_eq!(conn.valence(2), 2);
        assert_eq!(conn.corners_of(2), &[2, 4]);
        assert_eq!(conn.valence(4), 1);

        let faces: Vec<FaceId> = conn.faces_of(3).collect();
        assert_eq!(faces, vec![FaceId(1), FaceId(2)]);
    }

    #[test]
    fn test_every_corner_listed_once() {
        let soup = fan();
        let conn = Connectivity::build(&soup);

        let mut seen = vec![false; soup.corner_count()];
        for p in 0..soup.point_count() as u32 {
            for &corner in conn.corners_of(p) {
                assert_eq!(soup.indices()[corner as usize], p);
                assert!(!seen[corner as usize]);
                seen[corner as usize] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_unreferenced_point_has_no_corners() {
        let points = vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z];
        let soup = PolygonSoup::new(points, vec![3], vec![0, 1, 2]).unwrap();
        let conn = Connectivity::build(&soup);
        assert_eq!(conn.valence(3), 0);
        assert!(conn.corners_of(3).is_empty());
    }

    #[test]
    fn test_staleness_tracks_version() {
        let mut soup = fan();
        let conn = Connectivity::build(&soup);
        assert!(conn.is_current(&soup));

        // Same point count, different topology
        soup.set_topology(vec![3, 3, 3], vec![0, 2, 1, 0, 3, 2, 0, 4, 3]).unwrap();
        assert!(!conn.is_current(&soup));
    }
}
