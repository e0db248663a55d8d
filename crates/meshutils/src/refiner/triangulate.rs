//! Fan triangulation of polygon index buffers.

/// Number of triangle indices a fan over `counts` produces: `3 * Σ(count - 2)`.
///
/// Faces with fewer than three corners produce no triangles.
pub fn triangulated_len(counts: &[u32]) -> usize {
    counts.iter().map(|&c| (c as usize).saturating_sub(2) * 3).sum()
}

/// Fan-triangulate each polygon from its first corner.
///
/// `indices` is the flat polygon index buffer described by `counts`; `dst`
/// must hold exactly [`triangulated_len`] entries. With `swap_faces` every
/// triangle is emitted with reversed winding. Faces with fewer than three
/// corners are skipped. Returns the number of triangles written.
pub fn triangulate_with_indices(
    dst: &mut [u32],
    counts: &[u32],
    indices: &[u32],
    swap_faces: bool,
) -> usize {
    let (i1, i2) = if swap_faces { (2, 1) } else { (1, 2) };

    let mut offset = 0;
    let mut tris = dst.chunks_exact_mut(3);
    let mut written = 0;
    for &count in counts {
        let face = &indices[offset..offset + count as usize];
        for ti in 0..face.len().saturating_sub(2) {
            let Some(tri) = tris.next() else {
                return written;
            };
            tri[0] = face[0];
            tri[1] = face[ti + i1];
            tri[2] = face[ti + i2];
            written += 1;
        }
        offset += count as usize;
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_fan() {
        let counts = [4];
        let indices = [10, 11, 12, 13];
        let mut dst = vec![0; triangulated_len(&counts)];
        assert_eq!(triangulate_with_indices(&mut dst, &counts, &indices, false), 2);
        assert_eq!(dst, vec![10, 11, 12, 10, 12, 13]);
    }

    #[test]
    fn test_swap_faces_reverses_winding() {
        let counts = [3, 5];
        let indices = [0, 1, 2, 3, 4, 5, 6, 7];
        let mut dst = vec![0; triangulated_len(&counts)];
        assert_eq!(dst.len(), 12);
        assert_eq!(triangulate_with_indices(&mut dst, &counts, &indices, true), 4);
        assert_eq!(dst, vec![0, 2, 1, 3, 5, 4, 3, 6, 5, 3, 7, 6]);
    }

    #[test]
    fn test_short_destination_stops() {
        let counts = [4];
        let indices = [0, 1, 2, 3];
        let mut dst = vec![0; 3];
        assert_eq!(triangulate_with_indices(&mut dst, &counts, &indices, false), 1);
        assert_eq!(dst, vec![0, 1, 2]);
    }

    #[test]
    fn test_short_faces_are_skipped() {
        assert_eq!(triangulated_len(&[0, 1, 2]), 0);
        assert_eq!(triangulated_len(&[1, 4]), 6);

        let counts = [2, 3];
        let indices = [7, 8, 0, 1, 2];
        let mut dst = vec![0; triangulated_len(&counts)];
        assert_eq!(triangulate_with_indices(&mut dst, &counts, &indices, false), 1);
        assert_eq!(dst, vec![0, 1, 2]);
    }
}
