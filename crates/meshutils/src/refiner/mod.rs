//! Topology refinement: dedup, chunk split and triangulation.
//!
//! [`TopologyRefiner`] turns a polygon soup with optional per-point or
//! per-corner attributes into render-ready buffers:
//!
//! 1. **Dedup**: every corner resolves to a refined vertex; corners of the
//!    same point with near-equal attributes share one.
//! 2. **Split**: when a split unit is set, faces are grouped into chunks
//!    holding at most that many refined vertices. Dedup never crosses a chunk
//!    boundary, so seam vertices are duplicated per chunk.
//! 3. **Triangulate**: each chunk's polygons are fan-triangulated with
//!    chunk-relative indices.
//!
//! The soup and attribute arrays are borrowed for the refiner's lifetime.
//! Normals and tangents generated by the refiner replace the borrowed arrays.

pub mod key;
pub mod triangulate;

pub use key::{KeyLayout, NEAR_EQUAL_EPSILON, VertexKey, find_or_add_vertex};
pub use triangulate::{triangulate_with_indices, triangulated_len};

use crate::attribute::AttributeScope;
use crate::bulk::{self, Bounds};
use crate::connectivity::Connectivity;
use crate::error::MeshError;
use crate::format::{self, VertexFormat, VertexStreams};
use crate::normals;
use crate::soup::PolygonSoup;
use crate::tangents::{self, TangentSolver};
use glam::{Vec2, Vec3, Vec4};
use key::KeySource;
use std::borrow::Cow;
use tracing::{debug, trace, warn};

/// Refiner configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefinerSettings {
    /// Fan-triangulate the refined polygons
    pub triangulate: bool,
    /// Reverse triangle winding (only applied when triangulating)
    pub swap_faces: bool,
    /// Maximum refined points per split (0 = unbounded)
    pub split_unit: usize,
}

impl From<&meshsync_config::RefineSettings> for RefinerSettings {
    fn from(settings: &meshsync_config::RefineSettings) -> Self {
        Self {
            triangulate: settings.triangulate,
            swap_faces: settings.effective_swap_faces(),
            split_unit: settings.split_unit as usize,
        }
    }
}

/// One contiguous chunk of the refined output.
///
/// Offsets index the refined faces, points, polygon indices and triangle
/// indices; successive splits are contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Split {
    pub offset_faces: usize,
    pub offset_points: usize,
    pub offset_indices: usize,
    pub offset_indices_triangulated: usize,
    pub num_faces: usize,
    pub num_points: usize,
    pub num_indices: usize,
    pub num_indices_triangulated: usize,
}

impl Split {
    /// Triangles in this split.
    pub fn num_triangles(&self) -> usize {
        self.num_indices_triangulated / 3
    }
}

/// Refined buffers produced by [`TopologyRefiner::refine`].
///
/// `normals`, `uv` and `tangents` are either empty or hold one entry per
/// refined point. Index buffers are chunk-relative.
#[derive(Debug, Clone, Default)]
pub struct RefinedMesh {
    pub(crate) points: Vec<Vec3>,
    pub(crate) normals: Vec<Vec3>,
    pub(crate) uv: Vec<Vec2>,
    pub(crate) tangents: Vec<Vec4>,
    pub(crate) counts: Vec<u32>,
    pub(crate) indices: Vec<u32>,
    pub(crate) indices_triangulated: Vec<u32>,
    pub(crate) splits: Vec<Split>,
    pub(crate) triangulated: bool,
}

impl RefinedMesh {
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn uv(&self) -> &[Vec2] {
        &self.uv
    }

    pub fn tangents(&self) -> &[Vec4] {
        &self.tangents
    }

    /// Corner count of every refined face, in split order.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Polygon index buffer (chunk-relative)
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Triangle index buffer (chunk-relative); empty unless triangulated
    pub fn indices_triangulated(&self) -> &[u32] {
        &self.indices_triangulated
    }

    pub fn splits(&self) -> &[Split] {
        &self.splits
    }

    pub fn is_triangulated(&self) -> bool {
        self.triangulated
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Axis-aligned bounds of the refined points.
    pub fn bounds(&self) -> Option<Bounds> {
        bulk::compute_bounds(&self.points)
    }

    /// Attribute streams of the whole refined mesh.
    pub fn vertex_streams(&self) -> VertexStreams<'_> {
        VertexStreams::new(&self.points, &self.normals)
            .with_uvs(&self.uv)
            .with_tangents(&self.tangents)
    }

    /// Smallest interleaved layout carrying every refined attribute.
    pub fn vertex_format(&self) -> VertexFormat {
        VertexFormat::guess(&self.vertex_streams())
    }

    /// Interleave every refined vertex as `format` records.
    pub fn interleave(&self, format: VertexFormat) -> Result<Vec<u8>, MeshError> {
        format::interleave_to_vec(format, &self.vertex_streams())
    }

    /// Independently indexable sub-meshes, one per split.
    pub fn chunks(&self) -> impl Iterator<Item = RefinedChunk<'_>> + '_ {
        self.splits.iter().map(move |split| self.chunk(split))
    }

    fn chunk(&self, split: &Split) -> RefinedChunk<'_> {
        let points = split.offset_points..split.offset_points + split.num_points;
        let slice_or_empty = |len: usize| if len == 0 { 0..0 } else { points.clone() };
        let indices = if self.triangulated {
            let start = split.offset_indices_triangulated;
            &self.indices_triangulated[start..start + split.num_indices_triangulated]
        } else {
            &self.indices[split.offset_indices..split.offset_indices + split.num_indices]
        };
        RefinedChunk {
            split: *split,
            points: &self.points[points.clone()],
            normals: &self.normals[slice_or_empty(self.normals.len())],
            uv: &self.uv[slice_or_empty(self.uv.len())],
            tangents: &self.tangents[slice_or_empty(self.tangents.len())],
            counts: &self.counts[split.offset_faces..split.offset_faces + split.num_faces],
            indices,
        }
    }
}

/// Borrowed view of one split.
#[derive(Debug, Clone, Copy)]
pub struct RefinedChunk<'m> {
    pub split: Split,
    pub points: &'m [Vec3],
    pub normals: &'m [Vec3],
    pub uv: &'m [Vec2],
    pub tangents: &'m [Vec4],
    /// Corner count per face
    pub counts: &'m [u32],
    /// Triangle indices when triangulated, polygon indices otherwise
    pub indices: &'m [u32],
}

impl RefinedChunk<'_> {
    pub fn vertex_streams(&self) -> VertexStreams<'_> {
        VertexStreams::new(self.points, self.normals)
            .with_uvs(self.uv)
            .with_tangents(self.tangents)
    }
}

/// Deduplicates, splits and triangulates a polygon soup.
///
/// Not safe for concurrent use; run one refiner per mesh.
#[derive(Debug)]
pub struct TopologyRefiner<'a> {
    pub settings: RefinerSettings,
    soup: &'a PolygonSoup,
    normals: Cow<'a, [Vec3]>,
    uv: Cow<'a, [Vec2]>,
    tangents: Cow<'a, [Vec4]>,
    connectivity: Option<Connectivity>,
    old2new: Vec<Option<u32>>,
    output: RefinedMesh,
}

impl<'a> TopologyRefiner<'a> {
    /// Create a refiner over `soup` with default settings and no attributes.
    pub fn new(soup: &'a PolygonSoup) -> Self {
        Self::with_settings(soup, RefinerSettings::default())
    }

    pub fn with_settings(soup: &'a PolygonSoup, settings: RefinerSettings) -> Self {
        Self {
            settings,
            soup,
            normals: Cow::Borrowed(&[]),
            uv: Cow::Borrowed(&[]),
            tangents: Cow::Borrowed(&[]),
            connectivity: None,
            old2new: Vec::new(),
            output: RefinedMesh::default(),
        }
    }

    /// Retarget the refiner at `soup`, dropping attributes, caches and output.
    pub fn prepare(&mut self, soup: &'a PolygonSoup) {
        self.soup = soup;
        self.normals = Cow::Borrowed(&[]);
        self.uv = Cow::Borrowed(&[]);
        self.tangents = Cow::Borrowed(&[]);
        self.connectivity = None;
        self.old2new.clear();
        self.output = RefinedMesh::default();
    }

    pub fn soup(&self) -> &'a PolygonSoup {
        self.soup
    }

    /// Borrow per-point or per-corner normals.
    pub fn set_normals(&mut self, normals: &'a [Vec3]) -> Result<(), MeshError> {
        AttributeScope::resolve("normals", normals.len(), self.soup)?;
        self.normals = Cow::Borrowed(normals);
        Ok(())
    }

    /// Borrow per-point or per-corner texture coordinates.
    pub fn set_uv(&mut self, uv: &'a [Vec2]) -> Result<(), MeshError> {
        AttributeScope::resolve("uv", uv.len(), self.soup)?;
        self.uv = Cow::Borrowed(uv);
        Ok(())
    }

    /// Borrow per-point or per-corner tangents.
    pub fn set_tangents(&mut self, tangents: &'a [Vec4]) -> Result<(), MeshError> {
        AttributeScope::resolve("tangents", tangents.len(), self.soup)?;
        self.tangents = Cow::Borrowed(tangents);
        Ok(())
    }

    /// Current normals (borrowed or generated).
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn uv(&self) -> &[Vec2] {
        &self.uv
    }

    pub fn tangents(&self) -> &[Vec4] {
        &self.tangents
    }

    /// Point → corner adjacency, rebuilt only when the soup changed.
    pub fn connectivity(&mut self) -> &Connectivity {
        current_connectivity(&mut self.connectivity, self.soup)
    }

    /// Generate flat normals (one per point), replacing any supplied normals.
    pub fn gen_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.soup.point_count()];
        // Length matches by construction
        if normals::generate_normals(&mut normals, self.soup).is_ok() {
            self.normals = Cow::Owned(normals);
        }
    }

    /// Generate smoothing-angle normals (one per corner), replacing any
    /// supplied normals.
    pub fn gen_normals_with_angle(&mut self, smooth_angle: f32) -> Result<(), MeshError> {
        let soup = self.soup;
        let connectivity = current_connectivity(&mut self.connectivity, soup);
        let mut normals = vec![Vec3::ZERO; soup.corner_count()];
        normals::generate_normals_with_angle(&mut normals, soup, connectivity, smooth_angle)?;
        self.normals = Cow::Owned(normals);
        Ok(())
    }

    /// Negate the current normals.
    pub fn flip_normals(&mut self) {
        normals::flip_normals(self.normals.to_mut());
    }

    /// Generate tangents with `solver`.
    ///
    /// Tangents get the larger cardinality of normals and uv. On failure the
    /// current tangents are left as they were.
    pub fn gen_tangents(&mut self, solver: &dyn TangentSolver) -> Result<(), MeshError> {
        let len = self.normals.len().max(self.uv.len());
        let mut tangents = vec![Vec4::ZERO; len];
        tangents::generate_tangents(&mut tangents, self.soup, &self.normals, &self.uv, solver)?;
        self.tangents = Cow::Owned(tangents);
        Ok(())
    }

    /// Generate tangents, falling back to zero tangents if the solver fails.
    pub fn gen_tangents_or_zero(&mut self, solver: &dyn TangentSolver) -> Result<(), MeshError> {
        let len = self.normals.len().max(self.uv.len());
        let mut tangents = vec![Vec4::ZERO; len];
        tangents::generate_tangents_or_zero(&mut tangents, self.soup, &self.normals, &self.uv, solver)?;
        self.tangents = Cow::Owned(tangents);
        Ok(())
    }

    /// Pick the vertex key layout from the attribute scopes.
    pub fn key_layout(&self) -> Result<KeyLayout, MeshError> {
        let normals = AttributeScope::resolve("normals", self.normals.len(), self.soup)?;
        let uv = AttributeScope::resolve("uv", self.uv.len(), self.soup)?;
        let tangents = AttributeScope::resolve("tangents", self.tangents.len(), self.soup)?;
        select_layout(normals, uv, tangents)
    }

    /// Deduplicate, split and (optionally) triangulate.
    ///
    /// Previous output is discarded, so repeated calls on an unchanged
    /// refiner give identical results.
    pub fn refine(&mut self) -> Result<(), MeshError> {
        let soup = self.soup;
        let normal_scope = AttributeScope::resolve("normals", self.normals.len(), soup)?;
        let uv_scope = AttributeScope::resolve("uv", self.uv.len(), soup)?;
        let tangent_scope = AttributeScope::resolve("tangents", self.tangents.len(), soup)?;
        let layout = select_layout(normal_scope, uv_scope, tangent_scope)?;

        let connectivity = current_connectivity(&mut self.connectivity, soup);

        let source = KeySource {
            layout,
            points: soup.points(),
            normals: &self.normals,
            uv: &self.uv,
            tangents: &self.tangents,
            normal_scope,
            uv_scope,
            tangent_scope,
        };

        let out = &mut self.output;
        *out = RefinedMesh::default();
        let num_corners = soup.corner_count();
        out.points.reserve(num_corners);
        out.indices.reserve(num_corners);
        out.counts.extend_from_slice(soup.counts());
        out.splits.push(Split::default());

        let old2new = &mut self.old2new;
        old2new.clear();
        old2new.resize(num_corners, None);

        let split_unit = self.settings.split_unit;
        for (fi, face) in soup.faces().enumerate() {
            let offset = soup.offsets()[fi] as usize;
            let count = face.len();

            let current = out.splits.len() - 1;
            if split_unit > 0 && out.points.len() - out.splits[current].offset_points + count > split_unit {
                let prev = &mut out.splits[current];
                prev.num_points = out.points.len() - prev.offset_points;
                prev.num_indices = out.indices.len() - prev.offset_indices;
                trace!(
                    "refine: closing split {} ({} faces, {} points)",
                    current, prev.num_faces, prev.num_points
                );
                let next = Split {
                    offset_faces: prev.offset_faces + prev.num_faces,
                    offset_points: prev.offset_points + prev.num_points,
                    offset_indices: prev.offset_indices + prev.num_indices,
                    offset_indices_triangulated: prev.offset_indices_triangulated
                        + prev.num_indices_triangulated,
                    ..Split::default()
                };
                out.splits.push(next);
                old2new.fill(None);
            }

            let offset_points = out.splits[out.splits.len() - 1].offset_points;
            for (ci, &vi) in face.iter().enumerate() {
                let corner = offset + ci;
                let key = source.key(vi, corner);
                let id = find_or_add_vertex(connectivity, old2new, out, vi, corner, &key);
                out.indices.push(id - offset_points as u32);
            }

            if let Some(split) = out.splits.last_mut() {
                split.num_faces += 1;
                split.num_indices_triangulated += count.saturating_sub(2) * 3;
            }
        }

        if let Some(last) = out.splits.last_mut() {
            last.num_points = out.points.len() - last.offset_points;
            last.num_indices = out.indices.len() - last.offset_indices;
        }

        if self.settings.triangulate {
            let total: usize = out.splits.iter().map(|s| s.num_indices_triangulated).sum();
            out.indices_triangulated = vec![0; total];
            for split in &out.splits {
                let dst = &mut out.indices_triangulated[split.offset_indices_triangulated
                    ..split.offset_indices_triangulated + split.num_indices_triangulated];
                triangulate_with_indices(
                    dst,
                    &out.counts[split.offset_faces..split.offset_faces + split.num_faces],
                    &out.indices[split.offset_indices..split.offset_indices + split.num_indices],
                    self.settings.swap_faces,
                );
            }
            out.triangulated = true;
        } else if self.settings.swap_faces {
            warn!("refine: swap_faces without triangulation leaves winding unchanged");
        }

        debug!(
            "refine: {:?}, {} corners -> {} points in {} splits",
            layout,
            num_corners,
            out.points.len(),
            out.splits.len()
        );
        Ok(())
    }

    /// Refined output of the last [`TopologyRefiner::refine`] call.
    pub fn output(&self) -> &RefinedMesh {
        &self.output
    }

    /// Take the refined output, leaving an empty one behind.
    pub fn take_output(&mut self) -> RefinedMesh {
        std::mem::take(&mut self.output)
    }

    pub fn new_points(&self) -> &[Vec3] {
        &self.output.points
    }

    pub fn new_normals(&self) -> &[Vec3] {
        &self.output.normals
    }

    pub fn new_uv(&self) -> &[Vec2] {
        &self.output.uv
    }

    pub fn new_tangents(&self) -> &[Vec4] {
        &self.output.tangents
    }

    pub fn new_indices(&self) -> &[u32] {
        &self.output.indices
    }

    pub fn new_indices_triangulated(&self) -> &[u32] {
        &self.output.indices_triangulated
    }

    pub fn splits(&self) -> &[Split] {
        &self.output.splits
    }

    /// Corner → refined vertex map of the last split processed.
    pub fn old2new(&self) -> &[Option<u32>] {
        &self.old2new
    }
}

/// The cached table in `slot`, rebuilt first if it no longer describes `soup`.
fn current_connectivity<'c>(slot: &'c mut Option<Connectivity>, soup: &PolygonSoup) -> &'c Connectivity {
    if slot.as_ref().is_some_and(|c| !c.is_current(soup)) {
        *slot = None;
    }
    slot.get_or_insert_with(|| {
        debug!(
            "build_connection: {} points, {} corners",
            soup.point_count(),
            soup.corner_count()
        );
        Connectivity::build(soup)
    })
}

fn select_layout(
    normals: AttributeScope,
    uv: AttributeScope,
    tangents: AttributeScope,
) -> Result<KeyLayout, MeshError> {
    match (normals.is_present(), uv.is_present(), tangents.is_present()) {
        (false, false, false) => Ok(KeyLayout::Position),
        (true, false, false) => Ok(KeyLayout::PositionNormal),
        (true, true, false) => Ok(KeyLayout::PositionNormalUv),
        (true, true, true) => Ok(KeyLayout::PositionNormalTangentUv),
        (false, true, false) => Ok(KeyLayout::PositionUv),
        _ => Err(MeshError::UnsupportedAttributeLayout(format!(
            "tangents ({tangents:?}) require normals ({normals:?}) and uv ({uv:?})"
        ))),
    }
}
