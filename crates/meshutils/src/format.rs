//! Interleaved vertex buffers.
//!
//! Refined meshes are stored as separate attribute streams. GPU upload wants
//! one record per vertex, so [`interleave`] transposes the streams into a
//! packed byte buffer using one of a closed set of layouts.

use crate::error::MeshError;
use glam::{Vec2, Vec3, Vec4};

/// Interleaved vertex layouts. Record fields are always ordered
/// position, normal, color, uv, tangent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexFormat {
    #[default]
    Unknown,
    V3N3,
    V3N3C4,
    V3N3U2,
    V3N3C4U2,
    V3N3U2T4,
    V3N3C4U2T4,
}

/// Attribute streams to interleave. Every present stream holds one entry
/// per vertex.
#[derive(Debug, Clone, Copy, Default)]
pub struct VertexStreams<'a> {
    pub points: &'a [Vec3],
    pub normals: &'a [Vec3],
    pub colors: Option<&'a [Vec4]>,
    pub uvs: Option<&'a [Vec2]>,
    pub tangents: Option<&'a [Vec4]>,
}

impl<'a> VertexStreams<'a> {
    pub fn new(points: &'a [Vec3], normals: &'a [Vec3]) -> Self {
        Self {
            points,
            normals,
            ..Self::default()
        }
    }

    pub fn with_colors(mut self, colors: &'a [Vec4]) -> Self {
        self.colors = Some(colors).filter(|c| !c.is_empty());
        self
    }

    pub fn with_uvs(mut self, uvs: &'a [Vec2]) -> Self {
        self.uvs = Some(uvs).filter(|u| !u.is_empty());
        self
    }

    pub fn with_tangents(mut self, tangents: &'a [Vec4]) -> Self {
        self.tangents = Some(tangents).filter(|t| !t.is_empty());
        self
    }

    /// Number of vertices (the position count).
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl VertexFormat {
    /// Smallest layout that carries every present stream.
    ///
    /// Positions and normals are mandatory. Tangents are only carried
    /// together with uvs.
    pub fn guess(streams: &VertexStreams<'_>) -> Self {
        if streams.points.is_empty() || streams.normals.is_empty() {
            return Self::Unknown;
        }
        match (streams.colors.is_some(), streams.uvs.is_some(), streams.tangents.is_some()) {
            (true, true, true) => Self::V3N3C4U2T4,
            (true, true, false) => Self::V3N3C4U2,
            (false, true, true) => Self::V3N3U2T4,
            (false, true, false) => Self::V3N3U2,
            (true, false, _) => Self::V3N3C4,
            (false, false, _) => Self::V3N3,
        }
    }

    /// Record size in bytes; 0 for [`VertexFormat::Unknown`].
    pub fn vertex_size(self) -> usize {
        match self {
            Self::Unknown => 0,
            Self::V3N3 => size_of::<VertexV3N3>(),
            Self::V3N3C4 => size_of::<VertexV3N3C4>(),
            Self::V3N3U2 => size_of::<VertexV3N3U2>(),
            Self::V3N3C4U2 => size_of::<VertexV3N3C4U2>(),
            Self::V3N3U2T4 => size_of::<VertexV3N3U2T4>(),
            Self::V3N3C4U2T4 => size_of::<VertexV3N3C4U2T4>(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct VertexV3N3 {
    pub p: [f32; 3],
    pub n: [f32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct VertexV3N3C4 {
    pub p: [f32; 3],
    pub n: [f32; 3],
    pub c: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct VertexV3N3U2 {
    pub p: [f32; 3],
    pub n: [f32; 3],
    pub u: [f32; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct VertexV3N3C4U2 {
    pub p: [f32; 3],
    pub n: [f32; 3],
    pub c: [f32; 4],
    pub u: [f32; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct VertexV3N3U2T4 {
    pub p: [f32; 3],
    pub n: [f32; 3],
    pub u: [f32; 2],
    pub t: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct VertexV3N3C4U2T4 {
    pub p: [f32; 3],
    pub n: [f32; 3],
    pub c: [f32; 4],
    pub u: [f32; 2],
    pub t: [f32; 4],
}

/// Gathers one record from the streams. Callers check stream lengths first.
trait VertexRecord: bytemuck::Pod {
    fn gather(streams: &Resolved<'_>, i: usize) -> Self;
}

/// Streams after length checks; absent optional streams are empty.
struct Resolved<'a> {
    points: &'a [Vec3],
    normals: &'a [Vec3],
    colors: &'a [Vec4],
    uvs: &'a [Vec2],
    tangents: &'a [Vec4],
}

impl VertexRecord for VertexV3N3 {
    fn gather(s: &Resolved<'_>, i: usize) -> Self {
        Self {
            p: s.points[i].to_array(),
            n: s.normals[i].to_array(),
        }
    }
}

impl VertexRecord for VertexV3N3C4 {
    fn gather(s: &Resolved<'_>, i: usize) -> Self {
        Self {
            p: s.points[i].to_array(),
            n: s.normals[i].to_array(),
            c: s.colors[i].to_array(),
        }
    }
}

impl VertexRecord for VertexV3N3U2 {
    fn gather(s: &Resolved<'_>, i: usize) -> Self {
        Self {
            p: s.points[i].to_array(),
            n: s.normals[i].to_array(),
            u: s.uvs[i].to_array(),
        }
    }
}

impl VertexRecord for VertexV3N3C4U2 {
    fn gather(s: &Resolved<'_>, i: usize) -> Self {
        Self {
            p: s.points[i].to_array(),
            n: s.normals[i].to_array(),
            c: s.colors[i].to_array(),
            u: s.uvs[i].to_array(),
        }
    }
}

impl VertexRecord for VertexV3N3U2T4 {
    fn gather(s: &Resolved<'_>, i: usize) -> Self {
        Self {
            p: s.points[i].to_array(),
            n: s.normals[i].to_array(),
            u: s.uvs[i].to_array(),
            t: s.tangents[i].to_array(),
        }
    }
}

impl VertexRecord for VertexV3N3C4U2T4 {
    fn gather(s: &Resolved<'_>, i: usize) -> Self {
        Self {
            p: s.points[i].to_array(),
            n: s.normals[i].to_array(),
            c: s.colors[i].to_array(),
            u: s.uvs[i].to_array(),
            t: s.tangents[i].to_array(),
        }
    }
}

fn check_stream(len: usize, expected: usize) -> Result<(), MeshError> {
    if len < expected {
        return Err(MeshError::ShapeMismatch {
            expected,
            actual: len,
        });
    }
    Ok(())
}

fn pack<V: VertexRecord>(dst: &mut [u8], streams: &Resolved<'_>) {
    for (i, record) in dst.chunks_exact_mut(size_of::<V>()).enumerate() {
        record.copy_from_slice(bytemuck::bytes_of(&V::gather(streams, i)));
    }
}

/// Pack `streams` into `dst` as `format` records.
///
/// `dst` must hold at least `streams.len() * format.vertex_size()` bytes;
/// only that prefix is written. Every stream the format uses must be at
/// least as long as the position stream.
pub fn interleave(
    dst: &mut [u8],
    format: VertexFormat,
    streams: &VertexStreams<'_>,
) -> Result<(), MeshError> {
    let size = format.vertex_size();
    if size == 0 {
        return Err(MeshError::UnknownVertexFormat);
    }
    let num = streams.len();
    let required = num * size;
    if dst.len() < required {
        return Err(MeshError::BufferTooSmall {
            required,
            actual: dst.len(),
        });
    }

    let resolved = Resolved {
        points: streams.points,
        normals: streams.normals,
        colors: streams.colors.unwrap_or_default(),
        uvs: streams.uvs.unwrap_or_default(),
        tangents: streams.tangents.unwrap_or_default(),
    };
    check_stream(resolved.normals.len(), num)?;
    let (colors, uvs, tangents) = match format {
        VertexFormat::V3N3C4 => (true, false, false),
        VertexFormat::V3N3U2 => (false, true, false),
        VertexFormat::V3N3C4U2 => (true, true, false),
        VertexFormat::V3N3U2T4 => (false, true, true),
        VertexFormat::V3N3C4U2T4 => (true, true, true),
        _ => (false, false, false),
    };
    if colors {
        check_stream(resolved.colors.len(), num)?;
    }
    if uvs {
        check_stream(resolved.uvs.len(), num)?;
    }
    if tangents {
        check_stream(resolved.tangents.len(), num)?;
    }

    let dst = &mut dst[..required];
    match format {
        VertexFormat::Unknown => return Err(MeshError::UnknownVertexFormat),
        VertexFormat::V3N3 => pack::<VertexV3N3>(dst, &resolved),
        VertexFormat::V3N3C4 => pack::<VertexV3N3C4>(dst, &resolved),
        VertexFormat::V3N3U2 => pack::<VertexV3N3U2>(dst, &resolved),
        VertexFormat::V3N3C4U2 => pack::<VertexV3N3C4U2>(dst, &resolved),
        VertexFormat::V3N3U2T4 => pack::<VertexV3N3U2T4>(dst, &resolved),
        VertexFormat::V3N3C4U2T4 => pack::<VertexV3N3C4U2T4>(dst, &resolved),
    }
    Ok(())
}

/// Allocate and fill an interleaved buffer.
pub fn interleave_to_vec(format: VertexFormat, streams: &VertexStreams<'_>) -> Result<Vec<u8>, MeshError> {
    let mut dst = vec![0u8; streams.len() * format.vertex_size()];
    interleave(&mut dst, format, streams)?;
    Ok(dst)
}
