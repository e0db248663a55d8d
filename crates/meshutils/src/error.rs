//! Error types for mesh refinement.

/// Errors that can occur while building, generating or refining mesh data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    #[error("Destination holds {actual} elements, expected {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("{attribute} has {len} elements; expected {points} (per point) or {corners} (per corner)")]
    AttributeLength {
        attribute: &'static str,
        len: usize,
        points: usize,
        corners: usize,
    },

    #[error("Corner {corner} references point {index}, but only {points} points exist")]
    IndexOutOfRange {
        corner: usize,
        index: u32,
        points: usize,
    },

    #[error("Face {face} starts at offset {actual}, expected {expected}")]
    OffsetMismatch {
        face: usize,
        expected: u32,
        actual: u32,
    },

    #[error("Face {face} has {count} corners (minimum is 3)")]
    DegenerateFace { face: usize, count: u32 },

    #[error("Face counts sum to {expected} corners, but {actual} indices were supplied")]
    CornerCountMismatch { expected: usize, actual: usize },

    #[error("Connectivity was built for soup version {built}, but the soup is at version {current}")]
    StaleConnectivity { built: u64, current: u64 },

    #[error("Unsupported attribute layout: {0}")]
    UnsupportedAttributeLayout(String),

    #[error("Tangent solver failed")]
    TangentSolverFailed,

    #[error("Vertex format is unknown")]
    UnknownVertexFormat,

    #[error("Destination buffer holds {actual} bytes, {required} required")]
    BufferTooSmall { required: usize, actual: usize },
}
