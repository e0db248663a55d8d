//! Meshsync mesh utilities - polygon soup refinement for real-time rendering
//!
//! Turns an arbitrary polygon soup into render-ready chunks:
//! - [`soup::PolygonSoup`] - Validated points/counts/offsets/indices
//! - [`connectivity`] - Point to corner adjacency
//! - [`normals`] - Flat and smoothing-angle normal generation
//! - [`tangents`] - Tangent generation behind a pluggable solver
//! - [`refiner::TopologyRefiner`] - Dedup, chunk split and triangulation
//! - [`format`] - Interleaved vertex layouts (GPU-compatible with bytemuck)
//! - [`bulk`] - Element-wise transforms over attribute arrays
//! - [`pipeline`] - Complete refine pipeline driven by `meshsync-config`

pub mod attribute;
pub mod bulk;
pub mod connectivity;
pub mod error;
pub mod format;
pub mod normals;
pub mod pipeline;
pub mod refiner;
pub mod soup;
pub mod tangents;

pub use attribute::*;
pub use connectivity::*;
pub use error::*;
pub use format::*;
pub use pipeline::*;
pub use refiner::*;
pub use soup::*;
pub use tangents::*;

pub use meshsync_config as config;
