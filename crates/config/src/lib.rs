//! Shared configuration for mesh refinement
//!
//! This crate is the single source of truth for the settings the transport
//! layer hands to the refine pipeline alongside a decoded polygon soup:
//! smoothing angle, split unit, triangulation and the coordinate fixups
//! applied before refinement.

use serde::{Deserialize, Serialize};

/// Default maximum number of refined points per split.
///
/// Keeps every chunk addressable by a 16-bit index buffer.
pub const DEFAULT_SPLIT_UNIT: u32 = 65000;

/// Default smoothing angle in degrees (fully smooth)
pub const DEFAULT_SMOOTH_ANGLE: f32 = 180.0;

/// Default uniform scale applied to points
pub const DEFAULT_SCALE_FACTOR: f32 = 1.0;

/// How normals are obtained before refinement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalGeneration {
    /// Use the normals supplied with the mesh (if any)
    #[default]
    Keep,
    /// One accumulated normal per point
    Flat,
    /// One normal per corner, merged across edges below the smoothing angle
    Smooth,
}

/// Settings for one refine pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineSettings {
    /// Fan-triangulate polygons into a triangle index buffer
    pub triangulate: bool,
    /// Reverse the winding of every emitted triangle
    pub swap_faces: bool,
    /// Maximum refined points per split (0 = unbounded)
    pub split_unit: u32,
    /// Normal generation mode
    pub normals: NormalGeneration,
    /// Smoothing angle in degrees, used by [`NormalGeneration::Smooth`]
    pub smooth_angle: f32,
    /// Negate normals after they are resolved
    pub flip_normals: bool,
    /// Generate tangents when both normals and uv are available
    pub gen_tangents: bool,
    /// Uniform scale applied to points
    pub scale_factor: f32,
    /// Mirror along X to convert between left and right handed spaces
    pub swap_handedness: bool,
    /// Flip the v texture coordinate (`v = 1 - v`)
    pub flip_v: bool,
}

impl Default for RefineSettings {
    fn default() -> Self {
        Self {
            triangulate: true,
            swap_faces: false,
            split_unit: DEFAULT_SPLIT_UNIT,
            normals: NormalGeneration::Keep,
            smooth_angle: DEFAULT_SMOOTH_ANGLE,
            flip_normals: false,
            gen_tangents: false,
            scale_factor: DEFAULT_SCALE_FACTOR,
            swap_handedness: false,
            flip_v: false,
        }
    }
}

impl RefineSettings {
    /// Settings that generate smoothing-angle normals
    pub fn with_smooth_normals(angle: f32) -> Self {
        Self {
            normals: NormalGeneration::Smooth,
            smooth_angle: angle,
            ..Self::default()
        }
    }

    /// Whether the triangle winding ends up reversed.
    ///
    /// Mirroring flips orientation, so it cancels an explicit face swap.
    pub fn effective_swap_faces(&self) -> bool {
        self.swap_faces != self.swap_handedness
    }

    /// Whether any pre-refine coordinate fixup is enabled
    pub fn needs_fixup(&self) -> bool {
        self.scale_factor != DEFAULT_SCALE_FACTOR || self.swap_handedness || self.flip_v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = RefineSettings::default();
        assert!(settings.triangulate);
        assert_eq!(settings.split_unit, DEFAULT_SPLIT_UNIT);
        assert_eq!(settings.smooth_angle, DEFAULT_SMOOTH_ANGLE);
        assert_eq!(settings.normals, NormalGeneration::Keep);
        assert!(!settings.needs_fixup());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: RefineSettings =
            serde_json::from_str(r#"{ "split_unit": 1024, "normals": "smooth" }"#).unwrap();
        assert_eq!(settings.split_unit, 1024);
        assert_eq!(settings.normals, NormalGeneration::Smooth);
        assert!(settings.triangulate);
        assert_eq!(settings.scale_factor, DEFAULT_SCALE_FACTOR);
    }

    #[test]
    fn test_handedness_cancels_face_swap() {
        let mut settings = RefineSettings::default();
        assert!(!settings.effective_swap_faces());

        settings.swap_handedness = true;
        assert!(settings.effective_swap_faces());
        assert!(settings.needs_fixup());

        settings.swap_faces = true;
        assert!(!settings.effective_swap_faces());
    }

    #[test]
    fn test_with_smooth_normals() {
        let settings = RefineSettings::with_smooth_normals(60.0);
        assert_eq!(settings.normals, NormalGeneration::Smooth);
        assert_eq!(settings.smooth_angle, 60.0);
    }
}
