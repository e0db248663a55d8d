//! End-to-end refinement driven by [`RefineSettings`].
//!
//! Order of operations:
//! 1. coordinate fixups (scale, handedness, v flip) on copies of the inputs
//! 2. normals: keep, flat or smoothing-angle, then optional flip
//! 3. tangents, falling back to zero tangents if the solver fails
//! 4. dedup, split and triangulate

use crate::bulk;
use crate::error::MeshError;
use crate::refiner::{RefinedMesh, RefinerSettings, TopologyRefiner};
use crate::soup::PolygonSoup;
use crate::tangents::{self, TangentSolver};
use glam::{Vec2, Vec3, Vec4};
use meshsync_config::{DEFAULT_SCALE_FACTOR, NormalGeneration, RefineSettings};
use std::borrow::Cow;
use std::fmt;
use tracing::{debug, info};

/// A decoded mesh handed to the pipeline. Attribute arrays may be empty,
/// per point or per corner.
#[derive(Debug, Clone, Copy)]
pub struct MeshInput<'a> {
    pub soup: &'a PolygonSoup,
    pub normals: &'a [Vec3],
    pub uv: &'a [Vec2],
    pub tangents: &'a [Vec4],
}

impl<'a> MeshInput<'a> {
    pub fn new(soup: &'a PolygonSoup) -> Self {
        Self {
            soup,
            normals: &[],
            uv: &[],
            tangents: &[],
        }
    }

    pub fn with_normals(mut self, normals: &'a [Vec3]) -> Self {
        self.normals = normals;
        self
    }

    pub fn with_uv(mut self, uv: &'a [Vec2]) -> Self {
        self.uv = uv;
        self
    }

    pub fn with_tangents(mut self, tangents: &'a [Vec4]) -> Self {
        self.tangents = tangents;
        self
    }
}

/// Refine pipeline with its settings and tangent solver.
pub struct RefinePipeline {
    pub settings: RefineSettings,
    solver: Box<dyn TangentSolver + Send + Sync>,
}

impl fmt::Debug for RefinePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefinePipeline")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Default for RefinePipeline {
    fn default() -> Self {
        Self::new(RefineSettings::default())
    }
}

impl RefinePipeline {
    /// Pipeline using the default tangent solver.
    pub fn new(settings: RefineSettings) -> Self {
        Self::with_solver(settings, tangents::default_solver())
    }

    pub fn with_solver(settings: RefineSettings, solver: Box<dyn TangentSolver + Send + Sync>) -> Self {
        Self { settings, solver }
    }

    pub fn run(&self, input: &MeshInput<'_>) -> Result<RefinedMesh, MeshError> {
        let settings = &self.settings;

        let mut soup = Cow::Borrowed(input.soup);
        let mut normals = Cow::Borrowed(input.normals);
        let mut uv = Cow::Borrowed(input.uv);
        let mut tangents = Cow::Borrowed(input.tangents);

        if settings.needs_fixup() {
            if settings.scale_factor != DEFAULT_SCALE_FACTOR {
                bulk::scale(soup.to_mut().points_mut(), settings.scale_factor);
            }
            if settings.swap_handedness {
                bulk::invert_x(soup.to_mut().points_mut());
                if !normals.is_empty() {
                    bulk::invert_x(normals.to_mut());
                }
                if !tangents.is_empty() {
                    bulk::invert_x(tangents.to_mut());
                }
            }
            if settings.flip_v && !uv.is_empty() {
                bulk::invert_v(uv.to_mut());
            }
        }

        let mut refiner = TopologyRefiner::with_settings(&soup, RefinerSettings::from(settings));
        refiner.set_uv(&uv)?;

        match settings.normals {
            NormalGeneration::Keep => refiner.set_normals(&normals)?,
            NormalGeneration::Flat => refiner.gen_normals(),
            NormalGeneration::Smooth => refiner.gen_normals_with_angle(settings.smooth_angle)?,
        }
        if settings.flip_normals {
            refiner.flip_normals();
        }

        if settings.gen_tangents {
            if !refiner.normals().is_empty() && !refiner.uv().is_empty() {
                refiner.gen_tangents_or_zero(self.solver.as_ref())?;
            } else {
                debug!("refine_mesh: tangent generation needs normals and uv, skipped");
            }
        } else {
            refiner.set_tangents(&tangents)?;
        }

        refiner.refine()?;
        let mesh = refiner.take_output();
        info!(
            "refine_mesh: {} faces -> {} vertices, {} triangles in {} splits",
            soup.face_count(),
            mesh.point_count(),
            mesh.indices_triangulated().len() / 3,
            mesh.splits().len()
        );
        if let Some(bounds) = mesh.bounds() {
            debug!("refine_mesh: bounds {} .. {}", bounds.min, bounds.max);
        }
        Ok(mesh)
    }
}

/// Run the refine pipeline once with the default tangent solver.
pub fn refine_mesh(input: &MeshInput<'_>, settings: &RefineSettings) -> Result<RefinedMesh, MeshError> {
    RefinePipeline::new(settings.clone()).run(input)
}
