//! # Penumbra
//!
//! **A multi-pass wgpu renderer: directional shadow maps, forward or deferred
//! Blinn-Phong lighting, a post-process stage, and forward-kinematics rigs.**
//!
//! Each frame runs a fixed pass sequence over offscreen [`RenderTarget`]s:
//! a depth-only shadow pass from an orthographic light, then either a forward
//! lit pass or a G-buffer geometry pass followed by a full-screen lighting
//! pass, then chromatic aberration onto the surface, then UI.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use penumbra::*;
//!
//! # fn demo(window: Arc<winit::window::Window>) -> Result<(), Box<dyn std::error::Error>> {
//! let gpu = GpuContext::new(window)?;
//! let settings = RenderSettings::new().mode(PipelineMode::Deferred);
//! let mut pipeline = FramePipeline::new(&gpu, &settings)?;
//!
//! let cube = Mesh::cube(&gpu);
//! let mut rig = humanoid_rig()?;
//! rig.solve();
//! let draws = hierarchy_draws(&rig, &cube, None);
//!
//! let camera = Camera::new().at(0.0, 3.0, 10.0).with_aspect(gpu.aspect());
//! let scene = SceneContext { camera: &camera, settings: &settings, draws: &draws };
//! pipeline.render(&gpu, &scene, |_, _| {})?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Layout
//!
//! - [`render_target`]: validated offscreen targets, [`GBuffer`], [`ShadowMap`]
//! - [`shadow`]: light camera, bias curves, [`ShadowMapper`]
//! - [`pipeline`]: [`FramePipeline`] and the passes it sequences
//! - [`hierarchy`] and [`rig`]: parent-indexed transform trees
//! - [`shader`]: named uniforms and the program wrapper every pass uses
//! - [`shading`]: CPU mirror of the lighting and shadow math

mod camera;
mod config;
mod controls;
mod error;
mod gpu;
pub mod hierarchy;
mod logging;
mod mesh;
pub mod pipeline;
pub mod render_target;
pub mod rig;
pub mod shader;
pub mod shading;
pub mod shadow;
mod texture;

pub use camera::{Camera, ndc_to_uv, uv_to_ndc};
pub use config::{
    BiasCurve, Light, Material, PipelineMode, PostProcessSettings, RenderSettings, ShadowBias,
    ShadowSettings,
};
pub use controls::{ControlAction, Controls};
pub use error::{GpuError, HierarchyError, RenderError, RenderTargetError, ShaderError};
pub use gpu::GpuContext;
pub use hierarchy::{Hierarchy, TransformNode};
pub use logging::{LoggingConfig, init_logging};
pub use mesh::{Drawable, FullscreenTriangle, Mesh, MeshData, Vertex3d};
pub use pipeline::{DrawItem, FramePipeline, PassKind, SceneContext, hierarchy_draws, pass_order};
pub use render_target::{GBuffer, RenderTarget, RenderTargetDesc, ShadowMap};
pub use rig::{RigAnimator, humanoid_rig};
pub use shadow::ShadowMapper;
pub use texture::Texture;

// Re-export math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
