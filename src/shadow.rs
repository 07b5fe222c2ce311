//! Directional shadow mapping.
//!
//! The light is directional, so its camera is orthographic: it sits a fixed
//! distance back from the point of interest along the light direction and
//! sees a square volume `ortho_height` units across. The scene is rendered
//! depth-only into a [`ShadowMap`] with front faces culled; lighting passes
//! then compare each fragment's light-space depth, minus a bias, against it.

use glam::{Mat4, Vec3};

use crate::camera::Camera;
use crate::config::{BiasCurve, Light, ShadowBias, ShadowSettings};
use crate::error::{RenderError, RenderTargetError};
use crate::gpu::GpuContext;
use crate::mesh::Vertex3d;
use crate::pipeline::DrawItem;
use crate::render_target::ShadowMap;
use crate::shader::{DepthTest, ProgramDesc, ShaderProgram, UniformKind, names};

const DEPTH_ONLY_SHADER: &str = include_str!("shaders/depth_only.wgsl");

/// Orthographic camera looking along `direction` at `settings.focus`.
///
/// A zero direction is treated as straight down.
pub fn light_camera(direction: Vec3, settings: &ShadowSettings) -> Camera {
    let direction = direction.normalize_or(Vec3::NEG_Y);
    let position = settings.focus - direction * settings.distance;

    Camera {
        position,
        target: settings.focus,
        up: Vec3::Y,
        aspect: 1.0,
        near: settings.near,
        far: settings.far,
        ..Camera::default()
    }
    .orthographic(settings.ortho_height)
}

/// Depth bias for a surface whose normal makes `n_dot_l` with the direction
/// towards the light.
///
/// Always within `[min, max]` (for `min <= max`) and never smaller for a
/// more oblique surface.
pub fn shadow_bias(n_dot_l: f32, bias: &ShadowBias) -> f32 {
    let cos = n_dot_l.clamp(0.0, 1.0);
    match bias.curve {
        BiasCurve::Linear => bias.max + (bias.min - bias.max) * cos,
        BiasCurve::Slope => {
            // tan(acos(c)) without the trig round trip
            let tan = (1.0 - cos * cos).sqrt() / cos.max(1e-6);
            (bias.max * tan).max(bias.min).min(bias.max)
        }
    }
}

/// 1.0 when a fragment at `fragment_depth` is lit given the stored
/// `map_depth`, 0.0 when something closer to the light occludes it.
pub fn shadow_visibility(map_depth: f32, fragment_depth: f32, bias: f32) -> f32 {
    if fragment_depth - bias > map_depth { 0.0 } else { 1.0 }
}

/// Owns the shadow map and the depth-only program that fills it.
pub struct ShadowMapper {
    map: ShadowMap,
    program: ShaderProgram,
    light: Camera,
}

impl ShadowMapper {
    pub fn new(gpu: &GpuContext, settings: &ShadowSettings, max_draws: u32) -> Result<Self, RenderError> {
        let map = ShadowMap::new(gpu, settings.resolution)?;
        if map.needs_border_guard() {
            log::warn!("shadow lookups outside the light frustum are guarded in the shader");
        }

        let program = ShaderProgram::new(
            gpu,
            ProgramDesc {
                label: "Depth Only",
                source: DEPTH_ONLY_SHADER,
                uniforms: &[
                    (names::VIEW_PROJECTION, UniformKind::Mat4),
                    (names::MODEL, UniformKind::Mat4),
                ],
                textures: &[],
                vertex_layout: Some(Vertex3d::LAYOUT),
                color_formats: &[],
                depth: Some(DepthTest::less(ShadowMap::FORMAT)),
                // front faces culled in this pass only
                cull_mode: Some(wgpu::Face::Front),
                max_draws,
            },
        )?;

        Ok(Self {
            map,
            program,
            light: light_camera(Light::default().direction, settings),
        })
    }

    /// Recreates the map when the configured resolution changed.
    pub fn ensure_resolution(&mut self, gpu: &GpuContext, resolution: u32) -> Result<bool, RenderTargetError> {
        if self.map.resolution() == resolution {
            return Ok(false);
        }
        log::info!("shadow map resolution {} -> {}", self.map.resolution(), resolution);
        self.map = ShadowMap::new(gpu, resolution)?;
        Ok(true)
    }

    pub fn map(&self) -> &ShadowMap {
        &self.map
    }

    /// Light camera used by the last [`render`](Self::render).
    pub fn light_camera(&self) -> &Camera {
        &self.light
    }

    /// The matrix lighting passes bind as `_LightViewProj`.
    pub fn light_view_projection(&self) -> Mat4 {
        self.light.view_projection()
    }

    /// Renders every shadow-casting draw into the map from the light.
    pub fn render(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        light: &Light,
        settings: &ShadowSettings,
        draws: &[DrawItem<'_>],
    ) -> Result<(), RenderError> {
        self.light = light_camera(light.direction, settings);

        self.program.begin_frame();
        self.program
            .set_mat4(names::VIEW_PROJECTION, self.light.view_projection())?;

        let mut pass = self.map.begin_pass(encoder);
        self.program.use_program(&mut pass);
        for draw in draws.iter().filter(|draw| draw.casts_shadow) {
            self.program.set_mat4(names::MODEL, draw.model)?;
            self.program.draw(gpu, &mut pass, draw.drawable)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_sits_behind_focus() {
        let settings = ShadowSettings {
            focus: Vec3::new(1.0, 0.0, 2.0),
            distance: 10.0,
            ..ShadowSettings::default()
        };
        let camera = light_camera(Vec3::new(0.0, -3.0, 0.0), &settings);
        assert!(camera.position.abs_diff_eq(Vec3::new(1.0, 10.0, 2.0), 1e-5));
        assert!(camera.orthographic);
        assert_eq!(camera.ortho_height, settings.ortho_height);
        assert!(camera.view_projection().is_finite());
    }

    #[test]
    fn zero_direction_points_down() {
        let camera = light_camera(Vec3::ZERO, &ShadowSettings::default());
        assert!(camera.forward().abs_diff_eq(Vec3::NEG_Y, 1e-5));
    }

    #[test]
    fn bias_stays_within_bounds() {
        for curve in [BiasCurve::Linear, BiasCurve::Slope] {
            let bias = ShadowBias {
                min: 0.005,
                max: 0.015,
                curve,
            };
            let mut previous = f32::INFINITY;
            for step in 0..=20 {
                let n_dot_l = step as f32 / 20.0;
                let b = shadow_bias(n_dot_l, &bias);
                assert!(b >= bias.min - 1e-7 && b <= bias.max + 1e-7);
                // facing the light more never needs more bias
                assert!(b <= previous + 1e-7);
                previous = b;
            }
            assert!((shadow_bias(1.0, &bias) - bias.min).abs() < 1e-6);
            assert!((shadow_bias(0.0, &bias) - bias.max).abs() < 1e-6);
        }
    }

    #[test]
    fn visibility_compares_against_biased_depth() {
        assert_eq!(shadow_visibility(0.5, 0.7, 0.01), 0.0);
        assert_eq!(shadow_visibility(0.5, 0.505, 0.01), 1.0);
        assert_eq!(shadow_visibility(1.0, 0.999, 0.0), 1.0);
    }
}
