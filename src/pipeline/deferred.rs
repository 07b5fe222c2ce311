use crate::error::RenderError;
use crate::gpu::GpuContext;
use crate::mesh::{FullscreenTriangle, Vertex3d};
use crate::render_target::{
    COLOR_TARGET_DEPTH_FORMAT, COLOR_TARGET_FORMAT, GBuffer, RenderTarget, TargetLoad,
};
use crate::shader::{DepthTest, ProgramDesc, ShaderProgram, TextureSlot, UniformKind, names};
use crate::shadow::ShadowMapper;
use crate::texture::Texture;

use super::context::SceneContext;
use super::lighting::{lit_uniforms, set_lighting};

const GEOMETRY_SHADER: &str = include_str!("../shaders/geometry_pass.wgsl");
const DEFERRED_LIT_SHADER: &str = concat!(
    include_str!("../shaders/deferred_lit.wgsl"),
    include_str!("../shaders/lighting.wgsl"),
);

/// Shadow map unit of the deferred lighting shader; units 0..=2 are the
/// G-buffer attachments in slot order.
pub const DEFERRED_SHADOW_MAP_UNIT: u32 = 3;

/// Two-stage lighting.
///
/// The geometry stage rasterizes every draw into the [`GBuffer`] without any
/// lighting. The lighting stage then runs once per screen pixel with a
/// full-screen triangle, so its cost does not depend on how many objects
/// overlap.
pub struct DeferredPass {
    geometry: ShaderProgram,
    lighting: ShaderProgram,
    gbuffer: GBuffer,
    white: Texture,
}

impl DeferredPass {
    pub fn new(gpu: &GpuContext, width: u32, height: u32, max_draws: u32) -> Result<Self, RenderError> {
        let gbuffer = GBuffer::new(gpu, width, height)?;

        let geometry = ShaderProgram::new(
            gpu,
            ProgramDesc {
                label: "Geometry Pass",
                source: GEOMETRY_SHADER,
                uniforms: &[
                    (names::MODEL, UniformKind::Mat4),
                    (names::VIEW_PROJECTION, UniformKind::Mat4),
                ],
                textures: &[TextureSlot::filterable("_MainTex")],
                vertex_layout: Some(Vertex3d::LAYOUT),
                color_formats: &gbuffer.target().color_formats(),
                depth: Some(DepthTest::less(GBuffer::DEPTH_FORMAT)),
                cull_mode: Some(wgpu::Face::Back),
                max_draws,
            },
        )?;

        let lighting = ShaderProgram::new(
            gpu,
            ProgramDesc {
                label: "Deferred Lit",
                source: DEFERRED_LIT_SHADER,
                uniforms: &lit_uniforms(&[]),
                textures: &[
                    TextureSlot::unfilterable("_gPosition"),
                    TextureSlot::unfilterable("_gNormal"),
                    TextureSlot::unfilterable("_gAlbedo"),
                    TextureSlot::depth_comparison("_ShadowMap"),
                ],
                vertex_layout: None,
                color_formats: &[COLOR_TARGET_FORMAT],
                // the main target has depth; the full-screen pass ignores it
                depth: Some(DepthTest {
                    format: COLOR_TARGET_DEPTH_FORMAT,
                    write: false,
                    compare: wgpu::CompareFunction::Always,
                }),
                cull_mode: None,
                max_draws: 1,
            },
        )?;

        Ok(Self {
            geometry,
            lighting,
            gbuffer,
            white: Texture::white(gpu),
        })
    }

    pub fn gbuffer(&self) -> &GBuffer {
        &self.gbuffer
    }

    /// Geometry stage into the G-buffer, then the lighting stage into `target`.
    pub fn render(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &RenderTarget,
        scene: &SceneContext<'_>,
        shadow: &ShadowMapper,
    ) -> Result<(), RenderError> {
        self.render_geometry(gpu, encoder, target.width(), target.height(), scene)?;
        self.render_lighting(gpu, encoder, target, scene, shadow)
    }

    /// Writes position, normal and albedo of every draw. No lighting.
    pub fn render_geometry(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        width: u32,
        height: u32,
        scene: &SceneContext<'_>,
    ) -> Result<(), RenderError> {
        self.gbuffer.ensure_size(gpu, width, height)?;

        let program = &mut self.geometry;
        program.begin_frame();
        program.set_mat4(names::VIEW_PROJECTION, scene.camera.view_projection())?;

        let mut pass = self.gbuffer.begin_pass(encoder);
        program.use_program(&mut pass);
        for draw in scene.draws {
            let albedo = draw.texture.unwrap_or(&self.white);
            program.bind_texture(0, albedo.view(), albedo.sampler())?;
            program.set_mat4(names::MODEL, draw.model)?;
            program.draw(gpu, &mut pass, draw.drawable)?;
        }
        Ok(())
    }

    /// Shades every covered G-buffer pixel once into `target`.
    pub fn render_lighting(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &RenderTarget,
        scene: &SceneContext<'_>,
        shadow: &ShadowMapper,
    ) -> Result<(), RenderError> {
        let program = &mut self.lighting;
        program.begin_frame();
        set_lighting(
            program,
            scene.settings,
            scene.camera,
            shadow.light_view_projection(),
            shadow.map().needs_border_guard(),
        )?;

        let inputs = [self.gbuffer.position(), self.gbuffer.normal(), self.gbuffer.albedo()];
        for (unit, attachment) in inputs.into_iter().enumerate() {
            program.bind_texture(unit as u32, attachment.view(), attachment.sampler())?;
        }
        let shadow_depth = shadow.map().depth();
        program.bind_texture(DEFERRED_SHADOW_MAP_UNIT, shadow_depth.view(), shadow_depth.sampler())?;

        let mut pass = target.begin_pass(encoder, TargetLoad::clear(scene.settings.clear_wgpu_color()));
        program.use_program(&mut pass);
        program.draw(gpu, &mut pass, &FullscreenTriangle)?;
        Ok(())
    }
}
