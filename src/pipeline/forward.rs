use crate::error::RenderError;
use crate::gpu::GpuContext;
use crate::mesh::Vertex3d;
use crate::render_target::{COLOR_TARGET_DEPTH_FORMAT, COLOR_TARGET_FORMAT, RenderTarget, TargetLoad};
use crate::shader::{DepthTest, ProgramDesc, ShaderProgram, TextureSlot, UniformKind, names};
use crate::shadow::ShadowMapper;
use crate::texture::Texture;

use super::context::SceneContext;
use super::lighting::{lit_uniforms, set_lighting};

const LIT_SHADER: &str = concat!(
    include_str!("../shaders/lit.wgsl"),
    include_str!("../shaders/lighting.wgsl"),
);

/// Texture unit of the albedo map.
pub const MAIN_TEX_UNIT: u32 = 0;
/// Texture unit of the shadow map in the forward lit shader.
pub const SHADOW_MAP_UNIT: u32 = 1;

/// Single-pass lighting: every draw is shaded as it is rasterized into the
/// main target, reading the shadow map directly.
pub struct ForwardPass {
    program: ShaderProgram,
    white: Texture,
}

impl ForwardPass {
    pub fn new(gpu: &GpuContext, max_draws: u32) -> Result<Self, RenderError> {
        let uniforms = lit_uniforms(&[
            (names::MODEL, UniformKind::Mat4),
            (names::VIEW_PROJECTION, UniformKind::Mat4),
        ]);

        let program = ShaderProgram::new(
            gpu,
            ProgramDesc {
                label: "Forward Lit",
                source: LIT_SHADER,
                uniforms: &uniforms,
                textures: &[
                    TextureSlot::filterable("_MainTex"),
                    TextureSlot::depth_comparison("_ShadowMap"),
                ],
                vertex_layout: Some(Vertex3d::LAYOUT),
                color_formats: &[COLOR_TARGET_FORMAT],
                depth: Some(DepthTest::less(COLOR_TARGET_DEPTH_FORMAT)),
                cull_mode: Some(wgpu::Face::Back),
                max_draws,
            },
        )?;

        Ok(Self {
            program,
            white: Texture::white(gpu),
        })
    }

    /// Clears `target` and draws every item lit and shadowed into it.
    pub fn render(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &RenderTarget,
        scene: &SceneContext<'_>,
        shadow: &ShadowMapper,
    ) -> Result<(), RenderError> {
        let program = &mut self.program;
        program.begin_frame();
        program.set_mat4(names::VIEW_PROJECTION, scene.camera.view_projection())?;
        set_lighting(
            program,
            scene.settings,
            scene.camera,
            shadow.light_view_projection(),
            shadow.map().needs_border_guard(),
        )?;

        let shadow_depth = shadow.map().depth();
        program.bind_texture(SHADOW_MAP_UNIT, shadow_depth.view(), shadow_depth.sampler())?;

        let mut pass = target.begin_pass(encoder, TargetLoad::clear(scene.settings.clear_wgpu_color()));
        program.use_program(&mut pass);
        for draw in scene.draws {
            let albedo = draw.texture.unwrap_or(&self.white);
            program.bind_texture(MAIN_TEX_UNIT, albedo.view(), albedo.sampler())?;
            program.set_mat4(names::MODEL, draw.model)?;
            program.draw(gpu, &mut pass, draw.drawable)?;
        }
        Ok(())
    }
}
