use crate::config::PostProcessSettings;
use crate::error::ShaderError;
use crate::gpu::GpuContext;
use crate::mesh::FullscreenTriangle;
use crate::render_target::Attachment;
use crate::shader::{ProgramDesc, ShaderProgram, TextureSlot, UniformKind, names};

const CHROMATIC_ABERRATION_SHADER: &str = include_str!("../shaders/post_process.wgsl");

const CHROMATIC_ABERRATION_UNIFORMS: [(&str, UniformKind); 4] = [
    (names::RED_OFFSET, UniformKind::Float),
    (names::GREEN_OFFSET, UniformKind::Float),
    (names::BLUE_OFFSET, UniformKind::Float),
    (names::EFFECT_ON, UniformKind::Int),
];

/// The last pass before UI: one color texture in, a full-screen draw out.
///
/// The shader is swappable. Any WGSL that samples texture unit 0 and has
/// `vs`/`fs` entry points works; effect uniforms it does not declare are
/// simply not set.
pub struct PostProcessPass {
    program: ShaderProgram,
}

impl PostProcessPass {
    /// Per-channel screen-space offsets, driven by [`PostProcessSettings`].
    pub fn chromatic_aberration(gpu: &GpuContext, output_format: wgpu::TextureFormat) -> Result<Self, ShaderError> {
        Self::custom(
            gpu,
            "Chromatic Aberration",
            CHROMATIC_ABERRATION_SHADER,
            &CHROMATIC_ABERRATION_UNIFORMS,
            output_format,
        )
    }

    pub fn custom(
        gpu: &GpuContext,
        label: &str,
        source: &str,
        uniforms: &[(&str, UniformKind)],
        output_format: wgpu::TextureFormat,
    ) -> Result<Self, ShaderError> {
        let program = ShaderProgram::new(
            gpu,
            ProgramDesc {
                label,
                source,
                uniforms,
                textures: &[TextureSlot::filterable("_ColorBuffer")],
                vertex_layout: None,
                color_formats: &[output_format],
                depth: None,
                cull_mode: None,
                max_draws: 1,
            },
        )?;
        Ok(Self { program })
    }

    /// Direct access for custom shaders with their own uniforms.
    pub fn program_mut(&mut self) -> &mut ShaderProgram {
        &mut self.program
    }

    pub fn render(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        input: &Attachment,
        output: &wgpu::TextureView,
        settings: &PostProcessSettings,
    ) -> Result<(), ShaderError> {
        let program = &mut self.program;
        program.begin_frame();

        let values = [
            (names::RED_OFFSET, settings.red_offset),
            (names::GREEN_OFFSET, settings.green_offset),
            (names::BLUE_OFFSET, settings.blue_offset),
        ];
        for (name, value) in values {
            if program.has_uniform(name) {
                program.set_float(name, value)?;
            }
        }
        if program.has_uniform(names::EFFECT_ON) {
            program.set_int(names::EFFECT_ON, i32::from(settings.enabled))?;
        }
        program.bind_texture(0, input.view(), input.sampler())?;

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Post Process Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: output,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        program.use_program(&mut pass);
        program.draw(gpu, &mut pass, &FullscreenTriangle)
    }
}
