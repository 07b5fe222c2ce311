use crate::config::{PipelineMode, RenderSettings};
use crate::error::{RenderError, RenderTargetError};
use crate::gpu::GpuContext;
use crate::render_target::{GBuffer, RenderTarget};
use crate::shadow::ShadowMapper;

use super::context::{PassKind, SceneContext, pass_order};
use super::deferred::DeferredPass;
use super::forward::ForwardPass;
use super::post_process::PostProcessPass;

/// Draw calls each program can record per frame.
pub const DEFAULT_MAX_DRAWS: u32 = 256;

/// Runs one frame: shadow, then deferred or forward lighting into the main
/// target, then post-processing onto the output, then UI.
///
/// Owns every GPU resource the passes share. The pipeline mode is read from
/// the [`SceneContext`] each frame, so switching is a settings change; the
/// G-buffer is only allocated the first time deferred mode runs.
pub struct FramePipeline {
    main_target: RenderTarget,
    shadow: ShadowMapper,
    forward: ForwardPass,
    deferred: Option<DeferredPass>,
    post: PostProcessPass,
    mode: PipelineMode,
    max_draws: u32,
}

impl FramePipeline {
    pub fn new(gpu: &GpuContext, settings: &RenderSettings) -> Result<Self, RenderError> {
        Self::with_capacity(gpu, settings, DEFAULT_MAX_DRAWS)
    }

    pub fn with_capacity(
        gpu: &GpuContext,
        settings: &RenderSettings,
        max_draws: u32,
    ) -> Result<Self, RenderError> {
        let main_target = RenderTarget::color_target(gpu, gpu.width(), gpu.height())?;
        let shadow = ShadowMapper::new(gpu, &settings.shadow, max_draws)?;
        let forward = ForwardPass::new(gpu, max_draws)?;
        let post = PostProcessPass::chromatic_aberration(gpu, gpu.surface_format())?;

        let mut pipeline = Self {
            main_target,
            shadow,
            forward,
            deferred: None,
            post,
            mode: settings.mode,
            max_draws,
        };
        if settings.mode == PipelineMode::Deferred {
            pipeline.deferred = Some(DeferredPass::new(gpu, gpu.width(), gpu.height(), max_draws)?);
        }

        log::info!("frame pipeline ready ({:?}, {} draws per pass)", settings.mode, max_draws);
        Ok(pipeline)
    }

    /// Replaces the post-process stage. Its output format must match the
    /// surface.
    pub fn set_post_process(&mut self, post: PostProcessPass) {
        self.post = post;
    }

    pub fn post_process_mut(&mut self) -> &mut PostProcessPass {
        &mut self.post
    }

    pub fn main_target(&self) -> &RenderTarget {
        &self.main_target
    }

    pub fn shadow(&self) -> &ShadowMapper {
        &self.shadow
    }

    /// `None` until deferred mode has run once.
    pub fn gbuffer(&self) -> Option<&GBuffer> {
        self.deferred.as_ref().map(DeferredPass::gbuffer)
    }

    /// Mode used by the most recent frame.
    pub fn mode(&self) -> PipelineMode {
        self.mode
    }

    /// Renders to the window surface and presents it.
    ///
    /// `ui` records into a pass that loads the post-processed image, so
    /// anything it draws lands on top. A lost or outdated surface is
    /// reconfigured and the frame skipped; so is a timeout.
    pub fn render<F>(&mut self, gpu: &GpuContext, scene: &SceneContext<'_>, ui: F) -> Result<(), RenderError>
    where
        F: FnOnce(&GpuContext, &mut wgpu::RenderPass<'_>),
    {
        let output = match gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::warn!("surface lost or outdated, reconfiguring");
                gpu.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("surface timed out, skipping frame");
                return Ok(());
            }
            Err(error) => return Err(error.into()),
        };
        let screen_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.encode(gpu, &mut encoder, scene, &screen_view, gpu.width(), gpu.height())?;

        {
            let mut ui_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("UI Overlay Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &screen_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            ui(gpu, &mut ui_pass);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    /// Renders every pass except UI into `output`, which must have the
    /// surface format and be `width` x `height`. Nothing is presented.
    pub fn render_to_view(
        &mut self,
        gpu: &GpuContext,
        scene: &SceneContext<'_>,
        output: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Offscreen Frame Encoder"),
            });
        self.encode(gpu, &mut encoder, scene, output, width, height)?;
        gpu.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn prepare(
        &mut self,
        gpu: &GpuContext,
        settings: &RenderSettings,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        self.main_target.ensure_size(gpu, width, height)?;
        self.shadow.ensure_resolution(gpu, settings.shadow.resolution)?;

        if settings.mode != self.mode {
            log::info!("pipeline mode {:?} -> {:?}", self.mode, settings.mode);
            self.mode = settings.mode;
        }
        if settings.mode == PipelineMode::Deferred && self.deferred.is_none() {
            self.deferred = Some(DeferredPass::new(gpu, width, height, self.max_draws)?);
        }
        Ok(())
    }

    fn encode(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        scene: &SceneContext<'_>,
        output: &wgpu::TextureView,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        let settings = scene.settings;
        self.prepare(gpu, settings, width, height)?;

        for pass in pass_order(settings.mode) {
            match pass {
                PassKind::Shadow => {
                    self.shadow
                        .render(gpu, encoder, &settings.light, &settings.shadow, scene.draws)?;
                }
                PassKind::Geometry => {
                    if let Some(deferred) = self.deferred.as_mut() {
                        deferred.render_geometry(gpu, encoder, width, height, scene)?;
                    }
                }
                PassKind::Lighting => {
                    if let Some(deferred) = self.deferred.as_mut() {
                        deferred.render_lighting(gpu, encoder, &self.main_target, scene, &self.shadow)?;
                    }
                }
                PassKind::Forward => {
                    self.forward
                        .render(gpu, encoder, &self.main_target, scene, &self.shadow)?;
                }
                PassKind::PostProcess => {
                    let color = self.main_target.color(0).ok_or_else(|| {
                        RenderTargetError::NoAttachments {
                            label: self.main_target.label().to_string(),
                        }
                    })?;
                    self.post.render(gpu, encoder, color, output, &settings.post)?;
                }
                // recorded by `render` once the frame is composed
                PassKind::Ui => {}
            }
        }
        Ok(())
    }
}
