use crate::error::RenderTargetError;
use crate::gpu::GpuContext;

use super::attachment::{AttachmentDesc, RenderTargetDesc, Sampling};

/// Format of the main offscreen color target.
pub const COLOR_TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// Depth format of the main offscreen target.
pub const COLOR_TARGET_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// An allocated attachment: texture, view and the sampler later passes read it with.
#[derive(Clone, Debug)]
pub struct Attachment {
    name: &'static str,
    format: wgpu::TextureFormat,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

impl Attachment {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }
}

/// How a pass treats the existing contents of a target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetLoad {
    /// Clear color for every color attachment; `None` keeps the contents.
    pub color: Option<wgpu::Color>,
    /// Depth clear value; `None` keeps the contents.
    pub depth: Option<f32>,
}

impl TargetLoad {
    pub fn clear(color: wgpu::Color) -> Self {
        Self {
            color: Some(color),
            depth: Some(1.0),
        }
    }

    pub fn load() -> Self {
        Self {
            color: None,
            depth: None,
        }
    }
}

/// An offscreen surface with up to eight color attachments and an optional
/// depth attachment, all the same size.
///
/// Construction runs the completeness check and allocates inside device error
/// scopes; a target that exists is always complete. Passes render into it
/// through [`begin_pass`](Self::begin_pass); the pass ending restores nothing
/// because nothing global was bound.
pub struct RenderTarget {
    desc: RenderTargetDesc,
    color: Vec<Attachment>,
    depth: Option<Attachment>,
    border_fallback: bool,
}

impl RenderTarget {
    pub fn new(gpu: &GpuContext, desc: RenderTargetDesc) -> Result<Self, RenderTargetError> {
        let device = &gpu.device;
        let features = device.features();
        desc.validate(&device.limits(), features)?;

        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let size = wgpu::Extent3d {
            width: desc.width,
            height: desc.height,
            depth_or_array_layers: 1,
        };
        let allocate = |attachment: &AttachmentDesc| {
            let label = format!("{} {}", desc.label, attachment.name);
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some(&label),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: attachment.format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            let sampler = device.create_sampler(
                &attachment
                    .sampling
                    .sampler_descriptor(&format!("{} Sampler", label), features),
            );
            Attachment {
                name: attachment.name,
                format: attachment.format,
                texture,
                view,
                sampler,
            }
        };

        let color: Vec<Attachment> = desc.color.iter().map(&allocate).collect();
        let depth = desc.depth.as_ref().map(&allocate);

        let validation = pollster::block_on(device.pop_error_scope());
        let out_of_memory = pollster::block_on(device.pop_error_scope());
        if let Some(error) = validation.or(out_of_memory) {
            return Err(RenderTargetError::Device {
                label: desc.label.clone(),
                message: error.to_string(),
            });
        }

        let border_fallback = desc
            .attachments()
            .any(|attachment| attachment.sampling.resolve(features).2);
        if border_fallback {
            log::warn!(
                "render target '{}' samples with clamp-to-edge instead of a border color",
                desc.label
            );
        }

        log::info!(
            "created render target '{}' {}x{} ({} color{})",
            desc.label,
            desc.width,
            desc.height,
            color.len(),
            if depth.is_some() { " + depth" } else { "" }
        );

        Ok(Self {
            desc,
            color,
            depth,
            border_fallback,
        })
    }

    /// The main offscreen target: one HDR color attachment plus depth-stencil.
    pub fn color_target(gpu: &GpuContext, width: u32, height: u32) -> Result<Self, RenderTargetError> {
        Self::new(gpu, Self::color_target_desc(width, height))
    }

    pub fn color_target_desc(width: u32, height: u32) -> RenderTargetDesc {
        RenderTargetDesc::new("Main Color Target", width, height)
            .with_color(AttachmentDesc::new("color", COLOR_TARGET_FORMAT).with_sampling(Sampling::linear()))
            .with_depth(AttachmentDesc::new("depth", COLOR_TARGET_DEPTH_FORMAT))
    }

    /// Recreates the target when the requested size differs from the current
    /// one. Returns whether a new target was allocated.
    pub fn ensure_size(&mut self, gpu: &GpuContext, width: u32, height: u32) -> Result<bool, RenderTargetError> {
        if self.desc.width == width && self.desc.height == height {
            return Ok(false);
        }
        log::debug!(
            "resizing '{}' from {}x{} to {}x{}",
            self.desc.label,
            self.desc.width,
            self.desc.height,
            width,
            height
        );
        *self = Self::new(gpu, self.desc.resized(width, height))?;
        Ok(true)
    }

    pub fn desc(&self) -> &RenderTargetDesc {
        &self.desc
    }

    pub fn label(&self) -> &str {
        &self.desc.label
    }

    pub fn width(&self) -> u32 {
        self.desc.width
    }

    pub fn height(&self) -> u32 {
        self.desc.height
    }

    pub fn color(&self, slot: usize) -> Option<&Attachment> {
        self.color.get(slot)
    }

    pub fn color_attachments(&self) -> &[Attachment] {
        &self.color
    }

    pub fn depth(&self) -> Option<&Attachment> {
        self.depth.as_ref()
    }

    pub fn color_formats(&self) -> Vec<wgpu::TextureFormat> {
        self.color.iter().map(Attachment::format).collect()
    }

    pub fn depth_format(&self) -> Option<wgpu::TextureFormat> {
        self.depth.as_ref().map(Attachment::format)
    }

    /// True when a border-clamped attachment had to fall back to clamp-to-edge.
    pub fn uses_border_fallback(&self) -> bool {
        self.border_fallback
    }

    /// Starts a render pass whose attachments are exactly this target's.
    pub fn begin_pass<'e>(
        &self,
        encoder: &'e mut wgpu::CommandEncoder,
        load: TargetLoad,
    ) -> wgpu::RenderPass<'e> {
        let color_ops = wgpu::Operations {
            load: match load.color {
                Some(color) => wgpu::LoadOp::Clear(color),
                None => wgpu::LoadOp::Load,
            },
            store: wgpu::StoreOp::Store,
        };
        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = self
            .color
            .iter()
            .map(|attachment| {
                Some(wgpu::RenderPassColorAttachment {
                    view: &attachment.view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: color_ops,
                })
            })
            .collect();

        let depth_stencil_attachment = self.depth.as_ref().map(|attachment| {
            let depth_ops = wgpu::Operations {
                load: match load.depth {
                    Some(depth) => wgpu::LoadOp::Clear(depth),
                    None => wgpu::LoadOp::Load,
                },
                store: wgpu::StoreOp::Store,
            };
            let stencil_ops = attachment.format.has_stencil_aspect().then(|| wgpu::Operations {
                load: match load.depth {
                    Some(_) => wgpu::LoadOp::Clear(0),
                    None => wgpu::LoadOp::Load,
                },
                store: wgpu::StoreOp::Store,
            });
            wgpu::RenderPassDepthStencilAttachment {
                view: &attachment.view,
                depth_ops: Some(depth_ops),
                stencil_ops,
            }
        });

        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(&self.desc.label),
            color_attachments: &color_attachments,
            depth_stencil_attachment,
            timestamp_writes: None,
            occlusion_query_set: None,
        })
    }
}
