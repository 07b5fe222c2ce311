use crate::error::RenderTargetError;
use crate::gpu::GpuContext;

use super::attachment::{AttachmentDesc, RenderTargetDesc, Sampling, Wrap};
use super::target::{Attachment, RenderTarget, TargetLoad};

/// Geometry buffer for the deferred path.
///
/// Three color attachments in fixed slots (world position, world normal,
/// albedo) plus depth. Attachments are sampled with nearest filtering so
/// geometric data is never interpolated, and clamp to a transparent border
/// so reads past the edge look like empty pixels.
pub struct GBuffer {
    target: RenderTarget,
}

impl GBuffer {
    pub const POSITION: usize = 0;
    pub const NORMAL: usize = 1;
    pub const ALBEDO: usize = 2;

    /// World position; `w` is 1 where geometry was written, 0 elsewhere.
    pub const POSITION_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;
    pub const NORMAL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
    pub const ALBEDO_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn desc(width: u32, height: u32) -> RenderTargetDesc {
        let sampling = Sampling::nearest()
            .with_wrap(Wrap::ClampToBorder(wgpu::SamplerBorderColor::TransparentBlack));

        RenderTargetDesc::new("G-Buffer", width, height)
            .with_color(AttachmentDesc::new("position", Self::POSITION_FORMAT).with_sampling(sampling))
            .with_color(AttachmentDesc::new("normal", Self::NORMAL_FORMAT).with_sampling(sampling))
            .with_color(AttachmentDesc::new("albedo", Self::ALBEDO_FORMAT).with_sampling(sampling))
            .with_depth(AttachmentDesc::new("depth", Self::DEPTH_FORMAT).with_sampling(Sampling::nearest()))
    }

    pub fn new(gpu: &GpuContext, width: u32, height: u32) -> Result<Self, RenderTargetError> {
        Ok(Self {
            target: RenderTarget::new(gpu, Self::desc(width, height))?,
        })
    }

    pub fn ensure_size(&mut self, gpu: &GpuContext, width: u32, height: u32) -> Result<bool, RenderTargetError> {
        self.target.ensure_size(gpu, width, height)
    }

    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    pub fn position(&self) -> &Attachment {
        &self.target.color_attachments()[Self::POSITION]
    }

    pub fn normal(&self) -> &Attachment {
        &self.target.color_attachments()[Self::NORMAL]
    }

    pub fn albedo(&self) -> &Attachment {
        &self.target.color_attachments()[Self::ALBEDO]
    }

    /// Geometry pass over a cleared buffer: every attachment zeroed, depth at far.
    pub fn begin_pass<'e>(&self, encoder: &'e mut wgpu::CommandEncoder) -> wgpu::RenderPass<'e> {
        self.target
            .begin_pass(encoder, TargetLoad::clear(wgpu::Color::TRANSPARENT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_fits_default_limits() {
        let desc = GBuffer::desc(1080, 720);
        assert_eq!(desc.color.len(), 3);
        assert_eq!(desc.color[GBuffer::POSITION].name, "position");
        assert_eq!(desc.color_bytes_per_sample(), 32);
        assert_eq!(desc.validate(&wgpu::Limits::default(), wgpu::Features::empty()), Ok(()));
    }

    #[test]
    fn attachments_use_nearest_filtering() {
        let desc = GBuffer::desc(64, 64);
        for attachment in desc.attachments() {
            assert_eq!(attachment.sampling.filter, wgpu::FilterMode::Nearest);
        }
    }
}
