use crate::error::RenderTargetError;
use crate::gpu::GpuContext;

use super::attachment::{AttachmentDesc, RenderTargetDesc, Sampling, Wrap};
use super::target::{Attachment, RenderTarget, TargetLoad};

/// Square depth-only target rendered from the light.
///
/// No color attachments, so nothing but depth is ever written. The depth is
/// read through a comparison sampler that clamps to a white border: lookups
/// outside the light frustum compare against maximum depth and come out lit.
pub struct ShadowMap {
    target: RenderTarget,
    depth: Attachment,
}

impl ShadowMap {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth16Unorm;

    pub fn desc(resolution: u32) -> RenderTargetDesc {
        let sampling = Sampling::nearest()
            .with_wrap(Wrap::ClampToBorder(wgpu::SamplerBorderColor::OpaqueWhite))
            .with_compare(wgpu::CompareFunction::LessEqual);

        RenderTargetDesc::new("Shadow Map", resolution, resolution)
            .with_depth(AttachmentDesc::new("depth", Self::FORMAT).with_sampling(sampling))
    }

    pub fn new(gpu: &GpuContext, resolution: u32) -> Result<Self, RenderTargetError> {
        let target = RenderTarget::new(gpu, Self::desc(resolution))?;
        let depth = target
            .depth()
            .cloned()
            .ok_or_else(|| RenderTargetError::NoAttachments {
                label: target.label().to_string(),
            })?;
        Ok(Self { target, depth })
    }

    pub fn resolution(&self) -> u32 {
        self.target.width()
    }

    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    pub fn depth(&self) -> &Attachment {
        &self.depth
    }

    /// True when the shaders have to treat out-of-frustum lookups as lit
    /// themselves because the sampler could not clamp to a border.
    pub fn needs_border_guard(&self) -> bool {
        self.target.uses_border_fallback()
    }

    /// Depth-only pass over a map cleared to the far plane.
    pub fn begin_pass<'e>(&self, encoder: &'e mut wgpu::CommandEncoder) -> wgpu::RenderPass<'e> {
        self.target.begin_pass(
            encoder,
            TargetLoad {
                color: None,
                depth: Some(1.0),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_only_with_white_border() {
        let desc = ShadowMap::desc(2048);
        assert!(desc.color.is_empty());
        let depth = desc.depth.unwrap();
        assert_eq!(depth.format, ShadowMap::FORMAT);
        assert_eq!(
            depth.sampling.wrap,
            Wrap::ClampToBorder(wgpu::SamplerBorderColor::OpaqueWhite)
        );
        assert_eq!(depth.sampling.compare, Some(wgpu::CompareFunction::LessEqual));
        assert_eq!(desc.validate(&wgpu::Limits::default(), wgpu::Features::empty()), Ok(()));
    }
}
