//! Attachment descriptions and the completeness check.
//!
//! Everything here is plain data so a target layout can be validated against
//! a device's limits without touching the GPU.

use crate::error::RenderTargetError;

/// Hard ceiling on color attachments, independent of device limits.
pub const MAX_COLOR_ATTACHMENTS: usize = 8;

/// Address mode used when an attachment is later sampled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wrap {
    Repeat,
    ClampToEdge,
    /// Reads outside `[0, 1]` return the border color.
    ClampToBorder(wgpu::SamplerBorderColor),
}

/// How an attachment is read by later passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sampling {
    pub filter: wgpu::FilterMode,
    pub wrap: Wrap,
    /// Set for depth attachments read through a comparison sampler.
    pub compare: Option<wgpu::CompareFunction>,
}

impl Default for Sampling {
    fn default() -> Self {
        Self::linear()
    }
}

impl Sampling {
    pub fn linear() -> Self {
        Self {
            filter: wgpu::FilterMode::Linear,
            wrap: Wrap::ClampToEdge,
            compare: None,
        }
    }

    pub fn nearest() -> Self {
        Self {
            filter: wgpu::FilterMode::Nearest,
            ..Self::linear()
        }
    }

    pub fn with_wrap(mut self, wrap: Wrap) -> Self {
        self.wrap = wrap;
        self
    }

    pub fn with_compare(mut self, compare: wgpu::CompareFunction) -> Self {
        self.compare = Some(compare);
        self
    }

    /// Address mode and border color actually usable with `features`.
    ///
    /// Border clamping needs `ADDRESS_MODE_CLAMP_TO_BORDER`; without it the
    /// mode degrades to clamp-to-edge and the third value reports the fallback.
    pub fn resolve(
        &self,
        features: wgpu::Features,
    ) -> (wgpu::AddressMode, Option<wgpu::SamplerBorderColor>, bool) {
        match self.wrap {
            Wrap::Repeat => (wgpu::AddressMode::Repeat, None, false),
            Wrap::ClampToEdge => (wgpu::AddressMode::ClampToEdge, None, false),
            Wrap::ClampToBorder(color) => {
                if features.contains(wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER) {
                    (wgpu::AddressMode::ClampToBorder, Some(color), false)
                } else {
                    (wgpu::AddressMode::ClampToEdge, None, true)
                }
            }
        }
    }

    pub(crate) fn sampler_descriptor<'a>(
        &self,
        label: &'a str,
        features: wgpu::Features,
    ) -> wgpu::SamplerDescriptor<'a> {
        let (address_mode, border_color, _) = self.resolve(features);
        wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            mag_filter: self.filter,
            min_filter: self.filter,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: self.compare,
            border_color,
            ..Default::default()
        }
    }
}

/// One attachment of a render target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttachmentDesc {
    pub name: &'static str,
    pub format: wgpu::TextureFormat,
    /// Explicit size; `None` follows the target.
    pub size: Option<(u32, u32)>,
    pub sampling: Sampling,
}

impl AttachmentDesc {
    pub fn new(name: &'static str, format: wgpu::TextureFormat) -> Self {
        Self {
            name,
            format,
            size: None,
            sampling: Sampling::default(),
        }
    }

    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }
}

/// Full attachment layout of a render target.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderTargetDesc {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub color: Vec<AttachmentDesc>,
    pub depth: Option<AttachmentDesc>,
}

impl RenderTargetDesc {
    pub fn new(label: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            label: label.into(),
            width,
            height,
            color: Vec::new(),
            depth: None,
        }
    }

    pub fn with_color(mut self, attachment: AttachmentDesc) -> Self {
        self.color.push(attachment);
        self
    }

    pub fn with_depth(mut self, attachment: AttachmentDesc) -> Self {
        self.depth = Some(attachment);
        self
    }

    /// Same layout at a new size. Explicit attachment sizes are dropped.
    pub fn resized(&self, width: u32, height: u32) -> Self {
        let mut desc = self.clone();
        desc.width = width;
        desc.height = height;
        for attachment in desc.color.iter_mut().chain(desc.depth.iter_mut()) {
            attachment.size = None;
        }
        desc
    }

    pub fn attachments(&self) -> impl Iterator<Item = &AttachmentDesc> + '_ {
        self.color.iter().chain(self.depth.iter())
    }

    /// Bytes per sample of all color attachments, aligned the way the device
    /// packs them into tile memory.
    pub fn color_bytes_per_sample(&self) -> u32 {
        self.color.iter().fold(0, |total, attachment| {
            let format = attachment.format;
            match (
                format.target_pixel_byte_cost(),
                format.target_component_alignment(),
            ) {
                (Some(cost), Some(align)) => total.div_ceil(align) * align + cost,
                _ => total,
            }
        })
    }

    /// Completeness check: decides whether this layout can be allocated and
    /// rendered into on a device with `limits` and `features`.
    pub fn validate(
        &self,
        limits: &wgpu::Limits,
        features: wgpu::Features,
    ) -> Result<(), RenderTargetError> {
        let label = || self.label.clone();

        if self.width == 0 || self.height == 0 {
            return Err(RenderTargetError::ZeroSize {
                label: label(),
                width: self.width,
                height: self.height,
            });
        }
        let max = limits.max_texture_dimension_2d;
        if self.width > max || self.height > max {
            return Err(RenderTargetError::TooLarge {
                label: label(),
                width: self.width,
                height: self.height,
                max,
            });
        }

        if self.color.is_empty() && self.depth.is_none() {
            return Err(RenderTargetError::NoAttachments { label: label() });
        }

        let max_color = MAX_COLOR_ATTACHMENTS.min(limits.max_color_attachments as usize);
        if self.color.len() > max_color {
            return Err(RenderTargetError::TooManyColorAttachments {
                label: label(),
                count: self.color.len(),
                max: max_color,
            });
        }

        for attachment in self.attachments() {
            let Some((width, height)) = attachment.size else {
                continue;
            };
            if (width, height) != (self.width, self.height) {
                return Err(RenderTargetError::MismatchedDimensions {
                    label: label(),
                    attachment: attachment.name.to_string(),
                    width,
                    height,
                    expected_width: self.width,
                    expected_height: self.height,
                });
            }
        }

        let required = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING;
        for attachment in &self.color {
            let format = attachment.format;
            let usages = format.guaranteed_format_features(features).allowed_usages;
            if !format.has_color_aspect() || !usages.contains(required) {
                return Err(RenderTargetError::NotColorRenderable {
                    label: label(),
                    attachment: attachment.name.to_string(),
                    format,
                });
            }
        }
        if let Some(attachment) = &self.depth {
            let format = attachment.format;
            let usages = format.guaranteed_format_features(features).allowed_usages;
            if !format.has_depth_aspect() || !usages.contains(required) {
                return Err(RenderTargetError::NotDepthFormat {
                    label: label(),
                    attachment: attachment.name.to_string(),
                    format,
                });
            }
        }

        let bytes = self.color_bytes_per_sample();
        if bytes > limits.max_color_attachment_bytes_per_sample {
            return Err(RenderTargetError::TooManyBytesPerSample {
                label: label(),
                bytes,
                max: limits.max_color_attachment_bytes_per_sample,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat as F;

    fn check(desc: &RenderTargetDesc) -> Result<(), RenderTargetError> {
        desc.validate(&wgpu::Limits::default(), wgpu::Features::empty())
    }

    fn multi_target(count: usize, format: wgpu::TextureFormat, with_depth: bool) -> RenderTargetDesc {
        let mut desc = RenderTargetDesc::new("multi", 256, 128);
        for _ in 0..count {
            desc = desc.with_color(AttachmentDesc::new("color", format));
        }
        if with_depth {
            desc = desc.with_depth(AttachmentDesc::new("depth", F::Depth32Float));
        }
        desc
    }

    #[test]
    fn one_to_eight_color_slots_with_optional_depth_are_complete() {
        for count in 1..=MAX_COLOR_ATTACHMENTS {
            for with_depth in [false, true] {
                let desc = multi_target(count, F::R8Unorm, with_depth);
                assert_eq!(check(&desc), Ok(()), "{count} color, depth {with_depth}");
            }
        }
    }

    #[test]
    fn eight_rgba8_slots_need_a_wider_byte_budget() {
        // Rgba8Unorm costs 8 bytes per sample, so 8 slots need 64
        let desc = multi_target(MAX_COLOR_ATTACHMENTS, F::Rgba8Unorm, true);
        assert_eq!(desc.color_bytes_per_sample(), 64);
        assert!(matches!(
            check(&desc),
            Err(RenderTargetError::TooManyBytesPerSample { bytes: 64, max: 32, .. })
        ));

        let wide = wgpu::Limits {
            max_color_attachment_bytes_per_sample: 64,
            ..wgpu::Limits::default()
        };
        for count in 1..=MAX_COLOR_ATTACHMENTS {
            let desc = multi_target(count, F::Rgba8Unorm, true);
            assert_eq!(desc.validate(&wide, wgpu::Features::empty()), Ok(()), "{count} color");
        }
    }

    #[test]
    fn depth_only_is_complete() {
        let desc = RenderTargetDesc::new("shadow", 2048, 2048)
            .with_depth(AttachmentDesc::new("depth", F::Depth16Unorm));
        assert_eq!(check(&desc), Ok(()));
    }

    #[test]
    fn mismatched_attachment_size_fails() {
        let desc = RenderTargetDesc::new("bad", 640, 480)
            .with_color(AttachmentDesc::new("albedo", F::Rgba8Unorm))
            .with_color(AttachmentDesc::new("normal", F::Rgba8Unorm).with_size(320, 240));
        assert!(matches!(
            check(&desc),
            Err(RenderTargetError::MismatchedDimensions { attachment, .. }) if attachment == "normal"
        ));
    }

    #[test]
    fn empty_and_zero_sized_targets_fail() {
        assert!(matches!(
            check(&RenderTargetDesc::new("empty", 64, 64)),
            Err(RenderTargetError::NoAttachments { .. })
        ));
        let zero = RenderTargetDesc::new("zero", 0, 64)
            .with_color(AttachmentDesc::new("color", F::Rgba8Unorm));
        assert!(matches!(check(&zero), Err(RenderTargetError::ZeroSize { .. })));
        let huge = RenderTargetDesc::new("huge", 1 << 20, 64)
            .with_color(AttachmentDesc::new("color", F::Rgba8Unorm));
        assert!(matches!(check(&huge), Err(RenderTargetError::TooLarge { .. })));
    }

    #[test]
    fn nine_color_slots_fail() {
        let mut desc = RenderTargetDesc::new("wide", 64, 64);
        for _ in 0..9 {
            desc = desc.with_color(AttachmentDesc::new("color", F::R8Unorm));
        }
        assert!(matches!(
            check(&desc),
            Err(RenderTargetError::TooManyColorAttachments { count: 9, max: 8, .. })
        ));
    }

    #[test]
    fn wrong_aspect_formats_fail() {
        let depth_as_color = RenderTargetDesc::new("t", 64, 64)
            .with_color(AttachmentDesc::new("color", F::Depth32Float));
        assert!(matches!(
            check(&depth_as_color),
            Err(RenderTargetError::NotColorRenderable { .. })
        ));

        let color_as_depth = RenderTargetDesc::new("t", 64, 64)
            .with_depth(AttachmentDesc::new("depth", F::Rgba8Unorm));
        assert!(matches!(
            check(&color_as_depth),
            Err(RenderTargetError::NotDepthFormat { .. })
        ));

        let compressed = RenderTargetDesc::new("t", 64, 64)
            .with_color(AttachmentDesc::new("color", F::Bc1RgbaUnorm));
        assert!(matches!(
            check(&compressed),
            Err(RenderTargetError::NotColorRenderable { .. })
        ));
    }

    #[test]
    fn bytes_per_sample_limit_is_enforced() {
        let desc = RenderTargetDesc::new("fat", 64, 64)
            .with_color(AttachmentDesc::new("a", F::Rgba32Float))
            .with_color(AttachmentDesc::new("b", F::Rgba32Float))
            .with_color(AttachmentDesc::new("c", F::Rgba32Float));
        assert_eq!(desc.color_bytes_per_sample(), 48);
        assert!(matches!(
            check(&desc),
            Err(RenderTargetError::TooManyBytesPerSample { bytes: 48, .. })
        ));
    }

    #[test]
    fn border_clamp_falls_back_without_feature() {
        let sampling = Sampling::nearest()
            .with_wrap(Wrap::ClampToBorder(wgpu::SamplerBorderColor::OpaqueWhite));

        let (mode, border, fell_back) = sampling.resolve(wgpu::Features::empty());
        assert_eq!(mode, wgpu::AddressMode::ClampToEdge);
        assert_eq!(border, None);
        assert!(fell_back);

        let (mode, border, fell_back) =
            sampling.resolve(wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER);
        assert_eq!(mode, wgpu::AddressMode::ClampToBorder);
        assert_eq!(border, Some(wgpu::SamplerBorderColor::OpaqueWhite));
        assert!(!fell_back);
    }

    #[test]
    fn resized_drops_explicit_sizes() {
        let desc = RenderTargetDesc::new("t", 64, 64)
            .with_color(AttachmentDesc::new("c", F::Rgba8Unorm).with_size(64, 64));
        let resized = desc.resized(128, 96);
        assert_eq!((resized.width, resized.height), (128, 96));
        assert_eq!(check(&resized), Ok(()));
    }
}
