//! Offscreen render targets.
//!
//! [`RenderTarget`] is the one configurable framebuffer type; [`GBuffer`] and
//! [`ShadowMap`] are fixed attachment layouts built on top of it. Every target
//! is checked for completeness before it is allocated and is recreated, never
//! resized in place, when its dimensions change.

mod attachment;
mod gbuffer;
mod shadow_map;
mod target;

pub use attachment::{AttachmentDesc, MAX_COLOR_ATTACHMENTS, RenderTargetDesc, Sampling, Wrap};
pub use gbuffer::GBuffer;
pub use shadow_map::ShadowMap;
pub use target::{
    Attachment, COLOR_TARGET_DEPTH_FORMAT, COLOR_TARGET_FORMAT, RenderTarget, TargetLoad,
};
