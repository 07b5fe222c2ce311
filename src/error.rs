//! Error types for every fallible operation in the crate.
//!
//! Render-target completeness failures are fatal for the target being built
//! and are returned from construction, never deferred to draw time.

use thiserror::Error;

/// A render target failed its completeness check or could not be allocated.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RenderTargetError {
    #[error("render target '{label}' has zero size ({width}x{height})")]
    ZeroSize {
        label: String,
        width: u32,
        height: u32,
    },

    #[error("render target '{label}' is {width}x{height}, device maximum is {max}")]
    TooLarge {
        label: String,
        width: u32,
        height: u32,
        max: u32,
    },

    #[error("render target '{label}' has no attachments")]
    NoAttachments { label: String },

    #[error("render target '{label}' declares {count} color attachments, limit is {max}")]
    TooManyColorAttachments {
        label: String,
        count: usize,
        max: usize,
    },

    #[error(
        "attachment '{attachment}' of '{label}' is {width}x{height}, target is {expected_width}x{expected_height}"
    )]
    MismatchedDimensions {
        label: String,
        attachment: String,
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    #[error("attachment '{attachment}' of '{label}' uses {format:?}, which is not color-renderable")]
    NotColorRenderable {
        label: String,
        attachment: String,
        format: wgpu::TextureFormat,
    },

    #[error("attachment '{attachment}' of '{label}' uses {format:?}, which has no depth aspect")]
    NotDepthFormat {
        label: String,
        attachment: String,
        format: wgpu::TextureFormat,
    },

    #[error("color attachments of '{label}' need {bytes} bytes per sample, limit is {max}")]
    TooManyBytesPerSample { label: String, bytes: u32, max: u32 },

    #[error("device rejected render target '{label}': {message}")]
    Device { label: String, message: String },
}

/// The parent-before-child storage order of a hierarchy was violated.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("node {index} names parent {parent}, which is not stored before it")]
    ParentNotBeforeChild { index: usize, parent: usize },

    #[error("node index {index} is out of range for a hierarchy of {len} nodes")]
    OutOfRange { index: usize, len: usize },
}

/// Misuse of the named-uniform / texture-unit shader boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShaderError {
    #[error("program '{program}' has no uniform named '{name}'")]
    UnknownUniform { program: String, name: String },

    #[error("uniform '{name}' is {expected}, not {found}")]
    UniformKindMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("uniform layout declares '{name}' twice")]
    DuplicateUniform { name: String },

    #[error("program '{program}' has no texture unit {unit}")]
    UnknownTextureUnit { program: String, unit: u32 },

    #[error("program '{program}' drew with texture unit {unit} unbound")]
    UnboundTextureUnit { program: String, unit: u32 },

    #[error("program '{program}' exceeded its {capacity} draws for this frame")]
    DrawCapacityExceeded { program: String, capacity: u32 },

    #[error("program '{program}' failed to build: {message}")]
    Compile { program: String, message: String },
}

/// Window surface and device bring-up failures.
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    RequestAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}

/// Anything that can stop a frame from being produced.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Target(#[from] RenderTargetError),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}
