//! The boundary between passes and the shading stage.
//!
//! A pass talks to a [`ShaderProgram`] the way it would talk to a GL program
//! object: make it current, set named uniforms, bind numbered texture units,
//! draw. The program maps those calls onto wgpu bind groups:
//!
//! - uniforms live in one struct at `@group(0) @binding(0)`, addressed by
//!   the names in [`names`];
//! - texture unit `N` is `@group(1) @binding(2N)` with its sampler at
//!   `@binding(2N + 1)`.

pub mod names;
mod program;
mod uniforms;

pub use program::{DepthTest, ProgramDesc, ShaderProgram, TextureSlot};
pub use uniforms::{UniformBlock, UniformField, UniformKind, UniformLayout};
