//! Frame passes and the pipeline that sequences them.
//!
//! A frame is a fixed sequence of [`PassKind`]s (see [`pass_order`]):
//!
//! ```text
//! Forward:   Shadow -> Forward ----------------> PostProcess -> Ui
//! Deferred:  Shadow -> Geometry -> Lighting ---> PostProcess -> Ui
//! ```
//!
//! Forward and deferred produce the same image for the same scene; they differ
//! in where lighting runs. [`FramePipeline`] owns the targets and programs,
//! and reads everything else from a [`SceneContext`] built by the caller.

mod context;
mod deferred;
mod forward;
mod frame;
mod lighting;
mod post_process;

pub use crate::config::PipelineMode;
pub use context::{DrawItem, PassKind, SceneContext, hierarchy_draws, pass_order};
pub use deferred::{DEFERRED_SHADOW_MAP_UNIT, DeferredPass};
pub use forward::{ForwardPass, MAIN_TEX_UNIT, SHADOW_MAP_UNIT};
pub use frame::{DEFAULT_MAX_DRAWS, FramePipeline};
pub use post_process::PostProcessPass;
