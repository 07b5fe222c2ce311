//! Uniform names shared between Rust code and the WGSL shaders.
//!
//! These strings are the contract with the shading stage; renaming one means
//! renaming the matching struct field in every shader that declares it.

pub const MODEL: &str = "_Model";
pub const VIEW_PROJECTION: &str = "_ViewProjection";
pub const EYE_POS: &str = "_EyePos";
pub const LIGHT_VIEW_PROJ: &str = "_LightViewProj";

pub const LIGHT_DIRECTION: &str = "_Light.LightDirection";
pub const LIGHT_COLOR: &str = "_Light.LightColor";
pub const AMBIENT_COLOR: &str = "_Light.AmbientColor";

pub const MATERIAL_KA: &str = "_Material.Ka";
pub const MATERIAL_KD: &str = "_Material.Kd";
pub const MATERIAL_KS: &str = "_Material.Ks";
pub const MATERIAL_SHININESS: &str = "_Material.Shininess";

pub const MIN_BIAS: &str = "_MinBias";
pub const MAX_BIAS: &str = "_MaxBias";
pub const BIAS_CURVE: &str = "_BiasCurve";
/// Nonzero when the shadow sampler cannot clamp to a white border and the
/// shader must treat out-of-frustum lookups as lit itself.
pub const SHADOW_BORDER_GUARD: &str = "_ShadowBorderGuard";

pub const RED_OFFSET: &str = "_RedOffset";
pub const GREEN_OFFSET: &str = "_GreenOffset";
pub const BLUE_OFFSET: &str = "_BlueOffset";
pub const EFFECT_ON: &str = "_EffectOn";
