//! Uniforms shared by the forward and deferred lighting programs.

use glam::Mat4;

use crate::camera::Camera;
use crate::config::RenderSettings;
use crate::error::ShaderError;
use crate::shader::{ShaderProgram, UniformKind, names};

/// Light, material and shadow fields, in the order both lit shaders declare
/// them after their per-program matrices.
pub(crate) const LIGHTING_UNIFORMS: [(&str, UniformKind); 13] = [
    (names::LIGHT_VIEW_PROJ, UniformKind::Mat4),
    (names::EYE_POS, UniformKind::Vec3),
    (names::MIN_BIAS, UniformKind::Float),
    (names::LIGHT_DIRECTION, UniformKind::Vec3),
    (names::MAX_BIAS, UniformKind::Float),
    (names::LIGHT_COLOR, UniformKind::Vec3),
    (names::BIAS_CURVE, UniformKind::Int),
    (names::AMBIENT_COLOR, UniformKind::Vec3),
    (names::SHADOW_BORDER_GUARD, UniformKind::Int),
    (names::MATERIAL_KA, UniformKind::Float),
    (names::MATERIAL_KD, UniformKind::Float),
    (names::MATERIAL_KS, UniformKind::Float),
    (names::MATERIAL_SHININESS, UniformKind::Float),
];

/// Sets every per-frame lighting uniform once, before the pass draws.
pub(crate) fn set_lighting(
    program: &mut ShaderProgram,
    settings: &RenderSettings,
    camera: &Camera,
    light_view_proj: Mat4,
    border_guard: bool,
) -> Result<(), ShaderError> {
    let light = &settings.light;
    let material = &settings.material;
    let bias = &settings.shadow.bias;

    program.set_mat4(names::LIGHT_VIEW_PROJ, light_view_proj)?;
    program.set_vec3(names::EYE_POS, camera.position)?;
    program.set_vec3(names::LIGHT_DIRECTION, light.direction)?;
    program.set_vec3(names::LIGHT_COLOR, light.color)?;
    program.set_vec3(names::AMBIENT_COLOR, light.ambient)?;
    program.set_float(names::MATERIAL_KA, material.ka)?;
    program.set_float(names::MATERIAL_KD, material.kd)?;
    program.set_float(names::MATERIAL_KS, material.ks)?;
    program.set_float(names::MATERIAL_SHININESS, material.shininess)?;
    program.set_float(names::MIN_BIAS, bias.min)?;
    program.set_float(names::MAX_BIAS, bias.max)?;
    program.set_int(names::BIAS_CURVE, bias.curve.as_uniform())?;
    program.set_int(names::SHADOW_BORDER_GUARD, i32::from(border_guard))?;
    Ok(())
}

/// Uniform list of a lit program: its own leading fields, then the shared ones.
pub(crate) fn lit_uniforms(
    leading: &[(&'static str, UniformKind)],
) -> Vec<(&'static str, UniformKind)> {
    let mut fields = leading.to_vec();
    fields.extend_from_slice(&LIGHTING_UNIFORMS);
    fields
}
