//! Keyboard controls over [`RenderSettings`] and the view camera.
//!
//! Controls only read and write the same settings object the pipeline
//! consumes each frame. They never see render targets or the hierarchy.
//!
//! | Key            | Action                              |
//! |----------------|-------------------------------------|
//! | `Tab`          | forward / deferred                  |
//! | `P`            | chromatic aberration on / off       |
//! | `B`            | cycle bias curve                    |
//! | `[` / `]`      | min bias down / up                  |
//! | `-` / `=`      | max bias down / up                  |
//! | `←` / `→`      | rotate light about the vertical     |
//! | `↑` / `↓`      | tilt light                          |
//! | `K` / `L`      | halve / double shininess            |
//! | `N` / `M`      | ambient coefficient down / up       |
//! | `;` / `'`      | diffuse coefficient down / up       |
//! | `,` / `.`      | specular coefficient down / up      |
//! | `C` / `V`      | aberration strength down / up       |
//! | `R`            | reset camera                        |

use glam::{Quat, Vec3};
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::camera::Camera;
use crate::config::RenderSettings;

pub const MIN_BIAS_LIMIT: f32 = 0.001;
pub const MAX_BIAS_LIMIT: f32 = 0.05;
pub const MIN_SHININESS: f32 = 2.0;
pub const MAX_SHININESS: f32 = 1024.0;

const BIAS_STEP: f32 = 0.001;
const LIGHT_STEP_RADIANS: f32 = std::f32::consts::PI / 12.0;
const TILT_STEP: f32 = 0.1;
const COEFFICIENT_STEP: f32 = 0.05;
const ABERRATION_STEP: f32 = 0.001;

/// A single change to the settings or camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ControlAction {
    TogglePipeline,
    TogglePostEffect,
    CycleBiasCurve,
    AdjustMinBias(f32),
    AdjustMaxBias(f32),
    /// Radians about +Y.
    RotateLight(f32),
    /// Added to the light direction's y component.
    TiltLight(f32),
    ScaleShininess(f32),
    AdjustAmbient(f32),
    AdjustDiffuse(f32),
    AdjustSpecular(f32),
    /// Spreads the red and blue offsets apart by this much each.
    AdjustAberration(f32),
    ResetCamera,
}

impl ControlAction {
    pub fn from_key(key: KeyCode) -> Option<Self> {
        let action = match key {
            KeyCode::Tab => Self::TogglePipeline,
            KeyCode::KeyP => Self::TogglePostEffect,
            KeyCode::KeyB => Self::CycleBiasCurve,
            KeyCode::BracketLeft => Self::AdjustMinBias(-BIAS_STEP),
            KeyCode::BracketRight => Self::AdjustMinBias(BIAS_STEP),
            KeyCode::Minus => Self::AdjustMaxBias(-BIAS_STEP),
            KeyCode::Equal => Self::AdjustMaxBias(BIAS_STEP),
            KeyCode::ArrowLeft => Self::RotateLight(LIGHT_STEP_RADIANS),
            KeyCode::ArrowRight => Self::RotateLight(-LIGHT_STEP_RADIANS),
            KeyCode::ArrowUp => Self::TiltLight(TILT_STEP),
            KeyCode::ArrowDown => Self::TiltLight(-TILT_STEP),
            KeyCode::KeyK => Self::ScaleShininess(0.5),
            KeyCode::KeyL => Self::ScaleShininess(2.0),
            KeyCode::KeyN => Self::AdjustAmbient(-COEFFICIENT_STEP),
            KeyCode::KeyM => Self::AdjustAmbient(COEFFICIENT_STEP),
            KeyCode::Semicolon => Self::AdjustDiffuse(-COEFFICIENT_STEP),
            KeyCode::Quote => Self::AdjustDiffuse(COEFFICIENT_STEP),
            KeyCode::Comma => Self::AdjustSpecular(-COEFFICIENT_STEP),
            KeyCode::Period => Self::AdjustSpecular(COEFFICIENT_STEP),
            KeyCode::KeyC => Self::AdjustAberration(-ABERRATION_STEP),
            KeyCode::KeyV => Self::AdjustAberration(ABERRATION_STEP),
            KeyCode::KeyR => Self::ResetCamera,
            _ => return None,
        };
        Some(action)
    }
}

/// Maps key presses to [`ControlAction`]s and applies them.
#[derive(Clone, Debug)]
pub struct Controls {
    home: Camera,
}

impl Controls {
    /// `home` is where [`ControlAction::ResetCamera`] puts the camera back.
    pub fn new(home: Camera) -> Self {
        Self { home }
    }

    /// Applies the action bound to a pressed key, if any.
    pub fn handle_event(
        &self,
        event: &WindowEvent,
        settings: &mut RenderSettings,
        camera: &mut Camera,
    ) -> Option<ControlAction> {
        let WindowEvent::KeyboardInput { event, .. } = event else {
            return None;
        };
        if event.state != ElementState::Pressed || event.repeat {
            return None;
        }
        let PhysicalKey::Code(key) = event.physical_key else {
            return None;
        };
        let action = ControlAction::from_key(key)?;
        self.apply(action, settings, camera);
        Some(action)
    }

    pub fn apply(&self, action: ControlAction, settings: &mut RenderSettings, camera: &mut Camera) {
        match action {
            ControlAction::TogglePipeline => {
                settings.mode = settings.mode.toggled();
            }
            ControlAction::TogglePostEffect => {
                settings.post.enabled = !settings.post.enabled;
            }
            ControlAction::CycleBiasCurve => {
                let bias = &mut settings.shadow.bias;
                bias.curve = bias.curve.next();
            }
            ControlAction::AdjustMinBias(delta) => {
                let bias = &mut settings.shadow.bias;
                bias.min = (bias.min + delta).clamp(MIN_BIAS_LIMIT, MAX_BIAS_LIMIT);
                bias.max = bias.max.max(bias.min);
            }
            ControlAction::AdjustMaxBias(delta) => {
                let bias = &mut settings.shadow.bias;
                bias.max = (bias.max + delta).clamp(MIN_BIAS_LIMIT, MAX_BIAS_LIMIT);
                bias.min = bias.min.min(bias.max);
            }
            ControlAction::RotateLight(radians) => {
                let rotated = Quat::from_rotation_y(radians) * settings.light.direction;
                settings.light.direction = clamp_direction(rotated);
            }
            ControlAction::TiltLight(delta) => {
                let mut direction = settings.light.direction;
                direction.y += delta;
                settings.light.direction = clamp_direction(direction);
            }
            ControlAction::ScaleShininess(factor) => {
                let material = &mut settings.material;
                material.shininess = (material.shininess * factor).clamp(MIN_SHININESS, MAX_SHININESS);
            }
            ControlAction::AdjustAmbient(delta) => {
                let material = &mut settings.material;
                material.ka = (material.ka + delta).clamp(0.0, 1.0);
            }
            ControlAction::AdjustDiffuse(delta) => {
                let material = &mut settings.material;
                material.kd = (material.kd + delta).clamp(0.0, 1.0);
            }
            ControlAction::AdjustSpecular(delta) => {
                let material = &mut settings.material;
                material.ks = (material.ks + delta).clamp(0.0, 1.0);
            }
            ControlAction::AdjustAberration(delta) => {
                let post = &mut settings.post;
                post.red_offset = (post.red_offset + delta).clamp(-1.0, 1.0);
                post.blue_offset = (post.blue_offset - delta).clamp(-1.0, 1.0);
            }
            ControlAction::ResetCamera => {
                let aspect = camera.aspect;
                *camera = self.home.with_aspect(aspect);
            }
        }
        log::debug!("applied {:?}", action);
    }
}

/// Keeps each component in [-1, 1] and never returns the zero vector.
fn clamp_direction(direction: Vec3) -> Vec3 {
    let clamped = direction.clamp(Vec3::splat(-1.0), Vec3::ONE);
    if clamped.length_squared() < 1e-6 {
        Vec3::NEG_Y
    } else {
        clamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BiasCurve, PipelineMode};

    fn run(actions: &[ControlAction]) -> (RenderSettings, Camera) {
        let controls = Controls::new(Camera::default());
        let mut settings = RenderSettings::default();
        let mut camera = Camera::default();
        for &action in actions {
            controls.apply(action, &mut settings, &mut camera);
        }
        (settings, camera)
    }

    #[test]
    fn toggles_flip_back_and_forth() {
        let (settings, _) = run(&[ControlAction::TogglePipeline]);
        assert_eq!(settings.mode, PipelineMode::Deferred);
        let (settings, _) = run(&[ControlAction::TogglePipeline, ControlAction::TogglePipeline]);
        assert_eq!(settings.mode, PipelineMode::Forward);

        let (settings, _) = run(&[ControlAction::TogglePostEffect, ControlAction::CycleBiasCurve]);
        assert!(!settings.post.enabled);
        assert_eq!(settings.shadow.bias.curve, BiasCurve::Slope);
    }

    #[test]
    fn biases_stay_in_slider_range_and_ordered() {
        let (settings, _) = run(&[ControlAction::AdjustMinBias(-1.0)]);
        assert_eq!(settings.shadow.bias.min, MIN_BIAS_LIMIT);

        let (settings, _) = run(&[ControlAction::AdjustMaxBias(1.0)]);
        assert_eq!(settings.shadow.bias.max, MAX_BIAS_LIMIT);

        // min pushed past max drags max along
        let (settings, _) = run(&[ControlAction::AdjustMinBias(0.02)]);
        let bias = settings.shadow.bias;
        assert!(bias.min <= bias.max);
        assert!((bias.min - 0.025).abs() < 1e-6);

        let (settings, _) = run(&[ControlAction::AdjustMaxBias(-1.0)]);
        let bias = settings.shadow.bias;
        assert_eq!(bias.max, MIN_BIAS_LIMIT);
        assert!(bias.min <= bias.max);
    }

    #[test]
    fn material_values_are_clamped() {
        let (settings, _) = run(&[ControlAction::ScaleShininess(1e6)]);
        assert_eq!(settings.material.shininess, MAX_SHININESS);
        let (settings, _) = run(&[ControlAction::ScaleShininess(1e-6)]);
        assert_eq!(settings.material.shininess, MIN_SHININESS);
        let (settings, _) = run(&[ControlAction::AdjustSpecular(5.0)]);
        assert_eq!(settings.material.ks, 1.0);
        let (settings, _) = run(&[ControlAction::AdjustSpecular(-5.0)]);
        assert_eq!(settings.material.ks, 0.0);

        let (settings, _) = run(&[ControlAction::AdjustAmbient(5.0), ControlAction::AdjustDiffuse(-5.0)]);
        assert_eq!(settings.material.ka, 1.0);
        assert_eq!(settings.material.kd, 0.0);
        let (settings, _) = run(&[ControlAction::AdjustAmbient(-5.0), ControlAction::AdjustDiffuse(5.0)]);
        assert_eq!(settings.material.ka, 0.0);
        assert_eq!(settings.material.kd, 1.0);

        let defaults = RenderSettings::default().material;
        let (settings, _) = run(&[ControlAction::AdjustDiffuse(COEFFICIENT_STEP)]);
        assert!((settings.material.kd - (defaults.kd + COEFFICIENT_STEP)).abs() < 1e-6);
        assert_eq!(settings.material.ka, defaults.ka);
        assert_eq!(settings.material.ks, defaults.ks);
    }

    #[test]
    fn light_direction_stays_usable() {
        let (settings, _) = run(&[ControlAction::TiltLight(5.0)]);
        assert!(settings.light.direction.cmple(Vec3::ONE).all());
        assert!(settings.light.direction.cmpge(Vec3::splat(-1.0)).all());

        // tilting a straight-down light to zero falls back to straight down
        let (settings, _) = run(&[ControlAction::TiltLight(1.0)]);
        assert_eq!(settings.light.direction, Vec3::NEG_Y);

        let mut settings = RenderSettings::default();
        settings.light.direction = Vec3::new(1.0, -1.0, 0.0);
        let controls = Controls::new(Camera::default());
        let mut camera = Camera::default();
        controls.apply(
            ControlAction::RotateLight(std::f32::consts::FRAC_PI_2),
            &mut settings,
            &mut camera,
        );
        assert!(settings.light.direction.abs_diff_eq(Vec3::new(0.0, -1.0, -1.0), 1e-5));
    }

    #[test]
    fn reset_restores_home_but_keeps_aspect() {
        let home = Camera::default().at(0.0, 2.0, 8.0);
        let controls = Controls::new(home);
        let mut settings = RenderSettings::default();
        let mut camera = Camera::default().at(5.0, 5.0, 5.0).with_aspect(1.5);
        controls.apply(ControlAction::ResetCamera, &mut settings, &mut camera);
        assert_eq!(camera.position, home.position);
        assert_eq!(camera.aspect, 1.5);
    }

    #[test]
    fn keys_map_to_their_actions() {
        assert_eq!(ControlAction::from_key(KeyCode::KeyZ), None);
        assert_eq!(ControlAction::from_key(KeyCode::Tab), Some(ControlAction::TogglePipeline));
        assert_eq!(
            ControlAction::from_key(KeyCode::KeyM),
            Some(ControlAction::AdjustAmbient(COEFFICIENT_STEP))
        );
        assert_eq!(
            ControlAction::from_key(KeyCode::Semicolon),
            Some(ControlAction::AdjustDiffuse(-COEFFICIENT_STEP))
        );
    }
}
