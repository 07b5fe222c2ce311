//! Tunables consumed by the frame pipeline.
//!
//! [`RenderSettings`] is the single configuration object the pipeline reads
//! each frame. Controllers (keyboard, debug UI) mutate it from the outside;
//! nothing in the renderer keeps its own copy of these values.
//!
//! ```
//! use penumbra::{PipelineMode, RenderSettings};
//!
//! let settings = RenderSettings::new()
//!     .screen(1280, 720)
//!     .shadow_resolution(4096)
//!     .mode(PipelineMode::Deferred);
//! assert_eq!(settings.shadow.resolution, 4096);
//! ```

use glam::Vec3;

/// Which lighting path a frame takes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PipelineMode {
    /// Lighting evaluated per object while drawing into the main target.
    #[default]
    Forward,
    /// Geometry written to a G-buffer, lighting evaluated once per pixel.
    Deferred,
}

impl PipelineMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Forward => Self::Deferred,
            Self::Deferred => Self::Forward,
        }
    }
}

/// Blinn-Phong material coefficients.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    /// Ambient coefficient.
    pub ka: f32,
    /// Diffuse coefficient.
    pub kd: f32,
    /// Specular coefficient.
    pub ks: f32,
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ka: 1.0,
            kd: 0.5,
            ks: 0.5,
            shininess: 128.0,
        }
    }
}

/// A single directional light.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    /// Direction the light travels (not the direction towards it).
    pub direction: Vec3,
    pub color: Vec3,
    /// Tint applied to the ambient term.
    pub ambient: Vec3,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            direction: Vec3::NEG_Y,
            color: Vec3::ONE,
            ambient: Vec3::new(0.3, 0.4, 0.46),
        }
    }
}

/// How the depth-comparison bias grows as a surface turns away from the light.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BiasCurve {
    /// `mix(max, min, n·l)`: linear in the cosine of the incidence angle.
    #[default]
    Linear,
    /// `clamp(max · tan(acos(n·l)), min, max)`: follows the surface slope.
    Slope,
}

impl BiasCurve {
    /// Value written to the `_BiasCurve` uniform.
    pub fn as_uniform(self) -> i32 {
        match self {
            Self::Linear => 0,
            Self::Slope => 1,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Linear => Self::Slope,
            Self::Slope => Self::Linear,
        }
    }
}

/// Bounds for the shadow comparison bias.
///
/// `min` applies to surfaces facing the light, `max` to grazing ones; too
/// little bias produces acne, too much detaches shadows from their casters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowBias {
    pub min: f32,
    pub max: f32,
    pub curve: BiasCurve,
}

impl Default for ShadowBias {
    fn default() -> Self {
        Self {
            min: 0.005,
            max: 0.015,
            curve: BiasCurve::Linear,
        }
    }
}

/// Shadow map and light camera configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowSettings {
    /// Edge length of the square shadow map, independent of screen size.
    pub resolution: u32,
    /// Height of the orthographic light volume.
    pub ortho_height: f32,
    /// How far the light camera sits from `focus`, against the light direction.
    pub distance: f32,
    pub near: f32,
    pub far: f32,
    /// Point of interest the light camera looks at.
    pub focus: Vec3,
    pub bias: ShadowBias,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            resolution: 2048,
            ortho_height: 15.0,
            distance: 10.0,
            near: 0.01,
            far: 30.0,
            focus: Vec3::ZERO,
            bias: ShadowBias::default(),
        }
    }
}

/// Chromatic aberration applied by the post-process pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PostProcessSettings {
    /// Screen-space offset of the red channel, in UV units.
    pub red_offset: f32,
    pub green_offset: f32,
    pub blue_offset: f32,
    pub enabled: bool,
}

impl Default for PostProcessSettings {
    fn default() -> Self {
        Self {
            red_offset: 0.005,
            green_offset: 0.0,
            blue_offset: -0.005,
            enabled: true,
        }
    }
}

/// Every tunable the frame pipeline reads.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderSettings {
    /// Initial screen width; screen-sized targets follow the surface afterwards.
    pub width: u32,
    pub height: u32,
    pub mode: PipelineMode,
    /// Clear color of the main offscreen target.
    pub clear_color: [f64; 4],
    pub material: Material,
    pub light: Light,
    pub shadow: ShadowSettings,
    pub post: PostProcessSettings,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 720,
            mode: PipelineMode::Forward,
            clear_color: [0.6, 0.8, 0.92, 1.0],
            material: Material::default(),
            light: Light::default(),
            shadow: ShadowSettings::default(),
            post: PostProcessSettings::default(),
        }
    }
}

impl RenderSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn screen(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn mode(mut self, mode: PipelineMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn shadow_resolution(mut self, resolution: u32) -> Self {
        self.shadow.resolution = resolution;
        self
    }

    pub fn shadow_bias(mut self, min: f32, max: f32) -> Self {
        self.shadow.bias.min = min;
        self.shadow.bias.max = max;
        self
    }

    pub fn material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn light(mut self, light: Light) -> Self {
        self.light = light;
        self
    }

    pub fn post_process(mut self, post: PostProcessSettings) -> Self {
        self.post = post;
        self
    }

    pub fn clear_color(mut self, rgba: [f64; 4]) -> Self {
        self.clear_color = rgba;
        self
    }

    pub(crate) fn clear_wgpu_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_color;
        wgpu::Color { r, g, b, a }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_scene() {
        let settings = RenderSettings::default();
        assert_eq!((settings.width, settings.height), (1080, 720));
        assert_eq!(settings.shadow.resolution, 2048);
        assert_eq!(settings.shadow.ortho_height, 15.0);
        assert_eq!(settings.light.direction, Vec3::NEG_Y);
        assert!(settings.shadow.bias.min < settings.shadow.bias.max);
        assert!(settings.post.enabled);
    }

    #[test]
    fn builder_chains() {
        let settings = RenderSettings::new()
            .screen(640, 480)
            .shadow_bias(0.001, 0.05)
            .mode(PipelineMode::Deferred);
        assert_eq!(settings.width, 640);
        assert_eq!(settings.shadow.bias.max, 0.05);
        assert_eq!(settings.mode.toggled(), PipelineMode::Forward);
    }
}
