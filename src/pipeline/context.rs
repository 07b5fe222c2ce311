use glam::Mat4;

use crate::camera::Camera;
use crate::config::{PipelineMode, RenderSettings};
use crate::hierarchy::Hierarchy;
use crate::mesh::Drawable;
use crate::texture::Texture;

/// One draw call: geometry, its model matrix, and optional albedo texture.
#[derive(Clone, Copy)]
pub struct DrawItem<'a> {
    pub drawable: &'a dyn Drawable,
    /// Bound as `_Model` right before the draw.
    pub model: Mat4,
    /// Albedo bound to texture unit 0; white when `None`.
    pub texture: Option<&'a Texture>,
    pub casts_shadow: bool,
}

impl<'a> DrawItem<'a> {
    pub fn new(drawable: &'a dyn Drawable, model: Mat4) -> Self {
        Self {
            drawable,
            model,
            texture: None,
            casts_shadow: true,
        }
    }

    pub fn with_texture(mut self, texture: &'a Texture) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn casts_shadow(mut self, casts_shadow: bool) -> Self {
        self.casts_shadow = casts_shadow;
        self
    }
}

impl std::fmt::Debug for DrawItem<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawItem")
            .field("model", &self.model)
            .field("textured", &self.texture.is_some())
            .field("casts_shadow", &self.casts_shadow)
            .finish()
    }
}

/// One draw per hierarchy node, using the globals of the last solve.
pub fn hierarchy_draws<'a>(
    hierarchy: &Hierarchy,
    drawable: &'a dyn Drawable,
    texture: Option<&'a Texture>,
) -> Vec<DrawItem<'a>> {
    hierarchy
        .global_transforms()
        .map(|&model| DrawItem {
            drawable,
            model,
            texture,
            casts_shadow: true,
        })
        .collect()
}

/// Everything a frame reads. Built by the caller each frame; the pipeline
/// keeps no scene state of its own.
#[derive(Clone, Copy, Debug)]
pub struct SceneContext<'a> {
    pub camera: &'a Camera,
    pub settings: &'a RenderSettings,
    pub draws: &'a [DrawItem<'a>],
}

/// A stage of the frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassKind {
    Shadow,
    /// Deferred only: fill the G-buffer.
    Geometry,
    /// Deferred only: full-screen lighting from the G-buffer.
    Lighting,
    /// Forward only: lit draws straight into the main target.
    Forward,
    PostProcess,
    Ui,
}

/// The fixed order passes run in for `mode`.
pub fn pass_order(mode: PipelineMode) -> &'static [PassKind] {
    match mode {
        PipelineMode::Forward => &[
            PassKind::Shadow,
            PassKind::Forward,
            PassKind::PostProcess,
            PassKind::Ui,
        ],
        PipelineMode::Deferred => &[
            PassKind::Shadow,
            PassKind::Geometry,
            PassKind::Lighting,
            PassKind::PostProcess,
            PassKind::Ui,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::TransformNode;
    use crate::mesh::FullscreenTriangle;

    #[test]
    fn shadow_runs_first_and_ui_last() {
        for mode in [PipelineMode::Forward, PipelineMode::Deferred] {
            let order = pass_order(mode);
            assert_eq!(order.first(), Some(&PassKind::Shadow));
            assert_eq!(order.last(), Some(&PassKind::Ui));
            let post = order.iter().position(|p| *p == PassKind::PostProcess).unwrap();
            assert_eq!(post, order.len() - 2);
        }
    }

    #[test]
    fn geometry_precedes_lighting_only_in_deferred() {
        let deferred = pass_order(PipelineMode::Deferred);
        let geometry = deferred.iter().position(|p| *p == PassKind::Geometry).unwrap();
        let lighting = deferred.iter().position(|p| *p == PassKind::Lighting).unwrap();
        assert!(geometry < lighting);
        assert!(!deferred.contains(&PassKind::Forward));

        let forward = pass_order(PipelineMode::Forward);
        assert!(!forward.contains(&PassKind::Geometry));
        assert!(!forward.contains(&PassKind::Lighting));
    }

    #[test]
    fn hierarchy_draws_follow_solved_globals() {
        let mut h = Hierarchy::new(vec![
            TransformNode::new().position(1.0, 0.0, 0.0),
            TransformNode::new().position(0.0, 1.0, 0.0).parent(0),
        ])
        .unwrap();
        h.solve();

        let triangle = FullscreenTriangle;
        let draws = hierarchy_draws(&h, &triangle, None);
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[1].model, h.global_transform(1).unwrap());
        assert!(draws.iter().all(|d| d.casts_shadow && d.texture.is_none()));
    }
}
