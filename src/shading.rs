//! CPU reference for the lighting model the shaders evaluate.
//!
//! Same math as `lit.wgsl` and `deferred_lit.wgsl`, written against glam so
//! shading and shadow behaviour can be checked without a GPU, and used to
//! pick sensible defaults for new scenes.

use glam::{Mat4, Vec3, Vec4};

use crate::camera::ndc_to_uv;
use crate::config::{Light, Material, ShadowBias};
use crate::shadow::{shadow_bias, shadow_visibility};

/// Blinn-Phong color of a surface point.
///
/// `visibility` is the shadow term: 1 lit, 0 fully shadowed. Only the
/// diffuse and specular terms are attenuated; ambient always applies.
pub fn blinn_phong(
    normal: Vec3,
    world_pos: Vec3,
    eye_pos: Vec3,
    albedo: Vec3,
    light: &Light,
    material: &Material,
    visibility: f32,
) -> Vec3 {
    let normal = normal.normalize_or_zero();
    let to_light = -light.direction.normalize_or(Vec3::NEG_Y);
    let to_eye = (eye_pos - world_pos).normalize_or_zero();

    let diffuse = normal.dot(to_light).max(0.0);
    let half = (to_light + to_eye).normalize_or_zero();
    let specular = normal.dot(half).max(0.0).powf(material.shininess);

    let direct = (material.kd * diffuse + material.ks * specular) * light.color * visibility;
    let ambient = light.ambient * material.ka;
    albedo * (direct + ambient)
}

/// A square depth image addressed by UV, the CPU stand-in for a shadow map.
#[derive(Clone, Debug, PartialEq)]
pub struct DepthImage {
    resolution: u32,
    texels: Vec<f32>,
}

impl DepthImage {
    /// Image cleared to the far plane.
    pub fn new(resolution: u32) -> Self {
        let resolution = resolution.max(1);
        Self {
            resolution,
            texels: vec![1.0; (resolution * resolution) as usize],
        }
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// UV of the center of texel `(x, y)`.
    pub fn texel_center(&self, x: u32, y: u32) -> (f32, f32) {
        let size = self.resolution as f32;
        ((x as f32 + 0.5) / size, (y as f32 + 0.5) / size)
    }

    /// Stores a depth as a 16-bit unorm texel would hold it.
    pub fn store(&mut self, x: u32, y: u32, depth: f32) {
        if x < self.resolution && y < self.resolution {
            self.texels[(y * self.resolution + x) as usize] = quantize_unorm16(depth);
        }
    }

    /// Nearest-texel lookup; outside `[0, 1]` reads the white border.
    pub fn sample(&self, u: f32, v: f32) -> f32 {
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return 1.0;
        }
        let last = self.resolution - 1;
        let x = ((u * self.resolution as f32) as u32).min(last);
        let y = ((v * self.resolution as f32) as u32).min(last);
        self.texels[(y * self.resolution + x) as usize]
    }
}

pub fn quantize_unorm16(value: f32) -> f32 {
    (value.clamp(0.0, 1.0) * 65535.0).round() / 65535.0
}

/// Projects a world position into the light's shadow map: `(u, v, depth)`.
pub fn light_space(light_view_proj: Mat4, world_pos: Vec3) -> Vec3 {
    let clip = light_view_proj * Vec4::from((world_pos, 1.0));
    let ndc = clip.truncate() / clip.w;
    let uv = ndc_to_uv(ndc.truncate());
    Vec3::new(uv.x, uv.y, ndc.z)
}

/// Shadow term for a surface point, as the lit shaders compute it.
///
/// Points beyond the light's far plane or outside its frustum are lit.
pub fn shadow_term(
    map: &DepthImage,
    light_view_proj: Mat4,
    world_pos: Vec3,
    normal: Vec3,
    light: &Light,
    bias: &ShadowBias,
) -> f32 {
    let coords = light_space(light_view_proj, world_pos);
    if coords.z > 1.0 {
        return 1.0;
    }
    let to_light = -light.direction.normalize_or(Vec3::NEG_Y);
    let bias = shadow_bias(normal.normalize_or_zero().dot(to_light), bias);
    shadow_visibility(map.sample(coords.x, coords.y), coords.z, bias)
}

/// The three texels the geometry pass writes for one fragment.
///
/// Position carries `w = 1` so the lighting pass can tell covered pixels
/// from the cleared background.
pub fn gbuffer_texels(world_pos: Vec3, normal: Vec3, albedo: Vec3) -> [Vec4; 3] {
    [
        Vec4::from((world_pos, 1.0)),
        Vec4::from((normal.normalize_or_zero(), 0.0)),
        Vec4::from((albedo, 1.0)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{Camera, uv_to_ndc};
    use crate::config::{BiasCurve, ShadowSettings};
    use crate::render_target::GBuffer;
    use crate::shadow::light_camera;
    use glam::Vec2;

    /// Ray/axis-aligned box intersection (slab method), nearest positive t.
    fn hit_box(origin: Vec3, dir: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
        let inv = dir.recip();
        let t0 = (min - origin) * inv;
        let t1 = (max - origin) * inv;
        let near = t0.min(t1).max_element();
        let far = t0.max(t1).min_element();
        (near <= far && far > 0.0).then_some(near.max(0.0))
    }

    fn hit_floor(origin: Vec3, dir: Vec3, y: f32, half: f32) -> Option<f32> {
        if dir.y.abs() < 1e-6 {
            return None;
        }
        let t = (y - origin.y) / dir.y;
        let p = origin + dir * t;
        (t > 0.0 && p.x.abs() <= half && p.z.abs() <= half).then_some(t)
    }

    /// Scene: 10x10 floor at y = -2 and a unit cube at the origin.
    fn trace(origin: Vec3, dir: Vec3) -> Option<Vec3> {
        let cube = hit_box(origin, dir, Vec3::splat(-0.5), Vec3::splat(0.5));
        let floor = hit_floor(origin, dir, -2.0, 5.0);
        let t = match (cube, floor) {
            (Some(a), Some(b)) => a.min(b),
            (a, b) => a.or(b)?,
        };
        Some(origin + dir * t)
    }

    /// Depth-only pass rendered by ray casting through each texel center.
    fn render_shadow_map(light: &Camera, resolution: u32) -> DepthImage {
        let mut map = DepthImage::new(resolution);
        let dir = light.forward();
        for y in 0..resolution {
            for x in 0..resolution {
                let (u, v) = map.texel_center(x, y);
                let ndc = uv_to_ndc(Vec2::new(u, v));
                let origin = light.ndc_to_world(Vec3::new(ndc.x, ndc.y, 0.0));
                if let Some(hit) = trace(origin, dir) {
                    map.store(x, y, light.world_to_ndc(hit).z);
                }
            }
        }
        map
    }

    /// Shades the visible surface under a screen pixel (floor only has an up normal).
    fn shade_pixel(camera: &Camera, pixel: Vec2, size: Vec2, map: &DepthImage, light_vp: Mat4) -> Vec3 {
        let ndc = uv_to_ndc(pixel / size);
        let near = camera.ndc_to_world(Vec3::new(ndc.x, ndc.y, 0.0));
        let far = camera.ndc_to_world(Vec3::new(ndc.x, ndc.y, 1.0));
        let dir = (far - near).normalize();
        let hit = trace(near, dir).expect("pixel sees the scene");
        assert!((hit.y + 2.0).abs() < 1e-3, "pixel should land on the floor");

        let light = Light::default();
        let material = Material::default();
        let bias = ShadowBias::default();
        let visibility = shadow_term(map, light_vp, hit, Vec3::Y, &light, &bias);
        blinn_phong(Vec3::Y, hit, camera.position, Vec3::ONE, &light, &material, visibility)
    }

    #[test]
    fn pixel_under_cube_is_darker() {
        let settings = ShadowSettings {
            resolution: 256,
            ortho_height: 15.0,
            ..ShadowSettings::default()
        };
        let light_cam = light_camera(Vec3::NEG_Y, &settings);
        let map = render_shadow_map(&light_cam, settings.resolution);
        let light_vp = light_cam.view_projection();

        let camera = Camera::new().at(0.0, 4.0, 8.0).with_aspect(1080.0 / 720.0);
        let size = Vec2::new(1080.0, 720.0);
        let under = camera.world_to_pixel(Vec3::new(0.0, -2.0, 0.0), 1080, 720);
        let outside = camera.world_to_pixel(Vec3::new(3.0, -2.0, 0.0), 1080, 720);

        let shadowed = shade_pixel(&camera, under, size, &map, light_vp);
        let lit = shade_pixel(&camera, outside, size, &map, light_vp);
        assert!(shadowed.length() < lit.length() * 0.8, "{shadowed} vs {lit}");
    }

    #[test]
    fn outside_light_frustum_is_lit() {
        let settings = ShadowSettings::default();
        let light_cam = light_camera(Vec3::NEG_Y, &settings);
        let mut map = DepthImage::new(8);
        for y in 0..8 {
            for x in 0..8 {
                map.store(x, y, 0.0);
            }
        }
        let far_away = Vec3::new(100.0, -2.0, 0.0);
        let term = shadow_term(
            &map,
            light_cam.view_projection(),
            far_away,
            Vec3::Y,
            &Light::default(),
            &ShadowBias::default(),
        );
        assert_eq!(term, 1.0);
    }

    /// Counts self-shadowed samples on an oblique, unoccluded plane.
    fn acne_count(bias: &ShadowBias) -> usize {
        let light = Light {
            direction: Vec3::new(1.0, -1.0, 0.0).normalize(),
            ..Light::default()
        };
        let settings = ShadowSettings {
            resolution: 64,
            ..ShadowSettings::default()
        };
        let light_cam = light_camera(light.direction, &settings);
        let light_vp = light_cam.view_projection();

        // floor plane y = 0 fills the map; n·l = cos 45deg
        let mut map = DepthImage::new(settings.resolution);
        let dir = light_cam.forward();
        for y in 0..settings.resolution {
            for x in 0..settings.resolution {
                let (u, v) = map.texel_center(x, y);
                let ndc = uv_to_ndc(Vec2::new(u, v));
                let origin = light_cam.ndc_to_world(Vec3::new(ndc.x, ndc.y, 0.0));
                let t = -origin.y / dir.y;
                map.store(x, y, light_cam.world_to_ndc(origin + dir * t).z);
            }
        }

        let mut count = 0;
        for i in 0..40 {
            for j in 0..40 {
                let p = Vec3::new(-4.0 + i as f32 * 0.2037, 0.0, -4.0 + j as f32 * 0.1913);
                if shadow_term(&map, light_vp, p, Vec3::Y, &light, bias) < 1.0 {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn raising_max_bias_never_adds_acne() {
        let min = 0.0005;
        let min_only = acne_count(&ShadowBias {
            min,
            max: min,
            curve: BiasCurve::Linear,
        });
        assert!(min_only > 0, "a tiny bias should show acne on an oblique plane");

        for curve in [BiasCurve::Linear, BiasCurve::Slope] {
            let mut previous = min_only;
            for max in [0.002, 0.005, 0.015, 0.05] {
                let count = acne_count(&ShadowBias { min, max, curve });
                assert!(count <= previous, "{curve:?} max {max}: {count} > {previous}");
                previous = count;
            }
            assert_eq!(previous, 0);
        }
    }

    /// What a texel reads back as after being written to an attachment of `format`.
    fn stored(texel: Vec4, format: wgpu::TextureFormat) -> Vec4 {
        match format {
            wgpu::TextureFormat::Rgba32Float => texel,
            wgpu::TextureFormat::Rgba16Float => {
                Vec4::from_array(texel.to_array().map(|c| half::f16::from_f32(c).to_f32()))
            }
            other => panic!("no storage model for {other:?}"),
        }
    }

    #[test]
    fn gbuffer_position_reprojects_to_its_pixel() {
        let camera = Camera::new().at(2.0, 3.0, 6.0).with_aspect(1080.0 / 720.0);
        let (width, height) = (1080, 720);
        let normal = Vec3::new(0.3, 0.9, -0.2);
        let albedo = Vec3::new(0.8, 0.35, 0.1);

        for pixel in [Vec2::new(100.5, 80.5), Vec2::new(540.5, 360.5), Vec2::new(1000.5, 700.5)] {
            for depth in [0.97, 0.99] {
                // geometry pass: the fragment at this pixel lies at some depth on the view ray
                let ndc = uv_to_ndc(pixel / Vec2::new(width as f32, height as f32));
                let world = camera.ndc_to_world(Vec3::new(ndc.x, ndc.y, depth));
                let [position, n, a] = gbuffer_texels(world, normal, albedo);
                let position = stored(position, GBuffer::POSITION_FORMAT);
                let n = stored(n, GBuffer::NORMAL_FORMAT);
                let a = stored(a, GBuffer::ALBEDO_FORMAT);

                // coverage flag must survive storage exactly
                assert_eq!(position.w, 1.0);

                // lighting pass: read it back and project again
                let back = camera.world_to_pixel(position.truncate(), width, height);
                assert!((back - pixel).length() < 0.05, "{back} vs {pixel} at depth {depth}");

                assert!(n.truncate().normalize().dot(normal.normalize()) > 0.9999);
                assert!(a.truncate().abs_diff_eq(albedo, 1e-3));
            }
        }
    }

    #[test]
    fn shadow_only_removes_direct_light() {
        let light = Light::default();
        let material = Material::default();
        let eye = Vec3::new(0.0, 5.0, 5.0);
        let lit = blinn_phong(Vec3::Y, Vec3::ZERO, eye, Vec3::ONE, &light, &material, 1.0);
        let dark = blinn_phong(Vec3::Y, Vec3::ZERO, eye, Vec3::ONE, &light, &material, 0.0);
        assert!(dark.abs_diff_eq(light.ambient * material.ka, 1e-6));
        assert!(lit.x > dark.x);
    }
}
