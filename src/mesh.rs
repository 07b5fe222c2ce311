//! GPU geometry and the draw boundary.
//!
//! Passes never look inside geometry: anything implementing [`Drawable`]
//! records its own vertex/index bindings and draw call into a render pass.
//! The transform is not part of the call; it travels through the `_Model`
//! uniform set just before [`ShaderProgram::draw`](crate::shader::ShaderProgram::draw).
//!
//! # Vertex Layout
//!
//! [`Vertex3d`] is 32 bytes:
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | normal    | Float32x3 | 12     | 1               |
//! | uv        | Float32x2 | 24     | 2               |

use wgpu::util::DeviceExt;

use crate::gpu::GpuContext;

/// Something that can record its own draw call.
pub trait Drawable {
    fn draw(&self, pass: &mut wgpu::RenderPass<'_>);
}

/// Mesh vertex: position, normal and texture coordinates.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    pub position: [f32; 3],
    /// Should be normalized for correct lighting.
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex3d {
    /// Vertex buffer layout matching `@location(0..=2)` in the mesh shaders.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Vertex and index data, CPU side.
///
/// Primitive builders produce this first so geometry can be inspected
/// without a device; [`Mesh::from_data`] uploads it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex3d>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Unit cube centered at the origin, counter-clockwise front faces.
    pub fn cube() -> Self {
        // six faces as (normal, tangent u, tangent v); u x v = normal keeps CCW winding
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ];

        let mut data = Self::default();
        for (n, u, v) in faces {
            let base = data.vertices.len() as u32;
            for (su, sv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
                let position = [
                    n[0] * 0.5 + u[0] * su + v[0] * sv,
                    n[1] * 0.5 + u[1] * su + v[1] * sv,
                    n[2] * 0.5 + u[2] * su + v[2] * sv,
                ];
                data.vertices
                    .push(Vertex3d::new(position, n, [su + 0.5, 0.5 - sv]));
            }
            data.indices
                .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        data
    }

    /// Flat square in the XZ plane facing +Y, split into `subdivisions`
    /// quads per side. UVs repeat `uv_repeat` times across the plane.
    pub fn plane(size: f32, subdivisions: u32, uv_repeat: f32) -> Self {
        let cells = subdivisions.max(1);
        let row = cells + 1;
        let half = size * 0.5;

        let mut data = Self::default();
        for j in 0..row {
            for i in 0..row {
                let s = i as f32 / cells as f32;
                let t = j as f32 / cells as f32;
                data.vertices.push(Vertex3d::new(
                    [-half + s * size, 0.0, -half + t * size],
                    [0.0, 1.0, 0.0],
                    [s * uv_repeat, t * uv_repeat],
                ));
            }
        }
        for j in 0..cells {
            for i in 0..cells {
                let a = j * row + i;
                let b = a + 1;
                let c = a + row;
                let d = c + 1;
                // +z is towards the viewer when looking down -y: a, c, b is CCW
                data.indices.extend_from_slice(&[a, c, b, b, c, d]);
            }
        }
        data
    }
}

/// GPU-resident indexed geometry.
#[derive(Debug)]
pub struct Mesh {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
}

impl Mesh {
    pub fn new(gpu: &GpuContext, vertices: &[Vertex3d], indices: &[u32]) -> Self {
        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    pub fn from_data(gpu: &GpuContext, data: &MeshData) -> Self {
        Self::new(gpu, &data.vertices, &data.indices)
    }

    pub fn cube(gpu: &GpuContext) -> Self {
        Self::from_data(gpu, &MeshData::cube())
    }

    pub fn plane(gpu: &GpuContext, size: f32, subdivisions: u32) -> Self {
        Self::from_data(gpu, &MeshData::plane(size, subdivisions, subdivisions as f32))
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

impl Drawable for Mesh {
    fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// Three vertices, no buffers. The vertex stage derives positions from
/// `vertex_index` to cover the whole target.
#[derive(Clone, Copy, Debug, Default)]
pub struct FullscreenTriangle;

impl Drawable for FullscreenTriangle {
    fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn triangle_normals(data: &MeshData) -> Vec<(Vec3, Vec3)> {
        data.indices
            .chunks(3)
            .map(|tri| {
                let p = |i: u32| Vec3::from(data.vertices[i as usize].position);
                let face = (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]));
                (face, Vec3::from(data.vertices[tri[0] as usize].normal))
            })
            .collect()
    }

    #[test]
    fn vertex_is_32_bytes() {
        assert_eq!(std::mem::size_of::<Vertex3d>(), 32);
    }

    #[test]
    fn cube_faces_wind_counter_clockwise() {
        let cube = MeshData::cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        for (face, normal) in triangle_normals(&cube) {
            assert!(face.dot(normal) > 0.0);
        }
        for v in &cube.vertices {
            assert!(v.position.iter().all(|c| c.abs() <= 0.5 + 1e-6));
        }
    }

    #[test]
    fn plane_faces_up() {
        let plane = MeshData::plane(10.0, 5, 5.0);
        assert_eq!(plane.vertices.len(), 36);
        assert_eq!(plane.indices.len(), 5 * 5 * 6);
        for (face, _) in triangle_normals(&plane) {
            assert!(face.y > 0.0);
        }
    }
}
