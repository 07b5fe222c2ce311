use std::num::NonZeroU64;

use crate::error::ShaderError;
use crate::gpu::GpuContext;
use crate::mesh::Drawable;

use super::uniforms::{UniformBlock, UniformKind, UniformLayout, align_up};

/// What a numbered texture unit expects to be bound to it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureSlot {
    pub label: &'static str,
    pub sample_type: wgpu::TextureSampleType,
    pub sampler: wgpu::SamplerBindingType,
}

impl TextureSlot {
    /// Regular color texture with a filtering sampler.
    pub fn filterable(label: &'static str) -> Self {
        Self {
            label,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            sampler: wgpu::SamplerBindingType::Filtering,
        }
    }

    /// 32-bit float data read with nearest sampling.
    pub fn unfilterable(label: &'static str) -> Self {
        Self {
            label,
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            sampler: wgpu::SamplerBindingType::NonFiltering,
        }
    }

    /// Depth texture read through a comparison sampler.
    pub fn depth_comparison(label: &'static str) -> Self {
        Self {
            label,
            sample_type: wgpu::TextureSampleType::Depth,
            sampler: wgpu::SamplerBindingType::Comparison,
        }
    }
}

/// Depth test configuration of a program's pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepthTest {
    pub format: wgpu::TextureFormat,
    pub write: bool,
    pub compare: wgpu::CompareFunction,
}

impl DepthTest {
    /// Standard less-than test with depth writes.
    pub fn less(format: wgpu::TextureFormat) -> Self {
        Self {
            format,
            write: true,
            compare: wgpu::CompareFunction::Less,
        }
    }
}

/// Everything needed to build a [`ShaderProgram`].
pub struct ProgramDesc<'a> {
    pub label: &'a str,
    /// WGSL source with `vs` and, unless `color_formats` is empty, `fs` entry points.
    pub source: &'a str,
    /// Fields of the `@group(0) @binding(0)` uniform struct, in declaration order.
    pub uniforms: &'a [(&'a str, UniformKind)],
    /// Texture unit `N` is bound at `@group(1)`, bindings `2N` and `2N + 1`.
    pub textures: &'a [TextureSlot],
    pub vertex_layout: Option<wgpu::VertexBufferLayout<'static>>,
    /// Empty for depth-only programs, which get no fragment stage.
    pub color_formats: &'a [wgpu::TextureFormat],
    pub depth: Option<DepthTest>,
    pub cull_mode: Option<wgpu::Face>,
    /// Draw calls per frame, the size of the uniform ring.
    pub max_draws: u32,
}

/// A compiled pipeline plus its named uniforms and texture units.
///
/// Uniform values are staged on the CPU and copied into a per-draw slot of a
/// ring buffer when [`draw`](Self::draw) is called, so every draw in a frame
/// sees the values that were set right before it.
pub struct ShaderProgram {
    label: String,
    pipeline: wgpu::RenderPipeline,
    uniforms: UniformBlock,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    stride: u32,
    capacity: u32,
    next_slot: u32,
    texture_layout: Option<wgpu::BindGroupLayout>,
    texture_units: Vec<Option<(wgpu::TextureView, wgpu::Sampler)>>,
    texture_bind_group: Option<wgpu::BindGroup>,
}

impl ShaderProgram {
    pub fn new(gpu: &GpuContext, desc: ProgramDesc<'_>) -> Result<Self, ShaderError> {
        let device = &gpu.device;
        let layout = UniformLayout::new(desc.uniforms)?;
        let block_size = layout.size();
        let stride = align_up(block_size, device.limits().min_uniform_buffer_offset_alignment);
        let capacity = desc.max_draws.max(1);

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(desc.label),
            source: wgpu::ShaderSource::Wgsl(desc.source.into()),
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{} Uniforms", desc.label)),
            size: u64::from(stride) * u64::from(capacity),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{} Uniform Layout", desc.label)),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(u64::from(block_size)),
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Uniform Bind Group", desc.label)),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &uniform_buffer,
                    offset: 0,
                    size: NonZeroU64::new(u64::from(block_size)),
                }),
            }],
        });

        let texture_layout = if desc.textures.is_empty() {
            None
        } else {
            let entries: Vec<wgpu::BindGroupLayoutEntry> = desc
                .textures
                .iter()
                .enumerate()
                .flat_map(|(unit, slot)| {
                    let unit = unit as u32;
                    [
                        wgpu::BindGroupLayoutEntry {
                            binding: unit * 2,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Texture {
                                sample_type: slot.sample_type,
                                view_dimension: wgpu::TextureViewDimension::D2,
                                multisampled: false,
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: unit * 2 + 1,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Sampler(slot.sampler),
                            count: None,
                        },
                    ]
                })
                .collect();
            Some(device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("{} Texture Layout", desc.label)),
                entries: &entries,
            }))
        };

        let mut group_layouts = vec![&uniform_layout];
        if let Some(layout) = &texture_layout {
            group_layouts.push(layout);
        }

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} Pipeline Layout", desc.label)),
            bind_group_layouts: &group_layouts,
            push_constant_ranges: &[],
        });

        let color_targets: Vec<Option<wgpu::ColorTargetState>> = desc
            .color_formats
            .iter()
            .map(|&format| {
                Some(wgpu::ColorTargetState {
                    format,
                    // Rgba32Float G-buffer attachments are not blendable
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })
            })
            .collect();

        let vertex_buffers = match &desc.vertex_layout {
            Some(layout) => std::slice::from_ref(layout),
            None => &[],
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{} Pipeline", desc.label)),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: vertex_buffers,
                compilation_options: Default::default(),
            },
            // no fragment stage: depth-only, color writes disabled
            fragment: if color_targets.is_empty() {
                None
            } else {
                Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs"),
                    targets: &color_targets,
                    compilation_options: Default::default(),
                })
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: desc.cull_mode,
                ..Default::default()
            },
            depth_stencil: desc.depth.map(|depth| wgpu::DepthStencilState {
                format: depth.format,
                depth_write_enabled: depth.write,
                depth_compare: depth.compare,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(ShaderError::Compile {
                program: desc.label.to_string(),
                message: error.to_string(),
            });
        }

        log::debug!(
            "built program '{}' ({} uniform bytes, {} texture units, {} draws)",
            desc.label,
            block_size,
            desc.textures.len(),
            capacity
        );

        Ok(Self {
            label: desc.label.to_string(),
            pipeline,
            uniforms: UniformBlock::new(desc.label, layout),
            uniform_buffer,
            uniform_bind_group,
            stride,
            capacity,
            next_slot: 0,
            texture_layout,
            texture_units: vec![None; desc.textures.len()],
            texture_bind_group: None,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Rewinds the uniform ring. Call once per frame before the first draw.
    pub fn begin_frame(&mut self) {
        self.next_slot = 0;
    }

    /// Makes this program's pipeline current in `pass`.
    pub fn use_program(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
    }

    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniforms.has(name)
    }

    pub fn set_mat4(&mut self, name: &str, value: glam::Mat4) -> Result<(), ShaderError> {
        self.uniforms.set_mat4(name, value)
    }

    pub fn set_vec3(&mut self, name: &str, value: glam::Vec3) -> Result<(), ShaderError> {
        self.uniforms.set_vec3(name, value)
    }

    pub fn set_vec4(&mut self, name: &str, value: glam::Vec4) -> Result<(), ShaderError> {
        self.uniforms.set_vec4(name, value)
    }

    pub fn set_float(&mut self, name: &str, value: f32) -> Result<(), ShaderError> {
        self.uniforms.set_float(name, value)
    }

    pub fn set_int(&mut self, name: &str, value: i32) -> Result<(), ShaderError> {
        self.uniforms.set_int(name, value)
    }

    /// Binds a texture and sampler to a numbered unit.
    pub fn bind_texture(
        &mut self,
        unit: u32,
        view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> Result<(), ShaderError> {
        let slot = self
            .texture_units
            .get_mut(unit as usize)
            .ok_or_else(|| ShaderError::UnknownTextureUnit {
                program: self.label.clone(),
                unit,
            })?;
        *slot = Some((view.clone(), sampler.clone()));
        self.texture_bind_group = None;
        Ok(())
    }

    /// Copies the current uniform values into the next ring slot, binds them
    /// and the texture units, then lets `drawable` record its draw call.
    pub fn draw(
        &mut self,
        gpu: &GpuContext,
        pass: &mut wgpu::RenderPass<'_>,
        drawable: &dyn Drawable,
    ) -> Result<(), ShaderError> {
        if self.next_slot >= self.capacity {
            return Err(ShaderError::DrawCapacityExceeded {
                program: self.label.clone(),
                capacity: self.capacity,
            });
        }
        let offset = self.next_slot * self.stride;
        self.next_slot += 1;

        gpu.queue
            .write_buffer(&self.uniform_buffer, u64::from(offset), self.uniforms.bytes());
        pass.set_bind_group(0, &self.uniform_bind_group, &[offset]);

        if let Some(group) = self.texture_group(gpu)? {
            pass.set_bind_group(1, group, &[]);
        }

        drawable.draw(pass);
        Ok(())
    }

    fn texture_group(&mut self, gpu: &GpuContext) -> Result<Option<&wgpu::BindGroup>, ShaderError> {
        let Some(layout) = &self.texture_layout else {
            return Ok(None);
        };

        if self.texture_bind_group.is_none() {
            let mut entries = Vec::with_capacity(self.texture_units.len() * 2);
            for (unit, bound) in self.texture_units.iter().enumerate() {
                let (view, sampler) = bound.as_ref().ok_or_else(|| ShaderError::UnboundTextureUnit {
                    program: self.label.clone(),
                    unit: unit as u32,
                })?;
                entries.push(wgpu::BindGroupEntry {
                    binding: unit as u32 * 2,
                    resource: wgpu::BindingResource::TextureView(view),
                });
                entries.push(wgpu::BindGroupEntry {
                    binding: unit as u32 * 2 + 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                });
            }

            self.texture_bind_group = Some(gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("{} Texture Bind Group", self.label)),
                layout,
                entries: &entries,
            }));
        }

        Ok(self.texture_bind_group.as_ref())
    }
}
