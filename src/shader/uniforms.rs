//! Named uniform values laid out for a WGSL uniform block.

use glam::{Mat4, Vec3, Vec4};

use crate::error::ShaderError;

/// Type of a named uniform, mirroring the WGSL field type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Float,
    Int,
    Vec3,
    Vec4,
    Mat4,
}

impl UniformKind {
    /// Alignment in the uniform address space.
    pub fn align(self) -> u32 {
        match self {
            Self::Float | Self::Int => 4,
            Self::Vec3 | Self::Vec4 | Self::Mat4 => 16,
        }
    }

    pub fn size(self) -> u32 {
        match self {
            Self::Float | Self::Int => 4,
            Self::Vec3 => 12,
            Self::Vec4 => 16,
            Self::Mat4 => 64,
        }
    }

    pub fn wgsl_name(self) -> &'static str {
        match self {
            Self::Float => "f32",
            Self::Int => "i32",
            Self::Vec3 => "vec3<f32>",
            Self::Vec4 => "vec4<f32>",
            Self::Mat4 => "mat4x4<f32>",
        }
    }
}

/// One field of a [`UniformLayout`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniformField {
    pub name: String,
    pub kind: UniformKind,
    pub offset: u32,
}

/// Byte layout of a uniform block, in declaration order.
///
/// The WGSL struct a program binds at `@group(0) @binding(0)` must declare
/// the same fields in the same order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniformLayout {
    fields: Vec<UniformField>,
    size: u32,
}

impl UniformLayout {
    pub fn new(fields: &[(&str, UniformKind)]) -> Result<Self, ShaderError> {
        let mut laid_out: Vec<UniformField> = Vec::with_capacity(fields.len());
        let mut offset = 0;

        for &(name, kind) in fields {
            if laid_out.iter().any(|f| f.name == name) {
                return Err(ShaderError::DuplicateUniform {
                    name: name.to_string(),
                });
            }
            offset = align_up(offset, kind.align());
            laid_out.push(UniformField {
                name: name.to_string(),
                kind,
                offset,
            });
            offset += kind.size();
        }

        Ok(Self {
            fields: laid_out,
            size: align_up(offset, 16).max(16),
        })
    }

    pub fn field(&self, name: &str) -> Option<&UniformField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> &[UniformField] {
        &self.fields
    }

    /// Block size in bytes, a multiple of 16.
    pub fn size(&self) -> u32 {
        self.size
    }
}

/// CPU-side staging for one program's uniform values.
///
/// Values persist until overwritten, so per-frame state can be set once and
/// only per-draw values (like `_Model`) updated between draws.
#[derive(Clone, Debug)]
pub struct UniformBlock {
    program: String,
    layout: UniformLayout,
    bytes: Vec<u8>,
}

impl UniformBlock {
    pub fn new(program: impl Into<String>, layout: UniformLayout) -> Self {
        let bytes = vec![0; layout.size() as usize];
        Self {
            program: program.into(),
            layout,
            bytes,
        }
    }

    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn has(&self, name: &str) -> bool {
        self.layout.field(name).is_some()
    }

    pub fn set_mat4(&mut self, name: &str, value: Mat4) -> Result<(), ShaderError> {
        self.write(name, UniformKind::Mat4, bytemuck::bytes_of(&value.to_cols_array()))
    }

    pub fn set_vec3(&mut self, name: &str, value: Vec3) -> Result<(), ShaderError> {
        self.write(name, UniformKind::Vec3, bytemuck::bytes_of(&value.to_array()))
    }

    pub fn set_vec4(&mut self, name: &str, value: Vec4) -> Result<(), ShaderError> {
        self.write(name, UniformKind::Vec4, bytemuck::bytes_of(&value.to_array()))
    }

    pub fn set_float(&mut self, name: &str, value: f32) -> Result<(), ShaderError> {
        self.write(name, UniformKind::Float, bytemuck::bytes_of(&value))
    }

    pub fn set_int(&mut self, name: &str, value: i32) -> Result<(), ShaderError> {
        self.write(name, UniformKind::Int, bytemuck::bytes_of(&value))
    }

    fn write(&mut self, name: &str, kind: UniformKind, data: &[u8]) -> Result<(), ShaderError> {
        let field = self
            .layout
            .field(name)
            .ok_or_else(|| ShaderError::UnknownUniform {
                program: self.program.clone(),
                name: name.to_string(),
            })?;
        if field.kind != kind {
            return Err(ShaderError::UniformKindMismatch {
                name: name.to_string(),
                expected: field.kind.wgsl_name(),
                found: kind.wgsl_name(),
            });
        }
        let start = field.offset as usize;
        self.bytes[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }
}

pub(crate) fn align_up(value: u32, align: u32) -> u32 {
    value.div_ceil(align) * align
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::names;

    #[test]
    fn offsets_follow_wgsl_rules() {
        let layout = UniformLayout::new(&[
            (names::MODEL, UniformKind::Mat4),
            (names::EYE_POS, UniformKind::Vec3),
            (names::MIN_BIAS, UniformKind::Float),
            (names::BIAS_CURVE, UniformKind::Int),
            (names::LIGHT_COLOR, UniformKind::Vec3),
        ])
        .unwrap();

        let offset = |name| layout.field(name).unwrap().offset;
        assert_eq!(offset(names::MODEL), 0);
        assert_eq!(offset(names::EYE_POS), 64);
        // f32 packs into the vec3's trailing slot
        assert_eq!(offset(names::MIN_BIAS), 76);
        assert_eq!(offset(names::BIAS_CURVE), 80);
        assert_eq!(offset(names::LIGHT_COLOR), 96);
        assert_eq!(layout.size(), 112);
    }

    #[test]
    fn empty_layout_is_one_slot() {
        assert_eq!(UniformLayout::new(&[]).unwrap().size(), 16);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = UniformLayout::new(&[("_A", UniformKind::Float), ("_A", UniformKind::Int)])
            .unwrap_err();
        assert_eq!(err, ShaderError::DuplicateUniform { name: "_A".into() });
    }

    #[test]
    fn setters_write_at_field_offset() {
        let layout = UniformLayout::new(&[
            ("_Scale", UniformKind::Float),
            ("_Tint", UniformKind::Vec3),
        ])
        .unwrap();
        let mut block = UniformBlock::new("test", layout);

        block.set_float("_Scale", 2.0).unwrap();
        block.set_vec3("_Tint", Vec3::new(1.0, 0.5, 0.25)).unwrap();

        let floats: Vec<f32> = block
            .bytes()
            .chunks_exact(4)
            .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        assert_eq!(floats[0], 2.0);
        assert_eq!(&floats[4..7], &[1.0, 0.5, 0.25]);
    }

    #[test]
    fn setters_reject_unknown_and_mismatched() {
        let layout = UniformLayout::new(&[("_Scale", UniformKind::Float)]).unwrap();
        let mut block = UniformBlock::new("test", layout);

        assert!(matches!(
            block.set_float("_Missing", 1.0),
            Err(ShaderError::UnknownUniform { .. })
        ));
        assert_eq!(
            block.set_int("_Scale", 1),
            Err(ShaderError::UniformKindMismatch {
                name: "_Scale".into(),
                expected: "f32",
                found: "i32",
            })
        );
    }
}
