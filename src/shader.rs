//! Shader compilation and named, typed uniform tables.
//!
//! WGSL gives uniforms positional layout only; [`UniformTable`] puts a
//! name-and-type surface on top of a single uniform buffer so runtime
//! configuration (the depth-of-field parameters) can be set field by field
//! with type checking. Setting an unknown name or a wrong-typed value is a
//! programmer error and fails fast with
//! [`RenderError::InvalidParameter`] rather than being silently ignored.
//!
//! Offsets follow WGSL uniform address-space layout (std140-style): scalars
//! align to 4 bytes, `vec2` to 8, `vec3`/`vec4`/`mat4x4` to 16. The table's
//! field order must match the WGSL struct declaration it backs.

use crate::error::{RenderError, Result};
use crate::gpu::GpuContext;

/// The uniform types the table understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformType {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Uint,
    Mat4,
}

impl UniformType {
    fn align(self) -> usize {
        match self {
            Self::Float | Self::Uint => 4,
            Self::Vec2 => 8,
            Self::Vec3 | Self::Vec4 | Self::Mat4 => 16,
        }
    }

    fn size(self) -> usize {
        match self {
            Self::Float | Self::Uint => 4,
            Self::Vec2 => 8,
            Self::Vec3 => 12,
            Self::Vec4 => 16,
            Self::Mat4 => 64,
        }
    }
}

/// A typed uniform value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Uint(u32),
    Mat4([[f32; 4]; 4]),
}

impl UniformValue {
    /// The type tag of this value.
    pub fn ty(&self) -> UniformType {
        match self {
            Self::Float(_) => UniformType::Float,
            Self::Vec2(_) => UniformType::Vec2,
            Self::Vec3(_) => UniformType::Vec3,
            Self::Vec4(_) => UniformType::Vec4,
            Self::Uint(_) => UniformType::Uint,
            Self::Mat4(_) => UniformType::Mat4,
        }
    }

    fn write(&self, out: &mut [u8]) {
        match self {
            Self::Float(v) => out.copy_from_slice(bytemuck::bytes_of(v)),
            Self::Vec2(v) => out.copy_from_slice(bytemuck::bytes_of(v)),
            Self::Vec3(v) => out.copy_from_slice(bytemuck::bytes_of(v)),
            Self::Vec4(v) => out.copy_from_slice(bytemuck::bytes_of(v)),
            Self::Uint(v) => out.copy_from_slice(bytemuck::bytes_of(v)),
            Self::Mat4(v) => out.copy_from_slice(bytemuck::bytes_of(v)),
        }
    }

    fn read(ty: UniformType, bytes: &[u8]) -> Self {
        match ty {
            UniformType::Float => Self::Float(f32::from_le_bytes(bytes[..4].try_into().unwrap())),
            UniformType::Uint => Self::Uint(u32::from_le_bytes(bytes[..4].try_into().unwrap())),
            UniformType::Vec2 => {
                let mut v = [0.0f32; 2];
                bytemuck::bytes_of_mut(&mut v).copy_from_slice(&bytes[..8]);
                Self::Vec2(v)
            }
            UniformType::Vec3 => {
                let mut v = [0.0f32; 3];
                bytemuck::bytes_of_mut(&mut v).copy_from_slice(&bytes[..12]);
                Self::Vec3(v)
            }
            UniformType::Vec4 => {
                let mut v = [0.0f32; 4];
                bytemuck::bytes_of_mut(&mut v).copy_from_slice(&bytes[..16]);
                Self::Vec4(v)
            }
            UniformType::Mat4 => {
                let mut v = [[0.0f32; 4]; 4];
                bytemuck::bytes_of_mut(&mut v).copy_from_slice(&bytes[..64]);
                Self::Mat4(v)
            }
        }
    }
}

struct Field {
    name: &'static str,
    ty: UniformType,
    offset: usize,
}

/// A named, typed view over one GPU uniform buffer.
///
/// Values are staged CPU-side by [`set`](Self::set) and flushed with
/// [`upload`](Self::upload), at most one buffer write per frame no matter
/// how many fields changed.
pub struct UniformTable {
    fields: Vec<Field>,
    data: Vec<u8>,
    buffer: Option<wgpu::Buffer>,
    dirty: bool,
}

impl UniformTable {
    /// Builds a table from an ordered field list. The order must match the
    /// WGSL struct the buffer backs.
    pub fn new(layout: &[(&'static str, UniformType)]) -> Self {
        let mut fields = Vec::with_capacity(layout.len());
        let mut offset = 0usize;
        for &(name, ty) in layout {
            offset = offset.next_multiple_of(ty.align());
            fields.push(Field { name, ty, offset });
            offset += ty.size();
        }
        // WGSL struct sizes round up to the largest member alignment;
        // 16 covers every type the table supports.
        let size = offset.next_multiple_of(16).max(16);
        Self {
            fields,
            data: vec![0; size],
            buffer: None,
            dirty: true,
        }
    }

    /// Allocates the backing GPU buffer. Must be called once before the
    /// table can be bound; [`set`](Self::set) works before and after.
    pub fn bind(&mut self, gpu: &GpuContext, label: &str) {
        self.buffer = Some(gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: self.data.len() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.dirty = true;
    }

    /// Stages a value. Unknown names and type mismatches are rejected with
    /// the table unchanged.
    pub fn set(&mut self, name: &str, value: UniformValue) -> Result<()> {
        let field = self
            .fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| RenderError::InvalidParameter(format!("unknown uniform '{name}'")))?;
        if field.ty != value.ty() {
            return Err(RenderError::InvalidParameter(format!(
                "uniform '{name}' is {:?}, got {:?}",
                field.ty,
                value.ty()
            )));
        }
        value.write(&mut self.data[field.offset..field.offset + field.ty.size()]);
        self.dirty = true;
        Ok(())
    }

    /// Reads back the staged value for `name`, if the field exists.
    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| UniformValue::read(f.ty, &self.data[f.offset..]))
    }

    /// Byte offset of a field, mostly useful for layout sanity checks.
    pub fn offset_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.offset)
    }

    /// Total buffer size in bytes.
    pub fn byte_size(&self) -> usize {
        self.data.len()
    }

    /// Flushes staged values to the GPU if anything changed since the last
    /// upload. No-op for tables that were never [`bind`](Self::bind)-ed.
    pub fn upload(&mut self, queue: &wgpu::Queue) {
        if let Some(buffer) = &self.buffer {
            if self.dirty {
                queue.write_buffer(buffer, 0, &self.data);
                self.dirty = false;
            }
        }
    }

    /// The backing GPU buffer, once [`bind`](Self::bind) has run.
    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }
}

/// A compiled WGSL program with its named uniform table.
///
/// The program owns the shader module; render pipelines are built on top
/// of it by the renderer and the composite pass, which know the vertex
/// layouts and target formats involved.
pub struct ShaderProgram {
    /// The compiled shader module (vertex and fragment stages).
    pub module: wgpu::ShaderModule,
    uniforms: UniformTable,
}

impl ShaderProgram {
    /// Compiles WGSL source with an empty uniform table.
    pub fn compile(gpu: &GpuContext, source: &str, label: &str) -> Result<Self> {
        Self::compile_with_uniforms(gpu, source, label, UniformTable::new(&[]))
    }

    /// Compiles WGSL source and attaches a named uniform table.
    ///
    /// Compilation problems are caught through a validation error scope and
    /// surfaced as [`RenderError::Compilation`] with the naga diagnostic
    /// text. Fatal to pipeline startup, never retried.
    pub fn compile_with_uniforms(
        gpu: &GpuContext,
        source: &str,
        label: &str,
        uniforms: UniformTable,
    ) -> Result<Self> {
        gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = gpu
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
        if let Some(error) = pollster::block_on(gpu.device.pop_error_scope()) {
            return Err(RenderError::Compilation(format!("{label}: {error}")));
        }
        Ok(Self { module, uniforms })
    }

    /// Stages a uniform value by name. See [`UniformTable::set`].
    pub fn set_uniform(&mut self, name: &str, value: UniformValue) -> Result<()> {
        self.uniforms.set(name, value)
    }

    /// Reads back a staged uniform value by name.
    pub fn get_uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name)
    }

    /// The program's uniform table.
    pub fn uniforms(&self) -> &UniformTable {
        &self.uniforms
    }

    /// Mutable access to the uniform table (binding, uploads).
    pub fn uniforms_mut(&mut self) -> &mut UniformTable {
        &mut self.uniforms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> UniformTable {
        UniformTable::new(&[
            ("proj", UniformType::Mat4),
            ("texture_width", UniformType::Float),
            ("texture_height", UniformType::Float),
            ("light_pos", UniformType::Vec3),
            ("ring_count", UniformType::Uint),
        ])
    }

    #[test]
    fn offsets_follow_wgsl_uniform_layout() {
        let t = table();
        assert_eq!(t.offset_of("proj"), Some(0));
        assert_eq!(t.offset_of("texture_width"), Some(64));
        assert_eq!(t.offset_of("texture_height"), Some(68));
        // vec3 aligns to 16.
        assert_eq!(t.offset_of("light_pos"), Some(80));
        // scalar packs right after the vec3's 12 bytes.
        assert_eq!(t.offset_of("ring_count"), Some(92));
        assert_eq!(t.byte_size(), 96);
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut t = table();
        t.set("texture_width", UniformValue::Float(800.0)).unwrap();
        t.set("light_pos", UniformValue::Vec3([1.0, -3.0, 7.0]))
            .unwrap();
        t.set("ring_count", UniformValue::Uint(3)).unwrap();

        assert_eq!(t.get("texture_width"), Some(UniformValue::Float(800.0)));
        assert_eq!(
            t.get("light_pos"),
            Some(UniformValue::Vec3([1.0, -3.0, 7.0]))
        );
        assert_eq!(t.get("ring_count"), Some(UniformValue::Uint(3)));
    }

    #[test]
    fn unknown_name_is_rejected() {
        let mut t = table();
        let err = t.set("focal_deth", UniformValue::Float(1.6)).unwrap_err();
        assert!(matches!(err, RenderError::InvalidParameter(_)));
        assert_eq!(t.get("focal_deth"), None);
    }

    #[test]
    fn type_mismatch_is_rejected_and_leaves_value() {
        let mut t = table();
        t.set("texture_width", UniformValue::Float(800.0)).unwrap();

        let err = t
            .set("texture_width", UniformValue::Uint(800))
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidParameter(_)));
        assert_eq!(t.get("texture_width"), Some(UniformValue::Float(800.0)));
    }

    #[test]
    fn empty_table_rejects_everything() {
        let mut t = UniformTable::new(&[]);
        assert!(t.set("anything", UniformValue::Float(0.0)).is_err());
    }
}
