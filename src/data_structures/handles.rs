//! Strongly typed GPU resource handles.
//!
//! The host API hands out opaque keys, one key type per resource kind, so a
//! buffer can never be passed where a vertex array or program is expected.
//! Keys are generational: a handle that outlived its resource resolves to
//! nothing instead of aliasing a newer allocation.

use slotmap::new_key_type;

new_key_type! {
    /// A block of GPU-resident vertex data.
    pub struct BufferId;
    /// A vertex-array descriptor recording which buffer feeds which attribute.
    pub struct VertexArrayId;
    /// A linked vertex + fragment program.
    pub struct ProgramId;
}

/// Input slot of a vertex attribute inside a program (`@location(n)`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttribLocation(pub u32);

/// Binding slot of a uniform inside a program (`@group(0) @binding(n)`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UniformLocation(pub u32);

/// How often the contents of a buffer are expected to change.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Uploaded once, drawn many times.
    StaticDraw,
}

/// Primitive assembly mode of a draw call.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Every three vertices form an independent triangle.
    Triangles,
}

impl From<Primitive> for wgpu::PrimitiveTopology {
    fn from(primitive: Primitive) -> Self {
        match primitive {
            Primitive::Triangles => wgpu::PrimitiveTopology::TriangleList,
        }
    }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;

    #[test]
    fn stale_handles_do_not_resolve() {
        let mut buffers: SlotMap<BufferId, u32> = SlotMap::with_key();
        let first = buffers.insert(1);
        assert_eq!(buffers.remove(first), Some(1));
        let second = buffers.insert(2);
        assert_ne!(first, second);
        assert!(buffers.get(first).is_none());
        assert_eq!(buffers.remove(first), None);
    }

    #[test]
    fn triangles_map_to_triangle_list() {
        let topology: wgpu::PrimitiveTopology = Primitive::Triangles.into();
        assert_eq!(topology, wgpu::PrimitiveTopology::TriangleList);
    }
}
