//! CPU-side descriptions of programs and vertex arrays.
//!
//! These types are shared by every [`crate::device::RenderDevice`]
//! implementation: the shader loader produces a [`ProgramSource`], the
//! device keeps its [`ProgramLayout`] around for location lookups, and each
//! vertex array is a [`VertexArray`] of attribute bindings.

use std::collections::BTreeMap;

use crate::data_structures::handles::{AttribLocation, BufferId, UniformLocation};

/// A vertex input reflected from the vertex stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeInfo {
    pub name: String,
    pub location: AttribLocation,
    /// Number of `f32` components (1 to 4).
    pub components: u32,
}

/// A 4x4 float matrix uniform reflected from either stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniformInfo {
    pub name: String,
    pub location: UniformLocation,
}

/// Attribute and uniform interface of a linked program.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProgramLayout {
    pub attributes: Vec<AttributeInfo>,
    pub uniforms: Vec<UniformInfo>,
}

impl ProgramLayout {
    pub fn attribute(&self, name: &str) -> Option<&AttributeInfo> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn uniform(&self, name: &str) -> Option<&UniformInfo> {
        self.uniforms.iter().find(|u| u.name == name)
    }
}

/// Validated and reflected sources of a program, ready to be created on a device.
#[derive(Clone, Debug)]
pub struct ProgramSource {
    pub label: String,
    pub vertex: StageSource,
    pub fragment: StageSource,
    pub layout: ProgramLayout,
}

/// WGSL text of one stage plus the entry point to run.
#[derive(Clone, Debug)]
pub struct StageSource {
    pub code: String,
    pub entry_point: String,
}

/// One enabled attribute of a vertex array.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AttributeBinding {
    pub buffer: BufferId,
    pub components: u32,
}

/// The attribute-to-buffer mapping remembered by a vertex-array descriptor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VertexArray {
    attributes: BTreeMap<AttribLocation, AttributeBinding>,
}

impl VertexArray {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point `location` at `buffer`, replacing any previous binding.
    pub fn bind(&mut self, location: AttribLocation, binding: AttributeBinding) {
        self.attributes.insert(location, binding);
    }

    /// Returns `true` if the attribute was enabled.
    pub fn disable(&mut self, location: AttribLocation) -> bool {
        self.attributes.remove(&location).is_some()
    }

    pub fn get(&self, location: AttribLocation) -> Option<&AttributeBinding> {
        self.attributes.get(&location)
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Enabled attributes ordered by location.
    pub fn iter(&self) -> impl Iterator<Item = (AttribLocation, &AttributeBinding)> {
        self.attributes.iter().map(|(loc, binding)| (*loc, binding))
    }

    /// Drop every attribute that reads from `buffer`.
    pub fn forget_buffer(&mut self, buffer: BufferId) {
        self.attributes.retain(|_, binding| binding.buffer != buffer);
    }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;

    #[test]
    fn vertex_array_keeps_attributes_sorted_by_location() {
        let mut buffers: SlotMap<BufferId, ()> = SlotMap::with_key();
        let colours = buffers.insert(());
        let positions = buffers.insert(());

        let mut vao = VertexArray::new();
        vao.bind(
            AttribLocation(1),
            AttributeBinding {
                buffer: colours,
                components: 3,
            },
        );
        vao.bind(
            AttribLocation(0),
            AttributeBinding {
                buffer: positions,
                components: 2,
            },
        );

        let order: Vec<_> = vao
            .iter()
            .map(|(loc, b)| (loc.0, b.components))
            .collect();
        assert_eq!(order, vec![(0, 2), (1, 3)]);

        vao.forget_buffer(colours);
        assert!(vao.get(AttribLocation(1)).is_none());
        assert!(vao.disable(AttribLocation(0)));
        assert!(!vao.disable(AttribLocation(0)));
        assert!(vao.is_empty());
    }

    #[test]
    fn layout_lookup_by_name() {
        let layout = ProgramLayout {
            attributes: vec![AttributeInfo {
                name: "aPosition".into(),
                location: AttribLocation(0),
                components: 2,
            }],
            uniforms: vec![UniformInfo {
                name: "uWorld".into(),
                location: UniformLocation(0),
            }],
        };
        assert_eq!(layout.attribute("aPosition").map(|a| a.components), Some(2));
        assert!(layout.attribute("aColor").is_none());
        assert_eq!(
            layout.uniform("uWorld").map(|u| u.location),
            Some(UniformLocation(0))
        );
    }
}
