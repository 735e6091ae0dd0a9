//! The fixed triangle mesh and the GPU handles it lives in.

use crate::{
    data_structures::handles::{BufferId, VertexArrayId},
    device::RenderDevice,
};

/// Clip-space positions, one `vec2` per vertex.
pub const TRIANGLE_POSITIONS: [[f32; 2]; 3] = [
    [0.0, 0.5],   // top
    [-0.5, -0.5], // bottom left
    [0.5, -0.5],  // bottom right
];

/// Linear RGB, one `vec3` per vertex.
pub const TRIANGLE_COLOURS: [[f32; 3]; 3] = [
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
];

pub const POSITION_COMPONENTS: u32 = 2;
pub const COLOUR_COMPONENTS: u32 = 3;

/// Handles of an uploaded mesh. No CPU copy of the vertex data is kept.
#[derive(Debug, PartialEq, Eq)]
pub struct Mesh {
    vertex_array: Option<VertexArrayId>,
    positions: Option<BufferId>,
    colours: Option<BufferId>,
    vertex_count: u32,
}

impl Mesh {
    pub(crate) fn new(
        vertex_array: VertexArrayId,
        positions: BufferId,
        colours: BufferId,
        vertex_count: u32,
    ) -> Self {
        Self {
            vertex_array: Some(vertex_array),
            positions: Some(positions),
            colours: Some(colours),
            vertex_count,
        }
    }

    pub fn vertex_array(&self) -> Option<VertexArrayId> {
        self.vertex_array
    }

    pub fn positions(&self) -> Option<BufferId> {
        self.positions
    }

    pub fn colours(&self) -> Option<BufferId> {
        self.colours
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn is_released(&self) -> bool {
        self.vertex_array.is_none() && self.positions.is_none() && self.colours.is_none()
    }

    /// Delete the buffers and the vertex array, newest first.
    ///
    /// Calling this again is a no-op.
    pub fn release(&mut self, device: &mut dyn RenderDevice) {
        if let Some(colours) = self.colours.take() {
            device.delete_buffer(colours);
        }
        if let Some(positions) = self.positions.take() {
            device.delete_buffer(positions);
        }
        if let Some(vertex_array) = self.vertex_array.take() {
            device.delete_vertex_array(vertex_array);
        }
    }
}
