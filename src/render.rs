//! Frame recording.
//!
//! Draw commands issued through [`crate::device::RenderDevice`] are not
//! executed immediately. Each call snapshots the state it depends on (program,
//! enabled attributes, uniform values) into a [`DrawCall`] and appends it to
//! the frame's [`FrameCommands`]; the backend replays the whole frame in one
//! render pass when it is submitted.
//!
//! # Key types
//!
//! - [`FrameCommands`] is the per-frame command list, reset on submit
//! - [`DrawCall`] is one snapshotted `draw_arrays`
//! - [`VertexSlot`] is one vertex buffer feeding one attribute of a draw
//!
//! Recorded draws are reused across frames, so a steady frame loop records
//! without touching the allocator.

use std::collections::BTreeMap;

use crate::{
    data_structures::{
        handles::{AttribLocation, BufferId, Primitive, ProgramId, UniformLocation},
        program::{ProgramLayout, VertexArray},
    },
    device::{DeviceError, DeviceResult},
};

/// Vertex buffers a single draw may read from.
pub const MAX_VERTEX_BUFFERS: usize = 8;

/// A vertex buffer bound to one attribute location for a draw.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct VertexSlot {
    pub location: AttribLocation,
    pub buffer: BufferId,
    pub components: u32,
}

/// The device state a draw reads from.
#[derive(Copy, Clone, Debug)]
pub struct Bindings<'a> {
    pub program: ProgramId,
    pub layout: &'a ProgramLayout,
    pub vertex_array: &'a VertexArray,
    /// Uniforms never set read as zero.
    pub uniform_values: &'a BTreeMap<UniformLocation, [f32; 16]>,
}

/// Everything needed to replay one `draw_arrays` call.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawCall {
    pub program: ProgramId,
    pub primitive: Primitive,
    pub first: u32,
    pub count: u32,
    /// Ordered by attribute location.
    pub vertex_buffers: Vec<VertexSlot>,
    /// Ordered by uniform location.
    pub uniforms: Vec<(UniformLocation, [f32; 16])>,
}

impl DrawCall {
    /// Capture the current bindings. Every attribute the program reads must
    /// be enabled on the vertex array.
    pub fn snapshot(
        bindings: Bindings,
        primitive: Primitive,
        first: u32,
        count: u32,
    ) -> DeviceResult<Self> {
        let mut draw = Self {
            program: bindings.program,
            primitive,
            first,
            count,
            vertex_buffers: Vec::new(),
            uniforms: Vec::new(),
        };
        draw.capture(bindings, primitive, first, count)?;
        Ok(draw)
    }

    /// [`DrawCall::snapshot`] into an existing draw, keeping its storage.
    fn capture(
        &mut self,
        bindings: Bindings,
        primitive: Primitive,
        first: u32,
        count: u32,
    ) -> DeviceResult<()> {
        let attributes = &bindings.layout.attributes;
        if attributes.len() > MAX_VERTEX_BUFFERS {
            return Err(DeviceError::Backend(format!(
                "draw reads {} attributes, at most {MAX_VERTEX_BUFFERS} are supported",
                attributes.len()
            )));
        }

        self.vertex_buffers.clear();
        for attribute in attributes {
            let binding = bindings.vertex_array.get(attribute.location).ok_or(
                DeviceError::MissingAttribute {
                    location: attribute.location.0,
                },
            )?;
            self.vertex_buffers.push(VertexSlot {
                location: attribute.location,
                buffer: binding.buffer,
                components: binding.components,
            });
        }
        self.vertex_buffers.sort_unstable_by_key(|slot| slot.location);

        self.uniforms.clear();
        self.uniforms
            .extend(bindings.layout.uniforms.iter().map(|uniform| {
                let value = bindings
                    .uniform_values
                    .get(&uniform.location)
                    .copied()
                    .unwrap_or([0.0; 16]);
                (uniform.location, value)
            }));
        self.uniforms.sort_unstable_by_key(|(location, _)| *location);

        self.program = bindings.program;
        self.primitive = primitive;
        self.first = first;
        self.count = count;
        Ok(())
    }

    pub fn uniform(&self, location: UniformLocation) -> Option<&[f32; 16]> {
        self.uniforms
            .iter()
            .find(|(l, _)| *l == location)
            .map(|(_, value)| value)
    }
}

/// The commands recorded for the frame in flight.
#[derive(Debug, Default)]
pub struct FrameCommands {
    clear: Option<wgpu::Color>,
    /// Only the first `len` entries belong to this frame; the rest are kept
    /// for their storage.
    draws: Vec<DrawCall>,
    len: usize,
}

impl FrameCommands {
    /// Clearing wipes whatever was drawn before it in the same frame.
    pub fn clear(&mut self, colour: wgpu::Color) {
        self.clear = Some(colour);
        self.len = 0;
    }

    /// Snapshot `bindings` as the next draw of the frame. Nothing is
    /// recorded if the snapshot fails.
    pub fn record(
        &mut self,
        bindings: Bindings,
        primitive: Primitive,
        first: u32,
        count: u32,
    ) -> DeviceResult<()> {
        match self.draws.get_mut(self.len) {
            Some(draw) => draw.capture(bindings, primitive, first, count)?,
            None => self
                .draws
                .push(DrawCall::snapshot(bindings, primitive, first, count)?),
        }
        self.len += 1;
        Ok(())
    }

    pub fn clear_colour(&self) -> Option<wgpu::Color> {
        self.clear
    }

    pub fn draws(&self) -> &[DrawCall] {
        &self.draws[..self.len]
    }

    pub fn is_empty(&self) -> bool {
        self.clear.is_none() && self.len == 0
    }

    /// Start the next frame, keeping the recorded draws' storage.
    pub fn reset(&mut self) {
        self.clear = None;
        self.len = 0;
    }
}
