//! The host graphics API seen by scenes.
//!
//! [`RenderDevice`] is a small, GL-shaped command surface: resources are
//! created up front and referred to by typed handles, state is bound before
//! a draw and unbound afterwards. [`crate::context::Context`] implements it
//! on top of wgpu; tests implement it with a counting mock.

use thiserror::Error;

use crate::data_structures::{
    handles::{
        AttribLocation, BufferId, BufferUsage, Primitive, ProgramId, UniformLocation,
        VertexArrayId,
    },
    program::{ProgramLayout, ProgramSource},
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("unknown or deleted {0} handle")]
    UnknownHandle(&'static str),

    #[error("buffer data must not be empty")]
    EmptyBuffer,

    #[error("attribute must have 1 to 4 components, got {0}")]
    InvalidComponents(u32),

    #[error("{0} requires a bound program")]
    NoProgramBound(&'static str),

    #[error("{0} requires a bound vertex array")]
    NoVertexArrayBound(&'static str),

    #[error("the bound program has no uniform at binding {0}")]
    UnknownUniform(u32),

    #[error("draw needs attribute {location} but the vertex array does not enable it")]
    MissingAttribute { location: u32 },

    #[error("host API failure: {0}")]
    Backend(String),
}

pub type DeviceResult<T> = Result<T, DeviceError>;

pub trait RenderDevice {
    /// Colour used by subsequent [`RenderDevice::clear`] calls.
    fn set_clear_colour(&mut self, colour: wgpu::Color);

    fn create_buffer(&mut self, data: &[u8], usage: BufferUsage) -> DeviceResult<BufferId>;

    /// Returns `false` if the handle was already gone.
    fn delete_buffer(&mut self, buffer: BufferId) -> bool;

    fn create_vertex_array(&mut self) -> DeviceResult<VertexArrayId>;

    /// Returns `false` if the handle was already gone.
    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) -> bool;

    /// Enable `location` on `vertex_array`, reading tightly packed `f32`
    /// vectors of `components` elements from `buffer`.
    fn bind_attribute(
        &mut self,
        vertex_array: VertexArrayId,
        location: AttribLocation,
        buffer: BufferId,
        components: u32,
    ) -> DeviceResult<()>;

    fn disable_attribute(
        &mut self,
        vertex_array: VertexArrayId,
        location: AttribLocation,
    ) -> DeviceResult<()>;

    fn create_program(&mut self, source: &ProgramSource) -> DeviceResult<ProgramId>;

    /// Returns `false` if the handle was already gone.
    fn delete_program(&mut self, program: ProgramId) -> bool;

    /// Reflected interface of a live program.
    fn program_layout(&self, program: ProgramId) -> Option<&ProgramLayout>;

    /// `None` is the "not found" sentinel.
    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<AttribLocation> {
        self.program_layout(program)?
            .attribute(name)
            .map(|attribute| attribute.location)
    }

    /// `None` is the "not found" sentinel.
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.program_layout(program)?
            .uniform(name)
            .map(|uniform| uniform.location)
    }

    fn use_program(&mut self, program: Option<ProgramId>) -> DeviceResult<()>;

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) -> DeviceResult<()>;

    /// Clear the colour buffer with the current clear colour.
    fn clear(&mut self);

    /// Set a matrix uniform of the bound program. The matrix is column-major.
    fn uniform_matrix4(&mut self, location: UniformLocation, matrix: &[f32; 16])
    -> DeviceResult<()>;

    /// Draw `count` vertices starting at `first` with the bound program and
    /// vertex array.
    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32) -> DeviceResult<()>;
}
