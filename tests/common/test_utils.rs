use std::{collections::BTreeMap, path::PathBuf};

use slotmap::SlotMap;
use spin_ngin::{
    data_structures::{
        handles::{
            AttribLocation, BufferId, BufferUsage, Primitive, ProgramId, UniformLocation,
            VertexArrayId,
        },
        program::{AttributeBinding, ProgramLayout, ProgramSource, VertexArray},
    },
    device::{DeviceError, DeviceResult, RenderDevice},
    input::Keyboard,
    render::{Bindings, DrawCall, FrameCommands},
    settings::Settings,
};
use winit::keyboard::KeyCode;

/// Every state-changing call the mock received, in order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    CreateBuffer(BufferId),
    DeleteBuffer(BufferId),
    CreateVertexArray(VertexArrayId),
    DeleteVertexArray(VertexArrayId),
    BindAttribute(VertexArrayId, AttribLocation),
    DisableAttribute(VertexArrayId, AttribLocation),
    CreateProgram(ProgramId),
    DeleteProgram(ProgramId),
    UseProgram(Option<ProgramId>),
    BindVertexArray(Option<VertexArrayId>),
    Clear,
    UniformMatrix4(UniformLocation),
    DrawArrays(Primitive, u32, u32),
}

impl Call {
    pub(crate) fn is_deletion(&self) -> bool {
        matches!(
            self,
            Call::DeleteBuffer(_) | Call::DeleteVertexArray(_) | Call::DeleteProgram(_)
        )
    }
}

struct MockProgram {
    layout: ProgramLayout,
    uniform_values: BTreeMap<UniformLocation, [f32; 16]>,
}

/// A [`RenderDevice`] that keeps resources in memory and records what it was
/// asked to do.
pub(crate) struct MockDevice {
    pub clear_colour: wgpu::Color,
    buffers: SlotMap<BufferId, (Vec<u8>, BufferUsage)>,
    vertex_arrays: SlotMap<VertexArrayId, VertexArray>,
    programs: SlotMap<ProgramId, MockProgram>,
    bound_program: Option<ProgramId>,
    bound_vertex_array: Option<VertexArrayId>,
    pub calls: Vec<Call>,
    pub frame: FrameCommands,
    /// Fail `create_buffer` once this many buffers were created.
    pub buffer_budget: Option<usize>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            clear_colour: wgpu::Color::TRANSPARENT,
            buffers: SlotMap::with_key(),
            vertex_arrays: SlotMap::with_key(),
            programs: SlotMap::with_key(),
            bound_program: None,
            bound_vertex_array: None,
            calls: Vec::new(),
            frame: FrameCommands::default(),
            buffer_budget: None,
        }
    }

    /// Buffers, vertex arrays and programs still alive.
    pub fn live_handles(&self) -> usize {
        self.buffers.len() + self.vertex_arrays.len() + self.programs.len()
    }

    pub fn buffer_data(&self, buffer: BufferId) -> Option<&[u8]> {
        self.buffers.get(buffer).map(|(data, _)| data.as_slice())
    }

    pub fn vertex_array(&self, vertex_array: VertexArrayId) -> Option<&VertexArray> {
        self.vertex_arrays.get(vertex_array)
    }

    pub fn bound_program(&self) -> Option<ProgramId> {
        self.bound_program
    }

    pub fn bound_vertex_array(&self) -> Option<VertexArrayId> {
        self.bound_vertex_array
    }

    pub fn draws(&self) -> &[DrawCall] {
        self.frame.draws()
    }

    /// What `Context::render` would submit; starts the next frame.
    pub fn submit(&mut self) -> FrameCommands {
        std::mem::take(&mut self.frame)
    }

    pub fn deletions(&self) -> Vec<Call> {
        self.calls
            .iter()
            .filter(|call| call.is_deletion())
            .cloned()
            .collect()
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderDevice for MockDevice {
    fn set_clear_colour(&mut self, colour: wgpu::Color) {
        self.clear_colour = colour;
    }

    fn create_buffer(&mut self, data: &[u8], usage: BufferUsage) -> DeviceResult<BufferId> {
        if data.is_empty() {
            return Err(DeviceError::EmptyBuffer);
        }
        if let Some(budget) = self.buffer_budget {
            if self.buffers.len() >= budget {
                return Err(DeviceError::Backend("out of memory".into()));
            }
        }
        let buffer = self.buffers.insert((data.to_vec(), usage));
        self.calls.push(Call::CreateBuffer(buffer));
        Ok(buffer)
    }

    fn delete_buffer(&mut self, buffer: BufferId) -> bool {
        if self.buffers.remove(buffer).is_none() {
            return false;
        }
        for (_, vertex_array) in self.vertex_arrays.iter_mut() {
            vertex_array.forget_buffer(buffer);
        }
        self.calls.push(Call::DeleteBuffer(buffer));
        true
    }

    fn create_vertex_array(&mut self) -> DeviceResult<VertexArrayId> {
        let vertex_array = self.vertex_arrays.insert(VertexArray::new());
        self.calls.push(Call::CreateVertexArray(vertex_array));
        Ok(vertex_array)
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) -> bool {
        if self.vertex_arrays.remove(vertex_array).is_none() {
            return false;
        }
        if self.bound_vertex_array == Some(vertex_array) {
            self.bound_vertex_array = None;
        }
        self.calls.push(Call::DeleteVertexArray(vertex_array));
        true
    }

    fn bind_attribute(
        &mut self,
        vertex_array: VertexArrayId,
        location: AttribLocation,
        buffer: BufferId,
        components: u32,
    ) -> DeviceResult<()> {
        if !(1..=4).contains(&components) {
            return Err(DeviceError::InvalidComponents(components));
        }
        if !self.buffers.contains_key(buffer) {
            return Err(DeviceError::UnknownHandle("buffer"));
        }
        self.vertex_arrays
            .get_mut(vertex_array)
            .ok_or(DeviceError::UnknownHandle("vertex array"))?
            .bind(location, AttributeBinding { buffer, components });
        self.calls.push(Call::BindAttribute(vertex_array, location));
        Ok(())
    }

    fn disable_attribute(
        &mut self,
        vertex_array: VertexArrayId,
        location: AttribLocation,
    ) -> DeviceResult<()> {
        self.vertex_arrays
            .get_mut(vertex_array)
            .ok_or(DeviceError::UnknownHandle("vertex array"))?
            .disable(location);
        self.calls.push(Call::DisableAttribute(vertex_array, location));
        Ok(())
    }

    fn create_program(&mut self, source: &ProgramSource) -> DeviceResult<ProgramId> {
        let program = self.programs.insert(MockProgram {
            layout: source.layout.clone(),
            uniform_values: BTreeMap::new(),
        });
        self.calls.push(Call::CreateProgram(program));
        Ok(program)
    }

    fn delete_program(&mut self, program: ProgramId) -> bool {
        if self.programs.remove(program).is_none() {
            return false;
        }
        if self.bound_program == Some(program) {
            self.bound_program = None;
        }
        self.calls.push(Call::DeleteProgram(program));
        true
    }

    fn program_layout(&self, program: ProgramId) -> Option<&ProgramLayout> {
        self.programs.get(program).map(|program| &program.layout)
    }

    fn use_program(&mut self, program: Option<ProgramId>) -> DeviceResult<()> {
        if let Some(program) = program {
            if !self.programs.contains_key(program) {
                return Err(DeviceError::UnknownHandle("program"));
            }
        }
        self.bound_program = program;
        self.calls.push(Call::UseProgram(program));
        Ok(())
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) -> DeviceResult<()> {
        if let Some(vertex_array) = vertex_array {
            if !self.vertex_arrays.contains_key(vertex_array) {
                return Err(DeviceError::UnknownHandle("vertex array"));
            }
        }
        self.bound_vertex_array = vertex_array;
        self.calls.push(Call::BindVertexArray(vertex_array));
        Ok(())
    }

    fn clear(&mut self) {
        self.frame.clear(self.clear_colour);
        self.calls.push(Call::Clear);
    }

    fn uniform_matrix4(
        &mut self,
        location: UniformLocation,
        matrix: &[f32; 16],
    ) -> DeviceResult<()> {
        let program = self
            .bound_program
            .and_then(|program| self.programs.get_mut(program))
            .ok_or(DeviceError::NoProgramBound("uniform_matrix4"))?;
        if program.layout.uniforms.iter().all(|u| u.location != location) {
            return Err(DeviceError::UnknownUniform(location.0));
        }
        program.uniform_values.insert(location, *matrix);
        self.calls.push(Call::UniformMatrix4(location));
        Ok(())
    }

    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32) -> DeviceResult<()> {
        let program_id = self
            .bound_program
            .ok_or(DeviceError::NoProgramBound("draw_arrays"))?;
        let program = self
            .programs
            .get(program_id)
            .ok_or(DeviceError::UnknownHandle("program"))?;
        let vertex_array = self
            .bound_vertex_array
            .and_then(|vertex_array| self.vertex_arrays.get(vertex_array))
            .ok_or(DeviceError::NoVertexArrayBound("draw_arrays"))?;
        self.frame.record(
            Bindings {
                program: program_id,
                layout: &program.layout,
                vertex_array,
                uniform_values: &program.uniform_values,
            },
            primitive,
            first,
            count,
        )?;
        self.calls.push(Call::DrawArrays(primitive, first, count));
        Ok(())
    }
}

pub(crate) fn shader_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("assets")
        .join("shaders")
}

pub(crate) fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("shaders")
}

/// Default settings pointing at the bundled shaders.
pub(crate) fn settings() -> Settings {
    Settings::default().shader_dir(shader_dir())
}

/// Settings loading `name` from the test fixtures.
pub(crate) fn fixture_settings(name: &str) -> Settings {
    Settings::default().shader_dir(fixture_dir()).shader(name)
}

pub(crate) fn keys(pressed: &[KeyCode]) -> Keyboard {
    let mut keyboard = Keyboard::new();
    for key in pressed {
        keyboard.press(*key);
    }
    keyboard
}
