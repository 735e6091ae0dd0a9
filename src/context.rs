//! The wgpu-backed [`RenderDevice`].
//!
//! [`Context`] owns the device, the queue and the render target (a window
//! surface, or an offscreen texture when headless). Resources created through
//! the [`RenderDevice`] calls live in slot maps keyed by the typed handles;
//! draw calls are recorded into [`FrameCommands`] and replayed by
//! [`Context::render`].

use std::{collections::BTreeMap, collections::HashMap, iter, mem, sync::Arc, time::Duration};

use anyhow::{Context as _, anyhow, bail};
use slotmap::SlotMap;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    data_structures::{
        handles::{
            AttribLocation, BufferId, BufferUsage, Primitive, ProgramId, UniformLocation,
            VertexArrayId,
        },
        program::{AttributeBinding, ProgramLayout, ProgramSource, VertexArray},
    },
    device::{DeviceError, DeviceResult, RenderDevice},
    pipelines::basic::{self, ShaderStage},
    render::{Bindings, DrawCall, FrameCommands, MAX_VERTEX_BUFFERS},
    settings::Settings,
};

const MATRIX_SIZE: wgpu::BufferAddress = std::mem::size_of::<[f32; 16]>() as wgpu::BufferAddress;

#[derive(Debug)]
enum RenderTarget {
    Surface {
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
    },
    Texture {
        texture: wgpu::Texture,
        view: wgpu::TextureView,
    },
}

impl RenderTarget {
    fn format(&self) -> wgpu::TextureFormat {
        match self {
            RenderTarget::Surface { config, .. } => config.format,
            RenderTarget::Texture { texture, .. } => texture.format(),
        }
    }

    fn size(&self) -> (u32, u32) {
        match self {
            RenderTarget::Surface { config, .. } => (config.width, config.height),
            RenderTarget::Texture { texture, .. } => (texture.width(), texture.height()),
        }
    }
}

/// Uniform buffers and their bind group for one draw of a program.
///
/// Every draw of a frame gets its own slot, so several draws of one program
/// with different uniform values don't overwrite each other before submit.
#[derive(Debug)]
struct UniformSlot {
    buffers: Vec<(UniformLocation, wgpu::Buffer)>,
    bind_group: wgpu::BindGroup,
}

impl UniformSlot {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, program: &ProgramLayout) -> Self {
        let buffers: Vec<_> = program
            .uniforms
            .iter()
            .map(|uniform| {
                let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&uniform.name),
                    size: MATRIX_SIZE,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                (uniform.location, buffer)
            })
            .collect();
        let entries: Vec<_> = buffers
            .iter()
            .map(|(location, buffer)| wgpu::BindGroupEntry {
                binding: location.0,
                resource: buffer.as_entire_binding(),
            })
            .collect();
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &entries,
            label: Some("uniform_bind_group"),
        });
        Self {
            buffers,
            bind_group,
        }
    }

    fn buffer(&self, location: UniformLocation) -> Option<&wgpu::Buffer> {
        self.buffers
            .iter()
            .find(|(l, _)| *l == location)
            .map(|(_, buffer)| buffer)
    }
}

#[derive(Debug)]
struct GpuProgram {
    layout: ProgramLayout,
    vertex: wgpu::ShaderModule,
    vertex_entry: String,
    fragment: wgpu::ShaderModule,
    fragment_entry: String,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    uniform_values: BTreeMap<UniformLocation, [f32; 16]>,
    uniform_slots: Vec<UniformSlot>,
    /// First unused entry of `uniform_slots` in the frame being submitted.
    next_slot: usize,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: ProgramId,
    /// Attribute location and width per vertex buffer slot.
    vertex_layout: [Option<(AttribLocation, u32)>; MAX_VERTEX_BUFFERS],
    primitive: Primitive,
}

impl PipelineKey {
    fn of(draw: &DrawCall) -> Self {
        let mut vertex_layout = [None; MAX_VERTEX_BUFFERS];
        for (entry, slot) in vertex_layout.iter_mut().zip(&draw.vertex_buffers) {
            *entry = Some((slot.location, slot.components));
        }
        Self {
            program: draw.program,
            vertex_layout,
            primitive: draw.primitive,
        }
    }
}

/// Per-draw state resolved before the render pass starts.
#[derive(Debug, Copy, Clone)]
struct PreparedDraw {
    key: PipelineKey,
    /// `None` for draws of deleted programs.
    slot: Option<usize>,
}

#[derive(Debug)]
pub struct Context {
    window: Option<Arc<Window>>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    target: RenderTarget,
    pub clear_colour: wgpu::Color,
    buffers: SlotMap<BufferId, wgpu::Buffer>,
    vertex_arrays: SlotMap<VertexArrayId, VertexArray>,
    programs: SlotMap<ProgramId, GpuProgram>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    bound_program: Option<ProgramId>,
    bound_vertex_array: Option<VertexArrayId>,
    frame: FrameCommands,
    prepared: Vec<PreparedDraw>,
}

impl Context {
    pub async fn new(window: Arc<Window>, settings: &Settings) -> anyhow::Result<Self> {
        let size = window.inner_size();
        let (width, height) = (size.width.max(1), size.height.max(1));

        log::info!("WGPU setup");
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window.clone())?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no graphics adapter for the window surface")?;
        let (device, queue) = request_device(&adapter).await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let mut config = surface
            .get_default_config(&adapter, width, height)
            .ok_or_else(|| anyhow!("the adapter cannot present to this window"))?;
        // vertex colours are linear, let the surface do the sRGB encoding
        if let Some(format) = surface_caps.formats.iter().copied().find(|f| f.is_srgb()) {
            config.format = format;
        }
        config.present_mode = if settings.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        surface.configure(&device, &config);
        log::info!(
            "Surface configured: {}x{} {:?} {:?}",
            config.width,
            config.height,
            config.format,
            config.present_mode
        );

        Ok(Self::with_target(
            Some(window),
            device,
            queue,
            RenderTarget::Surface { surface, config },
        ))
    }

    /// A context rendering into an offscreen RGBA texture, read back with
    /// [`Context::read_pixels`].
    pub async fn new_headless(width: u32, height: u32) -> anyhow::Result<Self> {
        let instance = wgpu::Instance::default();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("no graphics adapter")?;
        let (device, queue) = request_device(&adapter).await?;

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("headless_target"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self::with_target(
            None,
            device,
            queue,
            RenderTarget::Texture { texture, view },
        ))
    }

    fn with_target(
        window: Option<Arc<Window>>,
        device: wgpu::Device,
        queue: wgpu::Queue,
        target: RenderTarget,
    ) -> Self {
        Self {
            window,
            device,
            queue,
            target,
            clear_colour: wgpu::Color::BLACK,
            buffers: SlotMap::with_key(),
            vertex_arrays: SlotMap::with_key(),
            programs: SlotMap::with_key(),
            pipelines: HashMap::new(),
            bound_program: None,
            bound_vertex_array: None,
            frame: FrameCommands::default(),
            prepared: Vec::new(),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.target.size()
    }

    pub fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    /// Follow a window resize. Zero sizes (minimised windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if let RenderTarget::Surface { surface, config } = &mut self.target {
            config.width = width;
            config.height = height;
            surface.configure(&self.device, config);
        }
    }

    /// Configure the surface again after it was lost or became outdated.
    pub fn reconfigure(&mut self) {
        if let RenderTarget::Surface { surface, config } = &self.target {
            surface.configure(&self.device, config);
        }
    }

    /// Submit the recorded frame and present it. The frame is reset even if
    /// acquiring the surface texture fails.
    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let mut frame = mem::take(&mut self.frame);
        let result = self.submit(&frame);
        frame.reset();
        self.frame = frame;
        result
    }

    fn submit(&mut self, frame: &FrameCommands) -> Result<(), wgpu::SurfaceError> {
        self.prepare(frame);

        let (output, view) = match &self.target {
            RenderTarget::Surface { surface, .. } => {
                let output = surface.get_current_texture()?;
                let view = output
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                (Some(output), view)
            }
            RenderTarget::Texture { view, .. } => (None, view.clone()),
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let load = match frame.clear_colour() {
                Some(colour) => wgpu::LoadOp::Clear(colour),
                None => wgpu::LoadOp::Load,
            };
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                ..Default::default()
            });

            for (draw, prepared) in frame.draws().iter().zip(&self.prepared) {
                let (Some(pipeline), Some(program)) = (
                    self.pipelines.get(&prepared.key),
                    self.programs.get(draw.program),
                ) else {
                    log::warn!("Skipping draw of a deleted program");
                    continue;
                };
                if draw
                    .vertex_buffers
                    .iter()
                    .any(|vertex| !self.buffers.contains_key(vertex.buffer))
                {
                    log::warn!("Skipping draw reading a deleted buffer");
                    continue;
                }

                render_pass.set_pipeline(pipeline);
                if let Some(uniforms) = prepared
                    .slot
                    .and_then(|slot| program.uniform_slots.get(slot))
                {
                    render_pass.set_bind_group(0, &uniforms.bind_group, &[]);
                }
                for (index, vertex) in draw.vertex_buffers.iter().enumerate() {
                    if let Some(buffer) = self.buffers.get(vertex.buffer) {
                        render_pass.set_vertex_buffer(index as u32, buffer.slice(..));
                    }
                }
                render_pass.draw(draw.first..draw.first + draw.count, 0..1);
            }
        }

        self.queue.submit(iter::once(encoder.finish()));
        if let Some(output) = output {
            if let Some(window) = &self.window {
                window.pre_present_notify();
            }
            output.present();
        }
        Ok(())
    }

    /// Copy the offscreen target back to the CPU. Only available on headless
    /// contexts.
    pub async fn read_pixels(&self) -> anyhow::Result<image::RgbaImage> {
        let RenderTarget::Texture { texture, .. } = &self.target else {
            bail!("read_pixels needs a headless context");
        };
        let (width, height) = self.size();
        let u32_size = std::mem::size_of::<u32>() as u32;
        let unpadded_bytes_per_row = u32_size * width;
        let bytes_per_row = unpadded_bytes_per_row.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            size: (bytes_per_row * height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            label: Some("readback_buffer"),
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        let submission_index = self.queue.submit(iter::once(encoder.finish()));

        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        let buffer_slice = output_buffer.slice(..);
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            // the receiver is only gone if the caller stopped waiting
            let _ = tx.send(result);
        });
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: Some(submission_index),
                timeout: Some(Duration::from_secs(3)),
            })
            .map_err(|e| anyhow!("waiting for the readback failed: {e}"))?;
        rx.receive()
            .await
            .ok_or_else(|| anyhow!("readback channel closed"))??;

        let data = buffer_slice.get_mapped_range();
        let mut pixels = Vec::with_capacity((unpadded_bytes_per_row * height) as usize);
        for row in data.chunks(bytes_per_row as usize) {
            pixels.extend_from_slice(&row[..unpadded_bytes_per_row as usize]);
        }
        drop(data);
        output_buffer.unmap();

        image::RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| anyhow!("readback size does not match {width}x{height}"))
    }

    /// Resolve pipelines and uniform slots for every draw of `frame` into
    /// `self.prepared`.
    fn prepare(&mut self, frame: &FrameCommands) {
        self.prepared.clear();
        for (_, program) in self.programs.iter_mut() {
            program.next_slot = 0;
        }
        for draw in frame.draws() {
            let key = PipelineKey::of(draw);
            self.ensure_pipeline(key, draw);
            let slot = self.upload_uniforms(draw);
            self.prepared.push(PreparedDraw { key, slot });
        }
    }

    fn ensure_pipeline(&mut self, key: PipelineKey, draw: &DrawCall) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        let Some(program) = self.programs.get(draw.program) else {
            return;
        };
        let attributes = basic::vertex_attributes(&draw.vertex_buffers);
        let layouts = basic::vertex_layouts(&draw.vertex_buffers, &attributes);
        let pipeline = basic::mk_render_pipeline(
            &self.device,
            &program.pipeline_layout,
            self.target.format(),
            draw.primitive.into(),
            &layouts,
            ShaderStage {
                module: &program.vertex,
                entry_point: &program.vertex_entry,
            },
            ShaderStage {
                module: &program.fragment,
                entry_point: &program.fragment_entry,
            },
        );
        log::debug!("Created pipeline for {:?}", key);
        self.pipelines.insert(key, pipeline);
    }

    /// Write the draw's uniform values into the program's next free slot.
    /// Returns `None` for draws of deleted programs.
    fn upload_uniforms(&mut self, draw: &DrawCall) -> Option<usize> {
        let program = self.programs.get_mut(draw.program)?;
        let slot = program.next_slot;
        program.next_slot += 1;

        if program.uniform_slots.len() <= slot {
            program.uniform_slots.push(UniformSlot::new(
                &self.device,
                &program.bind_group_layout,
                &program.layout,
            ));
        }
        let uniforms = &program.uniform_slots[slot];
        for (location, matrix) in &draw.uniforms {
            if let Some(buffer) = uniforms.buffer(*location) {
                self.queue
                    .write_buffer(buffer, 0, bytemuck::bytes_of(matrix));
            }
        }
        Some(slot)
    }
}

async fn request_device(adapter: &wgpu::Adapter) -> anyhow::Result<(wgpu::Device, wgpu::Queue)> {
    let info = adapter.get_info();
    log::info!("Using {} ({:?})", info.name, info.backend);
    let device = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("spin_ngin_device"),
            required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                .using_resolution(adapter.limits()),
            ..Default::default()
        })
        .await?;
    Ok(device)
}

impl RenderDevice for Context {
    fn set_clear_colour(&mut self, colour: wgpu::Color) {
        self.clear_colour = colour;
    }

    fn create_buffer(&mut self, data: &[u8], usage: BufferUsage) -> DeviceResult<BufferId> {
        if data.is_empty() {
            return Err(DeviceError::EmptyBuffer);
        }
        let max_size = self.device.limits().max_buffer_size;
        if data.len() as u64 > max_size {
            return Err(DeviceError::Backend(format!(
                "{} bytes exceed the device's max_buffer_size of {max_size}",
                data.len()
            )));
        }
        let usage = match usage {
            BufferUsage::StaticDraw => wgpu::BufferUsages::VERTEX,
        };
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Vertex Buffer"),
                contents: data,
                usage,
            });
        Ok(self.buffers.insert(buffer))
    }

    fn delete_buffer(&mut self, buffer: BufferId) -> bool {
        let Some(removed) = self.buffers.remove(buffer) else {
            return false;
        };
        removed.destroy();
        for (_, vertex_array) in self.vertex_arrays.iter_mut() {
            vertex_array.forget_buffer(buffer);
        }
        true
    }

    fn create_vertex_array(&mut self) -> DeviceResult<VertexArrayId> {
        Ok(self.vertex_arrays.insert(VertexArray::new()))
    }

    fn delete_vertex_array(&mut self, vertex_array: VertexArrayId) -> bool {
        if self.vertex_arrays.remove(vertex_array).is_none() {
            return false;
        }
        if self.bound_vertex_array == Some(vertex_array) {
            self.bound_vertex_array = None;
        }
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
        let vertex_array = self
            .vertex_arrays
            .get_mut(vertex_array)
            .ok_or(DeviceError::UnknownHandle("vertex array"))?;
        vertex_array.bind(location, AttributeBinding { buffer, components });
        Ok(())
    }

    fn disable_attribute(
        &mut self,
        vertex_array: VertexArrayId,
        location: AttribLocation,
    ) -> DeviceResult<()> {
        let vertex_array = self
            .vertex_arrays
            .get_mut(vertex_array)
            .ok_or(DeviceError::UnknownHandle("vertex array"))?;
        vertex_array.disable(location);
        Ok(())
    }

    fn create_program(&mut self, source: &ProgramSource) -> DeviceResult<ProgramId> {
        let vertex = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&source.label),
                source: wgpu::ShaderSource::Wgsl(source.vertex.code.clone().into()),
            });
        let fragment = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&source.label),
                source: wgpu::ShaderSource::Wgsl(source.fragment.code.clone().into()),
            });

        let entries: Vec<_> = source
            .layout
            .uniforms
            .iter()
            .map(|uniform| wgpu::BindGroupLayoutEntry {
                binding: uniform.location.0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(MATRIX_SIZE),
                },
                count: None,
            })
            .collect();
        let bind_group_layout =
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    entries: &entries,
                    label: Some("uniform_bind_group_layout"),
                });
        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Render Pipeline Layout"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

        let uniform_values = source
            .layout
            .uniforms
            .iter()
            .map(|uniform| (uniform.location, [0.0; 16]))
            .collect();

        let program = self.programs.insert(GpuProgram {
            layout: source.layout.clone(),
            vertex,
            vertex_entry: source.vertex.entry_point.clone(),
            fragment,
            fragment_entry: source.fragment.entry_point.clone(),
            bind_group_layout,
            pipeline_layout,
            uniform_values,
            uniform_slots: Vec::new(),
            next_slot: 0,
        });
        log::debug!("Created program `{}`", source.label);
        Ok(program)
    }

    fn delete_program(&mut self, program: ProgramId) -> bool {
        if self.programs.remove(program).is_none() {
            return false;
        }
        self.pipelines.retain(|key, _| key.program != program);
        if self.bound_program == Some(program) {
            self.bound_program = None;
        }
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
        Ok(())
    }

    fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) -> DeviceResult<()> {
        if let Some(vertex_array) = vertex_array {
            if !self.vertex_arrays.contains_key(vertex_array) {
                return Err(DeviceError::UnknownHandle("vertex array"));
            }
        }
        self.bound_vertex_array = vertex_array;
        Ok(())
    }

    fn clear(&mut self) {
        self.frame.clear(self.clear_colour);
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
        let value = program
            .uniform_values
            .get_mut(&location)
            .ok_or(DeviceError::UnknownUniform(location.0))?;
        *value = *matrix;
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
        )
    }
}
