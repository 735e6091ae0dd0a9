//! The rotating triangle scene.
//!
//! [`RotatingTriangle`] is the frame driver: it owns the mesh, the program
//! and the animation angle, and walks through
//! `Uninitialized → Ready → (Updating ⇄ Drawing)* → TornDown`.

use thiserror::Error;

use crate::{
    data_structures::{
        handles::{Primitive, ProgramId, UniformLocation},
        mesh::{COLOUR_COMPONENTS, Mesh, POSITION_COMPONENTS},
        transform::Transform,
    },
    device::RenderDevice,
    flow::{Out, Scene},
    input::Keyboard,
    resources::{
        mesh::{AttributeSlots, bind_mesh_attributes, create_mesh, unbind_mesh_attributes},
        shader::{ProgramPaths, load_program},
    },
    settings::{BindingStrategy, Settings},
};

pub const POSITION_ATTRIBUTE: &str = "aPosition";
pub const COLOUR_ATTRIBUTE: &str = "aColor";
pub const WORLD_UNIFORM: &str = "uWorld";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SceneError {
    #[error("`{operation}` called in state {state:?}")]
    Lifecycle {
        operation: &'static str,
        state: Lifecycle,
    },

    #[error("program has no attribute `{0}`")]
    MissingAttribute(&'static str),

    #[error("program has no uniform `{0}`")]
    MissingUniform(&'static str),

    #[error("attribute `{name}` has {found} components but the mesh provides {expected}")]
    AttributeMismatch {
        name: &'static str,
        expected: u32,
        found: u32,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Ready,
    Updating,
    Drawing,
    TornDown,
}

/// Resources acquired by `init`, in acquisition order.
#[derive(Debug)]
struct Resources {
    program: ProgramId,
    mesh: Mesh,
    world: UniformLocation,
}

#[derive(Debug)]
pub struct RotatingTriangle {
    settings: Settings,
    state: Lifecycle,
    angle: f32,
    resources: Option<Resources>,
}

impl RotatingTriangle {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            state: Lifecycle::Uninitialized,
            angle: 0.0,
            resources: None,
        }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    pub fn program(&self) -> Option<ProgramId> {
        self.resources.as_ref().map(|r| r.program)
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        self.resources.as_ref().map(|r| &r.mesh)
    }

    /// The transform `draw` uploads for the current angle.
    pub fn world(&self) -> Transform {
        Transform::rotation_y(self.angle)
    }

    fn check(&self, operation: &'static str, allowed: &[Lifecycle]) -> Result<(), SceneError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(SceneError::Lifecycle {
                operation,
                state: self.state,
            })
        }
    }

    /// Look up the shader interface the mesh relies on and check it matches
    /// the mesh's buffer layout.
    fn resolve_slots(
        device: &dyn RenderDevice,
        program: ProgramId,
    ) -> Result<(AttributeSlots, UniformLocation), SceneError> {
        let position = device
            .attribute_location(program, POSITION_ATTRIBUTE)
            .ok_or(SceneError::MissingAttribute(POSITION_ATTRIBUTE))?;
        let colour = device
            .attribute_location(program, COLOUR_ATTRIBUTE)
            .ok_or(SceneError::MissingAttribute(COLOUR_ATTRIBUTE))?;
        let world = device
            .uniform_location(program, WORLD_UNIFORM)
            .ok_or(SceneError::MissingUniform(WORLD_UNIFORM))?;

        check_components(device, program, POSITION_ATTRIBUTE, POSITION_COMPONENTS)?;
        check_components(device, program, COLOUR_ATTRIBUTE, COLOUR_COMPONENTS)?;

        Ok((AttributeSlots { position, colour }, world))
    }

    fn acquire(&self, device: &mut dyn RenderDevice) -> anyhow::Result<Resources> {
        let paths = ProgramPaths::from_name(&self.settings.shader_dir, &self.settings.shader);
        let program = load_program(device, &paths)?;

        let mesh = match Self::resolve_slots(device, program) {
            Ok((slots, world)) => {
                let setup_slots = match self.settings.binding {
                    BindingStrategy::SetupTime => Some(slots),
                    BindingStrategy::DrawTime => None,
                };
                create_mesh(device, setup_slots)
                    .map(|mesh| (mesh, world))
                    .map_err(anyhow::Error::from)
            }
            Err(e) => Err(e.into()),
        };

        match mesh {
            Ok((mesh, world)) => Ok(Resources {
                program,
                mesh,
                world,
            }),
            Err(e) => {
                device.delete_program(program);
                Err(e)
            }
        }
    }
}

fn check_components(
    device: &dyn RenderDevice,
    program: ProgramId,
    name: &'static str,
    expected: u32,
) -> Result<(), SceneError> {
    let found = device
        .program_layout(program)
        .and_then(|layout| layout.attribute(name))
        .map(|attribute| attribute.components);
    match found {
        Some(found) if found != expected => Err(SceneError::AttributeMismatch {
            name,
            expected,
            found,
        }),
        _ => Ok(()),
    }
}

impl Scene for RotatingTriangle {
    fn init(&mut self, device: &mut dyn RenderDevice) -> anyhow::Result<()> {
        self.check("init", &[Lifecycle::Uninitialized])?;

        device.set_clear_colour(self.settings.clear_colour);
        self.resources = Some(self.acquire(device)?);
        self.state = Lifecycle::Ready;
        Ok(())
    }

    fn update(&mut self, secs: f32, keys: &Keyboard) -> anyhow::Result<Out> {
        self.check(
            "update",
            &[Lifecycle::Ready, Lifecycle::Updating, Lifecycle::Drawing],
        )?;
        self.state = Lifecycle::Updating;

        if keys.is_pressed(self.settings.exit_key) {
            return Ok(Out::Exit);
        }

        self.angle += self.settings.angular_speed * secs;
        Ok(Out::Empty)
    }

    fn draw(&mut self, device: &mut dyn RenderDevice) -> anyhow::Result<()> {
        self.check(
            "draw",
            &[Lifecycle::Ready, Lifecycle::Updating, Lifecycle::Drawing],
        )?;
        self.state = Lifecycle::Drawing;

        let Some(resources) = self.resources.as_ref() else {
            return Err(SceneError::Lifecycle {
                operation: "draw",
                state: self.state,
            }
            .into());
        };

        device.clear();
        device.use_program(Some(resources.program))?;
        device.bind_vertex_array(resources.mesh.vertex_array())?;

        let draw_slots = match self.settings.binding {
            BindingStrategy::DrawTime => {
                let (slots, _) = Self::resolve_slots(device, resources.program)?;
                bind_mesh_attributes(device, &resources.mesh, slots)?;
                Some(slots)
            }
            BindingStrategy::SetupTime => None,
        };

        let transform = Transform::rotation_y(self.angle);
        device.uniform_matrix4(resources.world, transform.as_array())?;
        device.draw_arrays(Primitive::Triangles, 0, resources.mesh.vertex_count())?;

        if let Some(slots) = draw_slots {
            unbind_mesh_attributes(device, &resources.mesh, slots)?;
        }
        device.bind_vertex_array(None)?;
        device.use_program(None)?;
        Ok(())
    }

    fn deinit(&mut self, device: &mut dyn RenderDevice) {
        if let Some(mut resources) = self.resources.take() {
            // reverse acquisition order: mesh buffers, vertex array, program
            resources.mesh.release(device);
            device.delete_program(resources.program);
            log::debug!("Released triangle resources");
        }
        self.state = Lifecycle::TornDown;
    }
}
