//! Launch settings.

use std::path::PathBuf;

use winit::keyboard::KeyCode;

/// When the mesh's attribute pointers are wired to the program's inputs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum BindingStrategy {
    /// Re-derive locations and bind the attribute pointers on every draw.
    DrawTime,
    /// Bind once during init and let the vertex array remember it.
    #[default]
    SetupTime,
}

#[derive(Clone, Debug)]
pub struct Settings {
    /// Window title
    pub title: String,

    /// Initial inner size of the window in physical pixels
    pub width: u32,
    pub height: u32,

    /// Colour the frame is cleared to
    pub clear_colour: wgpu::Color,

    /// Directory holding `<shader>.vert` and `<shader>.frag`
    pub shader_dir: PathBuf,

    /// Base name of the shader program
    pub shader: String,

    /// Rotation speed in radians per second
    pub angular_speed: f32,

    /// Key that closes the window
    pub exit_key: KeyCode,

    pub binding: BindingStrategy,

    /// Wait for vertical sync when presenting
    pub vsync: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: "Rotating Triangle".to_string(),
            width: 800,
            height: 600,
            clear_colour: wgpu::Color::BLACK,
            shader_dir: PathBuf::from("assets").join("shaders"),
            shader: "basic".to_string(),
            angular_speed: std::f32::consts::PI,
            exit_key: KeyCode::Escape,
            binding: BindingStrategy::default(),
            vsync: true,
        }
    }
}

impl Settings {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn clear_colour(mut self, colour: wgpu::Color) -> Self {
        self.clear_colour = colour;
        self
    }

    pub fn shader_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.shader_dir = dir.into();
        self
    }

    pub fn shader(mut self, name: impl Into<String>) -> Self {
        self.shader = name.into();
        self
    }

    pub fn angular_speed(mut self, radians_per_second: f32) -> Self {
        self.angular_speed = radians_per_second;
        self
    }

    pub fn exit_key(mut self, key: KeyCode) -> Self {
        self.exit_key = key;
        self
    }

    pub fn binding(mut self, binding: BindingStrategy) -> Self {
        self.binding = binding;
        self
    }

    pub fn vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }
}
