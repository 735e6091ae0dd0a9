//! spin-ngin
//!
//! A minimal windowed renderer: a vertex-coloured triangle spinning about the
//! vertical axis. Scenes talk to the GPU through a small, handle-based device
//! interface; the host window drives them through an init, update, draw and
//! teardown lifecycle.
//!
//! High-level modules
//! - `context`: wgpu device, queue and render target; implements the device interface
//! - `data_structures`: handles, program reflection, the triangle mesh and transforms
//! - `device`: the [`device::RenderDevice`] trait scenes draw through
//! - `flow`: the [`flow::Scene`] lifecycle and the window event loop
//! - `input`: keyboard state collected from window events
//! - `pipelines`: render pipeline construction
//! - `render`: per-frame draw recording
//! - `resources`: shader loading and mesh upload
//! - `settings`: window, animation and binding options
//! - `triangle`: the rotating triangle scene
//!

pub mod context;
pub mod data_structures;
pub mod device;
pub mod flow;
pub mod input;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod settings;
pub mod triangle;

// Re-exports commonly used types for convenience in downstream code.
pub use wgpu::Color;
pub use winit::keyboard::KeyCode;
