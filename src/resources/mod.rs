use std::path::Path;

/**
 * This module contains all logic for creating GPU resources from constant data
 * and external files: the triangle mesh and the shader program.
 */
pub mod mesh;
pub mod shader;

/// Read a text asset. Relative paths resolve against the working directory.
pub fn load_string(path: impl AsRef<Path>) -> std::io::Result<String> {
    let path = path.as_ref();
    log::debug!("Reading {}", path.display());
    std::fs::read_to_string(path)
}
