//! Shader program loading.
//!
//! Programs are two WGSL files, one per stage. By convention a base name
//! `basic` maps to `basic.vert` and `basic.frag` inside the shader directory.
//! Each stage is parsed and validated with naga before anything reaches the
//! GPU, which gives readable diagnostics and lets us reflect the attribute and
//! uniform interface the device needs for location lookups.

use std::path::{Path, PathBuf};

use naga::{
    AddressSpace, Binding, Handle, Module, Scalar, ScalarKind, ShaderStage, Type, TypeInner,
    VectorSize,
    valid::{Capabilities, ValidationFlags, Validator},
};
use thiserror::Error;

use crate::{
    data_structures::{
        handles::{AttribLocation, ProgramId, UniformLocation},
        program::{AttributeInfo, ProgramLayout, ProgramSource, StageSource, UniformInfo},
    },
    device::{DeviceError, RenderDevice},
    resources::load_string,
};

/// Features beyond core WGSL need device features the context never
/// requests, so stages are validated without any.
const STAGE_CAPABILITIES: Capabilities = Capabilities::empty();

#[derive(Error, Debug)]
pub enum ShaderError {
    #[error("could not read shader source {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to compile {}:\n{diagnostic}", .path.display())]
    Compile { path: PathBuf, diagnostic: String },

    #[error("{} failed validation:\n{diagnostic}", .path.display())]
    Validation { path: PathBuf, diagnostic: String },

    #[error("{} has no {stage} entry point", .path.display())]
    MissingEntryPoint { path: PathBuf, stage: &'static str },

    #[error("vertex input `{name}` must be f32 or vecN<f32>")]
    UnsupportedAttribute { name: String },

    #[error("uniform `{name}` must be a mat4x4<f32> bound in group 0")]
    UnsupportedUniform { name: String },

    #[error("uniform `{name}` is bound to {first} in one stage and {second} in the other")]
    ConflictingUniform {
        name: String,
        first: u32,
        second: u32,
    },

    #[error("link failed: fragment input @location({location}) is not written by the vertex stage")]
    Link { location: u32 },

    #[error(
        "link failed: @location({location}) is written as {written} by the vertex stage but read as {read} by the fragment stage"
    )]
    LinkMismatch {
        location: u32,
        written: String,
        read: String,
    },

    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Where the two stages of a program live on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramPaths {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

impl ProgramPaths {
    pub fn new(vertex: impl Into<PathBuf>, fragment: impl Into<PathBuf>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    /// `<dir>/<name>.vert` and `<dir>/<name>.frag`.
    pub fn from_name(dir: impl AsRef<Path>, name: &str) -> Self {
        let dir = dir.as_ref();
        Self::new(
            dir.join(format!("{name}.vert")),
            dir.join(format!("{name}.frag")),
        )
    }

    fn label(&self) -> String {
        self.vertex
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "program".to_string())
    }
}

/// A parsed and validated stage with the entry point that will run.
pub struct CompiledStage {
    path: PathBuf,
    code: String,
    module: Module,
    entry: usize,
}

impl CompiledStage {
    pub fn entry_point(&self) -> &str {
        &self.module.entry_points[self.entry].name
    }
}

/// Read, compile, link and create the program described by `paths`.
///
/// Any failure is returned with the compiler's diagnostic; callers treat it
/// as fatal.
pub fn load_program(
    device: &mut dyn RenderDevice,
    paths: &ProgramPaths,
) -> Result<ProgramId, ShaderError> {
    let vertex = read_source(&paths.vertex)?;
    let fragment = read_source(&paths.fragment)?;

    let vertex = compile_stage(&paths.vertex, vertex, ShaderStage::Vertex)?;
    let fragment = compile_stage(&paths.fragment, fragment, ShaderStage::Fragment)?;
    let source = link_program(&paths.label(), vertex, fragment)?;

    let program = device.create_program(&source)?;
    log::info!(
        "Loaded program {} ({} attributes, {} uniforms)",
        source.label,
        source.layout.attributes.len(),
        source.layout.uniforms.len()
    );
    Ok(program)
}

fn read_source(path: &Path) -> Result<String, ShaderError> {
    load_string(path).map_err(|source| ShaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse and validate `code`, and locate its `stage` entry point.
pub fn compile_stage(
    path: &Path,
    code: String,
    stage: ShaderStage,
) -> Result<CompiledStage, ShaderError> {
    let module = naga::front::wgsl::parse_str(&code).map_err(|e| ShaderError::Compile {
        path: path.to_path_buf(),
        diagnostic: e.emit_to_string(&code),
    })?;

    let mut validator = Validator::new(ValidationFlags::all(), STAGE_CAPABILITIES);
    validator
        .validate(&module)
        .map_err(|e| ShaderError::Validation {
            path: path.to_path_buf(),
            diagnostic: format!("{e:?}"),
        })?;

    let entry = module
        .entry_points
        .iter()
        .position(|ep| ep.stage == stage)
        .ok_or_else(|| ShaderError::MissingEntryPoint {
            path: path.to_path_buf(),
            stage: stage_name(stage),
        })?;

    Ok(CompiledStage {
        path: path.to_path_buf(),
        code,
        module,
        entry,
    })
}

/// Reflect both stages, check that they fit together and bundle them.
pub fn link_program(
    label: &str,
    vertex: CompiledStage,
    fragment: CompiledStage,
) -> Result<ProgramSource, ShaderError> {
    let attributes = vertex_attributes(&vertex)?;

    let produced = {
        let function = &vertex.module.entry_points[vertex.entry].function;
        match &function.result {
            Some(result) => locations(&vertex.module, result.ty, result.binding.as_ref()),
            None => Vec::new(),
        }
    };
    for (_, location, consumed) in stage_inputs(&fragment) {
        let Some((_, _, written)) = produced.iter().find(|(_, l, _)| *l == location) else {
            return Err(ShaderError::Link { location });
        };
        let written = &vertex.module.types[*written].inner;
        let consumed = &fragment.module.types[consumed].inner;
        if written != consumed {
            return Err(ShaderError::LinkMismatch {
                location,
                written: type_name(written),
                read: type_name(consumed),
            });
        }
    }

    let mut uniforms = uniforms_of(&vertex.module)?;
    for uniform in uniforms_of(&fragment.module)? {
        let existing = uniforms
            .iter()
            .find(|u| u.name == uniform.name)
            .map(|u| u.location);
        match existing {
            Some(first) if first != uniform.location => {
                return Err(ShaderError::ConflictingUniform {
                    name: uniform.name,
                    first: first.0,
                    second: uniform.location.0,
                });
            }
            Some(_) => {}
            None => uniforms.push(uniform),
        }
    }
    uniforms.sort_by_key(|u| u.location);

    log::debug!(
        "Linked {} from {} and {}",
        label,
        vertex.path.display(),
        fragment.path.display()
    );

    Ok(ProgramSource {
        label: label.to_string(),
        vertex: StageSource {
            entry_point: vertex.entry_point().to_string(),
            code: vertex.code,
        },
        fragment: StageSource {
            entry_point: fragment.entry_point().to_string(),
            code: fragment.code,
        },
        layout: ProgramLayout {
            attributes,
            uniforms,
        },
    })
}

fn vertex_attributes(stage: &CompiledStage) -> Result<Vec<AttributeInfo>, ShaderError> {
    let mut attributes = Vec::new();
    for (name, location, ty) in stage_inputs(stage) {
        let name = name.unwrap_or_else(|| format!("location{location}"));
        let components = float_components(&stage.module.types[ty].inner)
            .ok_or_else(|| ShaderError::UnsupportedAttribute { name: name.clone() })?;
        attributes.push(AttributeInfo {
            name,
            location: AttribLocation(location),
            components,
        });
    }
    attributes.sort_by_key(|a| a.location);
    Ok(attributes)
}

/// `@location` inputs of the stage's entry point, including struct members.
fn stage_inputs(stage: &CompiledStage) -> Vec<(Option<String>, u32, Handle<Type>)> {
    let function = &stage.module.entry_points[stage.entry].function;
    function
        .arguments
        .iter()
        .flat_map(|arg| {
            let mut found = locations(&stage.module, arg.ty, arg.binding.as_ref());
            // a bare argument carries its own name, struct members carry theirs
            if arg.binding.is_some() {
                for entry in found.iter_mut() {
                    entry.0 = arg.name.clone();
                }
            }
            found
        })
        .collect()
}

fn locations(
    module: &Module,
    ty: Handle<Type>,
    binding: Option<&Binding>,
) -> Vec<(Option<String>, u32, Handle<Type>)> {
    match binding {
        Some(Binding::Location { location, .. }) => vec![(None, *location, ty)],
        Some(Binding::BuiltIn(_)) => Vec::new(),
        None => match &module.types[ty].inner {
            TypeInner::Struct { members, .. } => members
                .iter()
                .filter_map(|member| match &member.binding {
                    Some(Binding::Location { location, .. }) => {
                        Some((member.name.clone(), *location, member.ty))
                    }
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        },
    }
}

fn uniforms_of(module: &Module) -> Result<Vec<UniformInfo>, ShaderError> {
    let mut found = Vec::new();
    for (_, var) in module.global_variables.iter() {
        if var.space != AddressSpace::Uniform {
            continue;
        }
        let name = var.name.clone().unwrap_or_default();
        let binding = match &var.binding {
            Some(binding) if binding.group == 0 => binding.binding,
            _ => return Err(ShaderError::UnsupportedUniform { name }),
        };
        if !is_mat4(&module.types[var.ty].inner) {
            return Err(ShaderError::UnsupportedUniform { name });
        }
        found.push(UniformInfo {
            name,
            location: UniformLocation(binding),
        });
    }
    Ok(found)
}

fn float_components(inner: &TypeInner) -> Option<u32> {
    match inner {
        TypeInner::Scalar(scalar) if is_f32(scalar) => Some(1),
        TypeInner::Vector { size, scalar } if is_f32(scalar) => Some(vector_len(*size)),
        _ => None,
    }
}

fn is_mat4(inner: &TypeInner) -> bool {
    matches!(
        inner,
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            scalar,
        } if is_f32(scalar)
    )
}

fn is_f32(scalar: &Scalar) -> bool {
    scalar.kind == ScalarKind::Float && scalar.width == 4
}

/// WGSL spelling of an inter-stage type, for diagnostics.
fn type_name(inner: &TypeInner) -> String {
    fn scalar_name(scalar: &Scalar) -> String {
        match scalar.kind {
            ScalarKind::Float => format!("f{}", scalar.width * 8),
            ScalarKind::Sint => format!("i{}", scalar.width * 8),
            ScalarKind::Uint => format!("u{}", scalar.width * 8),
            ScalarKind::Bool => "bool".to_string(),
            _ => format!("{:?}", scalar.kind),
        }
    }
    match inner {
        TypeInner::Scalar(scalar) => scalar_name(scalar),
        TypeInner::Vector { size, scalar } => {
            format!("vec{}<{}>", vector_len(*size), scalar_name(scalar))
        }
        other => format!("{other:?}"),
    }
}

fn vector_len(size: VectorSize) -> u32 {
    match size {
        VectorSize::Bi => 2,
        VectorSize::Tri => 3,
        VectorSize::Quad => 4,
    }
}

fn stage_name(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "vertex",
        ShaderStage::Fragment => "fragment",
        _ => "compute",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC_VERT: &str = include_str!("../../assets/shaders/basic.vert");
    const BASIC_FRAG: &str = include_str!("../../assets/shaders/basic.frag");

    fn vertex(code: &str) -> Result<CompiledStage, ShaderError> {
        compile_stage(Path::new("test.vert"), code.to_string(), ShaderStage::Vertex)
    }

    fn fragment(code: &str) -> Result<CompiledStage, ShaderError> {
        compile_stage(Path::new("test.frag"), code.to_string(), ShaderStage::Fragment)
    }

    #[test]
    fn conventional_paths() {
        let paths = ProgramPaths::from_name("assets/shaders", "basic");
        assert_eq!(paths.vertex, Path::new("assets/shaders/basic.vert"));
        assert_eq!(paths.fragment, Path::new("assets/shaders/basic.frag"));
        assert_eq!(paths.label(), "basic");
    }

    #[test]
    fn reflects_the_basic_program() {
        let program =
            link_program("basic", vertex(BASIC_VERT).unwrap(), fragment(BASIC_FRAG).unwrap())
                .unwrap();

        assert_eq!(program.vertex.entry_point, "vs_main");
        assert_eq!(program.fragment.entry_point, "fs_main");
        assert_eq!(
            program.layout.attributes,
            vec![
                AttributeInfo {
                    name: "aPosition".into(),
                    location: AttribLocation(0),
                    components: 2,
                },
                AttributeInfo {
                    name: "aColor".into(),
                    location: AttribLocation(1),
                    components: 3,
                },
            ]
        );
        assert_eq!(
            program.layout.uniforms,
            vec![UniformInfo {
                name: "uWorld".into(),
                location: UniformLocation(0),
            }]
        );
    }

    #[test]
    fn syntax_errors_carry_a_diagnostic() {
        let err = vertex("@vertex fn vs_main( -> @builtin(position) vec4<f32> {}").err();
        match err {
            Some(ShaderError::Compile { path, diagnostic }) => {
                assert_eq!(path, Path::new("test.vert"));
                assert!(!diagnostic.is_empty());
            }
            other => panic!("expected a compile error, got {other:?}"),
        }
    }

    #[test]
    fn fragment_file_without_fragment_stage() {
        let err = fragment(BASIC_VERT).err();
        assert!(matches!(
            err,
            Some(ShaderError::MissingEntryPoint { stage: "fragment", .. })
        ));
    }

    #[test]
    fn unmatched_fragment_input_fails_to_link() {
        let frag = "@fragment\n\
            fn fs_main(@location(3) tint: vec3<f32>) -> @location(0) vec4<f32> {\n\
                return vec4<f32>(tint, 1.0);\n\
            }\n";
        let err = link_program("bad", vertex(BASIC_VERT).unwrap(), fragment(frag).unwrap()).err();
        assert!(matches!(err, Some(ShaderError::Link { location: 3 })));
    }

    #[test]
    fn mismatched_interface_types_fail_to_link() {
        let frag = "@fragment\n\
            fn fs_main(@location(0) color: vec4<f32>) -> @location(0) vec4<f32> {\n\
                return color;\n\
            }\n";
        let err = link_program("wide", vertex(BASIC_VERT).unwrap(), fragment(frag).unwrap()).err();
        match err {
            Some(ShaderError::LinkMismatch {
                location,
                written,
                read,
            }) => {
                assert_eq!(location, 0);
                assert_eq!(written, "vec3<f32>");
                assert_eq!(read, "vec4<f32>");
            }
            other => panic!("expected a link mismatch, got {other:?}"),
        }
    }

    #[test]
    fn stages_needing_device_features_are_rejected() {
        let vert = "var<private> wide: f64 = 1.0lf;\n\
            @vertex\n\
            fn vs_main(@location(0) aPosition: vec2<f32>) -> @builtin(position) vec4<f32> {\n\
                return vec4<f32>(aPosition, f32(wide), 1.0);\n\
            }\n";
        let err = vertex(vert).err();
        assert!(matches!(
            err,
            Some(ShaderError::Validation { .. } | ShaderError::Compile { .. })
        ));
    }

    #[test]
    fn non_matrix_uniform_is_rejected() {
        let vert = "@group(0) @binding(0) var<uniform> uTint: vec4<f32>;\n\
            @vertex\n\
            fn vs_main(@location(0) aPosition: vec2<f32>) -> @builtin(position) vec4<f32> {\n\
                return vec4<f32>(aPosition, 0.0, 1.0) * uTint;\n\
            }\n";
        let frag = "@fragment\n\
            fn fs_main() -> @location(0) vec4<f32> {\n\
                return vec4<f32>(1.0);\n\
            }\n";
        let err = link_program("tint", vertex(vert).unwrap(), fragment(frag).unwrap()).err();
        assert!(matches!(err, Some(ShaderError::UnsupportedUniform { name }) if name == "uTint"));
    }
}
