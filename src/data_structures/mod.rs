//! Engine data structures: handles, meshes, programs and transforms.
//!
//! - `handles` contains the typed GPU resource keys and draw enums
//! - `mesh` holds the triangle's vertex data and the handles it is uploaded to
//! - `program` describes program layouts and vertex-array bindings
//! - `transform` builds the world matrices uploaded each frame

pub mod handles;
pub mod mesh;
pub mod program;
pub mod transform;
