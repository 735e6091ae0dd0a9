use crate::{
    data_structures::{
        handles::{AttribLocation, BufferUsage},
        mesh::{
            COLOUR_COMPONENTS, Mesh, POSITION_COMPONENTS, TRIANGLE_COLOURS, TRIANGLE_POSITIONS,
        },
    },
    device::{DeviceResult, RenderDevice},
};

/// Attribute locations to wire the mesh to at creation time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AttributeSlots {
    pub position: AttribLocation,
    pub colour: AttribLocation,
}

/**
 * Upload the triangle into a fresh vertex array backed by one position and
 * one colour buffer.
 *
 * With `slots` the attribute pointers are recorded on the vertex array right
 * away, so drawing only needs to bind it. Without, the caller binds them
 * before every draw.
 *
 * If a step fails, whatever was already created is deleted again.
 */
pub fn create_mesh(
    device: &mut dyn RenderDevice,
    slots: Option<AttributeSlots>,
) -> DeviceResult<Mesh> {
    let vertex_array = device.create_vertex_array()?;

    let positions = match device.create_buffer(
        bytemuck::cast_slice(&TRIANGLE_POSITIONS),
        BufferUsage::StaticDraw,
    ) {
        Ok(buffer) => buffer,
        Err(e) => {
            device.delete_vertex_array(vertex_array);
            return Err(e);
        }
    };

    let colours = match device.create_buffer(
        bytemuck::cast_slice(&TRIANGLE_COLOURS),
        BufferUsage::StaticDraw,
    ) {
        Ok(buffer) => buffer,
        Err(e) => {
            device.delete_buffer(positions);
            device.delete_vertex_array(vertex_array);
            return Err(e);
        }
    };

    let mut mesh = Mesh::new(
        vertex_array,
        positions,
        colours,
        TRIANGLE_POSITIONS.len() as u32,
    );

    if let Some(slots) = slots {
        if let Err(e) = bind_mesh_attributes(device, &mesh, slots) {
            mesh.release(device);
            return Err(e);
        }
    }

    log::debug!(
        "Uploaded triangle mesh ({} vertices, attributes bound: {})",
        mesh.vertex_count(),
        slots.is_some()
    );
    Ok(mesh)
}

/// Point the mesh's vertex array at its position and colour buffers.
pub fn bind_mesh_attributes(
    device: &mut dyn RenderDevice,
    mesh: &Mesh,
    slots: AttributeSlots,
) -> DeviceResult<()> {
    let (Some(vertex_array), Some(positions), Some(colours)) =
        (mesh.vertex_array(), mesh.positions(), mesh.colours())
    else {
        return Err(crate::device::DeviceError::UnknownHandle("mesh"));
    };
    device.bind_attribute(vertex_array, slots.position, positions, POSITION_COMPONENTS)?;
    device.bind_attribute(vertex_array, slots.colour, colours, COLOUR_COMPONENTS)?;
    Ok(())
}

/// Undo [`bind_mesh_attributes`], leaving no attribute enabled.
pub fn unbind_mesh_attributes(
    device: &mut dyn RenderDevice,
    mesh: &Mesh,
    slots: AttributeSlots,
) -> DeviceResult<()> {
    let Some(vertex_array) = mesh.vertex_array() else {
        return Err(crate::device::DeviceError::UnknownHandle("vertex array"));
    };
    device.disable_attribute(vertex_array, slots.position)?;
    device.disable_attribute(vertex_array, slots.colour)?;
    Ok(())
}
