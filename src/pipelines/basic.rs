use crate::render::VertexSlot;

/// Vertex format of a tightly packed `f32` vector with `components` elements.
pub fn vertex_format(components: u32) -> wgpu::VertexFormat {
    match components {
        1 => wgpu::VertexFormat::Float32,
        2 => wgpu::VertexFormat::Float32x2,
        3 => wgpu::VertexFormat::Float32x3,
        _ => wgpu::VertexFormat::Float32x4,
    }
}

/// One single-attribute attribute list per vertex buffer.
///
/// The returned arrays back the `attributes` of [`vertex_layouts`] and have
/// to outlive them.
pub fn vertex_attributes(slots: &[VertexSlot]) -> Vec<[wgpu::VertexAttribute; 1]> {
    slots
        .iter()
        .map(|slot| {
            [wgpu::VertexAttribute {
                format: vertex_format(slot.components),
                offset: 0,
                shader_location: slot.location.0,
            }]
        })
        .collect()
}

/// Buffer layouts in slot order: buffer `i` of a draw feeds `slots[i]`.
pub fn vertex_layouts<'a>(
    slots: &[VertexSlot],
    attributes: &'a [[wgpu::VertexAttribute; 1]],
) -> Vec<wgpu::VertexBufferLayout<'a>> {
    slots
        .iter()
        .zip(attributes)
        .map(|(slot, attributes)| wgpu::VertexBufferLayout {
            array_stride: (slot.components as usize * std::mem::size_of::<f32>())
                as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes,
        })
        .collect()
}

pub struct ShaderStage<'a> {
    pub module: &'a wgpu::ShaderModule,
    pub entry_point: &'a str,
}

pub fn mk_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    topology: wgpu::PrimitiveTopology,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    vertex: ShaderStage,
    fragment: ShaderStage,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some("Render Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: vertex.module,
            entry_point: Some(vertex.entry_point),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: fragment.module,
            entry_point: Some(fragment.entry_point),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            front_face: wgpu::FrontFace::Ccw,
            // the triangle spins about Y, so its back face has to stay visible
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
    })
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;
    use crate::data_structures::handles::{AttribLocation, BufferId};

    #[test]
    fn layouts_follow_slot_order() {
        let mut buffers: SlotMap<BufferId, ()> = SlotMap::with_key();
        let slots = [
            VertexSlot {
                location: AttribLocation(0),
                buffer: buffers.insert(()),
                components: 2,
            },
            VertexSlot {
                location: AttribLocation(1),
                buffer: buffers.insert(()),
                components: 3,
            },
        ];
        let attributes = vertex_attributes(&slots);
        let layouts = vertex_layouts(&slots, &attributes);

        assert_eq!(layouts.len(), 2);
        assert_eq!(layouts[0].array_stride, 8);
        assert_eq!(layouts[1].array_stride, 12);
        assert_eq!(layouts[0].attributes[0].format, wgpu::VertexFormat::Float32x2);
        assert_eq!(layouts[1].attributes[0].shader_location, 1);
        assert_eq!(layouts[1].attributes[0].format, wgpu::VertexFormat::Float32x3);
    }
}
