use bytemuck::{Pod, Zeroable};
use std::mem;

use super::gpu::{VertexAttribute, VertexLayout};

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    /// Attribute names are bound to these locations before a program links.
    pub const ATTRS: [VertexAttribute; 3] = [
        VertexAttribute {
            location: 0,
            name: "position",
            components: 3,
            offset: 0,
        },
        VertexAttribute {
            location: 1,
            name: "normal",
            components: 3,
            offset: 12,
        },
        VertexAttribute {
            location: 2,
            name: "texture_coords",
            components: 2,
            offset: 24,
        },
    ];

    pub const LAYOUT: VertexLayout = VertexLayout {
        stride: mem::size_of::<Vertex>() as i32,
        attributes: &Self::ATTRS,
    };
}

/// Position-only layout used by the skybox cube.
pub const POSITION_LAYOUT: VertexLayout = VertexLayout {
    stride: mem::size_of::<[f32; 3]>() as i32,
    attributes: &[VertexAttribute {
        location: 0,
        name: "position",
        components: 3,
        offset: 0,
    }],
};

#[inline]
pub fn v(pos: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Vertex {
    Vertex { pos, normal, uv }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_stride_matches_struct_size() {
        assert_eq!(Vertex::LAYOUT.stride as usize, std::mem::size_of::<Vertex>());
    }

    #[test]
    fn attribute_offsets_match_fields() {
        assert_eq!(Vertex::ATTRS[1].offset as usize, mem::offset_of!(Vertex, normal));
        assert_eq!(Vertex::ATTRS[2].offset as usize, mem::offset_of!(Vertex, uv));
    }
}
