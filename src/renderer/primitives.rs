use super::vertex::{v, Vertex};
use std::f32::consts::PI;

/// UV sphere of radius one. Keeps the vertex count inside `u16` range.
pub fn sphere_mesh(segments: u16, rings: u16) -> (Vec<Vertex>, Vec<u16>) {
    let segments = segments.clamp(3, 254);
    let rings = rings.clamp(2, 254);
    let mut vertices = Vec::with_capacity((rings as usize + 1) * (segments as usize + 1));
    let mut indices = Vec::with_capacity(rings as usize * segments as usize * 6);

    for ring in 0..=rings {
        let phi = PI * ring as f32 / rings as f32;
        let y = phi.cos();
        let ring_radius = phi.sin();

        for segment in 0..=segments {
            let theta = 2.0 * PI * segment as f32 / segments as f32;
            let x = ring_radius * theta.cos();
            let z = ring_radius * theta.sin();

            let u = segment as f32 / segments as f32;
            let tex_v = ring as f32 / rings as f32;

            // Position doubles as the normal on a unit sphere.
            vertices.push(v([x, y, z], [x, y, z], [u, tex_v]));
        }
    }

    for ring in 0..rings {
        for segment in 0..segments {
            let current = ring * (segments + 1) + segment;
            let next = current + segments + 1;

            indices.extend_from_slice(&[current, next, current + 1]);
            indices.extend_from_slice(&[current + 1, next, next + 1]);
        }
    }

    (vertices, indices)
}

/// Unit cube centred on the origin with per-face normals, 24 vertices.
pub fn cube_mesh() -> (Vec<Vertex>, Vec<u16>) {
    // (normal, u axis, v axis) per face; corners are normal/2 +- u/2 +- v/2.
    const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];
    const CORNERS: [(f32, f32); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

    let mut vertices = Vec::with_capacity(24);
    for (normal, u_axis, v_axis) in FACES {
        for (su, sv) in CORNERS {
            let pos = [0, 1, 2].map(|i| 0.5 * (normal[i] + su * u_axis[i] + sv * v_axis[i]));
            let uv = [(su + 1.0) * 0.5, 1.0 - (sv + 1.0) * 0.5];
            vertices.push(v(pos, normal, uv));
        }
    }

    let indices = (0..6u16)
        .flat_map(|face| {
            let o = face * 4;
            [o, o + 1, o + 2, o, o + 2, o + 3]
        })
        .collect();

    (vertices, indices)
}

/// Eight corners of the [-1, 1] cube, wound to face inwards.
pub fn skybox_cube() -> ([[f32; 3]; 8], [u16; 36]) {
    let positions = [
        [-1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0],
        [1.0, 1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [1.0, -1.0, 1.0],
        [1.0, 1.0, 1.0],
        [-1.0, 1.0, 1.0],
    ];
    let indices = [
        0, 2, 1, 0, 3, 2, // -Z
        4, 5, 6, 4, 6, 7, // +Z
        0, 4, 7, 0, 7, 3, // -X
        1, 2, 6, 1, 6, 5, // +X
        3, 7, 6, 3, 6, 2, // +Y
        0, 1, 5, 0, 5, 4, // -Y
    ];
    (positions, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn cube_counts_look_right() {
        let (v, i) = cube_mesh();
        assert_eq!(v.len(), 24);
        assert_eq!(i.len(), 36);
    }

    #[test]
    fn cube_faces_are_counter_clockwise_from_outside() {
        let (verts, indices) = cube_mesh();
        for tri in indices.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|k| Vec3::from(verts[tri[k] as usize].pos));
            let face_normal = (b - a).cross(c - a).normalize();
            let normal = Vec3::from(verts[tri[0] as usize].normal);
            assert!(face_normal.abs_diff_eq(normal, 1e-5), "{face_normal} vs {normal}");
        }
    }

    #[test]
    fn sphere_indices_stay_in_range() {
        let (verts, indices) = sphere_mesh(32, 16);
        assert!(indices.iter().all(|&i| (i as usize) < verts.len()));
    }

    #[test]
    fn skybox_cube_uses_every_corner() {
        let (positions, indices) = skybox_cube();
        for corner in 0..positions.len() as u16 {
            assert!(indices.contains(&corner));
        }
    }
}
