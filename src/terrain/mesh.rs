//! Ground mesh generation for the renderer

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use super::map::TerrainMap;

/// Interleaved terrain vertex: position, flat normal, texture coordinate
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl TerrainVertex {
    pub const fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Triangle-list ground mesh in grid space
///
/// Two triangles per quad of four neighbouring samples, three unshared
/// vertices per triangle so every triangle carries its own flat normal.
#[derive(Debug, Clone, Default)]
pub struct TerrainMesh {
    vertices: Vec<TerrainVertex>,
    translation: Vec3,
}

impl TerrainMesh {
    pub fn from_map(map: &TerrainMap) -> Self {
        let (w, h) = (map.width(), map.height());
        let quads = (w - 1) * (h - 1);
        let mut vertices = Vec::with_capacity(quads * 6);

        let u_scale = 1.0 / (w - 1) as f32;
        let v_scale = 1.0 / (h - 1) as f32;
        let corner = |x: usize, z: usize| {
            let y = map.sample(x, z).unwrap_or(0.0);
            (
                Vec3::new(x as f32, y, z as f32),
                [x as f32 * u_scale, z as f32 * v_scale],
            )
        };

        for z in 0..h - 1 {
            for x in 0..w - 1 {
                let c00 = corner(x, z);
                let c01 = corner(x, z + 1);
                let c10 = corner(x + 1, z);
                let c11 = corner(x + 1, z + 1);

                // Both triangles share the (x, z+1)-(x+1, z) diagonal
                for tri in [[c00, c01, c10], [c10, c01, c11]] {
                    let [a, b, c] = tri;
                    let normal = (b.0 - a.0).cross(c.0 - a.0).normalize_or_zero();
                    for (pos, uv) in tri {
                        vertices.push(TerrainVertex::new(pos.to_array(), normal.to_array(), uv));
                    }
                }
            }
        }

        Self {
            vertices,
            translation: Vec3::new(-(w as f32) / 2.0, 0.0, -(h as f32) / 2.0),
        }
    }

    pub fn vertices(&self) -> &[TerrainVertex] {
        &self.vertices
    }

    /// Raw vertex bytes ready for a GPU buffer upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Places the grid-space mesh so it is centred on the world origin
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.translation)
    }
}
