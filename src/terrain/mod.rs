//! Heightmap terrain
//!
//! The terrain is a regular grid of elevation samples centred on the world
//! origin. It answers height queries for units and the camera, intersects
//! pick rays with the ground, and produces the ground mesh handed to the
//! renderer.

pub mod map;
pub mod mesh;

pub use map::{HeightImage, MarchSteps, TerrainError, TerrainMap};
pub use mesh::{TerrainMesh, TerrainVertex};

/// Build the height grid and its ground mesh from a decoded heightmap image
pub fn build(image: &HeightImage) -> Result<(TerrainMap, TerrainMesh), TerrainError> {
    let map = TerrainMap::from_image(image)?;
    let mesh = TerrainMesh::from_map(&map);
    log::info!(
        "Terrain built: {}x{} samples, {} triangles",
        map.width(),
        map.height(),
        mesh.triangle_count()
    );
    Ok((map, mesh))
}
