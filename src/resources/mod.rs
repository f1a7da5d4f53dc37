use std::{path::Path, rc::Rc};

use crate::{
    data_structures::{model::RenderObject, texture::Texture},
    error::{ModelError, TextureError},
    pipelines::program::ShaderProgram,
    resources::csv::NormalMode,
};

/**
 * This module contains all logic for loading meshes/textures/etc. from external files.
 */
pub mod csv;

pub async fn load_string(path: &Path) -> std::io::Result<String> {
    tokio::fs::read_to_string(path).await
}

pub async fn load_binary(path: &Path) -> std::io::Result<Vec<u8>> {
    tokio::fs::read(path).await
}

pub async fn load_texture(
    path: &Path,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Result<Texture, TextureError> {
    let bytes = load_binary(path).await.map_err(|source| {
        log::error!("failed to load texture {:?}", path);
        TextureError::Read {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let label = path.to_string_lossy();
    Texture::from_bytes(device, queue, &bytes, &label).map_err(|source| {
        log::error!("failed to decode texture {:?}: {}", path, source);
        TextureError::Decode {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Parse a vertex file and upload it as a render object drawn with `shader`.
pub async fn load_model_csv(
    path: &Path,
    mode: NormalMode,
    device: &wgpu::Device,
    shader: Rc<ShaderProgram>,
    texture: Option<Rc<Texture>>,
) -> Result<RenderObject, ModelError> {
    let vertices = csv::load_vertices(path, mode).await?;
    let name = path.to_string_lossy().into_owned();
    RenderObject::new(device, name, vertices, shader, texture)
}
