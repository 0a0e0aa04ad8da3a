use std::path::Path;

use anyhow::{Context, Result};

use crate::scene::TextureImage;

/// Decodes an image file to RGBA8.
pub fn load_texture(path: &Path) -> Result<TextureImage> {
    let img = image::open(path)
        .with_context(|| format!("decode texture: {}", path.display()))?
        .to_rgba8();
    let (width, height) = img.dimensions();

    Ok(TextureImage {
        source: path.to_path_buf(),
        width,
        height,
        rgba: img.into_raw(),
    })
}
