use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::paint::Color;
use crate::scene::Material;

use super::progress::ProgressReader;
use super::texture::load_texture;

/// Parsed and preloaded MTL library.
///
/// Diffuse textures are decoded up front so geometry loading never touches
/// the filesystem for images.
#[derive(Debug, Clone, Default)]
pub struct MaterialLibrary {
    pub materials: Vec<Material>,
    by_name: HashMap<String, usize>,
    raw: Vec<tobj::Material>,
}

impl MaterialLibrary {
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Option<&Material> {
        self.index_of(name).and_then(|i| self.materials.get(i))
    }

    /// Hands the library to `tobj` in place of whatever `mtllib` the OBJ names.
    pub(crate) fn as_tobj(&self) -> tobj::MTLLoadResult {
        Ok((
            self.raw.clone(),
            self.raw
                .iter()
                .enumerate()
                .map(|(i, m)| (m.name.clone(), i))
                .collect(),
        ))
    }
}

/// Reads `dir/file` as an MTL library and decodes its diffuse textures.
///
/// A texture that cannot be decoded is logged and left unset; the material
/// still loads with its flat colors.
pub fn load_materials(dir: &Path, file: &str) -> Result<MaterialLibrary> {
    let path = dir.join(file);
    let f = File::open(&path).with_context(|| format!("open MTL: {}", path.display()))?;
    let total = f.metadata().map(|m| m.len()).unwrap_or(0);
    let mut reader = BufReader::new(ProgressReader::new(f, total, file));

    let (raw, _) = tobj::load_mtl_buf(&mut reader)
        .with_context(|| format!("parse MTL: {}", path.display()))?;

    let materials: Vec<Material> = raw.iter().map(|m| convert_material(dir, m)).collect();
    let by_name = raw
        .iter()
        .enumerate()
        .map(|(i, m)| (m.name.clone(), i))
        .collect();

    log::info!("loaded {} material(s) from {}", materials.len(), path.display());

    Ok(MaterialLibrary { materials, by_name, raw })
}

fn convert_material(dir: &Path, m: &tobj::Material) -> Material {
    let defaults = Material::default();
    let rgb = |c: [f32; 3]| Color::from_srgb(c[0], c[1], c[2], 1.0);

    let diffuse_map = m.diffuse_texture.as_deref().and_then(|map| {
        let path = texture_path(dir, map)?;
        match load_texture(&path) {
            Ok(tex) => Some(tex),
            Err(e) => {
                log::warn!("material '{}': {e:#}", m.name);
                None
            }
        }
    });

    Material {
        name: m.name.clone(),
        diffuse: m.diffuse.map(rgb).unwrap_or(defaults.diffuse),
        specular: m.specular.map(rgb).unwrap_or(defaults.specular),
        shininess: m.shininess.unwrap_or(defaults.shininess),
        opacity: m.dissolve.unwrap_or(defaults.opacity).clamp(0.0, 1.0),
        diffuse_map,
    }
}

/// Resolves a `map_*` argument to a file path.
///
/// Option flags (`-s 1 1 1`, `-bm 0.5`, ...) precede the file name, so the
/// last token is taken. Backslash separators from Windows exporters are
/// normalized.
fn texture_path(dir: &Path, map: &str) -> Option<PathBuf> {
    let name = map.split_whitespace().last()?;
    Some(dir.join(name.replace('\\', "/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_path_takes_the_file_after_options() {
        let dir = Path::new("models/obj");
        assert_eq!(
            texture_path(dir, "-s 1 1 1 -o 0 0 0 wheel.png"),
            Some(PathBuf::from("models/obj/wheel.png"))
        );
        assert_eq!(
            texture_path(dir, "textures\\hub.jpg"),
            Some(PathBuf::from("models/obj/textures/hub.jpg"))
        );
        assert_eq!(texture_path(dir, "   "), None);
    }

    #[test]
    fn unset_fields_fall_back_to_defaults() {
        let m = tobj::Material {
            name: "bare".into(),
            ..Default::default()
        };
        let out = convert_material(Path::new("."), &m);
        let d = Material::default();
        assert_eq!(out.diffuse, d.diffuse);
        assert_eq!(out.specular, d.specular);
        assert_eq!(out.shininess, d.shininess);
        assert_eq!(out.opacity, 1.0);
        assert!(out.diffuse_map.is_none());
    }

    #[test]
    fn library_lookup_by_name() {
        let raw = vec![
            tobj::Material { name: "rim".into(), ..Default::default() },
            tobj::Material { name: "hub".into(), ..Default::default() },
        ];
        let lib = MaterialLibrary {
            materials: raw.iter().map(|m| convert_material(Path::new("."), m)).collect(),
            by_name: raw.iter().enumerate().map(|(i, m)| (m.name.clone(), i)).collect(),
            raw,
        };
        assert_eq!(lib.len(), 2);
        assert_eq!(lib.index_of("hub"), Some(1));
        assert_eq!(lib.get("rim").map(|m| m.name.as_str()), Some("rim"));
        assert!(lib.get("spoke").is_none());

        let (raw, names) = lib.as_tobj().unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(names.get("rim"), Some(&0));
    }
}
