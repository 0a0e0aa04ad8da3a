use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::scene::{Mesh, Object3D};

use super::mtl::MaterialLibrary;
use super::progress::ProgressReader;

/// Line prepended to every OBJ stream so `usemtl` names bind to the
/// preloaded library even when the file has no `mtllib` of its own.
const PRELOADED_MTLLIB: &[u8] = b"mtllib preloaded.mtl\n";

/// Reads `dir/file` as OBJ geometry bound to an already loaded `library`.
///
/// Any `mtllib` line in the file is answered from `library`, never from disk.
///
/// Faces are triangulated into a single index buffer. Meshes without normals
/// get smooth normals; texture V is flipped so row 0 of the image maps to
/// the top.
pub fn load_object(dir: &Path, file: &str, library: &MaterialLibrary) -> Result<Object3D> {
    let path = dir.join(file);
    let f = File::open(&path).with_context(|| format!("open OBJ: {}", path.display()))?;
    let total = f.metadata().map(|m| m.len()).unwrap_or(0);
    let source = PRELOADED_MTLLIB.chain(ProgressReader::new(f, total, file));
    let mut reader = BufReader::new(source);

    let load_opts = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };
    let (models, obj_materials) = tobj::load_obj_buf(&mut reader, &load_opts, |_| library.as_tobj())
        .with_context(|| format!("parse OBJ: {}", path.display()))?;

    if models.is_empty() {
        bail!("no meshes in OBJ: {}", path.display());
    }

    // tobj concatenates one copy of the library per `mtllib` line (ours plus
    // any in the file); map its indices back onto ours by name.
    let obj_materials = obj_materials.unwrap_or_else(|e| {
        log::debug!("{}: no material library referenced ({e})", path.display());
        Vec::new()
    });
    let resolve = |id: usize| -> Option<usize> {
        match obj_materials.get(id) {
            Some(m) => library.index_of(&m.name),
            None if id < library.len() => Some(id),
            None => None,
        }
    };

    let name = Path::new(file)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string());
    let mut object = Object3D::new(name);
    object.materials = library.materials.clone();

    for model in models {
        let mut mesh = convert_mesh(model);
        if mesh.positions.is_empty() {
            continue;
        }
        mesh.material = mesh.material.and_then(resolve);
        object.meshes.push(mesh);
    }

    if object.meshes.is_empty() {
        bail!("OBJ has no geometry: {}", path.display());
    }

    log::info!(
        "loaded '{}': {} mesh(es), {} vertices, {} triangles, {} material(s)",
        object.name,
        object.meshes.len(),
        object.vertex_count(),
        object.triangle_count(),
        object.materials.len()
    );

    Ok(object)
}

fn convert_mesh(model: tobj::Model) -> Mesh {
    let tobj::Model { mesh: src, name } = model;

    let positions: Vec<[f32; 3]> = src
        .positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();
    let vcount = positions.len();

    let uvs = if src.texcoords.len() == vcount * 2 {
        src.texcoords
            .chunks_exact(2)
            .map(|t| [t[0], 1.0 - t[1]])
            .collect()
    } else {
        Vec::new()
    };

    let indices = if src.indices.is_empty() {
        (0..vcount as u32).collect()
    } else {
        src.indices
    };

    let mut mesh = Mesh {
        name,
        positions,
        normals: Vec::new(),
        uvs,
        indices,
        material: src.material_id,
    };

    if src.normals.len() == vcount * 3 {
        mesh.normals = src
            .normals
            .chunks_exact(3)
            .map(|n| [n[0], n[1], n[2]])
            .collect();
    } else {
        mesh.compute_vertex_normals();
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(positions: Vec<f32>, texcoords: Vec<f32>, normals: Vec<f32>, indices: Vec<u32>) -> tobj::Model {
        tobj::Model {
            mesh: tobj::Mesh {
                positions,
                texcoords,
                normals,
                indices,
                ..Default::default()
            },
            name: "tri".into(),
        }
    }

    #[test]
    fn flips_v_and_computes_missing_normals() {
        let m = convert_mesh(model(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.25, 0.0, 1.0],
            Vec::new(),
            vec![0, 1, 2],
        ));
        assert_eq!(m.uvs, vec![[0.0, 1.0], [1.0, 0.75], [0.0, 0.0]]);
        assert_eq!(m.normals.len(), 3);
        assert_eq!(m.normals[0], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn keeps_file_normals_and_synthesizes_indices() {
        let m = convert_mesh(model(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            Vec::new(),
            vec![0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            Vec::new(),
        ));
        assert!(m.uvs.is_empty());
        assert_eq!(m.normals, vec![[0.0, 1.0, 0.0]; 3]);
        assert_eq!(m.indices, vec![0, 1, 2]);
    }
}
