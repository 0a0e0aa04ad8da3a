use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::{anyhow, Context, Result};

use crate::scene::Object3D;

use super::mtl::load_materials;
use super::obj::load_object;

/// Where to find a model: a directory plus the MTL and OBJ file names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    pub dir: PathBuf,
    pub material_file: String,
    pub geometry_file: String,
}

impl ModelRequest {
    pub fn new(
        dir: impl Into<PathBuf>,
        material_file: impl Into<String>,
        geometry_file: impl Into<String>,
    ) -> Self {
        Self {
            dir: dir.into(),
            material_file: material_file.into(),
            geometry_file: geometry_file.into(),
        }
    }
}

/// Loads materials, then geometry, on the calling thread.
///
/// Geometry is not touched unless the material library loaded.
pub fn load_model(request: &ModelRequest) -> Result<Object3D> {
    let materials = load_materials(&request.dir, &request.material_file)?;
    load_object(&request.dir, &request.geometry_file, &materials)
}

/// One-shot handle for a model loading in the background.
///
/// There is no cancellation or timeout: dropping the handle lets the loader
/// thread finish and discard its result.
pub struct PendingModel {
    rx: Receiver<Result<Object3D>>,
    finished: bool,
}

impl PendingModel {
    /// Non-blocking check. Yields the result exactly once, then `None`.
    pub fn poll(&mut self) -> Option<Result<Object3D>> {
        if self.finished {
            return None;
        }
        match self.rx.try_recv() {
            Ok(result) => {
                self.finished = true;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.finished = true;
                Some(Err(anyhow!("model loader exited without a result")))
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Blocks until the loader reports.
    pub fn wait(mut self) -> Result<Object3D> {
        if self.finished {
            return Err(anyhow!("model result already taken"));
        }
        self.finished = true;
        self.rx
            .recv()
            .map_err(|_| anyhow!("model loader exited without a result"))?
    }
}

/// Starts [`load_model`] on a background thread.
pub fn spawn_model_load(request: ModelRequest) -> Result<PendingModel> {
    let (tx, rx) = mpsc::channel();

    thread::Builder::new()
        .name("model-loader".into())
        .spawn(move || {
            log::debug!("loading {:?}", request);
            // Receiver may be gone if the viewer shut down first.
            let _ = tx.send(load_model(&request));
        })
        .context("failed to spawn model loader thread")?;

    Ok(PendingModel { rx, finished: false })
}
