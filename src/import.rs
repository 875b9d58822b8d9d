use std::path::{Path, PathBuf};
use thiserror::Error;

mod obj;
mod smd;

pub use obj::ObjError;
pub use smd::SmdError;

pub const SUPPORTED_FILES: [&str; 2] = ["smd", "obj"];

/// Parsed metadata for one source file. Immutable once loaded; the cache
/// hands it out behind an `Arc` and owns its lifetime.
#[derive(Debug, Clone, Default)]
pub struct SourceFileData {
    pub bones: Vec<SourceBone>,
    pub animations: Vec<SourceAnimation>,
    pub parts: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SourceBone {
    pub name: String,
    /// Index into [`SourceFileData::bones`]; `None` for a root bone.
    pub parent: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct SourceAnimation {
    pub name: String,
    pub frame_count: usize,
}

impl SourceFileData {
    pub fn first_animation(&self) -> Option<&str> {
        self.animations.first().map(|animation| animation.name.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("file does not exist: {}", .0.display())]
    FileDoesNotExist(PathBuf),
    #[error("file has no extension: {}", .0.display())]
    MissingExtension(PathBuf),
    #[error("unsupported file format '{0}'")]
    UnsupportedFormat(String),
    #[error("failed to open file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse SMD file: {0}")]
    Smd(#[from] SmdError),
    #[error("failed to parse OBJ file: {0}")]
    Obj(#[from] ObjError),
}

/// The parsing oracle boundary. `load_file` converts a raw source file into
/// structured metadata; `unload_file` is fire-and-forget so the backend can
/// free any native-side state it keeps for the path.
pub trait ImportBackend {
    fn load_file(&mut self, path: &Path) -> Result<SourceFileData, ImportError>;
    fn unload_file(&mut self, path: &Path);
}

/// Disk-backed importer dispatching on the file extension.
#[derive(Debug, Default)]
pub struct DiskImporter;

impl ImportBackend for DiskImporter {
    fn load_file(&mut self, path: &Path) -> Result<SourceFileData, ImportError> {
        if !path.try_exists()? {
            return Err(ImportError::FileDoesNotExist(path.to_path_buf()));
        }
        let extension = path.extension().ok_or_else(|| ImportError::MissingExtension(path.to_path_buf()))?;
        let data = match extension.to_string_lossy().to_lowercase().as_str() {
            "smd" => smd::load_smd(path)?,
            "obj" => obj::load_obj(path)?,
            other => return Err(ImportError::UnsupportedFormat(other.to_string())),
        };
        eprintln!(
            "[import] loaded '{}' ({} bones, {} animations, {} parts)",
            path.display(),
            data.bones.len(),
            data.animations.len(),
            data.parts.len()
        );
        Ok(data)
    }

    fn unload_file(&mut self, path: &Path) {
        // Nothing native to free; the notification exists for backends that do.
        eprintln!("[import] unloaded '{}'", path.display());
    }
}

pub(crate) fn file_stem_name(path: &Path) -> String {
    path.file_stem().map(|stem| stem.to_string_lossy().to_string()).unwrap_or_else(|| "source".to_string())
}
