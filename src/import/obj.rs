use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

use super::{file_stem_name, SourceAnimation, SourceBone, SourceFileData};

#[derive(Debug, Error)]
pub enum ObjError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing object name on line {0}")]
    MissingObjectName(usize),
    #[error("duplicate object name '{0}'")]
    DuplicateObjects(String),
}

/// Reads the metadata of an OBJ file: its `o`/`g` object names become mesh
/// parts (falling back to `Object` for unnamed geometry). OBJ carries no
/// skeleton, so a single `default` root bone and a one-frame bind animation
/// named after the file stem are synthesized, matching what the compiler
/// expects from any source file.
pub(super) fn load_obj(path: &Path) -> Result<SourceFileData, ObjError> {
    let reader = BufReader::new(File::open(path)?);

    let mut parts: Vec<String> = Vec::new();
    let mut current_object = String::new();
    let mut current_has_faces = false;

    fn flush(parts: &mut Vec<String>, name: &str, has_faces: bool) -> Result<(), ObjError> {
        if !has_faces {
            return Ok(());
        }
        let resolved = if name.is_empty() { "Object" } else { name };
        if parts.iter().any(|part| part == resolved) {
            return Err(ObjError::DuplicateObjects(resolved.to_string()));
        }
        parts.push(resolved.to_string());
        Ok(())
    }

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;
        let trimmed = line.trim();
        let mut words = trimmed.split_whitespace();
        match words.next() {
            Some("o") | Some("g") => {
                flush(&mut parts, &current_object, current_has_faces)?;
                current_object =
                    words.next().ok_or(ObjError::MissingObjectName(line_no))?.to_string();
                current_has_faces = false;
            }
            Some("f") => current_has_faces = true,
            _ => {}
        }
    }
    flush(&mut parts, &current_object, current_has_faces)?;

    let stem = file_stem_name(path);
    Ok(SourceFileData {
        bones: vec![SourceBone { name: "default".to_string(), parent: None }],
        animations: vec![SourceAnimation { name: stem, frame_count: 1 }],
        parts,
    })
}
