use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::compiler::ExternalCompiler;
use crate::config::AppConfig;
use crate::events::EditorNotice;
use crate::import::DiskImporter;
use crate::session::EditorSession;

/// On-disk description of a whole model, for compiling without the
/// interactive editor. Relative source paths are resolved against the
/// manifest's own directory.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectManifest {
    pub model_name: String,
    #[serde(default)]
    pub export_path: Option<PathBuf>,
    #[serde(default)]
    pub body_parts: Vec<ManifestBodyPart>,
    #[serde(default)]
    pub animations: Vec<ManifestAnimation>,
    #[serde(default)]
    pub sequences: Vec<ManifestSequence>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestBodyPart {
    pub name: String,
    #[serde(default)]
    pub models: Vec<ManifestModel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestModel {
    pub name: String,
    #[serde(default)]
    pub blank: bool,
    #[serde(default)]
    pub source: Option<PathBuf>,
    /// Mesh parts of the source to keep; omitted means all of them.
    #[serde(default)]
    pub parts: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestAnimation {
    pub name: String,
    pub source: PathBuf,
    /// Which animation of the source file to export; omitted means the first.
    #[serde(default)]
    pub animation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestSequence {
    pub name: String,
    #[serde(default)]
    pub animations: Vec<Vec<String>>,
}

pub fn load_manifest(path: impl AsRef<Path>) -> Result<ProjectManifest> {
    let path = path.as_ref();
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read project manifest {}", path.display()))?;
    let manifest = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse project manifest {}", path.display()))?;
    Ok(manifest)
}

/// Replays a manifest through an editor session and submits the result to
/// the configured compiler. Unlike the interactive flow, any load failure
/// aborts the whole run.
pub fn compile_project(manifest_path: &Path, config: &AppConfig) -> Result<()> {
    let manifest = load_manifest(manifest_path)?;
    let base_dir = manifest_path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();

    let mut session = EditorSession::new(DiskImporter::default());
    session.apply_config(&config.editor);
    session.set_model_name(manifest.model_name.as_str());
    if let Some(export_path) = &manifest.export_path {
        session.set_export_path(export_path.clone());
    }

    let mut model_slots = Vec::new();
    for part in &manifest.body_parts {
        let part_id = session.add_body_part();
        session.rename_body_part(part_id, part.name.as_str());
        for model in &part.models {
            let model_id = session.add_model(part_id).context("body part vanished mid-build")?;
            session.rename_model(part_id, model_id, model.name.as_str());
            session.set_model_blank(part_id, model_id, model.blank);
            if let Some(source) = &model.source {
                session.select_model_source(part_id, model_id, Some(resolve(&base_dir, source)));
            }
            model_slots.push((part_id, model_id, model));
        }
    }

    let mut animation_ids = Vec::new();
    for animation in &manifest.animations {
        let id = session.add_animation();
        session.rename_animation(id, animation.name.as_str());
        session.select_animation_source(id, Some(resolve(&base_dir, &animation.source)));
        animation_ids.push((id, animation));
    }

    for sequence in &manifest.sequences {
        let id = session.add_sequence();
        session.rename_sequence(id, sequence.name.as_str());
        session.set_sequence_grid(id, sequence.animations.clone());
    }

    session.process_pending();
    let mut failures = Vec::new();
    for notice in session.drain_notices() {
        eprintln!("[project] {notice}");
        if let EditorNotice::ImportFailed { .. } = &notice {
            failures.push(notice.to_string());
        }
    }
    if !failures.is_empty() {
        bail!("{} source file(s) failed to load: {}", failures.len(), failures.join("; "));
    }

    // Loads are in; narrow explicit part selections and animation picks.
    for (part_id, model_id, model) in model_slots {
        let Some(keep) = &model.parts else { continue };
        let Some(source) = session.model().model_slot(part_id, model_id).and_then(|slot| slot.source.clone())
        else {
            continue;
        };
        let Some(data) = session.cache().metadata(&source) else { continue };
        for (index, name) in data.parts.iter().enumerate() {
            session.set_part_enabled(part_id, model_id, index, keep.contains(name));
        }
    }
    for (id, animation) in animation_ids {
        if let Some(choice) = &animation.animation {
            session.choose_source_animation(id, Some(choice.clone()));
        }
    }

    let mut compiler = ExternalCompiler::new(&config.compiler.program, &config.compiler.request_dir);
    let submitted = session.compile(&mut compiler);
    let notices = session.drain_notices();
    for notice in &notices {
        eprintln!("[project] {notice}");
    }
    session.shutdown();
    if !submitted {
        bail!(
            "Compilation of '{}' was not submitted: {}",
            manifest.model_name,
            notices.iter().map(|notice| notice.to_string()).collect::<Vec<_>>().join("; ")
        );
    }
    Ok(())
}

fn resolve(base_dir: &Path, source: &Path) -> PathBuf {
    if source.is_absolute() {
        source.to_path_buf()
    } else {
        base_dir.join(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_parses_with_sparse_fields() {
        let json = r#"{
            "model_name": "props/barrel",
            "body_parts": [
                { "name": "shell", "models": [ { "name": "dented", "source": "barrel.obj" } ] }
            ],
            "sequences": [ { "name": "idle" } ]
        }"#;
        let manifest: ProjectManifest = serde_json::from_str(json).expect("parse manifest");
        assert_eq!(manifest.model_name, "props/barrel");
        assert!(manifest.export_path.is_none());
        assert_eq!(manifest.body_parts[0].models[0].parts, None);
        assert!(!manifest.body_parts[0].models[0].blank);
        assert!(manifest.sequences[0].animations.is_empty());
    }
}
