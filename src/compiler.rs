use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::request::CompilationRequest;

/// Boundary to the external compiler. Submission is fire-and-forget: a
/// submitted request may still fail to produce a model, and that outcome
/// arrives out of band, not through this trait.
pub trait ModelCompiler {
    fn compile_model(&mut self, request: &CompilationRequest) -> Result<()>;
}

/// Serializes each request to a JSON file and hands it to a separate
/// compiler process, so a compiler crash can never take the editor with it.
pub struct ExternalCompiler {
    program: PathBuf,
    request_dir: PathBuf,
}

impl ExternalCompiler {
    pub fn new(program: impl Into<PathBuf>, request_dir: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), request_dir: request_dir.into() }
    }

    pub fn write_request_file(&self, request: &CompilationRequest) -> Result<PathBuf> {
        fs::create_dir_all(&self.request_dir)
            .with_context(|| format!("Failed to create request dir {}", self.request_dir.display()))?;
        let path = self.request_dir.join(format!("{}.json", request_file_stem(&request.model_name)));
        let json = serde_json::to_string_pretty(request)?;
        fs::write(&path, format!("{json}\n"))
            .with_context(|| format!("Failed to write request file {}", path.display()))?;
        Ok(path)
    }
}

impl ModelCompiler for ExternalCompiler {
    fn compile_model(&mut self, request: &CompilationRequest) -> Result<()> {
        let request_path = self.write_request_file(request)?;
        let child = Command::new(&self.program)
            .arg(&request_path)
            .stdin(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to spawn compiler {}", self.program.display()))?;
        eprintln!(
            "[compiler] submitted '{}' as {} (pid {})",
            request.model_name,
            request_path.display(),
            child.id()
        );
        Ok(())
    }
}

/// Model names become request file names; anything path-hostile in the name
/// is flattened to underscores and the `.mdl` suffix dropped.
fn request_file_stem(model_name: &str) -> String {
    let stem = model_name.strip_suffix(".mdl").unwrap_or(model_name);
    let cleaned: String = stem
        .chars()
        .map(|ch| if ch.is_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect();
    if cleaned.is_empty() {
        String::from("model")
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use tempfile::tempdir;

    #[test]
    fn request_file_is_named_after_the_model() {
        let dir = tempdir().expect("temp dir");
        let compiler = ExternalCompiler::new("studiomdl", dir.path());
        let request = CompilationRequest {
            model_name: String::from("props/head crab.mdl"),
            export_path: PathBuf::from("/exports"),
            body_parts: IndexMap::new(),
            animations: IndexMap::new(),
            sequences: IndexMap::new(),
        };
        let path = compiler.write_request_file(&request).expect("write request");
        assert_eq!(path.file_name().and_then(|name| name.to_str()), Some("props_head_crab.json"));
        let written = fs::read_to_string(&path).expect("read request back");
        assert!(written.contains("\"model_name\": \"props/head crab.mdl\""));
    }

    #[test]
    fn empty_stem_falls_back() {
        assert_eq!(request_file_stem(".mdl"), "model");
        assert_eq!(request_file_stem("héad"), "héad");
    }
}
