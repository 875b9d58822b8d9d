use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct CompilerConfig {
    #[serde(default = "CompilerConfig::default_program")]
    pub program: PathBuf,
    /// Directory the serialized request files are written into before the
    /// compiler process is pointed at them.
    #[serde(default = "CompilerConfig::default_request_dir")]
    pub request_dir: PathBuf,
}

impl CompilerConfig {
    fn default_program() -> PathBuf {
        PathBuf::from("studiomdl")
    }

    fn default_request_dir() -> PathBuf {
        PathBuf::from("requests")
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self { program: Self::default_program(), request_dir: Self::default_request_dir() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditorConfig {
    #[serde(default)]
    pub default_export_path: Option<PathBuf>,
    /// When set, name audit issues block compile submission instead of
    /// collapsing silently in the assembled request.
    #[serde(default = "EditorConfig::default_strict_names")]
    pub strict_names: bool,
}

impl EditorConfig {
    const fn default_strict_names() -> bool {
        true
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self { default_export_path: None, strict_names: Self::default_strict_names() }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub compiler: CompilerConfig,
    #[serde(default)]
    pub editor: EditorConfig,
}

#[derive(Debug, Clone, Default)]
pub struct AppConfigOverrides {
    pub compiler: Option<PathBuf>,
    pub export_path: Option<PathBuf>,
    pub strict_names: Option<bool>,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                eprintln!("Config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &AppConfigOverrides) {
        if let Some(compiler) = &overrides.compiler {
            self.compiler.program = compiler.clone();
        }
        if let Some(export_path) = &overrides.export_path {
            self.editor.default_export_path = Some(export_path.clone());
        }
        if let Some(strict_names) = overrides.strict_names {
            self.editor.strict_names = strict_names;
        }
    }
}

impl AppConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.compiler.is_none() && self.export_path.is_none() && self.strict_names.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.compiler.is_some() {
            fields.push("compiler");
        }
        if self.export_path.is_some() {
            fields.push("export_path");
        }
        if self.strict_names.is_some() {
            fields.push("strict_names");
        }
        fields
    }
}
