use crate::config::AppConfigOverrides;
use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CliOverrides {
    project: Option<PathBuf>,
    compiler: Option<PathBuf>,
    export_path: Option<PathBuf>,
    strict_names: Option<bool>,
}

impl CliOverrides {
    pub fn parse_from_env() -> Result<Self> {
        Self::parse(env::args())
    }

    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = CliOverrides::default();
        let mut iter = args.into_iter();
        let _ = iter.next(); // skip program name if present
        while let Some(raw_flag) = iter.next() {
            let flag = raw_flag.as_ref();
            if !flag.starts_with("--") {
                bail!("Unexpected argument '{flag}'. Use --project/--compiler/--export-path/--strict-names with values.");
            }
            let key = &flag[2..];
            let value =
                iter.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?.as_ref().to_string();
            match key {
                "project" => {
                    overrides.project = Some(PathBuf::from(value));
                }
                "compiler" => {
                    overrides.compiler = Some(PathBuf::from(value));
                }
                "export-path" => {
                    overrides.export_path = Some(PathBuf::from(value));
                }
                "strict-names" => {
                    overrides.strict_names = Some(
                        parse_bool_flag("strict-names", &value)
                            .with_context(|| format!("Invalid value for '{flag}'"))?,
                    );
                }
                _ => bail!(
                    "Unknown flag '{flag}'. Supported flags: --project, --compiler, --export-path, --strict-names."
                ),
            }
        }
        Ok(overrides)
    }

    /// Path of the project manifest to compile in batch mode, if one was given.
    pub fn project(&self) -> Option<&PathBuf> {
        self.project.as_ref()
    }

    pub fn into_config_overrides(self) -> AppConfigOverrides {
        AppConfigOverrides {
            compiler: self.compiler,
            export_path: self.export_path,
            strict_names: self.strict_names,
        }
    }
}

fn parse_bool_flag(flag: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => bail!("Invalid {flag} value '{other}'. Use on/off or true/false."),
    }
}
