use mdlforge::cli::CliOverrides;
use mdlforge::config::AppConfig;
use mdlforge::project;

const CONFIG_PATH: &str = "config/mdlforge.json";

fn main() {
    let cli = match CliOverrides::parse_from_env() {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("[cli] {err}");
            std::process::exit(2);
        }
    };
    let project_path = cli.project().cloned();
    let overrides = cli.into_config_overrides();
    let mut config = AppConfig::load_or_default(CONFIG_PATH);
    if !overrides.is_empty() {
        eprintln!("[cli] overriding config fields: {}", overrides.applied_fields().join(", "));
        config.apply_overrides(&overrides);
    }
    let Some(project_path) = project_path else {
        eprintln!("[cli] no --project manifest given; nothing to do");
        std::process::exit(2);
    };
    if let Err(err) = project::compile_project(&project_path, &config) {
        eprintln!("[project] {err:?}");
        std::process::exit(1);
    }
}
