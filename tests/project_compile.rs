use mdlforge::config::AppConfig;
use mdlforge::project;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const HEAD_SMD: &str = "version 1\n\
nodes\n\
0 \"root\" -1\n\
end\n\
skeleton\n\
time 0\n\
0 0 0 0 0 0 0\n\
end\n\
triangles\n\
head_material\n\
0 0 0 0 0 0 1 0 0\n\
0 1 0 0 0 0 1 1 0\n\
0 0 1 0 0 0 1 0 1\n\
end\n";

const IDLE_SMD: &str = "version 1\n\
nodes\n\
0 \"root\" -1\n\
end\n\
skeleton\n\
time 0\n\
0 0 0 0 0 0 0\n\
time 1\n\
0 0 1 0 0 0 0\n\
end\n";

fn batch_config(request_dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    // `true` exits immediately; submission only needs the spawn to succeed.
    config.compiler.program = "true".into();
    config.compiler.request_dir = request_dir.to_path_buf();
    config
}

#[test]
fn manifest_compiles_end_to_end() {
    let dir = tempdir().expect("temp dir");
    fs::write(dir.path().join("head.smd"), HEAD_SMD).expect("write head");
    fs::write(dir.path().join("idle.smd"), IDLE_SMD).expect("write idle");
    let manifest_path = dir.path().join("headcrab.json");
    fs::write(
        &manifest_path,
        r#"{
            "model_name": "props/headcrab",
            "export_path": "/exports/props",
            "body_parts": [
                { "name": "head", "models": [ { "name": "regular", "source": "head.smd" } ] }
            ],
            "animations": [ { "name": "idle", "source": "idle.smd" } ],
            "sequences": [ { "name": "idle", "animations": [["idle"]] } ]
        }"#,
    )
    .expect("write manifest");

    let request_dir = dir.path().join("requests");
    project::compile_project(&manifest_path, &batch_config(&request_dir))
        .expect("batch compile succeeds");

    let request_path = request_dir.join("props_headcrab.json");
    let written = fs::read_to_string(&request_path).expect("request file written");
    assert!(written.contains("\"model_name\": \"props/headcrab.mdl\""));
    assert!(written.contains("\"head\""));
    assert!(written.contains("\"animation_name\": \"idle\""), "falls back to the file's animation");
}

#[test]
fn missing_source_aborts_the_run() {
    let dir = tempdir().expect("temp dir");
    let manifest_path = dir.path().join("broken.json");
    fs::write(
        &manifest_path,
        r#"{
            "model_name": "broken",
            "body_parts": [
                { "name": "head", "models": [ { "name": "regular", "source": "ghost.smd" } ] }
            ]
        }"#,
    )
    .expect("write manifest");

    let err = project::compile_project(&manifest_path, &batch_config(&dir.path().join("requests")))
        .expect_err("missing sources must fail the batch run");
    assert!(err.to_string().contains("failed to load"), "unexpected error: {err:#}");
}

#[test]
fn name_issues_block_the_batch_run() {
    let dir = tempdir().expect("temp dir");
    let manifest_path = dir.path().join("dupes.json");
    fs::write(
        &manifest_path,
        r#"{
            "model_name": "dupes",
            "sequences": [ { "name": "idle" }, { "name": "idle" } ]
        }"#,
    )
    .expect("write manifest");

    let err = project::compile_project(&manifest_path, &batch_config(&dir.path().join("requests")))
        .expect_err("duplicate names must block submission by default");
    assert!(err.to_string().contains("not submitted"), "unexpected error: {err:#}");
}

#[test]
fn part_filters_narrow_the_selection() {
    let dir = tempdir().expect("temp dir");
    fs::write(
        dir.path().join("barrel.obj"),
        "o Barrel\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\no Lid\nv 0 0 1\nv 1 0 1\nv 0 1 1\nf 4 5 6\n",
    )
    .expect("write obj");
    let manifest_path = dir.path().join("barrel.json");
    fs::write(
        &manifest_path,
        r#"{
            "model_name": "barrel",
            "body_parts": [
                {
                    "name": "shell",
                    "models": [ { "name": "no_lid", "source": "barrel.obj", "parts": ["Barrel"] } ]
                }
            ]
        }"#,
    )
    .expect("write manifest");

    let request_dir = dir.path().join("requests");
    project::compile_project(&manifest_path, &batch_config(&request_dir))
        .expect("batch compile succeeds");

    let written = fs::read_to_string(request_dir.join("barrel.json")).expect("request file written");
    assert!(written.contains("\"Barrel\""));
    assert!(!written.contains("\"Lid\""), "filtered part must not reach the request");
}
