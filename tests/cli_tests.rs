mod common;

use common::{read_entry, template_dir, GREEK_KVKS};
use gridforge::layers::LayerId;
use std::fs;
use std::process::Command;

fn gridforge() -> Command {
    Command::new(env!("CARGO_BIN_EXE_gridforge"))
}

#[test]
fn test_inspect_json() {
    let dir = tempfile::tempdir().unwrap();
    let layout = dir.path().join("greek.kvks");
    fs::write(&layout, GREEK_KVKS).unwrap();

    let output = gridforge()
        .args(["inspect", "--json"])
        .arg(&layout)
        .output()
        .expect("Failed to execute process");

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["name"], "greek");
    assert_eq!(json["format"], "structured");
    assert_eq!(json["mapping"][""]["k_a"], "α");
    assert_eq!(json["mapping"]["S"]["k_a"], "Α");
}

#[test]
fn test_build_from_layout_file() {
    let template = template_dir(&[LayerId::Base, LayerId::Shift]);
    let work = tempfile::tempdir().unwrap();
    let layout = work.path().join("greek.kvks");
    fs::write(&layout, GREEK_KVKS).unwrap();
    let out = work.path().join("out");

    let output = gridforge()
        .arg("build")
        .arg("--layout-file")
        .arg(&layout)
        .arg("--template")
        .arg(template.path())
        .arg("--out")
        .arg(&out)
        .args(["--placeholder", "_"])
        .output()
        .expect("Failed to execute process");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let bytes = fs::read(out.join("greek.gridset")).unwrap();
    let page = read_entry(&bytes, "Grids/default/grid.xml");
    assert!(page.contains("<Caption>α</Caption>"));
    assert!(page.contains("<Caption>_</Caption>"));
}

#[test]
fn test_build_from_layouts_dir_and_config_file() {
    let template = template_dir(&[LayerId::Base]);
    let work = tempfile::tempdir().unwrap();
    fs::write(work.path().join("greek.kvks"), GREEK_KVKS).unwrap();
    let config = work.path().join("config.json");
    fs::write(&config, r##"{ "rewrite": { "placeholder": "#" } }"##).unwrap();

    let status = gridforge()
        .args(["build", "--keyboard", "greek", "--layouts-dir"])
        .arg(work.path())
        .arg("--template")
        .arg(template.path())
        .arg("--out")
        .arg(work.path())
        .arg("--config")
        .arg(&config)
        .status()
        .expect("Failed to execute process");
    assert!(status.success());

    let bytes = fs::read(work.path().join("greek.gridset")).unwrap();
    let page = read_entry(&bytes, "Grids/default/grid.xml");
    assert!(page.contains("<Caption>#</Caption>"));
}

#[test]
fn test_missing_keyboard_exits_with_failure() {
    let template = template_dir(&[LayerId::Base]);
    let work = tempfile::tempdir().unwrap();

    let status = gridforge()
        .args(["build", "--keyboard", "nothing", "--layouts-dir"])
        .arg(work.path())
        .arg("--template")
        .arg(template.path())
        .arg("--out")
        .arg(work.path())
        .status()
        .expect("Failed to execute process");

    assert_eq!(status.code(), Some(1));
    assert!(!work.path().join("nothing.gridset").exists());
}

#[test]
fn test_malformed_layout_exits_with_failure() {
    let work = tempfile::tempdir().unwrap();
    let layout = work.path().join("bad.kvks");
    fs::write(&layout, "<visualkeyboard><layer>").unwrap();

    let status = gridforge()
        .arg("inspect")
        .arg(&layout)
        .status()
        .expect("Failed to execute process");
    assert_eq!(status.code(), Some(1));
}
