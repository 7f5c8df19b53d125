#![allow(dead_code)]

use gridforge::layers::LayerId;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use tempfile::TempDir;
use zip::write::FileOptions;
use zip::ZipWriter;

pub const GREEK_KVKS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<visualkeyboard>
  <header>
    <version>10.0</version>
    <kbdname>greek</kbdname>
  </header>
  <encoding name="ansi">
    <layer shift=""><key vkey="K_A">?</key></layer>
  </encoding>
  <encoding name="unicode" fontname="Arial">
    <layer shift="">
      <key vkey="K_A">α</key>
      <key vkey="K_B">β</key>
      <key vkey="K_Q">;</key>
    </layer>
    <layer shift="S">
      <key vkey="K_A">Α</key>
      <key vkey="K_B">Β</key>
    </layer>
  </encoding>
</visualkeyboard>
"#;

pub const GREEK_SCRIPT: &str = r#"function Keyboard_greek_js(){
  this.KI="Keyboard_greek_js";this.KN="Greek (JS)";
  this.KV={F:' 1em "Arial"',K102:0};
  this.KV.KLS={
    "shift": ["Α","Β","Ψ"],
    "default": ["α","β","ψ","δ","ε","φ"]
  };
  this.KV.BK=(function(x){return x})([]);
}
"#;

/// A letter cell typing `text`, labelled `caption`.
pub fn letter_cell(caption: &str, text: &str) -> String {
    format!(
        r#"<Cell X="0" Y="0"><Content><Commands><Command ID="Action.InsertText"><Parameter Key="text">{text}</Parameter></Command></Commands><CaptionAndImage><Caption>{caption}</Caption></CaptionAndImage></Content></Cell>"#
    )
}

/// A cell running `action`, labelled `caption`.
pub fn action_cell(action: &str, caption: &str) -> String {
    format!(
        r#"<Cell X="1" Y="0"><Content><Commands><Command ID="{action}"/></Commands><CaptionAndImage><Caption>{caption}</Caption></CaptionAndImage></Content></Cell>"#
    )
}

pub fn grid_xml(cells: &[String]) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Grid><Cells>{}</Cells></Grid>",
        cells.concat()
    )
}

pub fn standard_page() -> String {
    grid_xml(&[
        letter_cell("A", "a"),
        letter_cell("B", "b"),
        letter_cell("C", "c"),
        action_cell("Action.Space", "space"),
        action_cell("Action.Enter", "enter"),
        r#"<Cell X="2" Y="1"><Content><CaptionAndImage><Caption></Caption></CaptionAndImage></Content></Cell>"#.to_string(),
    ])
}

/// Template with pages for `layers` plus a couple of assets that must
/// pass through untouched.
pub fn write_template(root: &Path, layers: &[LayerId]) {
    for layer in layers {
        let path = layer.grid_path(root);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, standard_page()).unwrap();
    }
    fs::create_dir_all(root.join("Settings0")).unwrap();
    fs::write(root.join("Settings0").join("settings.xml"), "<Settings/>").unwrap();
    fs::write(root.join("FileMap.xml"), "<FileMap/>").unwrap();
}

pub fn template_dir(layers: &[LayerId]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_template(dir.path(), layers);
    dir
}

/// Zips a directory tree the way the consuming application ships templates.
pub fn zip_dir(root: &Path) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
        let entry = entry.unwrap();
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry
            .path()
            .strip_prefix(root)
            .unwrap()
            .to_string_lossy()
            .replace('\\', "/");
        zip.start_file(name, FileOptions::default()).unwrap();
        zip.write_all(&fs::read(entry.path()).unwrap()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

pub fn read_entry(archive: &[u8], name: &str) -> String {
    let mut zip = zip::ZipArchive::new(Cursor::new(archive)).unwrap();
    let mut file = zip.by_name(name).unwrap();
    let mut content = String::new();
    std::io::Read::read_to_string(&mut file, &mut content).unwrap();
    content
}

pub fn entry_names(archive: &[u8]) -> Vec<String> {
    let zip = zip::ZipArchive::new(Cursor::new(archive)).unwrap();
    let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
    names.sort();
    names
}
