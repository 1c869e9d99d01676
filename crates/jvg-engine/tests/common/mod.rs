#![allow(dead_code)]

use std::path::PathBuf;

use jvg_engine::memo_file::{load_memo_file, LoadedMemo};

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR")))
}

pub fn load_fixture(name: &str) -> LoadedMemo {
    let path = fixture_path(name);
    load_memo_file(&path).unwrap_or_else(|e| panic!("Failed to load {}: {e}", path.display()))
}

pub fn read_fixture(name: &str) -> String {
    let path = fixture_path(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()))
}
