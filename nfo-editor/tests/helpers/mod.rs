//! Test Helper Utilities
//!
//! Sidecar fixtures shared by the nfo-editor integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Write a minimal movie sidecar with the given studio and genres
pub fn write_movie(dir: &Path, name: &str, title: &str, studio: &str, genres: &[&str]) -> PathBuf {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<movie>\n");
    if !title.is_empty() {
        xml.push_str(&format!("  <title>{}</title>\n", title));
    }
    if !studio.is_empty() {
        xml.push_str(&format!("  <studio>{}</studio>\n", studio));
    }
    for genre in genres {
        xml.push_str(&format!("  <genre>{}</genre>\n", genre));
    }
    xml.push_str("</movie>\n");
    write_raw(dir, name, &xml)
}

/// Write arbitrary content, creating parent directories
pub fn write_raw(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

/// `count` nested directories below `root`, returning the deepest
pub fn nested_dir(root: &Path, count: usize) -> PathBuf {
    let mut dir = root.to_path_buf();
    for i in 0..count {
        dir = dir.join(format!("d{}", i));
    }
    fs::create_dir_all(&dir).unwrap();
    dir
}
