#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub const FLOOR_HEADER: &str =
    "Location Name,Local Date,Local Hour,Local Minute,Associated Users Count,Capacity";

/// Write a floor-export CSV with the given data lines.
pub fn write_floor_csv(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut body = String::from(FLOOR_HEADER);
    body.push('\n');
    for line in lines {
        body.push_str(line);
        body.push('\n');
    }
    fs::write(&path, body).unwrap();
    path
}
