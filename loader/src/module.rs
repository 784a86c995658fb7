// src/module.rs

//! Module descriptors returned by the daemon and local `module.prop` lookups.

use crate::constants::MODULE_PROP;
use log::trace;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A module library announced by the daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Path of the module's native library.
    pub path: String,
    /// The module id.
    pub name: String,
}

impl ModuleInfo {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }
}

/// Resolves the human-readable name of a module from `<modules_dir>/<id>/module.prop`.
///
/// Falls back to `id` when the file can't be read or has no `name=` entry.
pub fn display_name(modules_dir: &Path, id: &str) -> String {
    let prop = modules_dir.join(id).join(MODULE_PROP);
    let file = match File::open(&prop) {
        Ok(file) => file,
        Err(e) => {
            trace!("No {} for `{}`: {}", MODULE_PROP, id, e);
            return id.to_string();
        }
    };

    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .find_map(|line| line.strip_prefix("name=").map(str::to_string))
        .unwrap_or_else(|| id.to_string())
}
