// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware data directory resolution.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use printrelay_core::error::{PrintRelayError, Result};

const APP_DIR: &str = "printrelay";

/// Name of the persisted configuration file inside the data dir.
pub const CONFIG_FILE: &str = "config.json";

/// Return the application data directory, creating it if needed.
///
/// `explicit` (from the command line) wins over the XDG location.
pub fn data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    let dir = match explicit {
        Some(dir) => dir.to_path_buf(),
        None => base_dir(std::env::var_os("XDG_DATA_HOME"), std::env::var_os("HOME")).join(APP_DIR),
    };
    std::fs::create_dir_all(&dir)
        .map_err(|e| PrintRelayError::Config(format!("create data dir {}: {e}", dir.display())))?;
    Ok(dir)
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

fn base_dir(xdg_data_home: Option<OsString>, home: Option<OsString>) -> PathBuf {
    // Try XDG data dir, then fallback to home
    if let Some(xdg) = xdg_data_home.filter(|v| !v.is_empty()) {
        return PathBuf::from(xdg);
    }
    if let Some(home) = home.filter(|v| !v.is_empty()) {
        return PathBuf::from(home).join(".local").join("share");
    }
    std::env::temp_dir()
}
