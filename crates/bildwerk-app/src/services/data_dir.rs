// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware config file resolution.

use std::path::PathBuf;

const CONFIG_FILE: &str = "config.json";

/// Directory holding Bildwerk's settings (not created here).
pub fn config_dir() -> PathBuf {
    dirs_fallback().join("bildwerk")
}

/// Default location of the JSON config file.
pub fn config_file() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

fn dirs_fallback() -> PathBuf {
    // Try XDG config dir, then fallback to home
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME")
        && !xdg.is_empty()
    {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config");
    }
    // Last resort
    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_lives_in_bildwerk_dir() {
        let path = config_file();
        assert!(path.ends_with("bildwerk/config.json"));
    }
}
