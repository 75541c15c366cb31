//! Helpers for writing recorded observations and event logs to disk.
//!
//! Shared between CLI test binaries via:
//!
//! ```rust
//! #[path = "common/recordings.rs"]
//! mod recordings;
//! ```

use std::fs::write;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use camino::Utf8PathBuf;
use tempfile::TempDir;

/// Temporary directory holding recordings; also used as the working
/// directory so no stray `stackwatch.toml` is discovered.
pub struct Recordings {
    dir: TempDir,
}

impl Recordings {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap_or_else(|err| panic!("create recordings dir: {err}")),
        }
    }

    pub fn write(&self, name: &str, json: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::from_path_buf(self.dir.path().join(name))
            .unwrap_or_else(|path| panic!("non UTF-8 temp path: {}", path.display()));
        write(&path, json).unwrap_or_else(|err| panic!("write {path}: {err}"));
        path
    }

    pub fn missing(&self, name: &str) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.dir.path().join(name))
            .unwrap_or_else(|path| panic!("non UTF-8 temp path: {}", path.display()))
    }

    /// Returns a `stackwatch` command isolated from the caller's config.
    pub fn command(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("stackwatch");
        cmd.current_dir(self.dir.path());
        cmd.env_remove("STACKWATCH_CONFIG_PATH");
        cmd.env("HOME", self.dir.path());
        cmd.env("XDG_CONFIG_HOME", self.dir.path());
        cmd
    }
}
