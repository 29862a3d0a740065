//! Shared utility functions for OpenClaw crates

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Name of the per-user OpenClaw directory under `$HOME`.
pub const OPENCLAW_DIR_NAME: &str = ".openclaw";

/// Get the user's home directory
///
/// Prefers the HOME environment variable over dirs::home_dir() because
/// dirs::home_dir() reads from /etc/passwd, which ignores a HOME override.
pub fn get_home_dir() -> Result<PathBuf> {
    if let Ok(home) = std::env::var("HOME") {
        if !home.is_empty() {
            return Ok(PathBuf::from(home));
        }
    }

    dirs::home_dir().ok_or(Error::HomeNotFound)
}

/// Get the OpenClaw home configuration directory (~/.openclaw)
pub fn get_openclaw_dir() -> Result<PathBuf> {
    Ok(get_home_dir()?.join(OPENCLAW_DIR_NAME))
}

/// Expand a leading `~` or `~/` to the user's home directory.
pub fn expand_tilde(path: &Path) -> Result<PathBuf> {
    let Some(raw) = path.to_str() else {
        return Ok(path.to_path_buf());
    };

    if raw == "~" {
        return get_home_dir();
    }
    match raw.strip_prefix("~/") {
        Some(rest) => Ok(get_home_dir()?.join(rest)),
        None => Ok(path.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_get_home_dir_prefers_env() {
        let original = std::env::var("HOME").ok();
        std::env::set_var("HOME", "/tmp/openclaw-home-test");

        let home = get_home_dir().unwrap();
        assert_eq!(home, PathBuf::from("/tmp/openclaw-home-test"));
        assert_eq!(
            get_openclaw_dir().unwrap(),
            PathBuf::from("/tmp/openclaw-home-test/.openclaw")
        );

        match original {
            Some(value) => std::env::set_var("HOME", value),
            None => std::env::remove_var("HOME"),
        }
    }

    #[test]
    #[serial]
    fn test_expand_tilde() {
        let original = std::env::var("HOME").ok();
        std::env::set_var("HOME", "/home/vault");

        assert_eq!(
            expand_tilde(Path::new("~/backups")).unwrap(),
            PathBuf::from("/home/vault/backups")
        );
        assert_eq!(
            expand_tilde(Path::new("~")).unwrap(),
            PathBuf::from("/home/vault")
        );
        assert_eq!(
            expand_tilde(Path::new("/srv/backups")).unwrap(),
            PathBuf::from("/srv/backups")
        );
        assert_eq!(
            expand_tilde(Path::new("~other/x")).unwrap(),
            PathBuf::from("~other/x")
        );

        match original {
            Some(value) => std::env::set_var("HOME", value),
            None => std::env::remove_var("HOME"),
        }
    }
}
