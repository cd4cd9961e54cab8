//! Configuration paths and path helpers

use std::io;
use std::path::{Path, PathBuf};

/// Name used for the configuration directory
const APP_NAME: &str = "nvda-systest";

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/nvda-systest/`
/// - macOS: `~/Library/Application Support/nvda-systest/`
/// - Windows: `%APPDATA%\nvda-systest\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Resolve `path` against `root` and make the result absolute.
///
/// Absolute paths are returned unchanged. A relative `root` is resolved
/// against the current directory; the target does not have to exist.
pub fn resolve(root: &Path, path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let root = if root.is_absolute() {
        root.to_path_buf()
    } else {
        std::env::current_dir()?.join(root)
    };
    Ok(root.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_is_toml() {
        if let Some(path) = config_path() {
            assert_eq!(path.file_name().unwrap(), "config.toml");
        }
    }

    #[test]
    fn test_resolve_keeps_absolute_paths() {
        let abs = std::env::temp_dir().join("nvda.log");
        assert_eq!(resolve(Path::new("anything"), &abs).unwrap(), abs);
    }

    #[test]
    fn test_resolve_relative_root_is_made_absolute() {
        let resolved = resolve(Path::new("repo"), Path::new("source/nvda.log")).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("repo/source/nvda.log"));
    }
}
