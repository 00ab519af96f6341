//! Config file discovery.

use std::path::{Path, PathBuf};

/// Find the config file by searching upward from `start`.
///
/// ```text
/// /home/user/site/content/guide/  ← start
/// /home/user/site/vellum.toml     ← found
/// ```
pub fn find_config_file(config_name: &Path, start: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    start
        .ancestors()
        .map(|dir| dir.join(config_name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_config_in_ancestor() {
        let dir = tempfile::TempDir::new().unwrap();
        let nested = dir.path().join("content/guide");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("vellum.toml"), "").unwrap();

        let found = find_config_file(Path::new("vellum.toml"), &nested).unwrap();
        assert_eq!(found, dir.path().join("vellum.toml"));
    }

    #[test]
    fn absolute_path_is_used_directly() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("site.toml");
        assert!(find_config_file(&path, dir.path()).is_none());
        fs::write(&path, "").unwrap();
        assert_eq!(find_config_file(&path, Path::new("/")), Some(path));
    }
}
