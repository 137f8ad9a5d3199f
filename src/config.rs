use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

#[derive(Clone, Debug)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub menu_file: PathBuf,
    pub theme_file: PathBuf,
    pub bin_dir: PathBuf,
    pub log_dir: PathBuf,
    pub import_dir: PathBuf,
}

impl AppPaths {
    pub fn new(config_dir: Option<PathBuf>, import_dir: PathBuf) -> Result<Self> {
        let config_dir = match config_dir {
            Some(dir) => dir,
            None => {
                let home = dirs::home_dir().context("Unable to determine home directory")?;
                home.join(".local/menu-maker")
            }
        };
        fs::create_dir_all(&config_dir)
            .with_context(|| format!("creating {}", config_dir.display()))?;
        Ok(Self::in_dir(&config_dir, import_dir))
    }

    pub fn in_dir(config_dir: &Path, import_dir: PathBuf) -> Self {
        Self {
            menu_file: config_dir.join("menus.json"),
            theme_file: config_dir.join("theme.json"),
            bin_dir: config_dir.join("bin"),
            log_dir: config_dir.join("logs"),
            config_dir: config_dir.to_path_buf(),
            import_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_config_dir_is_created() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = tmp.path().join("cfg");
        let paths = AppPaths::new(Some(dir.clone()), PathBuf::from("./bin")).expect("paths");
        assert!(dir.is_dir());
        assert_eq!(paths.menu_file, dir.join("menus.json"));
        assert_eq!(paths.bin_dir, dir.join("bin"));
    }
}
