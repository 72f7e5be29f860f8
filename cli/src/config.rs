use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

pub struct Config {
    pub data_dir: PathBuf,
    pub list_path: PathBuf,
    pub db_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "wishlist").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let list_path = data_dir.join("wishlist.dat");
        let db_path = data_dir.join("wishlist.db");

        Ok(Config {
            data_dir,
            list_path,
            db_path,
        })
    }
}
