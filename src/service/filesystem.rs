use crate::Result;
use std::ffi::OsString;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "customer-insights";

/// Path of `file_name` inside the app data directory, which is created if
/// missing.
pub fn data_dir_file_path(file_name: &str) -> Result<PathBuf> {
    #[allow(deprecated)]
    let home = std::env::home_dir();
    let data_dir = data_dir(std::env::var_os("XDG_DATA_HOME"), home)?;
    create_dir_all(&data_dir)?;
    Ok(data_dir.join(file_name))
}

/// An absolute `XDG_DATA_HOME` wins, otherwise `~/.local/share`.
fn data_dir(xdg_data_home: Option<OsString>, home: Option<PathBuf>) -> Result<PathBuf> {
    let base = match xdg_data_home {
        Some(dir) if Path::new(&dir).is_absolute() => PathBuf::from(dir),
        _ => home
            .ok_or("Home directory does not exist")?
            .join(".local/share"),
    };
    Ok(base.join(APP_DIR))
}
