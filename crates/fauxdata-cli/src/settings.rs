use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const SETTINGS_FILE: &str = "fauxdata.toml";
pub const TEMPLATE_DIR_ENV: &str = "FAUXDATA_TEMPLATE_DIR";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base directory for template names that are not paths.
    pub template_dir: Option<PathBuf>,
    /// Seed used when `--seed` is not given.
    pub seed: Option<u64>,
    pub log_json: bool,
    /// Parameters applied before the command line ones, e.g. `--env dev`.
    pub params: Option<String>,
}

/// Load settings from `explicit`, else `./fauxdata.toml` when present.
///
/// An explicit path must exist; the implicit one may not. The
/// `FAUXDATA_TEMPLATE_DIR` variable overrides `template_dir`.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, SettingsError> {
    let mut settings = match explicit {
        Some(path) => read_settings(path)?,
        None => {
            let path = Path::new(SETTINGS_FILE);
            if path.is_file() {
                read_settings(path)?
            } else {
                Settings::default()
            }
        }
    };
    if let Some(dir) = std::env::var_os(TEMPLATE_DIR_ENV).filter(|dir| !dir.is_empty()) {
        settings.template_dir = Some(PathBuf::from(dir));
    }
    Ok(settings)
}

fn read_settings(path: &Path) -> Result<Settings, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| SettingsError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_files_fall_back_to_defaults() {
        let settings: Settings = toml::from_str("seed = 9\n").unwrap();
        assert_eq!(settings.seed, Some(9));
        assert_eq!(settings.template_dir, None);
        assert!(!settings.log_json);
    }

    #[test]
    fn explicit_file_is_read() {
        let path = std::env::temp_dir().join(format!("fauxdata-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "log_json = true\nparams = \"--env dev\"\n").unwrap();
        let settings = read_settings(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(settings.log_json);
        assert_eq!(settings.params.as_deref(), Some("--env dev"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = load_settings(Some(Path::new("/nonexistent/fauxdata.toml"))).unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
    }

    #[test]
    fn malformed_file_names_its_path() {
        let path = std::env::temp_dir().join(format!("fauxdata-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "seed = \"many\"\n").unwrap();
        let err = read_settings(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(err.to_string().contains(&path.display().to_string()), "{err}");
    }
}
