use anyhow::Result;
use exrec_core::config::ExrecConfig;
use exrec_core::error::ExrecError;
use exrec_infrastructure::DirExperienceRepository;
use exrec_infrastructure::paths::ExrecPaths;
use exrec_infrastructure::storage::ConfigStorage;
use std::path::Path;

/// Loads the config from `path`, or from the platform config file.
///
/// An explicitly named file must exist; the platform file may be absent.
pub fn load(path: Option<&Path>) -> Result<ExrecConfig> {
    let storage = match path {
        Some(path) => {
            if !path.exists() {
                let message = format!("config file {:?} does not exist", path);
                return Err(ExrecError::config(message).into());
            }
            ConfigStorage::new(path.to_path_buf())
        }
        None => match ExrecPaths::config_file() {
            Ok(path) => ConfigStorage::new(path),
            Err(_) => return Ok(ExrecConfig::default()),
        },
    };

    let config = storage.load_or_default().map_err(|e| {
        ExrecError::config(format!("Failed to load {:?}: {}", storage.path(), e))
    })?;
    Ok(config)
}

pub fn repository(config: &ExrecConfig) -> Result<DirExperienceRepository> {
    Ok(DirExperienceRepository::from_config(config)?)
}
