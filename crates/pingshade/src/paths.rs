use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "PINGSHADE_CONFIG_DIR";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "pingshade";
const APPLICATION: &str = "pingshade";

/// File picked up when neither a CONFIG path nor a preset is given.
pub const DEFAULT_SIMULATION_FILE: &str = "simulation.toml";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        if let Some(config_dir) = env_override(ENV_CONFIG_DIR) {
            return Ok(Self { config_dir });
        }
        let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
            .ok_or_else(|| anyhow!("failed to determine user directories"))?;
        Ok(Self {
            config_dir: project_dirs.config_dir().to_path_buf(),
        })
    }

    pub fn from_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// The default simulation file, if one exists.
    pub fn default_simulation(&self) -> Option<PathBuf> {
        let candidate = self.config_dir.join(DEFAULT_SIMULATION_FILE);
        candidate.is_file().then_some(candidate)
    }
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.as_os_str().is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_simulation_requires_existing_file() {
        let root = TempDir::new().unwrap();
        let paths = AppPaths::from_config_dir(root.path().to_path_buf());
        assert!(paths.default_simulation().is_none());

        let file = root.path().join(DEFAULT_SIMULATION_FILE);
        std::fs::write(&file, "").unwrap();
        assert_eq!(paths.default_simulation(), Some(file));
    }
}
