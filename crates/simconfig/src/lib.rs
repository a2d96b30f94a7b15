//! Simulation description files and the bundled presets.
//!
//! A simulation file is a small TOML document pointing at two GLSL bodies:
//!
//! ```toml
//! name = "ripples"
//! simulation = "ripples.sim.glsl"
//! shade = "ripples.shade.glsl"
//! static_texture = "noise.png"   # optional
//! audio = false
//! video = false
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

mod presets;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use presets::{preset, PRESET_NAMES};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse simulation file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid simulation file: {0}")]
    Invalid(String),
    #[error("unknown preset '{name}' (available: {available})")]
    UnknownPreset { name: String, available: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationFile {
    #[serde(default)]
    pub name: Option<String>,
    /// Body of the simulation-role program.
    pub simulation: PathBuf,
    /// Body of the shade-role program.
    pub shade: PathBuf,
    #[serde(default)]
    pub static_texture: Option<PathBuf>,
    #[serde(default)]
    pub audio: bool,
    #[serde(default)]
    pub video: bool,
}

impl SimulationFile {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let file: Self = toml::from_str(source)?;
        file.validate()?;
        Ok(file)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "`simulation` must name a shader file".to_string(),
            ));
        }
        if self.shade.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "`shade` must name a shader file".to_string(),
            ));
        }
        if matches!(&self.static_texture, Some(path) if path.as_os_str().is_empty()) {
            return Err(ConfigError::Invalid(
                "`static_texture` must not be empty when present".to_string(),
            ));
        }
        Ok(())
    }

    /// Reads and validates `path`, then loads both shader bodies.
    pub fn load(path: &Path) -> Result<LoadedSimulation, ConfigError> {
        let source = read_text(path)?;
        let file = Self::from_toml_str(&source)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let fallback_name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "simulation".to_string());
        file.resolve(base, fallback_name)
    }

    /// Resolves relative paths against `base` and reads the shader bodies.
    pub fn resolve(
        &self,
        base: &Path,
        fallback_name: String,
    ) -> Result<LoadedSimulation, ConfigError> {
        let simulation_body = read_text(&base.join(&self.simulation))?;
        let shade_body = read_text(&base.join(&self.shade))?;
        let static_texture = match &self.static_texture {
            Some(texture) => {
                let resolved = base.join(texture);
                if !resolved.is_file() {
                    return Err(ConfigError::Invalid(format!(
                        "static texture {} does not exist",
                        resolved.display()
                    )));
                }
                Some(resolved)
            }
            None => None,
        };

        Ok(LoadedSimulation {
            name: self.name.clone().unwrap_or(fallback_name),
            simulation_body,
            shade_body,
            static_texture,
            audio: self.audio,
            video: self.video,
        })
    }
}

/// A simulation ready to hand to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSimulation {
    pub name: String,
    pub simulation_body: String,
    pub shade_body: String,
    pub static_texture: Option<PathBuf>,
    pub audio: bool,
    pub video: bool,
}

fn read_text(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_file_with_defaults() {
        let file = SimulationFile::from_toml_str(
            r#"
            simulation = "a.glsl"
            shade = "b.glsl"
            "#,
        )
        .unwrap();
        assert_eq!(file.name, None);
        assert_eq!(file.static_texture, None);
        assert!(!file.audio);
        assert!(!file.video);
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = SimulationFile::from_toml_str(
            r#"
            simulation = "a.glsl"
            shade = "b.glsl"
            fps = 60
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_empty_shader_paths() {
        let err = SimulationFile::from_toml_str(
            r#"
            simulation = ""
            shade = "b.glsl"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("simulation"));
    }

    #[test]
    fn load_resolves_paths_relative_to_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("glsl")).unwrap();
        fs::write(dir.path().join("glsl/sim.glsl"), "void main() {}").unwrap();
        fs::write(dir.path().join("glsl/shade.glsl"), "void main() { }").unwrap();
        fs::write(dir.path().join("noise.png"), b"not really a png").unwrap();
        let config = dir.path().join("ripples.toml");
        fs::write(
            &config,
            r#"
            simulation = "glsl/sim.glsl"
            shade = "glsl/shade.glsl"
            static_texture = "noise.png"
            audio = true
            "#,
        )
        .unwrap();

        let loaded = SimulationFile::load(&config).unwrap();
        assert_eq!(loaded.name, "ripples");
        assert_eq!(loaded.simulation_body, "void main() {}");
        assert_eq!(loaded.shade_body, "void main() { }");
        assert_eq!(loaded.static_texture, Some(dir.path().join("noise.png")));
        assert!(loaded.audio);
        assert!(!loaded.video);
    }

    #[test]
    fn missing_shader_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("broken.toml");
        fs::write(
            &config,
            r#"
            name = "broken"
            simulation = "missing.glsl"
            shade = "missing.glsl"
            "#,
        )
        .unwrap();

        let err = SimulationFile::load(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("missing.glsl"));
    }

    #[test]
    fn missing_static_texture_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("s.glsl"), "").unwrap();
        let file = SimulationFile {
            name: None,
            simulation: "s.glsl".into(),
            shade: "s.glsl".into(),
            static_texture: Some("nope.png".into()),
            audio: false,
            video: false,
        };
        let err = file.resolve(dir.path(), "x".to_string()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
