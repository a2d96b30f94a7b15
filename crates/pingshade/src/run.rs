use anyhow::{Context, Result};
use renderer::media::{audio_channel, video_channel};
use renderer::{
    validate_program, MediaInputs, ProgramRole, Renderer, RendererConfig, SimulationConfig,
};
use simconfig::{preset, LoadedSimulation, SimulationFile, PRESET_NAMES};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::media;
use crate::paths::AppPaths;

const DEFAULT_PRESET: &str = "erosion";
const VIDEO_QUEUE_DEPTH: usize = 2;
const AUDIO_QUEUE_DEPTH: usize = 8;

pub fn run(cli: Cli) -> Result<()> {
    initialise_tracing();

    if cli.list_presets {
        for name in PRESET_NAMES {
            println!("{name}");
        }
        return Ok(());
    }

    let paths = AppPaths::discover()?;
    tracing::debug!(config_dir = %paths.config_dir().display(), "resolved config directory");

    let loaded = resolve_simulation(&cli, &paths)?;
    validate_program(ProgramRole::Simulation, &loaded.simulation_body)
        .with_context(|| format!("simulation '{}' is not valid GLSL", loaded.name))?;
    validate_program(ProgramRole::Shade, &loaded.shade_body)
        .with_context(|| format!("simulation '{}' is not valid GLSL", loaded.name))?;

    let config = build_renderer_config(&cli, loaded);
    tracing::info!(
        title = %config.title,
        audio = config.simulation.enable_audio,
        video = config.simulation.enable_video,
        "starting simulation"
    );

    let media = spawn_media(&cli)?;
    Renderer::new(config).run(media)
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// CONFIG wins, then `--preset`, then the user's default file, then the
/// built-in default preset.
fn resolve_simulation(cli: &Cli, paths: &AppPaths) -> Result<LoadedSimulation> {
    let mut loaded = if let Some(path) = &cli.config {
        SimulationFile::load(path)
            .with_context(|| format!("failed to load simulation {}", path.display()))?
    } else if let Some(name) = &cli.preset {
        preset(name)?
    } else if let Some(path) = paths.default_simulation() {
        tracing::info!(path = %path.display(), "using default simulation file");
        SimulationFile::load(&path)
            .with_context(|| format!("failed to load simulation {}", path.display()))?
    } else {
        preset(DEFAULT_PRESET)?
    };

    if let Some(noise) = &cli.noise {
        loaded.static_texture = Some(noise.clone());
    }
    Ok(loaded)
}

fn build_renderer_config(cli: &Cli, loaded: LoadedSimulation) -> RendererConfig {
    let defaults = RendererConfig::default();
    let mut simulation = SimulationConfig::new(loaded.simulation_body, loaded.shade_body);
    simulation.static_texture = loaded.static_texture;
    simulation.enable_audio = loaded.audio || cli.audio_tone.is_some();
    simulation.enable_video = loaded.video || cli.video_frames.is_some();

    RendererConfig {
        surface_size: cli.size.unwrap_or(defaults.surface_size),
        target_fps: cli.fps.filter(|fps| *fps > 0.0),
        gpu_power: cli.power,
        title: format!("pingshade: {}", loaded.name),
        simulation,
    }
}

fn spawn_media(cli: &Cli) -> Result<MediaInputs> {
    let mut inputs = MediaInputs::default();

    if let Some(frequency) = cli.audio_tone {
        let (producer, analyser) = audio_channel(AUDIO_QUEUE_DEPTH);
        media::spawn_tone(producer, frequency)?;
        inputs.audio = Some(Box::new(analyser));
        tracing::info!(frequency, "feeding sine tone into spectrumTexture");
    }

    if let Some(dir) = &cli.video_frames {
        let frames = media::load_frames(dir)?;
        let (producer, feed) = video_channel(VIDEO_QUEUE_DEPTH);
        media::spawn_image_sequence(producer, frames, cli.video_fps)?;
        inputs.video = Some(Box::new(feed));
    }

    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["pingshade"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    fn empty_paths() -> (TempDir, AppPaths) {
        let dir = TempDir::new().unwrap();
        let paths = AppPaths::from_config_dir(dir.path().to_path_buf());
        (dir, paths)
    }

    #[test]
    fn falls_back_to_default_preset() {
        let (_dir, paths) = empty_paths();
        let loaded = resolve_simulation(&cli(&[]), &paths).unwrap();
        assert_eq!(loaded.name, DEFAULT_PRESET);
    }

    #[test]
    fn default_file_beats_builtin_preset() {
        let (dir, paths) = empty_paths();
        fs::write(dir.path().join("s.glsl"), "void main() {}").unwrap();
        fs::write(
            dir.path().join(crate::paths::DEFAULT_SIMULATION_FILE),
            "name = \"mine\"\nsimulation = \"s.glsl\"\nshade = \"s.glsl\"\n",
        )
        .unwrap();
        let loaded = resolve_simulation(&cli(&[]), &paths).unwrap();
        assert_eq!(loaded.name, "mine");

        let loaded = resolve_simulation(&cli(&["--preset", "temperature"]), &paths).unwrap();
        assert_eq!(loaded.name, "temperature");
    }

    #[test]
    fn unknown_preset_is_an_error() {
        let (_dir, paths) = empty_paths();
        assert!(resolve_simulation(&cli(&["--preset", "lava"]), &paths).is_err());
    }

    #[test]
    fn noise_flag_overrides_static_texture() {
        let (_dir, paths) = empty_paths();
        let loaded = resolve_simulation(&cli(&["--noise", "grain.png"]), &paths).unwrap();
        assert_eq!(loaded.static_texture, Some(PathBuf::from("grain.png")));
    }

    #[test]
    fn media_flags_enable_inputs_and_zero_fps_is_uncapped() {
        let args = cli(&["--audio-tone", "220", "--fps", "0", "--size", "640x480"]);
        let (_dir, paths) = empty_paths();
        let loaded = resolve_simulation(&args, &paths).unwrap();
        let config = build_renderer_config(&args, loaded);
        assert!(config.simulation.enable_audio);
        assert!(!config.simulation.enable_video);
        assert_eq!(config.target_fps, None);
        assert_eq!(config.surface_size, (640, 480));
        assert_eq!(config.title, "pingshade: erosion");
    }

    #[test]
    fn bundled_presets_validate() {
        for name in PRESET_NAMES {
            let loaded = preset(name).unwrap();
            validate_program(ProgramRole::Simulation, &loaded.simulation_body).unwrap();
            validate_program(ProgramRole::Shade, &loaded.shade_body).unwrap();
        }
    }
}
