use std::path::PathBuf;

use clap::Parser;
use renderer::GpuPowerPreference;

#[derive(Parser, Debug)]
#[command(
    name = "pingshade",
    author,
    version,
    about = "Double-buffered feedback shader simulations",
    arg_required_else_help = false
)]
pub struct Cli {
    /// Simulation file (TOML) naming the simulation and shade bodies.
    #[arg(value_name = "CONFIG", conflicts_with = "preset")]
    pub config: Option<PathBuf>,

    /// Run a bundled simulation instead of a file (see --list-presets).
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Print the bundled simulation names and exit.
    #[arg(long)]
    pub list_presets: bool,

    /// Initial window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_surface_size)]
    pub size: Option<(u32, u32)>,

    /// Optional FPS cap (0=uncapped).
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f32>,

    /// Adapter preference: `low` or `high`.
    #[arg(
        long,
        value_name = "POWER",
        value_parser = parse_power,
        default_value = "high"
    )]
    pub power: GpuPowerPreference,

    /// Feed a sine tone of this frequency into `spectrumTexture`.
    #[arg(long, value_name = "HZ")]
    pub audio_tone: Option<f32>,

    /// Play the images in this directory, in name order, into `videoTexture`.
    #[arg(long, value_name = "DIR")]
    pub video_frames: Option<PathBuf>,

    /// Playback rate for --video-frames.
    #[arg(long, value_name = "FPS", default_value_t = 24.0)]
    pub video_fps: f32,

    /// Image for `noiseTexture`, overriding the simulation file.
    #[arg(long, value_name = "PATH")]
    pub noise: Option<PathBuf>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_surface_size(value: &str) -> Result<(u32, u32), String> {
    let trimmed = value.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| "expected WxH format, e.g. 1280x720".to_string())?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width in size '{trimmed}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height in size '{trimmed}'"))?;

    if width == 0 || height == 0 {
        return Err("surface dimensions must be greater than zero".to_string());
    }

    Ok((width, height))
}

pub fn parse_power(value: &str) -> Result<GpuPowerPreference, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "low" | "low-power" | "integrated" => Ok(GpuPowerPreference::Low),
        "high" | "high-performance" | "discrete" => Ok(GpuPowerPreference::High),
        other => Err(format!("invalid power preference '{other}'; use low or high")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_arguments() {
        let cli = Cli::try_parse_from(["pingshade"]).unwrap();
        assert!(cli.config.is_none());
        assert!(cli.preset.is_none());
        assert_eq!(cli.power, GpuPowerPreference::High);
        assert_eq!(cli.video_fps, 24.0);
        assert!(!cli.list_presets);
    }

    #[test]
    fn parses_media_and_window_flags() {
        let cli = Cli::try_parse_from([
            "pingshade",
            "--preset",
            "temperature",
            "--size",
            "800x600",
            "--fps",
            "30",
            "--power",
            "low",
            "--audio-tone",
            "440",
            "--video-frames",
            "/tmp/frames",
            "--noise",
            "noise.png",
        ])
        .unwrap();
        assert_eq!(cli.preset.as_deref(), Some("temperature"));
        assert_eq!(cli.size, Some((800, 600)));
        assert_eq!(cli.fps, Some(30.0));
        assert_eq!(cli.power, GpuPowerPreference::Low);
        assert_eq!(cli.audio_tone, Some(440.0));
        assert_eq!(cli.video_frames, Some(PathBuf::from("/tmp/frames")));
        assert_eq!(cli.noise, Some(PathBuf::from("noise.png")));
    }

    #[test]
    fn config_and_preset_conflict() {
        assert!(Cli::try_parse_from(["pingshade", "sim.toml", "--preset", "erosion"]).is_err());
    }

    #[test]
    fn surface_size_validation() {
        assert_eq!(parse_surface_size(" 1920 x 1080 "), Ok((1920, 1080)));
        assert!(parse_surface_size("1920").is_err());
        assert!(parse_surface_size("0x10").is_err());
        assert!(parse_surface_size("ax10").is_err());
    }

    #[test]
    fn power_parsing_rejects_unknown_values() {
        assert_eq!(parse_power("HIGH"), Ok(GpuPowerPreference::High));
        assert!(parse_power("turbo").is_err());
    }
}
