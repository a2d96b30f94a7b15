use crate::{ConfigError, LoadedSimulation};

/// Names accepted by [`preset`].
pub const PRESET_NAMES: &[&str] = &["erosion", "temperature"];

struct Preset {
    name: &'static str,
    simulation: &'static str,
    shade: &'static str,
}

const PRESETS: &[Preset] = &[
    Preset {
        name: "erosion",
        simulation: include_str!("../shaders/erosion.sim.glsl"),
        shade: include_str!("../shaders/erosion.shade.glsl"),
    },
    Preset {
        name: "temperature",
        simulation: include_str!("../shaders/temperature.sim.glsl"),
        shade: include_str!("../shaders/temperature.shade.glsl"),
    },
];

/// Looks up a bundled simulation by name (case-insensitive).
pub fn preset(name: &str) -> Result<LoadedSimulation, ConfigError> {
    PRESETS
        .iter()
        .find(|preset| preset.name.eq_ignore_ascii_case(name))
        .map(|preset| LoadedSimulation {
            name: preset.name.to_string(),
            simulation_body: preset.simulation.to_string(),
            shade_body: preset.shade.to_string(),
            static_texture: None,
            audio: false,
            video: false,
        })
        .ok_or_else(|| ConfigError::UnknownPreset {
            name: name.to_string(),
            available: PRESET_NAMES.join(", "),
        })
}
