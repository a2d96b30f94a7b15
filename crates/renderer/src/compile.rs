//! Turns caller-supplied shader bodies into complete GLSL programs.
//!
//! Every body is prefixed with a fixed header that declares the whole uniform
//! and texture surface, whether or not the body uses it:
//!
//! | name              | kind        | notes                                   |
//! |-------------------|-------------|-----------------------------------------|
//! | `resolution`      | `vec2`      | drawable size in pixels                 |
//! | `time`            | `float`     | elapsed seconds, scaled                 |
//! | `pointer`         | `vec3`      | x, y (bottom-left origin), activity     |
//! | `frameIndex`      | `int`       | simulation role only                    |
//! | `noiseTexture`    | `sampler2D` | static image or procedural noise        |
//! | `videoTexture`    | `sampler2D` | latest decoded video frame              |
//! | `spectrumTexture` | `sampler2D` | audio time-domain samples, 1 texel row  |
//! | `feedbackChannel` | `sampler2D` | state written by the previous pass      |
//!
//! Bodies define `void main()` and write `fragColor` (`gl_FragColor` and
//! `texture2D` are aliased for WebGL-style code). The feedback buffers start
//! out zeroed, so simulation bodies are expected to seed their state when
//! `frameIndex == 0` instead of trusting the first read.
//!
//! The names above are preprocessor macros, so bodies must not reuse them for
//! their own identifiers.

use std::borrow::Cow;
use std::fmt;

use wgpu::naga::front::glsl;
use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};
use wgpu::naga::ShaderStage;

use crate::error::RenderError;

/// Which half of the pipeline a program serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramRole {
    /// Reads the previous state, writes the next one into the back buffer.
    Simulation,
    /// Reads the latest state, writes visible color.
    Shade,
}

impl fmt::Display for ProgramRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgramRole::Simulation => f.write_str("simulation"),
            ProgramRole::Shade => f.write_str("shade"),
        }
    }
}

/// Compiles the static full-screen triangle vertex shader.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("fullscreen triangle vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(VERTEX_SHADER_GLSL),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    })
}

/// Composes, validates, and compiles the fragment program for `role`.
pub(crate) fn compile_fragment_shader(
    device: &wgpu::Device,
    role: ProgramRole,
    body: &str,
) -> Result<wgpu::ShaderModule, RenderError> {
    let source = validate_program(role, body)?;
    let label = match role {
        ProgramRole::Simulation => "simulation fragment",
        ProgramRole::Shade => "shade fragment",
    };
    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(source),
            stage: ShaderStage::Fragment,
            defines: &[],
        },
    }))
}

/// Builds the complete program text and checks it with naga, returning the
/// composed source on success.
///
/// This needs no GPU, so malformed bodies can be rejected (with the compiler
/// diagnostic) before any device work happens.
pub fn validate_program(role: ProgramRole, body: &str) -> Result<String, RenderError> {
    let source = compose_fragment(role, body);
    let mut frontend = glsl::Frontend::default();
    let module = frontend
        .parse(&glsl::Options::from(ShaderStage::Fragment), &source)
        .map_err(|errors| RenderError::ShaderParse {
            role,
            diagnostic: errors.emit_to_string(&source),
        })?;
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|error| RenderError::ShaderValidation {
            role,
            diagnostic: error.emit_to_string(&source),
        })?;
    Ok(source)
}

/// Concatenates the role header, the body, and (for shade) the entry shim.
pub fn compose_fragment(role: ProgramRole, body: &str) -> String {
    match role {
        ProgramRole::Simulation => format!("{COMMON_HEADER}{SIMULATION_HEADER}\n{body}\n"),
        ProgramRole::Shade => format!("{COMMON_HEADER}{SHADE_HEADER}\n{body}\n{SHADE_FOOTER}"),
    }
}

/// Declarations shared by both roles.
///
/// The uniform block layout must match `FrameUniforms` in `gpu/uniforms.rs`.
const COMMON_HEADER: &str = r"#version 450
layout(location = 0) out vec4 fragColor;

layout(std140, set = 0, binding = 0) uniform FrameParams {
    vec2 _resolution;
    float _time;
    int _frameIndex;
    vec3 _pointer;
    float _padding;
} params;

#define resolution params._resolution
#define time params._time
#define pointer params._pointer

layout(set = 1, binding = 0) uniform texture2D pingshade_noise_texture;
layout(set = 1, binding = 1) uniform sampler pingshade_noise_sampler;
layout(set = 1, binding = 2) uniform texture2D pingshade_video_texture;
layout(set = 1, binding = 3) uniform sampler pingshade_video_sampler;
layout(set = 1, binding = 4) uniform texture2D pingshade_spectrum_texture;
layout(set = 1, binding = 5) uniform sampler pingshade_spectrum_sampler;
layout(set = 2, binding = 0) uniform texture2D pingshade_feedback_texture;
layout(set = 2, binding = 1) uniform sampler pingshade_feedback_sampler;

#define noiseTexture sampler2D(pingshade_noise_texture, pingshade_noise_sampler)
#define videoTexture sampler2D(pingshade_video_texture, pingshade_video_sampler)
#define spectrumTexture sampler2D(pingshade_spectrum_texture, pingshade_spectrum_sampler)
#define feedbackChannel sampler2D(pingshade_feedback_texture, pingshade_feedback_sampler)

#define gl_FragColor fragColor
#define texture2D texture
";

/// The simulation pass writes texel rows in the same order `gl_FragCoord`
/// counts them, so feedback reads at `gl_FragCoord.xy / resolution` line up.
const SIMULATION_HEADER: &str = r"
#define frameIndex params._frameIndex
";

/// The shade pass targets the presented surface, whose rows run top-down, so
/// `gl_FragCoord` is flipped to a bottom-left origin before the body runs.
const SHADE_HEADER: &str = r"
vec4 pingshade_frag_coord;
#define gl_FragCoord pingshade_frag_coord
#define main pingshade_shade_main
";

const SHADE_FOOTER: &str = r"
#undef main
#undef gl_FragCoord
void main() {
    pingshade_frag_coord = vec4(gl_FragCoord.x, resolution.y - gl_FragCoord.y, gl_FragCoord.z, gl_FragCoord.w);
    pingshade_shade_main();
}
";

/// Minimal full-screen triangle vertex shader.
const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    vec2 pos = positions[vertex_index];
    v_uv = pos * 0.5 + vec2(0.5, 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

#[cfg(test)]
mod tests {
    use super::*;

    const CONSTANT_BODY: &str = "void main() { fragColor = vec4(1.0); }";

    #[test]
    fn header_declares_full_surface_for_both_roles() {
        for role in [ProgramRole::Simulation, ProgramRole::Shade] {
            let source = compose_fragment(role, CONSTANT_BODY);
            for name in [
                "resolution",
                "time",
                "pointer",
                "noiseTexture",
                "videoTexture",
                "spectrumTexture",
                "feedbackChannel",
            ] {
                assert!(
                    source.contains(&format!("#define {name} ")),
                    "{role} header is missing {name}"
                );
            }
            assert!(source.contains(CONSTANT_BODY));
        }
    }

    #[test]
    fn frame_index_is_simulation_only() {
        let simulation = compose_fragment(ProgramRole::Simulation, CONSTANT_BODY);
        let shade = compose_fragment(ProgramRole::Shade, CONSTANT_BODY);
        assert!(simulation.contains("#define frameIndex"));
        assert!(!shade.contains("#define frameIndex"));
        assert!(shade.contains("pingshade_shade_main();"));
    }

    #[test]
    fn trivial_bodies_validate() {
        validate_program(ProgramRole::Simulation, CONSTANT_BODY).unwrap();
        validate_program(
            ProgramRole::Shade,
            "void main() { fragColor = vec4(texture(feedbackChannel, gl_FragCoord.xy / resolution).r); }",
        )
        .unwrap();
    }

    #[test]
    fn bodies_can_read_every_declared_input() {
        let body = r"
            void main() {
                vec2 uv = gl_FragCoord.xy / resolution;
                float seed = frameIndex == 0 ? 1.0 : 0.0;
                vec4 n = texture(noiseTexture, uv);
                vec4 v = texture(videoTexture, uv);
                vec4 s = texture(spectrumTexture, vec2(uv.x, 0.5));
                vec4 f = texture2D(feedbackChannel, uv);
                gl_FragColor = vec4(n.r + v.g + s.r + f.r + seed + time + pointer.z);
            }
        ";
        validate_program(ProgramRole::Simulation, body).unwrap();
    }

    #[test]
    fn syntax_errors_surface_compiler_diagnostic() {
        let err = validate_program(ProgramRole::Simulation, "void main() { fragColor = ; }")
            .unwrap_err();
        match &err {
            RenderError::ShaderParse { role, diagnostic } => {
                assert_eq!(*role, ProgramRole::Simulation);
                assert!(!diagnostic.is_empty());
            }
            other => panic!("expected parse error, got {other:?}"),
        }
        assert!(err.to_string().starts_with("failed to parse simulation shader"));
    }

    #[test]
    fn shade_role_cannot_see_frame_index() {
        let err = validate_program(
            ProgramRole::Shade,
            "void main() { fragColor = vec4(float(frameIndex)); }",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RenderError::ShaderParse {
                role: ProgramRole::Shade,
                ..
            }
        ));
    }
}
