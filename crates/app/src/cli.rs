//! Command-line options.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use prism_renderer::{MAX_FRAMES_IN_FLIGHT, RendererConfig, SurfacePolicy};

/// Real-time Vulkan demo: animated meshes under a fly camera.
///
/// Controls: W/A/S/D move, Q/E down/up, arrow keys look, R reset camera,
/// Space pause animation, F wireframe, Escape quit.
#[derive(Parser, Debug)]
#[command(name = "prism", version, about)]
pub struct Cli {
    /// Initial window width in pixels
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Initial window height in pixels
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Frames the CPU may record ahead of the GPU
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=MAX_FRAMES_IN_FLIGHT as i64))]
    pub frames_in_flight: u8,

    /// Sync presentation to the display refresh (default)
    #[arg(long, overrides_with = "no_vsync")]
    pub vsync: bool,

    /// Present as fast as possible (mailbox or immediate when available)
    #[arg(long, overrides_with = "vsync")]
    pub no_vsync: bool,

    /// Longest wait for a swapchain image before the frame is skipped
    #[arg(long, default_value_t = 1000, value_name = "MS")]
    pub acquire_timeout_ms: u64,

    /// Start in wireframe mode
    #[arg(long)]
    pub wireframe: bool,

    /// Enable the Khronos validation layer (default in debug builds)
    #[arg(long, overrides_with = "no_validation")]
    pub validation: bool,

    /// Disable the Khronos validation layer
    #[arg(long, overrides_with = "validation")]
    pub no_validation: bool,

    /// Directory containing scene.vert.spv and scene.frag.spv
    #[arg(long, default_value = "shaders/spirv")]
    pub shader_dir: PathBuf,

    /// Rebuild the swapchain when the window changes instead of exiting
    #[arg(long)]
    pub recreate_on_resize: bool,

    /// Log filter used when RUST_LOG is unset, e.g. "debug" or "info,prism_renderer=trace"
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn renderer_config(&self) -> RendererConfig {
        let defaults = RendererConfig::default();

        let validation = if self.validation {
            true
        } else if self.no_validation {
            false
        } else {
            defaults.validation
        };

        RendererConfig {
            width: self.width,
            height: self.height,
            frames_in_flight: usize::from(self.frames_in_flight),
            vsync: !self.no_vsync,
            acquire_timeout: Duration::from_millis(self.acquire_timeout_ms),
            wireframe: self.wireframe,
            validation,
            shader_dir: self.shader_dir.clone(),
            surface_policy: if self.recreate_on_resize {
                SurfacePolicy::Recreate
            } else {
                SurfacePolicy::Fatal
            },
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("prism").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]).unwrap();
        let config = cli.renderer_config();

        assert_eq!((config.width, config.height), (1280, 720));
        assert_eq!(config.frames_in_flight, 2);
        assert!(config.vsync);
        assert_eq!(config.acquire_timeout, Duration::from_secs(1));
        assert_eq!(config.surface_policy, SurfacePolicy::Fatal);
        assert_eq!(config.validation, cfg!(debug_assertions));
        assert_eq!(cli.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags() {
        let cli = parse(&[
            "--width",
            "800",
            "--frames-in-flight",
            "3",
            "--no-vsync",
            "--wireframe",
            "--recreate-on-resize",
            "--shader-dir",
            "build/spv",
        ])
        .unwrap();
        let config = cli.renderer_config();

        assert_eq!(config.width, 800);
        assert_eq!(config.frames_in_flight, 3);
        assert!(!config.vsync);
        assert!(config.wireframe);
        assert_eq!(config.surface_policy, SurfacePolicy::Recreate);
        assert_eq!(config.shader_dir, PathBuf::from("build/spv"));
    }

    #[test]
    fn test_last_toggle_wins() {
        let cli = parse(&["--no-vsync", "--vsync"]).unwrap();
        assert!(cli.renderer_config().vsync);

        let cli = parse(&["--validation", "--no-validation"]).unwrap();
        assert!(!cli.renderer_config().validation);
    }

    #[test]
    fn test_frames_in_flight_range() {
        assert!(parse(&["--frames-in-flight", "0"]).is_err());
        assert!(parse(&["--frames-in-flight", "5"]).is_err());
        assert!(parse(&["--frames-in-flight", "4"]).is_ok());
    }
}
