//! Renderer configuration.

use std::path::PathBuf;
use std::time::Duration;

use prism_core::{Error, Result};

/// Largest supported number of frames in flight.
pub const MAX_FRAMES_IN_FLIGHT: usize = 4;

/// What to do when the swapchain no longer matches the surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SurfacePolicy {
    /// Report the stale surface as an error and stop.
    #[default]
    Fatal,
    /// Rebuild the swapchain and size-dependent resources, then continue.
    Recreate,
}

impl SurfacePolicy {
    /// Whether the swapchain, and with it the camera aspect, tracks the
    /// window size. Under [`SurfacePolicy::Fatal`] the swapchain keeps its
    /// first extent.
    #[inline]
    pub fn follows_window(self) -> bool {
        self == SurfacePolicy::Recreate
    }
}

/// Startup options for [`crate::Renderer`].
#[derive(Clone, Debug)]
pub struct RendererConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub frames_in_flight: usize,
    pub vsync: bool,
    /// Upper bound on the CPU wait for a swapchain image.
    pub acquire_timeout: Duration,
    /// Start with the wireframe pipeline active.
    pub wireframe: bool,
    pub validation: bool,
    /// Directory holding `scene.vert.spv` and `scene.frag.spv`.
    pub shader_dir: PathBuf,
    pub surface_policy: SurfacePolicy,
    pub clear_color: [f32; 4],
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "Prism".to_string(),
            frames_in_flight: 2,
            vsync: true,
            acquire_timeout: Duration::from_millis(1000),
            wireframe: false,
            validation: cfg!(debug_assertions),
            shader_dir: PathBuf::from("shaders/spirv"),
            surface_policy: SurfacePolicy::Fatal,
            clear_color: [0.05, 0.06, 0.09, 1.0],
        }
    }
}

impl RendererConfig {
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_FRAMES_IN_FLIGHT).contains(&self.frames_in_flight) {
            return Err(Error::Config(format!(
                "frames in flight must be between 1 and {}, got {}",
                MAX_FRAMES_IN_FLIGHT, self.frames_in_flight
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(Error::Config(format!(
                "window size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.acquire_timeout.is_zero() {
            return Err(Error::Config("acquire timeout must be non-zero".to_string()));
        }
        Ok(())
    }

    pub fn vertex_shader_path(&self) -> PathBuf {
        self.shader_dir.join("scene.vert.spv")
    }

    pub fn fragment_shader_path(&self) -> PathBuf {
        self.shader_dir.join("scene.frag.spv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = RendererConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.frames_in_flight, 2);
        assert_eq!(config.surface_policy, SurfacePolicy::Fatal);
    }

    #[test]
    fn test_frames_in_flight_range() {
        for frames in [0, MAX_FRAMES_IN_FLIGHT + 1] {
            let config = RendererConfig {
                frames_in_flight: frames,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(Error::Config(_))));
        }

        let config = RendererConfig {
            frames_in_flight: MAX_FRAMES_IN_FLIGHT,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_size_rejected() {
        let config = RendererConfig {
            height: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("1280x0"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = RendererConfig {
            acquire_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_shader_paths() {
        let config = RendererConfig {
            shader_dir: PathBuf::from("out"),
            ..Default::default()
        };
        assert_eq!(config.vertex_shader_path(), PathBuf::from("out/scene.vert.spv"));
        assert_eq!(config.fragment_shader_path(), PathBuf::from("out/scene.frag.spv"));
    }
}
