//! Scene description for the demo.
//!
//! - Camera and keyboard fly controller
//! - Animated per-object transforms
//! - Procedural flat-shaded geometry
//! - Procedural textures
//! - The fixed demo scene

pub mod camera;
pub mod demo;
pub mod geometry;
pub mod texture;
pub mod transform;

pub use camera::{Camera, CameraInput, FpsController, Projection};
pub use demo::{SceneObject, demo_scene};
pub use texture::{TextureData, demo_textures};
pub use transform::AnimatedTransform;
