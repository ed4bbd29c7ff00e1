//! The demo scene: a spinning torus and polyhedra on a checker floor.
//!
//! The solids are textured with a checkerboard and the floor with grid lines.

use glam::Vec3;
use prism_rhi::vertex::Vertex;

use crate::geometry;
use crate::texture::{self, CHECKER, GRID};
use crate::transform::AnimatedTransform;

/// CPU-side description of one drawable object.
#[derive(Clone, Debug)]
pub struct SceneObject {
    pub name: &'static str,
    pub vertices: Vec<Vertex>,
    pub transform: AnimatedTransform,
    /// Index into [`texture::demo_textures`].
    pub texture: usize,
}

impl SceneObject {
    pub fn new(name: &'static str, vertices: Vec<Vertex>, transform: AnimatedTransform, texture: usize) -> Self {
        Self {
            name,
            vertices,
            transform,
            texture,
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }
}

/// Where the camera starts and returns to on reset.
pub const CAMERA_HOME: Vec3 = Vec3::new(0.0, 3.5, 9.0);
/// What the camera looks at from [`CAMERA_HOME`].
pub const CAMERA_TARGET: Vec3 = Vec3::new(0.0, 1.0, -1.0);

const WARM: [Vec3; 3] = [
    Vec3::new(0.95, 0.45, 0.25),
    Vec3::new(0.85, 0.30, 0.20),
    Vec3::new(1.00, 0.65, 0.30),
];
const COOL: [Vec3; 3] = [
    Vec3::new(0.25, 0.55, 0.95),
    Vec3::new(0.20, 0.40, 0.80),
    Vec3::new(0.35, 0.75, 0.95),
];
const GREEN: [Vec3; 2] = [Vec3::new(0.35, 0.80, 0.40), Vec3::new(0.20, 0.60, 0.30)];
const VIOLET: [Vec3; 2] = [Vec3::new(0.65, 0.40, 0.90), Vec3::new(0.50, 0.30, 0.75)];
const GOLD: [Vec3; 2] = [Vec3::new(0.95, 0.80, 0.30), Vec3::new(0.80, 0.65, 0.20)];

/// Builds the demo scene. The floor is the only static object.
pub fn demo_scene() -> Vec<SceneObject> {
    vec![
        SceneObject::new(
            "torus",
            geometry::torus(1.0, 0.35, 48, 24, &GOLD),
            AnimatedTransform::new(Vec3::new(0.0, 1.6, 0.0), Vec3::new(1.0, 1.0, 0.0), 40.0),
            CHECKER,
        ),
        SceneObject::new(
            "tetrahedron",
            geometry::tetrahedron(0.9, &WARM),
            AnimatedTransform::new(Vec3::new(-3.0, 1.0, 0.5), Vec3::Y, 90.0),
            CHECKER,
        ),
        SceneObject::new(
            "cube",
            geometry::cube(0.6, &COOL),
            AnimatedTransform::new(Vec3::new(3.0, 1.0, 0.5), Vec3::new(1.0, 0.0, 1.0), 60.0),
            CHECKER,
        ),
        SceneObject::new(
            "octahedron",
            geometry::octahedron(0.9, &GREEN),
            AnimatedTransform::new(Vec3::new(-2.5, 1.2, -3.5), Vec3::X, 30.0),
            CHECKER,
        ),
        SceneObject::new(
            "icosahedron",
            geometry::icosahedron(0.9, &VIOLET),
            AnimatedTransform::new(Vec3::new(2.5, 1.2, -3.5), Vec3::Z, -120.0),
            CHECKER,
        ),
        SceneObject::new(
            "floor",
            geometry::floor(20.0, 20, Vec3::splat(0.75), Vec3::splat(0.35)),
            AnimatedTransform::fixed(Vec3::ZERO),
            GRID,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_scene_objects() {
        let scene = demo_scene();
        let names: Vec<&str> = scene.iter().map(|o| o.name).collect();
        assert_eq!(
            names,
            ["torus", "tetrahedron", "cube", "octahedron", "icosahedron", "floor"]
        );
        assert!(scene.iter().all(|o| o.vertex_count() > 0));
        assert!(scene.iter().all(|o| o.vertex_count().is_multiple_of(3)));
    }

    #[test]
    fn test_only_floor_is_static() {
        let statics: Vec<&str> = demo_scene()
            .iter()
            .filter(|o| o.transform.is_static())
            .map(|o| o.name)
            .collect();
        assert_eq!(statics, ["floor"]);
    }

    #[test]
    fn test_textures_exist() {
        let count = texture::demo_textures().len();
        assert!(demo_scene().iter().all(|o| o.texture < count));
    }

    #[test]
    fn test_floor_uses_grid_texture() {
        let scene = demo_scene();
        let floor = scene.iter().find(|o| o.name == "floor").unwrap();
        assert_eq!(floor.texture, GRID);
        assert!(scene.iter().filter(|o| o.name != "floor").all(|o| o.texture == CHECKER));
    }

    #[test]
    fn test_camera_home_sees_scene() {
        let to_target = CAMERA_TARGET - CAMERA_HOME;
        assert!(to_target.z < 0.0);
        assert!(to_target.y < 0.0);
    }
}
