//! Procedural meshes.
//!
//! Every generator returns a non-indexed triangle list with flat shading: the
//! three vertices of a triangle share its face normal and color. Triangles
//! are wound counter-clockwise when seen from the side their normal points
//! to, which is the front face for back-face culling.
//!
//! Texture coordinates assume a repeating sampler: quads span 0..1, each
//! polyhedron face maps one triangle of texture space, and the torus wraps
//! its texture several times around both circles.

use std::f32::consts::TAU;

use glam::{Vec2, Vec3};
use prism_rhi::vertex::Vertex;

/// UVs of one polyhedron face.
const TRIANGLE_UV: [Vec2; 3] = [Vec2::new(0.5, 0.0), Vec2::new(0.0, 1.0), Vec2::new(1.0, 1.0)];
/// UVs of a quad's corners, counter-clockwise from the bottom left.
const QUAD_UV: [Vec2; 4] = [
    Vec2::new(0.0, 1.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(0.0, 0.0),
];
/// How often the torus texture repeats around the ring and the tube.
const TORUS_UV_REPEAT: Vec2 = Vec2::new(8.0, 2.0);

/// Appends one triangle, flipping its winding if the face normal points
/// away from `outward`. Each UV stays with its corner.
fn push_facing(out: &mut Vec<Vertex>, [a, b, c]: [(Vec3, Vec2); 3], outward: Vec3, color: Vec3) {
    let mut normal = (b.0 - a.0).cross(c.0 - a.0).normalize_or_zero();
    let (b, c) = if normal.dot(outward) < 0.0 {
        normal = -normal;
        (c, b)
    } else {
        (b, c)
    };
    out.extend([a, b, c].map(|(position, uv)| Vertex::new(position, normal, color, uv)));
}

/// Appends the two triangles of quad `[p0, p1, p2, p3]`.
fn push_quad(out: &mut Vec<Vertex>, p: [Vec3; 4], uv: [Vec2; 4], outward: Vec3, color: Vec3) {
    push_facing(out, [(p[0], uv[0]), (p[1], uv[1]), (p[2], uv[2])], outward, color);
    push_facing(out, [(p[0], uv[0]), (p[2], uv[2]), (p[3], uv[3])], outward, color);
}

/// Appends a triangle of a convex solid centred on the origin.
fn push_convex(out: &mut Vec<Vertex>, [a, b, c]: [Vec3; 3], color: Vec3) {
    let centroid = (a + b + c) / 3.0;
    let [ua, ub, uc] = TRIANGLE_UV;
    push_facing(out, [(a, ua), (b, ub), (c, uc)], centroid, color);
}

fn palette_color(palette: &[Vec3], index: usize) -> Vec3 {
    if palette.is_empty() {
        Vec3::ONE
    } else {
        palette[index % palette.len()]
    }
}

/// Regular tetrahedron inscribed in a sphere of `radius`.
pub fn tetrahedron(radius: f32, palette: &[Vec3]) -> Vec<Vertex> {
    let corners = [
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(-1.0, 1.0, -1.0),
        Vec3::new(-1.0, -1.0, 1.0),
    ]
    .map(|p| p.normalize() * radius);

    const FACES: [[usize; 3]; 4] = [[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]];

    let mut out = Vec::with_capacity(FACES.len() * 3);
    for (i, [a, b, c]) in FACES.into_iter().enumerate() {
        push_convex(&mut out, [corners[a], corners[b], corners[c]], palette_color(palette, i));
    }
    out
}

/// Axis-aligned cube with side `2 * half_extent`, one color per face.
pub fn cube(half_extent: f32, palette: &[Vec3]) -> Vec<Vertex> {
    // (normal, u, v) per face.
    let faces = [
        (Vec3::X, Vec3::Y, Vec3::Z),
        (Vec3::NEG_X, Vec3::Y, Vec3::Z),
        (Vec3::Y, Vec3::Z, Vec3::X),
        (Vec3::NEG_Y, Vec3::Z, Vec3::X),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::X, Vec3::Y),
    ];

    let mut out = Vec::with_capacity(36);
    for (i, (normal, u, v)) in faces.into_iter().enumerate() {
        let center = normal * half_extent;
        let (u, v) = (u * half_extent, v * half_extent);
        let quad = [center - u - v, center + u - v, center + u + v, center - u + v];
        push_quad(&mut out, quad, QUAD_UV, normal, palette_color(palette, i));
    }
    out
}

/// Regular octahedron with vertices at distance `radius` on each axis.
pub fn octahedron(radius: f32, palette: &[Vec3]) -> Vec<Vertex> {
    let mut out = Vec::with_capacity(24);
    let mut face = 0;
    for sx in [1.0, -1.0] {
        for sy in [1.0, -1.0] {
            for sz in [1.0, -1.0] {
                let corners = [
                    Vec3::X * sx * radius,
                    Vec3::Y * sy * radius,
                    Vec3::Z * sz * radius,
                ];
                push_convex(&mut out, corners, palette_color(palette, face));
                face += 1;
            }
        }
    }
    out
}

/// Regular icosahedron inscribed in a sphere of `radius`.
pub fn icosahedron(radius: f32, palette: &[Vec3]) -> Vec<Vertex> {
    let phi = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let corners = [
        Vec3::new(-1.0, phi, 0.0),
        Vec3::new(1.0, phi, 0.0),
        Vec3::new(-1.0, -phi, 0.0),
        Vec3::new(1.0, -phi, 0.0),
        Vec3::new(0.0, -1.0, phi),
        Vec3::new(0.0, 1.0, phi),
        Vec3::new(0.0, -1.0, -phi),
        Vec3::new(0.0, 1.0, -phi),
        Vec3::new(phi, 0.0, -1.0),
        Vec3::new(phi, 0.0, 1.0),
        Vec3::new(-phi, 0.0, -1.0),
        Vec3::new(-phi, 0.0, 1.0),
    ]
    .map(|p| p.normalize() * radius);

    const FACES: [[usize; 3]; 20] = [
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    let mut out = Vec::with_capacity(FACES.len() * 3);
    for (i, [a, b, c]) in FACES.into_iter().enumerate() {
        push_convex(&mut out, [corners[a], corners[b], corners[c]], palette_color(palette, i));
    }
    out
}

/// Torus around the Y axis.
///
/// `major_radius` is the distance from the center to the tube center,
/// `minor_radius` the tube radius. Segment counts below 3 are raised to 3.
/// Faces alternate through `palette` in a checker pattern.
/// The texture repeats [`TORUS_UV_REPEAT`] times around each circle.
pub fn torus(
    major_radius: f32,
    minor_radius: f32,
    major_segments: u32,
    minor_segments: u32,
    palette: &[Vec3],
) -> Vec<Vertex> {
    let major_segments = major_segments.max(3);
    let minor_segments = minor_segments.max(3);

    let point = |i: u32, j: u32| {
        let u = TAU * (i % major_segments) as f32 / major_segments as f32;
        let v = TAU * (j % minor_segments) as f32 / minor_segments as f32;
        let ring = major_radius + minor_radius * v.cos();
        Vec3::new(ring * u.cos(), minor_radius * v.sin(), ring * u.sin())
    };
    // Not wrapped: the seam at i == major_segments lands on a whole repeat.
    let uv = |i: u32, j: u32| {
        Vec2::new(
            i as f32 / major_segments as f32,
            j as f32 / minor_segments as f32,
        ) * TORUS_UV_REPEAT
    };

    let mut out = Vec::with_capacity((major_segments * minor_segments * 6) as usize);
    for i in 0..major_segments {
        let u_mid = TAU * (i as f32 + 0.5) / major_segments as f32;
        let tube_center = Vec3::new(u_mid.cos(), 0.0, u_mid.sin()) * major_radius;

        for j in 0..minor_segments {
            let corners = [(i, j), (i + 1, j), (i + 1, j + 1), (i, j + 1)];
            let quad = corners.map(|(a, b)| point(a, b));
            let centroid = (quad[0] + quad[1] + quad[2] + quad[3]) / 4.0;
            let outward = centroid - tube_center;
            let color = palette_color(palette, (i + j) as usize);

            push_quad(&mut out, quad, corners.map(|(a, b)| uv(a, b)), outward, color);
        }
    }
    out
}

/// Square floor in the XZ plane facing +Y, `size` wide and split into
/// `divisions * divisions` checker tiles alternating `light` and `dark`.
///
/// UVs advance by one per tile, so a repeating texture repeats once per tile.
pub fn floor(size: f32, divisions: u32, light: Vec3, dark: Vec3) -> Vec<Vertex> {
    let divisions = divisions.max(1);
    let tile = size / divisions as f32;
    let origin = -size / 2.0;

    let mut out = Vec::with_capacity((divisions * divisions * 6) as usize);
    for row in 0..divisions {
        for col in 0..divisions {
            let x0 = origin + col as f32 * tile;
            let z0 = origin + row as f32 * tile;
            let (x1, z1) = (x0 + tile, z0 + tile);
            let color = if (row + col).is_multiple_of(2) { light } else { dark };

            let quad = [
                Vec3::new(x0, 0.0, z0),
                Vec3::new(x0, 0.0, z1),
                Vec3::new(x1, 0.0, z1),
                Vec3::new(x1, 0.0, z0),
            ];
            let uv = quad.map(|p| Vec2::new(p.x - origin, p.z - origin) / tile);
            push_quad(&mut out, quad, uv, Vec3::Y, color);
        }
    }
    out
}

/// Normal implied by the winding of the triangle at `vertices[0..3]`.
#[cfg(test)]
fn winding_normal(vertices: &[Vertex]) -> Vec3 {
    (vertices[1].position - vertices[0].position)
        .cross(vertices[2].position - vertices[0].position)
        .normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-4;

    fn palette() -> [Vec3; 3] {
        [Vec3::X, Vec3::Y, Vec3::Z]
    }

    fn assert_flat_outward(mesh: &[Vertex], center_of: impl Fn(Vec3) -> Vec3) {
        assert_eq!(mesh.len() % 3, 0);
        for triangle in mesh.chunks_exact(3) {
            let normal = triangle[0].normal;
            assert!((normal.length() - 1.0).abs() < EPSILON);
            assert!(triangle.iter().all(|v| v.normal == normal));
            assert!(triangle.iter().all(|v| v.color == triangle[0].color));

            // Winding agrees with the stored normal.
            assert!(winding_normal(triangle).abs_diff_eq(normal, EPSILON));

            let centroid = triangle.iter().map(|v| v.position).sum::<Vec3>() / 3.0;
            assert!(normal.dot(centroid - center_of(centroid)) > 0.0);
        }
    }

    #[test]
    fn test_vertex_counts() {
        assert_eq!(tetrahedron(1.0, &palette()).len(), 12);
        assert_eq!(cube(1.0, &palette()).len(), 36);
        assert_eq!(octahedron(1.0, &palette()).len(), 24);
        assert_eq!(icosahedron(1.0, &palette()).len(), 60);
        assert_eq!(torus(1.0, 0.3, 16, 8, &palette()).len(), 16 * 8 * 6);
        assert_eq!(floor(10.0, 4, Vec3::ONE, Vec3::ZERO).len(), 4 * 4 * 6);
    }

    #[test]
    fn test_convex_solids_face_outward() {
        for mesh in [
            tetrahedron(1.0, &palette()),
            cube(0.5, &palette()),
            octahedron(1.2, &palette()),
            icosahedron(0.8, &palette()),
        ] {
            assert_flat_outward(&mesh, |_| Vec3::ZERO);
        }
    }

    #[test]
    fn test_platonic_vertices_on_sphere() {
        for (mesh, radius) in [
            (tetrahedron(1.5, &palette()), 1.5),
            (octahedron(2.0, &palette()), 2.0),
            (icosahedron(0.7, &palette()), 0.7),
        ] {
            assert!(
                mesh.iter()
                    .all(|v| (v.position.length() - radius).abs() < EPSILON)
            );
        }
    }

    #[test]
    fn test_torus_faces_away_from_tube() {
        let major = 1.0;
        let mesh = torus(major, 0.25, 24, 12, &palette());
        assert_flat_outward(&mesh, |p| {
            let ring = Vec3::new(p.x, 0.0, p.z).normalize_or_zero();
            ring * major
        });
    }

    #[test]
    fn test_torus_clamps_segments() {
        assert_eq!(torus(1.0, 0.2, 1, 0, &palette()).len(), 3 * 3 * 6);
    }

    #[test]
    fn test_floor_is_checkered_and_faces_up() {
        let light = Vec3::splat(0.8);
        let dark = Vec3::splat(0.2);
        let mesh = floor(4.0, 2, light, dark);

        assert!(mesh.iter().all(|v| v.normal.abs_diff_eq(Vec3::Y, EPSILON)));
        for triangle in mesh.chunks_exact(3) {
            assert!(winding_normal(triangle).abs_diff_eq(Vec3::Y, EPSILON));
        }

        // Tiles (0,0) and (0,1) differ.
        assert_eq!(mesh[0].color, light);
        assert_eq!(mesh[6].color, dark);
    }

    #[test]
    fn test_floor_uvs_advance_one_per_tile() {
        let mesh = floor(4.0, 2, Vec3::ONE, Vec3::ZERO);
        let first = mesh[0].uv;
        assert!(first.abs_diff_eq(Vec2::ZERO, EPSILON));

        // Tile (0,1) starts one unit further along u.
        let next = mesh[6].uv;
        assert!(next.abs_diff_eq(Vec2::new(1.0, 0.0), EPSILON));

        let max = mesh.iter().map(|v| v.uv.max_element()).fold(0.0_f32, f32::max);
        assert!((max - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_uvs_follow_corners_when_winding_flips() {
        // Wound clockwise from +Y, so push_facing swaps b and c.
        let corners = [
            (Vec3::ZERO, Vec2::new(0.0, 0.0)),
            (Vec3::X, Vec2::new(1.0, 0.0)),
            (Vec3::Z, Vec2::new(0.0, 1.0)),
        ];
        let mut out = Vec::new();
        push_facing(&mut out, corners, Vec3::Y, Vec3::ONE);

        assert!(winding_normal(&out).abs_diff_eq(Vec3::Y, EPSILON));
        for vertex in &out {
            let (_, uv) = corners
                .iter()
                .find(|(p, _)| *p == vertex.position)
                .copied()
                .unwrap();
            assert_eq!(vertex.uv, uv);
        }
    }

    #[test]
    fn test_cube_faces_cover_unit_uv_square() {
        let mesh = cube(1.0, &palette());
        for face in mesh.chunks_exact(6) {
            let min = face.iter().map(|v| v.uv).fold(Vec2::splat(f32::MAX), Vec2::min);
            let max = face.iter().map(|v| v.uv).fold(Vec2::splat(f32::MIN), Vec2::max);
            assert_eq!((min, max), (Vec2::ZERO, Vec2::ONE));
        }
    }

    #[test]
    fn test_torus_uvs_repeat_across_seam() {
        let mesh = torus(1.0, 0.25, 12, 6, &palette());
        let max = mesh.iter().map(|v| v.uv).fold(Vec2::ZERO, Vec2::max);
        assert!(max.abs_diff_eq(TORUS_UV_REPEAT, EPSILON));
    }

    #[test]
    fn test_empty_palette_defaults_to_white() {
        assert!(cube(1.0, &[]).iter().all(|v| v.color == Vec3::ONE));
    }

    #[test]
    fn test_cube_spans_half_extent() {
        let mesh = cube(0.5, &palette());
        let max = mesh
            .iter()
            .map(|v| v.position.abs().max_element())
            .fold(0.0_f32, f32::max);
        assert!((max - 0.5).abs() < EPSILON);
    }
}
