//! Cube geometry.
//!
//! All three cube layouts come from one corner table and a quad-per-face
//! table; only the color policy and whether corners are shared differ.

use super::mesh::Geometry;

pub type Vec3 = [f32; 3];
pub type Color = [f32; 4];

pub const RED: Color = [1.0, 0.0, 0.0, 1.0];
pub const ORANGE: Color = [1.0, 0.5, 0.0, 1.0];
pub const GREEN: Color = [0.0, 1.0, 0.0, 1.0];
pub const BLUE: Color = [0.0, 0.0, 1.0, 1.0];
pub const YELLOW: Color = [1.0, 1.0, 0.0, 1.0];
pub const MAGENTA: Color = [1.0, 0.0, 1.0, 1.0];
pub const CYAN: Color = [0.0, 1.0, 1.0, 1.0];

/// Unit cube corners: 0..4 on the front (z = +1) face, 4..8 on the back.
pub const CUBE_CORNERS: [Vec3; 8] = [
    [-1.0, -1.0,  1.0],
    [ 1.0, -1.0,  1.0],
    [ 1.0,  1.0,  1.0],
    [-1.0,  1.0,  1.0],
    [-1.0, -1.0, -1.0],
    [ 1.0, -1.0, -1.0],
    [ 1.0,  1.0, -1.0],
    [-1.0,  1.0, -1.0],
];

/// Faces wound counter-clockwise seen from outside, in the order
/// front, back, top, bottom, right, left.
pub const OUTWARD_FACES: [[u16; 4]; 6] = [
    [0, 1, 2, 3],
    [4, 7, 6, 5],
    [7, 3, 2, 6],
    [4, 5, 1, 0],
    [5, 6, 2, 1],
    [4, 0, 3, 7],
];

/// Face quads for the shared-corner cubes: front, back, bottom, top, left, right.
pub const SHARED_FACES: [[u16; 4]; 6] = [
    [0, 1, 2, 3],
    [4, 5, 6, 7],
    [0, 1, 5, 4],
    [2, 3, 7, 6],
    [0, 3, 7, 4],
    [1, 2, 6, 5],
];

/// Front orange, back green, top blue, bottom yellow, right magenta, left cyan.
pub const DEFAULT_FACE_COLORS: [Color; 6] = [ORANGE, GREEN, BLUE, YELLOW, MAGENTA, CYAN];

/// Fan triangulation of a convex planar quad: `(v0, v1, v2)` and `(v0, v2, v3)`.
pub fn triangulate_quad<T: Copy>(quad: [T; 4]) -> [[T; 3]; 2] {
    let [v0, v1, v2, v3] = quad;
    [[v0, v1, v2], [v0, v2, v3]]
}

/// Triangle list for a sequence of quads, six entries per quad.
pub fn triangulate_quads<T: Copy>(quads: &[[T; 4]]) -> Vec<T> {
    quads
        .iter()
        .flat_map(|&quad| triangulate_quad(quad))
        .flatten()
        .collect()
}

/// 36-entry index list over [`CUBE_CORNERS`].
pub fn cube_indices() -> Vec<u16> {
    triangulate_quads(&SHARED_FACES)
}

fn scaled_corners(half_extent: f32) -> Vec<f32> {
    CUBE_CORNERS
        .iter()
        .flatten()
        .map(|c| c * half_extent)
        .collect()
}

/// 36 unshared vertices, each face flat-shaded with its own color.
pub fn face_colored_cube(half_extent: f32, face_colors: [Color; 6]) -> Geometry {
    let mut positions = Vec::with_capacity(36 * 3);
    let mut colors = Vec::with_capacity(36 * 4);
    for (face, color) in OUTWARD_FACES.iter().zip(face_colors) {
        for corner in triangulate_quad(*face).into_iter().flatten() {
            positions.extend(CUBE_CORNERS[usize::from(corner)].map(|c| c * half_extent));
            colors.extend_from_slice(&color);
        }
    }
    Geometry::from_trusted(positions, colors, None)
}

/// 8 shared corners, one color per corner, drawn through [`cube_indices`].
pub fn vertex_colored_cube(half_extent: f32, corner_colors: [Color; 8]) -> Geometry {
    let colors = corner_colors.iter().flatten().copied().collect();
    Geometry::from_trusted(scaled_corners(half_extent), colors, Some(cube_indices()))
}

/// Indexed cube with the front four corners in `front` and the back four in `back`.
pub fn two_tone_cube(half_extent: f32, front: Color, back: Color) -> Geometry {
    vertex_colored_cube(
        half_extent,
        [front, front, front, front, back, back, back, back],
    )
}

/// The stock cube layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubeVariant {
    /// 36 vertices, flat color per face, `draw_arrays`.
    FaceColored,
    /// 8 corners, red front / orange back, indexed.
    TwoTone,
    /// 8 corners, magenta front / cyan back, indexed.
    VertexColored,
}

impl CubeVariant {
    pub const ALL: [CubeVariant; 3] = [
        CubeVariant::FaceColored,
        CubeVariant::TwoTone,
        CubeVariant::VertexColored,
    ];

    pub fn geometry(self, half_extent: f32) -> Geometry {
        match self {
            CubeVariant::FaceColored => face_colored_cube(half_extent, DEFAULT_FACE_COLORS),
            CubeVariant::TwoTone => two_tone_cube(half_extent, RED, ORANGE),
            CubeVariant::VertexColored => two_tone_cube(half_extent, MAGENTA, CYAN),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CubeVariant::FaceColored => "face-colored",
            CubeVariant::TwoTone => "two-tone",
            CubeVariant::VertexColored => "vertex-colored",
        }
    }
}
