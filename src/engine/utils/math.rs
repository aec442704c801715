/// 4x4 matrix stored row-major: element (row, col) lives at `row * 4 + col`.
pub type Mat4x4 = [f32; 16];

pub fn mat4x4_identity() -> Mat4x4 {
    [
      1.0, 0.0, 0.0, 0.0,
      0.0, 1.0, 0.0, 0.0,
      0.0, 0.0, 1.0, 0.0,
      0.0, 0.0, 0.0, 1.0
    ]
}

pub fn mat4x4_translate(x: f32, y: f32, z: f32) -> Mat4x4 {
    [
      1.0, 0.0, 0.0,  x,
      0.0, 1.0, 0.0,  y,
      0.0, 0.0, 1.0,  z,
      0.0, 0.0, 0.0, 1.0
    ]
}

pub fn mat4x4_rot_x(angle: f32) -> Mat4x4 {
    let c = angle.cos();
    let s = angle.sin();

    [
      1.0, 0.0, 0.0, 0.0,
      0.0,  c,  -s,  0.0,
      0.0,  s,   c,  0.0,
      0.0, 0.0, 0.0, 1.0
    ]
}

pub fn mat4x4_rot_y(angle: f32) -> Mat4x4 {
    let c = angle.cos();
    let s = angle.sin();

    [
       c,  0.0,  s,  0.0,
      0.0, 1.0, 0.0, 0.0,
      -s,  0.0,  c,  0.0,
      0.0, 0.0, 0.0, 1.0
    ]
}

pub fn mat4x4_rot_z(angle: f32) -> Mat4x4 {
    let c = angle.cos();
    let s = angle.sin();

    [
       c,  -s,  0.0, 0.0,
       s,   c,  0.0, 0.0,
      0.0, 0.0, 1.0, 0.0,
      0.0, 0.0, 0.0, 1.0
    ]
}

pub fn mat4x4_scale(x: f32, y: f32, z: f32) -> Mat4x4 {
    [
       x,  0.0, 0.0, 0.0,
      0.0,  y,  0.0, 0.0,
      0.0, 0.0,  z,  0.0,
      0.0, 0.0, 0.0, 1.0
    ]
}

pub fn mat4x4_transpose(matrix: Mat4x4) -> Mat4x4 {
    let mut ret = [0.0; 16];
    for i in 0..16 {
        let row = i / 4;
        let col = i % 4;
        ret[col * 4 + row] = matrix[row * 4 + col];
    }
    ret
}

pub fn vec4_dot(a: [f32; 4], b: [f32; 4]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}

pub fn mat4x4_row(mat: &Mat4x4, row: usize) -> [f32; 4] {
    let start_idx = row * 4;
    [mat[start_idx], mat[start_idx + 1], mat[start_idx + 2], mat[start_idx + 3]]
}

pub fn mat4x4_col(mat: &Mat4x4, col: usize) -> [f32; 4] {
    [mat[col], mat[4 + col], mat[8 + col], mat[12 + col]]
}

pub fn mat4x4_mul(a: Mat4x4, b: Mat4x4) -> Mat4x4 {
    let mut ret = [0.0; 16];
    for (i, out) in ret.iter_mut().enumerate() {
        let row = i / 4;
        let col = i % 4;
        *out = vec4_dot(mat4x4_row(&a, row), mat4x4_col(&b, col));
    }
    ret
}

pub fn mat4x4_perspective(fov_y_radians: f32, aspect_ratio: f32, near: f32, far: f32) -> Mat4x4 {
    let f = 1.0 / (fov_y_radians * 0.5).tan();
    let range_inv = 1.0 / (near - far);

    [
        f / aspect_ratio, 0.0, 0.0,                          0.0,
        0.0,              f,   0.0,                          0.0,
        0.0,              0.0, (near + far) * range_inv,     (2.0 * near * far) * range_inv,
        0.0,              0.0, -1.0,                         0.0,
    ]
}

/// Lays a matrix out column-major, the order `uniform_matrix_4` expects with
/// `transpose = false`. Pure reordering; no element is modified.
pub fn flatten(matrix: &Mat4x4) -> [f32; 16] {
    let mut out = [0.0; 16];
    for col in 0..4 {
        out[col * 4..col * 4 + 4].copy_from_slice(&mat4x4_col(matrix, col));
    }
    out
}

/// Reads a column-major buffer produced by [`flatten`] back into a `Mat4x4`.
pub fn unflatten(column_major: &[f32; 16]) -> Mat4x4 {
    let mut out = [0.0; 16];
    for col in 0..4 {
        for row in 0..4 {
            out[row * 4 + col] = column_major[col * 4 + row];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    fn to_matrix(values: &[f32]) -> Mat4x4 {
        let mut m = [0.0; 16];
        for (dst, src) in m.iter_mut().zip(values.iter().cycle()) {
            *dst = *src;
        }
        m
    }

    #[quickcheck]
    fn flatten_round_trips_bit_for_bit(values: Vec<f32>) -> bool {
        if values.is_empty() {
            return true;
        }
        let m = to_matrix(&values);
        let back = unflatten(&flatten(&m));
        m.iter().zip(back.iter()).all(|(a, b)| a.to_bits() == b.to_bits())
    }

    #[quickcheck]
    fn flatten_matches_transpose(values: Vec<f32>) -> bool {
        if values.is_empty() {
            return true;
        }
        let m = to_matrix(&values);
        flatten(&m)
            .iter()
            .zip(mat4x4_transpose(m).iter())
            .all(|(a, b)| a.to_bits() == b.to_bits())
    }

    #[test]
    fn flattened_translation_lands_in_last_column() {
        let flat = flatten(&mat4x4_translate(2.0, 3.0, 4.0));
        assert_eq!(&flat[12..16], &[2.0, 3.0, 4.0, 1.0]);
        assert_eq!(&flat[0..4], &[1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn identity_is_neutral_for_mul() {
        let m = mat4x4_mul(mat4x4_translate(1.0, 2.0, 3.0), mat4x4_scale(2.0, 2.0, 2.0));
        assert_eq!(mat4x4_mul(mat4x4_identity(), m), m);
        assert_eq!(mat4x4_mul(m, mat4x4_identity()), m);
    }

    #[test]
    fn translate_then_scale_order() {
        let m = mat4x4_mul(mat4x4_translate(1.0, 0.0, 0.0), mat4x4_scale(2.0, 2.0, 2.0));
        let p = [1.0, 0.0, 0.0, 1.0];
        let x = vec4_dot(mat4x4_row(&m, 0), p);
        assert_eq!(x, 3.0);
    }

    #[test]
    fn quarter_turn_about_z_maps_x_to_y() {
        let m = mat4x4_rot_z(std::f32::consts::FRAC_PI_2);
        let p = [1.0, 0.0, 0.0, 1.0];
        let y = vec4_dot(mat4x4_row(&m, 1), p);
        assert!((y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn quarter_turn_about_y_maps_x_to_negative_z() {
        let m = mat4x4_rot_y(std::f32::consts::FRAC_PI_2);
        let p = [1.0, 0.0, 0.0, 1.0];
        let z = vec4_dot(mat4x4_row(&m, 2), p);
        assert!((z + 1.0).abs() < 1e-6);
    }
}
