//! World transforms uploaded to the `uWorld` uniform.

use cgmath::{Matrix4, Rad};

/// A 4x4 float matrix in column-major order, laid out the way WGSL's
/// `mat4x4<f32>` expects it.
/// Built on the stack each frame; uploads copy it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transform([f32; 16]);

impl Transform {
    pub const IDENTITY: Transform = Transform([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]);

    /// Rotation of `angle` radians about the vertical (Y) axis.
    pub fn rotation_y(angle: f32) -> Self {
        Matrix4::from_angle_y(Rad(angle)).into()
    }

    pub fn as_array(&self) -> &[f32; 16] {
        &self.0
    }

    /// Largest absolute component-wise difference to `other`.
    pub fn max_difference(&self, other: &Transform) -> f32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f32::max)
    }
}

impl From<Matrix4<f32>> for Transform {
    fn from(matrix: Matrix4<f32>) -> Self {
        let columns: [[f32; 4]; 4] = matrix.into();
        Self(bytemuck::cast(columns))
    }
}

impl From<[f32; 16]> for Transform {
    fn from(raw: [f32; 16]) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::{FRAC_PI_2, PI, TAU};

    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn zero_angle_is_identity() {
        assert_eq!(Transform::rotation_y(0.0), Transform::IDENTITY);
    }

    #[test]
    fn full_turn_matches_start() {
        for angle in [0.0, 0.3, 1.0, PI, 5.5, 42.0] {
            let a = Transform::rotation_y(angle);
            let b = Transform::rotation_y(angle + TAU);
            assert!(a.max_difference(&b) < 1e-4, "angle {angle}");
        }
    }

    #[test]
    fn quarter_turn_is_column_major() {
        let m = Transform::rotation_y(FRAC_PI_2);
        let raw = m.as_array();
        // first column is the image of +X, which a quarter turn about Y sends to -Z
        assert!((raw[0]).abs() < EPS);
        assert!((raw[2] + 1.0).abs() < EPS);
        // Y axis untouched
        assert!((raw[5] - 1.0).abs() < EPS);
        assert!((raw[15] - 1.0).abs() < EPS);
    }
}
