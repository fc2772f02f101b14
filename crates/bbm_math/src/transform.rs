// Transform utilities for DMat4
//
// `Transform` is the decomposed local basis of a scene object. `DMat4Ext`
// adds the few matrix helpers the importer needs on top of glam.

use glam::{DMat4, DQuat, DVec3};

/// Transform components that can be composed into a matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Translation
    pub translation: DVec3,

    /// Rotation (as quaternion)
    pub rotation: DQuat,

    /// Scale
    pub scale: DVec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: DVec3::ZERO,
            rotation: DQuat::IDENTITY,
            scale: DVec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform with only translation.
    pub fn from_translation(translation: DVec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Create a new transform from a 4x4 matrix.
    ///
    /// Decomposes the matrix into translation, rotation (quaternion), and
    /// scale. No Euler angles are involved.
    pub fn from_matrix(matrix: DMat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// Convert to a 4x4 transformation matrix.
    ///
    /// Order: Scale -> Rotate -> Translate (SRT)
    pub fn to_matrix(&self) -> DMat4 {
        DMat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Rotate in place, applying `rotation` after the current rotation.
    pub fn rotate(&mut self, rotation: DQuat) {
        self.rotation = (rotation * self.rotation).normalize();
    }
}

/// Extension trait for DMat4 to provide additional transform utilities
pub trait DMat4Ext {
    /// The translation column of an affine matrix.
    fn translation(&self) -> DVec3;

    /// Component-wise comparison within `epsilon`.
    fn approx_eq(&self, other: &DMat4, epsilon: f64) -> bool;
}

impl DMat4Ext for DMat4 {
    fn translation(&self) -> DVec3 {
        self.w_axis.truncate()
    }

    fn approx_eq(&self, other: &DMat4, epsilon: f64) -> bool {
        self.to_cols_array()
            .iter()
            .zip(other.to_cols_array().iter())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }
}
