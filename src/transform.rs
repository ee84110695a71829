use std::ops::Neg;

use nalgebra::{Matrix4, Point3, Unit, Vector3};

/// A rigid transform with an optional uniform scale. The inverse is maintained alongside the
/// matrix, so that world-to-local mappings never require a general matrix inversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    matrix: Matrix4<f32>,
    inverse: Matrix4<f32>,
    scale_factor: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    pub fn new() -> Self {
        Self {
            matrix: Matrix4::identity(),
            inverse: Matrix4::identity(),
            scale_factor: 1.0,
        }
    }

    /// Build the transform that maps a local frame with the given orthonormal axes onto `origin`.
    pub fn from_frame(
        x: &Unit<Vector3<f32>>,
        y: &Unit<Vector3<f32>>,
        z: &Unit<Vector3<f32>>,
        origin: &Point3<f32>,
    ) -> Self {
        #[rustfmt::skip]
        let rotation = Matrix4::new(
            x.x, y.x, z.x, 0.,
            x.y, y.y, z.y, 0.,
            x.z, y.z, z.z, 0.,
            0.,  0.,  0.,  1.,
        );

        // The transpose of an orthonormal basis is its inverse.
        let inverse = rotation.transpose();

        Self {
            matrix: rotation,
            inverse,
            scale_factor: 1.0,
        }
        .translate(&origin.coords)
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    /// The world-to-local matrix.
    pub fn inverse(&self) -> &Matrix4<f32> {
        &self.inverse
    }

    /// Append a translation to this transform.
    pub fn translate(mut self, vec: &Vector3<f32>) -> Self {
        self.matrix.append_translation_mut(vec);
        self.inverse.prepend_translation_mut(&vec.neg());
        self
    }

    /// Append a uniform scaling to this transform.
    pub fn uniform_scale(mut self, amount: f32) -> Self {
        self.matrix.append_scaling_mut(amount);
        self.inverse.prepend_scaling_mut(1.0 / amount);
        self.scale_factor *= amount;
        self
    }

    /// Append an axis-angle rotation to the transform.
    pub fn rotate(mut self, axisangle: &Vector3<f32>) -> Self {
        let rotation = Matrix4::new_rotation(*axisangle);
        self.matrix = rotation * self.matrix;
        self.inverse *= Matrix4::new_rotation(axisangle.neg());
        self
    }
}

pub trait ApplyTransform {
    fn apply(&self, transform: &Transform) -> Self;
    fn invert(&self, transform: &Transform) -> Self;
}

impl ApplyTransform for Point3<f32> {
    #[inline]
    fn apply(&self, transform: &Transform) -> Self {
        transform.matrix.transform_point(self)
    }

    #[inline]
    fn invert(&self, transform: &Transform) -> Self {
        transform.inverse.transform_point(self)
    }
}

impl ApplyTransform for Vector3<f32> {
    #[inline]
    fn apply(&self, transform: &Transform) -> Self {
        transform.matrix.transform_vector(self)
    }

    #[inline]
    fn invert(&self, transform: &Transform) -> Self {
        transform.inverse.transform_vector(self)
    }
}
