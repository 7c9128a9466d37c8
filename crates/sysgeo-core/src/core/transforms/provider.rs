use super::decompose::{self, Decomposition};
use super::error::TransformError;
use super::euler::EulerConvention;
use crate::core::models::error::ModelError;
use crate::core::models::pose::Pose;
use nalgebra::{Matrix4, Rotation3, UnitQuaternion};

/// The narrow set of rotation conversions the model, exporter and connector depend on.
///
/// Implementors must be pure: the same input always yields the same output, with no side effects.
pub trait TransformProvider {
    /// Expresses a rotation as Euler angles (radians) in the given convention.
    fn rotation_to_euler(&self, rotation: &Rotation3<f64>, convention: EulerConvention) -> [f64; 3];

    /// Builds a rotation from Euler angles (radians) in the given convention.
    fn euler_to_rotation(&self, angles: [f64; 3], convention: EulerConvention) -> Rotation3<f64>;

    fn rotation_to_quaternion(&self, rotation: &Rotation3<f64>) -> UnitQuaternion<f64>;

    fn quaternion_to_rotation(&self, quaternion: &UnitQuaternion<f64>) -> Rotation3<f64>;

    /// Returns the 4x4 homogeneous matrix of a pose.
    fn to_homogeneous(&self, pose: &Pose) -> Matrix4<f64>;

    /// Builds a pose from a rigid 4x4 homogeneous matrix.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidPose`] if the matrix is not a rigid transform.
    fn from_homogeneous(&self, matrix: &Matrix4<f64>) -> Result<Pose, ModelError>;

    /// Splits an affine 4x4 matrix into translation, scale, shear and rotation.
    ///
    /// # Errors
    ///
    /// Returns a [`TransformError`] if the matrix is non-finite, projective or singular.
    fn decompose(&self, matrix: &Matrix4<f64>) -> Result<Decomposition, TransformError>;
}

/// The default [`TransformProvider`], backed by `nalgebra`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NalgebraTransforms;

impl TransformProvider for NalgebraTransforms {
    fn rotation_to_euler(
        &self,
        rotation: &Rotation3<f64>,
        convention: EulerConvention,
    ) -> [f64; 3] {
        convention.angles(rotation.matrix())
    }

    fn euler_to_rotation(&self, angles: [f64; 3], convention: EulerConvention) -> Rotation3<f64> {
        Rotation3::from_matrix_unchecked(convention.matrix(angles))
    }

    fn rotation_to_quaternion(&self, rotation: &Rotation3<f64>) -> UnitQuaternion<f64> {
        UnitQuaternion::from_rotation_matrix(rotation)
    }

    fn quaternion_to_rotation(&self, quaternion: &UnitQuaternion<f64>) -> Rotation3<f64> {
        quaternion.to_rotation_matrix()
    }

    fn to_homogeneous(&self, pose: &Pose) -> Matrix4<f64> {
        pose.isometry().to_homogeneous()
    }

    fn from_homogeneous(&self, matrix: &Matrix4<f64>) -> Result<Pose, ModelError> {
        Pose::from_homogeneous(matrix)
    }

    fn decompose(&self, matrix: &Matrix4<f64>) -> Result<Decomposition, TransformError> {
        decompose::decompose(matrix)
    }
}
