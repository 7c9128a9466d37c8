use super::error::ModelError;
use crate::core::transforms::euler::EulerConvention;
use nalgebra::{
    IsometryMatrix3, Matrix3, Matrix4, Rotation3, Translation3, UnitQuaternion, Vector3,
};
use std::ops::Mul;

/// Maximum deviation accepted when checking that a rotation matrix is orthonormal with
/// determinant +1.
pub const ROTATION_TOLERANCE: f64 = 1e-6;

/// A rigid-body transform: a translation followed by a proper rotation.
///
/// The rotation is stored as a 3x3 matrix. Constructors that accept raw matrices validate them
/// and fail instead of normalizing, so a `Pose` value is always a rigid transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    isometry: IsometryMatrix3<f64>,
}

impl Pose {
    pub fn identity() -> Self {
        Self {
            isometry: IsometryMatrix3::identity(),
        }
    }

    /// Creates a pose with the given translation and no rotation.
    pub fn from_translation(translation: Vector3<f64>) -> Self {
        Self {
            isometry: IsometryMatrix3::from_parts(
                Translation3::from(translation),
                Rotation3::identity(),
            ),
        }
    }

    /// Creates a pose from a translation and a 3x3 rotation matrix.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidPose`] if any value is non-finite, or if `rotation` is not
    /// orthonormal with determinant +1 within [`ROTATION_TOLERANCE`].
    pub fn from_parts(
        translation: Vector3<f64>,
        rotation: Matrix3<f64>,
    ) -> Result<Self, ModelError> {
        check_finite_translation(&translation)?;
        validate_rotation(&rotation)?;
        Ok(Self {
            isometry: IsometryMatrix3::from_parts(
                Translation3::from(translation),
                Rotation3::from_matrix_unchecked(rotation),
            ),
        })
    }

    /// Creates a pose from a 4x4 homogeneous matrix.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidPose`] if the bottom row is not `[0, 0, 0, 1]` or the upper
    /// 3x3 block is not a proper rotation.
    pub fn from_homogeneous(matrix: &Matrix4<f64>) -> Result<Self, ModelError> {
        let bottom = [matrix[(3, 0)], matrix[(3, 1)], matrix[(3, 2)], matrix[(3, 3)]];
        let expected = [0.0, 0.0, 0.0, 1.0];
        if bottom
            .iter()
            .zip(expected.iter())
            .any(|(v, e)| !v.is_finite() || (v - e).abs() > ROTATION_TOLERANCE)
        {
            return Err(ModelError::InvalidPose(format!(
                "homogeneous matrix bottom row must be [0, 0, 0, 1], got {bottom:?}"
            )));
        }
        let translation = Vector3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)]);
        let rotation: Matrix3<f64> = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        Self::from_parts(translation, rotation)
    }

    /// Creates a pose from a translation and Euler angles (radians) in the given convention.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidPose`] if any value is non-finite.
    pub fn from_euler(
        translation: Vector3<f64>,
        angles: [f64; 3],
        convention: EulerConvention,
    ) -> Result<Self, ModelError> {
        check_finite_translation(&translation)?;
        if angles.iter().any(|a| !a.is_finite()) {
            return Err(ModelError::InvalidPose(
                "Euler angles contain non-finite values".to_string(),
            ));
        }
        Ok(Self {
            isometry: IsometryMatrix3::from_parts(
                Translation3::from(translation),
                Rotation3::from_matrix_unchecked(convention.matrix(angles)),
            ),
        })
    }

    /// Creates a pose from a translation and a unit quaternion.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidPose`] if any value is non-finite.
    pub fn from_quaternion(
        translation: Vector3<f64>,
        rotation: UnitQuaternion<f64>,
    ) -> Result<Self, ModelError> {
        check_finite_translation(&translation)?;
        if rotation.coords.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::InvalidPose(
                "quaternion contains non-finite values".to_string(),
            ));
        }
        Ok(Self {
            isometry: IsometryMatrix3::from_parts(
                Translation3::from(translation),
                rotation.to_rotation_matrix(),
            ),
        })
    }

    /// Creates a pose from an existing isometry.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidPose`] under the same conditions as [`Pose::from_parts`];
    /// `Rotation3::from_matrix_unchecked` can carry a matrix that is not a rotation.
    pub fn from_isometry(isometry: IsometryMatrix3<f64>) -> Result<Self, ModelError> {
        Self::from_parts(isometry.translation.vector, *isometry.rotation.matrix())
    }

    pub fn isometry(&self) -> &IsometryMatrix3<f64> {
        &self.isometry
    }

    pub fn translation(&self) -> Vector3<f64> {
        self.isometry.translation.vector
    }

    pub fn rotation(&self) -> Rotation3<f64> {
        self.isometry.rotation
    }

    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        *self.isometry.rotation.matrix()
    }

    pub fn quaternion(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_rotation_matrix(&self.isometry.rotation)
    }

    /// Returns the rotation as Euler angles (radians) in the given convention.
    pub fn euler_angles(&self, convention: EulerConvention) -> [f64; 3] {
        convention.angles(self.isometry.rotation.matrix())
    }

    pub fn to_homogeneous(&self) -> Matrix4<f64> {
        self.isometry.to_homogeneous()
    }

    /// Returns `self ∘ other`: `other` expressed in the frame that `self` maps into.
    ///
    /// For a parent pose `P` and a child's local pose `L`, `P.compose(&L)` is the child's pose in
    /// the parent's reference frame.
    pub fn compose(&self, other: &Pose) -> Pose {
        Pose {
            isometry: self.isometry * other.isometry,
        }
    }

    pub fn inverse(&self) -> Pose {
        Pose {
            isometry: self.isometry.inverse(),
        }
    }

    /// Compares translation and rotation entries with an absolute tolerance.
    pub fn approx_eq(&self, other: &Pose, tolerance: f64) -> bool {
        (self.translation() - other.translation()).abs().max() <= tolerance
            && (self.rotation_matrix() - other.rotation_matrix()).abs().max() <= tolerance
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Pose {
    type Output = Pose;

    fn mul(self, rhs: Pose) -> Pose {
        self.compose(&rhs)
    }
}

impl Mul<&Pose> for &Pose {
    type Output = Pose;

    fn mul(self, rhs: &Pose) -> Pose {
        self.compose(rhs)
    }
}

fn check_finite_translation(translation: &Vector3<f64>) -> Result<(), ModelError> {
    if translation.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::InvalidPose(
            "translation contains non-finite values".to_string(),
        ));
    }
    Ok(())
}

fn validate_rotation(rotation: &Matrix3<f64>) -> Result<(), ModelError> {
    if rotation.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::InvalidPose(
            "rotation contains non-finite values".to_string(),
        ));
    }
    let deviation = (rotation.transpose() * rotation - Matrix3::identity())
        .abs()
        .max();
    if deviation > ROTATION_TOLERANCE {
        return Err(ModelError::InvalidPose(format!(
            "rotation matrix is not orthonormal (max deviation {deviation:e})"
        )));
    }
    let determinant = rotation.determinant();
    if (determinant - 1.0).abs() > ROTATION_TOLERANCE {
        return Err(ModelError::InvalidPose(format!(
            "rotation matrix determinant is {determinant}, expected 1"
        )));
    }
    Ok(())
}
