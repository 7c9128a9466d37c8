use super::error::TransformError;
use super::euler::EulerConvention;
use nalgebra::{Matrix3, Matrix4, Rotation3, Vector3};

const PERSPECTIVE_TOLERANCE: f64 = 1e-9;

/// The parts of an affine 4x4 transform.
///
/// Applying them in the order shear, scale, rotation, translation reproduces the original
/// matrix. Rigid transforms decompose to unit scale and zero shear.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decomposition {
    pub translation: Vector3<f64>,
    pub scale: Vector3<f64>,
    /// Shear factors for the xy, xz and yz planes.
    pub shear: Vector3<f64>,
    pub rotation: Rotation3<f64>,
    /// Rotation as static x-y-z Euler angles, in radians.
    pub angles: [f64; 3],
}

impl Decomposition {
    /// Returns `true` when scale is one and shear is zero on every axis, within `tolerance`.
    pub fn is_rigid(&self, tolerance: f64) -> bool {
        self.scale.iter().all(|s| (s - 1.0).abs() <= tolerance)
            && self.shear.iter().all(|s| s.abs() <= tolerance)
    }
}

/// Splits an affine transform into translation, scale, shear and rotation.
///
/// The upper 3x3 block is orthogonalized column by column (Gram-Schmidt). A reflection is
/// folded into negative scale factors so that the returned rotation is always proper.
///
/// # Errors
///
/// * [`TransformError::NonFinite`] if the matrix contains NaN or infinite values.
/// * [`TransformError::Perspective`] if the bottom row is not `[0, 0, 0, w]`.
/// * [`TransformError::Singular`] if `w` is zero or the linear part is degenerate.
pub fn decompose(matrix: &Matrix4<f64>) -> Result<Decomposition, TransformError> {
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(TransformError::NonFinite);
    }

    let w = matrix[(3, 3)];
    if w.abs() < f64::EPSILON {
        return Err(TransformError::Singular);
    }
    let m = *matrix / w;

    if (0..3).any(|c| m[(3, c)].abs() > PERSPECTIVE_TOLERANCE) {
        return Err(TransformError::Perspective {
            row: [m[(3, 0)], m[(3, 1)], m[(3, 2)], m[(3, 3)]],
        });
    }

    let translation = Vector3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)]);
    let linear: Matrix3<f64> = m.fixed_view::<3, 3>(0, 0).into_owned();
    if linear.determinant().abs() < f64::EPSILON {
        return Err(TransformError::Singular);
    }

    let mut cols = [
        linear.column(0).into_owned(),
        linear.column(1).into_owned(),
        linear.column(2).into_owned(),
    ];
    let mut scale = Vector3::<f64>::zeros();
    let mut shear = Vector3::<f64>::zeros();

    scale.x = cols[0].norm();
    cols[0] /= scale.x;

    shear.x = cols[0].dot(&cols[1]);
    let projection = cols[0] * shear.x;
    cols[1] -= projection;
    scale.y = cols[1].norm();
    cols[1] /= scale.y;
    shear.x /= scale.y;

    shear.y = cols[0].dot(&cols[2]);
    let projection = cols[0] * shear.y;
    cols[2] -= projection;
    shear.z = cols[1].dot(&cols[2]);
    let projection = cols[1] * shear.z;
    cols[2] -= projection;
    scale.z = cols[2].norm();
    cols[2] /= scale.z;
    shear.y /= scale.z;
    shear.z /= scale.z;

    if cols[0].dot(&cols[1].cross(&cols[2])) < 0.0 {
        scale = -scale;
        for col in &mut cols {
            *col = -*col;
        }
    }

    let rotation = Rotation3::from_matrix_unchecked(Matrix3::from_columns(&cols));
    let angles = EulerConvention::sxyz().angles(rotation.matrix());

    Ok(Decomposition {
        translation,
        scale,
        shear,
        rotation,
        angles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Isometry3, Translation3, UnitQuaternion};

    const TOLERANCE: f64 = 1e-12;

    #[test]
    fn rigid_transform_decomposes_to_its_parts() {
        let rotation = UnitQuaternion::from_euler_angles(0.2, -0.4, 0.9);
        let isometry = Isometry3::from_parts(Translation3::new(1.0, -2.0, 3.5), rotation);
        let d = decompose(&isometry.to_homogeneous()).unwrap();

        assert!((d.translation - Vector3::new(1.0, -2.0, 3.5)).norm() < TOLERANCE);
        assert!(d.is_rigid(1e-12));
        assert!((d.angles[0] - 0.2).abs() < TOLERANCE);
        assert!((d.angles[1] + 0.4).abs() < TOLERANCE);
        assert!((d.angles[2] - 0.9).abs() < TOLERANCE);
        let expected = rotation.to_rotation_matrix();
        assert!((d.rotation.matrix() - expected.matrix()).abs().max() < TOLERANCE);
    }

    #[test]
    fn scaled_transform_reports_scale_and_keeps_rotation_proper() {
        let mut m = Matrix4::identity();
        m[(0, 0)] = 2.0;
        m[(1, 1)] = 3.0;
        m[(2, 2)] = -0.5;
        let d = decompose(&m).unwrap();

        assert!(!d.is_rigid(1e-9));
        assert!((d.rotation.matrix().determinant() - 1.0).abs() < TOLERANCE);
        let reconstructed = d.rotation.matrix() * Matrix3::from_diagonal(&d.scale);
        assert!((reconstructed - m.fixed_view::<3, 3>(0, 0)).abs().max() < TOLERANCE);
    }

    #[test]
    fn homogeneous_scale_factor_is_normalized() {
        let m = Matrix4::identity() * 2.0;
        let d = decompose(&m).unwrap();
        assert!(d.is_rigid(TOLERANCE));
    }

    #[test]
    fn perspective_row_is_rejected() {
        let mut m = Matrix4::identity();
        m[(3, 2)] = 0.25;
        assert!(matches!(
            decompose(&m),
            Err(TransformError::Perspective { .. })
        ));
    }

    #[test]
    fn degenerate_matrices_are_rejected() {
        let mut flat = Matrix4::identity();
        flat[(2, 2)] = 0.0;
        assert_eq!(decompose(&flat), Err(TransformError::Singular));

        let mut zero_w = Matrix4::identity();
        zero_w[(3, 3)] = 0.0;
        assert_eq!(decompose(&zero_w), Err(TransformError::Singular));

        let mut nan = Matrix4::identity();
        nan[(0, 3)] = f64::NAN;
        assert_eq!(decompose(&nan), Err(TransformError::NonFinite));
    }
}
