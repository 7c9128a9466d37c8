//! Rigid-body transform utilities.
//!
//! Everything in this module is pure math: conversions between rotation matrices, Euler angles
//! in any of the 24 axis conventions, unit quaternions, and 4x4 homogeneous transforms, plus the
//! decomposition of an affine matrix into translation, scale, shear and rotation.
//!
//! The model and the exporter only talk to these conversions through the
//! [`provider::TransformProvider`] trait, so the backing implementation can be replaced without
//! touching either of them.
//! [`provider::NalgebraTransforms`] is the default implementation.

pub mod decompose;
pub mod error;
pub mod euler;
pub mod provider;

pub use decompose::Decomposition;
pub use error::TransformError;
pub use euler::{AngleUnit, EulerConvention};
pub use provider::{NalgebraTransforms, TransformProvider};
