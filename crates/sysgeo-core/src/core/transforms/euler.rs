use super::error::TransformError;
use nalgebra::Matrix3;
use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;

const EPS: f64 = f64::EPSILON * 4.0;

const NEXT_AXIS: [usize; 4] = [1, 2, 0, 1];

// (first axis, parity, repetition, frame)
static AXES: Map<&'static str, (usize, u8, u8, u8)> = phf_map! {
    "sxyz" => (0, 0, 0, 0), "sxyx" => (0, 0, 1, 0), "sxzy" => (0, 1, 0, 0),
    "sxzx" => (0, 1, 1, 0), "syzx" => (1, 0, 0, 0), "syzy" => (1, 0, 1, 0),
    "syxz" => (1, 1, 0, 0), "syxy" => (1, 1, 1, 0), "szxy" => (2, 0, 0, 0),
    "szxz" => (2, 0, 1, 0), "szyx" => (2, 1, 0, 0), "szyz" => (2, 1, 1, 0),
    "rzyx" => (0, 0, 0, 1), "rxyx" => (0, 0, 1, 1), "ryzx" => (0, 1, 0, 1),
    "rxzx" => (0, 1, 1, 1), "rxzy" => (1, 0, 0, 1), "ryzy" => (1, 0, 1, 1),
    "rzxy" => (1, 1, 0, 1), "ryxy" => (1, 1, 1, 1), "ryxz" => (2, 0, 0, 1),
    "rzxz" => (2, 0, 1, 1), "rxyz" => (2, 1, 0, 1), "rzyz" => (2, 1, 1, 1),
};

/// An Euler angle convention, identified by a four-letter code.
///
/// The first letter selects the frame (`s` for static/extrinsic axes, `r` for rotating/intrinsic
/// axes) and the remaining three name the rotation axes in application order. `sxyz` rotates
/// about the fixed x axis, then y, then z, and is the default used throughout the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EulerConvention {
    code: &'static str,
    first_axis: usize,
    parity: bool,
    repetition: bool,
    rotating_frame: bool,
}

impl EulerConvention {
    /// Static x-y-z convention.
    pub fn sxyz() -> Self {
        Self {
            code: "sxyz",
            first_axis: 0,
            parity: false,
            repetition: false,
            rotating_frame: false,
        }
    }

    /// Looks up a convention by its code (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::UnknownConvention`] if the code is not one of the 24 known
    /// axis sequences.
    pub fn parse(code: &str) -> Result<Self, TransformError> {
        let lowered = code.trim().to_ascii_lowercase();
        let (key, &(first_axis, parity, repetition, frame)) = AXES
            .get_entry(lowered.as_str())
            .ok_or_else(|| TransformError::UnknownConvention(code.to_string()))?;
        Ok(Self {
            code: key,
            first_axis,
            parity: parity == 1,
            repetition: repetition == 1,
            rotating_frame: frame == 1,
        })
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn is_rotating_frame(&self) -> bool {
        self.rotating_frame
    }

    fn axes(&self) -> (usize, usize, usize) {
        let i = self.first_axis;
        let p = usize::from(self.parity);
        let j = NEXT_AXIS[i + p];
        let k = NEXT_AXIS[i + 1 - p];
        (i, j, k)
    }

    /// Builds the rotation matrix for the given angles (radians).
    pub fn matrix(&self, angles: [f64; 3]) -> Matrix3<f64> {
        let (i, j, k) = self.axes();
        let [mut ai, mut aj, mut ak] = angles;
        if self.rotating_frame {
            std::mem::swap(&mut ai, &mut ak);
        }
        if self.parity {
            ai = -ai;
            aj = -aj;
            ak = -ak;
        }

        let (si, sj, sk) = (ai.sin(), aj.sin(), ak.sin());
        let (ci, cj, ck) = (ai.cos(), aj.cos(), ak.cos());
        let (cc, cs) = (ci * ck, ci * sk);
        let (sc, ss) = (si * ck, si * sk);

        let mut m = Matrix3::identity();
        if self.repetition {
            m[(i, i)] = cj;
            m[(i, j)] = sj * si;
            m[(i, k)] = sj * ci;
            m[(j, i)] = sj * sk;
            m[(j, j)] = -cj * ss + cc;
            m[(j, k)] = -cj * cs - sc;
            m[(k, i)] = -sj * ck;
            m[(k, j)] = cj * sc + cs;
            m[(k, k)] = cj * cc - ss;
        } else {
            m[(i, i)] = cj * ck;
            m[(i, j)] = sj * sc - cs;
            m[(i, k)] = sj * cc + ss;
            m[(j, i)] = cj * sk;
            m[(j, j)] = sj * ss + cc;
            m[(j, k)] = sj * cs - sc;
            m[(k, i)] = -sj;
            m[(k, j)] = cj * si;
            m[(k, k)] = cj * ci;
        }
        m
    }

    /// Extracts Euler angles (radians) from a rotation matrix.
    ///
    /// In gimbal lock the third angle is fixed to zero and the remaining rotation is folded into
    /// the first one, so `matrix(angles(m))` still reproduces `m`.
    pub fn angles(&self, m: &Matrix3<f64>) -> [f64; 3] {
        let (i, j, k) = self.axes();

        let (mut ax, mut ay, mut az) = if self.repetition {
            let sy = (m[(i, j)] * m[(i, j)] + m[(i, k)] * m[(i, k)]).sqrt();
            if sy > EPS {
                (
                    m[(i, j)].atan2(m[(i, k)]),
                    sy.atan2(m[(i, i)]),
                    m[(j, i)].atan2(-m[(k, i)]),
                )
            } else {
                ((-m[(j, k)]).atan2(m[(j, j)]), sy.atan2(m[(i, i)]), 0.0)
            }
        } else {
            let cy = (m[(i, i)] * m[(i, i)] + m[(j, i)] * m[(j, i)]).sqrt();
            if cy > EPS {
                (
                    m[(k, j)].atan2(m[(k, k)]),
                    (-m[(k, i)]).atan2(cy),
                    m[(j, i)].atan2(m[(i, i)]),
                )
            } else {
                ((-m[(j, k)]).atan2(m[(j, j)]), (-m[(k, i)]).atan2(cy), 0.0)
            }
        };

        if self.parity {
            ax = -ax;
            ay = -ay;
            az = -az;
        }
        if self.rotating_frame {
            std::mem::swap(&mut ax, &mut az);
        }
        [ax, ay, az]
    }
}

impl Default for EulerConvention {
    fn default() -> Self {
        Self::sxyz()
    }
}

impl FromStr for EulerConvention {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for EulerConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}

/// Unit in which angles are written to and read from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AngleUnit {
    #[default]
    Radians,
    Degrees,
}

impl AngleUnit {
    /// Converts a value in radians into this unit.
    pub fn from_radians(&self, value: f64) -> f64 {
        match self {
            AngleUnit::Radians => value,
            AngleUnit::Degrees => value.to_degrees(),
        }
    }

    /// Converts a value expressed in this unit into radians.
    pub fn to_radians(&self, value: f64) -> f64 {
        match self {
            AngleUnit::Radians => value,
            AngleUnit::Degrees => value.to_radians(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid angle unit '{0}' (expected 'radians' or 'degrees')")]
pub struct ParseAngleUnitError(String);

impl FromStr for AngleUnit {
    type Err = ParseAngleUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rad" | "radian" | "radians" => Ok(AngleUnit::Radians),
            "deg" | "degree" | "degrees" => Ok(AngleUnit::Degrees),
            _ => Err(ParseAngleUnitError(s.to_string())),
        }
    }
}

impl fmt::Display for AngleUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AngleUnit::Radians => "radians",
            AngleUnit::Degrees => "degrees",
        })
    }
}
