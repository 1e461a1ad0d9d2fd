use serde::{Deserialize, Serialize};

use super::xyz::{Xyz, WHITE_X, WHITE_Y, WHITE_Z};

pub const MIN_L: f64 = 0.0;
pub const MAX_L: f64 = 100.0;
pub const MIN_A: f64 = -128.0;
pub const MAX_A: f64 = 127.0;
pub const MIN_B: f64 = -128.0;
pub const MAX_B: f64 = 127.0;

const EPSILON: f64 = 6.0 / 29.0;
const KAPPA: f64 = 3.0 * EPSILON * EPSILON;

/// A CIE L*a*b* triple relative to D65.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lab {
    pub l: f64,
    pub a: f64,
    pub b: f64,
}

impl Lab {
    pub const fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }

    pub fn is_finite(&self) -> bool {
        self.l.is_finite() && self.a.is_finite() && self.b.is_finite()
    }
}

/// XYZ <-> CIELab conversions.
pub struct LabSpace;

impl LabSpace {
    pub fn clamp_l(value: f64) -> f64 {
        value.clamp(MIN_L, MAX_L)
    }

    pub fn clamp_a(value: f64) -> f64 {
        value.clamp(MIN_A, MAX_A)
    }

    pub fn clamp_b(value: f64) -> f64 {
        value.clamp(MIN_B, MAX_B)
    }

    pub fn from_xyz(xyz: &Xyz) -> Lab {
        let fx = f(xyz.x / WHITE_X);
        let fy = f(xyz.y / WHITE_Y);
        let fz = f(xyz.z / WHITE_Z);
        Lab {
            l: Self::clamp_l(116.0 * fy - 16.0),
            a: Self::clamp_a(500.0 * (fx - fy)),
            b: Self::clamp_b(200.0 * (fy - fz)),
        }
    }

    pub fn to_xyz(lab: &Lab) -> Xyz {
        let fy = (lab.l + 16.0) / 116.0;
        let fx = fy + lab.a / 500.0;
        let fz = fy - lab.b / 200.0;
        Xyz {
            x: WHITE_X * f_inv(fx),
            y: WHITE_Y * f_inv(fy),
            z: WHITE_Z * f_inv(fz),
        }
    }
}

fn f(t: f64) -> f64 {
    if t > EPSILON * EPSILON * EPSILON {
        t.cbrt()
    } else {
        t / KAPPA + 4.0 / 29.0
    }
}

fn f_inv(t: f64) -> f64 {
    if t > EPSILON {
        t * t * t
    } else {
        KAPPA * (t - 4.0 / 29.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_white_is_l100() {
        let lab = LabSpace::from_xyz(&Xyz {
            x: WHITE_X,
            y: WHITE_Y,
            z: WHITE_Z,
        });
        assert!((lab.l - 100.0).abs() < 1e-9);
        assert!(lab.a.abs() < 1e-9);
        assert!(lab.b.abs() < 1e-9);
    }

    #[test]
    fn xyz_round_trip() {
        let xyz = Xyz {
            x: 0.2,
            y: 0.3,
            z: 0.004,
        };
        let back = LabSpace::to_xyz(&LabSpace::from_xyz(&xyz));
        assert!((back.x - xyz.x).abs() < 1e-9);
        assert!((back.y - xyz.y).abs() < 1e-9);
        assert!((back.z - xyz.z).abs() < 1e-9);
    }

    #[test]
    fn components_are_clamped() {
        assert_eq!(LabSpace::clamp_l(120.0), 100.0);
        assert_eq!(LabSpace::clamp_a(-200.0), -128.0);
        assert_eq!(LabSpace::clamp_b(200.0), 127.0);
    }
}
