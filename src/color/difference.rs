//! Perceptual color-difference (delta-E) formulas over CIELab triples.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::lab::Lab;

/// 25^7, shared by the chroma compensation and rotation terms of CIEDE2000.
const POW25_7: f64 = 6_103_515_625.0;

/// Selectable delta-E formula.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifferenceFormula {
    /// Euclidean distance in Lab.
    #[default]
    Cie76,
    /// CIE Technical Report 142-2001, with kL = kC = kH = 1.
    Ciede2000,
}

impl DifferenceFormula {
    pub fn compute(self, lab1: &Lab, lab2: &Lab) -> f64 {
        match self {
            DifferenceFormula::Cie76 => cie76(lab1, lab2),
            DifferenceFormula::Ciede2000 => ciede2000(lab1, lab2),
        }
    }
}

/// CIE76: Euclidean distance in Lab space.
pub fn cie76(lab1: &Lab, lab2: &Lab) -> f64 {
    let dl = lab1.l - lab2.l;
    let da = lab1.a - lab2.a;
    let db = lab1.b - lab2.b;
    (dl * dl + da * da + db * db).sqrt()
}

/// CIEDE2000 color difference.
pub fn ciede2000(lab1: &Lab, lab2: &Lab) -> f64 {
    const KL: f64 = 1.0;
    const KC: f64 = 1.0;
    const KH: f64 = 1.0;

    let c1_ab = lab1.a.hypot(lab1.b);
    let c2_ab = lab2.a.hypot(lab2.b);
    let c_ab_mean_pow7 = ((c1_ab + c2_ab) / 2.0).powi(7);
    let g = 0.5 * (1.0 - (c_ab_mean_pow7 / (c_ab_mean_pow7 + POW25_7)).sqrt());

    let a1_prime = lab1.a * (1.0 + g);
    let a2_prime = lab2.a * (1.0 + g);
    let c1_prime = a1_prime.hypot(lab1.b);
    let c2_prime = a2_prime.hypot(lab2.b);
    let h1_prime = hue_angle(a1_prime, lab1.b);
    let h2_prime = hue_angle(a2_prime, lab2.b);

    let delta_l_prime = lab2.l - lab1.l;
    let delta_c_prime = c2_prime - c1_prime;

    let chroma_product = c1_prime * c2_prime;
    let delta_h_prime = if chroma_product == 0.0 {
        0.0
    } else {
        let delta = h2_prime - h1_prime;
        if delta > 180.0 {
            delta - 360.0
        } else if delta < -180.0 {
            delta + 360.0
        } else {
            delta
        }
    };
    let delta_big_h_prime = 2.0 * chroma_product.sqrt() * (delta_h_prime.to_radians() / 2.0).sin();

    let l_prime_mean = (lab1.l + lab2.l) / 2.0;
    let c_prime_mean = (c1_prime + c2_prime) / 2.0;
    let h_prime_mean = if chroma_product == 0.0 {
        h1_prime + h2_prime
    } else if (h1_prime - h2_prime).abs() <= 180.0 {
        (h1_prime + h2_prime) / 2.0
    } else if h1_prime + h2_prime < 360.0 {
        (h1_prime + h2_prime + 360.0) / 2.0
    } else {
        (h1_prime + h2_prime - 360.0) / 2.0
    };

    let h = h_prime_mean.to_radians();
    let t = 1.0 - 0.17 * (h - PI / 6.0).cos() + 0.24 * (2.0 * h).cos()
        + 0.32 * (3.0 * h + PI / 30.0).cos()
        - 0.20 * (4.0 * h - 63.0_f64.to_radians()).cos();

    let l_offset_sq = (l_prime_mean - 50.0).powi(2);
    let sl = 1.0 + 0.015 * l_offset_sq / (20.0 + l_offset_sq).sqrt();
    let sc = 1.0 + 0.045 * c_prime_mean;
    let sh = 1.0 + 0.015 * c_prime_mean * t;

    // Rotation term for the blue region around 275 degrees.
    let delta_theta = 30.0 * (-((h_prime_mean - 275.0) / 25.0).powi(2)).exp();
    let c_prime_mean_pow7 = c_prime_mean.powi(7);
    let rc = 2.0 * (c_prime_mean_pow7 / (c_prime_mean_pow7 + POW25_7)).sqrt();
    let rt = -(2.0 * delta_theta.to_radians()).sin() * rc;

    let term_l = delta_l_prime / (KL * sl);
    let term_c = delta_c_prime / (KC * sc);
    let term_h = delta_big_h_prime / (KH * sh);
    (term_l * term_l + term_c * term_c + term_h * term_h + rt * term_c * term_h).sqrt()
}

fn hue_angle(a: f64, b: f64) -> f64 {
    if a == 0.0 && b == 0.0 {
        return 0.0;
    }
    b.atan2(a).to_degrees().rem_euclid(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cie76_identity_and_distance() {
        let lab = Lab::new(50.0, 10.0, -10.0);
        assert_eq!(cie76(&lab, &lab), 0.0);
        assert_eq!(cie76(&Lab::new(0.0, 0.0, 0.0), &Lab::new(0.0, 3.0, 4.0)), 5.0);
    }

    /// Sharma, Wu & Dalal (2005) reference pairs.
    #[test]
    fn ciede2000_reference_vectors() {
        let cases = [
            (50.0, 2.6772, -79.7751, 50.0, 0.0, -82.7485, 2.0425),
            (50.0, 3.1571, -77.2803, 50.0, 0.0, -82.7485, 2.8615),
            (50.0, -1.3802, -84.2814, 50.0, 0.0, -82.7485, 1.0000),
            (50.0, 0.0, 0.0, 50.0, -1.0, 2.0, 2.3669),
            (50.0, 2.49, -0.001, 50.0, -2.49, 0.0011, 7.2195),
            (50.0, -0.001, 2.49, 50.0, 0.0011, -2.49, 4.7461),
            (50.0, 2.5, 0.0, 50.0, 0.0, -2.5, 4.3065),
            (50.0, 2.5, 0.0, 73.0, 25.0, -18.0, 27.1492),
            (50.0, 2.5, 0.0, 56.0, -27.0, -3.0, 31.9030),
            (60.2574, -34.0099, 36.2677, 60.4626, -34.1751, 39.4387, 1.2644),
            (22.7233, 20.0904, -46.6940, 23.0331, 14.9730, -42.5619, 2.0373),
            (90.9257, -0.5406, -0.9208, 88.6381, -0.8985, -0.7239, 1.5381),
            (2.0776, 0.0795, -1.1350, 0.9033, -0.0636, -0.5514, 0.9082),
        ];

        for (i, &(l1, a1, b1, l2, a2, b2, expected)) in cases.iter().enumerate() {
            let actual = ciede2000(&Lab::new(l1, a1, b1), &Lab::new(l2, a2, b2));
            assert!(
                (actual - expected).abs() < 1e-4,
                "pair {}: expected {expected:.4}, got {actual:.4}",
                i + 1
            );
        }
    }

    #[test]
    fn ciede2000_is_symmetric() {
        let a = Lab::new(35.0831, -44.1164, 3.7933);
        let b = Lab::new(35.0232, -40.0716, 1.5901);
        assert_eq!(ciede2000(&a, &b), ciede2000(&b, &a));
    }

    #[test]
    fn formula_selector_dispatches() {
        let a = Lab::new(50.0, 2.5, 0.0);
        let b = Lab::new(50.0, 0.0, -2.5);
        assert_eq!(DifferenceFormula::Cie76.compute(&a, &b), cie76(&a, &b));
        assert_eq!(DifferenceFormula::Ciede2000.compute(&a, &b), ciede2000(&a, &b));
    }
}
