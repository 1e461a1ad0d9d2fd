use std::cmp::Ordering;

use super::Point;
use crate::error::{Error, Result};

/// Whether a metric reports true distances or their squares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scale {
    Linear,
    Squared,
}

impl Scale {
    /// Express a linear length in this scale.
    #[inline]
    pub fn from_linear(self, value: f64) -> f64 {
        match self {
            Scale::Linear => value,
            Scale::Squared => value * value,
        }
    }

    /// Express a value of this scale as a linear length.
    #[inline]
    pub fn to_linear(self, value: f64) -> f64 {
        match self {
            Scale::Linear => value,
            Scale::Squared => value.sqrt(),
        }
    }
}

/// A non-negative distance tagged with its scale.
///
/// Distances of different scales are unordered: `partial_cmp` returns `None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distance {
    value: f64,
    scale: Scale,
}

impl Distance {
    pub fn new(value: f64, scale: Scale) -> Result<Self> {
        if !value.is_finite() {
            return Err(Error::NonFinite { context: "distance" });
        }
        if value < 0.0 {
            return Err(Error::InvalidParameter {
                name: "distance",
                message: "must be non-negative",
            });
        }
        Ok(Self { value, scale })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    /// The true (non-squared) length.
    pub fn linear(&self) -> f64 {
        self.scale.to_linear(self.value)
    }
}

impl PartialOrd for Distance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.scale != other.scale {
            return None;
        }
        self.value.partial_cmp(&other.value)
    }
}

/// A distance function over `N`-dimensional points.
///
/// [`Metric::eval`] is the unchecked hot-path form used once inputs have been validated;
/// [`Metric::compute`] rejects non-finite components.
pub trait Metric<const N: usize> {
    fn scale(&self) -> Scale;

    /// Raw distance between two finite points, in this metric's scale.
    fn eval(&self, a: &Point<N>, b: &Point<N>) -> f64;

    /// Smallest possible distance between two points that differ by `delta` along `axis`.
    fn axis_bound(&self, axis: usize, delta: f64) -> f64;

    fn compute(&self, a: &Point<N>, b: &Point<N>) -> Result<Distance> {
        if !is_finite(a) || !is_finite(b) {
            return Err(Error::NonFinite {
                context: "point components",
            });
        }
        Distance::new(self.eval(a, b), self.scale())
    }
}

impl<const N: usize, M: Metric<N> + ?Sized> Metric<N> for &M {
    fn scale(&self) -> Scale {
        (**self).scale()
    }

    fn eval(&self, a: &Point<N>, b: &Point<N>) -> f64 {
        (**self).eval(a, b)
    }

    fn axis_bound(&self, axis: usize, delta: f64) -> f64 {
        (**self).axis_bound(axis, delta)
    }
}

/// Euclidean distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Euclidean;

/// Squared Euclidean distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SquaredEuclidean;

#[inline]
pub(crate) fn squared_euclidean<const N: usize>(a: &Point<N>, b: &Point<N>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

impl<const N: usize> Metric<N> for Euclidean {
    fn scale(&self) -> Scale {
        Scale::Linear
    }

    #[inline]
    fn eval(&self, a: &Point<N>, b: &Point<N>) -> f64 {
        squared_euclidean(a, b).sqrt()
    }

    #[inline]
    fn axis_bound(&self, _axis: usize, delta: f64) -> f64 {
        delta.abs()
    }
}

impl<const N: usize> Metric<N> for SquaredEuclidean {
    fn scale(&self) -> Scale {
        Scale::Squared
    }

    #[inline]
    fn eval(&self, a: &Point<N>, b: &Point<N>) -> f64 {
        squared_euclidean(a, b)
    }

    #[inline]
    fn axis_bound(&self, _axis: usize, delta: f64) -> f64 {
        delta * delta
    }
}

/// Euclidean distance with a per-axis weight.
///
/// Over the extractor's `(x, y, L, a, b)` points this is the delta-E weight function:
/// spatial separation and CIE76 color difference are blended by their weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedEuclidean<const N: usize> {
    weights: [f64; N],
}

impl<const N: usize> WeightedEuclidean<N> {
    pub fn new(weights: [f64; N]) -> Result<Self> {
        if !is_finite(&weights) {
            return Err(Error::NonFinite { context: "weights" });
        }
        if weights.iter().any(|&w| w < 0.0) {
            return Err(Error::InvalidParameter {
                name: "weights",
                message: "must be non-negative",
            });
        }
        Ok(Self { weights })
    }

    pub fn weights(&self) -> &[f64; N] {
        &self.weights
    }
}

impl WeightedEuclidean<5> {
    /// Blend spatial distance over `(x, y)` with color difference over `(L, a, b)`.
    pub fn color_spatial(spatial_weight: f64, color_weight: f64) -> Result<Self> {
        Self::new([
            spatial_weight,
            spatial_weight,
            color_weight,
            color_weight,
            color_weight,
        ])
    }
}

impl<const N: usize> Metric<N> for WeightedEuclidean<N> {
    fn scale(&self) -> Scale {
        Scale::Linear
    }

    #[inline]
    fn eval(&self, a: &Point<N>, b: &Point<N>) -> f64 {
        a.iter()
            .zip(b.iter())
            .zip(self.weights.iter())
            .map(|((x, y), w)| {
                let d = (x - y) * w;
                d * d
            })
            .sum::<f64>()
            .sqrt()
    }

    #[inline]
    fn axis_bound(&self, axis: usize, delta: f64) -> f64 {
        (delta * self.weights[axis]).abs()
    }
}

pub(crate) fn is_finite<const N: usize>(point: &Point<N>) -> bool {
    point.iter().all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squared_euclidean_distance() {
        let d = SquaredEuclidean.compute(&[0.0, 0.0], &[1.0, 2.0]).unwrap();
        assert_eq!(d.value(), 5.0);
        assert_eq!(d.scale(), Scale::Squared);
        assert!((d.linear() - 5.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn euclidean_distance() {
        let d = Euclidean.compute(&[0.0, 0.0], &[3.0, 4.0]).unwrap();
        assert_eq!(d.value(), 5.0);
    }

    #[test]
    fn non_finite_components_fail() {
        assert!(matches!(
            SquaredEuclidean.compute(&[f64::NAN, 0.0], &[1.0, 2.0]),
            Err(Error::NonFinite { .. })
        ));
        assert!(Euclidean.compute(&[0.0, 0.0], &[f64::INFINITY, 2.0]).is_err());
    }

    #[test]
    fn mixed_scales_are_unordered() {
        let linear = Distance::new(1.0, Scale::Linear).unwrap();
        let squared = Distance::new(1.0, Scale::Squared).unwrap();
        assert_eq!(linear.partial_cmp(&squared), None);
        let longer = Distance::new(2.0, Scale::Linear).unwrap();
        assert!(linear < longer);
    }

    #[test]
    fn distance_rejects_negative() {
        assert!(Distance::new(-1.0, Scale::Linear).is_err());
    }

    #[test]
    fn weighted_euclidean_weights_axes() {
        let metric = WeightedEuclidean::new([2.0, 0.0]).unwrap();
        assert_eq!(metric.eval(&[0.0, 0.0], &[1.5, 100.0]), 3.0);
        assert_eq!(metric.axis_bound(0, -1.5), 3.0);
        assert_eq!(metric.axis_bound(1, 100.0), 0.0);
        assert!(WeightedEuclidean::new([-1.0, 1.0]).is_err());
    }

    #[test]
    fn color_spatial_layout() {
        let metric = WeightedEuclidean::color_spatial(0.5, 2.0).unwrap();
        assert_eq!(metric.weights(), &[0.5, 0.5, 2.0, 2.0, 2.0]);
    }
}
