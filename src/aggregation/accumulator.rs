//! Running per-group moments.

use serde::{Deserialize, Serialize};

/// How a negative computational variance is turned into a deviation.
///
/// `sum_sq / n - mean²` can dip below zero through cancellation when values
/// are large or nearly uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariancePolicy {
    /// Clamp the variance at zero before the square root.
    #[default]
    Clamp,
    /// Take the square root as is; a negative variance yields `NaN`.
    Propagate,
}

impl std::str::FromStr for VariancePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clamp" => Ok(Self::Clamp),
            "propagate" => Ok(Self::Propagate),
            other => Err(format!("unknown variance policy: {}", other)),
        }
    }
}

/// Count, sum, sum of squares and extrema for one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupAccumulator {
    count: u64,
    sum: f64,
    sum_sq: f64,
    min: f64,
    max: f64,
}

impl Default for GroupAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupAccumulator {
    pub fn new() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            sum_sq: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    #[inline]
    pub fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.sum_sq += value * value;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn sum_sq(&self) -> f64 {
        self.sum_sq
    }

    /// `+inf` until the first value arrives.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// `-inf` until the first value arrives.
    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }

    /// Population variance by the computational formula `E[X²] - E[X]²`.
    ///
    /// Not clamped; may be slightly negative.
    pub fn variance(&self) -> f64 {
        let mean = self.mean();
        (self.sum_sq / self.count as f64) - (mean * mean)
    }

    /// Square root of [`variance`](Self::variance).
    ///
    /// `Clamp` only lifts a negative variance to zero; a `NaN` variance
    /// (e.g. `sum_sq` overflowed) stays `NaN` under either policy.
    pub fn std_dev(&self, policy: VariancePolicy) -> f64 {
        let variance = self.variance();
        match policy {
            VariancePolicy::Clamp if variance < 0.0 => 0.0,
            VariancePolicy::Clamp | VariancePolicy::Propagate => variance.sqrt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_extrema() {
        let acc = GroupAccumulator::new();
        assert_eq!(acc.count(), 0);
        assert_eq!(acc.min(), f64::INFINITY);
        assert_eq!(acc.max(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_moments() {
        let mut acc = GroupAccumulator::new();
        for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            acc.add(v);
        }
        assert_eq!(acc.count(), 8);
        assert_eq!(acc.sum(), 40.0);
        assert_eq!(acc.sum_sq(), 232.0);
        assert_eq!(acc.mean(), 5.0);
        assert_eq!(acc.variance(), 4.0);
        assert_eq!(acc.std_dev(VariancePolicy::Clamp), 2.0);
        assert_eq!(acc.min(), 2.0);
        assert_eq!(acc.max(), 9.0);
    }

    #[test]
    fn test_single_value_has_zero_variance() {
        let mut acc = GroupAccumulator::new();
        acc.add(123.45);
        assert_eq!(acc.variance(), 0.0);
        assert_eq!(acc.std_dev(VariancePolicy::Propagate), 0.0);
    }

    #[test]
    fn test_negative_variance_policies() {
        // Three equal values of 0.1: sum_sq / 3 lands below mean².
        let mut acc = GroupAccumulator::new();
        for _ in 0..3 {
            acc.add(0.1);
        }
        assert!(acc.variance() < 0.0);
        assert_eq!(acc.std_dev(VariancePolicy::Clamp), 0.0);
        assert!(acc.std_dev(VariancePolicy::Propagate).is_nan());
    }

    #[test]
    fn test_overflowed_variance_is_not_clamped() {
        // Finite totals whose squares overflow: sum_sq and mean² are both inf.
        let mut acc = GroupAccumulator::new();
        acc.add(1e200);
        acc.add(3e200);
        assert!(acc.sum_sq().is_infinite());
        assert!(acc.variance().is_nan());
        assert!(acc.std_dev(VariancePolicy::Clamp).is_nan());
        assert!(acc.std_dev(VariancePolicy::Propagate).is_nan());
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("clamp".parse::<VariancePolicy>(), Ok(VariancePolicy::Clamp));
        assert_eq!(
            "PROPAGATE".parse::<VariancePolicy>(),
            Ok(VariancePolicy::Propagate)
        );
        assert!("zero".parse::<VariancePolicy>().is_err());
    }
}
