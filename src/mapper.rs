//! Distance-to-volume mapping.
//!
//! The mapping is linear in the sink's raw unit. When the sink reports
//! decibels the perceived loudness curve is therefore not linear; no gamma or
//! logarithmic correction is applied.

use crate::error::CalibrationError;
use serde::{Deserialize, Serialize};

/// Valid output interval of a volume sink, in the sink's native unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeRange {
    min: f64,
    max: f64,
}

impl VolumeRange {
    pub fn new(min: f64, max: f64) -> Result<Self, CalibrationError> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(CalibrationError::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn clamp(&self, level: f64) -> f64 {
        level.clamp(self.min, self.max)
    }
}

/// Pinch-distance interval mapped onto the volume range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationWindow {
    low: f64,
    high: f64,
}

impl CalibrationWindow {
    pub fn new(low: f64, high: f64) -> Result<Self, CalibrationError> {
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(CalibrationError::InvalidWindow { low, high });
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    /// Closed-interval membership; both bounds count as inside
    pub fn contains(&self, distance: f64) -> bool {
        distance >= self.low && distance <= self.high
    }
}

/// What to do with measurements outside the calibration window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutOfRangePolicy {
    /// Saturate at the nearer bound of the volume range
    #[default]
    Clamp,
    /// Leave the volume unchanged
    Reject,
}

impl std::str::FromStr for OutOfRangePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "clamp" => Ok(OutOfRangePolicy::Clamp),
            "reject" => Ok(OutOfRangePolicy::Reject),
            other => Err(format!("unknown out-of-range policy '{}'", other)),
        }
    }
}

/// Result of mapping one measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MappingOutcome {
    /// Volume to write to the sink
    Target(f64),
    /// Measurement outside the window under the reject policy
    Rejected { distance: f64 },
}

/// Linear interpolation of `distance` from the window onto the range, clamped
/// to the range. The window bounds map exactly onto the range bounds.
pub fn interpolate(distance: f64, window: &CalibrationWindow, range: &VolumeRange) -> f64 {
    if distance <= window.low {
        return range.min;
    }
    if distance >= window.high {
        return range.max;
    }

    let t = (distance - window.low) / (window.high - window.low);
    range.clamp(range.min + t * (range.max - range.min))
}

/// Map a measurement under the given policy.
pub fn map(
    distance: f64,
    window: &CalibrationWindow,
    range: &VolumeRange,
    policy: OutOfRangePolicy,
) -> MappingOutcome {
    if distance.is_nan() {
        return MappingOutcome::Rejected { distance };
    }

    match policy {
        OutOfRangePolicy::Clamp => MappingOutcome::Target(interpolate(distance, window, range)),
        OutOfRangePolicy::Reject if window.contains(distance) => {
            MappingOutcome::Target(interpolate(distance, window, range))
        }
        OutOfRangePolicy::Reject => MappingOutcome::Rejected { distance },
    }
}

/// Mapper bound to one calibration window, volume range and policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeMapper {
    window: CalibrationWindow,
    range: VolumeRange,
    policy: OutOfRangePolicy,
}

impl VolumeMapper {
    pub fn new(window: CalibrationWindow, range: VolumeRange, policy: OutOfRangePolicy) -> Self {
        Self {
            window,
            range,
            policy,
        }
    }

    pub fn map(&self, distance: f64) -> MappingOutcome {
        map(distance, &self.window, &self.range, self.policy)
    }

    pub fn window(&self) -> &CalibrationWindow {
        &self.window
    }

    pub fn range(&self) -> &VolumeRange {
        &self.range
    }

    pub fn policy(&self) -> OutOfRangePolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(policy: OutOfRangePolicy) -> VolumeMapper {
        VolumeMapper::new(
            CalibrationWindow::new(15.0, 220.0).unwrap(),
            VolumeRange::new(-65.25, 0.0).unwrap(),
            policy,
        )
    }

    #[test]
    fn test_window_low_maps_to_range_min() {
        let mapper = reference(OutOfRangePolicy::Clamp);
        assert_eq!(mapper.map(15.0), MappingOutcome::Target(-65.25));
    }

    #[test]
    fn test_window_high_maps_to_range_max() {
        let mapper = reference(OutOfRangePolicy::Clamp);
        assert_eq!(mapper.map(220.0), MappingOutcome::Target(0.0));
    }

    #[test]
    fn test_midpoint() {
        let mapper = reference(OutOfRangePolicy::Clamp);
        match mapper.map(117.5) {
            MappingOutcome::Target(v) => assert!((v - (-32.625)).abs() < 1e-9),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_reject_policy_outside_window() {
        let mapper = reference(OutOfRangePolicy::Reject);
        assert_eq!(mapper.map(300.0), MappingOutcome::Rejected { distance: 300.0 });
        assert_eq!(mapper.map(3.0), MappingOutcome::Rejected { distance: 3.0 });
    }

    #[test]
    fn test_reject_policy_keeps_bounds_exact() {
        let mapper = reference(OutOfRangePolicy::Reject);
        assert_eq!(mapper.map(15.0), MappingOutcome::Target(-65.25));
        assert_eq!(mapper.map(220.0), MappingOutcome::Target(0.0));
    }

    #[test]
    fn test_clamp_policy_saturates() {
        let mapper = reference(OutOfRangePolicy::Clamp);
        assert_eq!(mapper.map(0.0), MappingOutcome::Target(-65.25));
        assert_eq!(mapper.map(10_000.0), MappingOutcome::Target(0.0));
    }

    #[test]
    fn test_clamp_stays_in_range_and_is_monotonic() {
        let windows = [(15.0, 220.0), (0.0, 1.0), (3.5, 3.75), (-10.0, 500.0)];
        let ranges = [(-65.25, 0.0), (0.0, 1.0), (0.0, 87.0), (-3.0, -3.0)];

        for &(low, high) in &windows {
            for &(min, max) in &ranges {
                let window = CalibrationWindow::new(low, high).unwrap();
                let range = VolumeRange::new(min, max).unwrap();

                let mut previous = f64::NEG_INFINITY;
                for step in 0..=400 {
                    let m = low - (high - low) + step as f64 * 3.0 * (high - low) / 400.0;
                    let v = interpolate(m, &window, &range);
                    assert!(v >= min && v <= max, "{} escaped [{}, {}]", v, min, max);
                    assert!(v >= previous, "mapping decreased at m={}", m);
                    previous = v;
                }
            }
        }
    }

    #[test]
    fn test_map_is_pure() {
        let mapper = reference(OutOfRangePolicy::Clamp);
        for m in [15.0, 42.42, 117.5, 219.999, 300.0] {
            assert_eq!(mapper.map(m), mapper.map(m));
        }
    }

    #[test]
    fn test_nan_measurement_is_never_written() {
        let mapper = reference(OutOfRangePolicy::Clamp);
        assert!(matches!(mapper.map(f64::NAN), MappingOutcome::Rejected { .. }));
    }

    #[test]
    fn test_invalid_window_and_range() {
        assert!(CalibrationWindow::new(220.0, 15.0).is_err());
        assert!(CalibrationWindow::new(15.0, 15.0).is_err());
        assert!(CalibrationWindow::new(f64::NAN, 15.0).is_err());
        assert!(VolumeRange::new(0.0, -65.25).is_err());
        assert!(VolumeRange::new(-1.0, -1.0).is_ok());
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("clamp".parse::<OutOfRangePolicy>(), Ok(OutOfRangePolicy::Clamp));
        assert_eq!("REJECT".parse::<OutOfRangePolicy>(), Ok(OutOfRangePolicy::Reject));
        assert!("saturate".parse::<OutOfRangePolicy>().is_err());
    }
}
