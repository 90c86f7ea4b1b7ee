use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum LambdaError {
    #[error("A lambda schedule needs at least two values, got {0}")]
    TooShort(usize),
    #[error("Lambda value {value} at position {index} lies outside [0, 1]")]
    OutOfRange { index: usize, value: f64 },
    #[error("Lambda values must be strictly increasing: {previous} is followed by {value} at position {index}")]
    NotIncreasing {
        index: usize,
        previous: f64,
        value: f64,
    },
    #[error("Lambda schedule must start at 0 and end at 1")]
    MissingEndpoints,
    #[error("Invalid lambda window [{lower}, {upper}]")]
    InvalidWindow { lower: f64, upper: f64 },
}

/// An ordered set of coupling-parameter values interpolating between the two end states.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LambdaSchedule {
    name: String,
    values: Vec<f64>,
}

impl LambdaSchedule {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Result<Self, LambdaError> {
        if values.len() < 2 {
            return Err(LambdaError::TooShort(values.len()));
        }
        for (index, &value) in values.iter().enumerate() {
            if !(0.0..=1.0).contains(&value) {
                return Err(LambdaError::OutOfRange { index, value });
            }
        }
        for (index, pair) in values.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(LambdaError::NotIncreasing {
                    index: index + 1,
                    previous: pair[0],
                    value: pair[1],
                });
            }
        }
        if values.first() != Some(&0.0) || values.last() != Some(&1.0) {
            return Err(LambdaError::MissingEndpoints);
        }
        Ok(Self {
            name: name.into(),
            values,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values of the schedule that fall inside `window`, without altering the schedule.
    pub fn values_within(&self, window: &LambdaWindow) -> Vec<f64> {
        self.values
            .iter()
            .copied()
            .filter(|&v| window.contains(v))
            .collect()
    }
}

/// A restricted sub-range of lambda space where sampling is concentrated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LambdaWindow {
    lower: f64,
    upper: f64,
}

impl LambdaWindow {
    pub const FOCUSED: LambdaWindow = LambdaWindow {
        lower: 0.7,
        upper: 1.0,
    };

    pub fn new(lower: f64, upper: f64) -> Result<Self, LambdaError> {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if !in_unit(lower) || !in_unit(upper) || lower >= upper {
            return Err(LambdaError::InvalidWindow { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    pub fn as_range(&self) -> [f64; 2] {
        [self.lower, self.upper]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_strictly_increasing_values_spanning_unit_interval() {
        let schedule = LambdaSchedule::new("linear", vec![0.0, 0.5, 1.0]).unwrap();
        assert_eq!(schedule.name(), "linear");
        assert_eq!(schedule.len(), 3);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert_eq!(
            LambdaSchedule::new("bad", vec![0.0, 1.2, 1.0]),
            Err(LambdaError::OutOfRange {
                index: 1,
                value: 1.2
            })
        );
    }

    #[test]
    fn rejects_repeated_or_decreasing_values() {
        assert!(matches!(
            LambdaSchedule::new("bad", vec![0.0, 0.4, 0.4, 1.0]),
            Err(LambdaError::NotIncreasing { index: 2, .. })
        ));
        assert!(matches!(
            LambdaSchedule::new("bad", vec![0.0, 0.6, 0.3, 1.0]),
            Err(LambdaError::NotIncreasing { index: 2, .. })
        ));
    }

    #[test]
    fn requires_both_endpoints_and_two_values() {
        assert_eq!(
            LambdaSchedule::new("bad", vec![0.0]),
            Err(LambdaError::TooShort(1))
        );
        assert_eq!(
            LambdaSchedule::new("bad", vec![0.1, 1.0]),
            Err(LambdaError::MissingEndpoints)
        );
    }

    #[test]
    fn focused_window_selects_upper_tail_without_changing_schedule() {
        let schedule = LambdaSchedule::new("s", vec![0.0, 0.5, 0.7, 0.9, 1.0]).unwrap();
        assert_eq!(
            schedule.values_within(&LambdaWindow::FOCUSED),
            vec![0.7, 0.9, 1.0]
        );
        assert_eq!(schedule.len(), 5);
    }

    #[test]
    fn window_bounds_are_validated() {
        assert!(LambdaWindow::new(0.2, 0.8).is_ok());
        assert!(LambdaWindow::new(0.8, 0.2).is_err());
        assert!(LambdaWindow::new(-0.1, 0.5).is_err());
    }
}
