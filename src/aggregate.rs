//! Aggregate function module for sheetql
//!
//! This module contains the statistical reducers applied to the numeric cells of
//! a column within a group. Reducers are pure functions of their input slice:
//! they keep no state between groups and can be called from several groups (or
//! threads) at once.
//!
//! An empty input yields `0` for [`AggregateFunction::Count`] and NaN for every
//! other reducer. NaN is what the evaluator turns into a missing cell; it is
//! never an error and never a disguised zero.

use serde::{Deserialize, Serialize};

use crate::cell::CellValue;

/// Supported aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateFunction {
    /// COUNT - number of values
    Count,
    /// SUM - sum of values
    Sum,
    /// MIN - smallest value
    Min,
    /// MAX - largest value
    Max,
    /// RANGE - MAX minus MIN
    Range,
    /// MEAN / AVERAGE - arithmetic mean
    Average,
    /// MEDIAN - middle order statistic
    Median,
    /// STDEV - sample standard deviation (n - 1 denominator)
    StdDev,
    /// STDEVP - population standard deviation (n denominator)
    StdDevP,
    /// IQR / INTERQUARTILE - third quartile minus first quartile
    InterQuartileRange,
}

impl AggregateFunction {
    /// All reducers, in declaration order
    pub const ALL: [AggregateFunction; 10] = [
        AggregateFunction::Count,
        AggregateFunction::Sum,
        AggregateFunction::Min,
        AggregateFunction::Max,
        AggregateFunction::Range,
        AggregateFunction::Average,
        AggregateFunction::Median,
        AggregateFunction::StdDev,
        AggregateFunction::StdDevP,
        AggregateFunction::InterQuartileRange,
    ];

    /// Convert a function name string to an AggregateFunction enum
    ///
    /// # Arguments
    /// * `name` - The function name (case-insensitive)
    ///
    /// # Returns
    /// * Some(AggregateFunction) if the name is a valid aggregate function, None otherwise
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_uppercase().as_str() {
            "COUNT" => Some(AggregateFunction::Count),
            "SUM" => Some(AggregateFunction::Sum),
            "MIN" => Some(AggregateFunction::Min),
            "MAX" => Some(AggregateFunction::Max),
            "RANGE" => Some(AggregateFunction::Range),
            "MEAN" | "AVERAGE" => Some(AggregateFunction::Average),
            "MEDIAN" => Some(AggregateFunction::Median),
            "STDEV" => Some(AggregateFunction::StdDev),
            "STDEVP" => Some(AggregateFunction::StdDevP),
            "IQR" | "INTERQUARTILE" => Some(AggregateFunction::InterQuartileRange),
            _ => None,
        }
    }

    /// Canonical upper-case name used in default column names
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
            AggregateFunction::Range => "RANGE",
            AggregateFunction::Average => "MEAN",
            AggregateFunction::Median => "MEDIAN",
            AggregateFunction::StdDev => "STDEV",
            AggregateFunction::StdDevP => "STDEVP",
            AggregateFunction::InterQuartileRange => "IQR",
        }
    }

    /// Execute the reducer on a sequence of values
    ///
    /// Returns the count for `Count` and NaN for any other reducer whose input
    /// is too small to define a result.
    pub fn compute(&self, values: &[f64]) -> f64 {
        match self {
            AggregateFunction::Count => values.len() as f64,
            AggregateFunction::Sum => sum(values),
            AggregateFunction::Min => min(values),
            AggregateFunction::Max => max(values),
            AggregateFunction::Range => max(values) - min(values),
            AggregateFunction::Average => mean(values),
            AggregateFunction::Median => median(&sorted(values)),
            AggregateFunction::StdDev => std_dev(values, true),
            AggregateFunction::StdDevP => std_dev(values, false),
            AggregateFunction::InterQuartileRange => interquartile_range(&sorted(values)),
        }
    }

    /// Execute the reducer and wrap the result in a cell
    ///
    /// `Count` yields a Long; every other reducer yields a Double, or a missing
    /// cell when the result is NaN.
    pub fn compute_cell(&self, values: &[f64]) -> CellValue {
        match self {
            AggregateFunction::Count => CellValue::Long(values.len() as i64),
            _ => {
                let result = self.compute(values);
                if result.is_nan() {
                    CellValue::Missing
                } else {
                    CellValue::Double(result)
                }
            }
        }
    }
}

fn sum(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum()
}

fn min(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(f64::NAN)
}

fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(f64::NAN)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample (`n - 1`) or population (`n`) standard deviation
fn std_dev(values: &[f64], sample: bool) -> f64 {
    let n = values.len();
    let denominator = if sample { n.saturating_sub(1) } else { n };
    if denominator == 0 {
        return f64::NAN;
    }
    let avg = mean(values);
    let variance = values
        .iter()
        .map(|x| {
            let d = x - avg;
            d * d
        })
        .sum::<f64>()
        / denominator as f64;
    variance.sqrt()
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Median of sorted values; the mean of the two central values for even counts
fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Q3 - Q1, where the quartiles are the medians of the lower and upper halves
///
/// For an odd count the middle value belongs to neither half. A single value
/// has an interquartile range of 0.
fn interquartile_range(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    match n {
        0 => f64::NAN,
        1 => 0.0,
        _ => {
            let lower = &sorted[..n / 2];
            let upper = &sorted[(n + 1) / 2..];
            median(upper) - median(lower)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_names_and_synonyms() {
        assert_eq!(AggregateFunction::from_name("mean"), Some(AggregateFunction::Average));
        assert_eq!(AggregateFunction::from_name("AVERAGE"), Some(AggregateFunction::Average));
        assert_eq!(
            AggregateFunction::from_name("Interquartile"),
            Some(AggregateFunction::InterQuartileRange)
        );
        assert_eq!(AggregateFunction::from_name("AVG"), None);
        for function in AggregateFunction::ALL {
            assert_eq!(AggregateFunction::from_name(function.name()), Some(function));
        }
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(AggregateFunction::Count.compute(&[]), 0.0);
        assert_eq!(AggregateFunction::Count.compute_cell(&[]), CellValue::Long(0));
        for function in AggregateFunction::ALL {
            if function != AggregateFunction::Count {
                assert!(function.compute(&[]).is_nan(), "{:?} should be NaN", function);
                assert_eq!(function.compute_cell(&[]), CellValue::Missing);
            }
        }
    }

    #[test]
    fn test_basic_reducers() {
        let values = [10.0, 30.0, 20.0];
        assert_close(AggregateFunction::Count.compute(&values), 3.0);
        assert_close(AggregateFunction::Sum.compute(&values), 60.0);
        assert_close(AggregateFunction::Min.compute(&values), 10.0);
        assert_close(AggregateFunction::Max.compute(&values), 30.0);
        assert_close(AggregateFunction::Range.compute(&values), 20.0);
        assert_close(AggregateFunction::Average.compute(&values), 20.0);
        assert_close(AggregateFunction::Median.compute(&values), 20.0);
    }

    #[test]
    fn test_median_even_count_averages_center() {
        assert_close(AggregateFunction::Median.compute(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_standard_deviations() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_close(AggregateFunction::StdDevP.compute(&values), 2.0);
        assert_close(
            AggregateFunction::StdDev.compute(&values),
            (32.0_f64 / 7.0).sqrt(),
        );
        assert!(AggregateFunction::StdDev.compute(&[1.0]).is_nan());
        assert_close(AggregateFunction::StdDevP.compute(&[1.0]), 0.0);
    }

    #[test]
    fn test_interquartile_range() {
        let even = [8.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        assert_close(AggregateFunction::InterQuartileRange.compute(&even), 4.0);
        let odd = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        assert_close(AggregateFunction::InterQuartileRange.compute(&odd), 4.0);
        assert_close(AggregateFunction::InterQuartileRange.compute(&[5.0]), 0.0);
    }

    #[test]
    fn test_cell_results() {
        assert_eq!(
            AggregateFunction::Sum.compute_cell(&[10.0, 30.0]),
            CellValue::Double(40.0)
        );
        assert_eq!(
            AggregateFunction::Count.compute_cell(&[1.0, 2.0]),
            CellValue::Long(2)
        );
    }

    #[test]
    fn test_reducers_are_independent_across_threads() {
        let groups: Vec<Vec<f64>> = (1..=8).map(|n| (1..=n).map(f64::from).collect()).collect();
        let handles: Vec<_> = groups
            .clone()
            .into_iter()
            .map(|g| std::thread::spawn(move || AggregateFunction::Sum.compute(&g)))
            .collect();
        for (handle, group) in handles.into_iter().zip(groups) {
            assert_close(handle.join().unwrap(), group.iter().sum());
        }
    }
}
