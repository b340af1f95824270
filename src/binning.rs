//! Histogram binning for sheetql
//!
//! A [`BinningAlgorithm`] partitions a numeric array into ordered bins and reports
//! the range and population of each bin. Bins are half-open, `[min, max)`,
//! except the last one, which also contains its upper bound.
//!
//! Values outside an explicit `min`/`max` are skipped, as are NaN values. An empty
//! input produces no bins.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Largest number of bins a histogram may have
pub const MAX_BINS: usize = 100_000;

/// A single histogram bin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    /// Position of the bin, starting at 0
    pub index: usize,
    /// Lower bound (inclusive)
    pub min: f64,
    /// Upper bound (exclusive, except for the last bin)
    pub max: f64,
    /// Number of values in the bin
    pub count: usize,
}

/// Strategy that turns a numeric array into bins
pub trait BinningAlgorithm {
    /// Partition `values` into ordered bins
    fn generate_bins(&self, values: &[f64]) -> EngineResult<Vec<Bin>>;
}

/// How an equal-width histogram chooses its number of bins
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinCountRule {
    /// A fixed number of bins
    Manual(usize),
    /// `ceil(log2(n)) + 1`
    Sturges,
    /// Bin width `3.49 * sd * n^(-1/3)`
    Scott,
    /// `ceil(sqrt(n))`
    SquareRoot,
}

impl BinCountRule {
    /// Number of bins for the given values
    ///
    /// # Returns
    /// * `Ok(count)` with `count >= 1` for a non-empty input
    /// * `Err(InvalidInput)` for a manual count of zero or a count above [`MAX_BINS`]
    pub fn bin_count(&self, values: &[f64], lo: f64, hi: f64) -> EngineResult<usize> {
        let n = values.len() as f64;
        let count = match self {
            BinCountRule::Manual(0) => {
                return Err(EngineError::InvalidInput(
                    "Number of bins must be at least 1".to_string(),
                ))
            }
            BinCountRule::Manual(count) => *count,
            BinCountRule::Sturges => (n.log2().ceil() as usize) + 1,
            BinCountRule::SquareRoot => n.sqrt().ceil() as usize,
            BinCountRule::Scott => {
                let mean = values.iter().sum::<f64>() / n;
                let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
                let width = 3.49 * variance.sqrt() * n.powf(-1.0 / 3.0);
                if width > 0.0 && hi > lo {
                    checked_count((hi - lo) / width)?
                } else {
                    1
                }
            }
        };
        checked_count(count as f64)
    }
}

impl FromStr for BinCountRule {
    type Err = EngineError;

    /// Parse `sturges`, `scott`, `sqrt` or a bin count
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sturges" => Ok(BinCountRule::Sturges),
            "scott" => Ok(BinCountRule::Scott),
            "sqrt" | "squareroot" => Ok(BinCountRule::SquareRoot),
            other => other
                .parse::<usize>()
                .map(BinCountRule::Manual)
                .map_err(|_| EngineError::InvalidInput(format!("Unknown bin rule '{}'", s))),
        }
    }
}

/// Bins of equal width between the data (or explicit) minimum and maximum
#[derive(Debug, Clone, PartialEq)]
pub struct EqualWidthBinning {
    /// Rule that picks the number of bins
    pub rule: BinCountRule,
    /// Explicit lower bound; defaults to the smallest value
    pub min: Option<f64>,
    /// Explicit upper bound; defaults to the largest value
    pub max: Option<f64>,
}

impl EqualWidthBinning {
    /// Equal-width binning over the data range
    pub fn new(rule: BinCountRule) -> Self {
        EqualWidthBinning {
            rule,
            min: None,
            max: None,
        }
    }
}

impl BinningAlgorithm for EqualWidthBinning {
    fn generate_bins(&self, values: &[f64]) -> EngineResult<Vec<Bin>> {
        let Some((lo, hi, values)) = in_range(values, self.min, self.max)? else {
            return Ok(Vec::new());
        };
        let count = self.rule.bin_count(&values, lo, hi)?;
        Ok(fill_uniform(&values, lo, hi, count))
    }
}

/// Bins of a fixed width, starting at the data (or explicit) minimum
#[derive(Debug, Clone, PartialEq)]
pub struct FixedWidthBinning {
    /// Width of each bin
    pub width: f64,
    /// Explicit lower bound; defaults to the smallest value
    pub min: Option<f64>,
    /// Explicit upper bound; defaults to the largest value
    pub max: Option<f64>,
}

impl BinningAlgorithm for FixedWidthBinning {
    fn generate_bins(&self, values: &[f64]) -> EngineResult<Vec<Bin>> {
        if !(self.width > 0.0 && self.width.is_finite()) {
            return Err(EngineError::InvalidInput(format!(
                "Bin width must be a positive number, got {}",
                self.width
            )));
        }
        let Some((lo, hi, values)) = in_range(values, self.min, self.max)? else {
            return Ok(Vec::new());
        };
        let count = checked_count((hi - lo) / self.width)?;
        Ok(fill_uniform(&values, lo, lo + count as f64 * self.width, count))
    }
}

/// Equal-frequency bins holding about `per_bin` values each
///
/// Equal values never straddle two bins, so a bin may hold more than
/// `per_bin` values.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityBinning {
    /// Target number of values per bin
    pub per_bin: usize,
}

impl BinningAlgorithm for DensityBinning {
    fn generate_bins(&self, values: &[f64]) -> EngineResult<Vec<Bin>> {
        if self.per_bin == 0 {
            return Err(EngineError::InvalidInput(
                "Values per bin must be at least 1".to_string(),
            ));
        }
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        sorted.sort_by(f64::total_cmp);

        let mut bins = Vec::new();
        let mut start = 0;
        while start < sorted.len() {
            let mut end = (start + self.per_bin).min(sorted.len());
            while end < sorted.len() && sorted[end] == sorted[end - 1] {
                end += 1;
            }
            bins.push(Bin {
                index: bins.len(),
                min: sorted[start],
                max: sorted.get(end).copied().unwrap_or(sorted[end - 1]),
                count: end - start,
            });
            start = end;
        }
        Ok(bins)
    }
}

/// Resolve the binning range and keep the values inside it
fn in_range(
    values: &[f64],
    min: Option<f64>,
    max: Option<f64>,
) -> EngineResult<Option<(f64, f64, Vec<f64>)>> {
    if let (Some(lo), Some(hi)) = (min, max) {
        if lo > hi {
            return Err(EngineError::InvalidInput(format!(
                "Histogram minimum {} is greater than maximum {}",
                lo, hi
            )));
        }
    }
    let kept: Vec<f64> = values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .filter(|v| min.map_or(true, |lo| *v >= lo) && max.map_or(true, |hi| *v <= hi))
        .collect();
    if kept.is_empty() {
        return Ok(None);
    }
    let lo = min.unwrap_or_else(|| kept.iter().copied().fold(f64::INFINITY, f64::min));
    let hi = max.unwrap_or_else(|| kept.iter().copied().fold(f64::NEG_INFINITY, f64::max));
    Ok(Some((lo, hi, kept)))
}

/// Round a bin count up, rejecting counts above [`MAX_BINS`]
fn checked_count(count: f64) -> EngineResult<usize> {
    let count = count.ceil();
    if !count.is_finite() || count > MAX_BINS as f64 {
        return Err(EngineError::InvalidInput(format!(
            "Histogram would need {} bins, more than the limit of {}",
            count, MAX_BINS
        )));
    }
    Ok((count as usize).max(1))
}

/// Count values into `count` bins of equal width spanning `[lo, hi]`
fn fill_uniform(values: &[f64], lo: f64, hi: f64, count: usize) -> Vec<Bin> {
    let width = (hi - lo) / count as f64;
    let mut bins: Vec<Bin> = (0..count)
        .map(|index| Bin {
            index,
            min: lo + index as f64 * width,
            max: if index + 1 == count {
                hi
            } else {
                lo + (index + 1) as f64 * width
            },
            count: 0,
        })
        .collect();

    for &value in values {
        let slot = if width > 0.0 {
            (((value - lo) / width).floor() as usize).min(count - 1)
        } else {
            0
        };
        bins[slot].count += 1;
    }
    bins
}
