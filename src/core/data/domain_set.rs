use crate::core::data::unit::{Unit, is_missing};
use std::fmt;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainSetError {
    #[error("domain set must contain at least one sample")]
    Empty,
    #[error("sample {index} is not finite: {value}")]
    NonFinite { index: usize, value: f64 },
    #[error("samples must be strictly monotonic (sample {index} breaks the order)")]
    NotMonotonic { index: usize },
}

/// An ordered, finite sequence of sample coordinates (times, levels, ...).
///
/// Read-only to everything in this crate; owned by the data being animated.
pub trait DomainSet: Send + Sync + fmt::Debug {
    fn len(&self) -> usize;

    fn value(&self, index: usize) -> Option<f64>;

    /// Index of the sample closest to `value`; equal distances resolve to
    /// the sample that comes first in the set's order. `None` for missing
    /// values.
    fn nearest_index(&self, value: f64) -> Option<usize>;

    fn unit(&self) -> Option<&Unit>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn samples(&self) -> Vec<f64> {
        (0..self.len()).filter_map(|i| self.value(i)).collect()
    }

    /// Structural equality across implementations.
    fn same_domain(&self, other: &dyn DomainSet) -> bool {
        self.len() == other.len()
            && self.unit() == other.unit()
            && (0..self.len()).all(|i| self.value(i) == other.value(i))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOrder {
    Ascending,
    Descending,
}

/// Explicit, strictly monotonic samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Gridded1DSet {
    samples: Vec<f64>,
    order: SampleOrder,
    unit: Option<Unit>,
}

impl Gridded1DSet {
    pub fn new(samples: Vec<f64>, unit: Option<Unit>) -> Result<Self, DomainSetError> {
        if samples.is_empty() {
            return Err(DomainSetError::Empty);
        }
        if let Some((index, &value)) = samples.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(DomainSetError::NonFinite { index, value });
        }

        let order = if samples.len() > 1 && samples[1] < samples[0] {
            SampleOrder::Descending
        } else {
            SampleOrder::Ascending
        };

        for (index, pair) in samples.windows(2).enumerate() {
            let in_order = match order {
                SampleOrder::Ascending => pair[0] < pair[1],
                SampleOrder::Descending => pair[0] > pair[1],
            };
            if !in_order {
                return Err(DomainSetError::NotMonotonic { index: index + 1 });
            }
        }

        Ok(Self {
            samples,
            order,
            unit,
        })
    }

    #[must_use]
    pub fn order(&self) -> SampleOrder {
        self.order
    }
}

impl DomainSet for Gridded1DSet {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn value(&self, index: usize) -> Option<f64> {
        self.samples.get(index).copied()
    }

    fn nearest_index(&self, value: f64) -> Option<usize> {
        if is_missing(value) {
            return None;
        }

        // First index whose sample is at or beyond `value` in set order.
        let upper = match self.order {
            SampleOrder::Ascending => self.samples.partition_point(|&s| s < value),
            SampleOrder::Descending => self.samples.partition_point(|&s| s > value),
        };

        if upper == 0 {
            return Some(0);
        }
        if upper == self.samples.len() {
            return Some(self.samples.len() - 1);
        }

        let below = (value - self.samples[upper - 1]).abs();
        let above = (self.samples[upper] - value).abs();
        if above < below {
            Some(upper)
        } else {
            Some(upper - 1)
        }
    }

    fn unit(&self) -> Option<&Unit> {
        self.unit.as_ref()
    }

    fn samples(&self) -> Vec<f64> {
        self.samples.clone()
    }
}

/// `length` evenly spaced samples from `first` to `last` inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct Linear1DSet {
    first: f64,
    last: f64,
    length: usize,
    unit: Option<Unit>,
}

impl Linear1DSet {
    pub fn new(
        first: f64,
        last: f64,
        length: usize,
        unit: Option<Unit>,
    ) -> Result<Self, DomainSetError> {
        if length == 0 {
            return Err(DomainSetError::Empty);
        }
        if !first.is_finite() {
            return Err(DomainSetError::NonFinite {
                index: 0,
                value: first,
            });
        }
        if !last.is_finite() {
            return Err(DomainSetError::NonFinite {
                index: length - 1,
                value: last,
            });
        }
        if length > 1 && first == last {
            return Err(DomainSetError::NotMonotonic { index: 1 });
        }

        Ok(Self {
            first,
            last,
            length,
            unit,
        })
    }

    fn spacing(&self) -> f64 {
        if self.length > 1 {
            (self.last - self.first) / (self.length - 1) as f64
        } else {
            0.0
        }
    }
}

impl DomainSet for Linear1DSet {
    fn len(&self) -> usize {
        self.length
    }

    fn value(&self, index: usize) -> Option<f64> {
        if index >= self.length {
            return None;
        }
        if index == self.length - 1 {
            return Some(self.last);
        }
        Some(self.first + index as f64 * self.spacing())
    }

    fn nearest_index(&self, value: f64) -> Option<usize> {
        if is_missing(value) {
            return None;
        }
        if self.length == 1 {
            return Some(0);
        }

        let position = (value - self.first) / self.spacing();
        // Round half toward the earlier sample.
        let rounded = (position - 0.5).ceil();
        let max = (self.length - 1) as f64;

        Some(rounded.clamp(0.0, max) as usize)
    }

    fn unit(&self) -> Option<&Unit> {
        self.unit.as_ref()
    }
}
