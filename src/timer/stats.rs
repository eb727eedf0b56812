//! Delta aggregation and descriptive statistics.

use crate::midi::NoteKind;

/// Round-trip time of one matched note, filed under the dispatched kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeltaSample {
    pub kind: NoteKind,
    pub delta: f64,
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample (n - 1) variance; undefined below two values.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let sum: f64 = values.iter().map(|x| (x - m).powi(2)).sum();
    Some(sum / (values.len() - 1) as f64)
}

pub fn standard_deviation(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}

/// Seconds to milliseconds, rounded to one decimal place.
pub fn to_millis(seconds: f64) -> f64 {
    (seconds * 10_000.0).round() / 10.0
}

/// Summary of one category, in milliseconds rounded to 0.1ms.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStats {
    pub count: usize,
    pub mean_ms: f64,
    pub max_ms: f64,
    pub min_ms: f64,
    /// `None` with fewer than two samples
    pub std_dev_ms: Option<f64>,
}

impl CategoryStats {
    pub fn from_deltas(deltas: &[f64]) -> Option<Self> {
        let mean = mean(deltas)?;
        let max = deltas.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = deltas.iter().copied().fold(f64::INFINITY, f64::min);
        Some(CategoryStats {
            count: deltas.len(),
            mean_ms: to_millis(mean),
            max_ms: to_millis(max),
            min_ms: to_millis(min),
            std_dev_ms: standard_deviation(deltas).map(to_millis),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatisticsSummary {
    /// No delta was recorded in either category
    Empty,
    Gathered {
        on: Option<CategoryStats>,
        off: Option<CategoryStats>,
        total: Option<CategoryStats>,
    },
}

#[derive(Debug, Clone, Default)]
pub struct StatisticsCollector {
    on: Vec<f64>,
    off: Vec<f64>,
}

impl StatisticsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, sample: DeltaSample) {
        match sample.kind {
            NoteKind::On => self.on.push(sample.delta),
            NoteKind::Off => self.off.push(sample.delta),
        }
    }

    pub fn deltas(&self, kind: NoteKind) -> &[f64] {
        match kind {
            NoteKind::On => &self.on,
            NoteKind::Off => &self.off,
        }
    }

    pub fn len(&self) -> usize {
        self.on.len() + self.off.len()
    }

    pub fn is_empty(&self) -> bool {
        self.on.is_empty() && self.off.is_empty()
    }

    pub fn finalize(&self) -> StatisticsSummary {
        if self.is_empty() {
            return StatisticsSummary::Empty;
        }

        let total: Vec<f64> = self.on.iter().chain(self.off.iter()).copied().collect();
        StatisticsSummary::Gathered {
            on: CategoryStats::from_deltas(&self.on),
            off: CategoryStats::from_deltas(&self.off),
            total: CategoryStats::from_deltas(&total),
        }
    }
}
