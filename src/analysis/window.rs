use crate::analysis::table::MeasurementTable;
use std::ops::Range;
use thiserror::Error;

/// Invalid position windows
#[derive(Error, Debug, PartialEq)]
pub enum WindowError {
    #[error("Window start {0} cm must be a non-negative number")]
    NegativeStart(f64),

    #[error("Window start {0} cm must be below window end {1} cm")]
    EmptyWindow(f64, f64),
}

/// Inclusive position range in centimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Window {
    pub cm_lo: f64,
    pub cm_hi: f64,
}

impl Window {
    /// Builds a window, requiring `0 <= cm_lo < cm_hi`.
    pub fn new(cm_lo: f64, cm_hi: f64) -> Result<Window, WindowError> {
        if !(cm_lo >= 0.0 && cm_lo.is_finite()) {
            return Err(WindowError::NegativeStart(cm_lo));
        }
        if !(cm_lo < cm_hi) {
            return Err(WindowError::EmptyWindow(cm_lo, cm_hi));
        }
        Ok(Window { cm_lo, cm_hi })
    }

    pub fn contains(&self, cm: f64) -> bool {
        self.cm_lo <= cm && cm <= self.cm_hi
    }
}

impl Default for Window {
    fn default() -> Self {
        Window { cm_lo: 0.0, cm_hi: f64::INFINITY }
    }
}

/// Summary of the pull force of one run inside a window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RunResult {
    Measured { average: f64, peak: f64 },
    /// The window holds no pull force reading for this run
    NotAvailable,
}

impl RunResult {
    pub fn average(&self) -> Option<f64> {
        match self {
            RunResult::Measured { average, .. } => Some(*average),
            RunResult::NotAvailable => None,
        }
    }

    pub fn peak(&self) -> Option<f64> {
        match self {
            RunResult::Measured { peak, .. } => Some(*peak),
            RunResult::NotAvailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, RunResult::Measured { .. })
    }
}

/// Reduces the rows of one run whose position falls inside the window.
///
/// Positions are converted from millimetres to centimetres before the
/// window test. Rows without a pull force are ignored by the mean and max.
pub fn aggregate_window(table: &MeasurementTable, range: Range<usize>, window: &Window) -> RunResult {
    let rows = table.records.get(range).unwrap_or_default();
    let mut count = 0usize;
    let mut sum = 0f64;
    let mut peak = f64::NEG_INFINITY;
    for force in rows
        .iter()
        .filter(|record| window.contains(record.position_mm / 10.0))
        .filter_map(|record| record.pull_force_g)
    {
        count += 1;
        sum += force;
        peak = peak.max(force);
    }
    if count == 0 {
        RunResult::NotAvailable
    } else {
        RunResult::Measured {
            average: sum / count as f64,
            peak,
        }
    }
}
