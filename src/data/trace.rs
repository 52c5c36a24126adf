//! Bounded reading history for trend lines.

use std::collections::VecDeque;

/// Added to the span of a trace so a flat trace still scales.
const SPAN_EPSILON: f64 = 1e-9;

/// Fixed-capacity FIFO of the most recent readings of one sensor.
///
/// The oldest reading is evicted once `width` readings are held. The width is
/// normally the number of pixel columns available for the trend line.
#[derive(Debug, Clone)]
pub struct TraceBuffer {
    width: usize,
    values: VecDeque<f64>,
}

impl TraceBuffer {
    /// Create an empty trace holding at most `width` readings.
    pub fn new(width: usize) -> Self {
        let width = width.max(1);
        Self {
            width,
            values: VecDeque::with_capacity(width),
        }
    }

    /// Append a reading, evicting the oldest one when full.
    ///
    /// Non-finite readings are ignored.
    pub fn push(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        if self.values.len() == self.width {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// The readings in insertion order, oldest first.
    pub fn values(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }

    /// The most recent reading.
    pub fn last(&self) -> Option<f64> {
        self.values.back().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Minimum and maximum of the held readings.
    pub fn range(&self) -> Option<(f64, f64)> {
        let first = *self.values.front()?;
        Some(self.values.iter().fold((first, first), |(min, max), &v| (min.min(v), max.max(v))))
    }

    /// Scale every reading to `0..levels` for trend rendering, against
    /// the trace's own [`range`](Self::range).
    ///
    /// Returns an empty Vec for an empty trace.
    pub fn normalized(&self, levels: u8) -> Vec<u8> {
        let Some((min, max)) = self.range() else {
            return Vec::new();
        };
        if levels == 0 {
            return vec![0; self.values.len()];
        }

        let span = max - min + SPAN_EPSILON;
        let top = levels - 1;
        self.values
            .iter()
            .map(|&v| (((v - min) / span * levels as f64) as u8).min(top))
            .collect()
    }
}

impl Extend<f64> for TraceBuffer {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}
