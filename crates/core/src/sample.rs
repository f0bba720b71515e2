//! Screen-space samples and the sink that consumes them.

use serde::{Deserialize, Serialize};

use crate::color::Hsba;

/// One colored point in screen space, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub color: Hsba,
}

/// Receives samples as engines emit them.
///
/// Implementors are expected to blend additively: drawing the same
/// coordinate twice brightens it rather than overwriting it.
pub trait SampleSink {
    fn push(&mut self, sample: Sample);
}

impl SampleSink for Vec<Sample> {
    fn push(&mut self, sample: Sample) {
        Vec::push(self, sample);
    }
}

/// A sink that only counts what it receives.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CountingSink {
    pub count: usize,
}

impl SampleSink for CountingSink {
    fn push(&mut self, _sample: Sample) {
        self.count += 1;
    }
}
