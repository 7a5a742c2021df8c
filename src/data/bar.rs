use serde::{Serialize, Deserialize};

/// One OHLC market observation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bar {
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
}

impl Bar {
    pub fn new(open: f64, close: f64, high: f64, low: f64) -> Bar {
        Bar { open, close, high, low }
    }

    /// All four fields set to `value`.
    pub fn flat(value: f64) -> Bar {
        Bar::new(value, value, value, value)
    }

    /// Fields in network input order: open, close, high, low.
    pub fn to_array(&self) -> [f64; 4] {
        [self.open, self.close, self.high, self.low]
    }

    pub fn map<F: Fn(f64) -> f64>(&self, f: F) -> Bar {
        Bar::new(f(self.open), f(self.close), f(self.high), f(self.low))
    }

    pub fn min_field(&self) -> f64 {
        self.open.min(self.close).min(self.high).min(self.low)
    }

    pub fn max_field(&self) -> f64 {
        self.open.max(self.close).max(self.high).max(self.low)
    }
}
