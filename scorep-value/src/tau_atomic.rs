/// A running (count, min, max, sum, sum-of-squares) aggregate, as produced by
/// TAU-style atomic counters. Field order on the wire is fixed: `n`, `min`,
/// `max`, `sum`, `sum2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TauAtomicValue {
    pub n: u64,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub sum2: f64,
}

impl TauAtomicValue {
    pub const WIRE_SIZE: usize = 8 + 8 + 8 + 8 + 8;

    pub fn neutral() -> Self {
        TauAtomicValue {
            n: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            sum: 0.0,
            sum2: 0.0,
        }
    }

    pub fn add(&self, other: &Self) -> Self {
        TauAtomicValue {
            n: self.n + other.n,
            min: self.min.min(other.min),
            max: self.max.max(other.max),
            sum: self.sum + other.sum,
            sum2: self.sum2 + other.sum2,
        }
    }

    pub fn byte_swap(&self) -> Self {
        TauAtomicValue {
            n: self.n.swap_bytes(),
            min: f64::from_bits(self.min.to_bits().swap_bytes()),
            max: f64::from_bits(self.max.to_bits().swap_bytes()),
            sum: f64::from_bits(self.sum.to_bits().swap_bytes()),
            sum2: f64::from_bits(self.sum2.to_bits().swap_bytes()),
        }
    }
}

impl Default for TauAtomicValue {
    fn default() -> Self {
        Self::neutral()
    }
}
