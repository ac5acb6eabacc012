//! The Value model: a tagged union of the numeric cell types a Cube-style
//! profile report can carry, grounded on `SCOREP_Score_Profile`'s use of
//! `cube::Value`/`TauAtomicValue` (see `vendor/cubelib/.../CubeValue.cpp` in
//! the original sources) and rearchitected per the "virtual-method hierarchy
//! of value variants -> tagged union" design note: one `enum` discriminated
//! by [`ValueType`], with a small dispatch table of associated functions
//! instead of a `Value*` vtable.
//!
//! The newtype-handle-plus-manual-wire-shape style here follows
//! `fxprof_processed_profile::category::CategoryHandle`: small Copy types
//! with an explicit, documented on-wire representation.

mod error;
mod tau_atomic;

pub use error::ValueError;
pub use tau_atomic::TauAtomicValue;

use byteorder::{ByteOrder, NativeEndian};

/// Discriminant for [`Value`]. `Histogram` and `NDoubles` do not carry their
/// arity in the tag itself (the arity is a separate, runtime-known
/// parameter fixed at construction, exactly as spec.md §4.1 describes) —
/// call sites that need to parse a value from a byte stream must supply the
/// arity alongside the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Double,
    Complex,
    MinDouble,
    MaxDouble,
    TauAtomic,
    Histogram,
    NDoubles,
    ScaleFunction,
}

impl ValueType {
    /// Wire discriminant for this tag, used wherever a request/response
    /// payload needs to name a metric's value type (e.g. `DefineMetric`'s
    /// `data_type` field).
    pub fn to_u32(self) -> u32 {
        match self {
            ValueType::Int8 => 0,
            ValueType::Uint8 => 1,
            ValueType::Int16 => 2,
            ValueType::Uint16 => 3,
            ValueType::Int32 => 4,
            ValueType::Uint32 => 5,
            ValueType::Int64 => 6,
            ValueType::Uint64 => 7,
            ValueType::Double => 8,
            ValueType::Complex => 9,
            ValueType::MinDouble => 10,
            ValueType::MaxDouble => 11,
            ValueType::TauAtomic => 12,
            ValueType::Histogram => 13,
            ValueType::NDoubles => 14,
            ValueType::ScaleFunction => 15,
        }
    }

    pub fn from_u32(v: u32) -> Option<ValueType> {
        Some(match v {
            0 => ValueType::Int8,
            1 => ValueType::Uint8,
            2 => ValueType::Int16,
            3 => ValueType::Uint16,
            4 => ValueType::Int32,
            5 => ValueType::Uint32,
            6 => ValueType::Int64,
            7 => ValueType::Uint64,
            8 => ValueType::Double,
            9 => ValueType::Complex,
            10 => ValueType::MinDouble,
            11 => ValueType::MaxDouble,
            12 => ValueType::TauAtomic,
            13 => ValueType::Histogram,
            14 => ValueType::NDoubles,
            15 => ValueType::ScaleFunction,
            _ => return None,
        })
    }
}

/// A histogram value: a fixed, runtime-known number of bin counts.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramValue {
    pub bins: Vec<u64>,
}

/// A piecewise scale-function descriptor. Opaque to aggregation beyond
/// `add`/`subtract` over its raw coefficient payload; the estimator never
/// interprets the pieces themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleFunctionValue {
    pub kind: u32,
    pub coefficients: Vec<f64>,
}

/// A single profile metric cell. See the module docs for the rearchitecture
/// rationale.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int8(i8),
    Uint8(u8),
    Int16(i16),
    Uint16(u16),
    Int32(i32),
    Uint32(u32),
    Int64(i64),
    Uint64(u64),
    Double(f64),
    Complex { re: f64, im: f64 },
    MinDouble(f64),
    MaxDouble(f64),
    TauAtomic(TauAtomicValue),
    Histogram(HistogramValue),
    NDoubles(Vec<f64>),
    ScaleFunction(ScaleFunctionValue),
}

impl Value {
    pub fn tag(&self) -> ValueType {
        match self {
            Value::Int8(_) => ValueType::Int8,
            Value::Uint8(_) => ValueType::Uint8,
            Value::Int16(_) => ValueType::Int16,
            Value::Uint16(_) => ValueType::Uint16,
            Value::Int32(_) => ValueType::Int32,
            Value::Uint32(_) => ValueType::Uint32,
            Value::Int64(_) => ValueType::Int64,
            Value::Uint64(_) => ValueType::Uint64,
            Value::Double(_) => ValueType::Double,
            Value::Complex { .. } => ValueType::Complex,
            Value::MinDouble(_) => ValueType::MinDouble,
            Value::MaxDouble(_) => ValueType::MaxDouble,
            Value::TauAtomic(_) => ValueType::TauAtomic,
            Value::Histogram(_) => ValueType::Histogram,
            Value::NDoubles(_) => ValueType::NDoubles,
            Value::ScaleFunction(_) => ValueType::ScaleFunction,
        }
    }

    /// Size in bytes on the wire, matching `size()` in spec.md §4.1.
    pub fn size(&self) -> usize {
        match self {
            Value::Int8(_) | Value::Uint8(_) => 1,
            Value::Int16(_) | Value::Uint16(_) => 2,
            Value::Int32(_) | Value::Uint32(_) => 4,
            Value::Int64(_) | Value::Uint64(_) => 8,
            Value::Double(_) | Value::MinDouble(_) | Value::MaxDouble(_) => 8,
            Value::Complex { .. } => 16,
            Value::TauAtomic(_) => TauAtomicValue::WIRE_SIZE,
            Value::Histogram(h) => 8 * h.bins.len(),
            Value::NDoubles(v) => 8 * v.len(),
            Value::ScaleFunction(s) => 4 + 8 * s.coefficients.len(),
        }
    }

    /// An uninitialized cell of the given tag, matching `fromType(tag)`.
    /// `arity` is required (and only meaningful) for `Histogram`/`NDoubles`.
    pub fn from_type(tag: ValueType, arity: Option<u32>) -> Result<Value, ValueError> {
        Ok(match tag {
            ValueType::Int8 => Value::Int8(0),
            ValueType::Uint8 => Value::Uint8(0),
            ValueType::Int16 => Value::Int16(0),
            ValueType::Uint16 => Value::Uint16(0),
            ValueType::Int32 => Value::Int32(0),
            ValueType::Uint32 => Value::Uint32(0),
            ValueType::Int64 => Value::Int64(0),
            ValueType::Uint64 => Value::Uint64(0),
            ValueType::Double => Value::Double(0.0),
            ValueType::Complex => Value::Complex { re: 0.0, im: 0.0 },
            ValueType::MinDouble => Value::MinDouble(f64::INFINITY),
            ValueType::MaxDouble => Value::MaxDouble(f64::NEG_INFINITY),
            ValueType::TauAtomic => Value::TauAtomic(TauAtomicValue::neutral()),
            ValueType::Histogram => {
                let n = arity.ok_or(ValueError::MissingArity)? as usize;
                Value::Histogram(HistogramValue { bins: vec![0; n] })
            }
            ValueType::NDoubles => {
                let n = arity.ok_or(ValueError::MissingArity)? as usize;
                Value::NDoubles(vec![0.0; n])
            }
            ValueType::ScaleFunction => Value::ScaleFunction(ScaleFunctionValue {
                kind: 0,
                coefficients: Vec::new(),
            }),
        })
    }

    /// The additive neutral element for `tag` (0 for numerics, an
    /// all-zero/empty composite for the aggregate types).
    pub fn neutral_sum(tag: ValueType, arity: Option<u32>) -> Result<Value, ValueError> {
        Self::from_type(tag, arity)
    }

    /// The neutral element under `min`: `+infinity` for doubles, `MAX` for
    /// unsigned/signed integrals.
    pub fn neutral_min(tag: ValueType) -> Result<Value, ValueError> {
        Ok(match tag {
            ValueType::Int8 => Value::Int8(i8::MAX),
            ValueType::Uint8 => Value::Uint8(u8::MAX),
            ValueType::Int16 => Value::Int16(i16::MAX),
            ValueType::Uint16 => Value::Uint16(u16::MAX),
            ValueType::Int32 => Value::Int32(i32::MAX),
            ValueType::Uint32 => Value::Uint32(u32::MAX),
            ValueType::Int64 => Value::Int64(i64::MAX),
            ValueType::Uint64 => Value::Uint64(u64::MAX),
            ValueType::Double | ValueType::MinDouble | ValueType::MaxDouble => {
                Value::MinDouble(f64::INFINITY)
            }
            other => return Err(ValueError::UnsupportedOperation(other)),
        })
    }

    /// The neutral element under `max`: `-infinity` for doubles, `MIN` for
    /// unsigned/signed integrals.
    pub fn neutral_max(tag: ValueType) -> Result<Value, ValueError> {
        Ok(match tag {
            ValueType::Int8 => Value::Int8(i8::MIN),
            ValueType::Uint8 => Value::Uint8(u8::MIN),
            ValueType::Int16 => Value::Int16(i16::MIN),
            ValueType::Uint16 => Value::Uint16(u16::MIN),
            ValueType::Int32 => Value::Int32(i32::MIN),
            ValueType::Uint32 => Value::Uint32(u32::MIN),
            ValueType::Int64 => Value::Int64(i64::MIN),
            ValueType::Uint64 => Value::Uint64(u64::MIN),
            ValueType::Double | ValueType::MinDouble | ValueType::MaxDouble => {
                Value::MaxDouble(f64::NEG_INFINITY)
            }
            other => return Err(ValueError::UnsupportedOperation(other)),
        })
    }

    /// Sum of `self` and `other`. TauAtomic merges counts/sums and takes
    /// `min`/`max` of the respective fields, per spec.md §4.1.
    pub fn add(&self, other: &Value) -> Result<Value, ValueError> {
        use Value::*;
        Ok(match (self, other) {
            (Int8(a), Int8(b)) => Int8(a.wrapping_add(*b)),
            (Uint8(a), Uint8(b)) => Uint8(a.wrapping_add(*b)),
            (Int16(a), Int16(b)) => Int16(a.wrapping_add(*b)),
            (Uint16(a), Uint16(b)) => Uint16(a.wrapping_add(*b)),
            (Int32(a), Int32(b)) => Int32(a.wrapping_add(*b)),
            (Uint32(a), Uint32(b)) => Uint32(a.wrapping_add(*b)),
            (Int64(a), Int64(b)) => Int64(a.wrapping_add(*b)),
            (Uint64(a), Uint64(b)) => Uint64(a.wrapping_add(*b)),
            (Double(a), Double(b)) => Double(a + b),
            (Complex { re: ar, im: ai }, Complex { re: br, im: bi }) => Complex {
                re: ar + br,
                im: ai + bi,
            },
            (MinDouble(a), MinDouble(b)) => MinDouble(a.min(*b)),
            (MaxDouble(a), MaxDouble(b)) => MaxDouble(a.max(*b)),
            (TauAtomic(a), TauAtomic(b)) => TauAtomic(a.add(b)),
            (NDoubles(a), NDoubles(b)) if a.len() == b.len() => {
                NDoubles(a.iter().zip(b).map(|(x, y)| x + y).collect())
            }
            (Histogram(a), Histogram(b)) if a.bins.len() == b.bins.len() => {
                Histogram(HistogramValue {
                    bins: a
                        .bins
                        .iter()
                        .zip(&b.bins)
                        .map(|(x, y)| x + y)
                        .collect(),
                })
            }
            _ => return Err(ValueError::ShapeMismatch(self.tag(), other.tag())),
        })
    }

    /// Difference of `self` and `other`, defined for every variant `add`
    /// supports except TauAtomic (subtracting atomics is not meaningful:
    /// min/max cannot be un-merged), per spec.md §4.1 ("subtract where
    /// defined").
    pub fn subtract(&self, other: &Value) -> Result<Value, ValueError> {
        use Value::*;
        Ok(match (self, other) {
            (Int8(a), Int8(b)) => Int8(a.wrapping_sub(*b)),
            (Uint8(a), Uint8(b)) => Uint8(a.wrapping_sub(*b)),
            (Int16(a), Int16(b)) => Int16(a.wrapping_sub(*b)),
            (Uint16(a), Uint16(b)) => Uint16(a.wrapping_sub(*b)),
            (Int32(a), Int32(b)) => Int32(a.wrapping_sub(*b)),
            (Uint32(a), Uint32(b)) => Uint32(a.wrapping_sub(*b)),
            (Int64(a), Int64(b)) => Int64(a.wrapping_sub(*b)),
            (Uint64(a), Uint64(b)) => Uint64(a.wrapping_sub(*b)),
            (Double(a), Double(b)) => Double(a - b),
            (Complex { re: ar, im: ai }, Complex { re: br, im: bi }) => Complex {
                re: ar - br,
                im: ai - bi,
            },
            (NDoubles(a), NDoubles(b)) if a.len() == b.len() => {
                NDoubles(a.iter().zip(b).map(|(x, y)| x - y).collect())
            }
            (TauAtomic(_), TauAtomic(_)) => {
                return Err(ValueError::UnsupportedOperation(ValueType::TauAtomic))
            }
            _ => return Err(ValueError::ShapeMismatch(self.tag(), other.tag())),
        })
    }

    /// Byte-reverse every primitive sub-field, in declaration order. This
    /// is self-inverse: `v.byte_swap().byte_swap() == v`.
    pub fn byte_swap(&self) -> Value {
        use Value::*;
        match self {
            Int8(v) => Int8(*v),
            Uint8(v) => Uint8(*v),
            Int16(v) => Int16(v.swap_bytes()),
            Uint16(v) => Uint16(v.swap_bytes()),
            Int32(v) => Int32(v.swap_bytes()),
            Uint32(v) => Uint32(v.swap_bytes()),
            Int64(v) => Int64(v.swap_bytes()),
            Uint64(v) => Uint64(v.swap_bytes()),
            Double(v) => Double(f64::from_bits(v.to_bits().swap_bytes())),
            Complex { re, im } => Complex {
                re: f64::from_bits(re.to_bits().swap_bytes()),
                im: f64::from_bits(im.to_bits().swap_bytes()),
            },
            MinDouble(v) => MinDouble(f64::from_bits(v.to_bits().swap_bytes())),
            MaxDouble(v) => MaxDouble(f64::from_bits(v.to_bits().swap_bytes())),
            TauAtomic(v) => TauAtomic(v.byte_swap()),
            Histogram(h) => Histogram(HistogramValue {
                bins: h.bins.iter().map(|b| b.swap_bytes()).collect(),
            }),
            NDoubles(v) => NDoubles(
                v.iter()
                    .map(|x| f64::from_bits(x.to_bits().swap_bytes()))
                    .collect(),
            ),
            ScaleFunction(s) => ScaleFunction(ScaleFunctionValue {
                kind: s.kind.swap_bytes(),
                coefficients: s
                    .coefficients
                    .iter()
                    .map(|x| f64::from_bits(x.to_bits().swap_bytes()))
                    .collect(),
            }),
        }
    }

    /// Append the wire representation of this value, in the host's native
    /// byte order, to `buf`. Per spec.md §4.7, the wire always carries
    /// *some* host's native order; the reader corrects with [`Value::byte_swap`]
    /// when the connection's negotiated endianness differs.
    pub fn write_native(&self, buf: &mut Vec<u8>) {
        use Value::*;
        match self {
            Int8(v) => buf.push(*v as u8),
            Uint8(v) => buf.push(*v),
            Int16(v) => {
                let mut b = [0u8; 2];
                NativeEndian::write_i16(&mut b, *v);
                buf.extend_from_slice(&b);
            }
            Uint16(v) => {
                let mut b = [0u8; 2];
                NativeEndian::write_u16(&mut b, *v);
                buf.extend_from_slice(&b);
            }
            Int32(v) => {
                let mut b = [0u8; 4];
                NativeEndian::write_i32(&mut b, *v);
                buf.extend_from_slice(&b);
            }
            Uint32(v) => {
                let mut b = [0u8; 4];
                NativeEndian::write_u32(&mut b, *v);
                buf.extend_from_slice(&b);
            }
            Int64(v) => {
                let mut b = [0u8; 8];
                NativeEndian::write_i64(&mut b, *v);
                buf.extend_from_slice(&b);
            }
            Uint64(v) => {
                let mut b = [0u8; 8];
                NativeEndian::write_u64(&mut b, *v);
                buf.extend_from_slice(&b);
            }
            Double(v) | MinDouble(v) | MaxDouble(v) => {
                let mut b = [0u8; 8];
                NativeEndian::write_f64(&mut b, *v);
                buf.extend_from_slice(&b);
            }
            Complex { re, im } => {
                let mut b = [0u8; 8];
                NativeEndian::write_f64(&mut b, *re);
                buf.extend_from_slice(&b);
                NativeEndian::write_f64(&mut b, *im);
                buf.extend_from_slice(&b);
            }
            TauAtomic(t) => {
                let mut b8 = [0u8; 8];
                NativeEndian::write_u64(&mut b8, t.n);
                buf.extend_from_slice(&b8);
                for f in [t.min, t.max, t.sum, t.sum2] {
                    NativeEndian::write_f64(&mut b8, f);
                    buf.extend_from_slice(&b8);
                }
            }
            Histogram(h) => {
                for bin in &h.bins {
                    let mut b = [0u8; 8];
                    NativeEndian::write_u64(&mut b, *bin);
                    buf.extend_from_slice(&b);
                }
            }
            NDoubles(v) => {
                for x in v {
                    let mut b = [0u8; 8];
                    NativeEndian::write_f64(&mut b, *x);
                    buf.extend_from_slice(&b);
                }
            }
            ScaleFunction(s) => {
                let mut b4 = [0u8; 4];
                NativeEndian::write_u32(&mut b4, s.kind);
                buf.extend_from_slice(&b4);
                for c in &s.coefficients {
                    let mut b8 = [0u8; 8];
                    NativeEndian::write_f64(&mut b8, *c);
                    buf.extend_from_slice(&b8);
                }
            }
        }
    }

    /// Scalar interpretation of `self` as an unsigned count, matching
    /// `cube::Value::getUnsignedLong()`. `TauAtomic` reports its sample
    /// count `n`, as `getUnsignedLong()` does for TAU_ATOMIC cells.
    pub fn as_u64(&self) -> u64 {
        match self {
            Value::Int8(v) => *v as u64,
            Value::Uint8(v) => *v as u64,
            Value::Int16(v) => *v as u64,
            Value::Uint16(v) => *v as u64,
            Value::Int32(v) => *v as u64,
            Value::Uint32(v) => *v as u64,
            Value::Int64(v) => *v as u64,
            Value::Uint64(v) => *v,
            Value::Double(v) | Value::MinDouble(v) | Value::MaxDouble(v) => *v as u64,
            Value::Complex { re, .. } => *re as u64,
            Value::TauAtomic(t) => t.n,
            Value::Histogram(h) => h.bins.iter().sum(),
            Value::NDoubles(v) => v.iter().sum::<f64>() as u64,
            Value::ScaleFunction(_) => 0,
        }
    }

    /// Scalar interpretation of `self` as a double, matching
    /// `cube::Value::getDouble()`. `TauAtomic` reports its running `sum`,
    /// as `getDouble()` does for TAU_ATOMIC cells.
    pub fn as_f64(&self) -> f64 {
        match self {
            Value::Int8(v) => *v as f64,
            Value::Uint8(v) => *v as f64,
            Value::Int16(v) => *v as f64,
            Value::Uint16(v) => *v as f64,
            Value::Int32(v) => *v as f64,
            Value::Uint32(v) => *v as f64,
            Value::Int64(v) => *v as f64,
            Value::Uint64(v) => *v as f64,
            Value::Double(v) | Value::MinDouble(v) | Value::MaxDouble(v) => *v,
            Value::Complex { re, .. } => *re,
            Value::TauAtomic(t) => t.sum,
            Value::Histogram(h) => h.bins.iter().sum::<u64>() as f64,
            Value::NDoubles(v) => v.iter().sum(),
            Value::ScaleFunction(_) => 0.0,
        }
    }

    /// Parse a value of the given `tag` (with `arity` for Histogram/NDoubles,
    /// and `arity` doubling as the coefficient count for ScaleFunction) out
    /// of `bytes`, then byte-swap it if `swap` is set. This is
    /// `fromByteStream(tag, bytes, trafo)` from spec.md §4.1.
    pub fn from_byte_stream(
        tag: ValueType,
        arity: Option<u32>,
        bytes: &[u8],
        swap: bool,
    ) -> Result<Value, ValueError> {
        let value = Self::parse_native(tag, arity, bytes)?;
        Ok(if swap { value.byte_swap() } else { value })
    }

    fn parse_native(tag: ValueType, arity: Option<u32>, bytes: &[u8]) -> Result<Value, ValueError> {
        let need = |n: usize| -> Result<(), ValueError> {
            if bytes.len() < n {
                Err(ValueError::Truncated {
                    expected: n,
                    actual: bytes.len(),
                })
            } else {
                Ok(())
            }
        };
        Ok(match tag {
            ValueType::Int8 => {
                need(1)?;
                Value::Int8(bytes[0] as i8)
            }
            ValueType::Uint8 => {
                need(1)?;
                Value::Uint8(bytes[0])
            }
            ValueType::Int16 => {
                need(2)?;
                Value::Int16(NativeEndian::read_i16(bytes))
            }
            ValueType::Uint16 => {
                need(2)?;
                Value::Uint16(NativeEndian::read_u16(bytes))
            }
            ValueType::Int32 => {
                need(4)?;
                Value::Int32(NativeEndian::read_i32(bytes))
            }
            ValueType::Uint32 => {
                need(4)?;
                Value::Uint32(NativeEndian::read_u32(bytes))
            }
            ValueType::Int64 => {
                need(8)?;
                Value::Int64(NativeEndian::read_i64(bytes))
            }
            ValueType::Uint64 => {
                need(8)?;
                Value::Uint64(NativeEndian::read_u64(bytes))
            }
            ValueType::Double => {
                need(8)?;
                Value::Double(NativeEndian::read_f64(bytes))
            }
            ValueType::MinDouble => {
                need(8)?;
                Value::MinDouble(NativeEndian::read_f64(bytes))
            }
            ValueType::MaxDouble => {
                need(8)?;
                Value::MaxDouble(NativeEndian::read_f64(bytes))
            }
            ValueType::Complex => {
                need(16)?;
                Value::Complex {
                    re: NativeEndian::read_f64(&bytes[0..8]),
                    im: NativeEndian::read_f64(&bytes[8..16]),
                }
            }
            ValueType::TauAtomic => {
                need(TauAtomicValue::WIRE_SIZE)?;
                Value::TauAtomic(TauAtomicValue {
                    n: NativeEndian::read_u64(&bytes[0..8]),
                    min: NativeEndian::read_f64(&bytes[8..16]),
                    max: NativeEndian::read_f64(&bytes[16..24]),
                    sum: NativeEndian::read_f64(&bytes[24..32]),
                    sum2: NativeEndian::read_f64(&bytes[32..40]),
                })
            }
            ValueType::Histogram => {
                let n = arity.ok_or(ValueError::MissingArity)? as usize;
                need(8 * n)?;
                let bins = (0..n)
                    .map(|i| NativeEndian::read_u64(&bytes[i * 8..i * 8 + 8]))
                    .collect();
                Value::Histogram(HistogramValue { bins })
            }
            ValueType::NDoubles => {
                let n = arity.ok_or(ValueError::MissingArity)? as usize;
                need(8 * n)?;
                let vals = (0..n)
                    .map(|i| NativeEndian::read_f64(&bytes[i * 8..i * 8 + 8]))
                    .collect();
                Value::NDoubles(vals)
            }
            ValueType::ScaleFunction => {
                need(4)?;
                let kind = NativeEndian::read_u32(&bytes[0..4]);
                let n = arity.unwrap_or(0) as usize;
                need(4 + 8 * n)?;
                let coefficients = (0..n)
                    .map(|i| NativeEndian::read_f64(&bytes[4 + i * 8..4 + i * 8 + 8]))
                    .collect();
                Value::ScaleFunction(ScaleFunctionValue { kind, coefficients })
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_swap_is_self_inverse() {
        let values = vec![
            Value::Int64(-12345),
            Value::Uint32(0xdead_beef),
            Value::Double(3.5),
            Value::Complex { re: 1.0, im: -2.0 },
            Value::TauAtomic(TauAtomicValue {
                n: 7,
                min: 0.5,
                max: 9.0,
                sum: 20.0,
                sum2: 80.0,
            }),
            Value::Histogram(HistogramValue {
                bins: vec![1, 2, 3],
            }),
            Value::NDoubles(vec![1.0, 2.0, 3.0]),
        ];
        for v in values {
            assert_eq!(v.byte_swap().byte_swap(), v, "failed for {v:?}");
        }
    }

    #[test]
    fn tau_atomic_add_merges_min_max() {
        let a = TauAtomicValue {
            n: 2,
            min: 1.0,
            max: 5.0,
            sum: 6.0,
            sum2: 26.0,
        };
        let b = TauAtomicValue {
            n: 3,
            min: 0.5,
            max: 9.0,
            sum: 10.0,
            sum2: 50.0,
        };
        let c = a.add(&b);
        assert_eq!(c.n, 5);
        assert_eq!(c.min, 0.5);
        assert_eq!(c.max, 9.0);
        assert_eq!(c.sum, 16.0);
        assert_eq!(c.sum2, 76.0);
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let a = Value::Int32(1);
        let b = Value::Double(1.0);
        assert_eq!(
            a.add(&b),
            Err(ValueError::ShapeMismatch(ValueType::Int32, ValueType::Double))
        );
    }

    #[test]
    fn round_trip_through_wire_bytes() {
        let v = Value::Uint64(123456789);
        let mut buf = Vec::new();
        v.write_native(&mut buf);
        let parsed = Value::from_byte_stream(ValueType::Uint64, None, &buf, false).unwrap();
        assert_eq!(parsed, v);
    }

    #[test]
    fn ndoubles_round_trip_with_arity() {
        let v = Value::NDoubles(vec![1.5, -2.25, 3.0]);
        let mut buf = Vec::new();
        v.write_native(&mut buf);
        let parsed = Value::from_byte_stream(ValueType::NDoubles, Some(3), &buf, false).unwrap();
        assert_eq!(parsed, v);
    }

    #[test]
    fn value_type_tag_round_trips() {
        for tag in [
            ValueType::Int8,
            ValueType::Uint64,
            ValueType::Double,
            ValueType::TauAtomic,
            ValueType::Histogram,
            ValueType::ScaleFunction,
        ] {
            assert_eq!(ValueType::from_u32(tag.to_u32()), Some(tag));
        }
        assert_eq!(ValueType::from_u32(999), None);
    }

    #[test]
    fn sizes_match_wire_layout() {
        assert_eq!(Value::Int8(0).size(), 1);
        assert_eq!(Value::Uint64(0).size(), 8);
        assert_eq!(Value::Complex { re: 0.0, im: 0.0 }.size(), 16);
        assert_eq!(Value::TauAtomic(TauAtomicValue::neutral()).size(), 40);
        assert_eq!(
            Value::Histogram(HistogramValue { bins: vec![0; 4] }).size(),
            32
        );
    }
}
