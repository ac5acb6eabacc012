//! Wire primitives (spec.md §4.7/§6): fixed-width integers and doubles in
//! the server's native byte order, length-prefixed strings, and
//! length-prefixed value vectors. [`WireCodec`] carries the one piece of
//! per-connection state the format needs — whether this side must
//! byte-swap relative to its own host order, decided once by the
//! endianness handshake (`handshake::negotiate_endianness_*`).
//!
//! Every primitive is written in *local host* native order and then
//! byte-swapped in place when `swap` is set; this mirrors
//! `scorep_value::Value::byte_swap` exactly, so a [`Value`] and a bare
//! integer cross the wire under the same rule.
use scorep_value::{Value, ValueType};

use crate::error::ProtocolError;

#[derive(Debug, Clone, Copy, Default)]
pub struct WireCodec {
    pub swap: bool,
}

impl WireCodec {
    pub fn new(swap: bool) -> WireCodec {
        WireCodec { swap }
    }

    pub fn write_u32(&self, buf: &mut Vec<u8>, v: u32) {
        let v = if self.swap { v.swap_bytes() } else { v };
        buf.extend_from_slice(&v.to_ne_bytes());
    }

    pub fn write_u64(&self, buf: &mut Vec<u8>, v: u64) {
        let v = if self.swap { v.swap_bytes() } else { v };
        buf.extend_from_slice(&v.to_ne_bytes());
    }

    pub fn write_i32(&self, buf: &mut Vec<u8>, v: i32) {
        self.write_u32(buf, v as u32);
    }

    pub fn write_i64(&self, buf: &mut Vec<u8>, v: i64) {
        self.write_u64(buf, v as u64);
    }

    pub fn write_f64(&self, buf: &mut Vec<u8>, v: f64) {
        self.write_u64(buf, v.to_bits());
    }

    pub fn read_u32(&self, bytes: &[u8]) -> Result<u32, ProtocolError> {
        let arr: [u8; 4] = bytes
            .get(..4)
            .ok_or(ProtocolError::TruncatedFrame { expected: 4, actual: bytes.len() })?
            .try_into()
            .unwrap();
        let v = u32::from_ne_bytes(arr);
        Ok(if self.swap { v.swap_bytes() } else { v })
    }

    pub fn read_u64(&self, bytes: &[u8]) -> Result<u64, ProtocolError> {
        let arr: [u8; 8] = bytes
            .get(..8)
            .ok_or(ProtocolError::TruncatedFrame { expected: 8, actual: bytes.len() })?
            .try_into()
            .unwrap();
        let v = u64::from_ne_bytes(arr);
        Ok(if self.swap { v.swap_bytes() } else { v })
    }

    pub fn read_i32(&self, bytes: &[u8]) -> Result<i32, ProtocolError> {
        Ok(self.read_u32(bytes)? as i32)
    }

    pub fn read_i64(&self, bytes: &[u8]) -> Result<i64, ProtocolError> {
        Ok(self.read_u64(bytes)? as i64)
    }

    pub fn read_f64(&self, bytes: &[u8]) -> Result<f64, ProtocolError> {
        Ok(f64::from_bits(self.read_u64(bytes)?))
    }

    /// `uint32 length | bytes`, no terminator (spec.md §4.7).
    pub fn write_string(&self, buf: &mut Vec<u8>, s: &str) {
        self.write_u32(buf, s.len() as u32);
        buf.extend_from_slice(s.as_bytes());
    }

    /// Reads a length-prefixed string starting at `bytes[0]`, returning the
    /// decoded string and the number of bytes consumed.
    pub fn read_string(&self, bytes: &[u8]) -> Result<(String, usize), ProtocolError> {
        let len = self.read_u32(bytes)? as usize;
        let start = 4;
        let end = start
            .checked_add(len)
            .ok_or(ProtocolError::TruncatedFrame { expected: len, actual: bytes.len() })?;
        let slice = bytes
            .get(start..end)
            .ok_or(ProtocolError::TruncatedFrame { expected: end, actual: bytes.len() })?;
        Ok((String::from_utf8(slice.to_vec())?, end))
    }

    /// `uint32 count | count × <value-body>` (spec.md §4.7/§4.8's "Value
    /// streaming rule"). Every slot shares one `(tag, arity)` — callers
    /// with heterogeneous tags per slot (none exist in the current request
    /// catalogue) would need a per-slot variant.
    pub fn write_value_vec(&self, buf: &mut Vec<u8>, values: &[Value]) {
        self.write_u32(buf, values.len() as u32);
        for v in values {
            let v = if self.swap { v.byte_swap() } else { v.clone() };
            v.write_native(buf);
        }
    }

    /// Writes a single value self-tagged with its `(ValueType, arity)`,
    /// for call sites where the reader has no other way to learn the tag
    /// ahead of time — e.g. a tree query response whose slots span
    /// metrics of different value types. `arity` is `0` for every variant
    /// except `Histogram`/`NDoubles`.
    pub fn write_tagged_value(&self, buf: &mut Vec<u8>, v: &Value) {
        let arity = match v {
            Value::Histogram(h) => h.bins.len() as u32,
            Value::NDoubles(d) => d.len() as u32,
            Value::ScaleFunction(s) => s.coefficients.len() as u32,
            _ => 0,
        };
        self.write_u32(buf, v.tag().to_u32());
        self.write_u32(buf, arity);
        let v = if self.swap { v.byte_swap() } else { v.clone() };
        v.write_native(buf);
    }

    pub fn read_tagged_value(&self, bytes: &[u8]) -> Result<(Value, usize), ProtocolError> {
        let tag_word = self.read_u32(bytes)?;
        let tag = ValueType::from_u32(tag_word).ok_or(ProtocolError::UnknownValueType(tag_word))?;
        let arity = self.read_u32(&bytes[4..])?;
        let probe = Value::from_type(tag, Some(arity))?;
        let size = probe.size();
        let start = 8;
        let slice = bytes
            .get(start..start + size)
            .ok_or(ProtocolError::TruncatedFrame { expected: start + size, actual: bytes.len() })?;
        let value = Value::from_byte_stream(tag, Some(arity), slice, self.swap)?;
        Ok((value, start + size))
    }

    /// `uint32 count | count × <tagged-value>` — the heterogeneous-tag
    /// counterpart to [`Self::write_value_vec`]/[`Self::read_value_vec`].
    pub fn write_tagged_value_vec(&self, buf: &mut Vec<u8>, values: &[Value]) {
        self.write_u32(buf, values.len() as u32);
        for v in values {
            self.write_tagged_value(buf, v);
        }
    }

    pub fn read_tagged_value_vec(&self, bytes: &[u8]) -> Result<(Vec<Value>, usize), ProtocolError> {
        let count = self.read_u32(bytes)? as usize;
        let mut offset = 4;
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            let (v, consumed) = self.read_tagged_value(&bytes[offset..])?;
            values.push(v);
            offset += consumed;
        }
        Ok((values, offset))
    }

    /// Reads a value vector whose tag and (for histogram/n-doubles) arity
    /// are known ahead of time from the request's metric selection.
    pub fn read_value_vec(
        &self,
        bytes: &[u8],
        tag: ValueType,
        arity: Option<u32>,
    ) -> Result<(Vec<Value>, usize), ProtocolError> {
        let count = self.read_u32(bytes)? as usize;
        let mut offset = 4;
        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            let probe = Value::from_type(tag, arity)?;
            let size = probe.size();
            let slice = bytes
                .get(offset..offset + size)
                .ok_or(ProtocolError::TruncatedFrame { expected: offset + size, actual: bytes.len() })?;
            values.push(Value::from_byte_stream(tag, arity, slice, self.swap)?);
            offset += size;
        }
        Ok((values, offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_round_trips() {
        let codec = WireCodec::new(false);
        let mut buf = Vec::new();
        codec.write_string(&mut buf, "hello");
        let (s, consumed) = codec.read_string(&buf).unwrap();
        assert_eq!(s, "hello");
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn u64_swap_is_self_inverse() {
        let codec = WireCodec::new(true);
        let mut buf = Vec::new();
        codec.write_u64(&mut buf, 0x0102_0304_0506_0708);
        assert_eq!(codec.read_u64(&buf).unwrap(), 0x0102_0304_0506_0708);
    }

    #[test]
    fn value_vec_round_trips() {
        let codec = WireCodec::new(false);
        let values = vec![Value::Double(1.5), Value::Double(-2.25)];
        let mut buf = Vec::new();
        codec.write_value_vec(&mut buf, &values);
        let (decoded, consumed) = codec.read_value_vec(&buf, ValueType::Double, None).unwrap();
        assert_eq!(decoded, values);
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn tagged_value_vec_round_trips_heterogeneous_tags() {
        let codec = WireCodec::new(false);
        let values = vec![
            Value::Uint64(7),
            Value::Double(2.5),
            Value::Histogram(scorep_value::HistogramValue { bins: vec![1, 2, 3] }),
        ];
        let mut buf = Vec::new();
        codec.write_tagged_value_vec(&mut buf, &values);
        let (decoded, consumed) = codec.read_tagged_value_vec(&buf).unwrap();
        assert_eq!(decoded, values);
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn value_vec_round_trips_with_swap() {
        let codec_w = WireCodec::new(true);
        let values = vec![Value::Uint64(42), Value::Uint64(9000)];
        let mut buf = Vec::new();
        codec_w.write_value_vec(&mut buf, &values);
        let (decoded, _) = codec_w.read_value_vec(&buf, ValueType::Uint64, None).unwrap();
        assert_eq!(decoded, values);
    }
}
