//! Selections: "ordered id lists plus flavour flags" (spec.md §4.8) that
//! every aggregated-tree and subtree query carries. An include selection
//! aggregates exactly the listed ids, in the order given; an exclude
//! selection aggregates everything *but* the listed ids, in the tree's own
//! order — the same include-overrides-shape as scorep-filter's
//! include/exclude matching, just applied to ids instead of glob patterns.
use scorep_protocol::{ProtocolError, WireCodec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    Include,
    Exclude,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<Id> {
    pub ids: Vec<Id>,
    pub mode: SelectionMode,
}

impl<Id: Copy + PartialEq> Selection<Id> {
    pub fn all_excluding_nothing() -> Selection<Id> {
        Selection { ids: Vec::new(), mode: SelectionMode::Exclude }
    }

    /// Resolves this selection against the tree's full id list, in
    /// universe order, per spec.md §4.8.
    pub fn resolve(&self, universe: &[Id]) -> Vec<Id> {
        match self.mode {
            SelectionMode::Include => self
                .ids
                .iter()
                .copied()
                .filter(|id| universe.contains(id))
                .collect(),
            SelectionMode::Exclude => universe
                .iter()
                .copied()
                .filter(|id| !self.ids.contains(id))
                .collect(),
        }
    }
}

impl Selection<u32> {
    pub fn encode(&self, codec: &WireCodec, buf: &mut Vec<u8>) {
        codec.write_u32(buf, if self.mode == SelectionMode::Include { 0 } else { 1 });
        codec.write_u32(buf, self.ids.len() as u32);
        for &id in &self.ids {
            codec.write_u32(buf, id);
        }
    }

    pub fn decode(codec: &WireCodec, bytes: &[u8]) -> Result<(Selection<u32>, usize), ProtocolError> {
        let mode = if codec.read_u32(bytes)? == 0 { SelectionMode::Include } else { SelectionMode::Exclude };
        let count = codec.read_u32(&bytes[4..])? as usize;
        let mut offset = 8;
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            ids.push(codec.read_u32(&bytes[offset..])?);
            offset += 4;
        }
        Ok((Selection { ids, mode }, offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn include_preserves_request_order() {
        let sel = Selection { ids: vec![3u32, 1, 2], mode: SelectionMode::Include };
        assert_eq!(sel.resolve(&[1, 2, 3, 4]), vec![3, 1, 2]);
    }

    #[test]
    fn exclude_drops_listed_ids_in_universe_order() {
        let sel = Selection { ids: vec![2u32], mode: SelectionMode::Exclude };
        assert_eq!(sel.resolve(&[1, 2, 3]), vec![1, 3]);
    }

    #[test]
    fn wire_round_trips() {
        let codec = WireCodec::new(false);
        let sel = Selection { ids: vec![5u32, 9, 2], mode: SelectionMode::Include };
        let mut buf = Vec::new();
        sel.encode(&codec, &mut buf);
        let (decoded, consumed) = Selection::<u32>::decode(&codec, &buf).unwrap();
        assert_eq!(decoded, sel);
        assert_eq!(consumed, buf.len());
    }
}
