use crate::models::{ChartKind, RawRecord};

#[derive(Debug, Clone, Default)]
struct Slot {
    records: Vec<RawRecord>,
    revision: u64,
}

/// Most recent result set per chart kind.
///
/// Exactly one slot per kind, replaced wholesale on each successful fetch and
/// never merged. Each replacement bumps the slot's revision so observers can
/// tell whether the data they rendered is still current.
#[derive(Debug, Clone, Default)]
pub struct DatasetCache {
    slots: [Slot; 3],
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: ChartKind) -> &[RawRecord] {
        &self.slots[kind.index()].records
    }

    /// `0` until the first successful fetch for `kind`.
    pub fn revision(&self, kind: ChartKind) -> u64 {
        self.slots[kind.index()].revision
    }

    pub(crate) fn replace(&mut self, kind: ChartKind, records: Vec<RawRecord>) {
        let slot = &mut self.slots[kind.index()];
        slot.records = records;
        slot.revision += 1;
    }
}
