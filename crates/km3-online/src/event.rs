//! Online (triggered) events: header rows plus snapshot and triggered hits.

use std::ops::Range;

use km3_core::bitfield::{extract, BitWord};
use km3_core::definitions::trigger as ktrg;
use km3_core::error::{Error, Result};
use km3_core::source::BranchSource;

/// Whether a trigger mask has the given trigger bit set.
pub fn triggered<W: BitWord>(mask: W, trigger_bit: i64) -> bool {
    extract(mask, trigger_bit as u32, 1) != 0
}

/// Whether the 3D shower trigger fired.
pub fn is_3dshower<W: BitWord>(mask: W) -> bool {
    triggered(mask, ktrg::JTRIGGER3DSHOWER)
}

/// Whether the MX shower trigger fired.
pub fn is_mxshower<W: BitWord>(mask: W) -> bool {
    triggered(mask, ktrg::JTRIGGERMXSHOWER)
}

/// Whether the 3D muon trigger fired.
pub fn is_3dmuon<W: BitWord>(mask: W) -> bool {
    triggered(mask, ktrg::JTRIGGER3DMUON)
}

/// Whether the nanobeacon trigger fired.
pub fn is_nb<W: BitWord>(mask: W) -> bool {
    triggered(mask, ktrg::JTRIGGERNB)
}

/// DAQ hits of one kind for all events, one flat row per hit.
#[derive(Debug, Clone, Default)]
pub struct DaqHitTable {
    /// Event boundaries over the flat hit axis (`n_events + 1`).
    pub offsets: Vec<usize>,
    /// Optical-module identifier.
    pub dom_id: Vec<i64>,
    /// PMT channel (0–31).
    pub channel_id: Vec<i64>,
    /// Hit time (DAQ clock).
    pub time: Vec<i64>,
    /// Time over threshold.
    pub tot: Vec<i64>,
    /// Per-hit trigger mask; empty for snapshot hits.
    pub trigger_mask: Vec<i64>,
}

impl DaqHitTable {
    fn from_source<S: BranchSource>(
        source: &S,
        prefix: &str,
        with_trigger_mask: bool,
    ) -> Result<Self> {
        let range = 0..source.n_events();
        let dom_id = source.jagged_i64(&format!("{prefix}.dom_id"), range.clone())?;
        let offsets = dom_id.offsets().to_vec();

        let col = |branch: String| -> Result<Vec<i64>> {
            let c = source.jagged_i64(&branch, range.clone())?;
            if !c.is_aligned_with(&dom_id) {
                return Err(Error::Deserialization(format!(
                    "hit column '{branch}' is misaligned with '{prefix}.dom_id'"
                )));
            }
            Ok(c.flat().to_vec())
        };

        Ok(Self {
            offsets,
            dom_id: dom_id.flat().to_vec(),
            channel_id: col(format!("{prefix}.channel_id"))?,
            time: col(format!("{prefix}.time"))?,
            tot: col(format!("{prefix}.tot"))?,
            trigger_mask: if with_trigger_mask {
                col(format!("{prefix}.trigger_mask"))?
            } else {
                Vec::new()
            },
        })
    }

    /// Number of events.
    pub fn n_events(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Flat hit range of one event.
    pub fn hits_in(&self, event: usize) -> Range<usize> {
        self.offsets[event]..self.offsets[event + 1]
    }
}

/// Triggered events as written by the data acquisition.
#[derive(Debug, Clone)]
pub struct OnlineEvents {
    /// Per-event detector identifier.
    pub det_id: Vec<i64>,
    /// Per-event run number.
    pub run: Vec<i64>,
    /// Per-event DAQ frame index.
    pub frame_index: Vec<i64>,
    /// Per-event trigger mask.
    pub trigger_mask: Vec<i64>,
    /// Per-event trigger counter.
    pub trigger_counter: Vec<i64>,
    /// Per-event number of overlaid triggers.
    pub overlays: Vec<i64>,
    /// Per-event UTC seconds.
    pub t_sec: Vec<i64>,
    /// Per-event UTC nanoseconds.
    pub t_ns: Vec<i64>,
    /// All hits in the trigger time window.
    pub snapshot_hits: DaqHitTable,
    /// The subset of hits that caused the trigger, with per-hit masks.
    pub triggered_hits: DaqHitTable,
}

impl OnlineEvents {
    /// Materialize all online events from an event-tree source.
    pub fn from_source<S: BranchSource>(source: &S) -> Result<Self> {
        let range = 0..source.n_events();
        let events = Self {
            det_id: source.scalar_i64("event.det_id", range.clone())?,
            run: source.scalar_i64("event.run", range.clone())?,
            frame_index: source.scalar_i64("event.frame_index", range.clone())?,
            trigger_mask: source.scalar_i64("event.trigger_mask", range.clone())?,
            trigger_counter: source.scalar_i64("event.trigger_counter", range.clone())?,
            overlays: source.scalar_i64("event.overlays", range.clone())?,
            t_sec: source.scalar_i64("event.t_sec", range.clone())?,
            t_ns: source.scalar_i64("event.t_ns", range)?,
            snapshot_hits: DaqHitTable::from_source(source, "event.snapshot_hits", false)?,
            triggered_hits: DaqHitTable::from_source(source, "event.triggered_hits", true)?,
        };
        tracing::debug!(n_events = events.n_events(), "materialized online events");
        Ok(events)
    }

    /// Number of events.
    pub fn n_events(&self) -> usize {
        self.det_id.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use km3_core::source::{BranchData, MemorySource};

    fn fixture() -> MemorySource {
        let mut s = MemorySource::new(2);
        let si = |v: Vec<i64>| BranchData::ScalarI64 { values: v };
        let ji = |v: Vec<Vec<i64>>| BranchData::JaggedI64 { values: v };

        s.insert("event.det_id", si(vec![44, 44])).unwrap();
        s.insert("event.run", si(vec![6000, 6000])).unwrap();
        s.insert("event.frame_index", si(vec![10, 11])).unwrap();
        s.insert("event.trigger_mask", si(vec![(1 << 1) | (1 << 4), 1 << 5])).unwrap();
        s.insert("event.trigger_counter", si(vec![0, 1])).unwrap();
        s.insert("event.overlays", si(vec![0, 0])).unwrap();
        s.insert("event.t_sec", si(vec![1_600_000_000, 1_600_000_001])).unwrap();
        s.insert("event.t_ns", si(vec![0, 500])).unwrap();

        s.insert("event.snapshot_hits.dom_id", ji(vec![vec![801, 802], vec![]])).unwrap();
        s.insert("event.snapshot_hits.channel_id", ji(vec![vec![3, 4], vec![]])).unwrap();
        s.insert("event.snapshot_hits.time", ji(vec![vec![1000, 1005], vec![]])).unwrap();
        s.insert("event.snapshot_hits.tot", ji(vec![vec![25, 30], vec![]])).unwrap();

        s.insert("event.triggered_hits.dom_id", ji(vec![vec![801], vec![]])).unwrap();
        s.insert("event.triggered_hits.channel_id", ji(vec![vec![3], vec![]])).unwrap();
        s.insert("event.triggered_hits.time", ji(vec![vec![1000], vec![]])).unwrap();
        s.insert("event.triggered_hits.tot", ji(vec![vec![25], vec![]])).unwrap();
        s.insert("event.triggered_hits.trigger_mask", ji(vec![vec![1 << 4], vec![]])).unwrap();
        s
    }

    #[test]
    fn materializes_headers_and_hits() {
        let events = OnlineEvents::from_source(&fixture()).unwrap();
        assert_eq!(events.n_events(), 2);
        assert_eq!(events.snapshot_hits.hits_in(0), 0..2);
        assert_eq!(events.snapshot_hits.hits_in(1), 2..2);
        assert_eq!(events.triggered_hits.trigger_mask, vec![1 << 4]);
    }

    #[test]
    fn trigger_mask_predicates() {
        let events = OnlineEvents::from_source(&fixture()).unwrap();
        assert!(is_3dshower(events.trigger_mask[0]));
        assert!(is_3dmuon(events.trigger_mask[0]));
        assert!(!is_mxshower(events.trigger_mask[0]));
        assert!(is_nb(events.trigger_mask[1]));
    }
}
