//! Timeslice streams: per-interval hit frames, one frame per module.
//!
//! A timeslice stores its frames' hits in one flat buffer; per-frame hit
//! counts recover the frame boundaries. Streams (L0, L1, L2, SN) live under
//! separate branch prefixes and are discovered by name.

use std::collections::BTreeMap;

use km3_core::error::{Error, Result};
use km3_core::jagged::Jagged;
use km3_core::source::BranchSource;

/// Hits of one frame (one module) within a timeslice.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameHits<'a> {
    /// PMT addresses.
    pub pmt: &'a [i64],
    /// TDC values.
    pub tdc: &'a [i64],
    /// Times over threshold.
    pub tot: &'a [i64],
}

/// One stream of timeslices (e.g. L1).
#[derive(Debug, Clone)]
pub struct TimesliceStream {
    /// Stream name (`L0`, `L1`, `L2`, `SN`).
    pub stream: String,
    /// Per-slice module identifiers, one per frame.
    pub module_ids: Jagged<i64>,
    /// Per-slice hit counts, one per frame.
    pub n_hits: Jagged<i64>,
    /// Per-slice flat hit buffers.
    pub pmt: Jagged<i64>,
    /// Per-slice flat TDC buffer.
    pub tdc: Jagged<i64>,
    /// Per-slice flat time-over-threshold buffer.
    pub tot: Jagged<i64>,
}

impl TimesliceStream {
    fn from_source<S: BranchSource>(source: &S, stream: &str) -> Result<Self> {
        let range = 0..source.n_events();
        let prefix = format!("timeslice.{stream}");
        let module_ids = source.jagged_i64(&format!("{prefix}.frame.dom_id"), range.clone())?;
        let n_hits = source.jagged_i64(&format!("{prefix}.frame.n_hits"), range.clone())?;
        if !module_ids.is_aligned_with(&n_hits) {
            return Err(Error::Deserialization(format!(
                "stream '{stream}': frame module ids and hit counts are misaligned"
            )));
        }
        let out = Self {
            stream: stream.to_string(),
            module_ids,
            n_hits,
            pmt: source.jagged_i64(&format!("{prefix}.hits.pmt"), range.clone())?,
            tdc: source.jagged_i64(&format!("{prefix}.hits.tdc"), range.clone())?,
            tot: source.jagged_i64(&format!("{prefix}.hits.tot"), range)?,
        };
        out.validate()?;
        Ok(out)
    }

    fn validate(&self) -> Result<()> {
        for slice in 0..self.n_slices() {
            let declared: i64 = self.n_hits.row(slice).iter().sum();
            let stored = self.pmt.row_len(slice);
            if declared as usize != stored
                || self.tdc.row_len(slice) != stored
                || self.tot.row_len(slice) != stored
            {
                return Err(Error::Deserialization(format!(
                    "stream '{}', slice {slice}: frame hit counts sum to {declared} \
                     but the hit buffer holds {stored}",
                    self.stream
                )));
            }
        }
        Ok(())
    }

    /// Number of timeslices in this stream.
    pub fn n_slices(&self) -> usize {
        self.module_ids.n_rows()
    }

    /// Number of frames in one timeslice.
    pub fn n_frames(&self, slice: usize) -> usize {
        self.module_ids.row_len(slice)
    }

    /// Frames of one timeslice, keyed by module id.
    ///
    /// Walks the flat hit buffer by the per-frame hit counts, the way the
    /// frames were concatenated by the DAQ.
    pub fn frames(&self, slice: usize) -> BTreeMap<i64, FrameHits<'_>> {
        let modules = self.module_ids.row(slice);
        let counts = self.n_hits.row(slice);
        let pmt = self.pmt.row(slice);
        let tdc = self.tdc.row(slice);
        let tot = self.tot.row(slice);

        let mut frames = BTreeMap::new();
        let mut start = 0usize;
        for (&module, &count) in modules.iter().zip(counts) {
            let end = start + count as usize;
            frames.insert(
                module,
                FrameHits { pmt: &pmt[start..end], tdc: &tdc[start..end], tot: &tot[start..end] },
            );
            start = end;
        }
        frames
    }
}

/// All timeslice streams found in a source.
#[derive(Debug, Clone)]
pub struct TimesliceStreams {
    streams: BTreeMap<String, TimesliceStream>,
}

impl TimesliceStreams {
    /// Discover and materialize every `timeslice.<STREAM>.` branch group.
    pub fn from_source<S: BranchSource>(source: &S) -> Result<Self> {
        let mut names: Vec<String> = source
            .branches()
            .iter()
            .filter_map(|b| {
                b.strip_prefix("timeslice.")
                    .and_then(|rest| rest.split('.').next())
                    .map(str::to_string)
            })
            .collect();
        names.sort();
        names.dedup();

        let mut streams = BTreeMap::new();
        for name in names {
            streams.insert(name.clone(), TimesliceStream::from_source(source, &name)?);
        }
        tracing::debug!(streams = streams.len(), "discovered timeslice streams");
        Ok(Self { streams })
    }

    /// Names of the available streams.
    pub fn names(&self) -> Vec<&str> {
        self.streams.keys().map(String::as_str).collect()
    }

    /// One stream by name.
    pub fn stream(&self, name: &str) -> Result<&TimesliceStream> {
        self.streams
            .get(name)
            .ok_or_else(|| Error::BranchNotFound(format!("timeslice.{name}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use km3_core::source::{BranchData, MemorySource};

    fn fixture() -> MemorySource {
        let mut s = MemorySource::new(2);
        let ji = |v: Vec<Vec<i64>>| BranchData::JaggedI64 { values: v };
        // Slice 0: module 801 with 2 hits, module 802 with 1 hit.
        // Slice 1: module 801 with 0 hits.
        s.insert("timeslice.L1.frame.dom_id", ji(vec![vec![801, 802], vec![801]])).unwrap();
        s.insert("timeslice.L1.frame.n_hits", ji(vec![vec![2, 1], vec![0]])).unwrap();
        s.insert("timeslice.L1.hits.pmt", ji(vec![vec![3, 4, 9], vec![]])).unwrap();
        s.insert("timeslice.L1.hits.tdc", ji(vec![vec![100, 150, 90], vec![]])).unwrap();
        s.insert("timeslice.L1.hits.tot", ji(vec![vec![25, 26, 29], vec![]])).unwrap();
        s
    }

    #[test]
    fn discovers_streams_by_prefix() {
        let streams = TimesliceStreams::from_source(&fixture()).unwrap();
        assert_eq!(streams.names(), vec!["L1"]);
        assert!(streams.stream("SN").is_err());
    }

    #[test]
    fn frames_slice_the_flat_hit_buffer() {
        let streams = TimesliceStreams::from_source(&fixture()).unwrap();
        let l1 = streams.stream("L1").unwrap();
        assert_eq!(l1.n_slices(), 2);
        assert_eq!(l1.n_frames(0), 2);

        let frames = l1.frames(0);
        let f801 = &frames[&801];
        assert_eq!(f801.pmt, &[3, 4]);
        assert_eq!(f801.tdc, &[100, 150]);
        let f802 = &frames[&802];
        assert_eq!(f802.pmt, &[9]);
        assert_eq!(f802.tot, &[29]);

        let frames = l1.frames(1);
        assert!(frames[&801].pmt.is_empty());
    }

    #[test]
    fn mismatched_hit_counts_are_rejected() {
        let mut s = fixture();
        s.insert(
            "timeslice.L1.frame.n_hits",
            BranchData::JaggedI64 { values: vec![vec![2, 2], vec![0]] },
        )
        .unwrap();
        assert!(TimesliceStreams::from_source(&s).is_err());
    }
}
