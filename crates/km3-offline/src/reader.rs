//! Offline event reader: a session over a columnar source.
//!
//! The reader owns the source and a column memo cache; repeated touches of
//! the same branch (selection, then projection) decode once. Branch naming
//! follows the offline data format (`trks.pos.x`, `mc_hits.pure_t`, …) with
//! the historical aliases (`t_sec` → `t/t.fSec`) resolved here.

use std::collections::BTreeMap;
use std::ops::Range;

use rayon::prelude::*;
use tracing::debug;

use km3_core::cache::{CacheConfig, CacheStats, CachedColumn, ColumnCache};
use km3_core::error::{Error, Result};
use km3_core::jagged::Jagged;
use km3_core::source::BranchSource;

use crate::tables::{HitTable, McHitTable, McTrackTable, TrackTable};

/// Aliases from accessor names to on-disk branch paths.
const ALIASES: &[(&str, &str)] = &[
    ("t_sec", "t/t.fSec"),
    ("t_ns", "t/t.fNanoSec"),
    ("usr", "AAObject/usr"),
    ("usr_names", "AAObject/usr_names"),
];

/// Per-candidate f64 branch suffixes of a track group, in table order.
const TRACK_F64_SUFFIXES: &[&str] =
    &["pos.x", "pos.y", "pos.z", "dir.x", "dir.y", "dir.z", "t", "E", "len", "lik"];

/// Per-track f64 branch suffixes of an MC track group (no fit likelihood).
const MC_TRACK_F64_SUFFIXES: &[&str] =
    &["pos.x", "pos.y", "pos.z", "dir.x", "dir.y", "dir.z", "t", "E", "len"];

fn branch_for(name: &str) -> &str {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, branch)| *branch)
        .unwrap_or(name)
}

/// Free-form key-value file header, as stored by the production chain.
#[derive(Debug, Clone)]
pub struct Header {
    raw: BTreeMap<String, String>,
}

impl Header {
    /// Wrap a raw header map.
    pub fn new(raw: BTreeMap<String, String>) -> Self {
        Self { raw }
    }

    /// Raw value for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.raw.get(key).map(String::as_str)
    }

    /// All header keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.raw.keys().map(String::as_str)
    }

    /// Whitespace-separated fields of a value.
    pub fn fields(&self, key: &str) -> Option<Vec<&str>> {
        self.get(key).map(|v| v.split_whitespace().collect())
    }

    /// Value fields parsed as f64, where they parse.
    pub fn floats(&self, key: &str) -> Option<Vec<f64>> {
        self.fields(key)
            .map(|fields| fields.iter().filter_map(|f| f.parse().ok()).collect())
    }
}

/// Reader for offline (reconstructed/simulated) event stores.
pub struct OfflineReader<S: BranchSource> {
    source: S,
    cache: ColumnCache,
}

impl<S: BranchSource> OfflineReader<S> {
    /// Open a session with the default cache configuration.
    pub fn new(source: S) -> Self {
        Self::with_cache(source, CacheConfig::default())
    }

    /// Open a session with an explicit cache configuration.
    pub fn with_cache(source: S, config: CacheConfig) -> Self {
        Self { source, cache: ColumnCache::new(config) }
    }

    /// Number of events in the store.
    pub fn n_events(&self) -> usize {
        self.source.n_events()
    }

    /// The underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Column cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// The file header, when the source carries one.
    pub fn header(&self) -> Option<Header> {
        self.source.header().map(Header::new)
    }

    fn full_range(&self) -> Range<usize> {
        0..self.source.n_events()
    }

    // ── Cached column access ───────────────────────────────────

    fn scalar_i64(&self, name: &str, range: Range<usize>) -> Result<Vec<i64>> {
        let branch = branch_for(name);
        let col = self.cache.get_or_insert(branch, range.clone(), || {
            debug!(branch, "materializing scalar column");
            self.source.scalar_i64(branch, range.clone()).map(CachedColumn::I64)
        })?;
        match &*col {
            CachedColumn::I64(v) => Ok(v.clone()),
            _ => Err(Error::TypeMismatch(format!("branch '{branch}' cached with another type"))),
        }
    }

    fn jagged_f64(&self, name: &str, range: Range<usize>) -> Result<Jagged<f64>> {
        let branch = branch_for(name);
        let col = self.cache.get_or_insert(branch, range.clone(), || {
            debug!(branch, "materializing jagged column");
            self.source.jagged_f64(branch, range.clone()).map(CachedColumn::JaggedF64)
        })?;
        match &*col {
            CachedColumn::JaggedF64(j) => Ok(j.clone()),
            _ => Err(Error::TypeMismatch(format!("branch '{branch}' cached with another type"))),
        }
    }

    fn jagged_i64(&self, name: &str, range: Range<usize>) -> Result<Jagged<i64>> {
        let branch = branch_for(name);
        let col = self.cache.get_or_insert(branch, range.clone(), || {
            debug!(branch, "materializing jagged column");
            self.source.jagged_i64(branch, range.clone()).map(CachedColumn::JaggedI64)
        })?;
        match &*col {
            CachedColumn::JaggedI64(j) => Ok(j.clone()),
            _ => Err(Error::TypeMismatch(format!("branch '{branch}' cached with another type"))),
        }
    }

    fn nested_f64(&self, name: &str, range: Range<usize>) -> Result<Jagged<f64>> {
        let branch = branch_for(name);
        let col = self.cache.get_or_insert(branch, range.clone(), || {
            debug!(branch, "materializing nested column");
            self.source.nested_f64(branch, range.clone()).map(CachedColumn::JaggedF64)
        })?;
        match &*col {
            CachedColumn::JaggedF64(j) => Ok(j.clone()),
            _ => Err(Error::TypeMismatch(format!("branch '{branch}' cached with another type"))),
        }
    }

    fn nested_i64(&self, name: &str, range: Range<usize>) -> Result<Jagged<i64>> {
        let branch = branch_for(name);
        let col = self.cache.get_or_insert(branch, range.clone(), || {
            debug!(branch, "materializing nested column");
            self.source.nested_i64(branch, range.clone()).map(CachedColumn::JaggedI64)
        })?;
        match &*col {
            CachedColumn::JaggedI64(j) => Ok(j.clone()),
            _ => Err(Error::TypeMismatch(format!("branch '{branch}' cached with another type"))),
        }
    }

    // ── Event header columns ───────────────────────────────────

    /// Event identifiers.
    pub fn event_ids(&self) -> Result<Vec<i64>> {
        self.scalar_i64("id", self.full_range())
    }

    /// Detector identifiers.
    pub fn det_ids(&self) -> Result<Vec<i64>> {
        self.scalar_i64("det_id", self.full_range())
    }

    /// Run numbers.
    pub fn run_ids(&self) -> Result<Vec<i64>> {
        self.scalar_i64("run_id", self.full_range())
    }

    /// Monte-Carlo run numbers.
    pub fn mc_run_ids(&self) -> Result<Vec<i64>> {
        self.scalar_i64("mc_run_id", self.full_range())
    }

    /// DAQ frame indices.
    pub fn frame_indices(&self) -> Result<Vec<i64>> {
        self.scalar_i64("frame_index", self.full_range())
    }

    /// Packed trigger masks.
    pub fn trigger_masks(&self) -> Result<Vec<i64>> {
        self.scalar_i64("trigger_mask", self.full_range())
    }

    /// Trigger counters.
    pub fn trigger_counters(&self) -> Result<Vec<i64>> {
        self.scalar_i64("trigger_counter", self.full_range())
    }

    /// Number of overlaid events (MC pile-up).
    pub fn overlays(&self) -> Result<Vec<i64>> {
        self.scalar_i64("overlays", self.full_range())
    }

    /// Timestamp seconds.
    pub fn t_secs(&self) -> Result<Vec<i64>> {
        self.scalar_i64("t_sec", self.full_range())
    }

    /// Timestamp nanoseconds.
    pub fn t_nss(&self) -> Result<Vec<i64>> {
        self.scalar_i64("t_ns", self.full_range())
    }

    /// Per-event generator weights (`w`).
    pub fn w(&self) -> Result<Jagged<f64>> {
        self.jagged_f64("w", self.full_range())
    }

    /// Per-event generator bookkeeping values (`w2list`).
    ///
    /// Slot meanings depend on the generator; see the w2list definitions of
    /// the data format.
    pub fn w2list(&self) -> Result<Jagged<f64>> {
        self.jagged_f64("w2list", self.full_range())
    }

    /// One `w2list` slot per event; events whose list is too short yield
    /// NaN.
    pub fn w2list_param(&self, slot: usize) -> Result<Vec<f64>> {
        let w2 = self.w2list()?;
        Ok((0..w2.n_rows())
            .map(|event| w2.row(event).get(slot).copied().unwrap_or(f64::NAN))
            .collect())
    }

    // ── usr fields ─────────────────────────────────────────────

    /// The named per-event usr value.
    ///
    /// Events without the name yield NaN; a name present in no event at all
    /// is an unknown-field error.
    pub fn usr(&self, field: &str) -> Result<Vec<f64>> {
        let range = self.full_range();
        let names = self.source.jagged_str(branch_for("usr_names"), range.clone())?;
        let values = self.jagged_f64("usr", range)?;
        if names.counts() != values.counts() {
            return Err(Error::Deserialization(
                "usr and usr_names disagree on per-event lengths".into(),
            ));
        }

        let mut found = false;
        let mut out = Vec::with_capacity(names.n_rows());
        for event in 0..names.n_rows() {
            let slot = names.row(event).iter().position(|n| n == field);
            match slot {
                Some(idx) => {
                    found = true;
                    out.push(values.row(event)[idx]);
                }
                None => out.push(f64::NAN),
            }
        }
        if !found {
            return Err(Error::UnknownField(field.to_string()));
        }
        Ok(out)
    }

    // ── Nested tables ──────────────────────────────────────────

    /// Reconstructed track candidates for all events.
    pub fn tracks(&self) -> Result<TrackTable>
    where
        S: Sync,
    {
        self.tracks_in(self.full_range())
    }

    /// Reconstructed track candidates for an event range.
    pub fn tracks_in(&self, range: Range<usize>) -> Result<TrackTable>
    where
        S: Sync,
    {
        let prefix = "trks";
        let paths: Vec<String> =
            TRACK_F64_SUFFIXES.iter().map(|s| format!("{prefix}.{s}")).collect();
        let cols: Vec<Jagged<f64>> = paths
            .par_iter()
            .map(|p| self.jagged_f64(p, range.clone()))
            .collect::<Result<_>>()?;

        let id = self.jagged_i64(&format!("{prefix}.id"), range.clone())?;
        let rec_type = self.jagged_i64(&format!("{prefix}.rec_type"), range.clone())?;
        for (path, col) in paths.iter().zip(&cols) {
            if !col.is_aligned_with(&id) {
                return Err(Error::Deserialization(format!(
                    "track column '{path}' is misaligned with '{prefix}.id'"
                )));
            }
        }

        let mut cols = cols.into_iter();
        let mut next = || cols.next().expect("suffix list and column list are same length");
        let table = TrackTable {
            offsets: id.offsets().to_vec(),
            id: id.flat().to_vec(),
            pos_x: next().flat().to_vec(),
            pos_y: next().flat().to_vec(),
            pos_z: next().flat().to_vec(),
            dir_x: next().flat().to_vec(),
            dir_y: next().flat().to_vec(),
            dir_z: next().flat().to_vec(),
            t: next().flat().to_vec(),
            e: next().flat().to_vec(),
            len: next().flat().to_vec(),
            lik: next().flat().to_vec(),
            rec_type: rec_type.flat().to_vec(),
            rec_stages: self.nested_i64(&format!("{prefix}.rec_stages"), range.clone())?,
            fitinf: self.nested_f64(&format!("{prefix}.fitinf"), range.clone())?,
            hit_ids: self.nested_i64(&format!("{prefix}.hit_ids"), range)?,
        };
        table.validate()?;
        Ok(table)
    }

    /// Monte-Carlo truth tracks for all events.
    pub fn mc_tracks(&self) -> Result<McTrackTable>
    where
        S: Sync,
    {
        let range = self.full_range();
        let prefix = "mc_trks";
        let paths: Vec<String> =
            MC_TRACK_F64_SUFFIXES.iter().map(|s| format!("{prefix}.{s}")).collect();
        let cols: Vec<Jagged<f64>> = paths
            .par_iter()
            .map(|p| self.jagged_f64(p, range.clone()))
            .collect::<Result<_>>()?;

        let id = self.jagged_i64(&format!("{prefix}.id"), range.clone())?;
        let pdgid = self.jagged_i64(&format!("{prefix}.type"), range.clone())?;

        let mut cols = cols.into_iter();
        let mut next = || cols.next().expect("suffix list and column list are same length");
        let table = McTrackTable {
            offsets: id.offsets().to_vec(),
            id: id.flat().to_vec(),
            pos_x: next().flat().to_vec(),
            pos_y: next().flat().to_vec(),
            pos_z: next().flat().to_vec(),
            dir_x: next().flat().to_vec(),
            dir_y: next().flat().to_vec(),
            dir_z: next().flat().to_vec(),
            t: next().flat().to_vec(),
            e: next().flat().to_vec(),
            len: next().flat().to_vec(),
            pdgid: pdgid.flat().to_vec(),
            hit_ids: self.nested_i64(&format!("{prefix}.hit_ids"), range)?,
        };
        table.validate()?;
        Ok(table)
    }

    /// Reconstructed hits for all events.
    pub fn hits(&self) -> Result<HitTable> {
        let range = self.full_range();
        let prefix = "hits";

        let id = self.jagged_i64(&format!("{prefix}.id"), range.clone())?;
        let a = if self.source.has_branch(&format!("{prefix}.a")) {
            Some(self.jagged_f64(&format!("{prefix}.a"), range.clone())?.flat().to_vec())
        } else {
            None
        };
        let table = HitTable {
            offsets: id.offsets().to_vec(),
            id: id.flat().to_vec(),
            dom_id: self.jagged_i64(&format!("{prefix}.dom_id"), range.clone())?.flat().to_vec(),
            channel_id: self
                .jagged_i64(&format!("{prefix}.channel_id"), range.clone())?
                .flat()
                .to_vec(),
            t: self.jagged_f64(&format!("{prefix}.t"), range.clone())?.flat().to_vec(),
            tot: self.jagged_f64(&format!("{prefix}.tot"), range.clone())?.flat().to_vec(),
            trig: self.jagged_i64(&format!("{prefix}.trig"), range)?.flat().to_vec(),
            a,
        };
        table.validate()?;
        Ok(table)
    }

    /// Monte-Carlo truth hits for all events.
    pub fn mc_hits(&self) -> Result<McHitTable> {
        let range = self.full_range();
        let prefix = "mc_hits";

        let id = self.jagged_i64(&format!("{prefix}.id"), range.clone())?;
        let table = McHitTable {
            offsets: id.offsets().to_vec(),
            id: id.flat().to_vec(),
            pmt_id: self.jagged_i64(&format!("{prefix}.pmt_id"), range.clone())?.flat().to_vec(),
            t: self.jagged_f64(&format!("{prefix}.t"), range.clone())?.flat().to_vec(),
            a: self.jagged_f64(&format!("{prefix}.a"), range.clone())?.flat().to_vec(),
            origin: self.jagged_i64(&format!("{prefix}.origin"), range.clone())?.flat().to_vec(),
            pure_t: self.jagged_f64(&format!("{prefix}.pure_t"), range.clone())?.flat().to_vec(),
            pure_a: self.jagged_f64(&format!("{prefix}.pure_a"), range)?.flat().to_vec(),
        };
        table.validate()?;
        Ok(table)
    }
}
