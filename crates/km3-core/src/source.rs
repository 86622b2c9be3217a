//! The columnar-source boundary.
//!
//! km3rs does not parse the on-disk container format. It consumes a
//! [`BranchSource`]: a capability to obtain, by stable branch name, scalar or
//! nested values for an event range, plus the per-event sub-list lengths that
//! ragged reductions need. File-format backends implement this trait;
//! [`MemorySource`] is the in-memory implementation used by tests, fixtures
//! and the CLI.

use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::jagged::Jagged;

/// Read access to named columns of an event store.
///
/// `scalar_*` branches hold one value per event. `jagged_*` branches hold a
/// variable-length list per event (hits, tracks). `nested_*` branches hold a
/// variable-length list per *sub-record* (a track's `rec_stages`); their rows
/// are the sub-records of the requested range, flattened in storage order,
/// and align with the flat axis of the owning jagged table.
pub trait BranchSource {
    /// Number of events in the store.
    fn n_events(&self) -> usize;

    /// All branch names, sorted.
    fn branches(&self) -> Vec<String>;

    /// Whether a branch exists.
    fn has_branch(&self, name: &str) -> bool;

    /// One f64 per event. Integer branches are widened.
    fn scalar_f64(&self, branch: &str, range: Range<usize>) -> Result<Vec<f64>>;

    /// One i64 per event. Float branches are refused.
    fn scalar_i64(&self, branch: &str, range: Range<usize>) -> Result<Vec<i64>>;

    /// Variable-length f64 list per event.
    fn jagged_f64(&self, branch: &str, range: Range<usize>) -> Result<Jagged<f64>>;

    /// Variable-length i64 list per event.
    fn jagged_i64(&self, branch: &str, range: Range<usize>) -> Result<Jagged<i64>>;

    /// Variable-length f64 list per sub-record, flattened across the range.
    fn nested_f64(&self, branch: &str, range: Range<usize>) -> Result<Jagged<f64>>;

    /// Variable-length i64 list per sub-record, flattened across the range.
    fn nested_i64(&self, branch: &str, range: Range<usize>) -> Result<Jagged<i64>>;

    /// Variable-length string list per event (name columns such as
    /// `usr_names`).
    fn jagged_str(&self, branch: &str, range: Range<usize>) -> Result<Jagged<String>>;

    /// Per-event sub-list lengths of a jagged or nested branch.
    fn counts(&self, branch: &str, range: Range<usize>) -> Result<Vec<usize>>;

    /// Free-form header metadata, when the store carries one.
    fn header(&self) -> Option<BTreeMap<String, String>> {
        None
    }
}

/// Values of one branch, one entry shape per variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BranchData {
    /// One f64 per event.
    ScalarF64 { values: Vec<f64> },
    /// One i64 per event.
    ScalarI64 { values: Vec<i64> },
    /// A list of f64 per event.
    JaggedF64 { values: Vec<Vec<f64>> },
    /// A list of i64 per event.
    JaggedI64 { values: Vec<Vec<i64>> },
    /// A list of f64 per sub-record, grouped by event.
    NestedF64 { values: Vec<Vec<Vec<f64>>> },
    /// A list of i64 per sub-record, grouped by event.
    NestedI64 { values: Vec<Vec<Vec<i64>>> },
    /// A list of strings per event.
    JaggedStr { values: Vec<Vec<String>> },
}

impl BranchData {
    fn n_events(&self) -> usize {
        match self {
            BranchData::ScalarF64 { values } => values.len(),
            BranchData::ScalarI64 { values } => values.len(),
            BranchData::JaggedF64 { values } => values.len(),
            BranchData::JaggedI64 { values } => values.len(),
            BranchData::NestedF64 { values } => values.len(),
            BranchData::NestedI64 { values } => values.len(),
            BranchData::JaggedStr { values } => values.len(),
        }
    }
}

/// An in-memory [`BranchSource`] deserialized from JSON fixtures.
#[derive(Debug, Clone, Deserialize)]
pub struct MemorySource {
    n_events: usize,
    branches: BTreeMap<String, BranchData>,
    #[serde(default)]
    header: Option<BTreeMap<String, String>>,
}

impl MemorySource {
    /// An empty store with `n_events` events and no branches.
    pub fn new(n_events: usize) -> Self {
        Self { n_events, branches: BTreeMap::new(), header: None }
    }

    /// Add a branch, validating its event count.
    pub fn insert(&mut self, name: impl Into<String>, data: BranchData) -> Result<()> {
        let name = name.into();
        if data.n_events() != self.n_events {
            return Err(Error::Deserialization(format!(
                "branch '{}' holds {} events, store holds {}",
                name,
                data.n_events(),
                self.n_events
            )));
        }
        self.branches.insert(name, data);
        Ok(())
    }

    /// Attach header metadata.
    pub fn set_header(&mut self, header: BTreeMap<String, String>) {
        self.header = Some(header);
    }

    /// Parse from a JSON document and validate branch lengths.
    pub fn from_json(json: &str) -> Result<Self> {
        let source: MemorySource = serde_json::from_str(json)?;
        source.validate()?;
        Ok(source)
    }

    /// Read and parse a JSON fixture file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    fn validate(&self) -> Result<()> {
        for (name, data) in &self.branches {
            if data.n_events() != self.n_events {
                return Err(Error::Deserialization(format!(
                    "branch '{}' holds {} events, store holds {}",
                    name,
                    data.n_events(),
                    self.n_events
                )));
            }
        }
        Ok(())
    }

    fn branch(&self, name: &str) -> Result<&BranchData> {
        self.branches
            .get(name)
            .ok_or_else(|| Error::BranchNotFound(name.to_string()))
    }

    fn check_range(&self, range: &Range<usize>) -> Result<()> {
        if range.start > range.end || range.end > self.n_events {
            return Err(Error::TypeMismatch(format!(
                "event range {}..{} out of bounds for {} events",
                range.start, range.end, self.n_events
            )));
        }
        Ok(())
    }
}

impl BranchSource for MemorySource {
    fn n_events(&self) -> usize {
        self.n_events
    }

    fn branches(&self) -> Vec<String> {
        self.branches.keys().cloned().collect()
    }

    fn has_branch(&self, name: &str) -> bool {
        self.branches.contains_key(name)
    }

    fn scalar_f64(&self, branch: &str, range: Range<usize>) -> Result<Vec<f64>> {
        self.check_range(&range)?;
        match self.branch(branch)? {
            BranchData::ScalarF64 { values } => Ok(values[range].to_vec()),
            BranchData::ScalarI64 { values } => {
                Ok(values[range].iter().map(|&v| v as f64).collect())
            }
            _ => Err(Error::TypeMismatch(format!(
                "branch '{branch}' is not a scalar branch"
            ))),
        }
    }

    fn scalar_i64(&self, branch: &str, range: Range<usize>) -> Result<Vec<i64>> {
        self.check_range(&range)?;
        match self.branch(branch)? {
            BranchData::ScalarI64 { values } => Ok(values[range].to_vec()),
            BranchData::ScalarF64 { .. } => Err(Error::TypeMismatch(format!(
                "cannot read float branch '{branch}' as i64"
            ))),
            _ => Err(Error::TypeMismatch(format!(
                "branch '{branch}' is not a scalar branch"
            ))),
        }
    }

    fn jagged_f64(&self, branch: &str, range: Range<usize>) -> Result<Jagged<f64>> {
        self.check_range(&range)?;
        match self.branch(branch)? {
            BranchData::JaggedF64 { values } => {
                Ok(Jagged::from_rows(values[range].iter().map(|r| r.iter().copied())))
            }
            BranchData::JaggedI64 { values } => Ok(Jagged::from_rows(
                values[range].iter().map(|r| r.iter().map(|&v| v as f64)),
            )),
            _ => Err(Error::TypeMismatch(format!(
                "branch '{branch}' is not a jagged branch"
            ))),
        }
    }

    fn jagged_i64(&self, branch: &str, range: Range<usize>) -> Result<Jagged<i64>> {
        self.check_range(&range)?;
        match self.branch(branch)? {
            BranchData::JaggedI64 { values } => {
                Ok(Jagged::from_rows(values[range].iter().map(|r| r.iter().copied())))
            }
            BranchData::JaggedF64 { .. } => Err(Error::TypeMismatch(format!(
                "cannot read float branch '{branch}' as i64"
            ))),
            _ => Err(Error::TypeMismatch(format!(
                "branch '{branch}' is not a jagged branch"
            ))),
        }
    }

    fn nested_f64(&self, branch: &str, range: Range<usize>) -> Result<Jagged<f64>> {
        self.check_range(&range)?;
        match self.branch(branch)? {
            BranchData::NestedF64 { values } => Ok(Jagged::from_rows(
                values[range]
                    .iter()
                    .flat_map(|event| event.iter())
                    .map(|sub| sub.iter().copied()),
            )),
            BranchData::NestedI64 { values } => Ok(Jagged::from_rows(
                values[range]
                    .iter()
                    .flat_map(|event| event.iter())
                    .map(|sub| sub.iter().map(|&v| v as f64)),
            )),
            _ => Err(Error::TypeMismatch(format!(
                "branch '{branch}' is not a nested branch"
            ))),
        }
    }

    fn nested_i64(&self, branch: &str, range: Range<usize>) -> Result<Jagged<i64>> {
        self.check_range(&range)?;
        match self.branch(branch)? {
            BranchData::NestedI64 { values } => Ok(Jagged::from_rows(
                values[range]
                    .iter()
                    .flat_map(|event| event.iter())
                    .map(|sub| sub.iter().copied()),
            )),
            BranchData::NestedF64 { .. } => Err(Error::TypeMismatch(format!(
                "cannot read float branch '{branch}' as i64"
            ))),
            _ => Err(Error::TypeMismatch(format!(
                "branch '{branch}' is not a nested branch"
            ))),
        }
    }

    fn jagged_str(&self, branch: &str, range: Range<usize>) -> Result<Jagged<String>> {
        self.check_range(&range)?;
        match self.branch(branch)? {
            BranchData::JaggedStr { values } => {
                Ok(Jagged::from_rows(values[range].iter().map(|r| r.iter().cloned())))
            }
            _ => Err(Error::TypeMismatch(format!(
                "branch '{branch}' is not a string branch"
            ))),
        }
    }

    fn counts(&self, branch: &str, range: Range<usize>) -> Result<Vec<usize>> {
        self.check_range(&range)?;
        match self.branch(branch)? {
            BranchData::JaggedF64 { values } => Ok(values[range].iter().map(Vec::len).collect()),
            BranchData::JaggedI64 { values } => Ok(values[range].iter().map(Vec::len).collect()),
            BranchData::NestedF64 { values } => Ok(values[range].iter().map(Vec::len).collect()),
            BranchData::NestedI64 { values } => Ok(values[range].iter().map(Vec::len).collect()),
            BranchData::JaggedStr { values } => Ok(values[range].iter().map(Vec::len).collect()),
            _ => Err(Error::TypeMismatch(format!(
                "scalar branch '{branch}' has no sub-list counts"
            ))),
        }
    }

    fn header(&self) -> Option<BTreeMap<String, String>> {
        self.header.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MemorySource {
        let mut s = MemorySource::new(3);
        s.insert("id", BranchData::ScalarI64 { values: vec![10, 11, 12] }).unwrap();
        s.insert(
            "hits.t",
            BranchData::JaggedF64 { values: vec![vec![1.0, 2.0], vec![], vec![3.0]] },
        )
        .unwrap();
        s.insert(
            "trks.rec_stages",
            BranchData::NestedI64 {
                values: vec![vec![vec![1, 2], vec![1, 2, 3]], vec![], vec![vec![1]]],
            },
        )
        .unwrap();
        s
    }

    #[test]
    fn scalar_reads_and_widens() {
        let s = sample();
        assert_eq!(s.scalar_i64("id", 0..3).unwrap(), vec![10, 11, 12]);
        assert_eq!(s.scalar_f64("id", 1..3).unwrap(), vec![11.0, 12.0]);
        assert!(matches!(
            s.scalar_i64("hits.t", 0..3),
            Err(Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn jagged_and_counts() {
        let s = sample();
        let t = s.jagged_f64("hits.t", 0..3).unwrap();
        assert_eq!(t.counts(), vec![2, 0, 1]);
        assert_eq!(s.counts("hits.t", 0..3).unwrap(), vec![2, 0, 1]);
        assert_eq!(s.counts("trks.rec_stages", 0..3).unwrap(), vec![2, 0, 1]);
    }

    #[test]
    fn nested_rows_are_sub_records_in_storage_order() {
        let s = sample();
        let stages = s.nested_i64("trks.rec_stages", 0..3).unwrap();
        assert_eq!(stages.n_rows(), 3);
        assert_eq!(stages.row(0), &[1, 2]);
        assert_eq!(stages.row(1), &[1, 2, 3]);
        assert_eq!(stages.row(2), &[1]);
    }

    #[test]
    fn missing_branch_and_bad_range() {
        let s = sample();
        assert!(matches!(
            s.scalar_i64("nope", 0..3),
            Err(Error::BranchNotFound(_))
        ));
        assert!(s.scalar_i64("id", 0..4).is_err());
    }

    #[test]
    fn json_round_trip() {
        let json = r#"{
            "n_events": 2,
            "branches": {
                "run_id": {"type": "scalar_i64", "values": [7, 7]},
                "trks.lik": {"type": "jagged_f64", "values": [[0.5], []]}
            },
            "header": {"detector": "D0ARCA001"}
        }"#;
        let s = MemorySource::from_json(json).unwrap();
        assert_eq!(s.n_events(), 2);
        assert_eq!(s.branches(), vec!["run_id".to_string(), "trks.lik".to_string()]);
        assert_eq!(s.header().unwrap()["detector"], "D0ARCA001");
    }

    #[test]
    fn json_rejects_length_mismatch() {
        let json = r#"{
            "n_events": 2,
            "branches": {"run_id": {"type": "scalar_i64", "values": [7]}}
        }"#;
        assert!(MemorySource::from_json(json).is_err());
    }
}
