//! Per-event selection of one reconstruction candidate.
//!
//! Every selector follows the same CSR shape: a single pass over the flat
//! candidate axis computes a score or match flag per candidate, then a
//! segmented reduction over the event offsets picks at most one candidate per
//! event. No per-event re-slicing of columns happens in the hot path.

use km3_core::definitions::reconstruction as krec;
use km3_core::error::{Error, Result};

use crate::tables::TrackTable;

/// Per-event choice of one candidate, or absence.
///
/// Absence is a first-class value: most events legitimately lack a given
/// reconstruction. Indices are into the flat candidate axis of the table the
/// selection was made from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    choices: Vec<Option<usize>>,
}

impl Selection {
    /// Wrap per-event choices.
    pub fn from_choices(choices: Vec<Option<usize>>) -> Self {
        Self { choices }
    }

    /// Number of events covered.
    pub fn n_events(&self) -> usize {
        self.choices.len()
    }

    /// Flat candidate index selected for `event`, if any.
    pub fn get(&self, event: usize) -> Option<usize> {
        self.choices[event]
    }

    /// All per-event choices.
    pub fn choices(&self) -> &[Option<usize>] {
        &self.choices
    }

    /// Number of events with a selected candidate.
    pub fn n_selected(&self) -> usize {
        self.choices.iter().filter(|c| c.is_some()).count()
    }
}

/// What to do when several candidates match an exact stage query in one
/// event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Raise [`Error::AmbiguousSelection`] — duplicates signal an upstream
    /// data problem.
    #[default]
    Error,
    /// Keep the candidate stored first.
    FirstInStorageOrder,
}

/// A per-candidate stage-list predicate.
///
/// `ExactSet` is the primary selection semantics; the others are the
/// traditional mask flavours over `rec_stages`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageQuery {
    /// The candidate's stages equal the target as a set (duplicates
    /// collapse, stored order is irrelevant).
    ExactSet(Vec<i64>),
    /// The candidate's stages equal the target element-wise, in stored
    /// order.
    Sequence(Vec<i64>),
    /// All target stages are present; extra stages are allowed.
    AtLeast(Vec<i64>),
    /// First and last stored stage match.
    StartEnd {
        first: i64,
        last: i64,
    },
    /// Every stage lies in the inclusive range. Matches the stage-number
    /// blocks of one fitting chain.
    MinMax {
        min: i64,
        max: i64,
    },
}

impl StageQuery {
    /// Whether a stored stage list satisfies this query.
    pub fn matches(&self, stages: &[i64]) -> bool {
        match self {
            StageQuery::ExactSet(target) => {
                set_normalize(stages) == set_normalize(target)
            }
            StageQuery::Sequence(target) => stages == target.as_slice(),
            StageQuery::AtLeast(required) => {
                required.iter().all(|r| stages.contains(r))
            }
            StageQuery::StartEnd { first, last } => {
                !stages.is_empty() && stages[0] == *first && stages[stages.len() - 1] == *last
            }
            StageQuery::MinMax { min, max } => {
                !stages.is_empty() && stages.iter().all(|s| (*min..=*max).contains(s))
            }
        }
    }
}

fn set_normalize(stages: &[i64]) -> Vec<i64> {
    let mut s = stages.to_vec();
    s.sort_unstable();
    s.dedup();
    s
}

/// Select, per event, the candidate whose stages equal `target` as a set.
///
/// Zero matches in an event yield absence. More than one match is an
/// [`Error::AmbiguousSelection`] unless `tie` requests storage order. A
/// `target` matching nothing in the whole dataset raises
/// [`Error::NoMatchingStages`]: that is almost always a typo'd stage
/// vocabulary, and all-absent output would hide it.
pub fn select_by_stages(
    tracks: &TrackTable,
    target: &[i64],
    tie: TieBreak,
) -> Result<Selection> {
    let normalized = set_normalize(target);

    // Flat pass: one match flag per candidate.
    let matches: Vec<bool> = tracks
        .rec_stages
        .iter_rows()
        .map(|stages| set_normalize(stages) == normalized)
        .collect();

    // Segmented reduction over event offsets.
    let mut choices = Vec::with_capacity(tracks.n_events());
    let mut total_matches = 0usize;
    for window in tracks.offsets.windows(2) {
        let mut first = None;
        let mut count = 0usize;
        for candidate in window[0]..window[1] {
            if matches[candidate] {
                count += 1;
                if first.is_none() {
                    first = Some(candidate);
                }
            }
        }
        if count > 1 && tie == TieBreak::Error {
            return Err(Error::AmbiguousSelection { event: choices.len(), matches: count });
        }
        total_matches += count;
        choices.push(first);
    }

    if total_matches == 0 {
        return Err(Error::NoMatchingStages {
            target: normalized,
            n_events: tracks.n_events(),
        });
    }

    Ok(Selection::from_choices(choices))
}

/// Select, per event, the candidate with the most completed stages.
///
/// Ties go to the candidate stored first. Events without candidates yield
/// absence.
pub fn select_best(tracks: &TrackTable) -> Selection {
    let lengths = tracks.rec_stages.counts();
    Selection::from_choices(argbest_per_event(&tracks.offsets, |c| Some(lengths[c])))
}

/// Select the most-completed candidate among those matching `query`.
///
/// Filter, then maximal stage count, then first in storage order. Events
/// where nothing matches yield absence (no dataset-wide check: a filter is
/// exploratory, unlike an exact-match request).
pub fn select_best_in(tracks: &TrackTable, query: &StageQuery) -> Selection {
    let lengths = tracks.rec_stages.counts();
    let choices = argbest_per_event(&tracks.offsets, |c| {
        query.matches(tracks.rec_stages.row(c)).then_some(lengths[c])
    });
    Selection::from_choices(choices)
}

/// Select the maximum-likelihood candidate among the most-completed ones
/// matching `query`.
///
/// The classic best-track rule: filter by `query`, keep the candidates with
/// the maximal stage count, then take the one with the largest `lik`.
pub fn select_max_likelihood(tracks: &TrackTable, query: &StageQuery) -> Selection {
    let lengths = tracks.rec_stages.counts();
    let choices = argbest_per_event(&tracks.offsets, |c| {
        query
            .matches(tracks.rec_stages.row(c))
            .then_some((lengths[c], OrdF64(tracks.lik[c])))
    });
    Selection::from_choices(choices)
}

/// Count, per event, the candidates matching `query`.
pub fn multiplicity(tracks: &TrackTable, query: &StageQuery) -> Vec<usize> {
    let matches: Vec<bool> = tracks
        .rec_stages
        .iter_rows()
        .map(|stages| query.matches(stages))
        .collect();
    tracks
        .offsets
        .windows(2)
        .map(|w| matches[w[0]..w[1]].iter().filter(|m| **m).count())
        .collect()
}

/// Best JMUON-chain candidate (maximum likelihood rule).
pub fn best_jmuon(tracks: &TrackTable) -> Selection {
    select_max_likelihood(
        tracks,
        &StageQuery::MinMax { min: krec::JMUONBEGIN, max: krec::JMUONEND },
    )
}

/// Best JSHOWER-chain candidate (maximum likelihood rule).
pub fn best_jshower(tracks: &TrackTable) -> Selection {
    select_max_likelihood(
        tracks,
        &StageQuery::MinMax { min: krec::JSHOWERBEGIN, max: krec::JSHOWEREND },
    )
}

/// Best aanet-shower candidate (maximum likelihood rule).
pub fn best_aashower(tracks: &TrackTable) -> Selection {
    select_max_likelihood(
        tracks,
        &StageQuery::MinMax { min: krec::AASHOWERBEGIN, max: krec::AASHOWEREND },
    )
}

/// Best Dusj-shower candidate (maximum likelihood rule).
pub fn best_dusjshower(tracks: &TrackTable) -> Selection {
    select_max_likelihood(
        tracks,
        &StageQuery::MinMax { min: krec::DUSJSHOWERBEGIN, max: krec::DUSJSHOWEREND },
    )
}

/// Segmented arg-best: within each event's candidate window, the first
/// candidate with the strictly greatest score. `None` scores are filtered
/// out; a window with no scored candidate yields absence.
fn argbest_per_event<S, F>(offsets: &[usize], score: F) -> Vec<Option<usize>>
where
    S: PartialOrd,
    F: Fn(usize) -> Option<S>,
{
    offsets
        .windows(2)
        .map(|w| {
            let mut best: Option<(usize, S)> = None;
            for candidate in w[0]..w[1] {
                if let Some(s) = score(candidate) {
                    // Strict comparison keeps the first of equal scores.
                    let better = match &best {
                        Some((_, current)) => s > *current,
                        None => true,
                    };
                    if better {
                        best = Some((candidate, s));
                    }
                }
            }
            best.map(|(candidate, _)| candidate)
        })
        .collect()
}

/// f64 with total order for score tuples (likelihoods are never NaN in
/// well-formed files; NaN loses against any number here).
#[derive(Debug, Clone, Copy, PartialEq)]
struct OrdF64(f64);

impl PartialOrd for OrdF64 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.0.total_cmp(&other.0))
    }
}
