//! Error types shared across the km3rs workspace.

use thiserror::Error;

/// km3rs error type.
///
/// Per-event absence of a reconstruction is *not* represented here — it is a
/// first-class value carried by `Selection`. Everything below is either a
/// configuration mistake (surfaced at the call that introduced it) or a data
/// integrity problem.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A field name not present in the field registry was requested.
    #[error("unknown field '{0}'")]
    UnknownField(String),

    /// A projection was requested with an empty field list.
    #[error("empty field list")]
    EmptyFieldList,

    /// A branch name not provided by the source.
    #[error("branch not found: '{0}'")]
    BranchNotFound(String),

    /// Column type or shape does not match what the caller asked for.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Malformed bit-layout entry (zero width, duplicate name). Raised at
    /// layout construction, never at decode time.
    #[error("invalid bit layout: {0}")]
    InvalidBitLayout(String),

    /// More than one candidate matched an exact stage query in one event and
    /// no tie-break policy was requested.
    #[error("ambiguous selection: event {event} has {matches} candidates matching the stage query")]
    AmbiguousSelection {
        /// Event index within the queried range.
        event: usize,
        /// Number of matching candidates.
        matches: usize,
    },

    /// The target stage list matched no candidate anywhere in the dataset.
    /// Distinct from per-event absence: this usually means a typo'd stage
    /// vocabulary.
    #[error("stage query {target:?} matched no candidate in any of {n_events} events")]
    NoMatchingStages {
        /// The normalized (sorted, deduplicated) target stages.
        target: Vec<i64>,
        /// Number of events searched.
        n_events: usize,
    },

    /// A selected track references a hit id that does not exist among the
    /// hits of the same event.
    #[error("hit id {hit_id} referenced by the selected track of event {event} was not found")]
    HitIdNotFound {
        /// Event index.
        event: usize,
        /// The unresolved hit id.
        hit_id: i64,
    },

    /// Malformed column data from a source (offset/count inconsistencies).
    #[error("deserialization error: {0}")]
    Deserialization(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
