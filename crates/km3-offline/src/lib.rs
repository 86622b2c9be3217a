//! # km3-offline
//!
//! Offline event model for km3rs: columnar hit/track tables with enumerated
//! field registries, best-reconstruction selection over ragged candidate
//! lists, and projection of selected candidates into flat per-event arrays.
//!
//! ## Example
//!
//! ```
//! use km3_offline::select::select_best;
//! use km3_offline::project::{project, Column};
//! use km3_offline::tables::{TrackRow, TrackTable};
//!
//! let tracks = TrackTable::from_rows(vec![
//!     vec![
//!         TrackRow { e: 10.0, rec_stages: vec![1, 2], ..Default::default() },
//!         TrackRow { e: 20.0, rec_stages: vec![1, 2, 3], ..Default::default() },
//!     ],
//!     vec![],
//! ]);
//! let best = select_best(&tracks);
//! let out = project(&tracks, &best, &["E"]).unwrap();
//! let Column::F64(energy) = &out["E"] else { unreachable!() };
//! assert_eq!(energy[0], 20.0);
//! assert!(energy[1].is_nan());
//! ```

#![warn(clippy::all)]

pub mod project;
pub mod reader;
pub mod select;
pub mod tables;

pub use project::{Column, JaggedColumn, FILL_F64, FILL_I64, fitinf, project, project_cross};
pub use reader::{Header, OfflineReader};
pub use select::{
    Selection, StageQuery, TieBreak, best_aashower, best_dusjshower, best_jmuon, best_jshower,
    multiplicity, select_best, select_best_in, select_by_stages, select_max_likelihood,
};
pub use tables::{
    FieldKind, HitField, HitRow, HitTable, McHitTable, McTrackTable, TrackField, TrackRow,
    TrackTable,
};
