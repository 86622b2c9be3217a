//! # km3-online
//!
//! Online/DAQ record model for km3rs: summary slices with packed per-module
//! status words and compressed PMT rates, timeslice streams with per-module
//! hit frames, and triggered events with snapshot/triggered hit tables.
//!
//! Each online record type lives in its own tree on disk; accordingly each
//! table materializes from its own [`km3_core::source::BranchSource`].

#![warn(clippy::all)]

pub mod event;
pub mod summaryslice;
pub mod timeslice;

pub use event::{DaqHitTable, OnlineEvents, is_3dmuon, is_3dshower, is_mxshower, is_nb, triggered};
pub use summaryslice::{
    MAXIMAL_RATE_HZ, MINIMAL_RATE_HZ, N_CHANNELS, SummarySlices, channel_flags, has_udp_trailer,
    pmt_status_flag, rate_hz, udp_max_sequence_number, udp_packets,
};
pub use timeslice::{FrameHits, TimesliceStream, TimesliceStreams};
