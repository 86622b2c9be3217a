//! Summary slices: fixed-interval per-module status and rate snapshots.
//!
//! Each frame carries one packed status word per concern. The channel words
//! (`hrv`, `fifo`) hold one bit per PMT channel in bits 0..=30; bit 31 of
//! `fifo` is the UDP-trailer flag. `dq_status` packs the UDP packet count
//! (bits 0..=14) and the maximum UDP sequence number (bits 16..=31). PMT
//! rates are stored as one byte per channel, logarithmically compressed.

use std::ops::Range;
use std::sync::LazyLock;

use km3_core::bitfield::{extract, BitLayout, BitWord};
use km3_core::definitions::pmt_status;
use km3_core::error::{Error, Result};
use km3_core::source::BranchSource;

/// Number of PMT channels per optical module.
pub const N_CHANNELS: usize = 31;

/// Smallest encodable non-zero PMT rate.
pub const MINIMAL_RATE_HZ: f64 = 2.0e3;
/// Largest encodable PMT rate.
pub const MAXIMAL_RATE_HZ: f64 = 2.0e6;

fn rate_factor() -> f64 {
    (MAXIMAL_RATE_HZ / MINIMAL_RATE_HZ).ln() / 255.0
}

/// Decode a compressed one-byte PMT rate to Hz.
///
/// Zero means "no rate recorded", not the minimal rate.
pub fn rate_hz(value: u8) -> f64 {
    if value == 0 {
        0.0
    } else {
        MINIMAL_RATE_HZ * (f64::from(value) * rate_factor()).exp()
    }
}

/// Layout of the `dq_status` word.
pub static DQ_STATUS: LazyLock<BitLayout> = LazyLock::new(|| {
    BitLayout::new(&[("udp_packets", 0, 15), ("udp_max_seq", 16, 16)])
        .expect("documented dq_status layout is well-formed")
});

/// Layout of the `fifo` word: channel bits plus the UDP-trailer flag.
pub static FIFO: LazyLock<BitLayout> = LazyLock::new(|| {
    BitLayout::new(&[("channels", 0, 31), ("udp_trailer", 31, 1)])
        .expect("documented fifo layout is well-formed")
});

/// Layout of a PMT status word, one flag per documented status bit.
pub static PMT_STATUS: LazyLock<BitLayout> = LazyLock::new(|| {
    BitLayout::new(&[
        ("pmt_disable", pmt_status::PMT_DISABLE, 1),
        ("high_rate_veto_disable", pmt_status::HIGH_RATE_VETO_DISABLE, 1),
        ("fifo_full_disable", pmt_status::FIFO_FULL_DISABLE, 1),
        ("udp_counter_disable", pmt_status::UDP_COUNTER_DISABLE, 1),
        ("udp_trailer_disable", pmt_status::UDP_TRAILER_DISABLE, 1),
        ("out_of_sync", pmt_status::OUT_OF_SYNC, 1),
    ])
    .expect("documented pmt status layout is well-formed")
});

/// Whether a named PMT status bit is set.
pub fn pmt_status_flag<W: BitWord>(word: W, name: &str) -> Result<bool> {
    PMT_STATUS.flag(name, word)
}

/// Number of UDP packets received for this frame (`dq_status`).
pub fn udp_packets<W: BitWord>(dq_status: W) -> u64 {
    extract(dq_status, 0, 15)
}

/// Maximum sequence number of the received UDP packets (`dq_status`).
pub fn udp_max_sequence_number<W: BitWord>(dq_status: W) -> u64 {
    extract(dq_status, 16, 16)
}

/// Whether the UDP trailer arrived for this frame (`fifo`, bit 31).
pub fn has_udp_trailer<W: BitWord>(fifo: W) -> bool {
    extract(fifo, 31, 1) != 0
}

/// Per-channel bits of an `hrv`/`fifo` word (channels 0..=30).
pub fn channel_flags<W: BitWord>(word: W) -> [bool; N_CHANNELS] {
    let bits = word.to_bits();
    std::array::from_fn(|channel| (bits >> channel) & 1 != 0)
}

/// A decoded summary-slice store: per-slice headers plus a frame table.
///
/// Frames of slice `s` occupy flat rows `offsets[s]..offsets[s + 1]`.
#[derive(Debug, Clone, Default)]
pub struct SummarySlices {
    /// Slice boundaries over the flat frame axis (`n_slices + 1`).
    pub offsets: Vec<usize>,
    /// Per-slice detector identifier.
    pub detector_id: Vec<i64>,
    /// Per-slice run number.
    pub run: Vec<i64>,
    /// Per-slice DAQ frame index.
    pub frame_index: Vec<i64>,
    /// Per-slice UTC seconds.
    pub t_sec: Vec<i64>,
    /// Per-slice UTC nanoseconds.
    pub t_ns: Vec<i64>,
    /// Per-frame optical-module identifier.
    pub dom_id: Vec<i64>,
    /// Per-frame data-quality status word.
    pub dq_status: Vec<u32>,
    /// Per-frame high-rate-veto channel word.
    pub hrv: Vec<u32>,
    /// Per-frame FIFO channel word (bit 31: UDP trailer).
    pub fifo: Vec<u32>,
    /// Per-frame status word 3.
    pub status3: Vec<u32>,
    /// Per-frame status word 4.
    pub status4: Vec<u32>,
    /// Per-frame compressed PMT rates, one byte per channel.
    pub rates: Vec<[u8; N_CHANNELS]>,
}

impl SummarySlices {
    /// Materialize all slices from a summary-slice source.
    ///
    /// One source event is one summary slice.
    pub fn from_source<S: BranchSource>(source: &S) -> Result<Self> {
        let range = 0..source.n_events();
        let dom_id = source.jagged_i64("summaryslice.dom_id", range.clone())?;
        let offsets = dom_id.offsets().to_vec();
        let n_frames = dom_id.n_values();

        let word = |branch: &str| -> Result<Vec<u32>> {
            let col = source.jagged_i64(branch, range.clone())?;
            if !col.is_aligned_with(&dom_id) {
                return Err(Error::Deserialization(format!(
                    "summary column '{branch}' is misaligned with 'summaryslice.dom_id'"
                )));
            }
            // Words are stored as signed on disk; reinterpret, never clamp.
            Ok(col.flat().iter().map(|&v| v as u32).collect())
        };

        let mut rates = vec![[0u8; N_CHANNELS]; n_frames];
        for channel in 0..N_CHANNELS {
            let col = source.jagged_i64(&format!("summaryslice.ch{channel}"), range.clone())?;
            if col.n_values() != n_frames {
                return Err(Error::Deserialization(format!(
                    "summary rate column 'ch{channel}' is misaligned with the frame axis"
                )));
            }
            for (frame, &value) in col.flat().iter().enumerate() {
                rates[frame][channel] = value as u8;
            }
        }

        let slices = Self {
            offsets,
            detector_id: source.scalar_i64("summaryslice.detector_id", range.clone())?,
            run: source.scalar_i64("summaryslice.run", range.clone())?,
            frame_index: source.scalar_i64("summaryslice.frame_index", range.clone())?,
            t_sec: source.scalar_i64("summaryslice.t_sec", range.clone())?,
            t_ns: source.scalar_i64("summaryslice.t_ns", range.clone())?,
            dom_id: dom_id.flat().to_vec(),
            dq_status: word("summaryslice.dq_status")?,
            hrv: word("summaryslice.hrv")?,
            fifo: word("summaryslice.fifo")?,
            status3: word("summaryslice.status3")?,
            status4: word("summaryslice.status4")?,
            rates,
        };
        tracing::debug!(
            n_slices = slices.n_slices(),
            n_frames,
            "materialized summary slices"
        );
        Ok(slices)
    }

    /// Number of slices.
    pub fn n_slices(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Number of frames across all slices.
    pub fn n_frames(&self) -> usize {
        self.offsets.last().copied().unwrap_or(0)
    }

    /// Flat frame range of one slice.
    pub fn frames_in(&self, slice: usize) -> Range<usize> {
        self.offsets[slice]..self.offsets[slice + 1]
    }

    /// Flat frame index of a module within a slice, if present.
    pub fn frame_for_module(&self, slice: usize, dom_id: i64) -> Option<usize> {
        self.frames_in(slice).find(|&frame| self.dom_id[frame] == dom_id)
    }

    /// Decoded PMT rates of one frame, in Hz.
    pub fn rates_hz(&self, frame: usize) -> [f64; N_CHANNELS] {
        std::array::from_fn(|channel| rate_hz(self.rates[frame][channel]))
    }

    /// High-rate-veto flags of one frame, per channel.
    pub fn hrv_flags(&self, frame: usize) -> [bool; N_CHANNELS] {
        channel_flags(self.hrv[frame])
    }

    /// Whether any channel of one frame has the high-rate veto set.
    pub fn has_hrv(&self, frame: usize) -> bool {
        extract(self.hrv[frame], 0, 31) != 0
    }

    /// FIFO-full flags of one frame, per channel.
    pub fn fifo_flags(&self, frame: usize) -> [bool; N_CHANNELS] {
        channel_flags(self.fifo[frame])
    }

    /// Whether the UDP trailer arrived for one frame.
    pub fn has_udp_trailer(&self, frame: usize) -> bool {
        has_udp_trailer(self.fifo[frame])
    }

    /// UDP packets received for one frame.
    pub fn udp_packets(&self, frame: usize) -> u64 {
        udp_packets(self.dq_status[frame])
    }

    /// Maximum UDP sequence number seen for one frame.
    pub fn udp_max_sequence_number(&self, frame: usize) -> u64 {
        udp_max_sequence_number(self.dq_status[frame])
    }
}
