//! Integration tests: summary-slice materialization and status decoding.

use km3_core::source::{BranchData, MemorySource};
use km3_online::SummarySlices;

fn fixture() -> MemorySource {
    let mut s = MemorySource::new(2);
    let si = |v: Vec<i64>| BranchData::ScalarI64 { values: v };
    let ji = |v: Vec<Vec<i64>>| BranchData::JaggedI64 { values: v };

    s.insert("summaryslice.detector_id", si(vec![44, 44])).unwrap();
    s.insert("summaryslice.run", si(vec![6000, 6000])).unwrap();
    s.insert("summaryslice.frame_index", si(vec![100, 101])).unwrap();
    s.insert("summaryslice.t_sec", si(vec![1_600_000_000, 1_600_000_000])).unwrap();
    s.insert("summaryslice.t_ns", si(vec![0, 100_000_000])).unwrap();

    // Slice 0 has two module frames, slice 1 has one.
    s.insert("summaryslice.dom_id", ji(vec![vec![801, 802], vec![801]])).unwrap();
    // Frame 0: 100 UDP packets, max seq 7. Frame 1: trailer-ready word.
    s.insert(
        "summaryslice.dq_status",
        ji(vec![vec![(7 << 16) | 100, (1 << 16) | 3], vec![0]]),
    )
    .unwrap();
    // Channel 5 of frame 0 is in high-rate veto.
    s.insert("summaryslice.hrv", ji(vec![vec![1 << 5, 0], vec![0]])).unwrap();
    // Frame 1: UDP trailer bit (31) plus FIFO-full on channel 2; stored
    // signed, so the word is negative on disk.
    s.insert(
        "summaryslice.fifo",
        ji(vec![vec![0, (1i64 << 31) | (1 << 2)], vec![0]]),
    )
    .unwrap();
    s.insert("summaryslice.status3", ji(vec![vec![0, 0], vec![0]])).unwrap();
    s.insert("summaryslice.status4", ji(vec![vec![0, 0], vec![0]])).unwrap();

    for channel in 0..31 {
        let rate = if channel == 3 { 128 } else { 0 };
        s.insert(
            format!("summaryslice.ch{channel}"),
            ji(vec![vec![rate, 0], vec![255]]),
        )
        .unwrap();
    }
    s
}

#[test]
fn materializes_frame_table_per_slice() {
    let slices = SummarySlices::from_source(&fixture()).unwrap();
    assert_eq!(slices.n_slices(), 2);
    assert_eq!(slices.n_frames(), 3);
    assert_eq!(slices.frames_in(0), 0..2);
    assert_eq!(slices.frame_for_module(0, 802), Some(1));
    assert_eq!(slices.frame_for_module(1, 802), None);
}

#[test]
fn decodes_packed_status_words() {
    let slices = SummarySlices::from_source(&fixture()).unwrap();

    assert_eq!(slices.udp_packets(0), 100);
    assert_eq!(slices.udp_max_sequence_number(0), 7);

    assert!(slices.hrv_flags(0)[5]);
    assert!(slices.has_hrv(0));
    assert!(!slices.has_hrv(1));

    assert!(slices.has_udp_trailer(1));
    assert!(!slices.has_udp_trailer(0));
    assert!(slices.fifo_flags(1)[2]);
    assert!(!slices.fifo_flags(1)[3]);
}

#[test]
fn decodes_compressed_rates() {
    let slices = SummarySlices::from_source(&fixture()).unwrap();

    let rates = slices.rates_hz(0);
    assert!(rates[3] > 0.0);
    assert_eq!(rates[4], 0.0);

    // Frame of slice 1 runs every channel at the maximal encodable rate.
    let hot = slices.rates_hz(2);
    assert!(hot.iter().all(|&r| (r - km3_online::MAXIMAL_RATE_HZ).abs() < 1e-6));
}

#[test]
fn misaligned_status_column_is_rejected() {
    let mut s = fixture();
    s.insert(
        "summaryslice.hrv",
        BranchData::JaggedI64 { values: vec![vec![0], vec![0]] },
    )
    .unwrap();
    assert!(SummarySlices::from_source(&s).is_err());
}
