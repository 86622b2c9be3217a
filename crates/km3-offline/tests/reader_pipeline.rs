//! Integration tests: MemorySource → OfflineReader → selection → projection.

use std::collections::BTreeMap;

use km3_core::source::{BranchData, MemorySource};
use km3_offline::project::{project, project_cross, Column, JaggedColumn, FILL_I64};
use km3_offline::select::{select_best, select_by_stages, TieBreak};
use km3_offline::OfflineReader;

/// Three events: two competing fits, an empty event, and a stored-order tie.
fn fixture() -> MemorySource {
    let mut s = MemorySource::new(3);

    let jf =
        |v: Vec<Vec<f64>>| BranchData::JaggedF64 { values: v };
    let ji =
        |v: Vec<Vec<i64>>| BranchData::JaggedI64 { values: v };

    s.insert("id", BranchData::ScalarI64 { values: vec![1, 2, 3] }).unwrap();
    s.insert("run_id", BranchData::ScalarI64 { values: vec![5000, 5000, 5000] }).unwrap();

    s.insert("trks.id", ji(vec![vec![1, 2], vec![], vec![1, 2]])).unwrap();
    s.insert("trks.rec_type", ji(vec![vec![4000, 4000], vec![], vec![101, 101]])).unwrap();
    for path in ["trks.pos.x", "trks.pos.y", "trks.pos.z", "trks.dir.x", "trks.dir.y",
                 "trks.dir.z", "trks.t", "trks.len"] {
        s.insert(path, jf(vec![vec![0.0, 0.0], vec![], vec![0.0, 0.0]])).unwrap();
    }
    s.insert("trks.E", jf(vec![vec![10.0, 20.0], vec![], vec![30.0, 40.0]])).unwrap();
    s.insert("trks.lik", jf(vec![vec![25.0, 50.0], vec![], vec![60.0, 55.0]])).unwrap();
    s.insert(
        "trks.rec_stages",
        BranchData::NestedI64 {
            values: vec![
                vec![vec![1, 2], vec![1, 2, 3]],
                vec![],
                vec![vec![1, 2, 3], vec![1, 2, 3]],
            ],
        },
    )
    .unwrap();
    s.insert(
        "trks.fitinf",
        BranchData::NestedF64 {
            values: vec![vec![vec![0.5], vec![0.7, 0.8]], vec![], vec![vec![], vec![]]],
        },
    )
    .unwrap();
    s.insert(
        "trks.hit_ids",
        BranchData::NestedI64 {
            values: vec![vec![vec![], vec![13, 11]], vec![], vec![vec![21], vec![22]]],
        },
    )
    .unwrap();

    s.insert("hits.id", ji(vec![vec![11, 12, 13], vec![], vec![21, 22]])).unwrap();
    s.insert("hits.dom_id", ji(vec![vec![801, 802, 803], vec![], vec![808, 809]])).unwrap();
    s.insert("hits.channel_id", ji(vec![vec![0, 7, 30], vec![], vec![2, 3]])).unwrap();
    s.insert("hits.trig", ji(vec![vec![1, 0, 1], vec![], vec![0, 0]])).unwrap();
    s.insert("hits.t", jf(vec![vec![101.0, 102.0, 103.0], vec![], vec![201.0, 202.0]])).unwrap();
    s.insert("hits.tot", jf(vec![vec![25.0, 26.0, 27.0], vec![], vec![30.0, 31.0]])).unwrap();

    s.insert("w2list", jf(vec![vec![1.0, 0.5, 2.0], vec![1.0], vec![]])).unwrap();
    s.insert(
        "AAObject/usr",
        jf(vec![vec![2.0], vec![3.0], vec![]]),
    )
    .unwrap();
    s.insert(
        "AAObject/usr_names",
        BranchData::JaggedStr {
            values: vec![vec!["cc".into()], vec!["cc".into()], vec![]],
        },
    )
    .unwrap();

    let mut header = BTreeMap::new();
    header.insert("detector".to_string(), "D0ARCA001".to_string());
    header.insert("can".to_string(), "0 1027 888.4".to_string());
    s.set_header(header);
    s
}

#[test]
fn best_selection_and_projection_end_to_end() {
    let reader = OfflineReader::new(fixture());
    let tracks = reader.tracks().unwrap();
    assert_eq!(tracks.n_events(), 3);
    assert_eq!(tracks.n_tracks(), 4);

    let best = select_best(&tracks);
    // Longest stage list wins event 0; event 1 has no candidates; the tie in
    // event 2 goes to the first-stored candidate.
    assert_eq!(best.choices(), &[Some(1), None, Some(2)]);

    let out = project(&tracks, &best, &["E", "rec_type"]).unwrap();
    let Column::F64(energy) = &out["E"] else { panic!("E must be f64") };
    assert_eq!(energy[0], 20.0);
    assert!(energy[1].is_nan());
    assert_eq!(energy[2], 30.0);

    let Column::I64(rec_type) = &out["rec_type"] else { panic!("rec_type must be i64") };
    assert_eq!(rec_type, &vec![4000, FILL_I64, 101]);
}

#[test]
fn exact_stage_selection_and_global_miss() {
    let reader = OfflineReader::new(fixture());
    let tracks = reader.tracks().unwrap();

    // [2, 1] matches the two-stage fit of event 0 (set semantics), nothing
    // elsewhere: per-event absence, no error.
    let sel = select_by_stages(&tracks, &[2, 1], TieBreak::default()).unwrap();
    assert_eq!(sel.choices(), &[Some(0), None, None]);

    // A stage vocabulary that appears nowhere fails loudly.
    assert!(select_by_stages(&tracks, &[40, 41], TieBreak::default()).is_err());

    // [1, 2, 3] appears twice in event 2: ambiguous without a tie-break.
    assert!(select_by_stages(&tracks, &[1, 2, 3], TieBreak::Error).is_err());
    let sel =
        select_by_stages(&tracks, &[1, 2, 3], TieBreak::FirstInStorageOrder).unwrap();
    assert_eq!(sel.choices(), &[Some(1), None, Some(2)]);
}

#[test]
fn cross_projection_resolves_hit_ids_within_events() {
    let reader = OfflineReader::new(fixture());
    let tracks = reader.tracks().unwrap();
    let hits = reader.hits().unwrap();
    let best = select_best(&tracks);

    let out = project_cross(&tracks, &hits, &best, &["dom_id", "tot"]).unwrap();
    let JaggedColumn::I64(dom) = &out["dom_id"] else { panic!("dom_id must be i64") };
    // Event 0's best fit references hits 13 and 11, in that order.
    assert_eq!(dom.row(0), &[803, 801]);
    assert!(dom.row(1).is_empty());
    assert_eq!(dom.row(2), &[808]);

    let JaggedColumn::F64(tot) = &out["tot"] else { panic!("tot must be f64") };
    assert_eq!(tot.row(0), &[27.0, 25.0]);
    assert_eq!(tot.row_len(1), 0);
}

#[test]
fn usr_and_header_access() {
    let reader = OfflineReader::new(fixture());

    let cc = reader.usr("cc").unwrap();
    assert_eq!(cc[0], 2.0);
    assert_eq!(cc[1], 3.0);
    assert!(cc[2].is_nan());
    assert!(reader.usr("nope").is_err());

    let header = reader.header().unwrap();
    assert_eq!(header.get("detector"), Some("D0ARCA001"));
    assert_eq!(header.floats("can").unwrap(), vec![0.0, 1027.0, 888.4]);
}

#[test]
fn w2list_slots_fill_missing_entries_with_nan() {
    let reader = OfflineReader::new(fixture());
    let slot1 = reader.w2list_param(1).unwrap();
    assert_eq!(slot1[0], 0.5);
    assert!(slot1[1].is_nan());
    assert!(slot1[2].is_nan());
}

#[test]
fn repeated_table_reads_hit_the_column_cache() {
    let reader = OfflineReader::new(fixture());
    let first = reader.tracks().unwrap();
    let misses_after_first = reader.cache_stats().misses;

    let second = reader.tracks().unwrap();
    assert_eq!(first.offsets, second.offsets);
    assert_eq!(first.e, second.e);

    let stats = reader.cache_stats();
    assert_eq!(stats.misses, misses_after_first, "second read must not touch the source");
    assert!(stats.hits >= 15, "all track columns should be served from cache");
}

#[test]
fn event_header_columns() {
    let reader = OfflineReader::new(fixture());
    assert_eq!(reader.n_events(), 3);
    assert_eq!(reader.event_ids().unwrap(), vec![1, 2, 3]);
    assert_eq!(reader.run_ids().unwrap(), vec![5000, 5000, 5000]);
}
