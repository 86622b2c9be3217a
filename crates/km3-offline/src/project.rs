//! Flattening selected candidates into rectangular per-event columns.
//!
//! Events without a selection receive a documented fill value: NaN for f64
//! fields and [`FILL_I64`] (−1, the data format's own "unknown" code) for
//! integer fields. Zero is never used as a fill — a silent zero is
//! indistinguishable from a real measurement.

use std::collections::{BTreeMap, HashMap};

use km3_core::definitions::reconstruction::RECTYPE_UNKNOWN;
use km3_core::error::{Error, Result};
use km3_core::jagged::Jagged;

use crate::select::Selection;
use crate::tables::{FieldKind, HitField, HitTable, TrackField, TrackTable};

/// Fill value for f64 fields of unselected events.
pub const FILL_F64: f64 = f64::NAN;
/// Fill value for i64 fields of unselected events.
pub const FILL_I64: i64 = RECTYPE_UNKNOWN;

/// One flat per-event output column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// f64 values, NaN at absences.
    F64(Vec<f64>),
    /// i64 values, [`FILL_I64`] at absences.
    I64(Vec<i64>),
}

/// One ragged per-event output column.
#[derive(Debug, Clone, PartialEq)]
pub enum JaggedColumn {
    /// Ragged f64 values; absences are empty rows.
    F64(Jagged<f64>),
    /// Ragged i64 values; absences are empty rows.
    I64(Jagged<i64>),
}

fn check_events(selection: &Selection, n_events: usize, what: &str) -> Result<()> {
    if selection.n_events() != n_events {
        return Err(Error::TypeMismatch(format!(
            "selection covers {} events but the {what} holds {}",
            selection.n_events(),
            n_events
        )));
    }
    Ok(())
}

/// Project named fields of the selected candidate into flat per-event
/// columns, keyed by the requested names.
///
/// Output rows follow the input event order. The field list must be
/// non-empty and fully resolvable — an unknown name fails the whole call,
/// never a partial mapping.
pub fn project(
    tracks: &TrackTable,
    selection: &Selection,
    field_names: &[&str],
) -> Result<BTreeMap<String, Column>> {
    if field_names.is_empty() {
        return Err(Error::EmptyFieldList);
    }
    check_events(selection, tracks.n_events(), "track table")?;

    // Resolve every name before materializing anything.
    let fields: Vec<TrackField> = field_names
        .iter()
        .map(|name| TrackField::from_name(name))
        .collect::<Result<_>>()?;

    let mut out = BTreeMap::new();
    for (&name, &field) in field_names.iter().zip(&fields) {
        let column = match field.kind() {
            FieldKind::F64 => {
                let flat = tracks.f64_column(field)?;
                Column::F64(
                    selection
                        .choices()
                        .iter()
                        .map(|choice| choice.map_or(FILL_F64, |c| flat[c]))
                        .collect(),
                )
            }
            FieldKind::I64 => {
                let flat = tracks.i64_column(field)?;
                Column::I64(
                    selection
                        .choices()
                        .iter()
                        .map(|choice| choice.map_or(FILL_I64, |c| flat[c]))
                        .collect(),
                )
            }
        };
        out.insert(name.to_string(), column);
    }
    Ok(out)
}

/// Project named hit fields through the selected candidate's `hit_ids`.
///
/// Two-hop lookup: event → selected track → referenced hits of the same
/// event. Output stays ragged: an event whose selected track references
/// five hits yields five entries; an unselected event yields an empty row
/// (never a fill scalar). A hit id that resolves to no hit of that event is
/// a data error.
pub fn project_cross(
    tracks: &TrackTable,
    hits: &HitTable,
    selection: &Selection,
    hit_field_names: &[&str],
) -> Result<BTreeMap<String, JaggedColumn>> {
    if hit_field_names.is_empty() {
        return Err(Error::EmptyFieldList);
    }
    check_events(selection, tracks.n_events(), "track table")?;
    check_events(selection, hits.n_events(), "hit table")?;

    let fields: Vec<HitField> = hit_field_names
        .iter()
        .map(|name| HitField::from_name(name))
        .collect::<Result<_>>()?;

    // Resolve hit ids to flat hit rows once, shared by all fields.
    let mut rows_per_event: Vec<Vec<usize>> = Vec::with_capacity(selection.n_events());
    for (event, choice) in selection.choices().iter().enumerate() {
        let Some(candidate) = choice else {
            rows_per_event.push(Vec::new());
            continue;
        };
        let window = hits.hits_in(event);
        let by_id: HashMap<i64, usize> = window
            .clone()
            .map(|row| (hits.id[row], row))
            .collect();
        let ids = tracks.hit_ids.row(*candidate);
        let mut rows = Vec::with_capacity(ids.len());
        for &hit_id in ids {
            match by_id.get(&hit_id) {
                Some(&row) => rows.push(row),
                None => return Err(Error::HitIdNotFound { event, hit_id }),
            }
        }
        rows_per_event.push(rows);
    }

    let mut out = BTreeMap::new();
    for (&name, &field) in hit_field_names.iter().zip(&fields) {
        let column = match field.kind() {
            FieldKind::F64 => {
                let flat = hits.f64_column(field)?;
                JaggedColumn::F64(Jagged::from_rows(
                    rows_per_event.iter().map(|rows| rows.iter().map(|&r| flat[r])),
                ))
            }
            FieldKind::I64 => {
                let flat = hits.i64_column(field)?;
                JaggedColumn::I64(Jagged::from_rows(
                    rows_per_event.iter().map(|rows| rows.iter().map(|&r| flat[r])),
                ))
            }
        };
        out.insert(name.to_string(), column);
    }
    Ok(out)
}

/// Project one fit-parameter slot of the selected candidate.
///
/// `param` is a slot index from the fitparameters table. Absent selections
/// and fits whose `fitinf` vector is too short yield NaN.
pub fn fitinf(param: usize, tracks: &TrackTable, selection: &Selection) -> Result<Vec<f64>> {
    check_events(selection, tracks.n_events(), "track table")?;
    Ok(selection
        .choices()
        .iter()
        .map(|choice| {
            choice.map_or(FILL_F64, |c| {
                tracks.fitinf.row(c).get(param).copied().unwrap_or(FILL_F64)
            })
        })
        .collect())
}
