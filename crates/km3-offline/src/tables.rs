//! Columnar hit/track tables and their field registries.
//!
//! A table is a struct of columns sharing one event-offsets vector: column
//! `i` of every flat array belongs to the same candidate/hit, and event `e`
//! owns the flat rows `offsets[e]..offsets[e + 1]`. Per-candidate ragged
//! attributes (`rec_stages`, `fitinf`, `hit_ids`) are `Jagged` columns whose
//! rows align with the flat candidate axis.
//!
//! Field access is registry-based: a fixed name → (kind, column) mapping
//! checked at the call site, so an unknown name is a configuration error at
//! the first lookup, not a reflection fallback.

use std::ops::Range;

use km3_core::error::{Error, Result};
use km3_core::jagged::Jagged;

/// Scalar column kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// 64-bit float column.
    F64,
    /// 64-bit integer column.
    I64,
}

fn check_offsets(offsets: &[usize], n_flat: usize, what: &str) -> Result<()> {
    if offsets.first() != Some(&0)
        || offsets.windows(2).any(|w| w[0] > w[1])
        || offsets.last() != Some(&n_flat)
    {
        return Err(Error::Deserialization(format!(
            "{what}: event offsets do not cover the flat axis"
        )));
    }
    Ok(())
}

fn check_len(len: usize, n_flat: usize, name: &str, what: &str) -> Result<()> {
    if len != n_flat {
        return Err(Error::Deserialization(format!(
            "{what}: column '{name}' holds {len} rows, expected {n_flat}"
        )));
    }
    Ok(())
}

// ── Tracks ─────────────────────────────────────────────────────

/// Reconstructed-fit candidates, one flat row per candidate.
#[derive(Debug, Clone, Default)]
pub struct TrackTable {
    /// Event boundaries over the flat candidate axis (`n_events + 1`).
    pub offsets: Vec<usize>,
    /// Track identifier.
    pub id: Vec<i64>,
    pub pos_x: Vec<f64>,
    pub pos_y: Vec<f64>,
    pub pos_z: Vec<f64>,
    pub dir_x: Vec<f64>,
    pub dir_y: Vec<f64>,
    pub dir_z: Vec<f64>,
    /// Fit time.
    pub t: Vec<f64>,
    /// Reconstructed energy.
    pub e: Vec<f64>,
    /// Track length.
    pub len: Vec<f64>,
    /// Fit likelihood.
    pub lik: Vec<f64>,
    /// Fitting-chain identifier.
    pub rec_type: Vec<i64>,
    /// Completed processing stages, in completion order as stored.
    pub rec_stages: Jagged<i64>,
    /// Auxiliary fit values; slot meanings per the fitparameters table.
    pub fitinf: Jagged<f64>,
    /// Hit identifiers used by this fit, resolving into the event's hits.
    pub hit_ids: Jagged<i64>,
}

/// One track candidate, used to build fixture tables row-wise.
#[derive(Debug, Clone, Default)]
pub struct TrackRow {
    pub id: i64,
    pub pos_x: f64,
    pub pos_y: f64,
    pub pos_z: f64,
    pub dir_x: f64,
    pub dir_y: f64,
    pub dir_z: f64,
    pub t: f64,
    pub e: f64,
    pub len: f64,
    pub lik: f64,
    pub rec_type: i64,
    pub rec_stages: Vec<i64>,
    pub fitinf: Vec<f64>,
    pub hit_ids: Vec<i64>,
}

impl TrackTable {
    /// Build from per-event candidate lists.
    pub fn from_rows(events: Vec<Vec<TrackRow>>) -> Self {
        let mut table = TrackTable { offsets: vec![0], ..Default::default() };
        let mut stages = Vec::new();
        let mut fitinf = Vec::new();
        let mut hit_ids = Vec::new();
        for event in events {
            for row in event {
                table.id.push(row.id);
                table.pos_x.push(row.pos_x);
                table.pos_y.push(row.pos_y);
                table.pos_z.push(row.pos_z);
                table.dir_x.push(row.dir_x);
                table.dir_y.push(row.dir_y);
                table.dir_z.push(row.dir_z);
                table.t.push(row.t);
                table.e.push(row.e);
                table.len.push(row.len);
                table.lik.push(row.lik);
                table.rec_type.push(row.rec_type);
                stages.push(row.rec_stages);
                fitinf.push(row.fitinf);
                hit_ids.push(row.hit_ids);
            }
            table.offsets.push(table.id.len());
        }
        table.rec_stages = Jagged::from_rows(stages);
        table.fitinf = Jagged::from_rows(fitinf);
        table.hit_ids = Jagged::from_rows(hit_ids);
        table
    }

    /// Number of events.
    pub fn n_events(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Number of candidates across all events.
    pub fn n_tracks(&self) -> usize {
        self.offsets.last().copied().unwrap_or(0)
    }

    /// Flat candidate range of one event.
    pub fn candidates(&self, event: usize) -> Range<usize> {
        self.offsets[event]..self.offsets[event + 1]
    }

    /// Check the cross-column shape invariants.
    pub fn validate(&self) -> Result<()> {
        let n = self.n_tracks();
        check_offsets(&self.offsets, n, "track table")?;
        for (name, len) in [
            ("id", self.id.len()),
            ("pos_x", self.pos_x.len()),
            ("pos_y", self.pos_y.len()),
            ("pos_z", self.pos_z.len()),
            ("dir_x", self.dir_x.len()),
            ("dir_y", self.dir_y.len()),
            ("dir_z", self.dir_z.len()),
            ("t", self.t.len()),
            ("E", self.e.len()),
            ("len", self.len.len()),
            ("lik", self.lik.len()),
            ("rec_type", self.rec_type.len()),
            ("rec_stages", self.rec_stages.n_rows()),
            ("fitinf", self.fitinf.n_rows()),
            ("hit_ids", self.hit_ids.n_rows()),
        ] {
            check_len(len, n, name, "track table")?;
        }
        Ok(())
    }

    /// Flat column for an f64-kind field.
    pub fn f64_column(&self, field: TrackField) -> Result<&[f64]> {
        match field {
            TrackField::PosX => Ok(&self.pos_x),
            TrackField::PosY => Ok(&self.pos_y),
            TrackField::PosZ => Ok(&self.pos_z),
            TrackField::DirX => Ok(&self.dir_x),
            TrackField::DirY => Ok(&self.dir_y),
            TrackField::DirZ => Ok(&self.dir_z),
            TrackField::T => Ok(&self.t),
            TrackField::E => Ok(&self.e),
            TrackField::Len => Ok(&self.len),
            TrackField::Lik => Ok(&self.lik),
            TrackField::Id | TrackField::RecType => Err(Error::TypeMismatch(format!(
                "track field '{}' is not an f64 column",
                field.name()
            ))),
        }
    }

    /// Flat column for an i64-kind field.
    pub fn i64_column(&self, field: TrackField) -> Result<&[i64]> {
        match field {
            TrackField::Id => Ok(&self.id),
            TrackField::RecType => Ok(&self.rec_type),
            other => Err(Error::TypeMismatch(format!(
                "track field '{}' is not an i64 column",
                other.name()
            ))),
        }
    }
}

/// Scalar track fields addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackField {
    Id,
    PosX,
    PosY,
    PosZ,
    DirX,
    DirY,
    DirZ,
    T,
    E,
    Len,
    Lik,
    RecType,
}

impl TrackField {
    /// Registry of `(name, field)` pairs. Names follow the data-format
    /// branch vocabulary (`E` is capitalized on disk).
    pub const ALL: &'static [(&'static str, TrackField)] = &[
        ("id", TrackField::Id),
        ("pos_x", TrackField::PosX),
        ("pos_y", TrackField::PosY),
        ("pos_z", TrackField::PosZ),
        ("dir_x", TrackField::DirX),
        ("dir_y", TrackField::DirY),
        ("dir_z", TrackField::DirZ),
        ("t", TrackField::T),
        ("E", TrackField::E),
        ("len", TrackField::Len),
        ("lik", TrackField::Lik),
        ("rec_type", TrackField::RecType),
    ];

    /// Resolve a field name, failing fast on unknown names.
    pub fn from_name(name: &str) -> Result<TrackField> {
        Self::ALL
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, f)| *f)
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    /// The registry name of this field.
    pub fn name(self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(_, f)| *f == self)
            .map(|(n, _)| *n)
            .unwrap_or("?")
    }

    /// Column kind of this field.
    pub fn kind(self) -> FieldKind {
        match self {
            TrackField::Id | TrackField::RecType => FieldKind::I64,
            _ => FieldKind::F64,
        }
    }
}

// ── Hits ───────────────────────────────────────────────────────

/// Photon-sensor detections, one flat row per hit.
#[derive(Debug, Clone, Default)]
pub struct HitTable {
    /// Event boundaries over the flat hit axis (`n_events + 1`).
    pub offsets: Vec<usize>,
    /// Hit identifier, referenced by `TrackTable::hit_ids`.
    pub id: Vec<i64>,
    /// Optical-module identifier.
    pub dom_id: Vec<i64>,
    /// PMT channel (0–31).
    pub channel_id: Vec<i64>,
    /// TDC time.
    pub t: Vec<f64>,
    /// Time over threshold.
    pub tot: Vec<f64>,
    /// Non-zero when the hit participated in the trigger.
    pub trig: Vec<i64>,
    /// Amplitude in photo-electrons; absent on plain reconstructed hits.
    pub a: Option<Vec<f64>>,
}

/// One hit, used to build fixture tables row-wise.
#[derive(Debug, Clone, Default)]
pub struct HitRow {
    pub id: i64,
    pub dom_id: i64,
    pub channel_id: i64,
    pub t: f64,
    pub tot: f64,
    pub trig: i64,
    pub a: f64,
}

impl HitTable {
    /// Build from per-event hit lists; the amplitude column is kept.
    pub fn from_rows(events: Vec<Vec<HitRow>>) -> Self {
        let mut table = HitTable { offsets: vec![0], a: Some(Vec::new()), ..Default::default() };
        for event in events {
            for row in event {
                table.id.push(row.id);
                table.dom_id.push(row.dom_id);
                table.channel_id.push(row.channel_id);
                table.t.push(row.t);
                table.tot.push(row.tot);
                table.trig.push(row.trig);
                if let Some(a) = table.a.as_mut() {
                    a.push(row.a);
                }
            }
            table.offsets.push(table.id.len());
        }
        table
    }

    /// Number of events.
    pub fn n_events(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Number of hits across all events.
    pub fn n_hits(&self) -> usize {
        self.offsets.last().copied().unwrap_or(0)
    }

    /// Flat hit range of one event.
    pub fn hits_in(&self, event: usize) -> Range<usize> {
        self.offsets[event]..self.offsets[event + 1]
    }

    /// Check the cross-column shape invariants.
    pub fn validate(&self) -> Result<()> {
        let n = self.n_hits();
        check_offsets(&self.offsets, n, "hit table")?;
        for (name, len) in [
            ("id", self.id.len()),
            ("dom_id", self.dom_id.len()),
            ("channel_id", self.channel_id.len()),
            ("t", self.t.len()),
            ("tot", self.tot.len()),
            ("trig", self.trig.len()),
        ] {
            check_len(len, n, name, "hit table")?;
        }
        if let Some(a) = &self.a {
            check_len(a.len(), n, "a", "hit table")?;
        }
        Ok(())
    }

    /// Flat column for an f64-kind field.
    pub fn f64_column(&self, field: HitField) -> Result<&[f64]> {
        match field {
            HitField::T => Ok(&self.t),
            HitField::Tot => Ok(&self.tot),
            HitField::A => self
                .a
                .as_deref()
                .ok_or_else(|| Error::BranchNotFound("hits.a".to_string())),
            _ => Err(Error::TypeMismatch(format!(
                "hit field '{}' is not an f64 column",
                field.name()
            ))),
        }
    }

    /// Flat column for an i64-kind field.
    pub fn i64_column(&self, field: HitField) -> Result<&[i64]> {
        match field {
            HitField::Id => Ok(&self.id),
            HitField::DomId => Ok(&self.dom_id),
            HitField::ChannelId => Ok(&self.channel_id),
            HitField::Trig => Ok(&self.trig),
            _ => Err(Error::TypeMismatch(format!(
                "hit field '{}' is not an i64 column",
                field.name()
            ))),
        }
    }
}

/// Scalar hit fields addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitField {
    Id,
    DomId,
    ChannelId,
    T,
    Tot,
    Trig,
    A,
}

impl HitField {
    /// Registry of `(name, field)` pairs.
    pub const ALL: &'static [(&'static str, HitField)] = &[
        ("id", HitField::Id),
        ("dom_id", HitField::DomId),
        ("channel_id", HitField::ChannelId),
        ("t", HitField::T),
        ("tot", HitField::Tot),
        ("trig", HitField::Trig),
        ("a", HitField::A),
    ];

    /// Resolve a field name, failing fast on unknown names.
    pub fn from_name(name: &str) -> Result<HitField> {
        Self::ALL
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, f)| *f)
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    /// The registry name of this field.
    pub fn name(self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(_, f)| *f == self)
            .map(|(n, _)| *n)
            .unwrap_or("?")
    }

    /// Column kind of this field.
    pub fn kind(self) -> FieldKind {
        match self {
            HitField::T | HitField::Tot | HitField::A => FieldKind::F64,
            _ => FieldKind::I64,
        }
    }
}

// ── MC-truth variants ──────────────────────────────────────────

/// Monte-Carlo truth tracks. No fit metadata — these are generator records.
#[derive(Debug, Clone, Default)]
pub struct McTrackTable {
    /// Event boundaries over the flat track axis (`n_events + 1`).
    pub offsets: Vec<usize>,
    pub id: Vec<i64>,
    pub pos_x: Vec<f64>,
    pub pos_y: Vec<f64>,
    pub pos_z: Vec<f64>,
    pub dir_x: Vec<f64>,
    pub dir_y: Vec<f64>,
    pub dir_z: Vec<f64>,
    pub t: Vec<f64>,
    /// True energy.
    pub e: Vec<f64>,
    pub len: Vec<f64>,
    /// PDG particle code.
    pub pdgid: Vec<i64>,
    /// Hit identifiers produced by this track.
    pub hit_ids: Jagged<i64>,
}

impl McTrackTable {
    /// Number of events.
    pub fn n_events(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Check the cross-column shape invariants.
    pub fn validate(&self) -> Result<()> {
        let n = self.offsets.last().copied().unwrap_or(0);
        check_offsets(&self.offsets, n, "mc track table")?;
        for (name, len) in [
            ("id", self.id.len()),
            ("pos_x", self.pos_x.len()),
            ("pos_y", self.pos_y.len()),
            ("pos_z", self.pos_z.len()),
            ("dir_x", self.dir_x.len()),
            ("dir_y", self.dir_y.len()),
            ("dir_z", self.dir_z.len()),
            ("t", self.t.len()),
            ("E", self.e.len()),
            ("len", self.len.len()),
            ("pdgid", self.pdgid.len()),
            ("hit_ids", self.hit_ids.n_rows()),
        ] {
            check_len(len, n, name, "mc track table")?;
        }
        Ok(())
    }
}

/// Monte-Carlo truth hits (pre- and post-PMT-simulation values).
#[derive(Debug, Clone, Default)]
pub struct McHitTable {
    /// Event boundaries over the flat hit axis (`n_events + 1`).
    pub offsets: Vec<usize>,
    pub id: Vec<i64>,
    /// PMT identifier (MC files address PMTs directly).
    pub pmt_id: Vec<i64>,
    pub t: Vec<f64>,
    /// Amplitude in photo-electrons.
    pub a: Vec<f64>,
    /// Id of the track that created this hit.
    pub origin: Vec<i64>,
    /// Photon time before PMT simulation.
    pub pure_t: Vec<f64>,
    /// Amplitude before PMT simulation.
    pub pure_a: Vec<f64>,
}

impl McHitTable {
    /// Number of events.
    pub fn n_events(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Check the cross-column shape invariants.
    pub fn validate(&self) -> Result<()> {
        let n = self.offsets.last().copied().unwrap_or(0);
        check_offsets(&self.offsets, n, "mc hit table")?;
        for (name, len) in [
            ("id", self.id.len()),
            ("pmt_id", self.pmt_id.len()),
            ("t", self.t.len()),
            ("a", self.a.len()),
            ("origin", self.origin.len()),
            ("pure_t", self.pure_t.len()),
            ("pure_a", self.pure_a.len()),
        ] {
            check_len(len, n, name, "mc hit table")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_builds_aligned_columns() {
        let table = TrackTable::from_rows(vec![
            vec![
                TrackRow { id: 1, rec_stages: vec![1, 2], lik: 40.0, ..Default::default() },
                TrackRow { id: 2, rec_stages: vec![1, 2, 3], lik: 55.0, ..Default::default() },
            ],
            vec![],
            vec![TrackRow { id: 3, rec_stages: vec![1], ..Default::default() }],
        ]);
        table.validate().unwrap();
        assert_eq!(table.n_events(), 3);
        assert_eq!(table.n_tracks(), 3);
        assert_eq!(table.candidates(0), 0..2);
        assert_eq!(table.candidates(1), 2..2);
        assert_eq!(table.rec_stages.row(1), &[1, 2, 3]);
    }

    #[test]
    fn field_registry_resolves_and_rejects() {
        assert_eq!(TrackField::from_name("E").unwrap(), TrackField::E);
        assert_eq!(TrackField::E.kind(), FieldKind::F64);
        assert_eq!(TrackField::from_name("rec_type").unwrap().kind(), FieldKind::I64);
        assert!(matches!(
            TrackField::from_name("energy"),
            Err(Error::UnknownField(_))
        ));
        assert_eq!(HitField::from_name("dom_id").unwrap(), HitField::DomId);
        assert!(HitField::from_name("pattern").is_err());
    }

    #[test]
    fn validate_catches_ragged_misalignment() {
        let mut table = TrackTable::from_rows(vec![vec![TrackRow::default()]]);
        table.lik.push(1.0);
        assert!(table.validate().is_err());
    }

    #[test]
    fn missing_amplitude_column_fails_on_access() {
        let mut table = HitTable::from_rows(vec![vec![HitRow::default()]]);
        table.a = None;
        table.validate().unwrap();
        assert!(matches!(
            table.f64_column(HitField::A),
            Err(Error::BranchNotFound(_))
        ));
    }
}
