//! KM3NeT data-format definition tables.
//!
//! Named constants mapping human-readable identifiers to the numeric codes
//! used on disk. Kept as plain tables: updating the data-format version is a
//! table edit.

#[allow(missing_docs)]
pub mod daqdatatypes;
#[allow(missing_docs)]
pub mod fitparameters;
#[allow(missing_docs)]
pub mod pmt_status;
#[allow(missing_docs)]
pub mod reconstruction;
#[allow(missing_docs)]
pub mod trigger;

/// Look up a code in a `(name, code)` table.
pub(crate) fn code_of(table: &[(&'static str, i64)], name: &str) -> Option<i64> {
    table.iter().find(|(n, _)| *n == name).map(|(_, c)| *c)
}

/// Reverse lookup: first name carrying `code` in a `(name, code)` table.
pub(crate) fn name_of(table: &[(&'static str, i64)], code: i64) -> Option<&'static str> {
    table.iter().find(|(_, c)| *c == code).map(|(n, _)| *n)
}
