//! DAQ datatype identifiers.
//!
//! KM3NeT Data Definitions v2.1.0 (km3net-dataformat).

pub const DAQSUPERFRAME: i64 = 101;
pub const DAQSUMMARYFRAME: i64 = 201;
pub const DAQTIMESLICE: i64 = 1001;
pub const DAQTIMESLICEL0: i64 = 1002;
pub const DAQTIMESLICEL1: i64 = 1003;
pub const DAQTIMESLICEL2: i64 = 1004;
pub const DAQTIMESLICESN: i64 = 1005;
pub const DAQSUMMARYSLICE: i64 = 2001;
pub const DAQEVENT: i64 = 10001;

/// All named identifiers.
pub const ALL: &[(&str, i64)] = &[
    ("DAQSUPERFRAME", DAQSUPERFRAME),
    ("DAQSUMMARYFRAME", DAQSUMMARYFRAME),
    ("DAQTIMESLICE", DAQTIMESLICE),
    ("DAQTIMESLICEL0", DAQTIMESLICEL0),
    ("DAQTIMESLICEL1", DAQTIMESLICEL1),
    ("DAQTIMESLICEL2", DAQTIMESLICEL2),
    ("DAQTIMESLICESN", DAQTIMESLICESN),
    ("DAQSUMMARYSLICE", DAQSUMMARYSLICE),
    ("DAQEVENT", DAQEVENT),
];

/// Code for a named datatype.
pub fn code(name: &str) -> Option<i64> {
    super::code_of(ALL, name)
}

/// Name for a datatype code.
pub fn name(code: i64) -> Option<&'static str> {
    super::name_of(ALL, code)
}
