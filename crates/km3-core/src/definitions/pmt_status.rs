//! PMT status bit positions.
//!
//! KM3NeT Data Definitions v2.0.0 (km3net-dataformat). Values are bit
//! positions within a PMT status word.

pub const PMT_DISABLE: u32 = 0;
pub const HIGH_RATE_VETO_DISABLE: u32 = 1;
pub const FIFO_FULL_DISABLE: u32 = 2;
pub const UDP_COUNTER_DISABLE: u32 = 3;
pub const UDP_TRAILER_DISABLE: u32 = 4;
pub const OUT_OF_SYNC: u32 = 5;

/// All named bits.
pub const ALL: &[(&str, i64)] = &[
    ("PMT_DISABLE", 0),
    ("HIGH_RATE_VETO_DISABLE", 1),
    ("FIFO_FULL_DISABLE", 2),
    ("UDP_COUNTER_DISABLE", 3),
    ("UDP_TRAILER_DISABLE", 4),
    ("OUT_OF_SYNC", 5),
];

/// Bit position for a named status bit.
pub fn code(name: &str) -> Option<i64> {
    super::code_of(ALL, name)
}

/// Name for a status bit position.
pub fn name(code: i64) -> Option<&'static str> {
    super::name_of(ALL, code)
}
