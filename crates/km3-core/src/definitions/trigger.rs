//! Trigger bit identifiers.
//!
//! KM3NeT Data Definitions v1.3.1 (km3net-dataformat). Values are bit
//! positions within the 64-bit event trigger mask.

pub const JTRIGGER3DSHOWER: i64 = 1;
pub const JTRIGGERMXSHOWER: i64 = 2;
pub const JTRIGGER3DMUON: i64 = 4;
pub const JTRIGGERNB: i64 = 5;
pub const FACTORY_LIMIT: i64 = 31;

/// All named identifiers.
pub const ALL: &[(&str, i64)] = &[
    ("JTRIGGER3DSHOWER", JTRIGGER3DSHOWER),
    ("JTRIGGERMXSHOWER", JTRIGGERMXSHOWER),
    ("JTRIGGER3DMUON", JTRIGGER3DMUON),
    ("JTRIGGERNB", JTRIGGERNB),
    ("FACTORY_LIMIT", FACTORY_LIMIT),
];

/// Bit position for a named trigger.
pub fn code(name: &str) -> Option<i64> {
    super::code_of(ALL, name)
}

/// Name for a trigger bit position.
pub fn name(code: i64) -> Option<&'static str> {
    super::name_of(ALL, code)
}
