//! Fit-parameter slot indices into a track's `fitinf` vector.
//!
//! KM3NeT Data Definitions v1.3.1 (km3net-dataformat).

pub const JGANDALF_BETA0_RAD: usize = 0;
pub const JGANDALF_BETA1_RAD: usize = 1;
pub const JGANDALF_CHI2: usize = 2;
pub const JGANDALF_NUMBER_OF_HITS: usize = 3;
pub const JENERGY_ENERGY: usize = 4;
pub const JENERGY_CHI2: usize = 5;
pub const JGANDALF_LAMBDA: usize = 6;
pub const JGANDALF_NUMBER_OF_ITERATIONS: usize = 7;
pub const JSTART_NPE_MIP: usize = 8;
pub const JSTART_NPE_MIP_TOTAL: usize = 9;
pub const JSTART_LENGTH_METRES: usize = 10;
pub const JVETO_NPE: usize = 11;
pub const JVETO_NUMBER_OF_HITS: usize = 12;
pub const JENERGY_MUON_RANGE_METRES: usize = 13;
pub const JENERGY_NOISE_LIKELIHOOD: usize = 14;
pub const JENERGY_NDF: usize = 15;
pub const JENERGY_NUMBER_OF_HITS: usize = 16;
pub const JCOPY_Z_M: usize = 17;
/// Shower energy shares the JENERGY_ENERGY slot.
pub const JSHOWERFIT_ENERGY: usize = 4;

/// All named slots.
pub const ALL: &[(&str, i64)] = &[
    ("JGANDALF_BETA0_RAD", 0),
    ("JGANDALF_BETA1_RAD", 1),
    ("JGANDALF_CHI2", 2),
    ("JGANDALF_NUMBER_OF_HITS", 3),
    ("JENERGY_ENERGY", 4),
    ("JENERGY_CHI2", 5),
    ("JGANDALF_LAMBDA", 6),
    ("JGANDALF_NUMBER_OF_ITERATIONS", 7),
    ("JSTART_NPE_MIP", 8),
    ("JSTART_NPE_MIP_TOTAL", 9),
    ("JSTART_LENGTH_METRES", 10),
    ("JVETO_NPE", 11),
    ("JVETO_NUMBER_OF_HITS", 12),
    ("JENERGY_MUON_RANGE_METRES", 13),
    ("JENERGY_NOISE_LIKELIHOOD", 14),
    ("JENERGY_NDF", 15),
    ("JENERGY_NUMBER_OF_HITS", 16),
    ("JCOPY_Z_M", 17),
    ("JSHOWERFIT_ENERGY", 4),
];

/// Slot index for a named fit parameter.
pub fn code(name: &str) -> Option<i64> {
    super::code_of(ALL, name)
}

/// First name mapped to a slot index.
pub fn name(code: i64) -> Option<&'static str> {
    super::name_of(ALL, code)
}
