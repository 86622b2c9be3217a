//! Reconstruction stage and type identifiers.
//!
//! KM3NeT Data Definitions v2.0.0 (km3net-dataformat).

/// JGandalf muon chain reconstruction type.
pub const JPP_RECONSTRUCTION_TYPE: i64 = 4000;

pub const JMUONBEGIN: i64 = 0;
pub const JMUONPREFIT: i64 = 1;
pub const JMUONSIMPLEX: i64 = 2;
pub const JMUONGANDALF: i64 = 3;
pub const JMUONENERGY: i64 = 4;
pub const JMUONSTART: i64 = 5;
pub const JLINEFIT: i64 = 6;
pub const JMUONEND: i64 = 99;

pub const JSHOWERBEGIN: i64 = 100;
pub const JSHOWERPREFIT: i64 = 101;
pub const JSHOWERPOSITIONFIT: i64 = 102;
pub const JSHOWERCOMPLETEFIT: i64 = 103;
pub const JSHOWER_BJORKEN_Y: i64 = 104;
pub const JSHOWERENERGYPREFIT: i64 = 105;
pub const JSHOWERPOINTSIMPLEX: i64 = 106;
pub const JSHOWERDIRECTIONPREFIT: i64 = 107;
pub const JSHOWEREND: i64 = 199;

pub const DUSJ_RECONSTRUCTION_TYPE: i64 = 200;
pub const DUSJSHOWERBEGIN: i64 = 200;
pub const DUSJSHOWERPREFIT: i64 = 201;
pub const DUSJSHOWERPOSITIONFIT: i64 = 202;
pub const DUSJSHOWERCOMPLETEFIT: i64 = 203;
pub const DUSJSHOWEREND: i64 = 299;

pub const AANET_RECONSTRUCTION_TYPE: i64 = 101;
pub const AASHOWERBEGIN: i64 = 300;
pub const AASHOWERFITPREFIT: i64 = 302;
pub const AASHOWERFITPOSITIONFIT: i64 = 303;
pub const AASHOWERFITDIRECTIONENERGYFIT: i64 = 304;
pub const AASHOWEREND: i64 = 399;

pub const JUSERBEGIN: i64 = 1000;
pub const JMUONVETO: i64 = 1001;
pub const JMUONPATH: i64 = 1003;
pub const JMCEVT: i64 = 1004;
pub const JUSEREND: i64 = 1099;

/// Fill value for an unknown reconstruction type.
pub const RECTYPE_UNKNOWN: i64 = -1;
/// Fill value for an unknown reconstruction stage.
pub const RECSTAGE_UNKNOWN: i64 = -1;

/// All named identifiers.
pub const ALL: &[(&str, i64)] = &[
    ("JPP_RECONSTRUCTION_TYPE", JPP_RECONSTRUCTION_TYPE),
    ("JMUONBEGIN", JMUONBEGIN),
    ("JMUONPREFIT", JMUONPREFIT),
    ("JMUONSIMPLEX", JMUONSIMPLEX),
    ("JMUONGANDALF", JMUONGANDALF),
    ("JMUONENERGY", JMUONENERGY),
    ("JMUONSTART", JMUONSTART),
    ("JLINEFIT", JLINEFIT),
    ("JMUONEND", JMUONEND),
    ("JSHOWERBEGIN", JSHOWERBEGIN),
    ("JSHOWERPREFIT", JSHOWERPREFIT),
    ("JSHOWERPOSITIONFIT", JSHOWERPOSITIONFIT),
    ("JSHOWERCOMPLETEFIT", JSHOWERCOMPLETEFIT),
    ("JSHOWER_BJORKEN_Y", JSHOWER_BJORKEN_Y),
    ("JSHOWERENERGYPREFIT", JSHOWERENERGYPREFIT),
    ("JSHOWERPOINTSIMPLEX", JSHOWERPOINTSIMPLEX),
    ("JSHOWERDIRECTIONPREFIT", JSHOWERDIRECTIONPREFIT),
    ("JSHOWEREND", JSHOWEREND),
    ("DUSJ_RECONSTRUCTION_TYPE", DUSJ_RECONSTRUCTION_TYPE),
    ("DUSJSHOWERBEGIN", DUSJSHOWERBEGIN),
    ("DUSJSHOWERPREFIT", DUSJSHOWERPREFIT),
    ("DUSJSHOWERPOSITIONFIT", DUSJSHOWERPOSITIONFIT),
    ("DUSJSHOWERCOMPLETEFIT", DUSJSHOWERCOMPLETEFIT),
    ("DUSJSHOWEREND", DUSJSHOWEREND),
    ("AANET_RECONSTRUCTION_TYPE", AANET_RECONSTRUCTION_TYPE),
    ("AASHOWERBEGIN", AASHOWERBEGIN),
    ("AASHOWERFITPREFIT", AASHOWERFITPREFIT),
    ("AASHOWERFITPOSITIONFIT", AASHOWERFITPOSITIONFIT),
    ("AASHOWERFITDIRECTIONENERGYFIT", AASHOWERFITDIRECTIONENERGYFIT),
    ("AASHOWEREND", AASHOWEREND),
    ("JUSERBEGIN", JUSERBEGIN),
    ("JMUONVETO", JMUONVETO),
    ("JMUONPATH", JMUONPATH),
    ("JMCEVT", JMCEVT),
    ("JUSEREND", JUSEREND),
    ("RECTYPE_UNKNOWN", RECTYPE_UNKNOWN),
    ("RECSTAGE_UNKNOWN", RECSTAGE_UNKNOWN),
];

/// Code for a named stage/type identifier.
pub fn code(name: &str) -> Option<i64> {
    super::code_of(ALL, name)
}

/// Name for a stage/type code.
pub fn name(code: i64) -> Option<&'static str> {
    super::name_of(ALL, code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_round_trip() {
        assert_eq!(code("JMUONGANDALF"), Some(3));
        assert_eq!(name(3), Some("JMUONGANDALF"));
        assert_eq!(code("NOT_A_STAGE"), None);
    }
}
