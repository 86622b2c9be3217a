//! # km3-core
//!
//! Shared foundation for the km3rs workspace: CSR ragged columns, packed
//! bit-field decoding, KM3NeT data-format definition tables, the columnar
//! source boundary and the per-session column cache.
//!
//! ## Example
//!
//! ```
//! use km3_core::bitfield::BitLayout;
//!
//! let dq = BitLayout::new(&[("udp_packets", 0, 15), ("udp_max_seq", 16, 16)]).unwrap();
//! let word: i32 = (3 << 16) | 42;
//! assert_eq!(dq.decode("udp_packets", word).unwrap(), 42);
//! assert_eq!(dq.decode("udp_max_seq", word).unwrap(), 3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bitfield;
pub mod cache;
pub mod definitions;
pub mod error;
pub mod jagged;
pub mod source;

pub use bitfield::{BitField, BitLayout, BitWord, extract, extract_all, extract_jagged};
pub use cache::{CacheConfig, CacheStats, CachedColumn, ColumnCache};
pub use error::{Error, Result};
pub use jagged::Jagged;
pub use source::{BranchData, BranchSource, MemorySource};
