//! Immutable regulatory reference data.
//!
//! A [`ReferenceTables`] value is one edition of the regulation: benchmark intensities, the
//! phase-out schedule, country sets and the classification prefix map. Editions are swapped by
//! building a new value, never by mutating a shared one.

mod builtin;
mod category;
mod tables;

pub use category::GoodsCategory;
pub use tables::{
    BenchmarkRecord, CnPrefixRule, MarkupTier, MarkupTierRule, PhaseOutSchedule,
    ReferenceDataError, ReferenceTables, DEFAULT_CBAM_FACTOR, REGIME_START_YEAR,
};
