//! Sex-and-age disaggregated population percentages with canonical country
//! identities.
//!
//! The crate takes the UN population-by-age-and-sex export plus the per-sex
//! broad-age ratio exports, resolves every requested age label through a
//! fixed strategy chain (direct bucket, ratio-derived, aggregation of
//! contiguous buckets), converts counts into percentages of each location's
//! total population, and reconciles location names against the IDMC
//! geographic reference table so output rows join on iso3.

pub mod app;
pub mod config;
pub mod error;
pub mod geo;
pub mod interval;
pub mod loader;
pub mod normalize;
pub mod output;
pub mod resolve;
pub mod table;
