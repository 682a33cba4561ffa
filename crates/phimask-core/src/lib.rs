//! phimask-core
//!
//! Pure domain types for PHI de-identification: entities, chunks, tokens,
//! masking results, and the detector seam. No AWS SDK dependency; this is the
//! shared vocabulary of the phimask crates.

pub mod detector;
pub mod error;
pub mod models;
pub mod offsets;
