//! phimask-pipeline
//!
//! PHI masking and unmasking: chunking, per-chunk detection, offset
//! re-basing, threshold filtering, token substitution and its reverse.

pub mod audit;
pub mod chunk;
pub mod config;
pub mod error;
pub mod mask;
pub mod merge;
pub mod pipeline;
pub mod threshold;
pub mod unmask;
