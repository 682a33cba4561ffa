//! phimask-cli
//!
//! Argument parsing and the command implementations behind the `phimask`
//! binary. Commands take their detector and cipher as arguments so they can
//! run against fakes.

pub mod cli;
pub mod commands;
