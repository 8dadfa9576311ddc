//! Command implementations for the bigip-explode CLI

pub mod completions;
pub mod explode;
