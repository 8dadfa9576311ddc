//! Domain models for bigip-explode
//!
//! This module contains the plain data types every pipeline stage exchanges:
//! bundles and the configuration files read out of them, and the structured
//! configuration objects parsed from those files.

pub mod bundle;
pub mod object;

pub use bundle::{Bundle, BundleKind, ConfigFile, FileFormat};
pub use object::{ConfigObject, LineRange, Properties, Value};
