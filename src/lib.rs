//! bigip-explode - BIG-IP configuration explosion
//!
//! Reads a BIG-IP configuration bundle, parses every configuration object,
//! resolves the references between objects and groups them into applications
//! rooted at virtual servers and wide IPs.
//!
//! ```no_run
//! use std::path::Path;
//! use bigip_explode::pipeline::Exploder;
//!
//! let explosion = Exploder::default().explode(Path::new("backup.ucs"))?;
//! for app in &explosion.result.applications {
//!     println!("{}: {} objects", app.entry_point, app.members.len());
//! }
//! # Ok::<(), bigip_explode::error::ExplodeError>(())
//! ```

pub mod archive;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod hash;
pub mod parser;
pub mod pipeline;
pub mod progress;
pub mod resolver;
pub mod stats;
pub mod store;
pub mod ui;

pub use error::{ExplodeError, Result};
pub use pipeline::{Exploder, Explosion, ExplosionResult};
