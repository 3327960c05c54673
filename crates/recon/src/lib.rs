//! `spotcheck-recon`: airing report reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded grids (report, ledger, alias
//! directory), returns per-airing verdicts plus a per-row diagnostic log.
//! No CLI or IO dependencies.

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod parser;
pub mod resolver;
pub mod schema;
pub mod similarity;
pub mod temporal;

pub use config::ReconConfig;
pub use engine::run;
pub use error::ReconError;
pub use model::{Cell, RawRow, ReconInput, ReconOutput, ReconStatus};
pub use normalize::NameNormalizer;
pub use resolver::OutletResolver;
