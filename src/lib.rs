//! Reconciles NFL player prop lines against the box-score stats recorded
//! for the same week.
//!
//! The engine (`vocabulary`, `normalize`, `matcher`, `classify`,
//! `aggregate`, `reconcile`) is synchronous and does no I/O. Fetching,
//! storage and workbook export live in the remaining modules.

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod export;
pub mod http_cache;
pub mod http_client;
pub mod logging;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod odds_fetch;
pub mod reconcile;
pub mod stats_fetch;
pub mod store;
pub mod task;
pub mod vocabulary;

pub use model::{
    ClassifiedOutcome, Diagnostic, OutcomeResult, PlayerPropRecord, PlayerStatRecord,
    ReconciliationReport, StatValue,
};
pub use reconcile::{Reconciliation, reconcile};
