//! Path Engine
//!
//! Routes a payment from a source to a destination across trust lines and
//! order books, delivering value in increments along the cheapest path
//! available at each step.
//!
//! # Architecture
//!
//! - **Building**: each candidate path is expanded into account and book
//!   nodes and checked against the ledger
//! - **Searching**: every live path computes its next increment in a private
//!   view; the best quality wins and its view becomes the shared one
//! - **Done**: a [`Ter`] result code, with the ledger view either holding the
//!   whole payment or left untouched
//!
//! # Invariants
//!
//! - Never delivers more than requested, never sends more than allowed
//! - A failed calculation leaves no trace in the caller's view
//! - Identical inputs give identical outputs and ledger changes

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod calc;
pub mod config;
pub mod credit;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod path;
pub mod request;
pub mod ter;
pub mod transfer;

// Re-exports
pub use calc::{calculate, CalcOutput, CalcSummary, PathSummary, PaymentCalc};
pub use config::{CalcConfig, Config, MetricsConfig};
pub use cursor::PathCursor;
pub use engine::PaymentEngine;
pub use error::{Error, Result};
pub use metrics::Metrics;
pub use path::{Node, Path, PathSet, PathState, PathStep};
pub use request::{CalcFlags, PaymentRequest, SendMax};
pub use ter::{ResultClass, Ter};
