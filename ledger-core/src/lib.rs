//! Ledger Core
//!
//! Ledger state consumed by the payment path engine: accounts, trust lines,
//! order book offers and the fixed-point amounts they hold.
//!
//! # Architecture
//!
//! - **Copy-on-write views**: a [`LedgerView`] shares its base and owns its
//!   changes, so trial application is a clone and commit is a swap
//! - **Deterministic indexes**: every entry lives at a SHA-256 index of its key
//! - **Typed amounts**: values are tagged with their asset and never mix
//!
//! # Invariants
//!
//! - Amounts of different assets never add or compare
//! - A trust line balance is stored once, from the low account's side
//! - Iteration over a view is in index order on every node

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod amount;
pub mod entry;
pub mod error;
pub mod index;
pub mod types;
pub mod view;

// Re-exports
pub use amount::{get_rate, Amount, Quality};
pub use entry::{AccountRoot, Book, LedgerEntry, Offer, Side, TrustLine};
pub use error::{Error, Result};
pub use index::{account_index, offer_index, trust_line_index, EntryIndex};
pub use types::{AccountId, Asset, Currency, Issue};
pub use view::{EntryChange, LedgerView};
