//! Payment paths
//!
//! A caller supplies each candidate path as a list of [`PathStep`]s between
//! the source and the destination. Expansion turns the steps into [`Node`]s,
//! adding the implied issuer hops and books, and the resulting
//! [`PathState`] carries the working amounts of one path through the passes.

mod expand;
pub mod node;
pub mod state;

pub use node::{AccountNode, Node, OfferNode};
pub use state::PathState;

use ledger_core::{AccountId, Currency};
use serde::{Deserialize, Serialize};

/// One explicit step of a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathStep {
    /// Ripple through this account
    Account(AccountId),
    /// Cross the book that outputs this currency (issuer absent for native)
    Book {
        /// Output currency
        currency: Currency,
        /// Output issuer
        issuer: Option<AccountId>,
    },
}

impl PathStep {
    /// Book step into the native asset
    pub fn native_book() -> Self {
        PathStep::Book {
            currency: Currency::NATIVE,
            issuer: None,
        }
    }

    /// Book step into an issued asset
    pub fn book(currency: Currency, issuer: AccountId) -> Self {
        PathStep::Book {
            currency,
            issuer: Some(issuer),
        }
    }
}

/// Explicit steps of one path; empty is the default path
pub type Path = Vec<PathStep>;

/// Candidate paths of a request
pub type PathSet = Vec<Path>;
