//! Payment request handed to the engine

use crate::path::{Path, PathSet};
use ledger_core::{AccountId, Amount, Asset};
use serde::{Deserialize, Serialize};

/// Maximum the source is willing to send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SendMax {
    /// At most this amount
    Limited(Amount),
    /// Any amount of this asset
    Unlimited(Asset),
}

impl SendMax {
    /// Asset the source sends
    pub fn asset(&self) -> Asset {
        match self {
            SendMax::Limited(amount) => *amount.asset(),
            SendMax::Unlimited(asset) => *asset,
        }
    }

    /// Limit, if any
    pub fn limit(&self) -> Option<&Amount> {
        match self {
            SendMax::Limited(amount) => Some(amount),
            SendMax::Unlimited(_) => None,
        }
    }
}

/// Calculation options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalcFlags {
    /// Try the implied direct path before the explicit ones
    pub default_paths_allowed: bool,

    /// Deliver less than requested instead of failing
    pub partial_payment_allowed: bool,

    /// Reject increments worse than `send_max / dst_amount`
    pub limit_quality: bool,

    /// Ledger is still open; a pass ceiling hit may be retried
    pub is_ledger_open: bool,
}

impl Default for CalcFlags {
    fn default() -> Self {
        Self {
            default_paths_allowed: true,
            partial_payment_allowed: false,
            limit_quality: false,
            is_ledger_open: true,
        }
    }
}

/// Payment to route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Paying account
    pub src: AccountId,

    /// Receiving account
    pub dst: AccountId,

    /// Amount the destination should receive
    pub dst_amount: Amount,

    /// Maximum the source sends
    pub send_max: SendMax,

    /// Explicit candidate paths
    pub paths: PathSet,

    /// Options
    pub flags: CalcFlags,
}

impl PaymentRequest {
    /// Create request with default flags and no explicit paths
    pub fn new(src: AccountId, dst: AccountId, dst_amount: Amount, send_max: SendMax) -> Self {
        Self {
            src,
            dst,
            dst_amount,
            send_max,
            paths: PathSet::new(),
            flags: CalcFlags::default(),
        }
    }

    /// Add an explicit path
    pub fn with_path(mut self, path: Path) -> Self {
        self.paths.push(path);
        self
    }

    /// Replace the flags
    pub fn with_flags(mut self, flags: CalcFlags) -> Self {
        self.flags = flags;
        self
    }
}
