//! Core identifier types for the ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Total ordering (account ordering decides trust line sides)
//! - Cheap copies (fixed-size byte arrays)

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Account identifier (160-bit)
///
/// Ordering is bytewise, i.e. numeric big-endian. The smaller account of a
/// pair holds the "low" side of their trust line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId([u8; 20]);

impl AccountId {
    /// Null account, used by offer nodes and as "no account"
    pub const ZERO: AccountId = AccountId([0u8; 20]);

    /// Create from raw bytes
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Derive a stable account id from a human label
    pub fn from_name(name: &str) -> Self {
        let digest = Sha256::digest(name.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[..20]);
        Self(bytes)
    }

    /// Get bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// True for the null account
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..6] {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Three-letter currency code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Currency([u8; 3]);

impl Currency {
    /// Native asset (no issuer)
    pub const NATIVE: Currency = Currency([0u8; 3]);

    /// Create from a code literal
    pub const fn new(code: [u8; 3]) -> Self {
        Self(code)
    }

    /// Parse from string
    ///
    /// Returns `None` unless the code is exactly three ASCII uppercase letters.
    pub fn from_code(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(|b| b.is_ascii_uppercase()) {
            return None;
        }
        Some(Self([bytes[0], bytes[1], bytes[2]]))
    }

    /// True for the native currency
    pub fn is_native(&self) -> bool {
        *self == Self::NATIVE
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_native() {
            return write!(f, "NATIVE");
        }
        for byte in &self.0 {
            write!(f, "{}", *byte as char)?;
        }
        Ok(())
    }
}

/// Issued currency: a currency code plus its issuing account
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Issue {
    /// Currency code
    pub currency: Currency,
    /// Issuing account
    pub issuer: AccountId,
}

impl Issue {
    /// Create new issue
    pub fn new(currency: Currency, issuer: AccountId) -> Self {
        Self { currency, issuer }
    }
}

/// Asset tag carried by every amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Asset {
    /// Native asset, no issuer
    Native,
    /// Issued (credit) asset
    Issued(Issue),
}

impl Asset {
    /// Convenience constructor for an issued asset
    pub fn issued(currency: Currency, issuer: AccountId) -> Self {
        Asset::Issued(Issue::new(currency, issuer))
    }

    /// Currency code (native for the native asset)
    pub fn currency(&self) -> Currency {
        match self {
            Asset::Native => Currency::NATIVE,
            Asset::Issued(issue) => issue.currency,
        }
    }

    /// Issuer (`None` for native)
    pub fn issuer(&self) -> Option<AccountId> {
        match self {
            Asset::Native => None,
            Asset::Issued(issue) => Some(issue.issuer),
        }
    }

    /// True for native
    pub fn is_native(&self) -> bool {
        matches!(self, Asset::Native)
    }

    /// Same asset re-tagged with another issuer; native is unchanged
    pub fn with_issuer(&self, issuer: AccountId) -> Self {
        match self {
            Asset::Native => Asset::Native,
            Asset::Issued(issue) => Asset::issued(issue.currency, issuer),
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => write!(f, "NATIVE"),
            Asset::Issued(issue) => write!(f, "{}/{}", issue.currency, issue.issuer),
        }
    }
}
