//! Deterministic ledger entry indexes
//!
//! Every entry lives at a 32-byte index: SHA-256 over the bincode encoding of
//! a namespaced key tuple. Two nodes holding the same entries compute the same
//! indexes, so iteration order over a view is identical everywhere.

use crate::types::{AccountId, Currency};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Key namespaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
enum KeySpace {
    AccountRoot = b'a',
    TrustLine = b'r',
    Offer = b'o',
}

/// 256-bit entry index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryIndex([u8; 32]);

impl EntryIndex {
    /// Create from bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for EntryIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

fn hash_key<K: Serialize>(key: &K) -> EntryIndex {
    // Deterministic serialization of plain tuples
    let canonical_bytes = bincode::serialize(key).expect("serialization cannot fail");
    let mut hasher = Sha256::new();
    hasher.update(&canonical_bytes);
    EntryIndex(hasher.finalize().into())
}

/// Index of an account root
pub fn account_index(account: &AccountId) -> EntryIndex {
    hash_key(&(KeySpace::AccountRoot, account))
}

/// Index of the trust line between two accounts in a currency
///
/// The pair is unordered: `trust_line_index(a, b, c) == trust_line_index(b, a, c)`.
pub fn trust_line_index(a: &AccountId, b: &AccountId, currency: &Currency) -> EntryIndex {
    let (low, high) = if a < b { (a, b) } else { (b, a) };
    hash_key(&(KeySpace::TrustLine, low, high, currency))
}

/// Index of an offer
pub fn offer_index(owner: &AccountId, sequence: u32) -> EntryIndex {
    hash_key(&(KeySpace::Offer, owner, sequence))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trust_line_index_is_unordered() {
        let a = AccountId::from_name("alice");
        let b = AccountId::from_name("bob");
        let usd = Currency::new(*b"USD");
        assert_eq!(trust_line_index(&a, &b, &usd), trust_line_index(&b, &a, &usd));
        assert_ne!(
            trust_line_index(&a, &b, &usd),
            trust_line_index(&a, &b, &Currency::new(*b"EUR"))
        );
    }

    #[test]
    fn test_namespaces_do_not_collide() {
        let a = AccountId::from_name("alice");
        assert_ne!(account_index(&a), offer_index(&a, 0));
    }

    #[test]
    fn test_offer_index_deterministic() {
        let a = AccountId::from_name("maker");
        assert_eq!(offer_index(&a, 7), offer_index(&a, 7));
        assert_ne!(offer_index(&a, 7), offer_index(&a, 8));
    }
}
