//! Expanded path nodes

use ledger_core::{AccountId, Asset, Book, Quality};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Hop through an account's trust lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountNode {
    /// Account
    pub account: AccountId,
    /// Asset this account passes downstream
    pub asset: Asset,
    /// Reverse pass: amount this node must pass downstream
    pub rev_out: Decimal,
    /// Forward pass: amount this node actually passed downstream
    pub fwd_deliver: Decimal,
}

impl AccountNode {
    /// Create node with empty working amounts
    pub fn new(account: AccountId, asset: Asset) -> Self {
        Self {
            account,
            asset,
            rev_out: Decimal::ZERO,
            fwd_deliver: Decimal::ZERO,
        }
    }
}

/// Crossing of an order book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferNode {
    /// Book crossed
    pub book: Book,
    /// Reverse pass: gross input the book needs
    pub rev_in: Decimal,
    /// Reverse pass: output the book can give
    pub rev_out: Decimal,
    /// Forward pass: gross input consumed
    pub fwd_in: Decimal,
    /// Forward pass: output delivered
    pub fwd_out: Decimal,
    /// Quality of the first offer crossed
    pub tier: Option<Quality>,
    /// Every offer left in the book was consumed
    pub exhausted: bool,
}

impl OfferNode {
    /// Create node with empty working amounts
    pub fn new(book: Book) -> Self {
        Self {
            book,
            rev_in: Decimal::ZERO,
            rev_out: Decimal::ZERO,
            fwd_in: Decimal::ZERO,
            fwd_out: Decimal::ZERO,
            tier: None,
            exhausted: false,
        }
    }
}

/// Node of an expanded path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Node {
    /// Account hop
    Account(AccountNode),
    /// Book crossing
    Offer(OfferNode),
}

impl Node {
    /// Account of this node; the null account for offer nodes
    pub fn account(&self) -> AccountId {
        match self {
            Node::Account(node) => node.account,
            Node::Offer(_) => AccountId::ZERO,
        }
    }

    /// Asset leaving this node
    pub fn asset(&self) -> Asset {
        match self {
            Node::Account(node) => node.asset,
            Node::Offer(node) => node.book.out_asset,
        }
    }

    /// True for account nodes
    pub fn is_account(&self) -> bool {
        matches!(self, Node::Account(_))
    }

    /// True for offer nodes
    pub fn is_offer(&self) -> bool {
        matches!(self, Node::Offer(_))
    }

    /// Clear the working amounts of the last increment
    pub fn clear(&mut self) {
        match self {
            Node::Account(node) => {
                node.rev_out = Decimal::ZERO;
                node.fwd_deliver = Decimal::ZERO;
            }
            Node::Offer(node) => {
                node.rev_in = Decimal::ZERO;
                node.rev_out = Decimal::ZERO;
                node.fwd_in = Decimal::ZERO;
                node.fwd_out = Decimal::ZERO;
                node.tier = None;
                node.exhausted = false;
            }
        }
    }
}
