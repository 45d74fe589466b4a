//! Ledger entry records
//!
//! Three kinds of entries participate in settlement: account roots (native
//! balance and issuer settings), trust lines (bilateral credit) and offers
//! (order book liquidity).

use crate::amount::{Amount, Quality};
use crate::index::{account_index, offer_index, trust_line_index, EntryIndex};
use crate::types::{AccountId, Asset, Currency};
use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Account root entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRoot {
    /// Account
    pub account: AccountId,

    /// Native balance
    pub balance: Decimal,

    /// Transfer rate charged when third parties move this account's IOUs
    /// through an order book (1 = no fee)
    pub transfer_rate: Decimal,

    /// Issuer froze every line it issued on
    pub global_freeze: bool,

    /// Number of owned entries (offers, lines)
    pub owner_count: u32,
}

impl AccountRoot {
    /// Create account with a native balance
    pub fn new(account: AccountId, balance: Decimal) -> Self {
        Self {
            account,
            balance,
            transfer_rate: Decimal::ONE,
            global_freeze: false,
            owner_count: 0,
        }
    }

    /// Set transfer rate
    pub fn with_transfer_rate(mut self, rate: Decimal) -> Self {
        self.transfer_rate = rate;
        self
    }
}

/// Side of a trust line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Account with the smaller id
    Low,
    /// Account with the larger id
    High,
}

/// Trust line between two accounts in one currency
///
/// `balance` is kept from the low account's point of view: positive means
/// the high account owes the low account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustLine {
    /// Low account
    pub low: AccountId,
    /// High account
    pub high: AccountId,
    /// Currency
    pub currency: Currency,
    /// Signed balance (positive: high owes low)
    pub balance: Decimal,
    /// Limit the low account extends to the high account
    pub low_limit: Decimal,
    /// Limit the high account extends to the low account
    pub high_limit: Decimal,
    /// Low account refuses rippling through this line
    pub low_no_ripple: bool,
    /// High account refuses rippling through this line
    pub high_no_ripple: bool,
    /// Low account froze this line
    pub low_freeze: bool,
    /// High account froze this line
    pub high_freeze: bool,
}

impl TrustLine {
    /// Create an empty line between two accounts
    pub fn new(a: AccountId, b: AccountId, currency: Currency) -> Self {
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        Self {
            low,
            high,
            currency,
            balance: Decimal::ZERO,
            low_limit: Decimal::ZERO,
            high_limit: Decimal::ZERO,
            low_no_ripple: false,
            high_no_ripple: false,
            low_freeze: false,
            high_freeze: false,
        }
    }

    /// Which side `account` occupies (it must be one of the two parties)
    pub fn side_of(&self, account: &AccountId) -> Side {
        if *account == self.low {
            Side::Low
        } else {
            Side::High
        }
    }

    /// True if `account` is one of the two parties
    pub fn involves(&self, account: &AccountId) -> bool {
        *account == self.low || *account == self.high
    }

    /// The other party
    pub fn counterparty(&self, account: &AccountId) -> AccountId {
        match self.side_of(account) {
            Side::Low => self.high,
            Side::High => self.low,
        }
    }

    /// Limit extended by `account`
    pub fn limit_of(&self, account: &AccountId) -> Decimal {
        match self.side_of(account) {
            Side::Low => self.low_limit,
            Side::High => self.high_limit,
        }
    }

    /// Set the limit extended by `account`
    pub fn set_limit(&mut self, account: &AccountId, limit: Decimal) {
        match self.side_of(account) {
            Side::Low => self.low_limit = limit,
            Side::High => self.high_limit = limit,
        }
    }

    /// No-ripple flag on `account`'s side
    pub fn no_ripple(&self, account: &AccountId) -> bool {
        match self.side_of(account) {
            Side::Low => self.low_no_ripple,
            Side::High => self.high_no_ripple,
        }
    }

    /// Set the no-ripple flag on `account`'s side
    pub fn set_no_ripple(&mut self, account: &AccountId, flag: bool) {
        match self.side_of(account) {
            Side::Low => self.low_no_ripple = flag,
            Side::High => self.high_no_ripple = flag,
        }
    }

    /// Freeze flag on `account`'s side
    pub fn frozen_by(&self, account: &AccountId) -> bool {
        match self.side_of(account) {
            Side::Low => self.low_freeze,
            Side::High => self.high_freeze,
        }
    }

    /// Set the freeze flag on `account`'s side
    pub fn set_freeze(&mut self, account: &AccountId, flag: bool) {
        match self.side_of(account) {
            Side::Low => self.low_freeze = flag,
            Side::High => self.high_freeze = flag,
        }
    }

    /// Amount `account` owes its counterparty (negative when it is owed)
    pub fn owed_by(&self, account: &AccountId) -> Decimal {
        match self.side_of(account) {
            Side::Low => -self.balance,
            Side::High => self.balance,
        }
    }

    /// Record that `from` paid `amount` to its counterparty
    pub fn credit_from(&mut self, from: &AccountId, amount: Decimal) -> Result<()> {
        let balance = match self.side_of(from) {
            Side::Low => self.balance.checked_sub(amount),
            Side::High => self.balance.checked_add(amount),
        };
        self.balance = balance
            .ok_or_else(|| Error::Overflow(format!("trust line balance {}", self.balance)))?;
        Ok(())
    }
}

/// Order book: what the taker pays in and what the taker gets out
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Book {
    /// Asset paid into the book
    pub in_asset: Asset,
    /// Asset taken out of the book
    pub out_asset: Asset,
}

impl Book {
    /// Create new book
    pub fn new(in_asset: Asset, out_asset: Asset) -> Self {
        Self { in_asset, out_asset }
    }
}

/// Standing offer in a book
///
/// The owner receives `taker_pays` and gives `taker_gets`; both shrink as the
/// offer is crossed. `quality` is fixed when the offer is placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    /// Owner
    pub owner: AccountId,
    /// Owner's sequence number when placed
    pub sequence: u32,
    /// Remaining amount the owner wants
    pub taker_pays: Amount,
    /// Remaining amount the owner gives
    pub taker_gets: Amount,
    /// Input per unit of output
    pub quality: Quality,
}

impl Offer {
    /// Create offer; quality is `taker_pays / taker_gets`
    pub fn new(owner: AccountId, sequence: u32, taker_pays: Amount, taker_gets: Amount) -> Result<Self> {
        let quality = Quality::from_values(taker_pays.value(), taker_gets.value()).ok_or_else(|| {
            Error::InvalidAmount(format!("offer {} for {}", taker_pays, taker_gets))
        })?;
        Ok(Self {
            owner,
            sequence,
            taker_pays,
            taker_gets,
            quality,
        })
    }

    /// Book this offer sits in
    pub fn book(&self) -> Book {
        Book::new(*self.taker_pays.asset(), *self.taker_gets.asset())
    }
}

/// Any ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEntry {
    /// Account root
    AccountRoot(AccountRoot),
    /// Trust line
    TrustLine(TrustLine),
    /// Offer
    Offer(Offer),
}

impl LedgerEntry {
    /// Index this entry lives at
    pub fn index(&self) -> EntryIndex {
        match self {
            LedgerEntry::AccountRoot(root) => account_index(&root.account),
            LedgerEntry::TrustLine(line) => trust_line_index(&line.low, &line.high, &line.currency),
            LedgerEntry::Offer(offer) => offer_index(&offer.owner, offer.sequence),
        }
    }

    /// Kind name (for errors and logs)
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerEntry::AccountRoot(_) => "account_root",
            LedgerEntry::TrustLine(_) => "trust_line",
            LedgerEntry::Offer(_) => "offer",
        }
    }
}
