//! Copy-on-write ledger view
//!
//! A [`LedgerView`] is an immutable shared base map plus a private change
//! set. Cloning a view (a checkpoint) copies only the change set; the base is
//! shared through an `Arc`. Handing a checkpoint back to its owner is a plain
//! move or [`LedgerView::swap_with`], so there is no aliasing between a
//! path's trial view and the shared view.
//!
//! Offers are indexed by book on both layers, so walking a book costs the
//! size of the book rather than the size of the ledger.
//!
//! # Invariants
//!
//! - Every entry sits at the index computed from its own key
//! - Iteration order is index order (deterministic across nodes)

use crate::amount::Amount;
use crate::entry::{AccountRoot, Book, LedgerEntry, Offer, TrustLine};
use crate::index::{account_index, trust_line_index, EntryIndex};
use crate::types::{AccountId, Currency};
use crate::{Error, Result};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Pending change to one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryChange {
    /// Entry did not exist in the base
    Created(LedgerEntry),
    /// Entry existed in the base and was rewritten
    Modified(LedgerEntry),
    /// Entry existed in the base and was removed
    Deleted,
}

type BookIndex = BTreeMap<Book, BTreeSet<EntryIndex>>;

/// Copy-on-write snapshot of ledger entries
#[derive(Debug, Clone, Default)]
pub struct LedgerView {
    base: Arc<BTreeMap<EntryIndex, LedgerEntry>>,
    base_books: Arc<BookIndex>,
    changes: BTreeMap<EntryIndex, EntryChange>,
    /// Offers written in `changes`, by the book they were written into
    change_books: BookIndex,
}

fn index_books(entries: &BTreeMap<EntryIndex, LedgerEntry>) -> BookIndex {
    let mut books = BookIndex::new();
    for (index, entry) in entries {
        if let LedgerEntry::Offer(offer) = entry {
            books.entry(offer.book()).or_default().insert(*index);
        }
    }
    books
}

impl LedgerView {
    /// Create empty view
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a view whose base holds the given entries
    pub fn from_entries(entries: impl IntoIterator<Item = LedgerEntry>) -> Result<Self> {
        let mut base = BTreeMap::new();
        for entry in entries {
            let index = entry.index();
            if base.insert(index, entry).is_some() {
                return Err(Error::EntryExists(index));
            }
        }
        Ok(Self {
            base_books: Arc::new(index_books(&base)),
            base: Arc::new(base),
            changes: BTreeMap::new(),
            change_books: BookIndex::new(),
        })
    }

    fn record_change(&mut self, index: EntryIndex, change: EntryChange) {
        if let EntryChange::Created(LedgerEntry::Offer(offer))
        | EntryChange::Modified(LedgerEntry::Offer(offer)) = &change
        {
            self.change_books.entry(offer.book()).or_default().insert(index);
        }
        self.changes.insert(index, change);
    }

    /// Read an entry
    pub fn entry_cache(&self, index: &EntryIndex) -> Option<&LedgerEntry> {
        match self.changes.get(index) {
            Some(EntryChange::Created(entry)) | Some(EntryChange::Modified(entry)) => Some(entry),
            Some(EntryChange::Deleted) => None,
            None => self.base.get(index),
        }
    }

    /// True if an entry exists at `index`
    pub fn contains(&self, index: &EntryIndex) -> bool {
        self.entry_cache(index).is_some()
    }

    /// Create a new entry
    pub fn entry_create(&mut self, entry: LedgerEntry) -> Result<EntryIndex> {
        let index = entry.index();
        if self.contains(&index) {
            return Err(Error::EntryExists(index));
        }
        let change = if self.base.contains_key(&index) {
            // Deleted earlier in this view, recreated now
            EntryChange::Modified(entry)
        } else {
            EntryChange::Created(entry)
        };
        self.record_change(index, change);
        Ok(index)
    }

    /// Overwrite an existing entry
    pub fn entry_modify(&mut self, entry: LedgerEntry) -> Result<()> {
        let index = entry.index();
        let change = match self.changes.get(&index) {
            Some(EntryChange::Created(_)) => EntryChange::Created(entry),
            Some(EntryChange::Modified(_)) => EntryChange::Modified(entry),
            Some(EntryChange::Deleted) => return Err(Error::EntryNotFound(index)),
            None if self.base.contains_key(&index) => EntryChange::Modified(entry),
            None => return Err(Error::EntryNotFound(index)),
        };
        self.record_change(index, change);
        Ok(())
    }

    /// Remove an existing entry
    pub fn entry_delete(&mut self, index: &EntryIndex) -> Result<()> {
        match self.changes.get(index) {
            Some(EntryChange::Created(_)) => {
                self.changes.remove(index);
            }
            Some(EntryChange::Modified(_)) => {
                self.changes.insert(*index, EntryChange::Deleted);
            }
            Some(EntryChange::Deleted) => return Err(Error::EntryNotFound(*index)),
            None if self.base.contains_key(index) => {
                self.changes.insert(*index, EntryChange::Deleted);
            }
            None => return Err(Error::EntryNotFound(*index)),
        }
        Ok(())
    }

    /// Remove an offer and release its owner's reserve slot
    pub fn offer_delete(&mut self, index: &EntryIndex) -> Result<()> {
        let owner = self
            .offer(index)?
            .ok_or(Error::EntryNotFound(*index))?
            .owner;
        self.entry_delete(index)?;

        if let Some(root) = self.account_root(&owner)? {
            let mut root = root.clone();
            root.owner_count = root.owner_count.saturating_sub(1);
            self.entry_modify(LedgerEntry::AccountRoot(root))?;
        }
        tracing::trace!(offer = %index, owner = %owner, "offer deleted");
        Ok(())
    }

    /// Cheap copy for trial application
    pub fn checkpoint(&self) -> LedgerView {
        self.clone()
    }

    /// Exchange contents with another view
    pub fn swap_with(&mut self, other: &mut LedgerView) {
        std::mem::swap(self, other);
    }

    /// Pending changes against the base, in index order
    pub fn changes(&self) -> impl Iterator<Item = (&EntryIndex, &EntryChange)> {
        self.changes.iter()
    }

    /// True when nothing changed against the base
    pub fn is_unchanged(&self) -> bool {
        self.changes.is_empty()
    }

    /// Materialise every live entry
    pub fn entries(&self) -> BTreeMap<EntryIndex, LedgerEntry> {
        let mut entries: BTreeMap<EntryIndex, LedgerEntry> = self
            .base
            .iter()
            .filter(|(index, _)| !self.changes.contains_key(index))
            .map(|(index, entry)| (*index, entry.clone()))
            .collect();
        for (index, change) in &self.changes {
            match change {
                EntryChange::Created(entry) | EntryChange::Modified(entry) => {
                    entries.insert(*index, entry.clone());
                }
                EntryChange::Deleted => {}
            }
        }
        entries
    }

    /// Fold the change set into a fresh base
    pub fn compact(&mut self) {
        if self.changes.is_empty() {
            return;
        }
        let entries = self.entries();
        self.base_books = Arc::new(index_books(&entries));
        self.base = Arc::new(entries);
        self.changes.clear();
        self.change_books.clear();
    }

    /// Account root for `account`
    pub fn account_root(&self, account: &AccountId) -> Result<Option<&AccountRoot>> {
        let index = account_index(account);
        match self.entry_cache(&index) {
            Some(LedgerEntry::AccountRoot(root)) => Ok(Some(root)),
            Some(_) => Err(Error::WrongEntryKind {
                index,
                expected: "account_root",
            }),
            None => Ok(None),
        }
    }

    /// Trust line between two accounts
    pub fn trust_line(
        &self,
        a: &AccountId,
        b: &AccountId,
        currency: &Currency,
    ) -> Result<Option<&TrustLine>> {
        let index = trust_line_index(a, b, currency);
        match self.entry_cache(&index) {
            Some(LedgerEntry::TrustLine(line)) => Ok(Some(line)),
            Some(_) => Err(Error::WrongEntryKind {
                index,
                expected: "trust_line",
            }),
            None => Ok(None),
        }
    }

    /// Offer at `index`
    pub fn offer(&self, index: &EntryIndex) -> Result<Option<&Offer>> {
        match self.entry_cache(index) {
            Some(LedgerEntry::Offer(offer)) => Ok(Some(offer)),
            Some(_) => Err(Error::WrongEntryKind {
                index: *index,
                expected: "offer",
            }),
            None => Ok(None),
        }
    }

    /// Offers in `book`, best quality first
    ///
    /// Ties are ordered by owner then sequence so every node walks the book
    /// identically.
    pub fn book_offers(&self, book: &Book) -> Vec<(EntryIndex, Offer)> {
        let empty = BTreeSet::new();
        let in_base = self.base_books.get(book).unwrap_or(&empty);
        let in_changes = self.change_books.get(book).unwrap_or(&empty);

        // Index sets may hold deleted offers; the entry itself decides
        let mut offers: Vec<(EntryIndex, Offer)> = in_base
            .union(in_changes)
            .filter_map(|index| match self.entry_cache(index) {
                Some(LedgerEntry::Offer(offer)) if offer.book() == *book => {
                    Some((*index, offer.clone()))
                }
                _ => None,
            })
            .collect();
        offers.sort_by(|(_, a), (_, b)| {
            a.quality
                .cmp(&b.quality)
                .then_with(|| a.owner.cmp(&b.owner))
                .then_with(|| a.sequence.cmp(&b.sequence))
        });
        offers
    }

    /// Seed an account root
    pub fn insert_account(&mut self, root: AccountRoot) -> Result<EntryIndex> {
        self.entry_create(LedgerEntry::AccountRoot(root))
    }

    /// Seed a trust line
    pub fn insert_trust_line(&mut self, line: TrustLine) -> Result<EntryIndex> {
        self.entry_create(LedgerEntry::TrustLine(line))
    }

    /// Seed an offer, bumping the owner's owned-entry count
    pub fn insert_offer(&mut self, offer: Offer) -> Result<EntryIndex> {
        let owner = offer.owner;
        let index = self.entry_create(LedgerEntry::Offer(offer))?;
        if let Some(root) = self.account_root(&owner)? {
            let mut root = root.clone();
            root.owner_count += 1;
            self.entry_modify(LedgerEntry::AccountRoot(root))?;
        }
        Ok(index)
    }

    /// Native balance of `account` as an amount (zero if the account is missing)
    pub fn native_balance(&self, account: &AccountId) -> Result<Amount> {
        let balance = self
            .account_root(account)?
            .map(|root| root.balance)
            .unwrap_or(Decimal::ZERO);
        Ok(Amount::native(balance))
    }
}
