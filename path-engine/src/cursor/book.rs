//! Order book crossing
//!
//! Crossing a book is planned against a read-only view first and applied
//! afterwards, so the reverse pass can size a book without touching the
//! ledger and the forward pass can re-plan a chain before committing it.
//!
//! Offers are walked best quality first. Without multi-quality only the
//! first funded quality tier is crossed. Input owed for a partial take is
//! rounded up in the book's favour, output of an input-limited take is
//! rounded down.

use crate::ter::Ter;
use crate::transfer::{credit_holder, debit_holder, holder_funds, transfer_rate};
use ledger_core::amount::{round_down, round_up};
use ledger_core::{AccountId, Book, EntryIndex, LedgerEntry, LedgerView, Quality};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

/// Where a book's input comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Inflow {
    /// Paid by this account (the source, or an issuer of its own currency)
    Account(AccountId),
    /// Redeemed to the issuer by the offers of the previous book
    Limbo,
}

/// One offer crossed
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Take {
    pub index: EntryIndex,
    pub owner: AccountId,
    /// Input the owner receives
    pub principal: Decimal,
    /// Transfer fee kept by the input issuer
    pub fee: Decimal,
    /// Output the owner gives
    pub out: Decimal,
    /// Offer emptied or its owner left without funds
    pub consumed: bool,
}

/// Planned crossing of one book
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Crossing {
    pub takes: Vec<Take>,
    pub principal: Decimal,
    pub fees: Decimal,
    pub out: Decimal,
    gross: Decimal,
    /// Offers skipped as empty or unfunded
    pub unfunded: Vec<EntryIndex>,
    /// Skipped offers that were empty or unfunded before this crossing
    /// spent anything of their owner
    pub stale: Vec<EntryIndex>,
    pub tier: Option<Quality>,
    /// No offer is left in the book after this crossing
    pub exhausted: bool,
}

impl Crossing {
    /// Input including fees
    pub fn gross_in(&self) -> Decimal {
        self.gross
    }
}

/// Overflow of book arithmetic is an internal failure, never a panic
fn checked(value: Option<Decimal>, what: &str) -> Result<Decimal, Ter> {
    value.ok_or_else(|| {
        tracing::error!("Decimal overflow computing {} while crossing a book", what);
        Ter::TefInternal
    })
}

/// Plan crossing `book` for at most `want_out` output and `have_in` input
pub(crate) fn plan_crossing(
    view: &LedgerView,
    book: &Book,
    inflow: Inflow,
    want_out: Decimal,
    have_in: Option<Decimal>,
    multi_quality: bool,
) -> Result<Crossing, Ter> {
    let mut crossing = Crossing::default();
    if want_out <= Decimal::ZERO || have_in.map_or(false, |have| have <= Decimal::ZERO) {
        return Ok(crossing);
    }

    let in_issuer = book.in_asset.issuer();
    let base_rate = match in_issuer {
        Some(issuer) if inflow != Inflow::Account(issuer) => transfer_rate(view, &issuer)?,
        _ => Decimal::ONE,
    };

    let mut spent: BTreeMap<AccountId, Decimal> = BTreeMap::new();
    let mut remaining_out = want_out;
    let mut remaining_in = have_in;
    crossing.exhausted = true;

    for (index, offer) in view.book_offers(book) {
        if remaining_out <= Decimal::ZERO
            || remaining_in.map_or(false, |remaining| remaining <= Decimal::ZERO)
        {
            crossing.exhausted = false;
            break;
        }
        if offer.taker_gets.is_zero() || offer.taker_pays.is_zero() {
            crossing.unfunded.push(index);
            crossing.stale.push(index);
            continue;
        }
        if let Some(tier) = crossing.tier {
            if !multi_quality && offer.quality != tier {
                crossing.exhausted = false;
                break;
            }
        }

        let already_spent = spent.get(&offer.owner).copied().unwrap_or_default();
        let funds = holder_funds(view, &offer.owner, &book.out_asset)?
            .map(|funds| checked(funds.checked_sub(already_spent), "owner funds"))
            .transpose()?;
        if funds.map_or(false, |funds| funds <= Decimal::ZERO) {
            crossing.unfunded.push(index);
            if already_spent.is_zero() {
                crossing.stale.push(index);
            }
            continue;
        }
        if crossing.tier.is_none() {
            crossing.tier = Some(offer.quality);
        }

        let gets = offer.taker_gets.value();
        let pays = offer.taker_pays.value();
        let rate = offer.quality.rate();
        let available = funds.map_or(gets, |funds| funds.min(gets));
        let fee_rate = if Some(offer.owner) == in_issuer {
            Decimal::ONE
        } else {
            base_rate
        };

        let mut out = available.min(remaining_out);
        let mut principal = if out == gets {
            pays
        } else {
            round_up(&book.in_asset, checked(out.checked_mul(rate), "offer input")?).min(pays)
        };
        let fee_share = fee_rate - Decimal::ONE;
        let mut fee = round_up(&book.in_asset, checked(principal.checked_mul(fee_share), "transfer fee")?);
        let mut gross = checked(principal.checked_add(fee), "gross input")?;

        if let Some(limit) = remaining_in {
            if gross > limit {
                // Input-limited: spend everything that is left
                let principal_max = checked(limit.checked_div(fee_rate), "input principal")?;
                principal = round_down(&book.in_asset, principal_max).min(pays);
                fee = limit - principal;
                gross = limit;
                let out_max = checked(principal.checked_div(rate), "offer output")?;
                out = round_down(&book.out_asset, out_max).min(available);
            }
        }

        if out <= Decimal::ZERO {
            crossing.exhausted = false;
            break;
        }

        let consumed = out >= gets || principal >= pays || out >= available;
        crossing.takes.push(Take {
            index,
            owner: offer.owner,
            principal,
            fee,
            out,
            consumed,
        });
        crossing.principal = checked(crossing.principal.checked_add(principal), "book principal")?;
        crossing.fees = checked(crossing.fees.checked_add(fee), "book fees")?;
        crossing.gross = checked(crossing.gross.checked_add(gross), "book input")?;
        crossing.out = checked(crossing.out.checked_add(out), "book output")?;
        remaining_out -= out;
        if let Some(remaining) = remaining_in.as_mut() {
            *remaining -= gross;
        }
        let owner_spent = spent.entry(offer.owner).or_default();
        *owner_spent = checked(owner_spent.checked_add(out), "owner spend")?;

        if !consumed {
            crossing.exhausted = false;
        }
    }

    tracing::trace!(
        book_in = %book.in_asset,
        book_out = %book.out_asset,
        takes = crossing.takes.len(),
        gross_in = %crossing.gross_in(),
        out = %crossing.out,
        "book crossing planned"
    );
    Ok(crossing)
}

/// Apply a planned crossing to `view`
///
/// The input is taken from the inflow account (nothing for limbo), each
/// owner receives its principal and pays out its output to the output
/// issuer. Emptied and unfunded offers are added to `unfunded`.
pub(crate) fn apply_crossing(
    view: &mut LedgerView,
    book: &Book,
    inflow: Inflow,
    crossing: &Crossing,
    unfunded: &mut BTreeSet<EntryIndex>,
) -> Result<(), Ter> {
    if let Inflow::Account(sender) = inflow {
        debit_holder(view, &sender, &book.in_asset, crossing.gross_in())?;
    }

    for take in &crossing.takes {
        credit_holder(view, &take.owner, &book.in_asset, take.principal)?;
        debit_holder(view, &take.owner, &book.out_asset, take.out)?;

        let mut offer = view.offer(&take.index)?.ok_or(Ter::TefBadLedger)?.clone();
        let pays = (offer.taker_pays.value() - take.principal).max(Decimal::ZERO);
        let gets = (offer.taker_gets.value() - take.out).max(Decimal::ZERO);
        offer.taker_pays = offer.taker_pays.with_value(pays);
        offer.taker_gets = offer.taker_gets.with_value(gets);
        view.entry_modify(LedgerEntry::Offer(offer))?;

        if take.consumed {
            unfunded.insert(take.index);
        }
    }

    unfunded.extend(crossing.unfunded.iter().copied());
    Ok(())
}
