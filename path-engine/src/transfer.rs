//! Value movement primitives over a ledger view
//!
//! Issued value moves along trust lines; native value moves between account
//! roots. Book crossings move value through the issuer: a payer redeems to
//! the issuer and the issuer issues to the payee, so an issuer paying or
//! receiving its own currency touches no line at all.

use crate::credit::{credit_balance, credit_limit};
use ledger_core::{
    account_index, AccountId, Asset, Currency, Error, LedgerEntry, LedgerView, TrustLine,
};
use rust_decimal::Decimal;

/// How much `from` can still pay `to` over their trust line
///
/// Credit `to` extends to `from` minus what `from` already owes `to`.
pub fn hop_capacity(
    view: &LedgerView,
    from: &AccountId,
    to: &AccountId,
    currency: &Currency,
) -> ledger_core::Result<Decimal> {
    let limit = credit_limit(view, to, from, currency)?;
    let owed = credit_balance(view, from, to, currency)?;
    Ok((limit.value() - owed.value()).max(Decimal::ZERO))
}

/// Funds `holder` can pay out in `asset`; `None` means unlimited
pub fn holder_funds(
    view: &LedgerView,
    holder: &AccountId,
    asset: &Asset,
) -> ledger_core::Result<Option<Decimal>> {
    match asset {
        Asset::Native => Ok(Some(view.native_balance(holder)?.value())),
        Asset::Issued(issue) if issue.issuer == *holder => Ok(None),
        Asset::Issued(issue) => {
            let owed = credit_balance(view, holder, &issue.issuer, &issue.currency)?;
            Ok(Some((-owed.value()).max(Decimal::ZERO)))
        }
    }
}

/// Transfer rate `issuer` charges on third-party transfers (1 = none)
pub fn transfer_rate(view: &LedgerView, issuer: &AccountId) -> ledger_core::Result<Decimal> {
    Ok(view
        .account_root(issuer)?
        .map(|root| root.transfer_rate)
        .unwrap_or(Decimal::ONE))
}

/// Move `amount` of `currency` from `from` to `to` over their trust line
///
/// A missing line is created with zero limits on both sides.
pub fn ripple_credit(
    view: &mut LedgerView,
    from: &AccountId,
    to: &AccountId,
    currency: &Currency,
    amount: Decimal,
) -> ledger_core::Result<()> {
    if from == to || amount.is_zero() {
        return Ok(());
    }

    match view.trust_line(from, to, currency)? {
        Some(line) => {
            let mut line = line.clone();
            line.credit_from(from, amount)?;
            view.entry_modify(LedgerEntry::TrustLine(line))
        }
        None => {
            let mut line = TrustLine::new(*from, *to, *currency);
            line.credit_from(from, amount)?;
            view.insert_trust_line(line).map(|_| ())
        }
    }
}

/// Take `amount` of `asset` out of `holder`'s funds
///
/// Issued value is redeemed to its issuer; an issuer debiting its own
/// currency is a no-op.
pub fn debit_holder(
    view: &mut LedgerView,
    holder: &AccountId,
    asset: &Asset,
    amount: Decimal,
) -> ledger_core::Result<()> {
    if amount.is_zero() {
        return Ok(());
    }
    match asset {
        Asset::Native => adjust_native(view, holder, -amount),
        Asset::Issued(issue) => {
            ripple_credit(view, holder, &issue.issuer, &issue.currency, amount)
        }
    }
}

/// Give `amount` of `asset` to `holder`
///
/// Issued value is issued by its issuer; an issuer crediting its own
/// currency is a no-op.
pub fn credit_holder(
    view: &mut LedgerView,
    holder: &AccountId,
    asset: &Asset,
    amount: Decimal,
) -> ledger_core::Result<()> {
    if amount.is_zero() {
        return Ok(());
    }
    match asset {
        Asset::Native => adjust_native(view, holder, amount),
        Asset::Issued(issue) => {
            ripple_credit(view, &issue.issuer, holder, &issue.currency, amount)
        }
    }
}

fn adjust_native(view: &mut LedgerView, account: &AccountId, delta: Decimal) -> ledger_core::Result<()> {
    let mut root = view
        .account_root(account)?
        .ok_or_else(|| Error::EntryNotFound(account_index(account)))?
        .clone();
    let balance = root
        .balance
        .checked_add(delta)
        .ok_or_else(|| Error::Overflow(format!("native balance of {}", account)))?;
    if balance.is_sign_negative() {
        return Err(Error::InvariantViolation(format!(
            "native balance of {} would go negative: {}",
            account, balance
        )));
    }
    root.balance = balance;
    view.entry_modify(LedgerEntry::AccountRoot(root))
}
