//! Credit limit and balance between two accounts
//!
//! Both helpers read the trust line keyed by the unordered account pair and
//! report it from `account`'s point of view. The returned amount is always
//! tagged `(currency, account)`.

use ledger_core::{AccountId, Amount, Currency, LedgerView};

/// Limit `account` extends to `issuer` in `currency`
///
/// Zero when there is no trust line.
pub fn credit_limit(
    view: &LedgerView,
    account: &AccountId,
    issuer: &AccountId,
    currency: &Currency,
) -> ledger_core::Result<Amount> {
    let value = view
        .trust_line(account, issuer, currency)?
        .map(|line| line.limit_of(account))
        .unwrap_or_default();
    Ok(Amount::issued(value, *currency, *account))
}

/// Balance of the line between `account` and `issuer`, signed for `account`
///
/// Positive means `account` owes `issuer`; negative means `account` holds
/// `issuer`'s credit. Zero when there is no trust line.
pub fn credit_balance(
    view: &LedgerView,
    account: &AccountId,
    issuer: &AccountId,
    currency: &Currency,
) -> ledger_core::Result<Amount> {
    let value = view
        .trust_line(account, issuer, currency)?
        .map(|line| line.owed_by(account))
        .unwrap_or_default();
    Ok(Amount::issued(value, *currency, *account))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::TrustLine;
    use rust_decimal::Decimal;

    fn usd() -> Currency {
        Currency::new(*b"USD")
    }

    #[test]
    fn test_missing_line_is_zero_tagged_with_account() {
        let view = LedgerView::new();
        let alice = AccountId::from_name("alice");
        let gw = AccountId::from_name("gw");

        let limit = credit_limit(&view, &alice, &gw, &usd()).unwrap();
        assert!(limit.is_zero());
        assert_eq!(limit.asset().issuer(), Some(alice));
        assert_eq!(limit.asset().currency(), usd());

        let balance = credit_balance(&view, &alice, &gw, &usd()).unwrap();
        assert!(balance.is_zero());
        assert_eq!(balance.asset().issuer(), Some(alice));
    }

    #[test]
    fn test_limits_and_balance_are_side_aware() {
        let alice = AccountId::from_name("alice");
        let gw = AccountId::from_name("gw");
        let mut line = TrustLine::new(alice, gw, usd());
        line.set_limit(&alice, Decimal::from(100));
        line.set_limit(&gw, Decimal::from(7));
        // gw issued 40 to alice
        line.credit_from(&gw, Decimal::from(40)).unwrap();

        let mut view = LedgerView::new();
        view.insert_trust_line(line).unwrap();

        assert_eq!(credit_limit(&view, &alice, &gw, &usd()).unwrap().value(), Decimal::from(100));
        assert_eq!(credit_limit(&view, &gw, &alice, &usd()).unwrap().value(), Decimal::from(7));
        assert_eq!(credit_balance(&view, &gw, &alice, &usd()).unwrap().value(), Decimal::from(40));
        assert_eq!(credit_balance(&view, &alice, &gw, &usd()).unwrap().value(), Decimal::from(-40));
        assert_eq!(credit_balance(&view, &gw, &alice, &usd()).unwrap().asset().issuer(), Some(gw));
    }
}
