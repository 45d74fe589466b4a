//! Property-based tests for ledger invariants
//!
//! These tests use proptest to verify:
//! - Trust line credit is antisymmetric between the two parties
//! - Checkpoints never leak changes into the view they came from
//! - Book iteration is ordered by quality on every build of the view
//! - Quality ordering agrees with the rate it wraps

use ledger_core::{
    AccountId, AccountRoot, Amount, Asset, Book, Currency, LedgerEntry, LedgerView, Offer,
    Quality, TrustLine,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for generating valid amounts (positive decimals)
fn value_strategy() -> impl Strategy<Value = Decimal> {
    (1u64..1_000_000_00u64).prop_map(|cents| Decimal::new(cents as i64, 2))
}

/// Strategy for generating account IDs
fn account_id_strategy() -> impl Strategy<Value = AccountId> {
    "[a-z]{3,10}".prop_map(|name| AccountId::from_name(&name))
}

fn usd() -> Currency {
    Currency::new(*b"USD")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: what one party owes is exactly what the other is owed
    #[test]
    fn prop_trust_line_owed_is_antisymmetric(
        a in account_id_strategy(),
        b in account_id_strategy(),
        credits in prop::collection::vec((any::<bool>(), value_strategy()), 1..20),
    ) {
        prop_assume!(a != b);
        let mut line = TrustLine::new(a, b, usd());
        let mut expected = Decimal::ZERO;

        for (from_a, value) in credits {
            if from_a {
                line.credit_from(&a, value).unwrap();
                expected += value;
            } else {
                line.credit_from(&b, value).unwrap();
                expected -= value;
            }
        }

        prop_assert_eq!(line.owed_by(&a), expected);
        prop_assert_eq!(line.owed_by(&b), -expected);
    }

    /// Property: modifying a checkpoint leaves the source view untouched
    #[test]
    fn prop_checkpoint_isolation(
        balances in prop::collection::vec(value_strategy(), 1..10),
        new_balance in value_strategy(),
    ) {
        let accounts: Vec<AccountRoot> = balances
            .iter()
            .enumerate()
            .map(|(i, balance)| AccountRoot::new(AccountId::from_name(&format!("acct{}", i)), *balance))
            .collect();
        let view = LedgerView::from_entries(accounts.iter().cloned().map(LedgerEntry::AccountRoot)).unwrap();
        let before = view.entries();

        let mut trial = view.checkpoint();
        for root in &accounts {
            let mut root = root.clone();
            root.balance = new_balance;
            trial.entry_modify(LedgerEntry::AccountRoot(root)).unwrap();
        }

        prop_assert_eq!(view.entries(), before);
        for root in &accounts {
            prop_assert_eq!(trial.native_balance(&root.account).unwrap().value(), new_balance);
        }
    }

    /// Property: book offers come back best quality first regardless of insertion order
    #[test]
    fn prop_book_offers_ordered(pays in prop::collection::vec(value_strategy(), 1..15)) {
        let issuer = AccountId::from_name("gateway");
        let book = Book::new(Asset::Native, Asset::issued(usd(), issuer));
        let mut view = LedgerView::new();

        for (seq, value) in pays.iter().enumerate() {
            let offer = Offer::new(
                AccountId::from_name("maker"),
                seq as u32,
                Amount::native(*value),
                Amount::issued(Decimal::from(100), usd(), issuer),
            )
            .unwrap();
            view.insert_offer(offer).unwrap();
        }

        let offers = view.book_offers(&book);
        prop_assert_eq!(offers.len(), pays.len());
        for pair in offers.windows(2) {
            prop_assert!(pair[0].1.quality <= pair[1].1.quality);
        }
    }

    /// Property: quality order follows the underlying rate
    #[test]
    fn prop_quality_order_matches_rate(
        in_a in value_strategy(), out_a in value_strategy(),
        in_b in value_strategy(), out_b in value_strategy(),
    ) {
        let qa = Quality::from_values(in_a, out_a).unwrap();
        let qb = Quality::from_values(in_b, out_b).unwrap();
        prop_assert_eq!(qa.cmp(&qb), qa.rate().cmp(&qb.rate()));
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_compact_preserves_entries() {
        let gw = AccountId::from_name("gateway");
        let alice = AccountId::from_name("alice");
        let mut view = LedgerView::new();
        view.insert_account(AccountRoot::new(gw, Decimal::from(1000))).unwrap();
        view.insert_account(AccountRoot::new(alice, Decimal::from(50))).unwrap();

        let mut line = TrustLine::new(alice, gw, usd());
        line.set_limit(&alice, Decimal::from(100));
        view.insert_trust_line(line).unwrap();

        let before = view.entries();
        view.compact();
        assert!(view.is_unchanged());
        assert_eq!(view.entries(), before);
        assert_eq!(
            view.trust_line(&gw, &alice, &usd()).unwrap().unwrap().limit_of(&alice),
            Decimal::from(100)
        );
    }
}
