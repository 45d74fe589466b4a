//! Path expansion and static checks
//!
//! Expansion runs in two passes. The structural pass turns explicit steps
//! into nodes and never reads the ledger; the ledger pass then requires every
//! account to exist and every issued account-to-account hop to have a line.

use crate::path::node::{AccountNode, Node, OfferNode};
use crate::path::state::PathState;
use crate::path::{Path, PathStep};
use crate::ter::Ter;
use ledger_core::{AccountId, Asset, Book, Currency, LedgerView};
use std::collections::BTreeSet;

/// Structural node builder
#[derive(Debug, Default)]
struct Expander {
    nodes: Vec<Node>,
    seen_accounts: BTreeSet<(AccountId, Currency)>,
    seen_books: BTreeSet<Book>,
    bridges_native: bool,
}

impl Expander {
    fn last(&self) -> Option<Node> {
        self.nodes.last().cloned()
    }

    fn push_account(&mut self, account: AccountId, asset: Asset) -> Result<(), Ter> {
        if account.is_zero() {
            return Err(Ter::TemBadPath);
        }
        if !self.seen_accounts.insert((account, asset.currency())) {
            return Err(Ter::TemBadPathLoop);
        }
        self.nodes.push(Node::Account(AccountNode::new(account, asset)));
        Ok(())
    }

    /// Account reached from the previous node, inserting the issuer after a book
    fn push_account_step(&mut self, account: AccountId) -> Result<(), Ter> {
        match self.last() {
            Some(Node::Account(prev)) => match prev.asset {
                // Native never ripples between accounts
                Asset::Native => Err(Ter::TemBadPath),
                Asset::Issued(issue) => {
                    self.push_account(account, Asset::issued(issue.currency, account))
                }
            },
            Some(Node::Offer(prev)) => match prev.book.out_asset {
                Asset::Native => self.push_account(account, Asset::Native),
                Asset::Issued(issue) => {
                    if issue.issuer != account {
                        self.push_account(issue.issuer, prev.book.out_asset)?;
                    }
                    self.push_account(account, Asset::issued(issue.currency, account))
                }
            },
            None => Err(Ter::TemBadPath),
        }
    }

    /// Book from the previous node's asset into `out_asset`
    fn push_book(&mut self, out_asset: Asset) -> Result<(), Ter> {
        let in_asset = match self.last() {
            Some(Node::Account(prev)) => {
                if let Asset::Issued(issue) = prev.asset {
                    if issue.issuer != prev.account {
                        self.push_account(issue.issuer, prev.asset)?;
                    }
                }
                prev.asset
            }
            Some(Node::Offer(prev)) => {
                if prev.book.out_asset.is_native() {
                    self.bridges_native = true;
                }
                prev.book.out_asset
            }
            None => return Err(Ter::TemBadPath),
        };

        if in_asset == out_asset {
            return Err(Ter::TemBadPath);
        }
        let book = Book::new(in_asset, out_asset);
        if !self.seen_books.insert(book) {
            return Err(Ter::TemBadPathLoop);
        }
        self.nodes.push(Node::Offer(OfferNode::new(book)));
        Ok(())
    }

    fn push_book_step(&mut self, currency: Currency, issuer: Option<AccountId>) -> Result<(), Ter> {
        let out_asset = match (currency.is_native(), issuer) {
            (true, None) => Asset::Native,
            (false, Some(issuer)) if !issuer.is_zero() => Asset::issued(currency, issuer),
            _ => return Err(Ter::TemBadPath),
        };
        self.push_book(out_asset)
    }
}

impl PathState {
    /// Build the node list of `path` from `src` to `dst` and validate it
    ///
    /// On failure the status carries the reason: `tem` codes for a malformed
    /// path, `ter` codes for missing ledger state.
    pub fn expand_path(
        &mut self,
        view: &LedgerView,
        path: &Path,
        dst: &AccountId,
        src: &AccountId,
        max_path_steps: usize,
    ) {
        let result = self
            .build_nodes(path, dst, src, max_path_steps)
            .and_then(|()| self.check_ledger(view));
        if let Err(ter) = result {
            self.status = ter;
        }
        tracing::trace!(
            index = self.index,
            nodes = self.nodes.len(),
            status = %self.status,
            "path expanded"
        );
    }

    fn build_nodes(
        &mut self,
        path: &Path,
        dst: &AccountId,
        src: &AccountId,
        max_path_steps: usize,
    ) -> Result<(), Ter> {
        if path.len() > max_path_steps {
            return Err(Ter::TemBadPath);
        }

        let send_asset = *self.in_act.asset();
        let dst_asset = *self.out_req.asset();
        let mut expander = Expander::default();

        expander.push_account(*src, send_asset)?;
        if let Some(issuer) = send_asset.issuer() {
            if issuer != *src && path.first() != Some(&PathStep::Account(issuer)) {
                expander.push_account_step(issuer)?;
            }
        }

        for step in path {
            match *step {
                PathStep::Account(account) => expander.push_account_step(account)?,
                PathStep::Book { currency, issuer } => expander.push_book_step(currency, issuer)?,
            }
        }

        let last = expander.last().ok_or(Ter::TemBadPath)?;
        let (last_is_offer, last_asset, last_account) =
            (last.is_offer(), last.asset(), last.account());

        // Implied book into the requested asset
        let third_party_issuer = dst_asset.issuer().filter(|issuer| issuer != dst);
        let needs_book = last_asset.currency() != dst_asset.currency()
            || (last_is_offer
                && third_party_issuer.is_some()
                && last_asset.issuer() != third_party_issuer);
        if needs_book {
            expander.push_book(dst_asset)?;
        } else if let Some(issuer) = third_party_issuer {
            if !last_is_offer && last_account != issuer {
                expander.push_account_step(issuer)?;
            }
        }
        expander.push_account_step(*dst)?;

        self.nodes = expander.nodes;
        self.bridges_native = expander.bridges_native;
        Ok(())
    }

    fn check_ledger(&self, view: &LedgerView) -> Result<(), Ter> {
        for node in &self.nodes {
            if let Node::Account(node) = node {
                if view.account_root(&node.account)?.is_none() {
                    return Err(Ter::TerNoAccount);
                }
            }
        }

        for pair in self.nodes.windows(2) {
            if let (Node::Account(from), Node::Account(to)) = (&pair[0], &pair[1]) {
                let currency = from.asset.currency();
                if view.trust_line(&from.account, &to.account, &currency)?.is_none() {
                    return Err(Ter::TerNoLine);
                }
            }
        }
        Ok(())
    }

    /// Reject a path through an account that forbids rippling on both sides
    pub fn check_no_ripple(&mut self, view: &LedgerView) {
        if let Err(ter) = self.no_ripple_status(view) {
            tracing::debug!(index = self.index, "path blocked by no-ripple flag");
            self.status = ter;
        }
    }

    fn no_ripple_status(&self, view: &LedgerView) -> Result<(), Ter> {
        for window in self.nodes.windows(3) {
            if let (Node::Account(prev), Node::Account(cur), Node::Account(next)) =
                (&window[0], &window[1], &window[2])
            {
                let currency = cur.asset.currency();
                let inbound = view.trust_line(&prev.account, &cur.account, &currency)?;
                let outbound = view.trust_line(&cur.account, &next.account, &currency)?;
                if let (Some(inbound), Some(outbound)) = (inbound, outbound) {
                    if inbound.no_ripple(&cur.account) && outbound.no_ripple(&cur.account) {
                        return Err(Ter::TerNoRipple);
                    }
                }
            }
        }
        Ok(())
    }

    /// Reject a path touching a globally frozen issuer or a frozen line
    pub fn check_freeze(&mut self, view: &LedgerView) {
        if let Err(ter) = self.freeze_status(view) {
            tracing::debug!(index = self.index, "path blocked by freeze");
            self.frozen = ter == Ter::TerNoLine;
            self.status = ter;
        }
    }

    fn freeze_status(&self, view: &LedgerView) -> Result<(), Ter> {
        let globally_frozen = |account: &AccountId| -> Result<bool, Ter> {
            Ok(view
                .account_root(account)?
                .map(|root| root.global_freeze)
                .unwrap_or(false))
        };

        for node in &self.nodes {
            if let Some(issuer) = node.asset().issuer() {
                if globally_frozen(&issuer)? {
                    return Err(Ter::TerNoLine);
                }
            }
        }

        for pair in self.nodes.windows(2) {
            if let (Node::Account(from), Node::Account(to)) = (&pair[0], &pair[1]) {
                if from.account == to.account {
                    continue;
                }
                if globally_frozen(&to.account)? {
                    return Err(Ter::TerNoLine);
                }
                let currency = from.asset.currency();
                if let Some(line) = view.trust_line(&from.account, &to.account, &currency)? {
                    if line.frozen_by(&to.account) {
                        return Err(Ter::TerNoLine);
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::SendMax;
    use ledger_core::{AccountRoot, Amount, TrustLine};
    use rust_decimal::Decimal;

    fn usd() -> Currency {
        Currency::new(*b"USD")
    }

    fn eur() -> Currency {
        Currency::new(*b"EUR")
    }

    fn id(name: &str) -> AccountId {
        AccountId::from_name(name)
    }

    fn ledger(accounts: &[&str], lines: &[(&str, &str, Currency)]) -> LedgerView {
        let mut view = LedgerView::new();
        for name in accounts {
            view.insert_account(AccountRoot::new(id(name), Decimal::from(1000)))
                .unwrap();
        }
        for (a, b, currency) in lines {
            let mut line = TrustLine::new(id(a), id(b), *currency);
            line.set_limit(&id(a), Decimal::from(1000));
            line.set_limit(&id(b), Decimal::from(1000));
            view.insert_trust_line(line).unwrap();
        }
        view
    }

    fn expand(view: &LedgerView, dst_amount: Amount, send_max: SendMax, path: Path) -> PathState {
        let mut state = PathState::new(&dst_amount, &send_max);
        state.expand_path(view, &path, &id("bob"), &id("alice"), 8);
        state
    }

    fn accounts(state: &PathState) -> Vec<AccountId> {
        state.nodes().iter().map(|node| node.account()).collect()
    }

    #[test]
    fn test_default_direct_path() {
        let view = ledger(&["alice", "bob"], &[("alice", "bob", usd())]);
        let amount = Amount::issued(Decimal::from(50), usd(), id("alice"));
        let state = expand(&view, amount, SendMax::Unlimited(*amount.asset()), Path::new());
        assert_eq!(state.status(), Ter::Success);
        assert_eq!(accounts(&state), vec![id("alice"), id("bob")]);
    }

    #[test]
    fn test_issuers_inserted_around_book() {
        let view = ledger(
            &["alice", "bob", "gwE", "gwU"],
            &[("alice", "gwE", eur()), ("gwU", "bob", usd())],
        );
        let amount = Amount::issued(Decimal::from(50), usd(), id("gwU"));
        let send_max = SendMax::Unlimited(Asset::issued(eur(), id("gwE")));
        let state = expand(&view, amount, send_max, Path::new());
        assert_eq!(state.status(), Ter::Success);
        assert_eq!(
            accounts(&state),
            vec![id("alice"), id("gwE"), AccountId::ZERO, id("gwU"), id("bob")]
        );
        assert!(!state.bridges_native());
    }

    #[test]
    fn test_native_bridge_between_books() {
        let view = ledger(
            &["alice", "bob", "gwE", "gwU"],
            &[("alice", "gwE", eur()), ("gwU", "bob", usd())],
        );
        let amount = Amount::issued(Decimal::from(50), usd(), id("gwU"));
        let send_max = SendMax::Unlimited(Asset::issued(eur(), id("gwE")));
        let path = vec![PathStep::native_book(), PathStep::book(usd(), id("gwU"))];
        let state = expand(&view, amount, send_max, path);
        assert_eq!(state.status(), Ter::Success);
        assert!(state.bridges_native());
        assert_eq!(state.nodes().iter().filter(|node| node.is_offer()).count(), 2);
    }

    #[test]
    fn test_native_through_account_is_malformed() {
        let view = ledger(&["alice", "bob", "carol"], &[]);
        let amount = Amount::issued(Decimal::from(50), usd(), id("bob"));
        let path = vec![PathStep::Account(id("carol"))];
        let state = expand(&view, amount, SendMax::Unlimited(Asset::Native), path);
        assert_eq!(state.status(), Ter::TemBadPath);
    }

    #[test]
    fn test_repeated_account_is_loop() {
        let view = ledger(&["alice", "bob", "carol"], &[]);
        let amount = Amount::issued(Decimal::from(50), usd(), id("alice"));
        let path = vec![PathStep::Account(id("carol")), PathStep::Account(id("carol"))];
        let state = expand(&view, amount, SendMax::Unlimited(*amount.asset()), path);
        assert_eq!(state.status(), Ter::TemBadPathLoop);
    }

    #[test]
    fn test_book_issuer_must_match_nativeness() {
        let view = ledger(&["alice", "bob"], &[]);
        let amount = Amount::issued(Decimal::from(50), usd(), id("alice"));
        let path = vec![PathStep::Book {
            currency: eur(),
            issuer: None,
        }];
        let state = expand(&view, amount, SendMax::Unlimited(*amount.asset()), path);
        assert_eq!(state.status(), Ter::TemBadPath);
    }

    #[test]
    fn test_too_many_steps() {
        let view = ledger(&["alice", "bob"], &[]);
        let amount = Amount::issued(Decimal::from(50), usd(), id("alice"));
        let path: Path = (0..9).map(|i| PathStep::Account(id(&format!("hop{}", i)))).collect();
        let state = expand(&view, amount, SendMax::Unlimited(*amount.asset()), path);
        assert_eq!(state.status(), Ter::TemBadPath);
    }

    #[test]
    fn test_missing_line_and_account() {
        let view = ledger(&["alice", "bob"], &[]);
        let amount = Amount::issued(Decimal::from(50), usd(), id("alice"));
        let state = expand(&view, amount, SendMax::Unlimited(*amount.asset()), Path::new());
        assert_eq!(state.status(), Ter::TerNoLine);

        let view = ledger(&["alice"], &[]);
        let state = expand(&view, amount, SendMax::Unlimited(*amount.asset()), Path::new());
        assert_eq!(state.status(), Ter::TerNoAccount);
    }

    #[test]
    fn test_no_ripple_on_both_sides_blocks() {
        let mut view = ledger(
            &["alice", "bob", "carol"],
            &[("alice", "carol", usd()), ("carol", "bob", usd())],
        );
        for other in ["alice", "bob"] {
            let mut line = view
                .trust_line(&id("carol"), &id(other), &usd())
                .unwrap()
                .unwrap()
                .clone();
            line.set_no_ripple(&id("carol"), true);
            view.entry_modify(ledger_core::LedgerEntry::TrustLine(line)).unwrap();
        }

        // Destination takes any issuer it trusts
        let amount = Amount::issued(Decimal::from(50), usd(), id("bob"));
        let mut state = expand(
            &view,
            amount,
            SendMax::Unlimited(Asset::issued(usd(), id("alice"))),
            vec![PathStep::Account(id("carol"))],
        );
        assert_eq!(state.status(), Ter::Success);
        state.check_no_ripple(&view);
        assert_eq!(state.status(), Ter::TerNoRipple);
    }

    #[test]
    fn test_frozen_line_blocks() {
        let mut view = ledger(&["alice", "bob"], &[("alice", "bob", usd())]);
        let mut line = view.trust_line(&id("alice"), &id("bob"), &usd()).unwrap().unwrap().clone();
        line.set_freeze(&id("bob"), true);
        view.entry_modify(ledger_core::LedgerEntry::TrustLine(line)).unwrap();

        let amount = Amount::issued(Decimal::from(50), usd(), id("alice"));
        let mut state = expand(&view, amount, SendMax::Unlimited(*amount.asset()), Path::new());
        state.check_freeze(&view);
        assert_eq!(state.status(), Ter::TerNoLine);
        assert!(state.frozen());
    }
}
