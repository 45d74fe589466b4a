//! Reverse pass: size each node from the destination back to the source

use super::book::{plan_crossing, Inflow};
use super::PathCursor;
use crate::path::Node;
use crate::ter::Ter;
use crate::transfer::hop_capacity;
use ledger_core::LedgerView;

impl PathCursor<'_> {
    /// Fill in `rev_out` of accounts and `rev_in`/`rev_out` of books
    ///
    /// Each node asks no more than its downstream neighbour still needs. The
    /// source finally caps the request with its remaining send limit and,
    /// for native sends, its balance.
    pub(super) fn reverse_pass(&mut self, view: &LedgerView) -> Result<(), Ter> {
        let out_remaining = self.state.out_remaining();
        let in_remaining = self.state.in_remaining();
        let multi_quality = self.multi_quality;
        let mut stale = Vec::new();
        let nodes = &mut self.state.nodes;
        let last = nodes.len().checked_sub(1).ok_or(Ter::TefInternal)?;

        let mut want = out_remaining;
        match &mut nodes[last] {
            Node::Account(destination) => destination.rev_out = want,
            Node::Offer(_) => return Err(Ter::TefInternal),
        }

        for index in (0..last).rev() {
            let next_account = match &nodes[index + 1] {
                Node::Account(next) => Some(next.account),
                Node::Offer(_) => None,
            };
            let inflow = match index.checked_sub(1).map(|prev| &nodes[prev]) {
                Some(Node::Account(prev)) => Inflow::Account(prev.account),
                _ => Inflow::Limbo,
            };

            match &mut nodes[index] {
                Node::Offer(offer) => {
                    let crossing =
                        plan_crossing(view, &offer.book, inflow, want, None, multi_quality)?;
                    offer.rev_out = crossing.out;
                    offer.rev_in = crossing.gross_in();
                    offer.tier = crossing.tier;
                    want = crossing.gross_in();
                    stale.extend(crossing.stale);
                }
                Node::Account(account) => {
                    if let Some(next) = next_account {
                        let capacity = hop_capacity(
                            view,
                            &account.account,
                            &next,
                            &account.asset.currency(),
                        )?;
                        want = want.min(capacity);
                    }
                    account.rev_out = want;
                }
            }
        }

        if let Node::Account(source) = &mut nodes[0] {
            let mut send = source.rev_out;
            if let Some(limit) = in_remaining {
                send = send.min(limit.max(rust_decimal::Decimal::ZERO));
            }
            if source.asset.is_native() {
                send = send.min(view.native_balance(&source.account)?.value());
            }
            source.rev_out = send.max(rust_decimal::Decimal::ZERO);
            tracing::trace!(path = self.state.index, send = %source.rev_out, "reverse pass done");
        }
        self.state.stale_offers.extend(stale);
        Ok(())
    }
}
