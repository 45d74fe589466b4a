//! Forward pass: move value from the source downstream

use super::book::{apply_crossing, plan_crossing, Crossing, Inflow};
use super::PathCursor;
use crate::path::Node;
use crate::ter::Ter;
use crate::transfer::{credit_holder, hop_capacity, ripple_credit};
use ledger_core::{AccountId, Book, LedgerView};
use rust_decimal::Decimal;

impl PathCursor<'_> {
    /// Deliver the source's reverse amount through every node
    pub(super) fn forward_pass(&mut self, view: &mut LedgerView) -> Result<(), Ter> {
        let send = {
            let source = self.account_node_mut(0)?;
            source.fwd_deliver = source.rev_out;
            source.rev_out
        };
        if send.is_zero() {
            return Ok(());
        }
        for index in 1..self.state.nodes.len() {
            self.forward_liquidity(view, index)?;
        }
        Ok(())
    }

    fn forward_liquidity(&mut self, view: &mut LedgerView, index: usize) -> Result<(), Ter> {
        if self.state.nodes[index].is_account() {
            return self.forward_liquidity_for_account(view, index);
        }

        // Books after a book were driven by the first book of their chain
        let sender = self.state.nodes[index - 1].account();
        if sender.is_zero() {
            return Ok(());
        }

        let delivered = self.account_node(index - 1)?.fwd_deliver;
        let (principal, fees) = self.deliver_node_forward(view, index, sender, delivered)?;
        let used = principal.checked_add(fees).ok_or(Ter::TefInternal)?;
        if used < delivered {
            self.refund_run(view, index - 1, delivered - used)?;
        }

        let remaining = self.account_node(index - 1)?.fwd_deliver;
        if remaining != used {
            tracing::error!(
                path = self.state.index,
                node = index,
                %remaining,
                %used,
                "book input does not match amount delivered"
            );
            return Err(Ter::TefInternal);
        }
        Ok(())
    }

    fn forward_liquidity_for_account(
        &mut self,
        view: &mut LedgerView,
        index: usize,
    ) -> Result<(), Ter> {
        let (from, incoming, currency) = match &self.state.nodes[index - 1] {
            // Credited when the book chain was delivered
            Node::Offer(_) => return Ok(()),
            Node::Account(prev) => (prev.account, prev.fwd_deliver, prev.asset.currency()),
        };
        let to = self.account_node(index)?.account;

        let capacity = hop_capacity(view, &from, &to, &currency)?;
        let amount = incoming.min(capacity);
        if amount < incoming {
            self.refund_run(view, index - 1, incoming - amount)?;
        }
        ripple_credit(view, &from, &to, &currency, amount)?;
        self.account_node_mut(index)?.fwd_deliver = amount;
        Ok(())
    }

    /// Cross the chain of books starting at `start`, paid by `sender`
    ///
    /// Returns the principal and fees taken from `sender` by the first book.
    fn deliver_node_forward(
        &mut self,
        view: &mut LedgerView,
        start: usize,
        sender: AccountId,
        amount: Decimal,
    ) -> Result<(Decimal, Decimal), Ter> {
        let nodes = &self.state.nodes;
        let end = (start..nodes.len())
            .find(|&index| nodes[index].is_account())
            .ok_or(Ter::TefInternal)?;
        let chain: Vec<(usize, Book)> = (start..end)
            .map(|index| match &nodes[index] {
                Node::Offer(offer) => Ok((index, offer.book)),
                Node::Account(_) => Err(Ter::TefInternal),
            })
            .collect::<Result<_, _>>()?;
        let mut caps: Vec<Decimal> = (start..end)
            .map(|index| match &nodes[index] {
                Node::Offer(offer) => offer.rev_out,
                Node::Account(_) => Decimal::ZERO,
            })
            .collect();

        // A book that takes less than its predecessor gives lowers that
        // predecessor's cap; each retry lowers one cap.
        let mut plans = self.plan_chain(view, &chain, &caps, sender, amount)?;
        for _ in 0..chain.len() * 2 {
            let short = (1..plans.len()).find(|&k| plans[k].gross_in() < plans[k - 1].out);
            match short {
                Some(k) => {
                    caps[k - 1] = plans[k].gross_in();
                    plans = self.plan_chain(view, &chain, &caps, sender, amount)?;
                }
                None => break,
            }
        }
        for k in 1..plans.len() {
            if plans[k].gross_in() < plans[k - 1].out {
                tracing::warn!(
                    path = self.state.index,
                    node = chain[k].0,
                    stranded = %(plans[k - 1].out - plans[k].gross_in()),
                    "value left with issuer between books"
                );
            }
        }

        let mut inflow = Inflow::Account(sender);
        for ((index, book), plan) in chain.iter().zip(&plans) {
            apply_crossing(view, book, inflow, plan, &mut self.state.unfunded_offers)?;
            let node = self.offer_node_mut(*index)?;
            node.fwd_in = plan.gross_in();
            node.fwd_out = plan.out;
            node.exhausted = plan.exhausted;
            if plan.tier.is_some() {
                node.tier = plan.tier;
            }
            inflow = Inflow::Limbo;
        }

        let last_out = plans.last().map(|plan| plan.out).ok_or(Ter::TefInternal)?;
        let last_book = chain.last().map(|(_, book)| *book).ok_or(Ter::TefInternal)?;
        let receiver = self.account_node(end)?.account;
        credit_holder(view, &receiver, &last_book.out_asset, last_out)?;
        self.account_node_mut(end)?.fwd_deliver = last_out;

        let first = plans.first().ok_or(Ter::TefInternal)?;
        Ok((first.principal, first.fees))
    }

    fn plan_chain(
        &self,
        view: &LedgerView,
        chain: &[(usize, Book)],
        caps: &[Decimal],
        sender: AccountId,
        amount: Decimal,
    ) -> Result<Vec<Crossing>, Ter> {
        let mut plans = Vec::with_capacity(chain.len());
        let mut inflow = Inflow::Account(sender);
        let mut input = amount;
        for ((_, book), cap) in chain.iter().zip(caps) {
            let plan = plan_crossing(view, book, inflow, *cap, Some(input), self.multi_quality)?;
            input = plan.out;
            inflow = Inflow::Limbo;
            plans.push(plan);
        }
        Ok(plans)
    }

    /// Hand `excess` back up the run of accounts ending at `last`
    fn refund_run(&mut self, view: &mut LedgerView, last: usize, excess: Decimal) -> Result<(), Ter> {
        let mut index = last;
        loop {
            let node = self.account_node_mut(index)?;
            node.fwd_deliver -= excess;
            let (account, currency) = (node.account, node.asset.currency());
            if index == 0 {
                return Ok(());
            }
            match &self.state.nodes[index - 1] {
                Node::Account(prev) => {
                    ripple_credit(view, &account, &prev.account, &currency, excess)?;
                }
                Node::Offer(_) => {
                    tracing::warn!(
                        path = self.state.index,
                        node = index,
                        %excess,
                        "excess held after book"
                    );
                    return Ok(());
                }
            }
            index -= 1;
        }
    }
}
