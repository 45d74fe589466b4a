//! Working state of one candidate path
//!
//! A [`PathState`] is created once per candidate path, expanded and checked
//! during the building phase, then reset and re-evaluated on every pass
//! until it goes dry. Its ledger view is private: the orchestrator either
//! takes it as the new shared view or drops it.

use crate::path::node::Node;
use crate::request::SendMax;
use crate::ter::Ter;
use ledger_core::{Amount, EntryIndex, LedgerView, Quality};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// State of one path across the passes of a calculation
#[derive(Debug, Clone)]
pub struct PathState {
    pub(crate) index: usize,
    pub(crate) status: Ter,
    pub(crate) nodes: Vec<Node>,

    /// Amount the destination should receive overall
    pub(crate) out_req: Amount,
    /// Amount the source may send overall; `None` when unlimited
    pub(crate) in_req: Option<Amount>,

    /// Totals already committed in earlier passes
    pub(crate) in_act: Amount,
    pub(crate) out_act: Amount,

    /// This increment
    pub(crate) in_pass: Amount,
    pub(crate) out_pass: Amount,

    /// `None` once the path is dry
    pub(crate) quality: Option<Quality>,

    pub(crate) unfunded_offers: BTreeSet<EntryIndex>,
    /// Offers the reverse pass found empty or unfunded in the shared view
    pub(crate) stale_offers: BTreeSet<EntryIndex>,
    pub(crate) multi_quality: bool,
    pub(crate) bridges_native: bool,
    pub(crate) frozen: bool,
    pub(crate) view: Option<LedgerView>,
}

impl PathState {
    /// Create an unexpanded path state for a request
    pub fn new(dst_amount: &Amount, send_max: &SendMax) -> Self {
        let in_zero = Amount::zero(send_max.asset());
        Self {
            index: 0,
            status: Ter::Success,
            nodes: Vec::new(),
            out_req: *dst_amount,
            in_req: send_max.limit().copied(),
            in_act: in_zero,
            out_act: dst_amount.zeroed(),
            in_pass: in_zero,
            out_pass: dst_amount.zeroed(),
            quality: Some(Quality::ONE),
            unfunded_offers: BTreeSet::new(),
            stale_offers: BTreeSet::new(),
            multi_quality: false,
            bridges_native: false,
            frozen: false,
            view: None,
        }
    }

    /// Position in the calculation's path list; the tie-break of last resort
    pub fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// Status of expansion or of the last increment
    pub fn status(&self) -> Ter {
        self.status
    }

    /// Expanded nodes
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Quality of the last increment; `None` when dry
    pub fn quality(&self) -> Option<Quality> {
        self.quality
    }

    /// True once the path yields nothing more
    pub fn is_dry(&self) -> bool {
        self.quality.is_none()
    }

    /// Input of the last increment
    pub fn in_pass(&self) -> &Amount {
        &self.in_pass
    }

    /// Output of the last increment
    pub fn out_pass(&self) -> &Amount {
        &self.out_pass
    }

    /// Offers found unfunded or emptied by the last increment
    pub fn unfunded_offers(&self) -> &BTreeSet<EntryIndex> {
        &self.unfunded_offers
    }

    /// Offers found empty or unfunded before the last increment moved value
    ///
    /// These are removed on success even when the path is not committed.
    pub fn stale_offers(&self) -> &BTreeSet<EntryIndex> {
        &self.stale_offers
    }

    /// Path crosses from a native output book into another book
    pub fn bridges_native(&self) -> bool {
        self.bridges_native
    }

    /// Path was rejected for touching a frozen line
    pub fn frozen(&self) -> bool {
        self.frozen
    }

    /// Remaining output still wanted
    pub(crate) fn out_remaining(&self) -> rust_decimal::Decimal {
        self.out_req.value() - self.out_act.value()
    }

    /// Remaining input allowed; `None` when unlimited
    pub(crate) fn in_remaining(&self) -> Option<rust_decimal::Decimal> {
        self.in_req
            .as_ref()
            .map(|max| max.value() - self.in_act.value())
    }

    /// Clear the last increment, seeded with the totals committed so far
    pub fn reset(&mut self, in_total: &Amount, out_total: &Amount) {
        self.in_act = *in_total;
        self.out_act = *out_total;
        self.in_pass = in_total.zeroed();
        self.out_pass = out_total.zeroed();
        self.unfunded_offers.clear();
        self.stale_offers.clear();
        self.multi_quality = false;
        self.view = None;
        for node in &mut self.nodes {
            node.clear();
        }
    }

    /// Every book on the path ran out of offers during the last increment
    ///
    /// A path without books never runs out this way.
    pub fn all_liquidity_consumed(&self) -> bool {
        let mut offers = self.nodes.iter().filter_map(|node| match node {
            Node::Offer(offer) => Some(offer),
            Node::Account(_) => None,
        });
        let first = match offers.next() {
            Some(offer) => offer,
            None => return false,
        };
        first.exhausted && offers.all(|offer| offer.exhausted)
    }

    /// Mark the path permanently dry
    pub(crate) fn set_dry(&mut self) {
        self.quality = None;
    }

    /// Take the private view produced by the last increment
    pub(crate) fn take_view(&mut self) -> Option<LedgerView> {
        self.view.take()
    }

    /// True if `lhs` should be chosen after `rhs`
    ///
    /// Lower quality wins, then the larger output, then the lower index.
    pub fn less_priority(lhs: &PathState, rhs: &PathState) -> bool {
        match lhs.quality.cmp(&rhs.quality) {
            Ordering::Greater => return true,
            Ordering::Less => return false,
            Ordering::Equal => {}
        }
        match lhs.out_pass.value().cmp(&rhs.out_pass.value()) {
            Ordering::Less => return true,
            Ordering::Greater => return false,
            Ordering::Equal => {}
        }
        lhs.index > rhs.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{AccountId, Asset, Currency};
    use rust_decimal::Decimal;

    fn state(index: usize, rate: i64, out: i64) -> PathState {
        let usd = Amount::issued(Decimal::from(100), Currency::new(*b"USD"), AccountId::from_name("gw"));
        let mut state = PathState::new(&usd, &SendMax::Unlimited(Asset::Native));
        state.set_index(index);
        state.quality = Quality::from_rate(Decimal::new(rate, 1));
        state.out_pass = usd.with_value(Decimal::from(out));
        state
    }

    #[test]
    fn test_less_priority_quality_first() {
        let cheap = state(1, 10, 5);
        let dear = state(0, 12, 50);
        assert!(PathState::less_priority(&dear, &cheap));
        assert!(!PathState::less_priority(&cheap, &dear));
    }

    #[test]
    fn test_less_priority_ties() {
        let small = state(0, 10, 5);
        let large = state(1, 10, 50);
        assert!(PathState::less_priority(&small, &large));

        let first = state(0, 10, 5);
        let second = state(1, 10, 5);
        assert!(PathState::less_priority(&second, &first));
        assert!(!PathState::less_priority(&first, &second));
    }

    #[test]
    fn test_reset_keeps_quality_and_clears_pass() {
        let mut path = state(0, 10, 5);
        let total_in = Amount::native(Decimal::from(7));
        let total_out = path.out_req.with_value(Decimal::from(9));
        path.reset(&total_in, &total_out);
        assert!(path.out_pass().is_zero());
        assert_eq!(path.out_remaining(), Decimal::from(91));
        assert_eq!(path.in_remaining(), None);
        assert!(!path.is_dry());
    }

    #[test]
    fn test_no_books_never_consumes_all_liquidity() {
        let path = state(0, 10, 5);
        assert!(!path.all_liquidity_consumed());
    }
}
