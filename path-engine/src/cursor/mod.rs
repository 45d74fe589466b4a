//! Liquidity evaluation of one path
//!
//! A [`PathCursor`] computes the next increment of a path against a
//! checkpoint of the shared view. The reverse pass walks from the
//! destination to the source sizing what every node could pass, the forward
//! pass then moves value from the source downstream in a private copy of the
//! view, so the increment can be committed or discarded as a whole.

pub(crate) mod book;
mod forward;
mod reverse;

use crate::path::{AccountNode, Node, OfferNode, PathState};
use crate::ter::Ter;
use ledger_core::{LedgerView, Quality};

/// Evaluates increments of one path
#[derive(Debug)]
pub struct PathCursor<'a> {
    state: &'a mut PathState,
    multi_quality: bool,
}

impl<'a> PathCursor<'a> {
    /// Cursor over `state`; `multi_quality` lets books cross several tiers
    pub fn new(state: &'a mut PathState, multi_quality: bool) -> Self {
        Self {
            state,
            multi_quality,
        }
    }

    /// Compute the next increment of the path
    ///
    /// The result lands in the path state: its pass amounts, quality, the
    /// offers found unfunded and the private view holding the applied
    /// increment. A failure sets the path status and marks it dry.
    pub fn next_increment(&mut self, checkpoint: &LedgerView) {
        let mut view = checkpoint.checkpoint();
        self.state.multi_quality = self.multi_quality;

        let result = self
            .reverse_pass(checkpoint)
            .and_then(|()| self.forward_pass(&mut view));

        match result {
            Ok(()) => self.settle(),
            Err(ter) => {
                tracing::debug!(path = self.state.index, result = %ter, "increment failed");
                self.state.status = ter;
                self.state.set_dry();
            }
        }
        self.state.view = Some(view);
    }

    fn settle(&mut self) {
        let delivered_in = self
            .state
            .nodes
            .first()
            .and_then(Self::delivered)
            .unwrap_or_default();
        let delivered_out = self
            .state
            .nodes
            .last()
            .and_then(Self::delivered)
            .unwrap_or_default();

        self.state.in_pass = self.state.in_act.with_value(delivered_in);
        self.state.out_pass = self.state.out_act.with_value(delivered_out);
        self.state.quality = Quality::from_values(delivered_in, delivered_out);

        tracing::trace!(
            path = self.state.index,
            in_pass = %self.state.in_pass,
            out_pass = %self.state.out_pass,
            quality = ?self.state.quality,
            "increment computed"
        );
    }

    fn delivered(node: &Node) -> Option<rust_decimal::Decimal> {
        match node {
            Node::Account(account) => Some(account.fwd_deliver),
            Node::Offer(_) => None,
        }
    }

    fn account_node(&self, index: usize) -> Result<&AccountNode, Ter> {
        match self.state.nodes.get(index) {
            Some(Node::Account(node)) => Ok(node),
            _ => Err(Ter::TefInternal),
        }
    }

    fn account_node_mut(&mut self, index: usize) -> Result<&mut AccountNode, Ter> {
        match self.state.nodes.get_mut(index) {
            Some(Node::Account(node)) => Ok(node),
            _ => Err(Ter::TefInternal),
        }
    }

    fn offer_node_mut(&mut self, index: usize) -> Result<&mut OfferNode, Ter> {
        match self.state.nodes.get_mut(index) {
            Some(Node::Offer(node)) => Ok(node),
            _ => Err(Ter::TefInternal),
        }
    }
}
