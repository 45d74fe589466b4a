//! Payment calculation
//!
//! A calculation moves through three phases. Building expands and checks
//! every candidate path. Searching runs passes: each live path computes its
//! next increment against the shared view, the best one is committed and its
//! private view becomes the new shared view. Done carries the result code.
//!
//! Any result other than `tesSUCCESS` leaves the caller's view as it was.

use crate::config::CalcConfig;
use crate::cursor::PathCursor;
use crate::path::{Path, PathState};
use crate::request::PaymentRequest;
use crate::ter::Ter;
use ledger_core::{get_rate, Amount, EntryIndex, LedgerView, Quality};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, error, warn};

/// Result of a calculation
#[derive(Debug, Clone)]
pub struct CalcOutput {
    /// Result code
    pub result: Ter,

    /// Total sent by the source
    pub actual_amount_in: Amount,

    /// Total received by the destination
    pub actual_amount_out: Amount,

    /// Every accepted path, in acceptance order
    pub path_states: Vec<PathState>,

    /// Index of the path committed in each pass
    pub committed_paths: Vec<usize>,

    /// Passes run
    pub passes: usize,

    /// Path increments evaluated
    pub increments: u64,

    /// Unfunded or emptied offers removed on success
    pub offers_deleted: usize,
}

impl CalcOutput {
    /// Serializable summary of the calculation
    pub fn summary(&self) -> CalcSummary {
        CalcSummary {
            result: self.result.token(),
            actual_amount_in: self.actual_amount_in.to_string(),
            actual_amount_out: self.actual_amount_out.to_string(),
            passes: self.passes,
            increments: self.increments,
            offers_deleted: self.offers_deleted,
            committed_paths: self.committed_paths.clone(),
            paths: self
                .path_states
                .iter()
                .map(|path| PathSummary {
                    index: path.index(),
                    status: path.status().token(),
                    nodes: path.nodes().len(),
                    quality: path.quality().map(|quality| quality.to_string()),
                    bridges_native: path.bridges_native(),
                    frozen: path.frozen(),
                })
                .collect(),
        }
    }
}

/// Summary of a calculation for logs and telemetry
#[derive(Debug, Clone, Serialize)]
pub struct CalcSummary {
    /// Result token
    pub result: &'static str,
    /// Total sent
    pub actual_amount_in: String,
    /// Total delivered
    pub actual_amount_out: String,
    /// Passes run
    pub passes: usize,
    /// Increments evaluated
    pub increments: u64,
    /// Offers deleted
    pub offers_deleted: usize,
    /// Path committed per pass
    pub committed_paths: Vec<usize>,
    /// Accepted paths
    pub paths: Vec<PathSummary>,
}

/// Summary of one path
#[derive(Debug, Clone, Serialize)]
pub struct PathSummary {
    /// Path index
    pub index: usize,
    /// Status token
    pub status: &'static str,
    /// Expanded node count
    pub nodes: usize,
    /// Quality of the last increment
    pub quality: Option<String>,
    /// Book outputs native into another book
    pub bridges_native: bool,
    /// Touched a frozen line
    pub frozen: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Building,
    Searching,
    Done(Ter),
}

/// Calculation over one request
#[derive(Debug)]
pub struct PaymentCalc<'a> {
    view: &'a mut LedgerView,
    request: &'a PaymentRequest,
    config: &'a CalcConfig,
    phase: Phase,
    path_states: Vec<PathState>,
    actual_in: Amount,
    actual_out: Amount,
    quality_limit: Option<Quality>,
    unfunded_offers: BTreeSet<EntryIndex>,
    stale_offers: BTreeSet<EntryIndex>,
    committed_paths: Vec<usize>,
    passes: usize,
    increments: u64,
}

/// Route `request` over `view`
///
/// On `tesSUCCESS` the view holds the committed increments; otherwise it is
/// left unchanged.
pub fn calculate(
    view: &mut LedgerView,
    request: &PaymentRequest,
    config: &CalcConfig,
) -> CalcOutput {
    PaymentCalc::new(view, request, config).run()
}

impl<'a> PaymentCalc<'a> {
    /// Prepare a calculation
    pub fn new(view: &'a mut LedgerView, request: &'a PaymentRequest, config: &'a CalcConfig) -> Self {
        let quality_limit = match (request.flags.limit_quality, request.send_max.limit()) {
            (true, Some(send_max)) => get_rate(&request.dst_amount, send_max),
            _ => None,
        };
        Self {
            view,
            request,
            config,
            phase: Phase::Building,
            path_states: Vec::new(),
            actual_in: Amount::zero(request.send_max.asset()),
            actual_out: request.dst_amount.zeroed(),
            quality_limit,
            unfunded_offers: BTreeSet::new(),
            stale_offers: BTreeSet::new(),
            committed_paths: Vec::new(),
            passes: 0,
            increments: 0,
        }
    }

    /// Run every phase to completion
    pub fn run(mut self) -> CalcOutput {
        let mut entry_view = self.view.checkpoint();

        let mut result = loop {
            self.phase = match self.phase {
                Phase::Building => match self.build() {
                    Ok(()) => Phase::Searching,
                    Err(ter) => Phase::Done(ter),
                },
                Phase::Searching => match self.search_pass() {
                    Some(ter) => Phase::Done(ter),
                    None => Phase::Searching,
                },
                Phase::Done(ter) => break ter,
            };
        };

        let mut offers_deleted = 0;
        if result.is_success() {
            match self.delete_offers() {
                Ok(count) => offers_deleted = count,
                Err(ter) => result = ter,
            }
        }

        if result == Ter::TelFailedProcessing && !self.request.flags.is_ledger_open {
            result = Ter::TecFailedProcessing;
        }
        if !result.is_success() {
            self.view.swap_with(&mut entry_view);
        }

        debug!(
            result = %result,
            passes = self.passes,
            actual_in = %self.actual_in,
            actual_out = %self.actual_out,
            "Payment calculation finished"
        );

        CalcOutput {
            result,
            actual_amount_in: self.actual_in,
            actual_amount_out: self.actual_out,
            path_states: self.path_states,
            committed_paths: self.committed_paths,
            passes: self.passes,
            increments: self.increments,
            offers_deleted,
        }
    }

    fn build(&mut self) -> Result<(), Ter> {
        let request = self.request;
        if request.dst_amount.is_native() && request.send_max.asset().is_native() {
            return Err(Ter::TemBadSendNative);
        }
        if request.dst_amount.value() <= Decimal::ZERO {
            return Err(Ter::TemBadAmount);
        }
        if let Some(send_max) = request.send_max.limit() {
            if send_max.value() <= Decimal::ZERO {
                return Err(Ter::TemBadAmount);
            }
        }

        let mut remembered = None;
        if request.flags.default_paths_allowed {
            self.add_path_state(&Path::new(), &mut remembered)?;
        } else if request.paths.is_empty() {
            debug!("Payment has no paths and the default path is disallowed");
            return Err(Ter::TemPathsEmpty);
        }
        for path in &request.paths {
            self.add_path_state(path, &mut remembered)?;
        }

        if self.path_states.is_empty() {
            return Err(remembered.unwrap_or(Ter::TerNoLine));
        }
        debug!("Accepted {} of {} paths", self.path_states.len(), request.paths.len());
        Ok(())
    }

    fn add_path_state(&mut self, path: &Path, remembered: &mut Option<Ter>) -> Result<(), Ter> {
        let request = self.request;
        let mut state = PathState::new(&request.dst_amount, &request.send_max);
        state.set_index(self.path_states.len());
        state.expand_path(
            self.view,
            path,
            &request.dst,
            &request.src,
            self.config.max_path_steps,
        );
        if state.status().is_success() {
            state.check_no_ripple(self.view);
        }
        if state.status().is_success() {
            state.check_freeze(self.view);
        }

        debug!(steps = path.len(), status = %state.status(), "Path built");
        match state.status() {
            ter if ter.is_malformed() => Err(ter),
            Ter::Success => {
                self.path_states.push(state);
                Ok(())
            }
            Ter::TerNoLine => Ok(()),
            other => {
                *remembered = Some(other);
                Ok(())
            }
        }
    }

    /// One pass; `Some` once the calculation is decided
    fn search_pass(&mut self) -> Option<Ter> {
        let checkpoint = self.view.checkpoint();
        let mut live = self.path_states.iter().filter(|path| !path.is_dry()).count();
        let mut best: Option<usize> = None;

        for index in 0..self.path_states.len() {
            if self.path_states[index].is_dry() {
                continue;
            }
            let multi_quality = live == 1;
            let path = &mut self.path_states[index];
            path.reset(&self.actual_in, &self.actual_out);
            PathCursor::new(path, multi_quality).next_increment(&checkpoint);
            self.stale_offers.extend(path.stale_offers().iter().copied());
            self.increments += 1;

            debug!(
                path = index,
                quality = ?path.quality(),
                in_pass = %path.in_pass(),
                out_pass = %path.out_pass(),
                "Path increment"
            );

            if path.status().is_fatal() {
                return Some(path.status());
            }
            let quality = match path.quality() {
                None => {
                    live -= 1;
                    continue;
                }
                Some(_) if path.out_pass().is_zero() => {
                    warn!(path = index, "Live path delivered nothing");
                    path.set_dry();
                    live -= 1;
                    continue;
                }
                Some(quality) => quality,
            };

            let within_limit = self.quality_limit.map_or(true, |limit| quality <= limit);
            let better = match best {
                None => true,
                Some(current) => {
                    PathState::less_priority(&self.path_states[current], &self.path_states[index])
                }
            };
            if within_limit && better {
                best = Some(index);
            }
        }

        self.passes += 1;
        debug!(
            pass = self.passes,
            dry = self.path_states.len() - live,
            paths = self.path_states.len(),
            "Pass summary"
        );

        let best = match best {
            Some(best) => best,
            None => return Some(self.no_liquidity_result()),
        };
        if let Err(ter) = self.commit(best) {
            return Some(ter);
        }
        if self.path_states[best].is_dry() {
            live -= 1;
        }

        let requested = self.request.dst_amount.value();
        let delivered = self.actual_out.value();
        if delivered == requested {
            Some(Ter::Success)
        } else if delivered > requested {
            error!(
                "Payment delivered {} when {} was requested",
                self.actual_out, self.request.dst_amount
            );
            Some(Ter::TefException)
        } else if !self.send_max_reached() && live > 0 {
            if self.passes >= self.config.max_passes {
                error!("Payment calculation gave up after {} passes", self.passes);
                Some(Ter::TelFailedProcessing)
            } else {
                None
            }
        } else if !self.request.flags.partial_payment_allowed {
            Some(Ter::TecPathPartial)
        } else {
            Some(Ter::Success)
        }
    }

    fn commit(&mut self, best: usize) -> Result<(), Ter> {
        let path = &mut self.path_states[best];
        let mut view = path.take_view().ok_or(Ter::TefInternal)?;
        self.view.swap_with(&mut view);
        self.unfunded_offers.extend(path.unfunded_offers().iter().copied());
        self.actual_in = self.actual_in.checked_add(path.in_pass())?;
        self.actual_out = self.actual_out.checked_add(path.out_pass())?;
        self.committed_paths.push(best);

        if path.all_liquidity_consumed() || path.multi_quality {
            path.set_dry();
        }
        debug!(path = best, quality = ?path.quality(), "Committed path increment");
        Ok(())
    }

    fn no_liquidity_result(&self) -> Ter {
        if !self.request.flags.partial_payment_allowed {
            Ter::TecPathPartial
        } else if self.actual_out.is_zero() {
            Ter::TecPathDry
        } else {
            Ter::Success
        }
    }

    fn send_max_reached(&self) -> bool {
        self.request
            .send_max
            .limit()
            .map_or(false, |send_max| self.actual_in.value() >= send_max.value())
    }

    /// Remove offers of committed increments, then those any path found stale
    fn delete_offers(&mut self) -> Result<usize, Ter> {
        for index in &self.unfunded_offers {
            self.view.offer_delete(index)?;
        }
        let mut deleted = self.unfunded_offers.len();
        for index in self.stale_offers.difference(&self.unfunded_offers) {
            if self.view.offer(index)?.is_some() {
                self.view.offer_delete(index)?;
                deleted += 1;
            }
        }
        if deleted > 0 {
            debug!(
                committed = self.unfunded_offers.len(),
                stale = deleted - self.unfunded_offers.len(),
                "Deleted unfunded offers"
            );
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{CalcFlags, SendMax};
    use ledger_core::{AccountId, AccountRoot, Asset, Currency, TrustLine};

    fn usd() -> Currency {
        Currency::new(*b"USD")
    }

    fn id(name: &str) -> AccountId {
        AccountId::from_name(name)
    }

    /// alice issues USD to bob, who trusts her for `limit`
    fn direct_view(limit: i64) -> LedgerView {
        let mut view = LedgerView::new();
        view.insert_account(AccountRoot::new(id("alice"), Decimal::from(1000))).unwrap();
        view.insert_account(AccountRoot::new(id("bob"), Decimal::from(1000))).unwrap();
        let mut line = TrustLine::new(id("alice"), id("bob"), usd());
        line.set_limit(&id("bob"), Decimal::from(limit));
        view.insert_trust_line(line).unwrap();
        view.compact();
        view
    }

    fn direct_request(amount: i64) -> PaymentRequest {
        PaymentRequest::new(
            id("alice"),
            id("bob"),
            Amount::issued(Decimal::from(amount), usd(), id("alice")),
            SendMax::Unlimited(Asset::issued(usd(), id("alice"))),
        )
    }

    #[test]
    fn test_native_to_native_rejected() {
        let mut view = direct_view(100);
        let request = PaymentRequest::new(
            id("alice"),
            id("bob"),
            Amount::native(Decimal::from(5)),
            SendMax::Unlimited(Asset::Native),
        );
        let output = calculate(&mut view, &request, &CalcConfig::default());
        assert_eq!(output.result, Ter::TemBadSendNative);
        assert!(view.is_unchanged());
    }

    #[test]
    fn test_non_positive_amounts_rejected() {
        let mut view = direct_view(100);
        let output = calculate(&mut view, &direct_request(0), &CalcConfig::default());
        assert_eq!(output.result, Ter::TemBadAmount);

        let mut request = direct_request(10);
        request.send_max = SendMax::Limited(Amount::issued(Decimal::from(-1), usd(), id("alice")));
        let output = calculate(&mut view, &request, &CalcConfig::default());
        assert_eq!(output.result, Ter::TemBadAmount);
    }

    #[test]
    fn test_empty_paths_without_default() {
        let mut view = direct_view(100);
        let request = direct_request(10).with_flags(CalcFlags {
            default_paths_allowed: false,
            ..CalcFlags::default()
        });
        let output = calculate(&mut view, &request, &CalcConfig::default());
        assert_eq!(output.result, Ter::TemPathsEmpty);
        assert!(output.path_states.is_empty());
    }

    #[test]
    fn test_direct_payment_single_pass() {
        let mut view = direct_view(100);
        let output = calculate(&mut view, &direct_request(50), &CalcConfig::default());
        assert_eq!(output.result, Ter::Success);
        assert_eq!(output.passes, 1);
        assert_eq!(output.committed_paths, vec![0]);
        assert_eq!(output.actual_amount_out.value(), Decimal::from(50));

        let line = view.trust_line(&id("alice"), &id("bob"), &usd()).unwrap().unwrap();
        assert_eq!(line.owed_by(&id("alice")), Decimal::from(50));
    }

    #[test]
    fn test_partial_payment_reports_and_restores() {
        let mut view = direct_view(30);
        let output = calculate(&mut view, &direct_request(50), &CalcConfig::default());
        assert_eq!(output.result, Ter::TecPathPartial);
        assert!(view.is_unchanged());

        let request = direct_request(50).with_flags(CalcFlags {
            partial_payment_allowed: true,
            ..CalcFlags::default()
        });
        let output = calculate(&mut view, &request, &CalcConfig::default());
        assert_eq!(output.result, Ter::Success);
        assert_eq!(output.actual_amount_out.value(), Decimal::from(30));
    }

    #[test]
    fn test_no_line_reported_when_nothing_accepted() {
        let mut view = direct_view(100);
        let request = PaymentRequest::new(
            id("alice"),
            id("carol"),
            Amount::issued(Decimal::from(5), usd(), id("alice")),
            SendMax::Unlimited(Asset::issued(usd(), id("alice"))),
        );
        let output = calculate(&mut view, &request, &CalcConfig::default());
        assert_eq!(output.result, Ter::TerNoAccount);
        assert!(output.path_states.is_empty());
    }

    #[test]
    fn test_offer_deletion_failure_is_terminal() {
        let mut view = direct_view(100);
        let request = direct_request(10);
        let config = CalcConfig::default();

        let mut calc = PaymentCalc::new(&mut view, &request, &config);
        calc.unfunded_offers.insert(ledger_core::offer_index(&id("bob"), 7));
        let output = calc.run();

        assert_eq!(output.result, Ter::TefInternal);
        assert_eq!(output.offers_deleted, 0);
        assert!(view.is_unchanged());
    }

    #[test]
    fn test_summary_serializes() {
        let mut view = direct_view(100);
        let output = calculate(&mut view, &direct_request(10), &CalcConfig::default());
        let json = serde_json::to_string(&output.summary()).unwrap();
        assert!(json.contains("tesSUCCESS"));
        assert!(json.contains("\"committed_paths\":[0]"));
    }
}
