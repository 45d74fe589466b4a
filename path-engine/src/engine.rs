//! Payment engine facade

use crate::calc::{self, CalcOutput};
use crate::config::Config;
use crate::metrics::Metrics;
use crate::request::PaymentRequest;
use crate::Result;
use ledger_core::LedgerView;

/// Routes payments with a fixed configuration
#[derive(Debug, Clone)]
pub struct PaymentEngine {
    config: Config,
    metrics: Option<Metrics>,
}

impl PaymentEngine {
    /// Create engine without metrics
    pub fn new(config: Config) -> Self {
        Self {
            config,
            metrics: None,
        }
    }

    /// Create engine with metrics under the configured namespace
    ///
    /// Metrics stay off when disabled in the configuration.
    pub fn from_config(config: Config) -> Result<Self> {
        let metrics = if config.metrics.enabled {
            Some(Metrics::with_namespace(&config.metrics.namespace)?)
        } else {
            None
        };
        Ok(Self { config, metrics })
    }

    /// Attach a metrics collector
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Get configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get metrics collector
    pub fn metrics(&self) -> Option<&Metrics> {
        self.metrics.as_ref()
    }

    /// Route `request` over `view`
    ///
    /// On `tesSUCCESS` the view holds the payment; on any other result it is
    /// unchanged.
    pub fn calculate(&self, view: &mut LedgerView, request: &PaymentRequest) -> CalcOutput {
        tracing::debug!(
            src = %request.src,
            dst = %request.dst,
            amount = %request.dst_amount,
            paths = request.paths.len(),
            "Calculating payment"
        );

        let output = calc::calculate(view, request, &self.config.calc);

        if let Some(metrics) = &self.metrics {
            metrics.record_calculation(output.result, output.passes);
            metrics.record_increments(output.increments);
            metrics.record_offers_deleted(output.offers_deleted as u64);
        }

        if tracing::enabled!(tracing::Level::TRACE) {
            match serde_json::to_string(&output.summary()) {
                Ok(summary) => tracing::trace!(%summary, "Payment calculation summary"),
                Err(e) => tracing::warn!("Failed to serialize calculation summary: {}", e),
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::SendMax;
    use ledger_core::{AccountId, AccountRoot, Amount, Asset, Currency, TrustLine};
    use rust_decimal::Decimal;

    fn setup() -> (LedgerView, PaymentRequest) {
        let alice = AccountId::from_name("alice");
        let bob = AccountId::from_name("bob");
        let usd = Currency::new(*b"USD");

        let mut view = LedgerView::new();
        view.insert_account(AccountRoot::new(alice, Decimal::from(100))).unwrap();
        view.insert_account(AccountRoot::new(bob, Decimal::from(100))).unwrap();
        let mut line = TrustLine::new(alice, bob, usd);
        line.set_limit(&bob, Decimal::from(100));
        view.insert_trust_line(line).unwrap();

        let request = PaymentRequest::new(
            alice,
            bob,
            Amount::issued(Decimal::from(25), usd, alice),
            SendMax::Unlimited(Asset::issued(usd, alice)),
        );
        (view, request)
    }

    #[test]
    fn test_engine_records_metrics() {
        let (mut view, request) = setup();
        let engine = PaymentEngine::from_config(Config::default()).unwrap();

        let output = engine.calculate(&mut view, &request);
        assert!(output.result.is_success());

        let metrics = engine.metrics().unwrap();
        assert_eq!(
            metrics.calculations_total.with_label_values(&["success"]).get(),
            1
        );
        assert_eq!(metrics.increments_total.get(), output.increments);
    }

    #[test]
    fn test_engine_without_metrics() {
        let (mut view, request) = setup();
        let mut config = Config::default();
        config.metrics.enabled = false;
        let engine = PaymentEngine::from_config(config).unwrap();
        assert!(engine.metrics().is_none());

        let output = engine.calculate(&mut view, &request);
        assert_eq!(output.actual_amount_out.value(), Decimal::from(25));
    }
}
