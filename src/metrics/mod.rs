mod server;

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

use crate::domain::Money;

pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for the ledger
// ============================================================================
//
// Tracks:
// - Checkout outcomes and latency
// - Stock reservation refusals and low-stock alerts
// - Order and return state transitions
// - Refund volume
//
// Scraped via /metrics on the metrics server.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Checkout
    pub checkouts_total: IntCounterVec,
    pub checkout_duration: Histogram,

    // Inventory
    pub stock_reservation_failures: IntCounter,
    pub low_stock_alerts: IntCounter,

    // Lifecycles
    pub order_transitions: IntCounterVec,
    pub return_transitions: IntCounterVec,

    // Refunds
    pub refunds_completed: IntCounter,
    pub refunded_amount_minor: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let checkouts_total = IntCounterVec::new(
            Opts::new("checkouts_total", "Checkout attempts by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(checkouts_total.clone()))?;

        let checkout_duration = Histogram::with_opts(
            HistogramOpts::new("checkout_duration_seconds", "End-to-end checkout duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;
        registry.register(Box::new(checkout_duration.clone()))?;

        let stock_reservation_failures = IntCounter::new(
            "stock_reservation_failures_total",
            "Reservations refused for insufficient stock",
        )?;
        registry.register(Box::new(stock_reservation_failures.clone()))?;

        let low_stock_alerts = IntCounter::new(
            "low_stock_alerts_total",
            "Committed checkouts that left a product below its critical level",
        )?;
        registry.register(Box::new(low_stock_alerts.clone()))?;

        let order_transitions = IntCounterVec::new(
            Opts::new("order_transitions_total", "Order status transitions"),
            &["from", "to"],
        )?;
        registry.register(Box::new(order_transitions.clone()))?;

        let return_transitions = IntCounterVec::new(
            Opts::new("return_transitions_total", "Return status transitions"),
            &["from", "to"],
        )?;
        registry.register(Box::new(return_transitions.clone()))?;

        let refunds_completed = IntCounter::new("refunds_completed_total", "Refunds written to the ledger")?;
        registry.register(Box::new(refunds_completed.clone()))?;

        let refunded_amount_minor = IntCounter::new(
            "refunded_amount_minor_total",
            "Sum of refunded amounts in minor currency units",
        )?;
        registry.register(Box::new(refunded_amount_minor.clone()))?;

        Ok(Self {
            registry,
            checkouts_total,
            checkout_duration,
            stock_reservation_failures,
            low_stock_alerts,
            order_transitions,
            return_transitions,
            refunds_completed,
            refunded_amount_minor,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_checkout(&self, outcome: &str, duration_secs: f64) {
        self.checkouts_total.with_label_values(&[outcome]).inc();
        self.checkout_duration.observe(duration_secs);
    }

    pub fn record_reservation_failure(&self) {
        self.stock_reservation_failures.inc();
    }

    pub fn record_low_stock_alert(&self) {
        self.low_stock_alerts.inc();
    }

    pub fn record_order_transition(&self, from: &str, to: &str) {
        self.order_transitions.with_label_values(&[from, to]).inc();
    }

    pub fn record_return_transition(&self, from: &str, to: &str) {
        self.return_transitions.with_label_values(&[from, to]).inc();
    }

    /// Amounts below zero are counted as zero.
    pub fn record_refund(&self, amount: Money) {
        self.refunds_completed.inc();
        self.refunded_amount_minor.inc_by(amount.minor_units().max(0) as u64);
    }
}
