//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Ticket ledger (rejected stock mutations)
//! - Registration and settlement workflows
//! - Payment gateway calls

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Ledger Metrics
// =============================================================================

/// Ledger mutations that matched no row.
pub static LEDGER_REJECTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "boxoffice_ledger_rejections_total",
            "Ledger mutations rejected by their stock precondition",
        ),
        &["operation"], // "book_stock", "confirm_sold", "release_booked", "adjust_total"
    )
    .unwrap()
});

// =============================================================================
// Workflow Metrics
// =============================================================================

/// Registration attempts by result.
pub static REGISTRATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "boxoffice_registrations_total",
            "Total registration attempts",
        ),
        &["result"], // "created", "rejected", "sold_out", "gateway_error", "error"
    )
    .unwrap()
});

/// Settlement notifications by outcome.
pub static SETTLEMENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "boxoffice_settlements_total",
            "Total payment notifications processed",
        ),
        &["outcome"], // "paid", "failed", "expired", "pending", "duplicate", "error"
    )
    .unwrap()
});

// =============================================================================
// Payment Gateway Metrics
// =============================================================================

/// Payment gateway call duration.
pub static PAYMENT_GATEWAY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "boxoffice_payment_gateway_duration_seconds",
            "Duration of payment gateway calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["gateway", "status"], // status: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(LEDGER_REJECTIONS_TOTAL.clone()),
        Box::new(REGISTRATIONS_TOTAL.clone()),
        Box::new(SETTLEMENTS_TOTAL.clone()),
        Box::new(PAYMENT_GATEWAY_DURATION.clone()),
    ]
}
