//! Source of the ordered payment list shown by the graph.
//!
//! Mock payments progress through settlement on a timer and live purchase
//! events are prepended as they arrive. The app polls once per frame.

pub mod live;
pub mod mock;
pub mod settlement;

use live::LiveEventSimulator;
use mock::MockPaymentGenerator;
use settlement::advance_settlements;

use crate::graph::types::Payment;
use anyhow::Context;
use chrono::Utc;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Feed timing and size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Payments generated at startup when no seed file is given
    pub mock_payment_count: usize,
    pub settlement_interval_secs: f64,
    pub live_enabled: bool,
    pub live_interval_secs: f64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            mock_payment_count: 25,
            settlement_interval_secs: 3.0,
            live_enabled: true,
            live_interval_secs: 8.0,
        }
    }
}

/// Read a JSON array of payments
pub fn load_payments(path: &Path) -> anyhow::Result<Vec<Payment>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read payments from {}", path.display()))?;
    let payments: Vec<Payment> =
        serde_json::from_str(&raw).with_context(|| format!("invalid payment JSON in {}", path.display()))?;
    Ok(payments)
}

pub struct PaymentFeed {
    payments: Vec<Payment>,
    config: FeedConfig,
    live: LiveEventSimulator,
    rng: StdRng,
    last_settlement: f64,
    last_live: f64,
    paused: bool,
}

impl PaymentFeed {
    /// Feed seeded with freshly generated mock payments
    pub fn mock(config: FeedConfig, mut rng: StdRng) -> Self {
        let generator = MockPaymentGenerator::new(&mut rng);
        let payments = generator.initial_batch(config.mock_payment_count, &mut rng, Utc::now());
        Self::with_payments(payments, config, rng)
    }

    pub fn with_payments(payments: Vec<Payment>, config: FeedConfig, mut rng: StdRng) -> Self {
        tracing::info!(
            payments = payments.len(),
            live = config.live_enabled,
            "payment feed started"
        );
        Self {
            payments,
            live: LiveEventSimulator::new(&mut rng),
            config,
            rng,
            last_settlement: 0.0,
            last_live: 0.0,
            paused: false,
        }
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// New payments go to the front of the list
    pub fn push_live(&mut self, payment: Payment) {
        tracing::info!(id = %payment.id, user = %payment.user.name, "live payment received");
        self.payments.insert(0, payment);
    }

    /// Run whatever timers are due at `now` (seconds since app start).
    /// Returns whether the payment list changed.
    pub fn poll(&mut self, now: f64) -> bool {
        if self.paused {
            // Don't let a long pause fire a burst of catch-up ticks
            self.last_settlement = now;
            self.last_live = now;
            return false;
        }

        let mut changed = false;
        if now - self.last_settlement >= self.config.settlement_interval_secs {
            self.last_settlement = now;
            let advanced = advance_settlements(&mut self.payments, &mut self.rng, Utc::now());
            if advanced > 0 {
                tracing::debug!(advanced, "settlements progressed");
                changed = true;
            }
        }

        if self.config.live_enabled && now - self.last_live >= self.config.live_interval_secs {
            self.last_live = now;
            let event = self.live.next_event(&mut self.rng, Utc::now());
            let payment = event.into_payment(&mut self.rng);
            self.push_live(payment);
            changed = true;
        }
        changed
    }
}
