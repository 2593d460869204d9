//! Simulated settlement pipeline for mock payments.

use crate::graph::types::{Payment, PaymentStatus};
use chrono::{DateTime, Utc};
use rand::Rng;

/// Chance per tick that a pending payment starts processing
const START_PROBABILITY: f64 = 0.2;

/// Chance per tick that a processing payment resolves
const RESOLVE_PROBABILITY: f64 = 0.3;

/// Share of resolutions that fail
const FAILURE_SHARE: f64 = 0.1;

/// Advance every non-live payment at most one step along
/// pending → processing → settled | failed.
///
/// Returns how many payments changed. Live payments are already final.
pub fn advance_settlements<R: Rng>(payments: &mut [Payment], rng: &mut R, now: DateTime<Utc>) -> usize {
    let mut changed = 0;
    for payment in payments.iter_mut().filter(|p| !p.is_live) {
        match payment.status {
            PaymentStatus::Pending if rng.gen_bool(START_PROBABILITY) => {
                payment.status = PaymentStatus::Processing;
                payment.updated_at = now;
                changed += 1;
            }
            PaymentStatus::Processing if rng.gen_bool(RESOLVE_PROBABILITY) => {
                let failed = rng.gen_bool(FAILURE_SHARE);
                payment.status = if failed {
                    PaymentStatus::Failed
                } else {
                    PaymentStatus::Settled
                };
                payment.updated_at = now;
                let settlement = &mut payment.settlement_data;
                settlement.status = if failed { "reverted" } else { "confirmed" }.to_string();
                settlement.blockchain_tx_hash = Some(payment.id.clone());
                settlement.settled_at = Some(now);
                changed += 1;
            }
            _ => {}
        }
    }
    changed
}
