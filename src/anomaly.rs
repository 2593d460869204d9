//! Rule-based anomaly detection over the payment list.
//!
//! Flagged users are highlighted on the graph and listed in the side panel.

use crate::graph::types::{Payment, PaymentStatus};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Failed payments a user needs before the failure rate is considered
    pub min_failures: usize,
    /// Failed share of a user's payments that counts as anomalous
    pub failure_rate: f32,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            min_failures: 2,
            failure_rate: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnomalyReason {
    RepeatedFailures { failed: usize, total: usize },
    AiFlagged { payment_id: String, reason: String },
}

impl fmt::Display for AnomalyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyReason::RepeatedFailures { failed, total } => {
                write!(f, "{failed} of {total} payments failed")
            }
            AnomalyReason::AiFlagged { reason, .. } => write!(f, "AI flag: {reason}"),
        }
    }
}

/// A user that tripped at least one rule
#[derive(Debug, Clone, PartialEq)]
pub struct Anomaly {
    pub user_id: String,
    pub user_name: String,
    pub reasons: Vec<AnomalyReason>,
}

#[derive(Default)]
struct UserTally<'a> {
    name: &'a str,
    total: usize,
    failed: usize,
    flags: Vec<AnomalyReason>,
}

/// Users tripping a rule, in order of their first payment in the list
pub fn detect(payments: &[Payment], config: &AnomalyConfig) -> Vec<Anomaly> {
    let mut order: Vec<&str> = Vec::new();
    let mut tallies: HashMap<&str, UserTally> = HashMap::new();

    for payment in payments.iter().filter(|p| p.is_well_formed()) {
        let tally = tallies.entry(payment.user.id.as_str()).or_insert_with(|| {
            order.push(payment.user.id.as_str());
            UserTally {
                name: payment.user.name.as_str(),
                ..UserTally::default()
            }
        });
        tally.total += 1;
        if payment.status == PaymentStatus::Failed {
            tally.failed += 1;
        }
        if let Some(flag) = &payment.ai_flag {
            tally.flags.push(AnomalyReason::AiFlagged {
                payment_id: payment.id.clone(),
                reason: flag.reason.clone(),
            });
        }
    }

    order
        .into_iter()
        .filter_map(|id| {
            let tally = tallies.remove(id)?;
            let mut reasons = Vec::new();
            let rate = tally.failed as f32 / tally.total as f32;
            if tally.failed >= config.min_failures && rate >= config.failure_rate {
                reasons.push(AnomalyReason::RepeatedFailures {
                    failed: tally.failed,
                    total: tally.total,
                });
            }
            reasons.extend(tally.flags);
            (!reasons.is_empty()).then(|| Anomaly {
                user_id: id.to_string(),
                user_name: tally.name.to_string(),
                reasons,
            })
        })
        .collect()
}

/// Node ids to highlight for a set of anomalies
pub fn highlighted_ids(anomalies: &[Anomaly]) -> HashSet<String> {
    anomalies.iter().map(|a| a.user_id.clone()).collect()
}
