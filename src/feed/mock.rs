//! Synthetic payments for running the dashboard without a chain connection.

use crate::graph::types::{
    AiFlag, Amount, Payment, PaymentStatus, Priority, RoutingTrace, SettlementData, TraceStatus, User,
    UserKind,
};
use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::json;

/// Retailer ids used as payment descriptions
pub const RETAILERS: [&str; 4] = [
    "Retailer ID: A78-2B",
    "Retailer ID: C45-9Z",
    "Retailer ID: X99-1A",
    "Retailer ID: F23-5G",
];

const USERS: [(&str, UserKind); 4] = [
    ("Nexus Dynamics", UserKind::Partner),
    ("Cygnus Corp", UserKind::Client),
    ("Stellar Goods", UserKind::FirstAdopter),
    ("Orion Merchants", UserKind::Client),
];

const PRIORITIES: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

/// Chance that a generated payment carries an AI review flag
const AI_FLAG_PROBABILITY: f64 = 0.1;

/// Oldest generated payment, in days
const MAX_AGE_DAYS: i64 = 30;

/// `0x` followed by `len` random hex digits
pub fn random_hex<R: Rng>(rng: &mut R, len: usize) -> String {
    const DIGITS: &[u8] = b"0123456789abcdef";
    let mut out = String::with_capacity(len + 2);
    out.push_str("0x");
    for _ in 0..len {
        out.push(DIGITS[rng.gen_range(0..DIGITS.len())] as char);
    }
    out
}

/// Generates payments for a fixed cast of four users
#[derive(Debug, Clone)]
pub struct MockPaymentGenerator {
    users: Vec<User>,
}

impl MockPaymentGenerator {
    /// Users get fresh random addresses on every run
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        let users = USERS
            .iter()
            .map(|(name, kind)| User {
                id: random_hex(rng, 40),
                name: name.to_string(),
                kind: *kind,
            })
            .collect();
        Self { users }
    }

    #[cfg(test)]
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// One payment created some time in the last month
    pub fn payment<R: Rng>(&self, rng: &mut R, now: DateTime<Utc>) -> Payment {
        let status = *PaymentStatus::ALL.choose(rng).unwrap_or(&PaymentStatus::Pending);
        let user = self
            .users
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| User {
                id: random_hex(rng, 40),
                name: String::new(),
                kind: UserKind::default(),
            });
        let description = RETAILERS.choose(rng).copied().unwrap_or(RETAILERS[0]);
        let created_at = now - Duration::milliseconds(rng.gen_range(0..MAX_AGE_DAYS * 24 * 60 * 60 * 1000));
        let settled = status == PaymentStatus::Settled;

        Payment {
            id: random_hex(rng, 64),
            user,
            description: description.to_string(),
            payment_type: "debit".to_string(),
            amount: Amount {
                amount_in_tokens: f64::from(rng.gen_range(100u32..5100)),
                amount_in_usd_cents: rng.gen_range(1_000i64..501_000),
            },
            status,
            created_at,
            updated_at: created_at + Duration::milliseconds(rng.gen_range(0..100_000)),
            settlement_data: SettlementData {
                status: if settled { "confirmed" } else { "pending" }.to_string(),
                tx_id: settled.then(|| random_hex(rng, 64)),
                blockchain_tx_hash: settled.then(|| random_hex(rng, 64)),
                settled_at: settled.then_some(now),
                notes: if status == PaymentStatus::Failed {
                    vec!["Network congestion timeout".to_string()]
                } else {
                    Vec::new()
                },
                block_number: rng.gen_range(18_000_000u64..19_000_000),
            },
            routing_trace: vec![
                RoutingTrace {
                    service: "API Gateway".to_string(),
                    action: "receive_payment_request".to_string(),
                    timestamp: created_at,
                    status: TraceStatus::Success,
                    details: json!({ "ip": "192.168.1.1" }),
                },
                RoutingTrace {
                    service: "Compliance Engine".to_string(),
                    action: "verify_transaction".to_string(),
                    timestamp: created_at + Duration::seconds(1),
                    status: TraceStatus::Success,
                    details: json!({ "check": "passed" }),
                },
            ],
            priority: *PRIORITIES.choose(rng).unwrap_or(&Priority::Medium),
            transaction_data_hash: random_hex(rng, 64),
            compliance_data_hash: random_hex(rng, 64),
            ai_flag: rng.gen_bool(AI_FLAG_PROBABILITY).then(|| AiFlag {
                reason: "Unusual transaction amount for this user.".to_string(),
            }),
            is_live: false,
        }
    }

    /// `count` payments, newest first
    pub fn initial_batch<R: Rng>(&self, count: usize, rng: &mut R, now: DateTime<Utc>) -> Vec<Payment> {
        let mut payments: Vec<Payment> = (0..count).map(|_| self.payment(rng, now)).collect();
        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        payments
    }
}
