//! Live purchase events and their conversion to payments.
//!
//! Events are shaped like a decoded `BurnForPurchase` contract log. Without a
//! chain connection [`LiveEventSimulator`] stands in for the listener.

use super::mock::{random_hex, RETAILERS};
use crate::graph::types::{
    Amount, Payment, PaymentStatus, Priority, RoutingTrace, SettlementData, TraceStatus, User, UserKind,
};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::json;

/// Token amounts on chain carry 18 decimals
const TOKEN_DECIMALS: i32 = 18;

/// Distinct purchasers the simulator cycles through
const PURCHASER_POOL: usize = 6;

/// A decoded purchase burn
#[derive(Debug, Clone, PartialEq)]
pub struct BurnForPurchase {
    pub transaction_hash: String,
    pub purchaser: String,
    /// Raw token units
    pub amount: u128,
    pub retailer_id: String,
    pub transaction_data_hash: String,
    pub compliance_data_hash: String,
    pub block_number: u64,
    pub block_time: DateTime<Utc>,
}

/// `0x1234...abcd` form of an address; short inputs pass through
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

impl BurnForPurchase {
    /// Settled, live payment for this event. Priority is not on chain, so it is drawn at random.
    pub fn into_payment<R: Rng>(self, rng: &mut R) -> Payment {
        let tokens = self.amount as f64 / 10f64.powi(TOKEN_DECIMALS);
        let details = json!({
            "purchaser": self.purchaser,
            "amount": self.amount.to_string(),
            "retailerId": self.retailer_id,
            "transactionDataHash": self.transaction_data_hash,
            "optionalComplianceDataHash": self.compliance_data_hash,
        });

        Payment {
            id: self.transaction_hash.clone(),
            user: User {
                name: short_address(&self.purchaser),
                id: self.purchaser,
                kind: UserKind::Client,
            },
            description: self.retailer_id,
            payment_type: "debit".to_string(),
            amount: Amount {
                amount_in_tokens: tokens,
                amount_in_usd_cents: tokens.round() as i64,
            },
            status: PaymentStatus::Settled,
            created_at: self.block_time,
            updated_at: self.block_time,
            settlement_data: SettlementData {
                status: "confirmed".to_string(),
                tx_id: Some(self.transaction_hash.clone()),
                blockchain_tx_hash: Some(self.transaction_hash),
                settled_at: Some(self.block_time),
                notes: vec![format!("Confirmed in block #{}", self.block_number)],
                block_number: self.block_number,
            },
            routing_trace: vec![RoutingTrace {
                service: "POSCreditToken Contract".to_string(),
                action: "burn_for_purchase".to_string(),
                timestamp: self.block_time,
                status: TraceStatus::Success,
                details,
            }],
            priority: *[Priority::High, Priority::Medium, Priority::Low]
                .choose(rng)
                .unwrap_or(&Priority::Medium),
            transaction_data_hash: self.transaction_data_hash,
            compliance_data_hash: self.compliance_data_hash,
            ai_flag: None,
            is_live: true,
        }
    }
}

/// Produces a plausible stream of purchase events
#[derive(Debug, Clone)]
pub struct LiveEventSimulator {
    purchasers: Vec<String>,
    next_block: u64,
}

impl LiveEventSimulator {
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        Self {
            purchasers: (0..PURCHASER_POOL).map(|_| random_hex(rng, 40)).collect(),
            next_block: rng.gen_range(19_000_000..19_500_000),
        }
    }

    pub fn next_event<R: Rng>(&mut self, rng: &mut R, now: DateTime<Utc>) -> BurnForPurchase {
        let block_number = self.next_block;
        self.next_block += rng.gen_range(1..4);
        let purchaser = match self.purchasers.choose(rng) {
            Some(address) => address.clone(),
            None => random_hex(rng, 40),
        };
        let whole_tokens: u128 = rng.gen_range(10..2_000);

        BurnForPurchase {
            transaction_hash: random_hex(rng, 64),
            purchaser,
            amount: whole_tokens * 10u128.pow(TOKEN_DECIMALS as u32),
            retailer_id: RETAILERS.choose(rng).copied().unwrap_or(RETAILERS[0]).to_string(),
            transaction_data_hash: random_hex(rng, 64),
            compliance_data_hash: random_hex(rng, 64),
            block_number,
            block_time: now,
        }
    }
}
