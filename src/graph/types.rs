//! Payment records and the graph vertices/edges derived from them.

use chrono::{DateTime, Utc};
use egui::{Color32, Pos2, Vec2};
use serde::{Deserialize, Serialize};

/// Settlement status of a payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "pending_approval")]
    Pending,
    #[serde(rename = "processing_settlement")]
    Processing,
    #[serde(rename = "settled")]
    Settled,
    #[serde(rename = "failed")]
    Failed,
    #[serde(rename = "canceled")]
    Canceled,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 5] = [
        PaymentStatus::Pending,
        PaymentStatus::Processing,
        PaymentStatus::Settled,
        PaymentStatus::Failed,
        PaymentStatus::Canceled,
    ];

    /// Edge stroke color for this status
    pub fn color(&self) -> Color32 {
        match self {
            PaymentStatus::Settled => crate::theme::status::SETTLED,
            PaymentStatus::Processing => crate::theme::status::PROCESSING,
            PaymentStatus::Pending => crate::theme::status::PENDING,
            PaymentStatus::Failed => crate::theme::status::FAILED,
            PaymentStatus::Canceled => crate::theme::status::CANCELED,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Processing => "Processing",
            PaymentStatus::Settled => "Settled",
            PaymentStatus::Failed => "Failed",
            PaymentStatus::Canceled => "Canceled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UserKind {
    #[serde(rename = "First Adopter")]
    FirstAdopter,
    Partner,
    #[default]
    Client,
}

/// Payer of a payment; `id` may be a UUID or a blockchain address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: UserKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Amount {
    pub amount_in_tokens: f64,
    pub amount_in_usd_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SettlementData {
    pub status: String,
    pub tx_id: Option<String>,
    pub blockchain_tx_hash: Option<String>,
    pub settled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Vec<String>,
    pub block_number: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceStatus {
    Success,
    Failure,
}

/// One hop of a payment through the settlement pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingTrace {
    pub service: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    pub status: TraceStatus,
    #[serde(default)]
    pub details: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiFlag {
    pub reason: String,
}

/// A single debit payment and its simulated settlement state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Transaction hash
    pub id: String,
    pub user: User,
    /// Retailer id or purchase description; doubles as the retailer node key
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_payment_type")]
    pub payment_type: String,
    #[serde(default)]
    pub amount: Amount,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub settlement_data: SettlementData,
    #[serde(default)]
    pub routing_trace: Vec<RoutingTrace>,
    pub priority: Priority,
    #[serde(rename = "transactionDataHash", default)]
    pub transaction_data_hash: String,
    #[serde(rename = "complianceDataHash", default)]
    pub compliance_data_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_flag: Option<AiFlag>,
    /// Originates from the real-time event feed rather than mock data
    #[serde(rename = "isLive", default)]
    pub is_live: bool,
}

fn default_payment_type() -> String {
    "debit".to_string()
}

impl Payment {
    /// Both graph keys are present
    pub fn is_well_formed(&self) -> bool {
        !self.user.id.is_empty() && !self.description.is_empty()
    }
}

/// Category of a graph vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    User,
    Retailer,
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::User => "User",
            NodeKind::Retailer => "Retailer",
        }
    }
}

/// A user or retailer vertex with its simulation state
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub pos: Pos2,
    pub vel: Vec2,
    /// Set by anomaly detection
    pub highlighted: bool,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: NodeKind, pos: Pos2) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            pos,
            vel: Vec2::ZERO,
            highlighted: false,
        }
    }
}

/// One payment drawn between its user node and retailer node
#[derive(Debug, Clone)]
pub struct GraphEdge {
    /// Payment id
    pub id: String,
    pub source: String,
    pub target: String,
    pub payment: Payment,
    /// Entrance pulse pending; cleared by the first projection that sees it
    pub is_new: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payment_with_wire_field_names() {
        let json = r#"{
            "id": "0xabc",
            "user": {"id": "0x1a2b", "name": "Nexus Dynamics", "type": "First Adopter"},
            "description": "Retailer ID: A78-2B",
            "payment_type": "debit",
            "amount": {"amount_in_tokens": 120.0, "amount_in_usd_cents": 120},
            "status": "processing_settlement",
            "created_at": "2025-06-01T10:00:00Z",
            "updated_at": "2025-06-01T10:00:05Z",
            "settlement_data": {"status": "pending", "tx_id": null, "blockchain_tx_hash": null,
                                "settled_at": null, "notes": [], "block_number": 18000001},
            "routing_trace": [],
            "priority": "High",
            "transactionDataHash": "0x01",
            "complianceDataHash": "0x02",
            "isLive": true
        }"#;
        let payment: Payment = serde_json::from_str(json).unwrap();
        assert_eq!(payment.status, PaymentStatus::Processing);
        assert_eq!(payment.user.kind, UserKind::FirstAdopter);
        assert!(payment.is_live);
        assert!(payment.is_well_formed());
    }

    #[test]
    fn test_missing_description_is_not_well_formed() {
        let json = r#"{
            "id": "0xdef",
            "user": {"id": "0x1a2b", "name": "Cygnus Corp"},
            "status": "settled",
            "created_at": "2025-06-01T10:00:00Z",
            "updated_at": "2025-06-01T10:00:00Z",
            "priority": "Low"
        }"#;
        let payment: Payment = serde_json::from_str(json).unwrap();
        assert!(!payment.is_live);
        assert!(!payment.is_well_formed());
    }
}
