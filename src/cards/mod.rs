//! Card orders and the per-phase card queue.

pub mod handlers;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::board::unit::UnitSnapshot;

pub use handlers::{handler_for, CardError, CardHandler, CardHost};

/// One played card.
///
/// `metadata` is an opaque bag interpreted by the card's handler. `unit` is
/// set when the card creates or targets a unit; it is rebound in place to
/// the post-resolution unit once ghost identity is confirmed, and the order
/// is discarded after its handler runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardOrder {
    pub nation: String,
    pub card_type: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<UnitSnapshot>,
}

impl CardOrder {
    /// A card order with no metadata and no unit.
    pub fn new(nation: &str, card_type: &str) -> Self {
        CardOrder {
            nation: nation.to_string(),
            card_type: card_type.to_string(),
            metadata: Map::new(),
            unit: None,
        }
    }

    /// Reads a string field from the metadata bag.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// Reads an integer field from the metadata bag.
    pub fn metadata_u64(&self, key: &str) -> Option<u64> {
        self.metadata.get(key).and_then(Value::as_u64)
    }
}

/// Queue of card orders for the current card phase.
///
/// Orders are kept in submission order; handlers run over the queue nation
/// by nation exactly as submitted. A nation that submits an empty list has
/// passed, which still counts toward completeness.
#[derive(Debug, Default)]
pub struct CardQueue {
    orders: Vec<CardOrder>,
    submitted: HashSet<String>,
}

impl CardQueue {
    pub fn new() -> Self {
        CardQueue::default()
    }

    /// Records a nation's card orders (possibly none) for this phase
    /// instance.
    pub fn submit(&mut self, nation: &str, orders: Vec<CardOrder>) {
        self.orders.extend(orders);
        self.submitted.insert(nation.to_string());
    }

    pub fn orders(&self) -> &[CardOrder] {
        &self.orders
    }

    pub fn has_submitted(&self, nation: &str) -> bool {
        self.submitted.contains(nation)
    }

    /// Removes the queue for handler application; `restore` puts the
    /// (possibly rebound) orders back so they can be committed to history.
    pub fn take(&mut self) -> Vec<CardOrder> {
        std::mem::take(&mut self.orders)
    }

    pub fn restore(&mut self, orders: Vec<CardOrder>) {
        self.orders = orders;
    }

    /// Resets the queue and the submitted set for a new phase instance.
    pub fn clear(&mut self) {
        self.orders.clear();
        self.submitted.clear();
    }
}
