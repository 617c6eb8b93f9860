//! Immutable per-phase history records.

use serde::{Deserialize, Serialize};

use crate::cards::CardOrder;

use super::unit::UnitSnapshot;

/// The full unit list at one `(turn, phase)` point, plus the card orders
/// resolved at that point when there were any.
///
/// Owned exclusively by the session's history map; once a key is written its
/// value is never replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSnapshot {
    pub units: Vec<UnitSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub card_orders: Vec<CardOrder>,
}

impl PhaseSnapshot {
    /// A snapshot carrying only units.
    pub fn units_only(units: Vec<UnitSnapshot>) -> Self {
        PhaseSnapshot {
            units,
            card_orders: Vec::new(),
        }
    }

    /// A snapshot carrying units and the card orders resolved alongside them.
    pub fn with_cards(units: Vec<UnitSnapshot>, card_orders: Vec<CardOrder>) -> Self {
        PhaseSnapshot { units, card_orders }
    }
}
