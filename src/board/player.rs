//! Player roster and card inventories.
//!
//! The roster determines which nations may act during the card phase. Card
//! counts, gold, and victory points are informational until an economy
//! module exists; handlers log deltas instead of mutating a ledger.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Per-nation session state outside the unit list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub nation: String,
    /// Card type -> remaining count.
    #[serde(default)]
    pub cards: HashMap<String, u32>,
    #[serde(default)]
    pub gold: u32,
    #[serde(default)]
    pub vp: u32,
}

impl PlayerState {
    /// Creates a player holding the given cards.
    pub fn new(nation: &str, cards: &[(&str, u32)]) -> Self {
        PlayerState {
            nation: nation.to_string(),
            cards: cards
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            gold: 0,
            vp: 0,
        }
    }

    /// True if this player holds at least one card of any type.
    pub fn has_cards(&self) -> bool {
        self.cards.values().any(|&count| count > 0)
    }
}

/// The default three-player roster.
pub fn default_roster() -> HashMap<String, PlayerState> {
    let players = [
        PlayerState::new("FRA", &[("MERCENARY", 1)]),
        PlayerState::new("ENG", &[("MERCENARY", 1), ("GOLD_BONUS", 1)]),
        PlayerState::new("GER", &[]),
    ];
    players
        .into_iter()
        .map(|p| (p.nation.clone(), p))
        .collect()
}
