//! Phase identifiers and the turn+phase history key.
//!
//! The key's string form `"<turn>-<phase>"` is part of the external
//! contract: observers reconstruct ordering by parsing the turn as an
//! integer and ranking phases by `PHASE_PRIORITY`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The phase within a game turn.
///
/// `OrdersResolved` is transient: the session never waits in it, it only
/// names the committed post-card resolution snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Orders,
    CardOrders,
    OrdersResolved,
    Retreats,
}

/// Phase ranking used when searching backward for the latest known state.
pub const PHASE_PRIORITY: [Phase; 4] = [
    Phase::OrdersResolved,
    Phase::Retreats,
    Phase::Orders,
    Phase::CardOrders,
];

impl Phase {
    /// Returns the canonical key segment for this phase.
    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::Orders => "orders",
            Phase::CardOrders => "card_orders",
            Phase::OrdersResolved => "orders_resolved",
            Phase::Retreats => "retreats",
        }
    }

    /// Parses a phase from its canonical key segment.
    pub fn from_key_segment(s: &str) -> Option<Phase> {
        match s {
            "orders" => Some(Phase::Orders),
            "card_orders" => Some(Phase::CardOrders),
            "orders_resolved" => Some(Phase::OrdersResolved),
            "retreats" => Some(Phase::Retreats),
            _ => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The current position in the phase cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseInfo {
    pub turn: u32,
    pub phase: Phase,
}

/// Composite `(turn, phase)` key addressing one immutable history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PhaseKey {
    pub turn: u32,
    pub phase: Phase,
}

impl PhaseKey {
    pub const fn new(turn: u32, phase: Phase) -> Self {
        PhaseKey { turn, phase }
    }
}

impl fmt::Display for PhaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.turn, self.phase)
    }
}

impl From<PhaseKey> for String {
    fn from(key: PhaseKey) -> String {
        key.to_string()
    }
}

/// Errors from parsing a `"<turn>-<phase>"` key string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhaseKeyError {
    #[error("missing '-' separator in phase key '{0}'")]
    MissingSeparator(String),

    #[error("invalid turn number '{0}'")]
    InvalidTurn(String),

    #[error("unknown phase '{0}'")]
    UnknownPhase(String),
}

impl FromStr for PhaseKey {
    type Err = PhaseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (turn, phase) = s
            .split_once('-')
            .ok_or_else(|| PhaseKeyError::MissingSeparator(s.to_string()))?;
        let turn = turn
            .parse::<u32>()
            .map_err(|_| PhaseKeyError::InvalidTurn(turn.to_string()))?;
        let phase = Phase::from_key_segment(phase)
            .ok_or_else(|| PhaseKeyError::UnknownPhase(phase.to_string()))?;
        Ok(PhaseKey { turn, phase })
    }
}

impl TryFrom<String> for PhaseKey {
    type Error = PhaseKeyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
