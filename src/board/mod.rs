//! Board-level data types.
//!
//! Contains the core data structures for units, phases, players, and the
//! immutable per-phase snapshots that make up session history.

pub mod phase;
pub mod player;
pub mod snapshot;
pub mod unit;

pub use phase::{Phase, PhaseInfo, PhaseKey, PhaseKeyError, PHASE_PRIORITY};
pub use player::{default_roster, PlayerState};
pub use snapshot::PhaseSnapshot;
pub use unit::{position_key, UnitId, UnitKind, UnitSnapshot, UnitStatus};
