//! Unit identity, kinds, and per-phase snapshots.
//!
//! A unit's `UnitId` is the only correlation key that survives a resolution
//! pass: the external resolver reports outcomes by position, so positional
//! keys go stale as soon as a unit moves.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque stable identifier for a unit.
///
/// Assigned once at creation and never reused for the lifetime of the
/// session, ghost units included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(pub u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// The kind of a military unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    #[serde(rename = "A")]
    Army,
    #[serde(rename = "F")]
    Fleet,
}

impl UnitKind {
    /// Returns the single-letter order-notation abbreviation.
    pub const fn letter(self) -> char {
        match self {
            UnitKind::Army => 'A',
            UnitKind::Fleet => 'F',
        }
    }

    /// Parses a unit kind from its order-notation letter, case-insensitively.
    pub fn from_letter(c: char) -> Option<UnitKind> {
        match c.to_ascii_uppercase() {
            'A' => Some(UnitKind::Army),
            'F' => Some(UnitKind::Fleet),
            _ => None,
        }
    }
}

/// Post-resolution status of a unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    #[default]
    Ok,
    Dislodged,
    Disbanded,
}

/// A unit plus its transient per-phase annotations.
///
/// Created fresh each time the session calls the resolution gateway. Once a
/// snapshot list is committed to history it is never mutated again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub id: UnitId,
    /// Owning nation, e.g. `"FRA"`. Ghost origins may carry a suffix such as
    /// `"FRA_MERC"`; the resolver treats the suffixed form as a distinct
    /// nation string.
    pub nation: String,
    pub kind: UnitKind,
    /// Current location, a board-graph node identifier like `"par"`.
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(default)]
    pub status: UnitStatus,
    #[serde(default)]
    pub succeeded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dislodged_by: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub retreat_options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default)]
    pub is_ghost: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl UnitSnapshot {
    /// Creates a plain unit with no order and no annotations.
    pub fn new(id: UnitId, nation: &str, kind: UnitKind, region: &str) -> Self {
        UnitSnapshot {
            id,
            nation: nation.to_string(),
            kind,
            region: region.to_string(),
            order: None,
            status: UnitStatus::Ok,
            succeeded: false,
            dislodged_by: None,
            retreat_options: Vec::new(),
            explanation: None,
            is_ghost: false,
            tag: None,
        }
    }

    /// Case-insensitive positional key, `"nation:kind:region"`.
    ///
    /// Valid only until the unit moves; used to reattach ids to resolver
    /// outcomes, which are keyed by origin position.
    pub fn position_key(&self) -> String {
        position_key(&self.nation, self.kind, &self.region)
    }

    /// The order-notation prefix naming this unit, e.g. `"FRA: A par"`.
    pub fn order_prefix(&self) -> String {
        format!("{}: {} {}", self.nation, self.kind.letter(), self.region)
    }
}

/// Builds the case-insensitive positional key for `(nation, kind, region)`.
pub fn position_key(nation: &str, kind: UnitKind, region: &str) -> String {
    format!("{}:{}:{}", nation, kind.letter(), region).to_lowercase()
}
