//! The resolution-gateway seam.
//!
//! The move-resolution algorithm (supports, convoys, dislodgement mechanics)
//! is an external collaborator consumed as an opaque function from an order
//! batch to per-unit outcomes. It has no notion of unit identity, ghosts, or
//! card provenance; the session reconstructs all of that after each call.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::unit::UnitKind;

/// One per-unit outcome from a resolution pass.
///
/// `unit` names the unit by its origin position, `"NATION K REGION"`; the
/// session matches it back to a canonical unit case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitOutcome {
    pub unit: String,
    pub order: String,
    pub succeeded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dislodged_by: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub retreat_options: Vec<String>,
    #[serde(default)]
    pub explanation: String,
    pub new_position: String,
}

impl UnitOutcome {
    /// Splits the `"NATION K REGION"` unit field into its parts.
    pub fn unit_parts(&self) -> Option<(&str, UnitKind, &str)> {
        let mut tokens = self.unit.split_whitespace();
        let nation = tokens.next()?;
        let kind = UnitKind::from_letter(tokens.next()?.chars().next()?)?;
        let region = tokens.next()?;
        if tokens.next().is_some() {
            return None;
        }
        Some((nation, kind, region))
    }
}

/// Failure reported by a gateway implementation.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("resolution gateway failure: {0}")]
pub struct GatewayError(pub String);

/// An opaque move resolver: a complete order batch in, one outcome per unit
/// out.
///
/// Implementations must be side-effect-free with respect to session state;
/// the session never hands a gateway a live reference it may mutate.
pub trait ResolutionGateway {
    fn resolve(&self, orders: &[String]) -> Result<Vec<UnitOutcome>, GatewayError>;
}
