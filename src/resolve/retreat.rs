//! Retreat-phase resolution.
//!
//! Pure function from the dislodged snapshot and the submitted retreat
//! choices to per-unit results plus the unit list that enters the next turn.
//! If two dislodged units retreat to the same region, both are disbanded.
//! Unordered dislodged units are disbanded by default.

use std::collections::HashMap;

use tracing::warn;

use crate::board::unit::{UnitSnapshot, UnitStatus};
use crate::protocol::order_text::{parse_order, OrderCommand};

/// A dislodged unit's submitted fate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetreatChoice {
    Disband,
    To(String),
}

/// Region marker for a unit that did not survive the retreat phase.
pub const DISBANDED_REGION: &str = "DISBANDED";

/// The two outputs of retreat resolution: the annotated per-unit results for
/// the `retreats` history entry, and the canonical unit list for the next
/// turn.
#[derive(Debug, Clone, PartialEq)]
pub struct RetreatOutcome {
    pub results: Vec<UnitSnapshot>,
    pub next_state: Vec<UnitSnapshot>,
}

/// Extracts retreat choices from submitted order texts, keyed by the unit's
/// `"NATION: K REGION"` prefix.
///
/// `NATION: K REGION -> dest` names a destination; `NATION: K REGION
/// disbands` is an explicit disband. Unparseable texts are dropped with a
/// warning.
pub fn retreat_choices(orders: &[String]) -> HashMap<String, RetreatChoice> {
    let mut choices = HashMap::new();
    for text in orders {
        match parse_order(text) {
            Ok(line) => {
                let choice = match (&line.dest, line.command) {
                    (Some(dest), _) => RetreatChoice::To(dest.clone()),
                    (None, OrderCommand::Disband) => RetreatChoice::Disband,
                    _ => {
                        warn!(order = %text, "retreat order names no destination, treating as disband");
                        RetreatChoice::Disband
                    }
                };
                choices.insert(line.prefix(), choice);
            }
            Err(e) => warn!(order = %text, error = %e, "dropping unparseable retreat order"),
        }
    }
    choices
}

/// Resolves the retreat phase.
///
/// Rules:
/// - ghost units are dropped (per-phase scaffolding, never retreat);
/// - units not in `Dislodged` status pass through unchanged into both
///   outputs;
/// - no choice, or an explicit disband, disbands the unit;
/// - a destination outside the unit's `retreat_options` is a forced disband;
/// - two units choosing the same legal destination are both disbanded;
/// - otherwise the unit retreats and re-enters the next state at its
///   destination with cleared annotations.
pub fn resolve_retreats(
    resolved: &[UnitSnapshot],
    choices: &HashMap<String, RetreatChoice>,
) -> RetreatOutcome {
    // Count legal destination claims to detect contested retreats.
    let mut claims: HashMap<&str, u32> = HashMap::new();
    for unit in resolved {
        if unit.is_ghost || unit.status != UnitStatus::Dislodged {
            continue;
        }
        if let Some(RetreatChoice::To(dest)) = choices.get(&unit.order_prefix()) {
            if unit.retreat_options.iter().any(|o| o == dest) {
                *claims.entry(dest.as_str()).or_insert(0) += 1;
            }
        }
    }

    let mut results = Vec::new();
    let mut next_state = Vec::new();

    for unit in resolved {
        if unit.is_ghost {
            continue;
        }
        if unit.status != UnitStatus::Dislodged {
            results.push(unit.clone());
            next_state.push(unit.clone());
            continue;
        }

        let prefix = unit.order_prefix();
        let choice = choices.get(&prefix);

        let mut result = unit.clone();
        match choice {
            None | Some(RetreatChoice::Disband) => {
                result.region = DISBANDED_REGION.to_string();
                result.status = UnitStatus::Disbanded;
                result.succeeded = false;
                result.order = Some(format!("{} disbands", prefix));
                result.explanation = Some("Disbanded (no order or chosen)".to_string());
            }
            Some(RetreatChoice::To(dest)) => {
                result.order = Some(format!("{} -> {}", prefix, dest));
                if !unit.retreat_options.iter().any(|o| o == dest) {
                    result.region = DISBANDED_REGION.to_string();
                    result.status = UnitStatus::Disbanded;
                    result.succeeded = false;
                    result.explanation =
                        Some(format!("Illegal retreat to {}. Disbanded instead.", dest));
                } else if claims.get(dest.as_str()).copied().unwrap_or(0) > 1 {
                    result.region = DISBANDED_REGION.to_string();
                    result.status = UnitStatus::Disbanded;
                    result.succeeded = false;
                    result.explanation =
                        Some(format!("Retreat to {} contested. Disbanded instead.", dest));
                } else {
                    result.region = dest.clone();
                    result.status = UnitStatus::Ok;
                    result.succeeded = true;
                    result.explanation = Some(format!("Retreated to {}", dest));

                    let mut survivor =
                        UnitSnapshot::new(unit.id, &unit.nation, unit.kind, dest);
                    survivor.tag = unit.tag.clone();
                    next_state.push(survivor);
                }
            }
        }
        results.push(result);
    }

    RetreatOutcome {
        results,
        next_state,
    }
}
