//! Order-text notation: parsing, validation, and batch compilation.
//!
//! The resolution gateway consumes plain order strings of the grammar
//! `NATION: K REGION command [-> DESTINATION]`, one per unit. This module
//! implements the minimal contract the session needs: extracting the unit a
//! text refers to, validating ownership before a submission is accepted, and
//! defaulting orderless units to holds before a gateway call.

use thiserror::Error;
use tracing::warn;

use crate::board::unit::{position_key, UnitKind, UnitSnapshot};

/// Errors from parsing or validating an order string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderTextError {
    #[error("empty order")]
    EmptyInput,

    #[error("order '{0}' does not start with 'NATION:'")]
    MissingNation(String),

    #[error("invalid nation '{0}'")]
    InvalidNation(String),

    #[error("invalid unit kind '{0}'")]
    InvalidKind(String),

    #[error("invalid region '{0}'")]
    InvalidRegion(String),

    #[error("order '{0}' has no command")]
    MissingCommand(String),

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("missing destination after '->'")]
    MissingDestination,

    #[error("no {kind} from {nation} found in {region}")]
    NoSuchUnit {
        nation: String,
        kind: char,
        region: String,
    },
}

/// The command verb of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderCommand {
    Holds,
    Move,
    Support,
    Convoy,
    Disband,
}

impl OrderCommand {
    /// Parses a command word, accepting the third-person forms the resolver
    /// emits (`holds`, `disbands`).
    pub fn from_word(word: &str) -> Option<OrderCommand> {
        match word {
            "holds" | "hold" => Some(OrderCommand::Holds),
            "move" | "moves" => Some(OrderCommand::Move),
            "support" | "supports" => Some(OrderCommand::Support),
            "convoy" | "convoys" => Some(OrderCommand::Convoy),
            "disband" | "disbands" => Some(OrderCommand::Disband),
            _ => None,
        }
    }
}

/// A parsed order string.
///
/// Support and convoy tails beyond the destination are not modeled; the
/// session only needs the acting unit, the verb, and the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub nation: String,
    pub kind: UnitKind,
    pub region: String,
    pub command: OrderCommand,
    pub dest: Option<String>,
}

impl OrderLine {
    /// Case-insensitive positional key of the acting unit.
    pub fn unit_key(&self) -> String {
        position_key(&self.nation, self.kind, &self.region)
    }

    /// The `"NATION: K REGION"` prefix of this order.
    pub fn prefix(&self) -> String {
        format!("{}: {} {}", self.nation, self.kind.letter(), self.region)
    }

    /// True if the nation carries a ghost-origin suffix such as `FRA_MERC`.
    pub fn is_ghost_origin(&self) -> bool {
        self.nation.contains('_')
    }
}

/// Parses one order string.
pub fn parse_order(s: &str) -> Result<OrderLine, OrderTextError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(OrderTextError::EmptyInput);
    }

    let tokens: Vec<&str> = s.split_whitespace().collect();
    if tokens.len() < 3 {
        return Err(OrderTextError::MissingNation(s.to_string()));
    }

    let nation = tokens[0]
        .strip_suffix(':')
        .ok_or_else(|| OrderTextError::MissingNation(s.to_string()))?;
    if !is_valid_nation(nation) {
        return Err(OrderTextError::InvalidNation(nation.to_string()));
    }

    let kind = match tokens[1] {
        t if t.len() == 1 => UnitKind::from_letter(t.chars().next().unwrap())
            .ok_or_else(|| OrderTextError::InvalidKind(t.to_string()))?,
        t => return Err(OrderTextError::InvalidKind(t.to_string())),
    };

    let region = tokens[2];
    if !is_valid_region(region) {
        return Err(OrderTextError::InvalidRegion(region.to_string()));
    }

    // Command word, or a bare "->" which the resolver's own notation uses
    // for movement.
    let (command, rest) = match tokens.get(3) {
        None => return Err(OrderTextError::MissingCommand(s.to_string())),
        Some(&"->") => (OrderCommand::Move, &tokens[3..]),
        Some(word) => (
            OrderCommand::from_word(word)
                .ok_or_else(|| OrderTextError::UnknownCommand(word.to_string()))?,
            &tokens[4..],
        ),
    };

    let dest = match rest.iter().position(|&t| t == "->") {
        Some(i) => Some(
            rest.get(i + 1)
                .ok_or(OrderTextError::MissingDestination)?
                .to_string(),
        ),
        None => None,
    };

    Ok(OrderLine {
        nation: nation.to_string(),
        kind,
        region: region.to_string(),
        command,
        dest,
    })
}

fn is_valid_nation(s: &str) -> bool {
    let mut parts = s.split('_');
    let base = match parts.next() {
        Some(b) => b,
        None => return false,
    };
    if base.len() != 3 || !base.chars().all(|c| c.is_ascii_uppercase()) {
        return false;
    }
    parts.all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_uppercase()))
}

fn is_valid_region(s: &str) -> bool {
    s.len() == 3 && s.chars().all(|c| c.is_ascii_lowercase())
}

/// Validates a submitted order against the canonical unit list.
///
/// Ghost-origin nations (suffixed, e.g. `FRA_MERC`) are assumed legal: their
/// units may not exist yet when the order is submitted. For everyone else
/// the named unit must be present in the state.
pub fn validate_order(order: &str, state: &[UnitSnapshot]) -> Result<(), OrderTextError> {
    let line = parse_order(order)?;
    if line.is_ghost_origin() {
        return Ok(());
    }

    let key = line.unit_key();
    if state.iter().any(|u| u.position_key() == key) {
        Ok(())
    } else {
        Err(OrderTextError::NoSuchUnit {
            nation: line.nation,
            kind: line.kind.letter(),
            region: line.region,
        })
    }
}

/// The default instruction for a unit that was given no order.
pub fn holds_order(unit: &UnitSnapshot) -> String {
    format!("{} holds", unit.order_prefix())
}

/// Builds the gateway order batch: exactly one instruction per unit, in unit
/// order, defaulting orderless units to holds.
///
/// Submitted texts are bound to units by positional key (last submission per
/// unit wins). Texts that match no current unit are dropped with a warning.
pub fn compile_orders(units: &[UnitSnapshot], submitted: &[String]) -> Vec<String> {
    let mut by_unit: Vec<(String, &String)> = Vec::new();
    for text in submitted {
        match parse_order(text) {
            Ok(line) => {
                let key = line.unit_key();
                // Last write wins for a unit ordered twice.
                by_unit.retain(|(k, _)| *k != key);
                by_unit.push((key, text));
            }
            Err(e) => warn!(order = %text, error = %e, "dropping unparseable order"),
        }
    }

    let mut batch = Vec::with_capacity(units.len());
    for unit in units {
        let key = unit.position_key();
        match by_unit.iter().position(|(k, _)| *k == key) {
            Some(i) => {
                let (_, text) = by_unit.remove(i);
                batch.push(text.clone());
            }
            None => batch.push(holds_order(unit)),
        }
    }

    for (_, text) in &by_unit {
        warn!(order = %text, "order matches no current unit, dropping");
    }

    batch
}
