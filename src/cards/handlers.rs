//! Card-effect handlers.
//!
//! Dispatch is a strategy table from the upper-cased card type string to a
//! handler function. A handler failing a precondition reports an error for
//! that single order; the surrounding batch always continues.

use thiserror::Error;
use tracing::info;

use crate::board::unit::UnitSnapshot;

use super::CardOrder;

/// Precondition failures raised by handlers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CardError {
    #[error("{card} card requires a 'unit' field")]
    MissingUnit { card: String },

    #[error("{card} card requires a 'region' in metadata")]
    MissingRegion { card: String },
}

/// The mutable session surface handlers act through.
///
/// Handlers never touch the canonical unit list or the order book directly;
/// the session stays the sole writer.
pub trait CardHost {
    /// Adds a ghost unit built from `template` to the canonical state,
    /// registers its order for the next resolution pass, and returns the
    /// identified ghost.
    fn spawn_ghost(&mut self, template: &UnitSnapshot, tag: &str) -> UnitSnapshot;

    /// Removes any existing order of `nation` whose text references
    /// `region`.
    fn cancel_orders(&mut self, nation: &str, region: &str);
}

/// A card handler: the order (mutable, so it can rebind its unit reference)
/// and the host surface.
pub type CardHandler = fn(&mut CardOrder, &mut dyn CardHost) -> Result<(), CardError>;

/// Looks up the handler for a card type, case-insensitively.
pub fn handler_for(card_type: &str) -> Option<CardHandler> {
    match card_type.to_ascii_uppercase().as_str() {
        "MERCENARY" => Some(mercenary),
        "GOLD_BONUS" => Some(gold_bonus),
        "DEFENSE_BOOST" => Some(defense_boost),
        "CANCEL_ORDER" => Some(cancel_order),
        _ => None,
    }
}

/// Spawns the card's unit as a ghost and rebinds the order to the spawned,
/// now-identified unit so downstream consumers see the canonical reference.
fn mercenary(order: &mut CardOrder, host: &mut dyn CardHost) -> Result<(), CardError> {
    let template = order.unit.as_ref().ok_or_else(|| CardError::MissingUnit {
        card: order.card_type.clone(),
    })?;

    let ghost = host.spawn_ghost(template, "MERC");
    info!(nation = %order.nation, region = %ghost.region, "spawned mercenary unit");
    order.unit = Some(ghost);
    Ok(())
}

/// Advisory: records a gold delta. No economy ledger exists in core.
// TODO: hook into the economy module once it exists
fn gold_bonus(order: &mut CardOrder, _host: &mut dyn CardHost) -> Result<(), CardError> {
    let amount = order.metadata_u64("amount").unwrap_or(1);
    info!(nation = %order.nation, amount, "gold bonus played (not yet tracked)");
    Ok(())
}

/// Advisory: records a regional defense effect.
fn defense_boost(order: &mut CardOrder, _host: &mut dyn CardHost) -> Result<(), CardError> {
    let region = order
        .metadata_str("region")
        .ok_or_else(|| CardError::MissingRegion {
            card: order.card_type.clone(),
        })?;
    info!(nation = %order.nation, region, "defense boost played");
    Ok(())
}

/// Cancels the nation's existing order in the target region.
fn cancel_order(order: &mut CardOrder, host: &mut dyn CardHost) -> Result<(), CardError> {
    let region = order
        .metadata_str("region")
        .ok_or_else(|| CardError::MissingRegion {
            card: order.card_type.clone(),
        })?
        .to_string();
    host.cancel_orders(&order.nation, &region);
    info!(nation = %order.nation, region = %region, "order canceled by card");
    Ok(())
}
