//! The turn/phase orchestrator.
//!
//! Owns the canonical unit list, the current phase pointer, and the
//! immutable snapshot history. Every inbound submission is validated and
//! recorded; once the phase's required nations have all submitted, the
//! phase is driven forward through one or more gateway passes.
//!
//! The subtlest piece is the two-pass card resolution protocol: the gateway
//! only returns positional outcomes, so unit identity is recovered by
//! matching origin positions against the pre-call unit list, and ghost/tag
//! metadata is merged back by id after every pass. Card handlers run
//! between the passes; the second pass is the one that counts.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::board::phase::{Phase, PhaseInfo, PhaseKey, PHASE_PRIORITY};
use crate::board::player::{default_roster, PlayerState};
use crate::board::snapshot::PhaseSnapshot;
use crate::board::unit::{UnitId, UnitKind, UnitSnapshot, UnitStatus};
use crate::cards::{handler_for, CardHost, CardOrder, CardQueue};
use crate::protocol::order_text::{
    compile_orders, holds_order, parse_order, validate_order, OrderCommand, OrderTextError,
};
use crate::resolve::gateway::{GatewayError, ResolutionGateway, UnitOutcome};
use crate::resolve::retreat::{resolve_retreats, retreat_choices};

use super::ghost::{merge_metadata, GhostManager};
use super::tracker::SubmissionTracker;

/// Errors surfaced to submitting callers. None of them mutate session
/// state.
#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("cannot submit {what} during the {actual} phase")]
    PhaseMismatch { what: &'static str, actual: Phase },

    #[error("invalid order: {0}")]
    InvalidOrder(#[from] OrderTextError),

    #[error("order '{order}' belongs to {owner}, submitted by {submitter}")]
    WrongNation {
        submitter: String,
        owner: String,
        order: String,
    },

    #[error("unknown nation: {0}")]
    UnknownNation(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// The starting position: three armies, one per nation.
fn initial_units() -> Vec<(String, UnitKind, String)> {
    vec![
        ("FRA".to_string(), UnitKind::Army, "den".to_string()),
        ("AUS".to_string(), UnitKind::Army, "kie".to_string()),
        ("TUR".to_string(), UnitKind::Army, "swe".to_string()),
    ]
}

/// One game session: the authoritative state machine over
/// `orders -> card_orders -> orders_resolved -> (retreats)`.
pub struct Session {
    gateway: Box<dyn ResolutionGateway>,
    state: Vec<UnitSnapshot>,
    current: PhaseInfo,
    history: HashMap<PhaseKey, PhaseSnapshot>,
    players: HashMap<String, PlayerState>,
    orders: SubmissionTracker,
    cards: CardQueue,
    ghosts: GhostManager,
    setup: Vec<(String, UnitKind, String)>,
}

impl Session {
    /// Creates a session with the default roster and starting position.
    pub fn new(gateway: Box<dyn ResolutionGateway>) -> Self {
        Session::with_setup(gateway, default_roster(), initial_units())
    }

    /// Creates a session with an explicit roster and starting units.
    pub fn with_setup(
        gateway: Box<dyn ResolutionGateway>,
        players: HashMap<String, PlayerState>,
        setup: Vec<(String, UnitKind, String)>,
    ) -> Self {
        let mut session = Session {
            gateway,
            state: Vec::new(),
            current: PhaseInfo {
                turn: 1,
                phase: Phase::Orders,
            },
            history: HashMap::new(),
            players,
            orders: SubmissionTracker::new(),
            cards: CardQueue::new(),
            ghosts: GhostManager::new(),
            setup,
        };
        session.seed_initial_state();
        session
    }

    /// Deterministic unit-id stream for tests.
    pub fn with_seeded_ids(mut self, seed: u64) -> Self {
        self.ghosts = GhostManager::with_seed(seed);
        self.state = Vec::new();
        self.history.clear();
        self.seed_initial_state();
        self
    }

    fn seed_initial_state(&mut self) {
        let setup = self.setup.clone();
        self.state = setup
            .iter()
            .map(|(nation, kind, region)| {
                UnitSnapshot::new(self.ghosts.next_id(), nation, *kind, region)
            })
            .collect();
        self.history.insert(
            PhaseKey::new(0, Phase::OrdersResolved),
            PhaseSnapshot::units_only(self.state.clone()),
        );
    }

    // ---- read surface -------------------------------------------------

    pub fn current_phase(&self) -> PhaseInfo {
        self.current
    }

    pub fn state(&self) -> &[UnitSnapshot] {
        &self.state
    }

    pub fn players(&self) -> &HashMap<String, PlayerState> {
        &self.players
    }

    pub fn history(&self) -> &HashMap<PhaseKey, PhaseSnapshot> {
        &self.history
    }

    /// The committed units for `phase` of the current turn, if any.
    pub fn phase_state(&self, phase: Phase) -> Option<&[UnitSnapshot]> {
        self.history
            .get(&PhaseKey::new(self.current.turn, phase))
            .map(|s| s.units.as_slice())
    }

    /// Searches backward from the current turn for the most recent committed
    /// snapshot, ranking phases by `PHASE_PRIORITY`.
    pub fn latest_snapshot(&self) -> &[UnitSnapshot] {
        for turn in (0..=self.current.turn).rev() {
            for phase in PHASE_PRIORITY {
                if let Some(snapshot) = self.history.get(&PhaseKey::new(turn, phase)) {
                    return &snapshot.units;
                }
            }
        }
        &[]
    }

    /// Restores the starting position and wipes history and submissions.
    /// Unit ids are minted fresh; ids are never reused, even across resets.
    pub fn reset(&mut self) {
        self.current = PhaseInfo {
            turn: 1,
            phase: Phase::Orders,
        };
        self.history.clear();
        self.orders.clear();
        self.cards.clear();
        self.seed_initial_state();
    }

    // ---- submissions --------------------------------------------------

    /// Accepts a nation's movement orders. Rejected wholesale if any order
    /// is malformed, names a unit the nation does not own, or arrives
    /// outside the orders phase. Once every unit-owning nation has
    /// submitted, the phase advances.
    pub fn submit_orders(&mut self, nation: &str, orders: Vec<String>) -> Result<(), SessionError> {
        self.expect_phase(Phase::Orders, "orders")?;
        for order in &orders {
            self.validate_submission(nation, order)?;
        }

        self.orders.submit(nation, orders);
        if self.orders.is_complete(&self.required_order_nations()) {
            self.run_pre_main_phase()?;
        }
        Ok(())
    }

    /// Accepts a nation's card orders; an empty list is an explicit pass.
    /// Once every card-holding nation has submitted or passed, the card
    /// phase resolves.
    pub fn submit_card_orders(
        &mut self,
        nation: &str,
        orders: Vec<CardOrder>,
    ) -> Result<(), SessionError> {
        self.expect_phase(Phase::CardOrders, "card orders")?;
        if !self.players.contains_key(nation) {
            return Err(SessionError::UnknownNation(nation.to_string()));
        }
        for order in &orders {
            if order.nation != nation {
                return Err(SessionError::WrongNation {
                    submitter: nation.to_string(),
                    owner: order.nation.clone(),
                    order: order.card_type.clone(),
                });
            }
        }

        self.cards.submit(nation, orders);
        if self.all_card_orders_submitted() {
            self.run_card_phase()?;
        }
        Ok(())
    }

    /// Accepts a nation's retreat orders; an empty list accepts the default
    /// disband for that nation's dislodged units. Once every owner of a
    /// dislodged unit has submitted, the retreat phase resolves.
    pub fn submit_retreats(
        &mut self,
        nation: &str,
        orders: Vec<String>,
    ) -> Result<(), SessionError> {
        self.expect_phase(Phase::Retreats, "retreats")?;
        for order in &orders {
            self.validate_submission(nation, order)?;
        }

        self.orders.submit(nation, orders);
        if self.orders.is_complete(&self.required_retreat_nations()) {
            self.run_retreat_phase()?;
        }
        Ok(())
    }

    fn expect_phase(&self, expected: Phase, what: &'static str) -> Result<(), SessionError> {
        if self.current.phase != expected {
            return Err(SessionError::PhaseMismatch {
                what,
                actual: self.current.phase,
            });
        }
        Ok(())
    }

    fn validate_submission(&self, nation: &str, order: &str) -> Result<(), SessionError> {
        validate_order(order, &self.state)?;
        let line = parse_order(order)?;
        let owner = line.nation.split('_').next().unwrap_or("").to_string();
        if owner != nation {
            return Err(SessionError::WrongNation {
                submitter: nation.to_string(),
                owner,
                order: order.to_string(),
            });
        }
        Ok(())
    }

    // ---- completeness -------------------------------------------------

    /// Nations that must submit movement orders: every owner of a non-ghost
    /// unit.
    fn required_order_nations(&self) -> HashSet<String> {
        self.state
            .iter()
            .filter(|u| !u.is_ghost)
            .map(|u| u.nation.clone())
            .collect()
    }

    /// Nations that may act in the card phase: every player holding at
    /// least one card.
    fn required_card_nations(&self) -> HashSet<String> {
        self.players
            .values()
            .filter(|p| p.has_cards())
            .map(|p| p.nation.clone())
            .collect()
    }

    /// Nations that must submit retreats: every owner of a dislodged unit.
    fn required_retreat_nations(&self) -> HashSet<String> {
        self.state
            .iter()
            .filter(|u| !u.is_ghost && u.status == UnitStatus::Dislodged)
            .map(|u| u.nation.clone())
            .collect()
    }

    fn all_card_orders_submitted(&self) -> bool {
        self.required_card_nations()
            .iter()
            .all(|n| self.cards.has_submitted(n))
    }

    // ---- phase runners ------------------------------------------------

    /// `orders -> card_orders`: a preview resolution pass over the
    /// holds-defaulted order set, committed as `<turn>-orders` so observers
    /// can see pre-card intentions. Skips straight through the card phase
    /// when no nation holds a card.
    fn run_pre_main_phase(&mut self) -> Result<(), SessionError> {
        let turn = self.current.turn;
        let preview = self.resolve_units(false)?;
        self.commit(PhaseKey::new(turn, Phase::Orders), PhaseSnapshot::units_only(preview));
        self.advance(Phase::CardOrders, 0);

        if self.required_card_nations().is_empty() {
            self.run_card_phase()?;
        }
        Ok(())
    }

    /// `card_orders -> orders_resolved`: the two-pass protocol. Pass one
    /// records the pre-card state; handlers then mutate the order set and
    /// may spawn ghosts; pass two resolves the updated order set and is
    /// committed as final.
    fn run_card_phase(&mut self) -> Result<(), SessionError> {
        let turn = self.current.turn;

        let queued = self.cards.orders().to_vec();
        let first_pass = self.resolve_units(false)?;
        self.commit(
            PhaseKey::new(turn, Phase::CardOrders),
            PhaseSnapshot::with_cards(first_pass, queued),
        );

        self.apply_card_orders();

        let final_pass = self.resolve_units(false)?;
        self.finish_main_phase(final_pass);
        Ok(())
    }

    /// Commits `<turn>-orders_resolved` from the final resolution pass,
    /// replaces canonical state, and branches to retreats or the next turn.
    fn finish_main_phase(&mut self, snapshot: Vec<UnitSnapshot>) {
        let turn = self.current.turn;
        let (next_state, has_retreats) = prepare_resolved(&snapshot);
        self.state = next_state;

        // Rebind card orders to the post-resolution units so the committed
        // snapshot references canonical identities.
        let by_id: HashMap<UnitId, &UnitSnapshot> =
            snapshot.iter().map(|u| (u.id, u)).collect();
        let mut card_orders = self.cards.take();
        for order in card_orders.iter_mut() {
            if let Some(unit) = &order.unit {
                if let Some(resolved) = by_id.get(&unit.id) {
                    order.unit = Some((*resolved).clone());
                }
            }
        }

        let units = self.state.clone();
        self.commit(
            PhaseKey::new(turn, Phase::OrdersResolved),
            PhaseSnapshot::with_cards(units, card_orders),
        );
        self.cards.clear();

        if has_retreats {
            self.advance(Phase::Retreats, 0);
        } else {
            self.advance(Phase::Orders, 1);
        }
        // Either way a new order-bearing phase instance begins.
        self.orders.clear();
    }

    /// `retreats -> orders(next turn)`: resolves retreat choices against
    /// the committed `orders_resolved` snapshot and installs the surviving
    /// units as the next turn's state.
    fn run_retreat_phase(&mut self) -> Result<(), SessionError> {
        let turn = self.current.turn;
        let resolved = match self
            .history
            .get(&PhaseKey::new(turn, Phase::OrdersResolved))
        {
            Some(snapshot) => snapshot.units.clone(),
            None => {
                warn!(turn, "no orders_resolved snapshot for retreat phase");
                Vec::new()
            }
        };

        let choices = retreat_choices(&self.orders.all_orders());
        let outcome = resolve_retreats(&resolved, &choices);

        self.commit(
            PhaseKey::new(turn, Phase::Retreats),
            PhaseSnapshot::units_only(outcome.results),
        );
        self.commit(
            PhaseKey::new(turn + 1, Phase::Orders),
            PhaseSnapshot::units_only(outcome.next_state.clone()),
        );
        self.state = outcome.next_state;

        self.advance(Phase::Orders, 1);
        self.orders.clear();
        Ok(())
    }

    fn advance(&mut self, phase: Phase, turn_increment: u32) {
        self.current = PhaseInfo {
            turn: self.current.turn + turn_increment,
            phase,
        };
        debug!(turn = self.current.turn, phase = %self.current.phase, "phase advanced");
    }

    // ---- resolution ---------------------------------------------------

    /// One gateway pass: compile the holds-defaulted order batch, resolve,
    /// reattach unit ids by origin position, and merge ghost metadata by
    /// id.
    fn resolve_units(&mut self, use_new_position: bool) -> Result<Vec<UnitSnapshot>, SessionError> {
        let batch = compile_orders(&self.state, &self.orders.all_orders());
        let outcomes = self.gateway.resolve(&batch)?;

        let id_map: HashMap<String, UnitId> = self
            .state
            .iter()
            .map(|u| (u.position_key(), u.id))
            .collect();

        let mapped: Vec<UnitSnapshot> = outcomes
            .into_iter()
            .filter_map(|o| self.map_outcome(o, use_new_position, &id_map))
            .collect();

        Ok(merge_metadata(mapped, &self.state))
    }

    /// Maps one gateway outcome back onto a unit snapshot, recovering the
    /// canonical id from the pre-call positional key.
    fn map_outcome(
        &mut self,
        outcome: UnitOutcome,
        use_new_position: bool,
        id_map: &HashMap<String, UnitId>,
    ) -> Option<UnitSnapshot> {
        let (nation, kind, origin) = match outcome.unit_parts() {
            Some(parts) => parts,
            None => {
                warn!(unit = %outcome.unit, "gateway outcome names no parseable unit, dropping");
                return None;
            }
        };

        let key = crate::board::unit::position_key(nation, kind, origin);
        // Fallback id for an outcome with no pre-call counterpart.
        let id = match id_map.get(&key) {
            Some(id) => *id,
            None => self.ghosts.next_id(),
        };

        let region = if use_new_position {
            outcome.new_position.clone()
        } else {
            origin.to_string()
        };

        let status = if outcome.dislodged_by.is_some() {
            UnitStatus::Dislodged
        } else {
            UnitStatus::Ok
        };

        let mut unit = UnitSnapshot::new(id, nation, kind, &region);
        unit.order = Some(outcome.order);
        unit.succeeded = outcome.succeeded;
        unit.dislodged_by = outcome.dislodged_by;
        unit.retreat_options = outcome.retreat_options;
        unit.explanation = if outcome.explanation.is_empty() {
            None
        } else {
            Some(outcome.explanation)
        };
        unit.status = status;
        Some(unit)
    }

    // ---- cards --------------------------------------------------------

    /// Runs every queued card handler in submission order. An unknown card
    /// type is skipped with a warning; a handler error is isolated to its
    /// order.
    fn apply_card_orders(&mut self) {
        let mut queue = self.cards.take();
        for order in queue.iter_mut() {
            match handler_for(&order.card_type) {
                None => {
                    warn!(card = %order.card_type, nation = %order.nation, "unknown card type, skipping");
                }
                Some(handler) => {
                    if let Err(e) = handler(order, self) {
                        error!(card = %order.card_type, nation = %order.nation, error = %e, "card handler failed");
                    }
                }
            }
        }
        self.cards.restore(queue);
    }

    // ---- history ------------------------------------------------------

    /// Write-once commit: an already-written key keeps its existing value.
    fn commit(&mut self, key: PhaseKey, snapshot: PhaseSnapshot) {
        if self.history.contains_key(&key) {
            warn!(key = %key, "history key already written, keeping existing snapshot");
            return;
        }
        self.history.insert(key, snapshot);
    }
}

impl CardHost for Session {
    fn spawn_ghost(&mut self, template: &UnitSnapshot, tag: &str) -> UnitSnapshot {
        let ghost = self.ghosts.make_ghost(template, tag);
        self.state.push(ghost.clone());

        let order = ghost.order.clone().unwrap_or_else(|| holds_order(&ghost));
        self.orders.inject(&ghost.nation, order);
        ghost
    }

    fn cancel_orders(&mut self, nation: &str, region: &str) {
        self.orders.remove_matching_region(nation, region);
    }
}

/// Prepares the committed post-resolution state from the final pass: drops
/// ghosts, applies successful movement (the destination is parsed from the
/// order text, since positions were kept at origin through the card
/// passes), and reports whether any unit needs a retreat.
fn prepare_resolved(snapshot: &[UnitSnapshot]) -> (Vec<UnitSnapshot>, bool) {
    let mut has_retreats = false;
    let mut state = Vec::new();

    for unit in snapshot {
        if unit.is_ghost {
            continue;
        }
        let mut unit = unit.clone();

        if unit.status == UnitStatus::Dislodged {
            has_retreats = true;
            // Stays in place pending its retreat.
        } else if unit.succeeded {
            // Only a move relocates the unit; a support's order text also
            // names a destination, which belongs to the supported unit.
            if let Ok(line) = parse_order(unit.order.as_deref().unwrap_or_default()) {
                if line.command == OrderCommand::Move {
                    if let Some(dest) = line.dest {
                        unit.region = dest;
                    }
                }
            }
        }
        state.push(unit);
    }

    (state, has_retreats)
}
