//! Ghost-unit lifecycle and identity.
//!
//! Card effects can inject units the resolution gateway knows nothing
//! about. This module mints their synthetic identity, strips them from
//! persisted state, and restores ghost/tag metadata onto gateway outcomes,
//! which only carry positional data.

use std::collections::{HashMap, HashSet};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::board::unit::{UnitId, UnitSnapshot, UnitStatus};

/// Issues unit identity and builds ghost units.
///
/// Ids are random, and an issued-set guard guarantees none is ever handed
/// out twice within a session.
#[derive(Debug)]
pub struct GhostManager {
    rng: SmallRng,
    issued: HashSet<u64>,
}

impl GhostManager {
    pub fn new() -> Self {
        GhostManager {
            rng: SmallRng::from_entropy(),
            issued: HashSet::new(),
        }
    }

    /// Deterministic id stream for tests.
    pub fn with_seed(seed: u64) -> Self {
        GhostManager {
            rng: SmallRng::seed_from_u64(seed),
            issued: HashSet::new(),
        }
    }

    /// Mints a fresh, never-before-issued unit id.
    pub fn next_id(&mut self) -> UnitId {
        loop {
            let raw: u64 = self.rng.gen();
            if self.issued.insert(raw) {
                return UnitId(raw);
            }
        }
    }

    /// Builds a ghost from a template unit: fresh id, ghost flag, provenance
    /// tag, clean status. The caller appends it to canonical state.
    pub fn make_ghost(&mut self, template: &UnitSnapshot, tag: &str) -> UnitSnapshot {
        let mut ghost = template.clone();
        ghost.id = self.next_id();
        ghost.is_ghost = true;
        ghost.tag = Some(tag.to_string());
        ghost.status = UnitStatus::Ok;
        ghost.succeeded = false;
        ghost.dislodged_by = None;
        ghost.retreat_options = Vec::new();
        ghost.explanation = None;
        ghost
    }
}

impl Default for GhostManager {
    fn default() -> Self {
        GhostManager::new()
    }
}

/// Returns only the non-ghost entries; ghosts never outlive the phase that
/// spawned them unless a handler explicitly promotes one.
pub fn filter_ghosts(units: &[UnitSnapshot]) -> Vec<UnitSnapshot> {
    units.iter().filter(|u| !u.is_ghost).cloned().collect()
}

/// Re-attaches ghost/tag metadata onto freshly mapped gateway outcomes.
///
/// Matches by `UnitId`, not by position: a unit's region changes across
/// passes, its id does not. Outcomes with no pre-resolution counterpart
/// default to non-ghost.
pub fn merge_metadata(
    outcomes: Vec<UnitSnapshot>,
    originals: &[UnitSnapshot],
) -> Vec<UnitSnapshot> {
    let meta: HashMap<UnitId, &UnitSnapshot> =
        originals.iter().map(|u| (u.id, u)).collect();

    outcomes
        .into_iter()
        .map(|mut unit| {
            match meta.get(&unit.id) {
                Some(original) => {
                    unit.is_ghost = original.is_ghost;
                    unit.tag = original.tag.clone();
                }
                None => {
                    unit.is_ghost = false;
                    unit.tag = None;
                }
            }
            unit
        })
        .collect()
}
