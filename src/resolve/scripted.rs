//! A gateway returning scripted outcomes.
//!
//! Performs no adjudication: every order succeeds (moves land at their
//! destination) unless a failure or dislodgement was scripted for the acting
//! unit. Serves the test suite, the benches, and the demo binary in place of
//! the real external resolver.

use std::collections::{HashMap, HashSet};

use crate::board::unit::{position_key, UnitKind};
use crate::protocol::order_text::{parse_order, OrderCommand};

use super::gateway::{GatewayError, ResolutionGateway, UnitOutcome};

#[derive(Debug, Clone)]
struct ScriptedDislodgement {
    by: String,
    retreat_options: Vec<String>,
}

/// Gateway with per-unit scripted outcomes.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGateway {
    dislodged: HashMap<String, ScriptedDislodgement>,
    failed: HashSet<String>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        ScriptedGateway::default()
    }

    /// Scripts a dislodgement for the unit at `(nation, kind, region)`.
    pub fn dislodge(
        mut self,
        nation: &str,
        kind: UnitKind,
        region: &str,
        by: &str,
        retreat_options: &[&str],
    ) -> Self {
        self.dislodged.insert(
            position_key(nation, kind, region),
            ScriptedDislodgement {
                by: by.to_string(),
                retreat_options: retreat_options.iter().map(|s| s.to_string()).collect(),
            },
        );
        self
    }

    /// Scripts a plain failure (the unit stays in place) for the unit at
    /// `(nation, kind, region)`.
    pub fn fail(mut self, nation: &str, kind: UnitKind, region: &str) -> Self {
        self.failed.insert(position_key(nation, kind, region));
        self
    }
}

impl ResolutionGateway for ScriptedGateway {
    fn resolve(&self, orders: &[String]) -> Result<Vec<UnitOutcome>, GatewayError> {
        let mut outcomes = Vec::with_capacity(orders.len());

        for text in orders {
            let line = parse_order(text)
                .map_err(|e| GatewayError(format!("unparseable order '{}': {}", text, e)))?;
            let key = line.unit_key();
            let unit = line.prefix().replace(':', "");

            if let Some(d) = self.dislodged.get(&key) {
                outcomes.push(UnitOutcome {
                    unit,
                    order: text.clone(),
                    succeeded: false,
                    dislodged_by: Some(d.by.clone()),
                    retreat_options: d.retreat_options.clone(),
                    explanation: format!("Dislodged by {}", d.by),
                    new_position: line.region.clone(),
                });
                continue;
            }

            let failed = self.failed.contains(&key);
            let moved = line.command == OrderCommand::Move && line.dest.is_some();
            let new_position = if moved && !failed {
                line.dest.clone().unwrap()
            } else {
                line.region.clone()
            };

            outcomes.push(UnitOutcome {
                unit,
                order: text.clone(),
                succeeded: !failed,
                dislodged_by: None,
                retreat_options: Vec::new(),
                explanation: if failed {
                    "Order failed".to_string()
                } else {
                    "Order succeeds".to_string()
                },
                new_position,
            });
        }

        Ok(outcomes)
    }
}
