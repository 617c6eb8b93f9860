//! Per-phase submission bookkeeping.
//!
//! One tracker instance serves whichever order-bearing phase is current
//! (movement orders, then retreat orders); the session clears it at the
//! start of each new phase instance.

use std::collections::HashSet;

/// Records which nation has submitted which raw order texts for the current
/// phase instance.
///
/// A resubmission overwrites the nation's previous list wholesale; partial
/// submissions are never merged. Completeness is checked against an
/// explicit required-nation set: every required nation must appear in the
/// submitted set before a phase may advance.
#[derive(Debug, Default)]
pub struct SubmissionTracker {
    // Insertion-ordered so flattened order batches are deterministic.
    orders_by_nation: Vec<(String, Vec<String>)>,
    submitted: HashSet<String>,
}

impl SubmissionTracker {
    pub fn new() -> Self {
        SubmissionTracker::default()
    }

    /// Records a nation's submission, replacing any prior one (last write
    /// wins).
    pub fn submit(&mut self, nation: &str, orders: Vec<String>) {
        match self.orders_by_nation.iter_mut().find(|(n, _)| n == nation) {
            Some((_, existing)) => *existing = orders,
            None => self.orders_by_nation.push((nation.to_string(), orders)),
        }
        self.submitted.insert(nation.to_string());
    }

    /// Appends a single order without marking the nation as submitted; used
    /// for ghost orders injected by card handlers.
    pub fn inject(&mut self, nation: &str, order: String) {
        match self.orders_by_nation.iter_mut().find(|(n, _)| n == nation) {
            Some((_, existing)) => existing.push(order),
            None => self
                .orders_by_nation
                .push((nation.to_string(), vec![order])),
        }
    }

    /// Drops every order of `nation` whose text references `region`.
    pub fn remove_matching_region(&mut self, nation: &str, region: &str) {
        let needle = format!(" {}", region);
        if let Some((_, orders)) = self.orders_by_nation.iter_mut().find(|(n, _)| n == nation) {
            orders.retain(|order| !order.contains(&needle));
        }
    }

    /// All recorded orders, flattened in submission order.
    pub fn all_orders(&self) -> Vec<String> {
        self.orders_by_nation
            .iter()
            .flat_map(|(_, orders)| orders.iter().cloned())
            .collect()
    }

    pub fn has_submitted(&self, nation: &str) -> bool {
        self.submitted.contains(nation)
    }

    pub fn submitted_nations(&self) -> &HashSet<String> {
        &self.submitted
    }

    /// True once every required nation has submitted.
    pub fn is_complete(&self, required: &HashSet<String>) -> bool {
        required.iter().all(|n| self.submitted.contains(n))
    }

    /// Resets both structures for a new phase instance.
    pub fn clear(&mut self) {
        self.orders_by_nation.clear();
        self.submitted.clear();
    }
}
