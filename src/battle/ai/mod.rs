//! Non-player decision-making
//!
//! Architecture: Trait + Data hybrid
//! - DecisionModel trait defines the interface for swappable brains
//! - HeuristicWeights holds the score table
//! - DecisionContext provides the per-decision view of the battle

pub mod decision_context;
pub mod scorer;

pub use decision_context::DecisionContext;
pub use scorer::{HeuristicBrain, HeuristicWeights};

use crate::core::types::CombatantId;

/// A chosen action (by loadout index) and its resolved target set
#[derive(Debug, Clone)]
pub struct Decision {
    pub action_index: usize,
    pub targets: Vec<CombatantId>,
}

/// Trait for decision model implementations
pub trait DecisionModel {
    /// Choose an action and targets for the ready combatant.
    ///
    /// Returns None only when no usable action exists; the caller then
    /// skips the turn.
    fn decide(&mut self, context: &DecisionContext) -> Option<Decision>;
}
