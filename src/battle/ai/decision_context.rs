//! The decision model's view of the battle for one choice
//!
//! Built per decision and discarded: borrows the actor, its usable action
//! subset, the opposing side, and the ally roster.

use crate::battle::action::{ActionInstance, Loadout};
use crate::battle::combatant::Combatant;
use crate::battle::status::StatusTag;

/// Ephemeral context for one action/target choice
pub struct DecisionContext<'a> {
    pub actor: &'a Combatant,
    /// Usable actions paired with their loadout indices
    pub usable: Vec<(usize, &'a ActionInstance)>,
    /// The opposing reference target (first living opponent)
    pub reference_target: Option<&'a Combatant>,
    /// Living members of the actor's side, the actor included
    pub allies: Vec<&'a Combatant>,
    /// Living members of the opposing side
    pub opponents: Vec<&'a Combatant>,
}

impl<'a> DecisionContext<'a> {
    pub fn new(
        actor: &'a Combatant,
        loadout: &'a Loadout,
        allies: Vec<&'a Combatant>,
        opponents: Vec<&'a Combatant>,
    ) -> Self {
        let usable = loadout
            .actions
            .iter()
            .enumerate()
            .filter(|(_, a)| a.is_usable_by(actor))
            .collect();

        Self {
            actor,
            usable,
            reference_target: opponents.first().copied(),
            allies,
            opponents,
        }
    }

    /// Lowest HP fraction among living allies (the actor included)
    pub fn worst_ally_fraction(&self) -> Option<f32> {
        self.allies
            .iter()
            .map(|a| a.hp_fraction())
            .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// Living, non-self ally with the lowest HP fraction, first encountered
    /// winning ties
    pub fn most_wounded_other_ally(&self) -> Option<&'a Combatant> {
        let mut best: Option<&'a Combatant> = None;
        for ally in self.allies.iter().filter(|a| a.id != self.actor.id) {
            match best {
                Some(current) if ally.hp_fraction() >= current.hp_fraction() => {}
                _ => best = Some(ally),
            }
        }
        best
    }

    /// How many living allies lack a condition tag
    pub fn allies_lacking(&self, tag: StatusTag) -> usize {
        self.allies
            .iter()
            .filter(|a| !a.statuses.contains(tag))
            .count()
    }

    /// Fraction of living allies already holding a condition tag
    pub fn ally_coverage(&self, tag: StatusTag) -> f32 {
        if self.allies.is_empty() {
            return 0.0;
        }
        let holders = self
            .allies
            .iter()
            .filter(|a| a.statuses.contains(tag))
            .count();
        holders as f32 / self.allies.len() as f32
    }
}
