//! Action catalog - the authoring/data collaborator
//!
//! Supplies immutable [`ActionDefinition`] templates at encounter setup.
//! Encounters receive per-combatant [`Loadout`]s of cloned use-instances,
//! so nothing here is mutated by gameplay.

use serde::Deserialize;
use thiserror::Error;

use crate::battle::action::{
    ActionDefinition, ActionInstance, Effect, Loadout, OverrideRule, TargetMode,
};
use crate::battle::status::StatusTag;
use crate::core::error::{CombatError, Result};

/// Catalog of all authored actions
#[derive(Debug, Clone, Default)]
pub struct ActionCatalog {
    actions: Vec<ActionDefinition>,
}

#[derive(Debug, Deserialize)]
struct TomlActions {
    actions: Vec<ActionDefinition>,
}

/// Error type for catalog loading
#[derive(Debug, Clone, Error)]
pub enum CatalogLoadError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ActionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the built-in action library
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();

        catalog.add(
            ActionDefinition::new("Strike", 0, TargetMode::SingleEnemy)
                .with_effect(Effect::damage(20)),
        );
        catalog.add(
            ActionDefinition::new("Fireball", 12, TargetMode::SingleEnemy)
                .with_effect(Effect::damage(35)),
        );
        catalog.add(
            ActionDefinition::new("Venom Blade", 8, TargetMode::SingleEnemy)
                .with_effect(Effect::damage(18).with_status(StatusTag::Poison, 6.0, 3)),
        );
        catalog.add(
            ActionDefinition::new("Mend", 10, TargetMode::SingleAlly)
                .with_effect(Effect::heal(50)),
        );
        catalog.add(
            ActionDefinition::new("Second Wind", 8, TargetMode::SelfOnly)
                .with_effect(Effect::heal(30)),
        );
        catalog.add(
            ActionDefinition::new("War Cry", 10, TargetMode::AllAllies)
                .with_effect(Effect::buff(StatusTag::AttackUp, 6.0, 3)),
        );
        catalog.add(
            ActionDefinition::new("Stone Skin", 6, TargetMode::SelfOnly)
                .with_effect(Effect::buff(StatusTag::DefenseUp, 8.0, 3)),
        );
        catalog.add(
            ActionDefinition::new("Cripple", 6, TargetMode::SingleEnemy)
                .with_effect(Effect::debuff(StatusTag::SpeedDown, 30.0, 3)),
        );
        catalog.add(
            ActionDefinition::new("Expose", 9, TargetMode::SingleEnemy)
                .with_effect(Effect::debuff(StatusTag::Vulnerable, 0.5, 2)),
        );

        // Recoil: the swing costs the attacker 8 HP after it lands
        catalog.add(
            ActionDefinition::new("Reckless Swing", 0, TargetMode::SingleEnemy).with_effect(
                Effect::damage(45).with_self_effect(Effect {
                    kind: crate::battle::action::EffectKind::Damage,
                    power: 8,
                    ignores_defense: true,
                    status: None,
                    self_effect: None,
                }),
            ),
        );

        // HP-for-MP trade, both halves land on the caster
        catalog.add(
            ActionDefinition::new("Blood Pact", 0, TargetMode::SelfOnly).with_effect(
                Effect::restore(25).with_self_effect(Effect {
                    kind: crate::battle::action::EffectKind::Damage,
                    power: 12,
                    ignores_defense: true,
                    status: None,
                    self_effect: None,
                }),
            ),
        );

        catalog.add(
            ActionDefinition::new("Potion", 0, TargetMode::SingleAlly)
                .with_effect(Effect::heal(40))
                .consumable(2),
        );
        catalog.add(
            ActionDefinition::new("Ether", 0, TargetMode::SingleAlly)
                .with_override(OverrideRule::RestoreManaExact { amount: 30 })
                .consumable(3),
        );
        catalog.add(
            ActionDefinition::new("Elixir", 0, TargetMode::SelfOnly)
                .with_override(OverrideRule::FullRestore)
                .consumable(1),
        );

        catalog
    }

    pub fn add(&mut self, definition: ActionDefinition) {
        self.actions.push(definition);
    }

    pub fn get(&self, name: &str) -> Option<&ActionDefinition> {
        self.actions.iter().find(|a| a.name == name)
    }

    pub fn all(&self) -> &[ActionDefinition] {
        &self.actions
    }

    /// Build a per-encounter loadout of cloned use-instances
    pub fn instantiate(&self, names: &[&str]) -> Result<Loadout> {
        let mut actions = Vec::with_capacity(names.len());
        for name in names {
            let definition = self
                .get(name)
                .ok_or_else(|| CombatError::ActionNotFound((*name).to_string()))?;
            actions.push(ActionInstance::new(definition.clone()));
        }
        Ok(Loadout::new(actions))
    }

    /// Load a catalog from a TOML file
    pub fn load_from_toml(path: &std::path::Path) -> std::result::Result<Self, CatalogLoadError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| CatalogLoadError::Io(e.to_string()))?;
        Self::parse_toml(&content)
    }

    /// Parse a catalog from a TOML string
    pub fn parse_toml(content: &str) -> std::result::Result<Self, CatalogLoadError> {
        let data: TomlActions =
            toml::from_str(content).map_err(|e| CatalogLoadError::Parse(e.to_string()))?;

        let mut catalog = Self::new();
        for action in data.actions {
            catalog.add(action);
        }
        Ok(catalog)
    }
}
