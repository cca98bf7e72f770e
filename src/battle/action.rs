//! Action templates and per-encounter use-instances
//!
//! `ActionDefinition` is immutable authored data. Gameplay only ever touches
//! `ActionInstance` clones, so consumable bookkeeping never leaks back into
//! the catalog.

use serde::{Deserialize, Serialize};

use crate::battle::combatant::Combatant;
use crate::battle::status::StatusTag;

/// How an action picks its targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetMode {
    SelfOnly,
    SingleAlly,
    SingleEnemy,
    AllAllies,
    AllEnemies,
    Everyone,
}

impl TargetMode {
    /// Whether the mode addresses the actor's own side
    pub fn targets_allies(&self) -> bool {
        matches!(
            self,
            TargetMode::SelfOnly | TargetMode::SingleAlly | TargetMode::AllAllies
        )
    }

    pub fn is_single(&self) -> bool {
        matches!(
            self,
            TargetMode::SelfOnly | TargetMode::SingleAlly | TargetMode::SingleEnemy
        )
    }
}

/// Primary consequence of one effect entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    Damage,
    Heal,
    RestoreResource,
    Buff,
    Debuff,
}

/// A status condition an effect attaches to its target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusApplication {
    pub tag: StatusTag,
    pub magnitude: f32,
    pub duration: u32,
}

/// One unit of an action's consequence
///
/// The optional `self_effect` is the same shape applied to the actor rather
/// than the target (recoil, self-buffs, HP-for-MP trades). Only one level of
/// nesting is honored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
    pub power: u32,
    #[serde(default)]
    pub ignores_defense: bool,
    #[serde(default)]
    pub status: Option<StatusApplication>,
    #[serde(default)]
    pub self_effect: Option<Box<Effect>>,
}

impl Effect {
    pub fn damage(power: u32) -> Self {
        Self {
            kind: EffectKind::Damage,
            power,
            ignores_defense: false,
            status: None,
            self_effect: None,
        }
    }

    pub fn heal(power: u32) -> Self {
        Self {
            kind: EffectKind::Heal,
            power,
            ignores_defense: false,
            status: None,
            self_effect: None,
        }
    }

    pub fn restore(power: u32) -> Self {
        Self {
            kind: EffectKind::RestoreResource,
            power,
            ignores_defense: false,
            status: None,
            self_effect: None,
        }
    }

    pub fn buff(tag: StatusTag, magnitude: f32, duration: u32) -> Self {
        Self {
            kind: EffectKind::Buff,
            power: 0,
            ignores_defense: false,
            status: Some(StatusApplication {
                tag,
                magnitude,
                duration,
            }),
            self_effect: None,
        }
    }

    pub fn debuff(tag: StatusTag, magnitude: f32, duration: u32) -> Self {
        Self {
            kind: EffectKind::Debuff,
            power: 0,
            ignores_defense: false,
            status: Some(StatusApplication {
                tag,
                magnitude,
                duration,
            }),
            self_effect: None,
        }
    }

    pub fn with_status(mut self, tag: StatusTag, magnitude: f32, duration: u32) -> Self {
        self.status = Some(StatusApplication {
            tag,
            magnitude,
            duration,
        });
        self
    }

    pub fn with_self_effect(mut self, effect: Effect) -> Self {
        self.self_effect = Some(Box::new(effect));
        self
    }
}

/// Escape hatch for actions the generic effect list cannot express
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OverrideRule {
    /// Restore an exact mana amount to each target, no effect list involved
    RestoreManaExact { amount: u32 },
    /// Fully restore HP and MP and cleanse negative conditions
    FullRestore,
}

/// Immutable template describing a usable action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDefinition {
    pub name: String,
    pub mp_cost: u32,
    pub target_mode: TargetMode,
    pub effects: Vec<Effect>,
    /// Consumables carry a finite use count; None means unlimited
    #[serde(default)]
    pub max_uses: Option<u32>,
    #[serde(default)]
    pub override_rule: Option<OverrideRule>,
}

impl ActionDefinition {
    pub fn new(name: impl Into<String>, mp_cost: u32, target_mode: TargetMode) -> Self {
        Self {
            name: name.into(),
            mp_cost,
            target_mode,
            effects: Vec::new(),
            max_uses: None,
            override_rule: None,
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn consumable(mut self, max_uses: u32) -> Self {
        self.max_uses = Some(max_uses);
        self
    }

    pub fn with_override(mut self, rule: OverrideRule) -> Self {
        self.override_rule = Some(rule);
        self
    }

    pub fn is_consumable(&self) -> bool {
        self.max_uses.is_some()
    }
}

/// Per-encounter use-instance of an action template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionInstance {
    pub definition: ActionDefinition,
    /// Remaining uses for consumables; None for unlimited actions
    pub remaining_uses: Option<u32>,
}

impl ActionInstance {
    pub fn new(definition: ActionDefinition) -> Self {
        let remaining_uses = definition.max_uses;
        Self {
            definition,
            remaining_uses,
        }
    }

    /// The availability predicate: consumables need uses left (mana cost is
    /// bypassed), everything else needs the actor to afford the cost.
    pub fn is_usable_by(&self, actor: &Combatant) -> bool {
        match self.remaining_uses {
            Some(uses) => uses > 0,
            None => actor.mp >= self.definition.mp_cost,
        }
    }

    /// Burn one use after a successful application. No-op for unlimited
    /// actions.
    pub fn consume_use(&mut self) {
        if let Some(uses) = self.remaining_uses.as_mut() {
            *uses = uses.saturating_sub(1);
        }
    }
}

/// The actions a combatant brings into an encounter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Loadout {
    pub actions: Vec<ActionInstance>,
}

impl Loadout {
    pub fn new(actions: Vec<ActionInstance>) -> Self {
        Self { actions }
    }

    /// Indices of actions the actor can currently use
    pub fn usable_indices(&self, actor: &Combatant) -> Vec<usize> {
        self.actions
            .iter()
            .enumerate()
            .filter(|(_, a)| a.is_usable_by(actor))
            .map(|(i, _)| i)
            .collect()
    }
}
