//! Combatant state - HP/MP pools, readiness gauge, and live conditions
//!
//! All mutation funnels through the methods here so HP/MP stay clamped to
//! [0, max], readiness stays in [0, READINESS_MAX], and the dead stay inert:
//! a combatant crosses to dead exactly once, drops its statuses, and ignores
//! every later damage/heal/gauge call.

use serde::{Deserialize, Serialize};

use crate::battle::constants::{MIN_DAMAGE, MIN_DAMAGE_MULTIPLIER, READINESS_MAX};
use crate::battle::status::{Recurring, StatusSet, StatusTag};
use crate::core::types::{CombatantId, Controller, Team};

/// Outcome of one condition firing during a turn tick
#[derive(Debug, Clone)]
pub struct StatusTick {
    pub tag: StatusTag,
    /// HP change from the recurring effect: negative for damage, positive
    /// for healing, zero for pure stat modifiers
    pub hp_delta: i32,
    pub expired: bool,
}

/// A participant in the encounter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub team: Team,
    pub controller: Controller,

    pub hp: u32,
    pub max_hp: u32,
    pub mp: u32,
    pub max_mp: u32,
    pub base_defense: f32,
    pub base_speed: f32,

    pub readiness: f32,
    pub ready: bool,
    /// Start-of-turn status tick already fired this readiness cycle
    #[serde(default)]
    pub turn_ticked: bool,
    pub alive: bool,
    /// Death triggers a last-stand negotiation instead of being final.
    /// Consumed the first time it fires.
    pub last_stand: bool,

    pub statuses: StatusSet,
}

impl Combatant {
    pub fn new(
        name: impl Into<String>,
        team: Team,
        controller: Controller,
        max_hp: u32,
        max_mp: u32,
        base_defense: f32,
        base_speed: f32,
    ) -> Self {
        Self {
            id: CombatantId::new(),
            name: name.into(),
            team,
            controller,
            hp: max_hp,
            max_hp,
            mp: max_mp,
            max_mp,
            base_defense,
            base_speed,
            readiness: 0.0,
            ready: false,
            turn_ticked: false,
            alive: true,
            last_stand: false,
            statuses: StatusSet::new(),
        }
    }

    /// Mark this combatant as qualifying for a death interrupt
    pub fn with_last_stand(mut self) -> Self {
        self.last_stand = true;
        self
    }

    pub fn hp_fraction(&self) -> f32 {
        if self.max_hp == 0 {
            return 0.0;
        }
        self.hp as f32 / self.max_hp as f32
    }

    pub fn mp_fraction(&self) -> f32 {
        if self.max_mp == 0 {
            return 0.0;
        }
        self.mp as f32 / self.max_mp as f32
    }

    // ===== Derived stats =====

    /// Base defense plus flat condition modifiers
    pub fn effective_defense(&self) -> f32 {
        self.base_defense + self.statuses.sum(StatusTag::DefenseUp)
            - self.statuses.sum(StatusTag::DefenseDown)
    }

    /// Base speed scaled by the net speed-modifier percentage, floored at 0
    pub fn effective_speed(&self) -> f32 {
        let percent =
            self.statuses.sum(StatusTag::SpeedUp) - self.statuses.sum(StatusTag::SpeedDown);
        (self.base_speed * (1.0 + percent / 100.0)).max(0.0)
    }

    /// Flat attack bonus added to outgoing effect power
    pub fn effective_attack_bonus(&self) -> f32 {
        self.statuses.sum(StatusTag::AttackUp) - self.statuses.sum(StatusTag::AttackDown)
    }

    /// Incoming-damage multiplier, clamped so no amount of Protected drops
    /// it below MIN_DAMAGE_MULTIPLIER
    pub fn damage_multiplier(&self) -> f32 {
        let raw = 1.0 + self.statuses.sum(StatusTag::Vulnerable)
            - self.statuses.sum(StatusTag::Protected);
        raw.max(MIN_DAMAGE_MULTIPLIER)
    }

    // ===== Mutators =====

    /// Apply damage and return the HP actually removed.
    ///
    /// Unless `ignores_defense`, effective defense is subtracted first and
    /// the result floored at MIN_DAMAGE. The target's damage multiplier is
    /// applied after the floor and the product rounded to the nearest
    /// integer. No-op on the dead.
    pub fn apply_damage(&mut self, amount: f32, ignores_defense: bool) -> u32 {
        if !self.alive {
            return 0;
        }

        let base = if ignores_defense {
            amount
        } else {
            (amount - self.effective_defense()).max(MIN_DAMAGE)
        };
        let applied = (base * self.damage_multiplier()).round().max(0.0) as u32;

        self.hp = self.hp.saturating_sub(applied);
        if self.hp == 0 {
            self.die();
        }
        applied
    }

    /// Heal up to max HP, returning the HP actually gained. No-op on the dead.
    pub fn heal(&mut self, amount: u32) -> u32 {
        if !self.alive {
            return 0;
        }
        let actual = amount.min(self.max_hp - self.hp);
        self.hp += actual;
        actual
    }

    /// Restore up to max MP, returning the MP actually gained. No-op on the dead.
    pub fn restore_mana(&mut self, amount: u32) -> u32 {
        if !self.alive {
            return 0;
        }
        let actual = amount.min(self.max_mp - self.mp);
        self.mp += actual;
        actual
    }

    /// Deduct a mana cost. Returns false (and deducts nothing) when short.
    pub fn spend_mana(&mut self, cost: u32) -> bool {
        if self.mp < cost {
            return false;
        }
        self.mp -= cost;
        true
    }

    /// Apply a condition with refresh semantics.
    ///
    /// Returns false without mutating when the combatant is dead or the
    /// duration is zero (a status with no turns would be an orphan).
    pub fn add_status(&mut self, tag: StatusTag, magnitude: f32, duration: u32) -> bool {
        if !self.alive || duration == 0 {
            return false;
        }
        self.statuses.apply(tag, magnitude, duration);
        true
    }

    /// Run the per-turn status tick: decrement, fire recurring effects in
    /// insertion order, then drop expired conditions.
    ///
    /// A recurring tick that kills the owner clears the set and stops the
    /// remaining entries from firing.
    pub fn tick_statuses(&mut self) -> Vec<StatusTick> {
        if !self.alive {
            return Vec::new();
        }

        let pending = self.statuses.begin_turn();
        let mut outcomes = Vec::with_capacity(pending.len());

        for tick in pending {
            let hp_delta = match tick.tag.recurring() {
                Some(Recurring::Damage) => {
                    let applied = self.apply_damage(tick.magnitude, true);
                    -(applied as i32)
                }
                Some(Recurring::Heal) => self.heal(tick.magnitude.round() as u32) as i32,
                None => 0,
            };

            outcomes.push(StatusTick {
                tag: tick.tag,
                hp_delta,
                expired: tick.expires,
            });

            if !self.alive {
                break;
            }
        }

        if self.alive {
            self.statuses.remove_expired();
        }
        outcomes
    }

    pub fn clear_statuses(&mut self) {
        self.statuses.clear();
    }

    /// Cleanse negative conditions, returning the removed tags
    pub fn clear_negative_statuses(&mut self) -> Vec<StatusTag> {
        self.statuses.clear_negative()
    }

    // ===== Readiness =====

    /// Add gauge progress, clamping at READINESS_MAX. Returns true when the
    /// combatant crossed into ready this call.
    pub fn gain_readiness(&mut self, amount: f32) -> bool {
        if !self.alive || self.ready {
            return false;
        }
        self.readiness = (self.readiness + amount).clamp(0.0, READINESS_MAX);
        if self.readiness >= READINESS_MAX {
            self.ready = true;
        }
        self.ready
    }

    /// Consume the turn: zero the gauge and drop the ready flag
    pub fn reset_readiness(&mut self) {
        self.readiness = 0.0;
        self.ready = false;
        self.turn_ticked = false;
    }

    /// Bring a dead combatant back with the given HP (interrupt revive)
    pub fn revive(&mut self, hp: u32) {
        if self.alive {
            return;
        }
        self.alive = true;
        self.hp = hp.clamp(1, self.max_hp);
        self.reset_readiness();
    }

    fn die(&mut self) {
        self.alive = false;
        self.ready = false;
        self.readiness = 0.0;
        self.statuses.clear();
        tracing::debug!(name = %self.name, "combatant died");
    }
}

/// Every participant in the encounter, both sides together
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    pub combatants: Vec<Combatant>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, combatant: Combatant) {
        self.combatants.push(combatant);
    }

    pub fn get(&self, id: CombatantId) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: CombatantId) -> Option<&mut Combatant> {
        self.combatants.iter_mut().find(|c| c.id == id)
    }

    /// Living members of a team, in roster order
    pub fn living(&self, team: Team) -> Vec<&Combatant> {
        self.combatants
            .iter()
            .filter(|c| c.alive && c.team == team)
            .collect()
    }

    pub fn any_living(&self, team: Team) -> bool {
        self.combatants.iter().any(|c| c.alive && c.team == team)
    }

    /// First living member of a team (the AI's reference target)
    pub fn first_living(&self, team: Team) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.alive && c.team == team)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Combatant> {
        self.combatants.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Combatant> {
        self.combatants.iter_mut()
    }
}
