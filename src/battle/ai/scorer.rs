//! Heuristic action scoring and weighted-random selection
//!
//! Each usable candidate gets a score from the table below plus a small
//! symmetric jitter, then a weighted-random draw picks among the
//! strictly-positive scorers. When nothing scores positive the single best
//! candidate is taken anyway - a usable action always produces a decision.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::battle::action::{ActionDefinition, ActionInstance, EffectKind, OverrideRule, TargetMode};
use crate::battle::ai::decision_context::DecisionContext;
use crate::battle::ai::{Decision, DecisionModel};
use crate::battle::status::StatusTag;
use crate::core::types::CombatantId;

// HP/MP fraction thresholds the score table keys on
const HEAL_SKIP_THRESHOLD: f32 = 0.9;
const DESPERATE_THRESHOLD: f32 = 0.25;
const HURT_THRESHOLD: f32 = 0.5;
const ALLY_HEAL_THRESHOLD: f32 = 0.6;
const BUFF_COVERAGE_THRESHOLD: f32 = 0.7;

/// Score values for the candidate heuristic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicWeights {
    pub heal_self_desperate: f32,
    pub heal_self_hurt: f32,
    pub heal_self_minor: f32,
    pub heal_ally_desperate: f32,
    pub heal_ally_hurt: f32,
    pub heal_ally_minor: f32,
    pub attack_base: f32,
    pub attack_status_bonus: f32,
    pub buff_base: f32,
    pub buff_per_lacking_ally: f32,
    pub debuff_base: f32,
    pub mixed_base: f32,
    pub restore_desperate: f32,
    pub restore_hurt: f32,
    pub restore_minor: f32,
    /// Score for candidates that should never win a weighted draw
    pub unusable: f32,
    /// Symmetric jitter added to every score
    pub jitter: f32,
}

impl Default for HeuristicWeights {
    fn default() -> Self {
        Self {
            heal_self_desperate: 100.0,
            heal_self_hurt: 70.0,
            heal_self_minor: 30.0,
            heal_ally_desperate: 90.0,
            heal_ally_hurt: 60.0,
            heal_ally_minor: 40.0,
            attack_base: 50.0,
            attack_status_bonus: 20.0,
            buff_base: 40.0,
            buff_per_lacking_ally: 10.0,
            debuff_base: 45.0,
            mixed_base: 60.0,
            restore_desperate: 80.0,
            restore_hurt: 50.0,
            restore_minor: 25.0,
            unusable: -100.0,
            jitter: 5.0,
        }
    }
}

/// Coarse classification of what an action is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionClass {
    Attack,
    Heal,
    Restore,
    Buff,
    Debuff,
    Mixed,
    Unusable,
}

fn classify(definition: &ActionDefinition) -> ActionClass {
    match definition.override_rule {
        Some(OverrideRule::RestoreManaExact { .. }) => return ActionClass::Restore,
        Some(OverrideRule::FullRestore) => return ActionClass::Heal,
        None => {}
    }

    let mut kinds: Vec<EffectKind> = definition.effects.iter().map(|e| e.kind).collect();
    kinds.sort_by_key(|k| *k as u8);
    kinds.dedup();

    match kinds.len() {
        0 => ActionClass::Unusable,
        1 => match kinds[0] {
            EffectKind::Damage => ActionClass::Attack,
            EffectKind::Heal => ActionClass::Heal,
            EffectKind::RestoreResource => ActionClass::Restore,
            EffectKind::Buff => ActionClass::Buff,
            EffectKind::Debuff => ActionClass::Debuff,
        },
        _ => ActionClass::Mixed,
    }
}

/// The condition tag an action's first status-carrying effect applies
fn primary_status_tag(definition: &ActionDefinition) -> Option<StatusTag> {
    definition
        .effects
        .iter()
        .find_map(|e| e.status.as_ref().map(|s| s.tag))
}

/// Heuristic decision model with a seeded RNG
pub struct HeuristicBrain {
    weights: HeuristicWeights,
    rng: StdRng,
}

impl HeuristicBrain {
    /// Create with the default weight table and a fixed seed
    pub fn new() -> Self {
        Self::with_seed(42)
    }

    /// Create with a specific RNG seed for deterministic behavior
    pub fn with_seed(seed: u64) -> Self {
        Self {
            weights: HeuristicWeights::default(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn with_weights(mut self, weights: HeuristicWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Score a candidate before jitter
    pub fn score(&self, instance: &ActionInstance, context: &DecisionContext) -> f32 {
        let definition = &instance.definition;
        let w = &self.weights;

        match classify(definition) {
            ActionClass::Heal => match definition.target_mode {
                TargetMode::SelfOnly => {
                    let fraction = context.actor.hp_fraction();
                    if fraction >= HEAL_SKIP_THRESHOLD {
                        w.unusable
                    } else if fraction < DESPERATE_THRESHOLD {
                        w.heal_self_desperate
                    } else if fraction < HURT_THRESHOLD {
                        w.heal_self_hurt
                    } else {
                        w.heal_self_minor
                    }
                }
                _ => {
                    let worst = context.worst_ally_fraction().unwrap_or(1.0);
                    if worst >= ALLY_HEAL_THRESHOLD {
                        w.unusable
                    } else if worst < DESPERATE_THRESHOLD {
                        w.heal_ally_desperate
                    } else if worst < HURT_THRESHOLD {
                        w.heal_ally_hurt
                    } else {
                        w.heal_ally_minor
                    }
                }
            },
            ActionClass::Attack => {
                let status_count = definition
                    .effects
                    .iter()
                    .filter(|e| e.status.is_some())
                    .count();
                w.attack_base + w.attack_status_bonus * status_count as f32
            }
            ActionClass::Buff => {
                let Some(tag) = primary_status_tag(definition) else {
                    return w.unusable;
                };
                match definition.target_mode {
                    TargetMode::SelfOnly => {
                        if context.actor.statuses.contains(tag) {
                            w.unusable
                        } else {
                            w.buff_base
                        }
                    }
                    TargetMode::AllAllies => {
                        if context.ally_coverage(tag) >= BUFF_COVERAGE_THRESHOLD {
                            w.unusable
                        } else {
                            w.buff_base
                                + w.buff_per_lacking_ally * context.allies_lacking(tag) as f32
                        }
                    }
                    _ => {
                        w.buff_base + w.buff_per_lacking_ally * context.allies_lacking(tag) as f32
                    }
                }
            }
            ActionClass::Debuff => {
                let Some(tag) = primary_status_tag(definition) else {
                    return w.unusable;
                };
                match context.reference_target {
                    Some(target) if target.alive && !target.statuses.contains(tag) => {
                        w.debuff_base
                    }
                    _ => w.unusable,
                }
            }
            ActionClass::Restore => {
                let fraction = context.actor.mp_fraction();
                if fraction >= HEAL_SKIP_THRESHOLD {
                    w.unusable
                } else if fraction < DESPERATE_THRESHOLD {
                    w.restore_desperate
                } else if fraction < HURT_THRESHOLD {
                    w.restore_hurt
                } else {
                    w.restore_minor
                }
            }
            ActionClass::Mixed => w.mixed_base,
            ActionClass::Unusable => w.unusable,
        }
    }

    /// Resolve an action's target set per its mode
    pub fn choose_targets(
        &self,
        definition: &ActionDefinition,
        context: &DecisionContext,
    ) -> Vec<CombatantId> {
        match definition.target_mode {
            TargetMode::SelfOnly => vec![context.actor.id],
            TargetMode::SingleEnemy => context
                .reference_target
                .filter(|t| t.alive)
                .map(|t| vec![t.id])
                .unwrap_or_default(),
            TargetMode::SingleAlly => {
                let target = context
                    .most_wounded_other_ally()
                    .map(|a| a.id)
                    .unwrap_or(context.actor.id);
                vec![target]
            }
            TargetMode::AllAllies => context.allies.iter().map(|a| a.id).collect(),
            TargetMode::AllEnemies => context.opponents.iter().map(|o| o.id).collect(),
            TargetMode::Everyone => context
                .allies
                .iter()
                .chain(context.opponents.iter())
                .map(|c| c.id)
                .collect(),
        }
    }

    /// Weighted-random draw over strictly-positive scorers: sum the weights,
    /// draw uniform in [0, total), walk the list subtracting until the
    /// cursor drops below zero.
    fn weighted_pick(&mut self, positive: &[(usize, f32)]) -> usize {
        let total: f32 = positive.iter().map(|(_, s)| s).sum();
        let mut cursor = self.rng.gen_range(0.0..total);
        for (index, score) in positive {
            cursor -= score;
            if cursor < 0.0 {
                return *index;
            }
        }
        positive.last().map(|(i, _)| *i).unwrap_or(0)
    }
}

impl Default for HeuristicBrain {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionModel for HeuristicBrain {
    fn decide(&mut self, context: &DecisionContext) -> Option<Decision> {
        if context.usable.is_empty() {
            return None;
        }

        let jitter = self.weights.jitter;
        let scored: Vec<(usize, f32)> = context
            .usable
            .iter()
            .map(|&(index, instance)| {
                let base = self.score(instance, context);
                let noise = self.rng.gen_range(-jitter..=jitter);
                (index, base + noise)
            })
            .collect();

        let positive: Vec<(usize, f32)> =
            scored.iter().copied().filter(|(_, s)| *s > 0.0).collect();

        let action_index = if positive.is_empty() {
            // Never return None while something is usable: take the least bad
            scored
                .iter()
                .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(i, _)| *i)?
        } else {
            self.weighted_pick(&positive)
        };

        let definition = &context
            .usable
            .iter()
            .find(|(i, _)| *i == action_index)?
            .1
            .definition;
        let targets = self.choose_targets(definition, context);

        tracing::trace!(action = %definition.name, "decision made");
        Some(Decision {
            action_index,
            targets,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::action::{ActionInstance, Effect, Loadout};
    use crate::battle::combatant::Combatant;
    use crate::core::types::{Controller, Team};

    fn combatant(name: &str, team: Team, hp: u32, max_hp: u32) -> Combatant {
        let mut c = Combatant::new(name, team, Controller::Ai, max_hp, 50, 5.0, 10.0);
        c.hp = hp;
        c
    }

    fn self_heal() -> ActionInstance {
        ActionInstance::new(
            ActionDefinition::new("Second Wind", 8, TargetMode::SelfOnly)
                .with_effect(Effect::heal(30)),
        )
    }

    fn attack() -> ActionInstance {
        ActionInstance::new(
            ActionDefinition::new("Strike", 0, TargetMode::SingleEnemy)
                .with_effect(Effect::damage(20)),
        )
    }

    #[test]
    fn test_heal_scores_by_hp_fraction() {
        let brain = HeuristicBrain::new();
        let heal = self_heal();
        let enemy = combatant("Hero", Team::Ally, 100, 100);
        let loadout = Loadout::default();

        let desperate = combatant("Bandit", Team::Enemy, 10, 100);
        let ctx = DecisionContext::new(&desperate, &loadout, vec![&desperate], vec![&enemy]);
        assert_eq!(brain.score(&heal, &ctx), 100.0);

        let hurt = combatant("Bandit", Team::Enemy, 40, 100);
        let ctx = DecisionContext::new(&hurt, &loadout, vec![&hurt], vec![&enemy]);
        assert_eq!(brain.score(&heal, &ctx), 70.0);

        let scratched = combatant("Bandit", Team::Enemy, 80, 100);
        let ctx = DecisionContext::new(&scratched, &loadout, vec![&scratched], vec![&enemy]);
        assert_eq!(brain.score(&heal, &ctx), 30.0);

        let healthy = combatant("Bandit", Team::Enemy, 95, 100);
        let ctx = DecisionContext::new(&healthy, &loadout, vec![&healthy], vec![&enemy]);
        assert_eq!(brain.score(&heal, &ctx), -100.0, "never heal near full");
    }

    #[test]
    fn test_ally_heal_needs_a_wounded_ally() {
        let brain = HeuristicBrain::new();
        let mend = ActionInstance::new(
            ActionDefinition::new("Mend", 10, TargetMode::SingleAlly)
                .with_effect(Effect::heal(50)),
        );
        let loadout = Loadout::default();

        let actor = combatant("Priest", Team::Enemy, 80, 80);
        let healthy = combatant("Thug", Team::Enemy, 75, 100);
        let ctx = DecisionContext::new(&actor, &loadout, vec![&actor, &healthy], vec![]);
        assert_eq!(brain.score(&mend, &ctx), -100.0);

        let bleeding = combatant("Thug", Team::Enemy, 20, 100);
        let ctx = DecisionContext::new(&actor, &loadout, vec![&actor, &bleeding], vec![]);
        assert_eq!(brain.score(&mend, &ctx), 90.0);
    }

    #[test]
    fn test_attack_scores_status_riders() {
        let brain = HeuristicBrain::new();
        let loadout = Loadout::default();
        let actor = combatant("Bandit", Team::Enemy, 60, 60);
        let hero = combatant("Hero", Team::Ally, 100, 100);
        let ctx = DecisionContext::new(&actor, &loadout, vec![&actor], vec![&hero]);

        assert_eq!(brain.score(&attack(), &ctx), 50.0);

        let venom = ActionInstance::new(
            ActionDefinition::new("Venom Blade", 8, TargetMode::SingleEnemy)
                .with_effect(Effect::damage(18).with_status(StatusTag::Poison, 6.0, 3)),
        );
        assert_eq!(brain.score(&venom, &ctx), 70.0);
    }

    #[test]
    fn test_buff_avoids_redundant_refresh() {
        let brain = HeuristicBrain::new();
        let loadout = Loadout::default();
        let stone_skin = ActionInstance::new(
            ActionDefinition::new("Stone Skin", 6, TargetMode::SelfOnly)
                .with_effect(Effect::buff(StatusTag::DefenseUp, 8.0, 3)),
        );

        let mut actor = combatant("Bandit", Team::Enemy, 60, 60);
        let hero = combatant("Hero", Team::Ally, 100, 100);
        {
            let ctx = DecisionContext::new(&actor, &loadout, vec![&actor], vec![&hero]);
            assert_eq!(brain.score(&stone_skin, &ctx), 40.0);
        }

        actor.add_status(StatusTag::DefenseUp, 8.0, 3);
        let ctx = DecisionContext::new(&actor, &loadout, vec![&actor], vec![&hero]);
        assert_eq!(brain.score(&stone_skin, &ctx), -100.0);
    }

    #[test]
    fn test_group_buff_respects_coverage() {
        let brain = HeuristicBrain::new();
        let loadout = Loadout::default();
        let war_cry = ActionInstance::new(
            ActionDefinition::new("War Cry", 10, TargetMode::AllAllies)
                .with_effect(Effect::buff(StatusTag::AttackUp, 6.0, 3)),
        );

        let mut a = combatant("A", Team::Enemy, 60, 60);
        let mut b = combatant("B", Team::Enemy, 60, 60);
        let mut c = combatant("C", Team::Enemy, 60, 60);

        {
            let ctx = DecisionContext::new(&a, &loadout, vec![&a, &b, &c], vec![]);
            // Nobody buffed: 40 + 10 * 3
            assert_eq!(brain.score(&war_cry, &ctx), 70.0);

            // One of three buffed stays under the coverage threshold
        }
        a.add_status(StatusTag::AttackUp, 6.0, 3);
        {
            let ctx = DecisionContext::new(&a, &loadout, vec![&a, &b, &c], vec![]);
            assert_eq!(brain.score(&war_cry, &ctx), 60.0);
        }

        b.add_status(StatusTag::AttackUp, 6.0, 3);
        c.add_status(StatusTag::AttackUp, 6.0, 3);
        let ctx = DecisionContext::new(&a, &loadout, vec![&a, &b, &c], vec![]);
        // Full coverage: over the threshold
        assert!(brain.score(&war_cry, &ctx) < 0.0);
    }

    #[test]
    fn test_debuff_rejects_dead_or_tagged_reference() {
        let brain = HeuristicBrain::new();
        let loadout = Loadout::default();
        let cripple = ActionInstance::new(
            ActionDefinition::new("Cripple", 6, TargetMode::SingleEnemy)
                .with_effect(Effect::debuff(StatusTag::SpeedDown, 30.0, 3)),
        );
        let actor = combatant("Bandit", Team::Enemy, 60, 60);

        let mut hero = combatant("Hero", Team::Ally, 100, 100);
        {
            let ctx = DecisionContext::new(&actor, &loadout, vec![&actor], vec![&hero]);
            assert_eq!(brain.score(&cripple, &ctx), 45.0);
        }

        hero.add_status(StatusTag::SpeedDown, 30.0, 3);
        {
            let ctx = DecisionContext::new(&actor, &loadout, vec![&actor], vec![&hero]);
            assert_eq!(brain.score(&cripple, &ctx), -100.0, "already tagged");
        }

        hero.statuses.clear();
        hero.apply_damage(1000.0, true);
        let ctx = DecisionContext::new(&actor, &loadout, vec![&actor], vec![&hero]);
        assert_eq!(brain.score(&cripple, &ctx), -100.0, "dead reference");
    }

    #[test]
    fn test_mixed_action_flat_score() {
        let brain = HeuristicBrain::new();
        let loadout = Loadout::default();
        let actor = combatant("Bandit", Team::Enemy, 60, 60);
        let hero = combatant("Hero", Team::Ally, 100, 100);
        let ctx = DecisionContext::new(&actor, &loadout, vec![&actor], vec![&hero]);

        let drain = ActionInstance::new(
            ActionDefinition::new("Drain", 10, TargetMode::SingleEnemy)
                .with_effect(Effect::damage(15))
                .with_effect(Effect::heal(10)),
        );
        assert_eq!(brain.score(&drain, &ctx), 60.0);
    }

    #[test]
    fn test_zero_effect_action_scores_unusable() {
        let brain = HeuristicBrain::new();
        let loadout = Loadout::default();
        let actor = combatant("Bandit", Team::Enemy, 60, 60);
        let hero = combatant("Hero", Team::Ally, 100, 100);
        let ctx = DecisionContext::new(&actor, &loadout, vec![&actor], vec![&hero]);

        let feint =
            ActionInstance::new(ActionDefinition::new("Feint", 0, TargetMode::SingleEnemy));
        assert_eq!(brain.score(&feint, &ctx), -100.0);
    }

    #[test]
    fn test_decide_never_none_with_usable_action() {
        // Full HP: the self-heal scores -100, yet a decision must come back
        let mut brain = HeuristicBrain::with_seed(7);
        let actor = combatant("Bandit", Team::Enemy, 100, 100);
        let hero = combatant("Hero", Team::Ally, 100, 100);
        let loadout = Loadout::new(vec![self_heal()]);

        let ctx = DecisionContext::new(&actor, &loadout, vec![&actor], vec![&hero]);
        let decision = brain.decide(&ctx).expect("fallback must pick something");
        assert_eq!(decision.action_index, 0);
    }

    #[test]
    fn test_decide_none_without_usable_actions() {
        let mut brain = HeuristicBrain::with_seed(7);
        let mut actor = combatant("Bandit", Team::Enemy, 60, 60);
        actor.mp = 0;
        let hero = combatant("Hero", Team::Ally, 100, 100);
        let loadout = Loadout::new(vec![ActionInstance::new(
            ActionDefinition::new("Fireball", 12, TargetMode::SingleEnemy)
                .with_effect(Effect::damage(35)),
        )]);

        let ctx = DecisionContext::new(&actor, &loadout, vec![&actor], vec![&hero]);
        assert!(brain.decide(&ctx).is_none());
    }

    #[test]
    fn test_wounded_actor_prefers_heal_over_attack() {
        // At 10% HP the heal (score 100) must win strictly more often than
        // the attack (score 50) across many samples
        let mut brain = HeuristicBrain::with_seed(1234);
        let actor = combatant("Bandit", Team::Enemy, 10, 100);
        let hero = combatant("Hero", Team::Ally, 100, 100);
        let loadout = Loadout::new(vec![self_heal(), attack()]);

        let mut heal_picks = 0u32;
        let mut attack_picks = 0u32;
        for _ in 0..1000 {
            let ctx = DecisionContext::new(&actor, &loadout, vec![&actor], vec![&hero]);
            match brain.decide(&ctx).unwrap().action_index {
                0 => heal_picks += 1,
                _ => attack_picks += 1,
            }
        }

        assert!(
            heal_picks > attack_picks,
            "heal picked {} times vs attack {}",
            heal_picks,
            attack_picks
        );
    }

    #[test]
    fn test_targets_single_ally_picks_most_wounded() {
        let brain = HeuristicBrain::new();
        let loadout = Loadout::default();
        let actor = combatant("Priest", Team::Enemy, 80, 80);
        let thug = combatant("Thug", Team::Enemy, 50, 100);
        let brute = combatant("Brute", Team::Enemy, 20, 100);

        let ctx = DecisionContext::new(&actor, &loadout, vec![&actor, &thug, &brute], vec![]);
        let mend = ActionDefinition::new("Mend", 10, TargetMode::SingleAlly)
            .with_effect(Effect::heal(50));
        assert_eq!(brain.choose_targets(&mend, &ctx), vec![brute.id]);
    }

    #[test]
    fn test_targets_single_ally_falls_back_to_self() {
        let brain = HeuristicBrain::new();
        let loadout = Loadout::default();
        let actor = combatant("Priest", Team::Enemy, 80, 80);

        let ctx = DecisionContext::new(&actor, &loadout, vec![&actor], vec![]);
        let mend = ActionDefinition::new("Mend", 10, TargetMode::SingleAlly)
            .with_effect(Effect::heal(50));
        assert_eq!(brain.choose_targets(&mend, &ctx), vec![actor.id]);
    }

    #[test]
    fn test_targets_everyone_spans_both_sides() {
        let brain = HeuristicBrain::new();
        let loadout = Loadout::default();
        let actor = combatant("Bandit", Team::Enemy, 60, 60);
        let thug = combatant("Thug", Team::Enemy, 60, 60);
        let hero = combatant("Hero", Team::Ally, 100, 100);

        let ctx = DecisionContext::new(&actor, &loadout, vec![&actor, &thug], vec![&hero]);
        let quake = ActionDefinition::new("Quake", 20, TargetMode::Everyone)
            .with_effect(Effect::damage(15));
        assert_eq!(brain.choose_targets(&quake, &ctx).len(), 3);
    }
}
