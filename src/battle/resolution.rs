//! Action resolution pipeline
//!
//! `resolve_action` is the only path that turns an action into combatant
//! mutations. The contract is validate-then-apply-then-decrement: every
//! precondition is checked before the first mutation, the cost is paid
//! exactly once, and a rejected action leaves the roster untouched.

use thiserror::Error;

use crate::battle::action::{ActionInstance, Effect, EffectKind, OverrideRule, TargetMode};
use crate::battle::combatant::Roster;
use crate::battle::events::{BattleEventLog, BattleEventType};
use crate::core::types::{CombatantId, Tick};

/// Reasons an action request is rejected before any mutation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("insufficient resource: need {required}, have {available}")]
    InsufficientResource { required: u32, available: u32 },

    #[error("no uses remaining")]
    NoUsesRemaining,

    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("actor is dead")]
    DeadActor,

    #[error("combatant not found in roster")]
    UnknownCombatant,

    #[error("no action at that loadout index")]
    UnknownAction,

    #[error("combatant is not awaiting input")]
    NotAwaitingInput,
}

/// Observable outcome of one resolved action
#[derive(Debug, Clone)]
pub struct ResolutionReport {
    pub action: String,
    pub log: BattleEventLog,
    /// Combatants that died during this resolution, in order
    pub deaths: Vec<CombatantId>,
}

/// Resolve an action against its target set.
///
/// Preconditions: the actor is alive and can pay (mana for normal actions,
/// a remaining use for consumables); every supplied target matches the
/// action's mode and is alive. An empty target list for a non-self mode is
/// a completed no-op. Targets that die mid-resolution are skipped for the
/// remaining target-directed effects; self-effects still land unless the
/// actor itself died.
pub fn resolve_action(
    actor_id: CombatantId,
    instance: &mut ActionInstance,
    roster: &mut Roster,
    targets: &[CombatantId],
    tick: Tick,
) -> Result<ResolutionReport, ResolveError> {
    let definition = instance.definition.clone();

    let actor = roster.get(actor_id).ok_or(ResolveError::UnknownCombatant)?;
    if !actor.alive {
        return Err(ResolveError::DeadActor);
    }
    let actor_name = actor.name.clone();

    // Availability: consumables bypass the mana check entirely
    match instance.remaining_uses {
        Some(0) => return Err(ResolveError::NoUsesRemaining),
        Some(_) => {}
        None => {
            if actor.mp < definition.mp_cost {
                return Err(ResolveError::InsufficientResource {
                    required: definition.mp_cost,
                    available: actor.mp,
                });
            }
        }
    }

    let resolved_targets = validate_targets(actor_id, roster, definition.target_mode, targets)?;

    let mut report = ResolutionReport {
        action: definition.name.clone(),
        log: BattleEventLog::new(),
        deaths: Vec::new(),
    };

    if resolved_targets.is_empty() {
        // Nothing to act on: a completed no-op, no cost paid
        report.log.push(
            BattleEventType::ActionUsed {
                combatant: actor_id,
                action: definition.name.clone(),
            },
            format!("{} uses {} (no valid targets)", actor_name, definition.name),
            tick,
        );
        return Ok(report);
    }

    tracing::debug!(actor = %actor_name, action = %definition.name, "resolving action");

    // Cost is paid exactly once, before the target loop
    if !definition.is_consumable() {
        let paid = roster
            .get_mut(actor_id)
            .map(|a| a.spend_mana(definition.mp_cost))
            .unwrap_or(false);
        debug_assert!(paid, "cost was validated above");
    }

    report.log.push(
        BattleEventType::ActionUsed {
            combatant: actor_id,
            action: definition.name.clone(),
        },
        format!("{} uses {}", actor_name, definition.name),
        tick,
    );

    match definition.override_rule {
        Some(rule) => {
            for &target_id in &resolved_targets {
                apply_override(rule, target_id, roster, tick, &mut report);
            }
        }
        None => {
            for effect in &definition.effects {
                let actor_alive = roster.get(actor_id).map(|a| a.alive).unwrap_or(false);
                if !actor_alive {
                    // Recoil killed the caster; the rest of the action fizzles
                    break;
                }
                let attack_bonus = roster
                    .get(actor_id)
                    .map(|a| a.effective_attack_bonus())
                    .unwrap_or(0.0);

                for &target_id in &resolved_targets {
                    apply_effect(effect, attack_bonus, target_id, roster, false, tick, &mut report);
                }

                // Self-effects land once per entry, whatever happened to the targets
                if let Some(self_effect) = &effect.self_effect {
                    apply_effect(self_effect, 0.0, actor_id, roster, true, tick, &mut report);
                }
            }
        }
    }

    instance.consume_use();

    Ok(report)
}

/// Check the supplied targets against the action's mode and team rules.
///
/// Self-only modes ignore the supplied list and act on the actor.
fn validate_targets(
    actor_id: CombatantId,
    roster: &Roster,
    mode: TargetMode,
    targets: &[CombatantId],
) -> Result<Vec<CombatantId>, ResolveError> {
    if mode == TargetMode::SelfOnly {
        return Ok(vec![actor_id]);
    }

    let actor_team = roster
        .get(actor_id)
        .ok_or(ResolveError::UnknownCombatant)?
        .team;

    if mode.is_single() && targets.len() > 1 {
        return Err(ResolveError::InvalidTarget(format!(
            "{:?} expects a single target, got {}",
            mode,
            targets.len()
        )));
    }

    for &target_id in targets {
        let target = roster
            .get(target_id)
            .ok_or_else(|| ResolveError::InvalidTarget("unknown combatant".into()))?;

        if !target.alive {
            return Err(ResolveError::InvalidTarget(format!(
                "{} is dead",
                target.name
            )));
        }

        let team_ok = match mode {
            TargetMode::SelfOnly => unreachable!("handled above"),
            TargetMode::SingleAlly | TargetMode::AllAllies => target.team == actor_team,
            TargetMode::SingleEnemy | TargetMode::AllEnemies => target.team != actor_team,
            TargetMode::Everyone => true,
        };
        if !team_ok {
            return Err(ResolveError::InvalidTarget(format!(
                "{} is on the wrong side for {:?}",
                target.name, mode
            )));
        }
    }

    Ok(targets.to_vec())
}

/// Apply one effect to one target. Dead targets are skipped silently, per
/// the no-partial-application rule.
fn apply_effect(
    effect: &Effect,
    attack_bonus: f32,
    target_id: CombatantId,
    roster: &mut Roster,
    self_inflicted: bool,
    tick: Tick,
    report: &mut ResolutionReport,
) {
    let Some(target) = roster.get_mut(target_id) else {
        return;
    };
    if !target.alive {
        return;
    }
    let target_name = target.name.clone();

    match effect.kind {
        EffectKind::Damage => {
            let offense = (effect.power as f32 + attack_bonus).max(0.0);
            let applied = target.apply_damage(offense, effect.ignores_defense);
            let died = !target.alive;
            report.log.push(
                BattleEventType::DamageApplied {
                    target: target_id,
                    amount: applied,
                    critical: false,
                },
                format!("{} takes {} damage", target_name, applied),
                tick,
            );
            if died {
                report.deaths.push(target_id);
                report.log.push(
                    BattleEventType::CombatantDied {
                        combatant: target_id,
                    },
                    format!("{} falls", target_name),
                    tick,
                );
                return;
            }
        }
        EffectKind::Heal => {
            let actual = target.heal(effect.power);
            report.log.push(
                BattleEventType::HealApplied {
                    target: target_id,
                    amount: actual,
                },
                format!("{} recovers {} HP", target_name, actual),
                tick,
            );
        }
        EffectKind::RestoreResource => {
            let actual = target.restore_mana(effect.power);
            report.log.push(
                BattleEventType::ResourceRestored {
                    target: target_id,
                    amount: actual,
                },
                format!("{} recovers {} MP", target_name, actual),
                tick,
            );
        }
        EffectKind::Buff | EffectKind::Debuff => {
            // The payload is the status application below
        }
    }

    if let Some(status) = &effect.status {
        if status.duration > 0 {
            if let Some(target) = roster.get_mut(target_id) {
                if target.add_status(status.tag, status.magnitude, status.duration) {
                    report.log.push(
                        BattleEventType::StatusApplied {
                            target: target_id,
                            tag: status.tag,
                            duration: status.duration,
                            self_inflicted,
                        },
                        format!("{} gains {:?} ({} turns)", target_name, status.tag, status.duration),
                        tick,
                    );
                }
            }
        }
    }
}

/// Resolve an override rule against one target
fn apply_override(
    rule: OverrideRule,
    target_id: CombatantId,
    roster: &mut Roster,
    tick: Tick,
    report: &mut ResolutionReport,
) {
    let Some(target) = roster.get_mut(target_id) else {
        return;
    };
    if !target.alive {
        return;
    }
    let target_name = target.name.clone();

    match rule {
        OverrideRule::RestoreManaExact { amount } => {
            let actual = target.restore_mana(amount);
            report.log.push(
                BattleEventType::ResourceRestored {
                    target: target_id,
                    amount: actual,
                },
                format!("{} recovers {} MP", target_name, actual),
                tick,
            );
        }
        OverrideRule::FullRestore => {
            let healed = target.heal(target.max_hp);
            let restored = target.restore_mana(target.max_mp);
            let cleansed = target.clear_negative_statuses();

            report.log.push(
                BattleEventType::HealApplied {
                    target: target_id,
                    amount: healed,
                },
                format!("{} is fully healed", target_name),
                tick,
            );
            report.log.push(
                BattleEventType::ResourceRestored {
                    target: target_id,
                    amount: restored,
                },
                format!("{} is fully restored", target_name),
                tick,
            );
            for tag in cleansed {
                report.log.push(
                    BattleEventType::StatusExpired {
                        target: target_id,
                        tag,
                    },
                    format!("{} is cleansed of {:?}", target_name, tag),
                    tick,
                );
            }
        }
    }
}
