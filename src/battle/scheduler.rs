//! Readiness scheduler - advances every living combatant's gauge each step
//!
//! Cooperative and tick-driven: gauges fill at `effective_speed × tick_scale
//! × dt` and clamp at READINESS_MAX. The scheduler only reports who crossed
//! the line; resolution order among same-step arrivals belongs to the
//! caller.

use crate::battle::combatant::Roster;
use crate::battle::constants::READINESS_MAX;
use crate::core::types::CombatantId;

/// Advance all living, not-yet-ready gauges by one simulation step.
///
/// Returns the ids that became ready this step, in roster order.
pub fn advance_readiness(roster: &mut Roster, dt: f32, tick_scale: f32) -> Vec<CombatantId> {
    if dt <= 0.0 {
        return Vec::new();
    }

    let mut newly_ready = Vec::new();
    for combatant in roster.iter_mut() {
        if !combatant.alive || combatant.ready {
            continue;
        }
        let gain = combatant.effective_speed() * tick_scale * dt;
        if combatant.gain_readiness(gain) {
            tracing::trace!(name = %combatant.name, "readiness gauge filled");
            newly_ready.push(combatant.id);
        }
    }
    newly_ready
}

/// All currently ready combatants, in roster order
pub fn ready_combatants(roster: &Roster) -> Vec<CombatantId> {
    roster
        .iter()
        .filter(|c| c.alive && c.ready)
        .map(|c| c.id)
        .collect()
}

/// The ready combatant with the fullest gauge (ties broken by roster order).
///
/// Readiness clamps at the maximum, so among same-step arrivals this is
/// simply the first ready combatant in roster order.
pub fn next_ready(roster: &Roster) -> Option<CombatantId> {
    let mut best: Option<&crate::battle::combatant::Combatant> = None;
    for combatant in roster.iter().filter(|c| c.alive && c.ready) {
        match best {
            Some(current) if combatant.readiness <= current.readiness => {}
            _ => best = Some(combatant),
        }
    }
    best.map(|c| c.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::combatant::Combatant;
    use crate::battle::status::StatusTag;
    use crate::core::types::{Controller, Team};

    fn roster_with_speeds(speeds: &[f32]) -> Roster {
        let mut roster = Roster::new();
        for (i, speed) in speeds.iter().enumerate() {
            roster.push(Combatant::new(
                format!("C{}", i),
                Team::Ally,
                Controller::Ai,
                100,
                20,
                5.0,
                *speed,
            ));
        }
        roster
    }

    #[test]
    fn test_gauge_advances_by_speed_scale_dt() {
        let mut roster = roster_with_speeds(&[10.0]);
        advance_readiness(&mut roster, 2.0, 1.5);
        assert_eq!(roster.combatants[0].readiness, 30.0);
    }

    #[test]
    fn test_gauge_clamps_and_marks_ready() {
        let mut roster = roster_with_speeds(&[60.0]);
        let ready = advance_readiness(&mut roster, 1.0, 1.0);
        assert!(ready.is_empty());

        let ready = advance_readiness(&mut roster, 1.0, 1.0);
        assert_eq!(ready.len(), 1);
        assert_eq!(roster.combatants[0].readiness, READINESS_MAX);
        assert!(roster.combatants[0].ready);
    }

    #[test]
    fn test_ready_combatant_stops_accumulating() {
        let mut roster = roster_with_speeds(&[200.0]);
        advance_readiness(&mut roster, 1.0, 1.0);
        assert!(roster.combatants[0].ready);

        advance_readiness(&mut roster, 1.0, 1.0);
        assert_eq!(roster.combatants[0].readiness, READINESS_MAX);
    }

    #[test]
    fn test_speed_statuses_change_fill_rate() {
        let mut roster = roster_with_speeds(&[10.0, 10.0]);
        roster.combatants[0].add_status(StatusTag::SpeedUp, 50.0, 3);
        roster.combatants[1].add_status(StatusTag::SpeedDown, 50.0, 3);

        advance_readiness(&mut roster, 1.0, 1.0);
        assert_eq!(roster.combatants[0].readiness, 15.0);
        assert_eq!(roster.combatants[1].readiness, 5.0);
    }

    #[test]
    fn test_dead_excluded_from_scheduling() {
        let mut roster = roster_with_speeds(&[10.0]);
        roster.combatants[0].apply_damage(500.0, true);
        let ready = advance_readiness(&mut roster, 100.0, 1.0);
        assert!(ready.is_empty());
        assert_eq!(roster.combatants[0].readiness, 0.0);
    }

    #[test]
    fn test_faster_combatant_readies_first() {
        let mut roster = roster_with_speeds(&[20.0, 10.0]);
        let mut first_ready = None;
        for _ in 0..20 {
            let ready = advance_readiness(&mut roster, 1.0, 1.0);
            if let Some(id) = ready.first() {
                first_ready = Some(*id);
                break;
            }
        }
        assert_eq!(first_ready, Some(roster.combatants[0].id));
    }

    #[test]
    fn test_next_ready_prefers_fullest_gauge() {
        let mut roster = roster_with_speeds(&[10.0, 10.0]);
        roster.combatants[1].gain_readiness(100.0);
        assert_eq!(next_ready(&roster), Some(roster.combatants[1].id));
    }

    #[test]
    fn test_zero_dt_is_a_noop() {
        let mut roster = roster_with_speeds(&[10.0]);
        advance_readiness(&mut roster, 0.0, 1.0);
        assert_eq!(roster.combatants[0].readiness, 0.0);
    }
}
