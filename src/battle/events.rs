//! Battle event log and the presentation collaborator boundary
//!
//! The core never queries presentation; it pushes notifications outward
//! through [`CombatPresenter`] and keeps a serializable log for replays and
//! headless runs.

use serde::{Deserialize, Serialize};

use crate::battle::status::StatusTag;
use crate::core::types::{CombatantId, Tick};

/// Log entry for battle events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleEvent {
    pub tick: Tick,
    pub event_type: BattleEventType,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BattleEventType {
    BattleStarted,
    TurnReady {
        combatant: CombatantId,
    },
    ActionUsed {
        combatant: CombatantId,
        action: String,
    },
    DamageApplied {
        target: CombatantId,
        amount: u32,
        critical: bool,
    },
    HealApplied {
        target: CombatantId,
        amount: u32,
    },
    ResourceRestored {
        target: CombatantId,
        amount: u32,
    },
    StatusApplied {
        target: CombatantId,
        tag: StatusTag,
        duration: u32,
        /// Distinguishes self-effect applications for presentation layers
        self_inflicted: bool,
    },
    StatusExpired {
        target: CombatantId,
        tag: StatusTag,
    },
    CombatantDied {
        combatant: CombatantId,
    },
    TurnSkipped {
        combatant: CombatantId,
    },
    InterruptRaised {
        combatant: CombatantId,
    },
    InterruptResolved {
        combatant: CombatantId,
        revived: bool,
    },
    BattleEnded {
        outcome: crate::battle::state::BattleOutcome,
    },
}

/// Log of events from a single tick or resolution
#[derive(Debug, Clone, Default)]
pub struct BattleEventLog {
    pub events: Vec<BattleEvent>,
}

impl BattleEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event_type: BattleEventType, description: String, tick: Tick) {
        self.events.push(BattleEvent {
            tick,
            event_type,
            description,
        });
    }

    pub fn extend(&mut self, other: BattleEventLog) {
        self.events.extend(other.events);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Presentation collaborator - receives outbound notifications only
///
/// Implementations drive health bars, floating combat text, and status
/// icons. Every method defaults to a no-op so presenters subscribe to just
/// what they render.
pub trait CombatPresenter {
    fn damage_applied(&mut self, _target: CombatantId, _amount: u32, _critical: bool) {}
    fn heal_applied(&mut self, _target: CombatantId, _amount: u32) {}
    fn resource_restored(&mut self, _target: CombatantId, _amount: u32) {}
    fn status_applied(&mut self, _target: CombatantId, _tag: StatusTag, _duration: u32) {}
    fn status_expired(&mut self, _target: CombatantId, _tag: StatusTag) {}
    fn combatant_died(&mut self, _target: CombatantId) {}
}

/// Presenter that ignores everything (headless runs, tests)
#[derive(Debug, Default)]
pub struct NullPresenter;

impl CombatPresenter for NullPresenter {}

/// Forward an event to the matching presenter notification
pub(crate) fn notify_presenter(presenter: &mut dyn CombatPresenter, event: &BattleEvent) {
    match &event.event_type {
        BattleEventType::DamageApplied {
            target,
            amount,
            critical,
        } => presenter.damage_applied(*target, *amount, *critical),
        BattleEventType::HealApplied { target, amount } => {
            presenter.heal_applied(*target, *amount)
        }
        BattleEventType::ResourceRestored { target, amount } => {
            presenter.resource_restored(*target, *amount)
        }
        BattleEventType::StatusApplied {
            target,
            tag,
            duration,
            ..
        } => presenter.status_applied(*target, *tag, *duration),
        BattleEventType::StatusExpired { target, tag } => {
            presenter.status_expired(*target, *tag)
        }
        BattleEventType::CombatantDied { combatant } => presenter.combatant_died(*combatant),
        _ => {}
    }
}
