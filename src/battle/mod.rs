//! Active-time battle system
//!
//! Readiness gauges fill in continuous time; turns resolve as discrete,
//! ordered effect lists. Player seats and the death-negotiation interrupt
//! suspend the loop through explicit phases rather than callbacks, so the
//! core never owns a timer and never blocks.

pub mod action;
pub mod ai;
pub mod catalog;
pub mod combatant;
pub mod constants;
pub mod events;
pub mod resolution;
pub mod scheduler;
pub mod state;
pub mod status;

// Re-exports for convenient access
pub use action::{
    ActionDefinition, ActionInstance, Effect, EffectKind, Loadout, OverrideRule,
    StatusApplication, TargetMode,
};
pub use ai::{Decision, DecisionContext, DecisionModel, HeuristicBrain, HeuristicWeights};
pub use catalog::{ActionCatalog, CatalogLoadError};
pub use combatant::{Combatant, Roster, StatusTick};
pub use constants::*;
pub use events::{
    BattleEvent, BattleEventLog, BattleEventType, CombatPresenter, NullPresenter,
};
pub use resolution::{resolve_action, ResolutionReport, ResolveError};
pub use scheduler::{advance_readiness, next_ready, ready_combatants};
pub use state::{BattleConfig, BattleOutcome, BattlePhase, BattleState, InputPause};
pub use status::{Recurring, StatusEffect, StatusSet, StatusTag};
