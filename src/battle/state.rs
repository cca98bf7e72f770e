//! Battle state machine and tick loop
//!
//! Each tick: advance readiness gauges, then drain the ready queue. A ready
//! AI combatant ticks its statuses, asks the decision model for an action,
//! and resolves it; a ready player combatant parks the battle in
//! `AwaitingPlayerInput` until the input collaborator answers or an external
//! timeout call consumes the turn. Qualifying deaths suspend the battle in
//! `Interrupted` until the negotiation collaborator reports back.

use std::collections::HashMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::battle::action::Loadout;
use crate::battle::ai::{DecisionContext, DecisionModel, HeuristicBrain};
use crate::battle::combatant::{Combatant, Roster, StatusTick};
use crate::battle::constants::{
    DEFAULT_TICK_SCALE, READINESS_SEED_MAX, REVIVE_HP_FRACTION,
};
use crate::battle::events::{
    notify_presenter, BattleEventLog, BattleEventType, CombatPresenter, NullPresenter,
};
use crate::battle::resolution::{resolve_action, ResolveError};
use crate::battle::scheduler::advance_readiness;
use crate::core::types::{CombatantId, Controller, Team, Tick};

/// Battle phases
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BattlePhase {
    /// Gauges advancing, turns resolving
    Running,
    /// A player seat is ready; waiting on the input collaborator
    AwaitingPlayerInput { combatant: CombatantId },
    /// A last-stand negotiation suspends normal resolution
    Interrupted { combatant: CombatantId },
    /// Terminal: one side has no living members
    Resolved,
}

/// Battle outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BattleOutcome {
    #[default]
    Undecided,
    Victory,
    Defeat,
}

/// What the scheduler does while a player seat is deciding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputPause {
    /// All gauges freeze until the seat resolves
    Global,
    /// Everyone else keeps filling and AI seats keep acting
    SeatOnly,
}

/// Per-battle tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleConfig {
    pub tick_scale: f32,
    pub input_pause: InputPause,
    /// Upper bound for the random initial readiness offset
    pub readiness_seed_max: f32,
    /// Fraction of max HP restored by an interrupt revive
    pub revive_hp_fraction: f32,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            tick_scale: DEFAULT_TICK_SCALE,
            input_pause: InputPause::Global,
            readiness_seed_max: READINESS_SEED_MAX,
            revive_hp_fraction: REVIVE_HP_FRACTION,
        }
    }
}

/// Complete battle state
pub struct BattleState {
    pub roster: Roster,
    loadouts: HashMap<CombatantId, Loadout>,

    pub tick: Tick,
    pub phase: BattlePhase,
    pub outcome: BattleOutcome,
    pub config: BattleConfig,

    pub battle_log: Vec<crate::battle::events::BattleEvent>,

    presenter: Box<dyn CombatPresenter>,
    brain: Box<dyn DecisionModel>,
    rng: ChaCha8Rng,
}

impl BattleState {
    pub fn new(seed: u64) -> Self {
        Self::with_config(BattleConfig::default(), seed)
    }

    pub fn with_config(config: BattleConfig, seed: u64) -> Self {
        Self {
            roster: Roster::new(),
            loadouts: HashMap::new(),
            tick: 0,
            phase: BattlePhase::Running,
            outcome: BattleOutcome::Undecided,
            config,
            battle_log: Vec::new(),
            presenter: Box::new(NullPresenter),
            brain: Box::new(HeuristicBrain::with_seed(seed)),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Swap in a presentation collaborator
    pub fn set_presenter(&mut self, presenter: Box<dyn CombatPresenter>) {
        self.presenter = presenter;
    }

    /// Swap in a decision model for non-player combatants
    pub fn set_brain(&mut self, brain: Box<dyn DecisionModel>) {
        self.brain = brain;
    }

    /// Add a combatant with its per-encounter loadout.
    ///
    /// Readiness is seeded with a small random offset so opening turns are
    /// staggered.
    pub fn add_combatant(&mut self, mut combatant: Combatant, loadout: Loadout) -> CombatantId {
        let seed_max = self.config.readiness_seed_max.max(0.0);
        if seed_max > 0.0 {
            combatant.readiness = self.rng.gen_range(0.0..seed_max);
        }
        let id = combatant.id;
        self.loadouts.insert(id, loadout);
        self.roster.push(combatant);
        id
    }

    /// Start the battle
    pub fn begin(&mut self) {
        let mut events = BattleEventLog::new();
        events.push(
            BattleEventType::BattleStarted,
            "Battle has begun!".into(),
            self.tick,
        );
        self.dispatch(events);
        tracing::debug!(combatants = self.roster.combatants.len(), "battle started");
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, BattlePhase::Resolved)
    }

    /// The player seat currently being waited on, if any
    pub fn awaiting_input(&self) -> Option<CombatantId> {
        match self.phase {
            BattlePhase::AwaitingPlayerInput { combatant } => Some(combatant),
            _ => None,
        }
    }

    /// A combatant's remaining loadout (UI availability queries)
    pub fn loadout(&self, id: CombatantId) -> Option<&Loadout> {
        self.loadouts.get(&id)
    }

    /// Advance the simulation by one step
    pub fn run_tick(&mut self, dt: f32) -> BattleEventLog {
        match self.phase {
            BattlePhase::Resolved | BattlePhase::Interrupted { .. } => {
                return BattleEventLog::new()
            }
            BattlePhase::AwaitingPlayerInput { .. }
                if self.config.input_pause == InputPause::Global =>
            {
                return BattleEventLog::new()
            }
            _ => {}
        }

        self.tick += 1;
        let mut events = BattleEventLog::new();

        advance_readiness(&mut self.roster, dt, self.config.tick_scale);
        self.drain_ready_queue(&mut events);

        events
    }

    /// Resolve turns for every ready combatant the current phase allows
    fn drain_ready_queue(&mut self, events: &mut BattleEventLog) {
        loop {
            let awaiting = self.awaiting_input();
            if matches!(
                self.phase,
                BattlePhase::Resolved | BattlePhase::Interrupted { .. }
            ) {
                return;
            }
            if awaiting.is_some() && self.config.input_pause == InputPause::Global {
                return;
            }

            let Some(actor_id) = self.next_actionable(awaiting) else {
                return;
            };

            // Start-of-turn status tick; dying to your own poison costs the turn
            self.apply_turn_statuses(actor_id, events);
            let (name, controller, alive) = match self.roster.get(actor_id) {
                Some(actor) => (actor.name.clone(), actor.controller, actor.alive),
                None => continue,
            };
            if !alive {
                self.handle_deaths(&[actor_id], events);
                continue;
            }

            self.emit(
                BattleEventType::TurnReady {
                    combatant: actor_id,
                },
                format!("{} is ready to act", name),
                events,
            );

            match controller {
                Controller::Player => {
                    self.phase = BattlePhase::AwaitingPlayerInput {
                        combatant: actor_id,
                    };
                    tracing::debug!("awaiting player input");
                }
                Controller::Ai => {
                    self.take_ai_turn(actor_id, events);
                }
            }
        }
    }

    /// Next ready combatant the phase allows to act: fullest gauge first,
    /// roster order on ties. Player seats queue behind an already-awaited
    /// seat; the awaited seat itself is skipped.
    fn next_actionable(&self, awaiting: Option<CombatantId>) -> Option<CombatantId> {
        let mut best: Option<&Combatant> = None;
        for combatant in self
            .roster
            .iter()
            .filter(|c| c.alive && c.ready)
            .filter(|c| Some(c.id) != awaiting)
            .filter(|c| !(c.controller == Controller::Player && awaiting.is_some()))
        {
            match best {
                Some(current) if combatant.readiness <= current.readiness => {}
                _ => best = Some(combatant),
            }
        }
        best.map(|c| c.id)
    }

    /// Fire the actor's per-turn status ticks and emit the fallout.
    ///
    /// Runs at most once per readiness cycle: a seat re-entering the ready
    /// queue after an interrupt does not tick its conditions twice.
    fn apply_turn_statuses(&mut self, actor_id: CombatantId, events: &mut BattleEventLog) {
        let (name, ticks): (String, Vec<StatusTick>) = match self.roster.get_mut(actor_id) {
            Some(actor) if !actor.turn_ticked => {
                actor.turn_ticked = true;
                (actor.name.clone(), actor.tick_statuses())
            }
            _ => return,
        };

        for tick in ticks {
            if tick.hp_delta < 0 {
                self.emit(
                    BattleEventType::DamageApplied {
                        target: actor_id,
                        amount: (-tick.hp_delta) as u32,
                        critical: false,
                    },
                    format!("{} suffers {} from {:?}", name, -tick.hp_delta, tick.tag),
                    events,
                );
            } else if tick.hp_delta > 0 {
                self.emit(
                    BattleEventType::HealApplied {
                        target: actor_id,
                        amount: tick.hp_delta as u32,
                    },
                    format!("{} recovers {} from {:?}", name, tick.hp_delta, tick.tag),
                    events,
                );
            }
            if tick.expired {
                self.emit(
                    BattleEventType::StatusExpired {
                        target: actor_id,
                        tag: tick.tag,
                    },
                    format!("{:?} wears off {}", tick.tag, name),
                    events,
                );
            }
        }

        if self.roster.get(actor_id).map(|a| !a.alive).unwrap_or(false) {
            self.emit(
                BattleEventType::CombatantDied {
                    combatant: actor_id,
                },
                format!("{} falls", name),
                events,
            );
        }
    }

    /// Ask the decision model for an action and resolve it
    fn take_ai_turn(&mut self, actor_id: CombatantId, events: &mut BattleEventLog) {
        let decision = {
            let Some(actor) = self.roster.get(actor_id) else {
                return;
            };
            let Some(loadout) = self.loadouts.get(&actor_id) else {
                self.skip_turn(actor_id, events);
                return;
            };
            let allies = self.roster.living(actor.team);
            let opponents = self.roster.living(actor.team.opposing());
            let context = DecisionContext::new(actor, loadout, allies, opponents);
            self.brain.decide(&context)
        };

        let Some(decision) = decision else {
            // Nothing affordable: the turn is still consumed
            self.skip_turn(actor_id, events);
            return;
        };

        let Some(loadout) = self.loadouts.get_mut(&actor_id) else {
            self.skip_turn(actor_id, events);
            return;
        };
        let Some(instance) = loadout.actions.get_mut(decision.action_index) else {
            self.skip_turn(actor_id, events);
            return;
        };

        match resolve_action(
            actor_id,
            instance,
            &mut self.roster,
            &decision.targets,
            self.tick,
        ) {
            Ok(report) => {
                self.dispatch_into(report.log, events);
                if let Some(actor) = self.roster.get_mut(actor_id) {
                    actor.reset_readiness();
                }
                self.handle_deaths(&report.deaths, events);
            }
            Err(error) => {
                // The decision model pre-filters, so this is unexpected but
                // non-fatal; consume the turn to avoid a stuck battle
                tracing::warn!(%error, "AI action rejected");
                self.skip_turn(actor_id, events);
            }
        }
    }

    /// Supply the awaited player decision.
    ///
    /// Rejections leave the phase untouched so the caller can retry with a
    /// corrected action or target.
    pub fn submit_player_action(
        &mut self,
        combatant: CombatantId,
        action_index: usize,
        targets: &[CombatantId],
    ) -> Result<BattleEventLog, ResolveError> {
        match self.phase {
            BattlePhase::AwaitingPlayerInput { combatant: awaited } if awaited == combatant => {}
            _ => return Err(ResolveError::NotAwaitingInput),
        }

        let loadout = self
            .loadouts
            .get_mut(&combatant)
            .ok_or(ResolveError::UnknownCombatant)?;
        let instance = loadout
            .actions
            .get_mut(action_index)
            .ok_or(ResolveError::UnknownAction)?;

        let report = resolve_action(combatant, instance, &mut self.roster, targets, self.tick)?;

        let mut events = BattleEventLog::new();
        self.dispatch_into(report.log, &mut events);
        if let Some(actor) = self.roster.get_mut(combatant) {
            actor.reset_readiness();
        }
        self.phase = BattlePhase::Running;
        self.handle_deaths(&report.deaths, &mut events);
        Ok(events)
    }

    /// External decision timeout: consume the combatant's turn.
    ///
    /// A stale call (the actor already resolved through the normal path) is
    /// a no-op, tolerating racing external timers.
    pub fn time_out(&mut self, combatant: CombatantId) -> BattleEventLog {
        let mut events = BattleEventLog::new();
        match self.phase {
            BattlePhase::AwaitingPlayerInput { combatant: awaited } if awaited == combatant => {
                self.skip_turn(combatant, &mut events);
                self.phase = BattlePhase::Running;
            }
            _ => {
                tracing::debug!("stale timeout ignored");
            }
        }
        events
    }

    /// Interrupt collaborator callback: the negotiation either revives the
    /// fallen combatant or lets death stand.
    pub fn resolve_interrupt(&mut self, revived: bool) -> BattleEventLog {
        let mut events = BattleEventLog::new();
        let BattlePhase::Interrupted { combatant } = self.phase else {
            return events;
        };

        let name = self.name_of(combatant);
        self.emit(
            BattleEventType::InterruptResolved { combatant, revived },
            format!("{}'s negotiation: revived = {}", name, revived),
            &mut events,
        );

        if revived {
            let fraction = self.config.revive_hp_fraction;
            if let Some(target) = self.roster.get_mut(combatant) {
                let hp = ((target.max_hp as f32 * fraction) as u32).max(1);
                target.revive(hp);
                target.clear_negative_statuses();
            }
            self.phase = BattlePhase::Running;
        } else {
            self.phase = BattlePhase::Running;
            self.check_battle_end(&mut events);
        }
        events
    }

    /// Consume a turn without resolving an action
    fn skip_turn(&mut self, combatant: CombatantId, events: &mut BattleEventLog) {
        let name = self.name_of(combatant);
        if let Some(actor) = self.roster.get_mut(combatant) {
            actor.reset_readiness();
        }
        self.emit(
            BattleEventType::TurnSkipped { combatant },
            format!("{}'s turn passes", name),
            events,
        );
    }

    /// React to deaths: raise a last-stand interrupt for the first
    /// qualifying combatant, otherwise check for the end of the battle.
    fn handle_deaths(&mut self, deaths: &[CombatantId], events: &mut BattleEventLog) {
        // A dead combatant cannot be waited on
        if let BattlePhase::AwaitingPlayerInput { combatant } = self.phase {
            if deaths.contains(&combatant) {
                self.phase = BattlePhase::Running;
            }
        }

        for &id in deaths {
            let qualifies = self
                .roster
                .get(id)
                .map(|c| c.last_stand && !c.alive)
                .unwrap_or(false);
            if qualifies {
                if let Some(combatant) = self.roster.get_mut(id) {
                    combatant.last_stand = false;
                }
                let name = self.name_of(id);
                self.phase = BattlePhase::Interrupted { combatant: id };
                self.emit(
                    BattleEventType::InterruptRaised { combatant: id },
                    format!("{} makes a last stand", name),
                    events,
                );
                return;
            }
        }
        self.check_battle_end(events);
    }

    /// Check if one side has no living members
    fn check_battle_end(&mut self, events: &mut BattleEventLog) {
        if self.is_finished() {
            return;
        }

        let outcome = if !self.roster.any_living(Team::Ally) {
            Some(BattleOutcome::Defeat)
        } else if !self.roster.any_living(Team::Enemy) {
            Some(BattleOutcome::Victory)
        } else {
            None
        };

        if let Some(outcome) = outcome {
            self.outcome = outcome;
            self.phase = BattlePhase::Resolved;
            self.emit(
                BattleEventType::BattleEnded { outcome },
                format!("Battle ended: {:?}", outcome),
                events,
            );
            tracing::debug!(?outcome, tick = self.tick, "battle resolved");
        }
    }

    fn name_of(&self, id: CombatantId) -> String {
        self.roster
            .get(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "Unknown".into())
    }

    /// Push one event through the presenter, the battle log, and the
    /// caller's log
    fn emit(
        &mut self,
        event_type: BattleEventType,
        description: String,
        events: &mut BattleEventLog,
    ) {
        let event = crate::battle::events::BattleEvent {
            tick: self.tick,
            event_type,
            description,
        };
        notify_presenter(self.presenter.as_mut(), &event);
        self.battle_log.push(event.clone());
        events.events.push(event);
    }

    /// Route a resolution's event log outward
    fn dispatch_into(&mut self, log: BattleEventLog, events: &mut BattleEventLog) {
        for event in log.events {
            notify_presenter(self.presenter.as_mut(), &event);
            self.battle_log.push(event.clone());
            events.events.push(event);
        }
    }

    fn dispatch(&mut self, log: BattleEventLog) {
        for event in log.events {
            notify_presenter(self.presenter.as_mut(), &event);
            self.battle_log.push(event);
        }
    }
}
