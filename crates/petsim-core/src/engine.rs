//! Pet engine - main entry point for running a pet
//!
//! Owns the need registry, scheduler, message queue, autonomy engine and the
//! virtual clock. Callers drive it with [`PetEngine::update`]; every cadence
//! (ticks, autonomy, delayed reactions, display expiry) is derived from the
//! accumulated milliseconds, so nothing depends on wall-clock time.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use petsim_logic::autonomy::{ItemRef, MovementTarget, Resolution};
use petsim_logic::message::{AmbientKind, Candidate, Category, MessageQueue, SubmitOutcome};
use petsim_logic::need::{FulfillFailure, FulfillResult, Inventory, MethodEffect, NeedEntity};
use petsim_logic::status::Status;
use petsim_logic::urgency::RankedNeed;

use crate::agent::{AgentState, AgentStatus};
use crate::autonomy::{Arrival, AutonomyEngine, AutonomyOutcome};
use crate::config::PetConfig;
use crate::error::PetError;
use crate::habitat::Habitat;
use crate::registry::NeedRegistry;
use crate::scheduler::{derived_count, BestAction, Scheduler, TickContext};
use crate::timeline::{ScheduledKind, Timeline};

pub type ListenerId = u64;

/// Notifications delivered to registered listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum PetEvent {
    Fulfilled {
        need_id: String,
        method_id: String,
        improvement: f32,
    },
    TargetSelected { need_id: String, item: ItemRef },
    Arrived { need_id: String, item: ItemRef },
    Paused,
    Resumed,
    WokeUp,
}

/// What the display should show right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayLine {
    pub text: String,
    pub icon: String,
}

type Listener = Box<dyn FnMut(&PetEvent)>;

pub struct PetEngine {
    registry: NeedRegistry,
    scheduler: Scheduler,
    messages: MessageQueue,
    autonomy: AutonomyEngine,
    timeline: Timeline,

    // Collaborators
    habitat: Option<Box<dyn Habitat>>,
    inventory: Option<Box<dyn Inventory>>,
    agent: Option<Box<dyn AgentStatus>>,

    listeners: Vec<(ListenerId, Listener)>,
    next_listener_id: ListenerId,

    config: PetConfig,
    rng: StdRng,

    // Virtual clock
    now_ms: u64,
    last_tick_ms: u64,
    last_autonomy_ms: u64,
    paused: bool,
}

impl PetEngine {
    pub fn new(config: PetConfig, registry: NeedRegistry) -> Result<Self, PetError> {
        config.validate()?;
        let tracked = if config.tracked_needs.is_empty() {
            registry.ids()
        } else {
            config.tracked_needs.clone()
        };
        for id in &tracked {
            if registry.get(id).is_none() {
                log::warn!("Tracked need '{}' is not in the registry", id);
            }
        }
        log::info!(
            "Pet engine created: {} needs, tick {}ms, autonomy {}ms",
            tracked.len(),
            config.tick_interval_ms,
            config.autonomy_interval_ms
        );
        Ok(Self {
            registry,
            scheduler: Scheduler::new(tracked),
            messages: MessageQueue::new(config.queue_timing()),
            autonomy: AutonomyEngine::new(),
            timeline: Timeline::new(),
            habitat: None,
            inventory: None,
            agent: None,
            listeners: Vec::new(),
            next_listener_id: 0,
            rng: StdRng::seed_from_u64(config.seed),
            config,
            now_ms: 0,
            last_tick_ms: 0,
            last_autonomy_ms: 0,
            paused: false,
        })
    }

    /// Default config and the built-in needs, no collaborators.
    pub fn with_defaults() -> Result<Self, PetError> {
        Self::new(PetConfig::default(), NeedRegistry::builtin()?)
    }

    pub fn with_habitat(mut self, habitat: impl Habitat + 'static) -> Self {
        self.habitat = Some(Box::new(habitat));
        self
    }

    pub fn with_inventory(mut self, inventory: impl Inventory + 'static) -> Self {
        self.inventory = Some(Box::new(inventory));
        self
    }

    pub fn with_agent(mut self, agent: impl AgentStatus + 'static) -> Self {
        self.agent = Some(Box::new(agent));
        self
    }

    /// Advance the virtual clock by `delta_ms` and run whatever fell due.
    pub fn update(&mut self, delta_ms: u64) {
        self.now_ms += delta_ms;

        self.fire_due_events();

        if self.now_ms - self.last_tick_ms >= self.config.tick_interval_ms {
            self.tick();
        }

        if self.now_ms - self.last_autonomy_ms >= self.config.autonomy_interval_ms {
            self.run_autonomy();
        }

        self.messages.poll(self.now_ms);
    }

    /// Degrade, re-rank and announce every tracked need.
    pub fn tick(&mut self) {
        let elapsed_secs = (self.now_ms - self.last_tick_ms) as f32 / 1000.0;
        self.last_tick_ms = self.now_ms;

        let ctx = TickContext {
            habitat: self.habitat.as_deref().map(|h| h as &dyn Habitat),
            agent_asleep: self.agent_state() == Some(AgentState::Sleeping),
            elapsed_secs,
            now_ms: self.now_ms,
            paused: self.paused,
        };
        let messages = self
            .scheduler
            .tick(&mut self.registry, &ctx, &mut self.rng);

        for message in messages {
            let accepted = self.submit_message(message.candidate).accepted();
            if let (true, Some((need_id, status))) = (accepted, message.announces) {
                self.scheduler.mark_announced(&need_id, status, self.now_ms);
            }
        }
        self.check_wake_up();
    }

    /// One autonomy cycle.
    pub fn run_autonomy(&mut self) -> AutonomyOutcome {
        self.last_autonomy_ms = self.now_ms;

        let (habitat, agent) = match (self.habitat.as_mut(), self.agent.as_mut()) {
            (Some(habitat), Some(agent)) => (habitat, agent),
            (None, _) => return abort(PetError::missing("habitat")),
            (_, None) => return abort(PetError::missing("agent status")),
        };
        let outcome = self.autonomy.step(
            self.scheduler.ranked(),
            &self.registry,
            habitat.as_mut(),
            agent.as_mut(),
            self.paused,
        );

        match &outcome {
            AutonomyOutcome::Moving {
                need_id,
                started: true,
                ..
            } => {
                if let Some(target) = self.autonomy.target().cloned() {
                    self.announce_target(need_id, &target);
                }
            }
            AutonomyOutcome::Arrived(arrival) => self.handle_arrival(arrival),
            AutonomyOutcome::Aborted(e) => log::debug!("Autonomy cycle skipped: {}", e),
            _ => {}
        }
        outcome
    }

    /// Apply a fulfillment method to a need.
    ///
    /// Failures come back in the result and are shown as a temporary
    /// override message carrying the need's own failure text.
    pub fn fulfill(&mut self, need_id: &str, method_id: &str) -> FulfillResult {
        self.sync_derived(need_id);

        let Some(need) = self.registry.get_mut(need_id) else {
            let err = PetError::missing(format!("need '{}'", need_id));
            log::warn!("{}", err);
            return FulfillResult::failed(FulfillFailure::UnknownNeed, err.to_string());
        };
        let icon = need.descriptor().icon.clone();
        let inventory = self
            .inventory
            .as_mut()
            .map(|inv| inv.as_mut() as &mut dyn Inventory);
        let outcome = need.fulfill(method_id, inventory, &mut self.rng);

        if !outcome.result.success {
            if let Some(failure) = outcome.result.failure {
                let err =
                    PetError::from_fulfill_failure(failure, need_id, method_id, &outcome.result.message);
                log::info!("{}", err);
            }
            let notice = Candidate::new(
                outcome.result.message.clone(),
                icon,
                Category::TemporaryOverride,
            )
            .from_need(need_id);
            self.submit_message(notice);
            return outcome.result;
        }

        if outcome.effect == Some(MethodEffect::ClearWaste) {
            if let Some(habitat) = self.habitat.as_mut() {
                let removed = habitat.clear_waste();
                log::debug!("Cleared {} waste piles", removed);
            }
            self.sync_derived(need_id);
        }

        if let Some(announcement) = outcome.announcement {
            self.submit_message(announcement);
        }
        if let Some(reaction) = outcome.reaction {
            if !self.paused {
                let at = self.now_ms + self.config.reaction_delay_ms;
                self.timeline.schedule(at, ScheduledKind::Submit(reaction));
            }
        }

        log::info!(
            "Fulfilled '{}' with '{}' (+{:.1})",
            need_id,
            method_id,
            outcome.result.improvement
        );
        self.emit(PetEvent::Fulfilled {
            need_id: need_id.to_string(),
            method_id: method_id.to_string(),
            improvement: outcome.result.improvement,
        });
        outcome.result
    }

    /// Hand a candidate to the message queue at the current time.
    pub fn submit_message(&mut self, candidate: Candidate) -> SubmitOutcome {
        let outcome = self.messages.submit(candidate, self.now_ms);
        log::trace!("Message submit at {}ms: {:?}", self.now_ms, outcome);
        outcome
    }

    /// Current message, or the agent's status line when the slot is idle.
    pub fn current_message(&self) -> DisplayLine {
        let fallback = self
            .agent_state()
            .unwrap_or_default()
            .status_line();
        let (text, icon) = self.messages.current_line_or(fallback);
        DisplayLine {
            text: text.to_string(),
            icon: icon.to_string(),
        }
    }

    /// Stop both clocks. The current message finishes; queued messages and
    /// pending reactions are dropped.
    pub fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.paused = true;
        self.messages.set_paused(true);
        self.messages.clear_waiting();
        self.timeline.cancel_all();
        log::info!("Pet paused at {}ms", self.now_ms);
        self.emit(PetEvent::Paused);
    }

    /// Restart both clocks from now, so the paused span never counts.
    pub fn resume(&mut self) {
        if !self.paused {
            return;
        }
        self.paused = false;
        self.messages.set_paused(false);
        self.last_tick_ms = self.now_ms;
        self.last_autonomy_ms = self.now_ms;
        log::info!("Pet resumed at {}ms", self.now_ms);
        self.emit(PetEvent::Resumed);
    }

    /// Pause and blank everything, including the current message.
    pub fn stop(&mut self) {
        self.pause();
        self.messages.clear_all();
        self.autonomy.cancel();
        log::info!("Pet stopped");
    }

    /// Rebuild every need from its descriptor and drop all transient state.
    pub fn reset(&mut self) {
        self.registry.reset();
        self.scheduler.reset();
        self.messages.clear_all();
        self.timeline.cancel_all();
        self.autonomy.cancel();
        if let Some(agent) = self.agent.as_mut() {
            agent.set_state(AgentState::Idle);
        }
        self.rng = StdRng::seed_from_u64(self.config.seed);
        self.last_tick_ms = self.now_ms;
        self.last_autonomy_ms = self.now_ms;
        log::info!("Pet reset");
    }

    pub fn add_listener(&mut self, listener: impl FnMut(&PetEvent) + 'static) -> ListenerId {
        self.next_listener_id += 1;
        let id = self.next_listener_id;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if the id was not registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    pub fn ranked_needs(&self) -> &[RankedNeed] {
        self.scheduler.ranked()
    }

    pub fn next_need_to_fulfill(&self) -> Option<&RankedNeed> {
        self.scheduler.next_need_to_fulfill()
    }

    pub fn best_action(&self) -> Option<BestAction> {
        let inventory = self.inventory.as_deref().map(|inv| inv as &dyn Inventory);
        self.scheduler.best_action(&self.registry, inventory)
    }

    pub fn need(&self, id: &str) -> Option<&NeedEntity> {
        self.registry.get(id)
    }

    pub fn registry(&self) -> &NeedRegistry {
        &self.registry
    }

    pub fn messages(&self) -> &MessageQueue {
        &self.messages
    }

    pub fn habitat(&self) -> Option<&dyn Habitat> {
        self.habitat.as_deref().map(|h| h as &dyn Habitat)
    }

    pub fn agent_state(&self) -> Option<AgentState> {
        self.agent.as_ref().map(|agent| agent.current_state())
    }

    pub fn autonomy_target(&self) -> Option<&MovementTarget> {
        self.autonomy.target()
    }

    /// Delayed reactions still waiting to fire.
    pub fn pending_events(&self) -> usize {
        self.timeline.pending()
    }

    pub fn config(&self) -> &PetConfig {
        &self.config
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Virtual clock in milliseconds since start.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn fire_due_events(&mut self) {
        for (_, kind) in self.timeline.pop_due(self.now_ms) {
            match kind {
                ScheduledKind::Submit(candidate) => {
                    self.submit_message(candidate);
                }
            }
        }
    }

    fn announce_target(&mut self, need_id: &str, target: &MovementTarget) {
        let text = format!("Off to the {}!", target.item.kind);
        self.submit_message(Candidate::new(
            text,
            "🐾",
            Category::Ambient(AmbientKind::Movement),
        ));
        self.emit(PetEvent::TargetSelected {
            need_id: need_id.to_string(),
            item: target.item.clone(),
        });
    }

    fn handle_arrival(&mut self, arrival: &Arrival) {
        if arrival.resolution == Resolution::ConsumeItem
            && self.rng.gen::<f32>() < self.config.waste_chance
        {
            if let Some(habitat) = self.habitat.as_mut() {
                habitat.spawn_waste(arrival.item.position);
                log::debug!(
                    "Waste left at ({}, {})",
                    arrival.item.position.x,
                    arrival.item.position.y
                );
            }
        }
        self.emit(PetEvent::Arrived {
            need_id: arrival.need_id.clone(),
            item: arrival.item.clone(),
        });
        self.fulfill(&arrival.need_id, &arrival.method);
    }

    /// Wake the agent once every need it rests for is fulfilled.
    fn check_wake_up(&mut self) {
        if self.paused || self.agent_state() != Some(AgentState::Sleeping) {
            return;
        }
        let rested = self
            .scheduler
            .tracked()
            .iter()
            .filter_map(|id| self.registry.get(id))
            .filter(|need| {
                need.descriptor()
                    .movement
                    .as_ref()
                    .is_some_and(|spec| spec.resolution == Resolution::Rest)
            })
            .all(|need| need.status() == Status::Fulfilled);
        if !rested {
            return;
        }
        if let Some(agent) = self.agent.as_mut() {
            agent.set_state(AgentState::Idle);
        }
        log::info!("Pet woke up at {}ms", self.now_ms);
        self.submit_message(Candidate::new(
            "*stretches* Good morning!",
            "☀",
            Category::Ambient(AmbientKind::Status),
        ));
        self.emit(PetEvent::WokeUp);
    }

    fn sync_derived(&mut self, need_id: &str) {
        let habitat = self.habitat.as_deref().map(|h| h as &dyn Habitat);
        if let Some(need) = self.registry.get_mut(need_id) {
            if let Some(count) = derived_count(need.derived_source(), habitat) {
                need.sync_derived(count);
                need.refresh_status();
            }
        }
    }

    fn emit(&mut self, event: PetEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }
}

fn abort(err: PetError) -> AutonomyOutcome {
    log::debug!("Autonomy cycle skipped: {}", err);
    AutonomyOutcome::Aborted(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::PetBody;
    use crate::habitat::GridHabitat;
    use crate::inventory::Pantry;
    use petsim_logic::constants::need_ids;
    use petsim_logic::grid::GridPos;
    use petsim_logic::need::NeedDescriptor;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn quiet_config() -> PetConfig {
        PetConfig {
            waste_chance: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_engine_creation() {
        let engine = PetEngine::with_defaults().unwrap();
        assert_eq!(engine.now_ms(), 0);
        assert_eq!(engine.registry().len(), 7);
        assert!(engine.ranked_needs().is_empty());
        assert_eq!(engine.current_message().text, "Just hanging out.");
    }

    #[test]
    fn test_update_ticks_with_elapsed() {
        let registry = NeedRegistry::from_descriptors(vec![
            NeedDescriptor::linear("hunger", 0.1).with_initial(95.0),
        ])
        .unwrap();
        let mut engine = PetEngine::new(quiet_config(), registry).unwrap();
        engine.update(10_000);
        assert!((engine.need("hunger").unwrap().value() - 94.0).abs() < 0.001);
        assert_eq!(engine.ranked_needs().len(), 1);
    }

    #[test]
    fn test_fulfill_unknown_need_and_method() {
        let mut engine = PetEngine::with_defaults().unwrap();
        let result = engine.fulfill("boredom", "nap");
        assert_eq!(result.failure, Some(FulfillFailure::UnknownNeed));

        engine.registry.get_mut(need_ids::HUNGER).unwrap().set_value(40.0);
        let result = engine.fulfill(need_ids::HUNGER, "teleport");
        assert_eq!(result.failure, Some(FulfillFailure::UnknownMethod));
        let shown = engine.messages().current().unwrap();
        assert_eq!(shown.text, "I can't eat that.");
        assert_eq!(shown.category, Category::TemporaryOverride);
    }

    #[test]
    fn test_fulfill_uses_inventory_and_schedules_reaction() {
        let mut engine = PetEngine::with_defaults()
            .unwrap()
            .with_inventory(Pantry::new().with_stock("kibble", 1));
        engine.registry.get_mut(need_ids::HUNGER).unwrap().set_value(40.0);

        let result = engine.fulfill(need_ids::HUNGER, "feed_kibble");
        assert!(result.success);
        assert_eq!(engine.need(need_ids::HUNGER).unwrap().value(), 65.0);
        assert_eq!(engine.current_message().text, "Crunch crunch! Kibble time.");
        assert_eq!(engine.pending_events(), 1);

        let result = engine.fulfill(need_ids::HUNGER, "feed_kibble");
        assert_eq!(result.failure, Some(FulfillFailure::ResourceUnavailable));
        assert_eq!(result.message, "No food available");
    }

    #[test]
    fn test_pause_is_idempotent() {
        let mut engine = PetEngine::with_defaults().unwrap();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        engine.add_listener(move |event| sink.borrow_mut().push(event.clone()));

        engine.pause();
        engine.pause();
        assert!(engine.is_paused());
        engine.resume();
        engine.resume();
        assert_eq!(*events.borrow(), vec![PetEvent::Paused, PetEvent::Resumed]);
    }

    #[test]
    fn test_removed_listener_is_silent() {
        let mut engine = PetEngine::with_defaults().unwrap();
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let id = engine.add_listener(move |_| *sink.borrow_mut() += 1);
        engine.pause();
        assert!(engine.remove_listener(id));
        assert!(!engine.remove_listener(id));
        engine.resume();
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_clean_up_clears_waste() {
        let mut habitat = GridHabitat::new(12, 8);
        habitat.spawn_waste(GridPos::new(1, 1));
        habitat.spawn_waste(GridPos::new(2, 2));
        let mut engine = PetEngine::with_defaults().unwrap().with_habitat(habitat);

        let result = engine.fulfill(need_ids::CLEANLINESS, "clean_up");
        assert!(result.success);
        assert_eq!(result.improvement, 40.0);
        assert_eq!(engine.habitat().unwrap().waste_count(), 0);
        assert_eq!(engine.need(need_ids::CLEANLINESS).unwrap().value(), 100.0);

        let result = engine.fulfill(need_ids::CLEANLINESS, "clean_up");
        assert_eq!(result.failure, Some(FulfillFailure::AlreadyFull));
    }

    #[test]
    fn test_autonomy_without_collaborators_aborts() {
        let mut engine = PetEngine::with_defaults().unwrap();
        assert!(matches!(
            engine.run_autonomy(),
            AutonomyOutcome::Aborted(PetError::ConfigurationMissing { .. })
        ));
        let mut engine = PetEngine::with_defaults()
            .unwrap()
            .with_habitat(GridHabitat::new(4, 4));
        assert!(matches!(
            engine.run_autonomy(),
            AutonomyOutcome::Aborted(PetError::ConfigurationMissing { .. })
        ));
    }

    #[test]
    fn test_fallback_line_follows_agent() {
        let body = PetBody {
            state: AgentState::Sleeping,
            paused: false,
        };
        let engine = PetEngine::with_defaults().unwrap().with_agent(body);
        assert_eq!(
            engine.current_message(),
            DisplayLine {
                text: "Zzz...".into(),
                icon: "💤".into()
            }
        );
    }

    #[test]
    fn test_untracked_rest_need_does_not_hold_sleep() {
        let mut registry = NeedRegistry::builtin().unwrap();
        let sleep = registry.get_mut(need_ids::SLEEP).unwrap();
        sleep.set_value(50.0);
        sleep.refresh_status();

        let config = PetConfig {
            tracked_needs: vec![need_ids::HUNGER.into(), need_ids::THIRST.into()],
            ..quiet_config()
        };
        let body = PetBody {
            state: AgentState::Sleeping,
            paused: false,
        };
        let mut engine = PetEngine::new(config, registry).unwrap().with_agent(body);
        engine.update(1_000);
        assert_eq!(engine.agent_state(), Some(AgentState::Idle));
        assert_eq!(engine.need(need_ids::SLEEP).unwrap().status(), Status::Urgent);
    }

    #[test]
    fn test_reset_restores_needs() {
        let mut engine = PetEngine::with_defaults().unwrap();
        engine.update(60_000);
        engine.registry.get_mut(need_ids::FUN).unwrap().set_value(10.0);
        engine.reset();
        assert_eq!(engine.need(need_ids::FUN).unwrap().value(), 80.0);
        assert!(engine.messages().current().is_none());
        assert!(engine.ranked_needs().is_empty());
    }
}
