//! Urgency scheduler.
//!
//! Runs once per tick over the tracked needs: degrade (or recover while
//! asleep), re-sync derived needs, refresh status, score urgency, collect
//! reactions and due announcements, then publish the ranking.

use std::collections::HashMap;

use rand::Rng;

use petsim_logic::message::Candidate;
use petsim_logic::need::{DerivedSource, Inventory};
use petsim_logic::status::Status;
use petsim_logic::urgency::{rank, urgency_score, RankedNeed};

use crate::error::PetError;
use crate::habitat::Habitat;
use crate::registry::NeedRegistry;

/// Inputs of a single scheduler tick.
pub struct TickContext<'a> {
    pub habitat: Option<&'a dyn Habitat>,
    pub agent_asleep: bool,
    pub elapsed_secs: f32,
    pub now_ms: u64,
    pub paused: bool,
}

/// A candidate produced by a tick. Announcements carry the need and status
/// they announce; the timer only starts once the queue accepts them.
#[derive(Debug, Clone)]
pub struct TickMessage {
    pub candidate: Candidate,
    pub announces: Option<(String, Status)>,
}

impl TickMessage {
    fn reaction(candidate: Candidate) -> Self {
        Self {
            candidate,
            announces: None,
        }
    }
}

/// Suggested next fulfillment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestAction {
    pub need_id: String,
    pub method_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    tracked: Vec<String>,
    ranked: Vec<RankedNeed>,
    last_announced: HashMap<(String, Status), u64>,
}

impl Scheduler {
    /// Track `tracked` in that order; an empty list tracks nothing until
    /// [`Scheduler::track_all`] is called.
    pub fn new(tracked: Vec<String>) -> Self {
        Self {
            tracked,
            ..Default::default()
        }
    }

    /// Track every need in the registry, in declaration order.
    pub fn track_all(registry: &NeedRegistry) -> Self {
        Self::new(registry.ids())
    }

    pub fn tracked(&self) -> &[String] {
        &self.tracked
    }

    /// Run one tick. Returns the candidates the caller should submit.
    pub fn tick(
        &mut self,
        registry: &mut NeedRegistry,
        ctx: &TickContext<'_>,
        rng: &mut impl Rng,
    ) -> Vec<TickMessage> {
        let mut candidates = Vec::new();
        let mut rows = Vec::with_capacity(self.tracked.len());

        for id in &self.tracked {
            let Some(need) = registry.get_mut(id) else {
                log::warn!("{}", PetError::missing(format!("need '{}'", id)));
                continue;
            };

            if let Some(count) = derived_count(need.derived_source(), ctx.habitat) {
                need.sync_derived(count);
            }

            if !ctx.paused {
                let recovery = need.descriptor().sleep_recovery_per_sec;
                match recovery {
                    Some(rate) if ctx.agent_asleep => need.restore(rate * ctx.elapsed_secs),
                    _ => need.degrade(ctx.elapsed_secs),
                }
            }

            let status = need.refresh_status();
            let urgency = urgency_score(need.percentage(), status, need.degradation_rate());
            need.set_urgency(urgency);

            let previous = need.previous_status();
            if status != previous {
                log::debug!(
                    "Need '{}' {} -> {} ({:.1})",
                    id,
                    previous.label(),
                    status.label(),
                    need.value()
                );
                self.last_announced.remove(&(id.clone(), previous));
            }

            if !ctx.paused {
                if let Some(reaction) = need.check_transition_reaction(rng) {
                    candidates.push(TickMessage::reaction(reaction));
                }
                if let Some(entry) = need.status_messages(status) {
                    let key = (id.clone(), status);
                    let due = self
                        .last_announced
                        .get(&key)
                        .map_or(true, |at| ctx.now_ms.saturating_sub(*at) >= entry.repeat_after_ms);
                    if due {
                        if let Some(announcement) = need.announcement(rng) {
                            candidates.push(TickMessage {
                                candidate: announcement,
                                announces: Some(key),
                            });
                        }
                    }
                }
            }

            need.advance_status_memory();

            rows.push(RankedNeed {
                need_id: id.clone(),
                urgency,
                value: need.value(),
            });
        }

        self.ranked = rank(rows);
        if let Some(top) = self.ranked.first() {
            log::trace!("Most urgent: {} ({:.1})", top.need_id, top.urgency);
        }
        candidates
    }

    /// Start the re-announcement timer for `status` of `need_id`.
    pub fn mark_announced(&mut self, need_id: &str, status: Status, now_ms: u64) {
        self.last_announced.insert((need_id.to_string(), status), now_ms);
    }

    /// Ranking published by the last tick, most urgent first.
    pub fn ranked(&self) -> &[RankedNeed] {
        &self.ranked
    }

    pub fn next_need_to_fulfill(&self) -> Option<&RankedNeed> {
        self.ranked.first()
    }

    /// Best method for the most urgent need.
    pub fn best_action(
        &self,
        registry: &NeedRegistry,
        inventory: Option<&dyn Inventory>,
    ) -> Option<BestAction> {
        let top = self.next_need_to_fulfill()?;
        let need = registry.get(&top.need_id)?;
        let method = need.best_method(inventory)?;
        Some(BestAction {
            need_id: top.need_id.clone(),
            method_id: method.id.clone(),
        })
    }

    /// Forget ranking and announcement timers.
    pub fn reset(&mut self) {
        self.ranked.clear();
        self.last_announced.clear();
    }
}

/// Collaborator count a derived need is computed from.
pub fn derived_count(source: Option<&DerivedSource>, habitat: Option<&dyn Habitat>) -> Option<u32> {
    match (source?, habitat?) {
        (DerivedSource::WasteCount { .. }, habitat) => Some(habitat.waste_count()),
        (DerivedSource::ItemCount { item_kind, .. }, habitat) => Some(habitat.item_count(item_kind)),
    }
}
