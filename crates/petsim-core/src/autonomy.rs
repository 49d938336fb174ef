//! Autonomy engine: walks the pet toward whatever satisfies its most urgent
//! movement-capable need.
//!
//! Each cycle moves the agent at most one grid cell. Arrival is resolved here
//! (item removal, sleeping, staying put); the engine then runs the arrival
//! method's fulfillment.

use petsim_logic::autonomy::{
    candidates_for, select_best, ItemRef, MovementTarget, Resolution, TargetSpec,
};
use petsim_logic::grid::GridPos;
use petsim_logic::urgency::RankedNeed;

use crate::agent::{AgentState, AgentStatus};
use crate::error::PetError;
use crate::habitat::Habitat;
use crate::registry::NeedRegistry;

/// The pet reached its target.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrival {
    pub need_id: String,
    /// Fulfillment method to run for the need.
    pub method: String,
    pub resolution: Resolution,
    pub item: ItemRef,
    pub fixed: bool,
}

#[derive(Debug)]
pub enum AutonomyOutcome {
    /// Paused or asleep; nothing evaluated.
    Suspended,
    NoEligibleNeed,
    /// Cycle skipped; retried next cadence.
    Aborted(PetError),
    /// The pursued need recovered above its threshold.
    Cancelled { need_id: String },
    Moving {
        need_id: String,
        position: GridPos,
        remaining: i32,
        /// A new target was selected this cycle.
        started: bool,
    },
    Arrived(Arrival),
}

#[derive(Debug, Clone, Default)]
pub struct AutonomyEngine {
    target: Option<MovementTarget>,
}

impl AutonomyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(&self) -> Option<&MovementTarget> {
        self.target.as_ref()
    }

    pub fn cancel(&mut self) -> Option<MovementTarget> {
        self.target.take()
    }

    /// One autonomy cycle.
    pub fn step(
        &mut self,
        ranked: &[RankedNeed],
        registry: &NeedRegistry,
        habitat: &mut dyn Habitat,
        agent: &mut dyn AgentStatus,
        paused: bool,
    ) -> AutonomyOutcome {
        if paused || agent.is_paused() || !agent.current_state().is_interruptible() {
            return AutonomyOutcome::Suspended;
        }
        let Some(position) = habitat.agent_position() else {
            return AutonomyOutcome::Aborted(PetError::missing("agent position"));
        };
        let items = habitat.items();

        if let Some(target) = &self.target {
            let still_needed = registry.get(&target.need_id).is_some_and(|need| {
                need.descriptor()
                    .movement
                    .as_ref()
                    .is_some_and(|spec| spec.is_eligible(need.percentage()))
            });
            if !still_needed {
                let need_id = target.need_id.clone();
                log::debug!("Target for '{}' cancelled, need recovered", need_id);
                self.target = None;
                stop_moving(agent);
                return AutonomyOutcome::Cancelled { need_id };
            }
            if !target.fixed && !items.iter().any(|item| item.id == target.item.id) {
                log::debug!("Target item {} vanished, reselecting", target.item.id);
                self.target = None;
            }
        }

        let eligible = ranked.iter().find_map(|row| {
            let need = registry.get(&row.need_id)?;
            let spec = need.descriptor().movement.as_ref()?;
            spec.is_eligible(need.percentage()).then_some((need.id(), spec))
        });
        let Some((need_id, spec)) = eligible else {
            self.target = None;
            stop_moving(agent);
            return AutonomyOutcome::NoEligibleNeed;
        };

        let mut started = false;
        let keep = self.target.as_ref().is_some_and(|t| t.need_id == need_id);
        if !keep {
            let candidates = candidates_for(&spec.target, &items);
            let Some((item, score)) = select_best(position, &candidates) else {
                self.target = None;
                stop_moving(agent);
                return AutonomyOutcome::Aborted(PetError::NoTarget {
                    need: need_id.to_string(),
                });
            };
            log::info!(
                "Heading to {} #{} at ({}, {}) for '{}' (score {})",
                item.kind,
                item.id,
                item.position.x,
                item.position.y,
                need_id,
                score
            );
            self.target = Some(MovementTarget {
                need_id: need_id.to_string(),
                item: item.clone(),
                position: item.position,
                fixed: matches!(spec.target, TargetSpec::Fixed { .. }),
            });
            started = true;
        }

        let Some(target) = self.target.clone() else {
            return AutonomyOutcome::NoEligibleNeed;
        };
        let next = position.step_toward(&target.position);
        habitat.set_agent_position(next);

        if next != target.position {
            agent.set_state(AgentState::Moving);
            return AutonomyOutcome::Moving {
                need_id: target.need_id,
                position: next,
                remaining: next.manhattan(&target.position),
                started,
            };
        }

        self.target = None;
        match spec.resolution {
            Resolution::ConsumeItem => {
                if !habitat.remove_item(target.item.id) {
                    log::warn!("Item {} was already gone on arrival", target.item.id);
                }
                agent.set_state(AgentState::Idle);
            }
            Resolution::Drink => agent.set_state(AgentState::Idle),
            Resolution::Rest => agent.set_state(AgentState::Sleeping),
            Resolution::Stay => agent.set_state(AgentState::Sitting),
        }
        log::info!("Arrived at {} for '{}'", target.item.kind, target.need_id);
        AutonomyOutcome::Arrived(Arrival {
            need_id: target.need_id,
            method: spec.method.clone(),
            resolution: spec.resolution,
            item: target.item,
            fixed: target.fixed,
        })
    }
}

fn stop_moving(agent: &mut dyn AgentStatus) {
    if agent.current_state() == AgentState::Moving {
        agent.set_state(AgentState::Idle);
    }
}
