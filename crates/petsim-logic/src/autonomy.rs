//! Target scoring for autonomous movement.
//!
//! A need with a [`MovementSpec`] becomes eligible for pursuit once its value
//! drops to the movement threshold. Candidates are scored as
//! `quality - 2 * manhattan(agent, item)`, so quality outweighs proximity;
//! the first of equal scores wins.

use serde::{Deserialize, Serialize};

use crate::constants::autonomy::DISTANCE_WEIGHT;
use crate::grid::GridPos;

/// What happens when the pet reaches its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Eat the item and remove it from the grid.
    ConsumeItem,
    /// Drink; the fixed location stays.
    Drink,
    /// Lie down and sleep.
    Rest,
    /// Just stay there.
    Stay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetSpec {
    /// Any habitat item whose kind is in the preference list.
    Items { preferences: Vec<String> },
    /// A single synthetic location that is always present.
    Fixed {
        position: GridPos,
        quality: i32,
        label: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementSpec {
    /// Pursue once the value is at or below this (percent).
    pub threshold: f32,
    pub target: TargetSpec,
    pub resolution: Resolution,
    /// Fulfillment method invoked on arrival.
    pub method: String,
}

impl MovementSpec {
    pub fn is_eligible(&self, value: f32) -> bool {
        value <= self.threshold
    }
}

/// An item as the habitat reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    pub id: u64,
    pub kind: String,
    pub position: GridPos,
    pub quality: i32,
}

/// Goal of the autonomy loop while it is walking somewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementTarget {
    pub need_id: String,
    pub item: ItemRef,
    pub position: GridPos,
    /// Synthetic fixed location rather than a habitat item.
    pub fixed: bool,
}

pub const FIXED_TARGET_ID: u64 = 0;

pub fn score_candidate(quality: i32, distance: i32) -> i32 {
    quality - DISTANCE_WEIGHT * distance
}

/// Items (or the synthetic location) that can satisfy `spec`.
pub fn candidates_for(spec: &TargetSpec, items: &[ItemRef]) -> Vec<ItemRef> {
    match spec {
        TargetSpec::Items { preferences } => items
            .iter()
            .filter(|item| preferences.iter().any(|p| *p == item.kind))
            .cloned()
            .collect(),
        TargetSpec::Fixed {
            position,
            quality,
            label,
        } => vec![ItemRef {
            id: FIXED_TARGET_ID,
            kind: label.clone(),
            position: *position,
            quality: *quality,
        }],
    }
}

/// Highest-scoring candidate from `agent`; the first one wins ties.
pub fn select_best<'a>(agent: GridPos, candidates: &'a [ItemRef]) -> Option<(&'a ItemRef, i32)> {
    let mut best: Option<(&ItemRef, i32)> = None;
    for item in candidates {
        let score = score_candidate(item.quality, agent.manhattan(&item.position));
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((item, score)),
        }
    }
    best
}
