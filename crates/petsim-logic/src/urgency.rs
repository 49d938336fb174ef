//! Urgency scoring and ranking.
//!
//! `urgency = clamp(100 - pct, 0, 100) + status bonus + rate / 5 * 10`
//!
//! The first term rewards how empty a need is, the bonus pushes needs that
//! crossed a band, and the rate term lets fast-draining needs surface before
//! they cross a threshold. Urgency only orders needs; it never gates anything.

use serde::{Deserialize, Serialize};

use crate::constants::urgency::{RATE_DIVISOR, RATE_WEIGHT};
use crate::status::Status;

pub fn urgency_score(percentage: f32, status: Status, degradation_rate: f32) -> f32 {
    let emptiness = (100.0 - percentage).clamp(0.0, 100.0);
    let rate_bonus = degradation_rate.max(0.0) / RATE_DIVISOR * RATE_WEIGHT;
    emptiness + status.urgency_bonus() + rate_bonus
}

/// One row of the scheduler's ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedNeed {
    pub need_id: String,
    pub urgency: f32,
    pub value: f32,
}

/// Sort descending by urgency. The sort is stable, so equal scores keep the
/// order they were collected in (registry declaration order).
pub fn rank(mut entries: Vec<RankedNeed>) -> Vec<RankedNeed> {
    entries.sort_by(|a, b| {
        b.urgency
            .partial_cmp(&a.urgency)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    entries
}
