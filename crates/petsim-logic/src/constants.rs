//! Runtime constants: value bounds, clock cadences, message priorities.
//!
//! Plain constants with no engine dependency. The runtime crate reads its
//! defaults from here and lets configuration override the timing values.

pub mod limits {
    /// Upper bound of every need value.
    pub const MAX_VALUE: f32 = 100.0;
    pub const MIN_VALUE: f32 = 0.0;
}

pub mod timing {
    /// Scheduler tick (1 Hz).
    pub const TICK_INTERVAL_MS: u64 = 1_000;
    /// Autonomy cadence (0.5 Hz).
    pub const AUTONOMY_INTERVAL_MS: u64 = 2_000;
    /// A displaying message shields itself from normal candidates this long.
    pub const MIN_DISPLAY_MS: u64 = 1_500;
    /// Floor applied to every message duration.
    pub const MIN_DURATION_MS: u64 = 1_500;
    /// Delay between a fulfillment announcement and the pet's reaction.
    pub const REACTION_DELAY_MS: u64 = 1_200;
    pub const DEFAULT_MESSAGE_MS: u64 = 3_000;
    pub const REACTION_MESSAGE_MS: u64 = 2_500;
    pub const AMBIENT_MESSAGE_MS: u64 = 2_000;
}

/// Message priorities. Lower is more urgent.
pub mod priorities {
    pub const FULFILLMENT: u8 = 1;
    pub const CRITICAL: u8 = 2;
    pub const REACTION: u8 = 3;
    pub const URGENT: u8 = 4;
    pub const STATUS_CHANGE: u8 = 5;
    pub const TEMPORARY_OVERRIDE: u8 = 5;
    pub const NORMAL: u8 = 6;
    pub const AMBIENT: u8 = 8;
    /// Candidates at or below this priority always preempt.
    pub const PREEMPT_MAX: u8 = 2;
}

pub mod urgency {
    pub const CRITICAL_BONUS: f32 = 50.0;
    pub const URGENT_BONUS: f32 = 25.0;
    pub const RATE_DIVISOR: f32 = 5.0;
    pub const RATE_WEIGHT: f32 = 10.0;
}

pub mod autonomy {
    /// Each grid step of distance costs this much quality.
    pub const DISTANCE_WEIGHT: i32 = 2;
}

/// Ids of the built-in needs.
pub mod need_ids {
    pub const HUNGER: &str = "hunger";
    pub const THIRST: &str = "thirst";
    pub const SLEEP: &str = "sleep";
    pub const CLEANLINESS: &str = "cleanliness";
    pub const FUN: &str = "fun";
    pub const AFFECTION: &str = "affection";
    pub const COZINESS: &str = "coziness";
}
