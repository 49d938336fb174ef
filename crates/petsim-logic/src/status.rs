//! Status bands derived from a need's fill percentage.

use serde::{Deserialize, Serialize};

use crate::constants::{limits, priorities, urgency};

/// Status of a need, ordered from most to least depleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Critical,
    Urgent,
    Normal,
    Fulfilled,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Critical,
        Status::Urgent,
        Status::Normal,
        Status::Fulfilled,
    ];

    /// Position on the critical → fulfilled ladder.
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// True for the six one-band transitions (in either direction).
    pub fn is_adjacent(self, other: Status) -> bool {
        (self.rank() as i16 - other.rank() as i16).abs() == 1
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Critical => "critical",
            Status::Urgent => "urgent",
            Status::Normal => "normal",
            Status::Fulfilled => "fulfilled",
        }
    }

    /// Bonus added to the urgency score while in this band.
    pub fn urgency_bonus(self) -> f32 {
        match self {
            Status::Critical => urgency::CRITICAL_BONUS,
            Status::Urgent => urgency::URGENT_BONUS,
            _ => 0.0,
        }
    }

    /// Priority used when the scheduler announces this status.
    pub fn announcement_priority(self) -> u8 {
        match self {
            Status::Critical => priorities::CRITICAL,
            Status::Urgent => priorities::URGENT,
            Status::Normal => priorities::AMBIENT - 1,
            Status::Fulfilled => priorities::AMBIENT,
        }
    }

    /// Urgent and critical announcements are urgency messages; the rest is chatter.
    pub fn is_alarming(self) -> bool {
        matches!(self, Status::Critical | Status::Urgent)
    }
}

/// Lower bounds (in percent) of the fulfilled, normal and urgent bands.
/// Anything below `urgent` is critical.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusThresholds {
    pub fulfilled: f32,
    pub normal: f32,
    pub urgent: f32,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            fulfilled: 90.0,
            normal: 70.0,
            urgent: 50.0,
        }
    }
}

impl StatusThresholds {
    /// Bands must be strictly ordered inside (0, 100] to partition the range.
    pub fn is_monotonic(&self) -> bool {
        self.fulfilled <= limits::MAX_VALUE
            && self.fulfilled > self.normal
            && self.normal > self.urgent
            && self.urgent > limits::MIN_VALUE
    }

    pub fn classify(&self, percentage: f32) -> Status {
        if percentage >= self.fulfilled {
            Status::Fulfilled
        } else if percentage >= self.normal {
            Status::Normal
        } else if percentage >= self.urgent {
            Status::Urgent
        } else {
            Status::Critical
        }
    }
}
