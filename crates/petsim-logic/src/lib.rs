//! Pure simulation logic for petsim.
//!
//! This crate contains the need model and the decision rules of the pet
//! runtime, independent of any engine, habitat or clock. Functions take plain
//! data (values, timestamps in milliseconds, grid cells) and return results,
//! which keeps them unit-testable and lets the runtime crate own all state
//! that touches collaborators.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`autonomy`] | Movement specs, candidate items, quality/distance target scoring |
//! | [`constants`] | Value bounds, cadences, message priorities, need ids |
//! | [`grid`] | Grid cells, Manhattan distance, single-step walking |
//! | [`message`] | Message candidates and the single-slot priority display queue |
//! | [`need`] | Declarative need descriptors and the parameterised need entity |
//! | [`status`] | Status bands, thresholds, adjacent-transition rules |
//! | [`urgency`] | Urgency scoring and stable ranking |

pub mod autonomy;
pub mod constants;
pub mod grid;
pub mod message;
pub mod need;
pub mod status;
pub mod urgency;
