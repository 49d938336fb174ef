//! Declarative need descriptors and the single parameterised need entity.
//!
//! Every need (hunger, sleep, cleanliness, ...) is the same [`NeedEntity`]
//! type built from a [`NeedDescriptor`]. The descriptor carries thresholds,
//! the degradation policy, message and reaction catalogs, fulfillment methods
//! and the optional movement spec used by autonomy.
//!
//! Values are in percent of [`limits::MAX_VALUE`]; higher is better.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::autonomy::MovementSpec;
use crate::constants::limits;
use crate::message::{AmbientKind, Candidate, Category};
use crate::status::{Status, StatusThresholds};

/// Resource store consulted by fulfillment methods that cost something.
pub trait Inventory {
    fn has(&self, item: &str, quantity: u32) -> bool;
    /// Remove `quantity` of `item`. Returns false if there was not enough.
    fn consume(&mut self, item: &str, quantity: u32) -> bool;
}

/// How a need's value changes between explicit events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum DegradationPolicy {
    /// Loses `rate_per_sec` every second.
    Linear { rate_per_sec: f32 },
    /// Pure function of collaborator state; never decays on its own.
    Derived { source: DerivedSource },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DerivedSource {
    /// Full minus a penalty per waste pile in the habitat.
    WasteCount { penalty_per_unit: f32 },
    /// `base` plus a fixed amount per item of `item_kind` in the habitat.
    ItemCount {
        item_kind: String,
        value_per_item: f32,
        #[serde(default)]
        base: f32,
    },
}

impl DerivedSource {
    pub fn value_for(&self, count: u32) -> f32 {
        let raw = match self {
            DerivedSource::WasteCount { penalty_per_unit } => {
                limits::MAX_VALUE - penalty_per_unit * count as f32
            }
            DerivedSource::ItemCount {
                value_per_item,
                base,
                ..
            } => base + value_per_item * count as f32,
        };
        raw.clamp(limits::MIN_VALUE, limits::MAX_VALUE)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodEffect {
    #[default]
    Raise,
    /// Raise, and ask the habitat to remove all waste.
    ClearWaste,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceCost {
    pub item: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FulfillmentMethod {
    pub id: String,
    pub improvement: f32,
    #[serde(default)]
    pub cost: Option<ResourceCost>,
    #[serde(default)]
    pub effect: MethodEffect,
    /// Announcement shown on success.
    pub message: String,
    #[serde(default)]
    pub icon: Option<String>,
}

impl FulfillmentMethod {
    pub fn is_available(&self, inventory: Option<&dyn Inventory>) -> bool {
        match (&self.cost, inventory) {
            (None, _) => true,
            (Some(cost), Some(inv)) => inv.has(&cost.item, cost.quantity),
            (Some(_), None) => false,
        }
    }
}

/// Announcement catalog entry for one status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusMessages {
    pub status: Status,
    pub texts: Vec<String>,
    pub icon: String,
    /// Minimum gap before the same status is announced again.
    pub repeat_after_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub from: Status,
    pub to: Status,
    pub texts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailureTexts {
    pub unknown_method: String,
    pub unavailable: String,
    pub already_full: String,
}

impl Default for FailureTexts {
    fn default() -> Self {
        Self {
            unknown_method: "I don't know how to do that.".into(),
            unavailable: "That's not available right now.".into(),
            already_full: "I'm already perfectly fine!".into(),
        }
    }
}

fn default_initial() -> f32 {
    limits::MAX_VALUE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeedDescriptor {
    pub id: String,
    pub label: String,
    pub icon: String,
    #[serde(default = "default_initial")]
    pub initial: f32,
    pub degradation: DegradationPolicy,
    #[serde(default)]
    pub thresholds: StatusThresholds,
    #[serde(default)]
    pub announcements: Vec<StatusMessages>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    /// Declaration order is preference order for the best action.
    #[serde(default)]
    pub methods: Vec<FulfillmentMethod>,
    #[serde(default)]
    pub fulfillment_reactions: Vec<String>,
    #[serde(default)]
    pub failures: FailureTexts,
    #[serde(default)]
    pub movement: Option<MovementSpec>,
    /// Recovery rate while the pet sleeps, replacing decay.
    #[serde(default)]
    pub sleep_recovery_per_sec: Option<f32>,
}

impl NeedDescriptor {
    pub fn linear(id: impl Into<String>, rate_per_sec: f32) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            icon: String::new(),
            initial: limits::MAX_VALUE,
            degradation: DegradationPolicy::Linear { rate_per_sec },
            thresholds: StatusThresholds::default(),
            announcements: Vec::new(),
            reactions: Vec::new(),
            methods: Vec::new(),
            fulfillment_reactions: Vec::new(),
            failures: FailureTexts::default(),
            movement: None,
            sleep_recovery_per_sec: None,
        }
    }

    pub fn with_initial(mut self, initial: f32) -> Self {
        self.initial = initial;
        self
    }

    pub fn with_method(mut self, method: FulfillmentMethod) -> Self {
        self.methods.push(method);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfillFailure {
    UnknownNeed,
    UnknownMethod,
    ResourceUnavailable,
    AlreadyFull,
}

/// Structured result of a fulfillment request. Never an error path.
#[derive(Debug, Clone, PartialEq)]
pub struct FulfillResult {
    pub success: bool,
    pub improvement: f32,
    pub message: String,
    pub failure: Option<FulfillFailure>,
}

impl FulfillResult {
    pub fn failed(failure: FulfillFailure, message: impl Into<String>) -> Self {
        Self {
            success: false,
            improvement: 0.0,
            message: message.into(),
            failure: Some(failure),
        }
    }
}

/// Everything a fulfillment produces: the result plus the messages the
/// caller should submit (announcement now, reaction after a delay).
#[derive(Debug, Clone)]
pub struct Fulfillment {
    pub result: FulfillResult,
    pub effect: Option<MethodEffect>,
    pub announcement: Option<Candidate>,
    pub reaction: Option<Candidate>,
}

impl Fulfillment {
    fn failed(failure: FulfillFailure, message: &str) -> Self {
        Self {
            result: FulfillResult::failed(failure, message),
            effect: None,
            announcement: None,
            reaction: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NeedEntity {
    descriptor: NeedDescriptor,
    value: f32,
    status: Status,
    previous_status: Status,
    urgency: f32,
}

impl NeedEntity {
    pub fn new(descriptor: NeedDescriptor) -> Self {
        let value = descriptor.initial.clamp(limits::MIN_VALUE, limits::MAX_VALUE);
        let status = descriptor.thresholds.classify(value);
        Self {
            descriptor,
            value,
            status,
            previous_status: status,
            urgency: 0.0,
        }
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    pub fn descriptor(&self) -> &NeedDescriptor {
        &self.descriptor
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn percentage(&self) -> f32 {
        self.value / limits::MAX_VALUE * 100.0
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn previous_status(&self) -> Status {
        self.previous_status
    }

    pub fn urgency(&self) -> f32 {
        self.urgency
    }

    /// Assigned by the scheduler once per tick.
    pub fn set_urgency(&mut self, score: f32) {
        self.urgency = score;
    }

    pub fn degradation_rate(&self) -> f32 {
        match &self.descriptor.degradation {
            DegradationPolicy::Linear { rate_per_sec } => rate_per_sec.max(0.0),
            DegradationPolicy::Derived { .. } => 0.0,
        }
    }

    pub fn is_event_driven(&self) -> bool {
        matches!(self.descriptor.degradation, DegradationPolicy::Derived { .. })
    }

    pub fn derived_source(&self) -> Option<&DerivedSource> {
        match &self.descriptor.degradation {
            DegradationPolicy::Derived { source } => Some(source),
            DegradationPolicy::Linear { .. } => None,
        }
    }

    /// Decay by `rate * elapsed_secs`. No-op for event-driven needs.
    pub fn degrade(&mut self, elapsed_secs: f32) {
        let amount = self.degradation_rate() * elapsed_secs.max(0.0);
        self.degrade_by(amount);
    }

    /// Decay by an explicit amount. No-op for event-driven needs.
    pub fn degrade_by(&mut self, amount: f32) {
        if self.is_event_driven() {
            return;
        }
        self.set_value(self.value - amount.max(0.0));
    }

    /// Clamped increase, independent of any method.
    pub fn restore(&mut self, amount: f32) {
        self.set_value(self.value + amount.max(0.0));
    }

    pub fn set_value(&mut self, value: f32) {
        self.value = value.clamp(limits::MIN_VALUE, limits::MAX_VALUE);
    }

    /// Recompute a derived value from the collaborator count.
    /// Returns true if the value changed.
    pub fn sync_derived(&mut self, count: u32) -> bool {
        let Some(source) = self.derived_source() else {
            return false;
        };
        let next = source.value_for(count);
        let changed = (next - self.value).abs() > f32::EPSILON;
        self.value = next;
        changed
    }

    pub fn compute_status(&self) -> Status {
        self.descriptor.thresholds.classify(self.percentage())
    }

    pub fn refresh_status(&mut self) -> Status {
        self.status = self.compute_status();
        self.status
    }

    /// Reaction for a one-band move since the last tick. Two-band jumps are
    /// silent.
    pub fn check_transition_reaction(&self, rng: &mut impl Rng) -> Option<Candidate> {
        let (from, to) = (self.previous_status, self.status);
        if !from.is_adjacent(to) {
            return None;
        }
        let reaction = self
            .descriptor
            .reactions
            .iter()
            .find(|r| r.from == from && r.to == to)?;
        let text = reaction.texts.choose(rng)?;
        Some(
            Candidate::new(text.clone(), self.descriptor.icon.clone(), Category::Reaction)
                .from_need(self.id()),
        )
    }

    /// Must run once per tick, after the reaction check.
    pub fn advance_status_memory(&mut self) {
        self.previous_status = self.status;
    }

    pub fn status_messages(&self, status: Status) -> Option<&StatusMessages> {
        self.descriptor
            .announcements
            .iter()
            .find(|m| m.status == status)
    }

    /// Announcement for the current status, if the catalog has one.
    pub fn announcement(&self, rng: &mut impl Rng) -> Option<Candidate> {
        let entry = self.status_messages(self.status)?;
        let text = entry.texts.choose(rng)?;
        let category = if self.status.is_alarming() {
            Category::Urgency
        } else {
            Category::Ambient(AmbientKind::Status)
        };
        Some(
            Candidate::new(text.clone(), entry.icon.clone(), category)
                .with_priority(self.status.announcement_priority())
                .from_need(self.id()),
        )
    }

    pub fn method(&self, method_id: &str) -> Option<&FulfillmentMethod> {
        self.descriptor.methods.iter().find(|m| m.id == method_id)
    }

    /// First declared method whose cost can be paid, else the first declared.
    pub fn best_method(&self, inventory: Option<&dyn Inventory>) -> Option<&FulfillmentMethod> {
        self.descriptor
            .methods
            .iter()
            .find(|m| m.is_available(inventory))
            .or_else(|| self.descriptor.methods.first())
    }

    pub fn fulfill(
        &mut self,
        method_id: &str,
        inventory: Option<&mut dyn Inventory>,
        rng: &mut impl Rng,
    ) -> Fulfillment {
        let failures = &self.descriptor.failures;
        let Some(method) = self.descriptor.methods.iter().find(|m| m.id == method_id) else {
            return Fulfillment::failed(FulfillFailure::UnknownMethod, &failures.unknown_method);
        };
        if self.value >= limits::MAX_VALUE {
            return Fulfillment::failed(FulfillFailure::AlreadyFull, &failures.already_full);
        }
        if let Some(cost) = &method.cost {
            let paid = match inventory {
                Some(inv) => inv.has(&cost.item, cost.quantity) && inv.consume(&cost.item, cost.quantity),
                None => false,
            };
            if !paid {
                return Fulfillment::failed(
                    FulfillFailure::ResourceUnavailable,
                    &failures.unavailable,
                );
            }
        }

        let method = method.clone();
        let before = self.value;
        self.set_value(before + method.improvement);
        self.refresh_status();

        let icon = method
            .icon
            .clone()
            .unwrap_or_else(|| self.descriptor.icon.clone());
        let announcement = Candidate::new(method.message.clone(), icon, Category::Fulfillment)
            .from_need(self.id());
        let reaction = self.descriptor.fulfillment_reactions.choose(rng).map(|text| {
            Candidate::new(text.clone(), self.descriptor.icon.clone(), Category::Reaction)
                .from_need(self.id())
        });

        Fulfillment {
            result: FulfillResult {
                success: true,
                improvement: self.value - before,
                message: method.message,
                failure: None,
            },
            effect: Some(method.effect),
            announcement: Some(announcement),
            reaction,
        }
    }
}
