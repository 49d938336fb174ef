//! Single-slot priority message channel.
//!
//! Any producer (need urgency, fulfillment, reactions, ambient status lines)
//! hands the queue a [`Candidate`]. The queue decides whether it displays now,
//! waits in a priority-ordered buffer, replaces a waiting ambient line, or is
//! dropped. Exactly one [`Message`] occupies the display slot at a time.
//!
//! Rules, in evaluation order:
//! 1. Nothing is accepted while paused.
//! 2. High-priority candidates (priority <= 2, or fulfillment/reaction) preempt
//!    the current message immediately.
//! 3. A normal candidate arriving while the current message has shown for less
//!    than the minimum display time is dropped.
//! 4. An idle slot with an empty buffer displays the candidate at once.
//! 5. Ambient candidates are suppressed behind waiting non-ambient messages and
//!    replace a waiting ambient message of the same kind.
//! 6. Everything else waits, ordered by priority, FIFO on ties.
//!
//! Time is passed in as milliseconds; the queue owns no clock. The display
//! timer is the `ends_at_ms` of the current message, so clearing the slot
//! cancels it.

use serde::{Deserialize, Serialize};

use crate::constants::{priorities, timing};

/// Subtype of ambient chatter. One waiting entry per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbientKind {
    Movement,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Reaction,
    Fulfillment,
    Urgency,
    Ambient(AmbientKind),
    TemporaryOverride,
    StatusChange,
}

impl Category {
    pub fn is_ambient(&self) -> bool {
        matches!(self, Category::Ambient(_))
    }

    /// Categories that preempt regardless of their numeric priority.
    pub fn always_preempts(&self) -> bool {
        matches!(self, Category::Fulfillment | Category::Reaction)
    }

    pub fn default_priority(&self) -> u8 {
        match self {
            Category::Fulfillment => priorities::FULFILLMENT,
            Category::Reaction => priorities::REACTION,
            Category::Urgency => priorities::URGENT,
            Category::StatusChange => priorities::STATUS_CHANGE,
            Category::TemporaryOverride => priorities::TEMPORARY_OVERRIDE,
            Category::Ambient(_) => priorities::AMBIENT,
        }
    }

    pub fn default_duration_ms(&self) -> u64 {
        match self {
            Category::Reaction => timing::REACTION_MESSAGE_MS,
            Category::Ambient(_) => timing::AMBIENT_MESSAGE_MS,
            _ => timing::DEFAULT_MESSAGE_MS,
        }
    }
}

/// A message before the queue has accepted it (no id, no timestamp yet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    pub icon: String,
    pub duration_ms: u64,
    pub priority: u8,
    pub category: Category,
    pub source_need: Option<String>,
}

impl Candidate {
    /// Candidate with the category's default priority and duration.
    pub fn new(text: impl Into<String>, icon: impl Into<String>, category: Category) -> Self {
        Self {
            text: text.into(),
            icon: icon.into(),
            duration_ms: category.default_duration_ms(),
            priority: category.default_priority(),
            category,
            source_need: None,
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn from_need(mut self, need_id: impl Into<String>) -> Self {
        self.source_need = Some(need_id.into());
        self
    }

    pub fn is_high_priority(&self) -> bool {
        self.priority <= priorities::PREEMPT_MAX || self.category.always_preempts()
    }
}

/// An accepted message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub text: String,
    pub icon: String,
    pub duration_ms: u64,
    pub priority: u8,
    pub category: Category,
    pub source_need: Option<String>,
    pub created_at_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    Paused,
    MinimumDisplayTime,
    /// Ambient chatter never queues behind a real message.
    AmbientSuppressed,
    /// Same ambient line is already on screen.
    DuplicateAmbient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Displayed(u64),
    Preempted { id: u64, cancelled: u64 },
    Queued(u64),
    Replaced { id: u64, replaced: u64 },
    Dropped(DropReason),
}

impl SubmitOutcome {
    pub fn accepted(&self) -> bool {
        !matches!(self, SubmitOutcome::Dropped(_))
    }

    pub fn message_id(&self) -> Option<u64> {
        match *self {
            SubmitOutcome::Displayed(id)
            | SubmitOutcome::Queued(id)
            | SubmitOutcome::Preempted { id, .. }
            | SubmitOutcome::Replaced { id, .. } => Some(id),
            SubmitOutcome::Dropped(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueTiming {
    pub min_display_ms: u64,
    pub min_duration_ms: u64,
}

impl Default for QueueTiming {
    fn default() -> Self {
        Self {
            min_display_ms: timing::MIN_DISPLAY_MS,
            min_duration_ms: timing::MIN_DURATION_MS,
        }
    }
}

#[derive(Debug, Clone)]
struct Showing {
    message: Message,
    started_at_ms: u64,
    ends_at_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct MessageQueue {
    timing: QueueTiming,
    current: Option<Showing>,
    waiting: Vec<Message>,
    next_id: u64,
    paused: bool,
}

impl MessageQueue {
    pub fn new(timing: QueueTiming) -> Self {
        Self {
            timing,
            ..Default::default()
        }
    }

    pub fn timing(&self) -> QueueTiming {
        self.timing
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Offer a candidate to the channel at time `now_ms`.
    pub fn submit(&mut self, candidate: Candidate, now_ms: u64) -> SubmitOutcome {
        if self.paused {
            return SubmitOutcome::Dropped(DropReason::Paused);
        }

        if candidate.is_high_priority() {
            let message = self.stamp(candidate, now_ms);
            let id = message.id;
            return match self.current.take() {
                Some(previous) => {
                    self.begin(message, now_ms);
                    SubmitOutcome::Preempted {
                        id,
                        cancelled: previous.message.id,
                    }
                }
                None => {
                    self.begin(message, now_ms);
                    SubmitOutcome::Displayed(id)
                }
            };
        }

        match &self.current {
            Some(showing) => {
                if now_ms.saturating_sub(showing.started_at_ms) < self.timing.min_display_ms {
                    return SubmitOutcome::Dropped(DropReason::MinimumDisplayTime);
                }
            }
            None if self.waiting.is_empty() => {
                let message = self.stamp(candidate, now_ms);
                let id = message.id;
                self.begin(message, now_ms);
                return SubmitOutcome::Displayed(id);
            }
            None => {}
        }

        if let Category::Ambient(kind) = candidate.category {
            if self.waiting.iter().any(|m| !m.category.is_ambient()) {
                return SubmitOutcome::Dropped(DropReason::AmbientSuppressed);
            }
            if let Some(showing) = &self.current {
                if showing.message.category == candidate.category
                    && showing.message.text == candidate.text
                {
                    return SubmitOutcome::Dropped(DropReason::DuplicateAmbient);
                }
            }
            if let Some(pos) = self
                .waiting
                .iter()
                .position(|m| m.category == Category::Ambient(kind))
            {
                let replaced = self.waiting.remove(pos).id;
                let message = self.stamp(candidate, now_ms);
                let id = message.id;
                self.enqueue(message);
                return SubmitOutcome::Replaced { id, replaced };
            }
        }

        let message = self.stamp(candidate, now_ms);
        let id = message.id;
        self.enqueue(message);
        SubmitOutcome::Queued(id)
    }

    /// Move the head of the buffer into an idle display slot.
    /// Returns the id of the message that started displaying.
    pub fn advance(&mut self, now_ms: u64) -> Option<u64> {
        if self.current.is_some() || self.waiting.is_empty() {
            return None;
        }
        let message = self.waiting.remove(0);
        let id = message.id;
        self.begin(message, now_ms);
        Some(id)
    }

    /// Display timer. Expires the current message once its duration has run
    /// and pulls the next one in. Returns true if the slot changed.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        let expired = self
            .current
            .as_ref()
            .is_some_and(|showing| now_ms >= showing.ends_at_ms);
        if expired {
            self.current = None;
        }
        let advanced = self.advance(now_ms).is_some();
        expired || advanced
    }

    /// Empty the buffer, cancel the display timer and blank the slot.
    pub fn clear_all(&mut self) {
        self.waiting.clear();
        self.current = None;
    }

    /// Drop backlog only; the current message finishes normally.
    pub fn clear_waiting(&mut self) {
        self.waiting.clear();
    }

    pub fn current(&self) -> Option<&Message> {
        self.current.as_ref().map(|s| &s.message)
    }

    /// Current text and icon, or the caller's fallback when the slot is idle.
    pub fn current_line_or<'a>(&'a self, fallback: (&'a str, &'a str)) -> (&'a str, &'a str) {
        match &self.current {
            Some(showing) => (showing.message.text.as_str(), showing.message.icon.as_str()),
            None => fallback,
        }
    }

    /// How long the current message has been on screen.
    pub fn displayed_for(&self, now_ms: u64) -> Option<u64> {
        self.current
            .as_ref()
            .map(|s| now_ms.saturating_sub(s.started_at_ms))
    }

    /// When the current message's timer fires.
    pub fn ends_at(&self) -> Option<u64> {
        self.current.as_ref().map(|s| s.ends_at_ms)
    }

    pub fn waiting(&self) -> &[Message] {
        &self.waiting
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    fn stamp(&mut self, candidate: Candidate, now_ms: u64) -> Message {
        self.next_id += 1;
        Message {
            id: self.next_id,
            text: candidate.text,
            icon: candidate.icon,
            duration_ms: candidate.duration_ms.max(self.timing.min_duration_ms),
            priority: candidate.priority,
            category: candidate.category,
            source_need: candidate.source_need,
            created_at_ms: now_ms,
        }
    }

    fn begin(&mut self, message: Message, now_ms: u64) {
        let ends_at_ms = now_ms.saturating_add(message.duration_ms);
        self.current = Some(Showing {
            message,
            started_at_ms: now_ms,
            ends_at_ms,
        });
    }

    fn enqueue(&mut self, message: Message) {
        let pos = self
            .waiting
            .iter()
            .position(|m| m.priority > message.priority)
            .unwrap_or(self.waiting.len());
        self.waiting.insert(pos, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normal(text: &str) -> Candidate {
        Candidate::new(text, "", Category::StatusChange).with_priority(priorities::NORMAL)
    }

    fn moving(text: &str) -> Candidate {
        Candidate::new(text, "🐾", Category::Ambient(AmbientKind::Movement))
    }

    #[test]
    fn test_idle_slot_displays_immediately() {
        let mut q = MessageQueue::default();
        let outcome = q.submit(normal("hello"), 0);
        assert_eq!(outcome, SubmitOutcome::Displayed(1));
        assert_eq!(q.current().unwrap().text, "hello");
        assert!(q.waiting().is_empty());
    }

    #[test]
    fn test_minimum_display_drops_normal() {
        let mut q = MessageQueue::default();
        q.submit(normal("first"), 0);
        let outcome = q.submit(normal("second"), 500);
        assert_eq!(outcome, SubmitOutcome::Dropped(DropReason::MinimumDisplayTime));
        assert_eq!(q.current().unwrap().text, "first");
        assert!(q.waiting().is_empty());
    }

    #[test]
    fn test_fulfillment_preempts_inside_window() {
        let mut q = MessageQueue::default();
        q.submit(normal("first"), 0);
        let fulfil = Candidate::new("Yum", "🍖", Category::Fulfillment);
        let outcome = q.submit(fulfil, 500);
        assert_eq!(outcome, SubmitOutcome::Preempted { id: 2, cancelled: 1 });
        assert_eq!(q.current().unwrap().text, "Yum");
        assert_eq!(q.displayed_for(500), Some(0));
    }

    #[test]
    fn test_numeric_priority_preempts() {
        let mut q = MessageQueue::default();
        q.submit(normal("first"), 0);
        let critical = normal("help").with_priority(priorities::CRITICAL);
        assert!(matches!(q.submit(critical, 100), SubmitOutcome::Preempted { .. }));
    }

    #[test]
    fn test_queue_orders_by_priority_then_fifo() {
        let mut q = MessageQueue::default();
        q.submit(normal("showing"), 0);
        q.submit(normal("a").with_priority(6), 2_000);
        q.submit(normal("b").with_priority(4), 2_000);
        q.submit(normal("c").with_priority(6), 2_000);
        q.submit(normal("d").with_priority(4), 2_000);
        let order: Vec<&str> = q.waiting().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_timer_advances_buffer() {
        let mut q = MessageQueue::default();
        q.submit(normal("first").with_duration(3_000), 0);
        q.submit(normal("second"), 2_000);
        assert!(!q.poll(2_999));
        assert_eq!(q.current().unwrap().text, "first");
        assert!(q.poll(3_000));
        assert_eq!(q.current().unwrap().text, "second");
        assert_eq!(q.displayed_for(3_500), Some(500));
    }

    #[test]
    fn test_empty_buffer_falls_back() {
        let mut q = MessageQueue::default();
        q.submit(normal("only").with_duration(2_000), 0);
        assert!(q.poll(2_000));
        assert!(q.is_idle());
        assert_eq!(q.current_line_or(("idle", "🙂")), ("idle", "🙂"));
        // Fallback has no limit.
        assert!(!q.poll(60_000));
        assert!(q.is_idle());
    }

    #[test]
    fn test_pinned_message_never_expires() {
        let mut q = MessageQueue::default();
        let pinned = normal("pinned").with_duration(u64::MAX);
        assert_eq!(q.submit(pinned, 5), SubmitOutcome::Displayed(1));
        assert!(!q.poll(u64::MAX - 1));
        assert_eq!(q.current().unwrap().text, "pinned");
    }

    #[test]
    fn test_duration_floor() {
        let mut q = MessageQueue::default();
        q.submit(normal("blink").with_duration(10), 0);
        assert_eq!(q.current().unwrap().duration_ms, timing::MIN_DURATION_MS);
        assert_eq!(q.ends_at(), Some(timing::MIN_DURATION_MS));
    }

    #[test]
    fn test_ambient_deduplicated() {
        let mut q = MessageQueue::default();
        q.submit(normal("long").with_duration(10_000), 0);
        let first = q.submit(moving("agent moving"), 2_000);
        let second = q.submit(moving("agent moving"), 2_100);
        assert_eq!(first, SubmitOutcome::Queued(2));
        assert_eq!(second, SubmitOutcome::Replaced { id: 3, replaced: 2 });
        let ambient = q.waiting().iter().filter(|m| m.category.is_ambient()).count();
        assert_eq!(ambient, 1);
    }

    #[test]
    fn test_ambient_kinds_do_not_replace_each_other() {
        let mut q = MessageQueue::default();
        q.submit(normal("long").with_duration(10_000), 0);
        q.submit(moving("walking"), 2_000);
        let status = Candidate::new("content", "", Category::Ambient(AmbientKind::Status));
        assert_eq!(q.submit(status, 2_000), SubmitOutcome::Queued(3));
        assert_eq!(q.waiting().len(), 2);
    }

    #[test]
    fn test_ambient_suppressed_behind_real_message() {
        let mut q = MessageQueue::default();
        q.submit(normal("long").with_duration(10_000), 0);
        q.submit(normal("waiting"), 2_000);
        let outcome = q.submit(moving("walking"), 2_000);
        assert_eq!(outcome, SubmitOutcome::Dropped(DropReason::AmbientSuppressed));
        assert_eq!(q.waiting().len(), 1);
    }

    #[test]
    fn test_ambient_duplicate_of_current_dropped() {
        let mut q = MessageQueue::default();
        q.submit(moving("walking").with_duration(5_000), 0);
        let outcome = q.submit(moving("walking"), 2_000);
        assert_eq!(outcome, SubmitOutcome::Dropped(DropReason::DuplicateAmbient));
    }

    #[test]
    fn test_paused_rejects_everything() {
        let mut q = MessageQueue::default();
        q.submit(normal("before"), 0);
        q.set_paused(true);
        let fulfil = Candidate::new("Yum", "", Category::Fulfillment);
        assert_eq!(q.submit(fulfil, 100), SubmitOutcome::Dropped(DropReason::Paused));
        // The current message is untouched and still expires on time.
        assert_eq!(q.current().unwrap().text, "before");
        assert!(q.poll(timing::DEFAULT_MESSAGE_MS));
        assert!(q.is_idle());
    }

    #[test]
    fn test_clear_all_cancels_timer() {
        let mut q = MessageQueue::default();
        q.submit(normal("a"), 0);
        q.submit(normal("b"), 2_000);
        q.clear_all();
        assert!(q.is_idle());
        assert_eq!(q.ends_at(), None);
        assert!(!q.poll(10_000));
        assert!(q.waiting().is_empty());
    }

    #[test]
    fn test_ids_monotonic_across_outcomes() {
        let mut q = MessageQueue::default();
        let a = q.submit(normal("a"), 0).message_id().unwrap();
        q.submit(normal("dropped"), 10);
        let b = q.submit(Candidate::new("r", "", Category::Reaction), 20).message_id().unwrap();
        assert!(b > a);
    }
}
