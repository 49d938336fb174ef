//! Agent status collaborator: what the pet's body is doing.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    #[default]
    Idle,
    Sitting,
    Moving,
    Sleeping,
}

impl AgentState {
    /// Sleeping can't be interrupted by autonomy.
    pub fn is_interruptible(self) -> bool {
        !matches!(self, AgentState::Sleeping)
    }

    /// Line shown when no message occupies the display.
    pub fn status_line(self) -> (&'static str, &'static str) {
        match self {
            AgentState::Idle => ("Just hanging out.", "🐾"),
            AgentState::Sitting => ("Sitting pretty.", "🐾"),
            AgentState::Moving => ("On the move...", "👣"),
            AgentState::Sleeping => ("Zzz...", "💤"),
        }
    }
}

pub trait AgentStatus {
    fn current_state(&self) -> AgentState;
    fn set_state(&mut self, state: AgentState);
    /// Body-level pause, independent of the engine's own flag.
    fn is_paused(&self) -> bool;
}

/// Reference agent: a state and a pause flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetBody {
    pub state: AgentState,
    pub paused: bool,
}

impl PetBody {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AgentStatus for PetBody {
    fn current_state(&self) -> AgentState {
        self.state
    }

    fn set_state(&mut self, state: AgentState) {
        if self.state != state {
            log::trace!("Agent state {:?} -> {:?}", self.state, state);
        }
        self.state = state;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }
}
