//! petsim Core - Virtual Pet Runtime
//!
//! Runs a single pet whose needs (hunger, thirst, sleep, cleanliness, ...)
//! decay over time. An urgency scheduler ranks the needs every tick, a
//! single-slot priority queue decides which message the pet shows, and an
//! autonomy engine walks the pet across a grid toward whatever satisfies its
//! most urgent need.
//!
//! # Architecture
//!
//! - **Needs**: one parameterised entity type built from JSON descriptors
//!   (see [`registry`] and `petsim_logic::need`)
//! - **Collaborators**: optional [`habitat::Habitat`], `Inventory` and
//!   [`agent::AgentStatus`] implementations; the reference habitat is a
//!   `hecs` world
//! - **Engine**: owns the virtual clock and drives every cadence
//!
//! # Example
//!
//! ```rust,no_run
//! use petsim_core::prelude::*;
//!
//! let mut habitat = GridHabitat::new(12, 8);
//! habitat.spawn_pet(GridPos::new(0, 0));
//! habitat.place_item("apple", 80, GridPos::new(4, 2));
//!
//! let mut engine = PetEngine::with_defaults()?
//!     .with_habitat(habitat)
//!     .with_agent(PetBody::new())
//!     .with_inventory(Pantry::new().with_stock("kibble", 3));
//!
//! loop {
//!     engine.update(100);
//!     println!("{}", engine.current_message().text);
//! }
//! # Ok::<(), PetError>(())
//! ```

pub mod agent;
pub mod autonomy;
pub mod config;
pub mod engine;
pub mod error;
pub mod habitat;
pub mod inventory;
pub mod registry;
pub mod scheduler;
pub mod timeline;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::agent::{AgentState, AgentStatus, PetBody};
    pub use crate::autonomy::{Arrival, AutonomyOutcome};
    pub use crate::config::PetConfig;
    pub use crate::engine::{DisplayLine, PetEngine, PetEvent};
    pub use crate::error::PetError;
    pub use crate::habitat::{GridHabitat, Habitat};
    pub use crate::inventory::Pantry;
    pub use crate::registry::NeedRegistry;
    pub use petsim_logic::grid::GridPos;
    pub use petsim_logic::need::{FulfillResult, Inventory};
}
