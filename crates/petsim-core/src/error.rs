//! Error taxonomy for the runtime.
//!
//! Only loading (config, registry) returns `Err`. Everything the tick and
//! autonomy loops can run into is carried as a value and logged; no single
//! need or collaborator can tear a loop down.

use petsim_logic::need::FulfillFailure;

#[derive(Debug)]
pub enum PetError {
    /// An entity or collaborator isn't registered.
    ConfigurationMissing { what: String },
    /// Config or registry JSON failed to parse.
    Config(serde_json::Error),
    /// A descriptor parsed but violates an invariant.
    InvalidDescriptor { need: String, reason: String },
    /// Fulfillment requested but the resource is missing or the need is full.
    PreconditionFailed { need: String, reason: String },
    /// Autonomy found nothing to walk to.
    NoTarget { need: String },
    /// Fulfillment method not declared for the need.
    InvalidMethod { need: String, method: String },
}

impl PetError {
    pub fn missing(what: impl Into<String>) -> Self {
        PetError::ConfigurationMissing { what: what.into() }
    }

    /// Classify a structured fulfillment failure.
    pub fn from_fulfill_failure(
        failure: FulfillFailure,
        need: &str,
        method: &str,
        message: &str,
    ) -> Self {
        match failure {
            FulfillFailure::UnknownNeed => PetError::missing(format!("need '{}'", need)),
            FulfillFailure::UnknownMethod => PetError::InvalidMethod {
                need: need.to_string(),
                method: method.to_string(),
            },
            FulfillFailure::ResourceUnavailable | FulfillFailure::AlreadyFull => {
                PetError::PreconditionFailed {
                    need: need.to_string(),
                    reason: message.to_string(),
                }
            }
        }
    }
}

impl From<serde_json::Error> for PetError {
    fn from(e: serde_json::Error) -> Self {
        PetError::Config(e)
    }
}

impl std::fmt::Display for PetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PetError::ConfigurationMissing { what } => write!(f, "Not registered: {}", what),
            PetError::Config(e) => write!(f, "Configuration error: {}", e),
            PetError::InvalidDescriptor { need, reason } => {
                write!(f, "Invalid descriptor for '{}': {}", need, reason)
            }
            PetError::PreconditionFailed { need, reason } => {
                write!(f, "Cannot fulfill '{}': {}", need, reason)
            }
            PetError::NoTarget { need } => write!(f, "No target available for '{}'", need),
            PetError::InvalidMethod { need, method } => {
                write!(f, "Unknown method '{}' for '{}'", method, need)
            }
        }
    }
}

impl std::error::Error for PetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PetError::Config(e) => Some(e),
            _ => None,
        }
    }
}
