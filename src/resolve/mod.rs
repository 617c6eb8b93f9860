//! Resolution seam and retreat handling.
//!
//! The movement resolver itself is external; this module defines the
//! gateway trait it is consumed through, a scripted stand-in for tests and
//! demos, and the in-crate retreat resolver.

pub mod gateway;
pub mod retreat;
pub mod scripted;

pub use gateway::{GatewayError, ResolutionGateway, UnitOutcome};
pub use retreat::{
    resolve_retreats, retreat_choices, RetreatChoice, RetreatOutcome, DISBANDED_REGION,
};
pub use scripted::ScriptedGateway;
