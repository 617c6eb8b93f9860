//! Session orchestration.
//!
//! The `Session` state machine plus its two bookkeeping collaborators: the
//! per-phase submission tracker and the ghost/identity manager.

pub mod game;
pub mod ghost;
pub mod tracker;

pub use game::{Session, SessionError};
pub use ghost::{filter_ghosts, merge_metadata, GhostManager};
pub use tracker::SubmissionTracker;
