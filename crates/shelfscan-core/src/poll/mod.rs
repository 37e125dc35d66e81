//! Status polling module.
//!
//! Converts one `(task, image)` submission into an evolving status
//! observable with bounded retry-on-404, manual refresh, and race-free
//! cancellation.

mod config;
mod poller;

pub use config::{DEFAULT_INTERVAL, DEFAULT_MAX_NOT_FOUND, PollConfig};
pub use poller::{PollPhase, PollState, StatusPoller};
