//! Pipeline stages of the relay.
//!
//! - `diff`: Which announcements are new relative to the seen-set
//! - `shutdown`: Signal-driven shutdown flag
//! - `watch`: The polling loop tying fetch, diff, notify and persist together

pub mod diff;
pub mod shutdown;
pub mod watch;

pub use diff::fresh_announcements;
pub use shutdown::{Shutdown, ShutdownTrigger, listen_for_signals};
pub use watch::{CycleReport, Phase, WatchOptions, Watcher};
