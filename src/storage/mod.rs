//! Storage abstractions for the seen-set.
//!
//! The seen-set is a single JSON array of announcement ids:
//!
//! ```text
//! storage/
//! ├── config.toml           # Optional configuration
//! └── sent_notices.json     # Ids already delivered, e.g. ["147220","147221"]
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::SeenSet;

// Re-export for convenience
pub use local::LocalSeenStore;

/// Trait for seen-set storage backends.
#[async_trait]
pub trait SeenStore: Send + Sync {
    /// Load the seen-set.
    ///
    /// Never fails: a missing, unreadable or corrupt record yields an empty set.
    async fn load(&self) -> SeenSet;

    /// Replace the stored seen-set with `seen`.
    async fn save(&self, seen: &SeenSet) -> Result<()>;

    /// Human-readable location of the record, for logging.
    fn location(&self) -> String;
}
