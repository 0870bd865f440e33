//! Diff calculation between a fresh extraction and the seen-set.
//!
//! Only additions matter here: ids that vanish from the listing stay in the
//! seen-set, and title edits on a known id are not re-announced.

use std::collections::HashSet;

use crate::models::{Announcement, SeenSet};

/// Announcements whose ids are not in `seen`, in extraction order.
///
/// An id listed twice on the same page is returned once (first occurrence).
pub fn fresh_announcements<'a>(
    seen: &SeenSet,
    current: &'a [Announcement],
) -> Vec<&'a Announcement> {
    let mut batch: HashSet<&str> = HashSet::new();
    let mut fresh = Vec::new();
    for announcement in current {
        if !seen.contains(&announcement.id) && batch.insert(announcement.id.as_str()) {
            fresh.push(announcement);
        }
    }
    fresh
}
