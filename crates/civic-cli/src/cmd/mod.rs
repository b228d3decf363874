pub mod groups;
pub mod list;
pub mod status;
pub mod timeline;

use anyhow::Context as _;
use civic_core::views::{SnapshotFile, load_snapshot};
use std::path::Path;

/// Read the snapshot a command works on. Each invocation reads one file
/// once, on the main thread, so there is no concurrent reader to share the
/// load with.
pub fn read_snapshot(path: &Path) -> anyhow::Result<SnapshotFile> {
    load_snapshot(path).with_context(|| format!("Failed to load {}", path.display()))
}
