//! Persistence
//!
//! - [`kv`]: the per-profile key-value store shared with companion processes
//! - [`registry`]: the active workout and per-exercise results
//! - [`log`]: append-only set history with records, streaks and export
//! - [`templates`]: saved and shareable workout templates

pub mod keys;
pub mod kv;
pub mod log;
pub mod registry;
pub mod templates;

use std::path::Path;

pub use kv::{FileStore, KeyValueStore, MemoryStore, SharedStore};
pub use log::{LogStore, LoggedSet, WidgetSummary};
pub use registry::ExerciseRegistry;
pub use templates::{TemplateStore, WorkoutTemplate};

/// Opens both on-disk stores inside `data_dir`.
#[must_use]
pub fn open_data_dir(data_dir: &Path) -> (SharedStore, LogStore) {
    let kv = SharedStore::new(FileStore::open(data_dir.join(FileStore::FILE_NAME)));
    let log = LogStore::open(data_dir.join(LogStore::FILE_NAME));
    (kv, log)
}
