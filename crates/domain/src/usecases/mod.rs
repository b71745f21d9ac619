//! Application use cases / change detection logic

pub mod change_detector;
pub mod fail_open;
pub mod import_scanner;
pub mod watch_loop;
pub mod watcher;

pub use change_detector::{Observation, PendingFingerprint, ResourceChangeDetector};
pub use fail_open::{ScanError, fail_open};
pub use import_scanner::{ScanState, is_changed};
pub use watch_loop::{GroupCheck, WatchLoop, WatchLoopConfig, WatchLoopError};
pub use watcher::{DetectedChange, ResourceWatcher, WatchError};
