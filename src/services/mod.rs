pub mod project_watcher;

pub use project_watcher::{ProjectWatcher, WatchedTask};
