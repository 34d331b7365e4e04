pub mod settings;

pub use settings::{AsanaSettings, Settings, WatcherSettings};
