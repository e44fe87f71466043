pub mod config;
pub mod logging;
pub mod registration;
pub mod watcher;

pub use config::OperatorConfig;
pub use registration::ensure_registered;
pub use watcher::OperatorWatcher;
