// Infrastructure module - External dependencies and adapters
pub mod config;
pub mod console;
pub mod device;
pub mod lock;
pub mod logging;
pub mod shutdown;
