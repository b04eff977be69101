// Library surface for the binary and for headless/integration tests.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod event_bus;
pub mod logging;
pub mod runtime;
pub mod session;
pub mod storage;
pub mod timer;
pub mod types;
pub mod ui;
pub mod words;
