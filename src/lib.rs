pub mod config;
pub mod error;
pub mod flash;
pub mod logging;
pub mod runtime_paths;
pub mod server;
pub mod todo;
pub mod views;
