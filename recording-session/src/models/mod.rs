pub mod config;
pub mod error;
pub mod settings;
pub mod snapshot;
pub mod state;
