pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;
pub mod web;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{Code128Barcodes, SqliteStore};
pub use config::TomlConfig;
pub use core::front_desk::FrontDesk;
pub use utils::error::{CarwashError, Result};
pub use web::{router, start_server, AppState};
