//! Configuration management module
//!
//! This module handles loading and saving configuration. Configuration is
//! stored in %APPDATA%\instutils\config.json with atomic writes to prevent
//! corruption.

pub mod manager;
pub mod models;

pub use manager::ConfigManager;
pub use models::UtilsConfig;
