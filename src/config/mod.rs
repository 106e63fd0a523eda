//! Configuration module for the admitd daemon.
//!
//! Handles loading and validating daemon configuration from TOML files.

mod settings;

pub use settings::*;
