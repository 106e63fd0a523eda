//! Error types for the admitd daemon.
//!
//! Provides a unified error handling system using thiserror.

mod types;

pub use types::*;
