//! Admitd Library
//!
//! This crate provides the core functionality for the admitd admission
//! daemon, which fronts a generic HTTP request handler with a
//! sliding-window rate limiter, an optional source-address allow-list,
//! and rotating HMAC token authentication.

pub mod clock;
pub mod config;
pub mod error;
pub mod gate;
pub mod http;
pub mod token;
