//! Rotating token module.
//!
//! Issues and verifies short-lived, time-bucketed HMAC tokens derived from
//! a shared secret, with no server-side session state.

mod authority;

pub use authority::TokenAuthority;
