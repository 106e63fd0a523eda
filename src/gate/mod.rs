//! Admission gate module.
//!
//! Decides per-request admission using a sliding-window rate limiter per
//! client address, with an optional allow-list override evaluated first.

mod admission;
mod allowlist;

pub use admission::{AdmissionGate, Decision, DenyReason};
pub use allowlist::AllowList;
