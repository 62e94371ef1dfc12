//! HTTP-backed chat-completion adapters.
//!
//! One thin adapter per vendor, each responsible for its own wire format
//! and role mapping. Shape variance inside a vendor's response never leaks
//! past the adapter boundary — every adapter returns a [`ProviderReply`].

pub mod adapters;
pub mod config;

pub use adapters::{generate, ProviderReply};
pub use config::ProviderConfig;
