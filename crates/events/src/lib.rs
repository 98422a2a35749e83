//! Event system for the panel client
//!
//! This crate provides a process-local publish/subscribe registry that lets
//! observers follow a component's lifecycle without the component knowing
//! who is listening.

mod bus;
mod types;

pub use bus::EventBus;
pub use types::*;
