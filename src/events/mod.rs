//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted while executing tasks.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Engine` (per execution), `core::runner` (per attempt),
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the engine's subscriber listener (fans out to `SubscriberSet`)
//!   and any receiver obtained from `Engine::subscribe()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
