//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`] fan-out
//! for handling events broadcast through the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   execute() ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit(&Event)
//!                                                              │
//!                                                    ┌─────────┼─────────┐
//!                                                    ▼         ▼         ▼
//!                                                LogWriter  Metrics   Custom
//! ```
//!
//! Enable the `logging` feature to get the built-in [`LogWriter`].

#[cfg(feature = "logging")]
mod log;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
pub(crate) use subscriber_set::panic_message;
