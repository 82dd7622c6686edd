//! Runtime core: the bounded retry engine.
//!
//! The public API from this module is [`Engine`], its [`EngineBuilder`] and the
//! [`EngineConfig`] both start from.
//!
//! Internal modules:
//! - [`runner`]: executes one attempt with timeout/cancellation and event publishing;
//! - [`engine`]: the attempt loop, budget advancement and terminal errors;
//! - [`builder`]: validation, bus creation and the subscriber listener;
//! - [`config`]: engine settings and their sentinels.

mod builder;
mod config;
mod engine;
mod runner;

pub use builder::EngineBuilder;
pub use config::EngineConfig;
pub use engine::Engine;
