use std::sync::Arc;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::{
    budget::TimeUnit,
    core::{config::EngineConfig, engine::Engine},
    error::ConfigError,
    events::Bus,
    substrate::{BlockingPool, Substrate},
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for an [`Engine`].
///
/// Starts from an [`EngineConfig`] (see [`Engine::builder`] and [`Engine::builder_with`]);
/// every option overrides one field. Nothing is validated until [`build`](Self::build).
pub struct EngineBuilder<S = BlockingPool> {
    cfg: EngineConfig,
    substrate: Arc<S>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl EngineBuilder<BlockingPool> {
    /// Creates a builder around the default [`BlockingPool`] sized by `cfg.max_concurrent`.
    pub fn new(cfg: EngineConfig) -> Self {
        let substrate = Arc::new(default_pool(&cfg));
        Self {
            cfg,
            substrate,
            subscribers: Vec::new(),
        }
    }

    /// Limits the default pool to `n` concurrent attempts (`0` = unbounded).
    pub fn max_concurrent(mut self, n: usize) -> Self {
        self.cfg.max_concurrent = n;
        self.substrate = Arc::new(default_pool(&self.cfg));
        self
    }
}

impl<S: Substrate> EngineBuilder<S> {
    /// Total number of attempts, the first one included.
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.cfg.max_attempts = n;
        self
    }

    /// Number of retries after the first attempt, i.e. `n + 1` attempts.
    pub fn retries(mut self, n: u32) -> Self {
        self.cfg.max_attempts = n.saturating_add(1);
        self
    }

    /// Budget of the first attempt.
    pub fn wait(mut self, magnitude: f64, unit: TimeUnit) -> Self {
        self.cfg.wait = magnitude;
        self.cfg.unit = unit;
        self
    }

    /// Multiplier applied to the budget after each timed-out attempt.
    pub fn backoff_factor(mut self, factor: f64) -> Self {
        self.cfg.backoff_factor = factor;
        self
    }

    /// Event bus capacity.
    pub fn bus_capacity(mut self, capacity: usize) -> Self {
        self.cfg.bus_capacity = capacity;
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (attempts, timeouts, backoff) through
    /// dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Replaces the execution substrate.
    ///
    /// `max_concurrent` no longer applies; the substrate manages its own capacity.
    pub fn with_substrate<S2: Substrate>(self, substrate: Arc<S2>) -> EngineBuilder<S2> {
        EngineBuilder {
            cfg: self.cfg,
            substrate,
            subscribers: self.subscribers,
        }
    }

    /// Validates the configuration and builds the engine.
    ///
    /// With subscribers registered this spawns their workers and a listener task, so it
    /// must then be called from within a Tokio runtime. The listener stops once the engine
    /// and all of its clones are dropped.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] for zero attempts, a negative or non-finite wait,
    /// or a backoff factor below 1.
    pub fn build(self) -> Result<Engine<S>, ConfigError> {
        self.cfg.validate()?;
        let budget = self.cfg.budget()?;
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let listener = subscriber_listener(&bus, self.subscribers);

        Ok(Engine::new_internal(
            self.cfg,
            budget,
            self.substrate,
            bus,
            listener,
        ))
    }
}

fn default_pool(cfg: &EngineConfig) -> BlockingPool {
    cfg.concurrency_limit()
        .map_or_else(BlockingPool::unbounded, BlockingPool::bounded)
}

/// Forwards bus events to the subscriber set until the returned guard is dropped.
fn subscriber_listener(bus: &Bus, subscribers: Vec<Arc<dyn Subscribe>>) -> Option<DropGuard> {
    let set = SubscriberSet::new(subscribers, bus.clone());
    if set.is_empty() {
        return None;
    }
    let mut rx = bus.subscribe();
    let token = CancellationToken::new();
    let stop = token.clone();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                res = rx.recv() => match res {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                },
            }
        }
        // flush what was published before the engine went away
        loop {
            match rx.try_recv() {
                Ok(ev) => set.emit(&ev),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        set.shutdown().await;
    });
    Some(token.drop_guard())
}
