//! Background producers that feed actions into the bus on their own
//! schedule (timers today; watchers or plugin hosts can register the same
//! way). Each source owns one tokio task and stops on its own once the bus
//! refuses submissions.

use std::time::Duration;

use tokio::task::JoinHandle;

use crate::BusHandle;

/// Implemented by any async action producer. The source spawns one task on
/// the ambient tokio runtime which submits through `bus` until dispatch
/// fails (executor gone) or its own stop condition hits.
pub trait AsyncEventSource<A: Send + 'static>: Send + 'static {
    /// Stable identifier used for logging.
    fn name(&self) -> &'static str;
    fn spawn(self: Box<Self>, bus: BusHandle<A>) -> JoinHandle<()>;
}

/// Submits the action built by `make` every `interval`.
pub struct TickEventSource<A> {
    name: &'static str,
    interval: Duration,
    make: Box<dyn Fn() -> A + Send + 'static>,
}

impl<A> TickEventSource<A> {
    pub fn new(
        name: &'static str,
        interval: Duration,
        make: impl Fn() -> A + Send + 'static,
    ) -> Self {
        Self {
            name,
            interval,
            make: Box::new(make),
        }
    }
}

impl<A: Send + 'static> AsyncEventSource<A> for TickEventSource<A> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn spawn(self: Box<Self>, bus: BusHandle<A>) -> JoinHandle<()> {
        let TickEventSource {
            name,
            interval,
            make,
        } = *self;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !bus.dispatch(make()) {
                    tracing::debug!(target: "runtime.events", source = name, "source_stopped");
                    break;
                }
            }
        })
    }
}

/// Sources waiting to be started.
pub struct EventSourceRegistry<A> {
    sources: Vec<Box<dyn AsyncEventSource<A>>>,
}

impl<A: Send + 'static> Default for EventSourceRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Send + 'static> EventSourceRegistry<A> {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    pub fn register<S: AsyncEventSource<A>>(&mut self, src: S) {
        self.sources.push(Box::new(src));
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Spawn all registered sources on the current runtime. Each gets its own
    /// handle clone; the registry is empty afterwards so a second call spawns
    /// nothing.
    pub fn spawn_all(&mut self, bus: &BusHandle<A>) -> Vec<JoinHandle<()>> {
        let mut out = Vec::with_capacity(self.sources.len());
        for src in self.sources.drain(..) {
            let name = src.name();
            tracing::info!(target: "runtime.events", source = name, "spawning event source");
            out.push(src.spawn(bus.clone()));
        }
        out
    }
}
