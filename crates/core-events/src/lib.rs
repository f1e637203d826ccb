//! The action bus and the background sources feeding it.
//!
//! Every state change goes through one [`Executor`] that runs submitted
//! actions strictly in arrival order, one at a time. Producers hold cheap
//! [`BusHandle`] clones: submitting never blocks, queries block only on their
//! own reply channel, and [`BusHandle::flush`] is a barrier that returns once
//! everything submitted before it has run.

pub mod bus;
pub mod sources;

pub use bus::{ActionBus, BusContext, BusHandle, Executor, Reply, Runnable, reply_channel};
pub use sources::{AsyncEventSource, EventSourceRegistry, TickEventSource};
