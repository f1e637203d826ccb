use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle, ThreadId};

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use tracing::{debug, error, info, trace, warn};

/// A unit of work executed by the bus against context `C`.
pub trait Runnable<C>: Send + 'static {
    /// Stable name used in logs and error reports.
    fn name(&self) -> &'static str;
    fn run(self, ctx: &mut C) -> anyhow::Result<()>;
}

/// Context side of the bus: where failed runs are reported.
pub trait BusContext {
    fn report_error(&mut self, action: &'static str, err: &anyhow::Error);
}

/// Private one-shot reply path of a query.
pub type Reply<T> = Sender<T>;

pub fn reply_channel<T>() -> (Reply<T>, Receiver<T>) {
    bounded(1)
}

enum Envelope<A> {
    Action(A),
    Flush(Sender<()>),
    Shutdown,
}

/// Constructor for a connected handle / executor pair.
pub struct ActionBus;

impl ActionBus {
    #[allow(clippy::new_ret_no_self)]
    pub fn new<A: Send + 'static>() -> (BusHandle<A>, Executor<A>) {
        let (tx, rx) = unbounded();
        let executor_thread = Arc::new(OnceLock::new());
        (
            BusHandle {
                tx,
                executor_thread: Arc::clone(&executor_thread),
            },
            Executor { rx, executor_thread },
        )
    }
}

/// Submission side. Clone freely; every clone feeds the same FIFO.
pub struct BusHandle<A> {
    tx: Sender<Envelope<A>>,
    executor_thread: Arc<OnceLock<ThreadId>>,
}

impl<A> Clone for BusHandle<A> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            executor_thread: Arc::clone(&self.executor_thread),
        }
    }
}

impl<A> std::fmt::Debug for BusHandle<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusHandle")
            .field("queued", &self.tx.len())
            .finish()
    }
}

impl<A: Send + 'static> BusHandle<A> {
    /// Enqueue `action`. Never blocks; false once the executor is gone.
    pub fn dispatch(&self, action: A) -> bool {
        if self.tx.send(Envelope::Action(action)).is_err() {
            trace!(target: "bus", "dispatch_after_shutdown");
            return false;
        }
        true
    }

    fn on_executor(&self) -> bool {
        self.executor_thread.get() == Some(&thread::current().id())
    }

    /// Enqueue the action built by `make` and wait for its answer. `None`
    /// when the executor is gone or dropped the reply without answering.
    pub fn query<T>(&self, make: impl FnOnce(Reply<T>) -> A) -> Option<T> {
        if self.on_executor() {
            error!(target: "bus", "query_from_executor_refused");
            return None;
        }
        let (tx, rx) = reply_channel();
        if !self.dispatch(make(tx)) {
            return None;
        }
        rx.recv().ok()
    }

    /// Block until every action submitted before this call has run.
    pub fn flush(&self) -> bool {
        if self.on_executor() {
            error!(target: "bus", "flush_from_executor_refused");
            return false;
        }
        let (tx, rx) = bounded(1);
        if self.tx.send(Envelope::Flush(tx)).is_err() {
            return false;
        }
        rx.recv().is_ok()
    }

    /// Ask the executor to stop after the actions already queued.
    pub fn shutdown(&self) {
        let _ = self.tx.send(Envelope::Shutdown);
    }

    /// Actions waiting to run.
    pub fn pending(&self) -> usize {
        self.tx.len()
    }
}

/// Consuming side: runs actions one at a time.
pub struct Executor<A> {
    rx: Receiver<Envelope<A>>,
    executor_thread: Arc<OnceLock<ThreadId>>,
}

impl<A: Send + 'static> Executor<A> {
    /// Run until shutdown or until every handle is dropped.
    pub fn run<C>(self, ctx: &mut C)
    where
        A: Runnable<C>,
        C: BusContext,
    {
        let _ = self.executor_thread.set(thread::current().id());
        info!(target: "bus", "executor_started");
        let mut ran = 0u64;
        while let Ok(envelope) = self.rx.recv() {
            match envelope {
                Envelope::Action(action) => {
                    run_one(action, ctx);
                    ran += 1;
                }
                Envelope::Flush(done) => {
                    let _ = done.send(());
                }
                Envelope::Shutdown => break,
            }
        }
        // queued reply paths must disconnect so blocked callers see `None`
        let dropped = self.rx.try_iter().count();
        info!(target: "bus", ran, dropped, "executor_stopped");
    }

    /// Run on a dedicated thread, handing the context back when it stops.
    pub fn spawn<C>(self, mut ctx: C) -> std::io::Result<JoinHandle<C>>
    where
        A: Runnable<C>,
        C: BusContext + Send + 'static,
    {
        thread::Builder::new().name("action-bus".into()).spawn(move || {
            self.run(&mut ctx);
            ctx
        })
    }
}

fn run_one<A, C>(action: A, ctx: &mut C)
where
    A: Runnable<C>,
    C: BusContext,
{
    let name = action.name();
    match catch_unwind(AssertUnwindSafe(|| action.run(ctx))) {
        Ok(Ok(())) => trace!(target: "bus", action = name, "ran"),
        Ok(Err(e)) => {
            debug!(target: "bus", action = name, error = %e, "action_failed");
            ctx.report_error(name, &e);
        }
        Err(panic) => {
            let msg = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            warn!(target: "bus", action = name, %msg, "action_panicked");
            ctx.report_error(name, &anyhow::anyhow!("{name} panicked: {msg}"));
        }
    }
}
