//! Actions over the editor model and the ways to submit them.
//!
//! * [`Action`] is the closed set of operations the bus executes against a
//!   [`Session`] (the editor plus a handle back into the bus).
//! * [`Actions`] is the typed client: fire-and-forget mutations and blocking
//!   queries.
//! * [`api::call`] is the string surface used by command bars and scripts.
//! * [`Workspace`] wires the executor thread, the auto-scroll ticker and the
//!   client together.

mod action;
pub mod api;
mod client;
mod dispatcher;
mod host;
pub mod logging;
mod session;
mod workspace;

pub use action::{Action, EdAction, ViewAction, ViewQuery};
pub use api::{ApiError, call};
pub use client::Actions;
pub use host::BusCmdHost;
pub use session::Session;
pub use workspace::Workspace;
