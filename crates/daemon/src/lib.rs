//! Debounced, per-window completion pipeline for an external Python analyzer.
//!
//! The editor asks for completions on the UI context; everything expensive
//! happens elsewhere:
//!
//! - [`Dispatcher`]: coalesces bursts per requesting instance and request
//!   kind, then queues the request on the window's single-capacity worker.
//! - [`DaemonRegistry`]: lazily resolves one [`Daemon`] per window and drops
//!   them all when an environment setting changes.
//! - [`env`]: picks virtualenv, interpreter or the engine default and builds
//!   the search path.
//! - [`facade`]: runs one request against the [`AnalysisEngine`], containing
//!   every engine failure.
//! - [`UiRouter`]: carries answers back to the window's UI context, where
//!   they run against the active view.
//! - [`reconcile`]: decides whether a new completion list redraws the popup.
//!
//! [`CompletionListener`] and [`ParamsAutocomplete`] are the two editor-facing
//! entry points; [`Plugin`] owns the whole pipeline.
//!
//! ```text
//! keystroke -> Dispatcher -> SerialWorker -> DaemonRegistry -> facade -> engine
//!                                                                         |
//!            view <- reconcile <- CompletionListener <- UiRouter <--------+
//! ```

mod commands;
mod daemon;
pub mod dispatch;
pub mod engine;
pub mod env;
mod error;
pub mod facade;
mod listener;
pub mod logging;
mod plugin;
pub mod reconcile;
mod registry;
mod request;
mod types;
mod ui;
mod vars;

pub use commands::ParamsAutocomplete;
pub use daemon::Daemon;
pub use dispatch::{Ask, DebounceKey, Dispatcher};
pub use engine::{AnalysisEngine, EngineError};
pub use error::{DaemonError, Result};
pub use listener::{CompletionListener, QueryResponse};
pub use logging::LogHandle;
pub use plugin::Plugin;
pub use reconcile::{CompletionState, ReconcileAction};
pub use registry::DaemonRegistry;
pub use request::{Answer, Request, RequestContext, RequestKind};
pub use types::{CompletionEntry, InstanceId, ViewId, WindowKey};
pub use ui::{Delivery, UiCommand, UiRouter, View, WindowInbox};
pub use vars::ViewVariables;

#[cfg(test)]
mod test_support;
