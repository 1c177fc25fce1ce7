//! Bounded-concurrency command dispatcher.
//!
//! The dispatcher admits at most `admission_limit` commands at a time.
//! `dispatch` suspends only while reserving a slot; the command itself then
//! runs under `tokio::spawn` and logs its own outcome. Shutdown is a
//! cooperative drain: no new admissions, in-flight units run to completion.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::BoxFuture;
use pickup_point_core::environment::{Clock, SystemClock};
use pickup_point_core::error::OrderError;
use pickup_point_core::event::{CommandEvent, EventSink};
use thiserror::Error;
use tokio::sync::Notify;

use crate::metrics::DispatcherMetrics;

/// Errors from dispatch admission.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The dispatcher is draining and admits no further commands.
    #[error("Dispatcher is shutting down")]
    ShuttingDown,
}

/// A unit of work the dispatcher can run.
///
/// Implementations bind a command name and argument list to an engine
/// operation; see [`crate::commands::OrderCommands`].
pub trait CommandHandler: Send + Sync + 'static {
    /// Execute one command. The returned string is the human-readable
    /// outcome logged on success.
    fn handle(
        &self,
        command: String,
        args: Vec<String>,
    ) -> BoxFuture<'static, Result<String, OrderError>>;
}

struct AdmissionState {
    limit: usize,
    in_flight: usize,
    draining: bool,
}

struct Inner<H, S, C> {
    handler: H,
    sink: S,
    clock: C,
    state: Mutex<AdmissionState>,
    slot_freed: Notify,
    idle: Notify,
    next_unit: AtomicU64,
}

/// Dispatches commands to a [`CommandHandler`] under an admission limit.
pub struct CommandDispatcher<H, S, C = SystemClock> {
    inner: Arc<Inner<H, S, C>>,
}

impl<H, S, C> Clone for CommandDispatcher<H, S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H, S> CommandDispatcher<H, S>
where
    H: CommandHandler,
    S: EventSink + Send + Sync + 'static,
{
    /// Create a dispatcher with the given admission limit, using wall-clock
    /// time for command events.
    #[must_use]
    pub fn new(handler: H, sink: S, limit: usize) -> Self {
        Self::with_clock(handler, sink, limit, SystemClock)
    }
}

impl<H, S, C> CommandDispatcher<H, S, C>
where
    H: CommandHandler,
    S: EventSink + Send + Sync + 'static,
    C: Clock + 'static,
{
    /// Create a dispatcher with an explicit clock.
    #[must_use]
    pub fn with_clock(handler: H, sink: S, limit: usize, clock: C) -> Self {
        let limit = limit.max(1);
        Self {
            inner: Arc::new(Inner {
                handler,
                sink,
                clock,
                state: Mutex::new(AdmissionState {
                    limit,
                    in_flight: 0,
                    draining: false,
                }),
                slot_freed: Notify::new(),
                idle: Notify::new(),
                next_unit: AtomicU64::new(0),
            }),
        }
    }

    /// The current admission limit.
    #[must_use]
    pub fn admission_limit(&self) -> usize {
        self.lock_state().limit
    }

    /// Number of units currently running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.lock_state().in_flight
    }

    /// Change the admission limit. Applies to subsequent reservations only;
    /// units already running are unaffected. A raised limit wakes waiting
    /// dispatchers.
    pub fn set_admission_limit(&self, limit: usize) {
        let limit = limit.max(1);
        {
            let mut state = self.lock_state();
            state.limit = limit;
        }
        self.inner.slot_freed.notify_waiters();
    }

    /// Admit one command: emit its event, reserve a slot and run it.
    ///
    /// Suspends until a slot is free. The command event is emitted exactly
    /// once per dispatched command, before the outcome is known. The unit
    /// runs detached; its success or failure is logged, never returned.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::ShuttingDown`] when the dispatcher is
    /// draining.
    pub async fn dispatch(&self, command: &str, args: Vec<String>) -> Result<(), DispatchError> {
        let now = self.inner.clock.now();
        self.inner
            .sink
            .publish(&CommandEvent::new(command, &args, now));

        loop {
            // Register for wakeups before inspecting the state, so a
            // release or limit raise between the check and the await is
            // never lost.
            let notified = self.inner.slot_freed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let mut state = self.lock_state();
                if state.draining {
                    return Err(DispatchError::ShuttingDown);
                }
                if state.in_flight < state.limit {
                    state.in_flight += 1;
                    DispatcherMetrics::record_dispatch(state.in_flight);
                    break;
                }
            }
            notified.await;
        }

        let unit = self.inner.next_unit.fetch_add(1, Ordering::Relaxed);
        let inner = Arc::clone(&self.inner);
        let command = command.to_string();
        tokio::spawn(async move {
            tracing::info!(unit, command = %command, "Command unit started");
            match inner.handler.handle(command.clone(), args).await {
                Ok(outcome) => {
                    tracing::info!(unit, command = %command, %outcome, "Command unit finished");
                }
                Err(error) => {
                    DispatcherMetrics::record_failure();
                    tracing::warn!(unit, command = %command, %error, "Command unit failed");
                }
            }

            let idle = {
                let mut state = lock(&inner.state);
                state.in_flight -= 1;
                DispatcherMetrics::record_in_flight(state.in_flight);
                state.in_flight == 0
            };
            inner.slot_freed.notify_one();
            if idle {
                inner.idle.notify_waiters();
            }
        });

        Ok(())
    }

    /// Stop admitting commands and wait for all in-flight units to finish.
    ///
    /// Units are never cancelled. Safe to call more than once.
    pub async fn shutdown(&self) {
        {
            let mut state = self.lock_state();
            state.draining = true;
        }
        // Wake dispatchers parked on admission so they observe the drain.
        self.inner.slot_freed.notify_waiters();

        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.lock_state().in_flight == 0 {
                return;
            }
            notified.await;
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, AdmissionState> {
        lock(&self.inner.state)
    }
}

fn lock(state: &Mutex<AdmissionState>) -> std::sync::MutexGuard<'_, AdmissionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
