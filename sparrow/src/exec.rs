/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this file,
 * you can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Asynchronous query execution. Evaluation is offloaded to a worker thread.
//! Completion is a single value, the result or a typed error plus the
//! caller's opaque state, delivered exactly once: either through a ticket
//! the caller waits on or through a callback invoked on the worker thread.
//! Worker panics are captured and arrive on the error side of the
//! completion, never as an unwinding background thread.

use crate::error::AsyncQueryError;
use crate::evaluator::{execute, QueryForm};
use crate::results::QueryOutcome;
use crate::store::Store;
use crossbeam::channel::{bounded, Receiver};
use log::debug;
use model::algebra::Algebra;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;

pub type Completion<T> = (Result<QueryOutcome, AsyncQueryError>, T);

/// Handle on an in-flight query. `wait` blocks the caller (no timeout) until
/// the worker has finished or faulted.
pub struct QueryTicket<T> {
    receiver: Receiver<Completion<T>>,
}

impl<T> QueryTicket<T> {
    pub fn wait(self) -> Completion<T> {
        self.receiver
            .recv()
            .expect("query worker dropped without completing")
    }
}

fn run_query(store: &Store, algebra: &Algebra, form: &QueryForm) -> Result<QueryOutcome, AsyncQueryError> {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let dataset = store.read();
        execute(algebra, form, &dataset)
    }));
    match outcome {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(err)) => Err(AsyncQueryError::new(err.to_string())),
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "query worker panicked".to_string());
            Err(AsyncQueryError::new(message))
        }
    }
}

/// Evaluate on a worker thread; the ticket resolves exactly once with the
/// outcome and the caller's state.
pub fn spawn_query<T: Send + 'static>(
    store: Store,
    algebra: Algebra,
    form: QueryForm,
    state: T,
) -> QueryTicket<T> {
    let (sender, receiver) = bounded(1);
    thread::spawn(move || {
        let result = run_query(&store, &algebra, &form);
        debug!("async query completed (ok: {})", result.is_ok());
        // The receiver may already be gone; completion is best-effort then.
        let _ = sender.send((result, state));
    });
    QueryTicket { receiver }
}

/// Callback-completion form: the callback runs exactly once, on the worker
/// thread, with the opaque state passed through unchanged.
pub fn process_query_async<T, F>(store: Store, algebra: Algebra, form: QueryForm, state: T, callback: F)
where
    T: Send + 'static,
    F: FnOnce(Result<QueryOutcome, AsyncQueryError>, T) + Send + 'static,
{
    thread::spawn(move || {
        let result = run_query(&store, &algebra, &form);
        callback(result, state);
    });
}
