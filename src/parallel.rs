// src/parallel.rs
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

type RunFn<T> = Box<dyn FnOnce(Completion<T>) + Send>;
type TaskCallback<T> = Box<dyn FnOnce(&Cancel, &[T]) + Send>;
type FinishFn<T> = Box<dyn FnOnce(Vec<T>) + Send>;

/// A unit of work for `parallel`: a start function plus an optional
/// completion callback.
pub struct Task<T> {
    run: RunFn<T>,
    on_complete: Option<TaskCallback<T>>,
}

impl<T> Task<T> {
    /// Create a plain task from its start function.
    ///
    /// The function is invoked with the task's `Completion` handle when the
    /// run starts; the task signals that it is done by consuming the handle.
    pub fn new(run: impl FnOnce(Completion<T>) + Send + 'static) -> Self {
        Self {
            run: Box::new(run),
            on_complete: None,
        }
    }

    /// Create a task with an individual completion callback.
    ///
    /// The callback runs right after this task completes (unless callback
    /// delivery has been cancelled), receiving the cancellation handle and
    /// the values the task produced. Calling `Cancel::cancel` from inside it
    /// disables every callback the run has not yet delivered.
    pub fn with_callback(
        run: impl FnOnce(Completion<T>) + Send + 'static,
        on_complete: impl FnOnce(&Cancel, &[T]) + Send + 'static,
    ) -> Self {
        Self {
            run: Box::new(run),
            on_complete: Some(Box::new(on_complete)),
        }
    }
}

/// Handle that disables callback delivery for one `parallel` run.
///
/// Cancellation is one-way and permanent: once engaged, no per-task callback
/// and no final callback fire again for that run. It does not stop tasks that
/// are already running, and their results are still recorded.
#[derive(Clone)]
pub struct Cancel {
    enabled: Arc<AtomicBool>,
}

impl Cancel {
    /// Permanently disable all future callback delivery for this run.
    pub fn cancel(&self) {
        if self.enabled.swap(false, Ordering::SeqCst) {
            debug!("Callback delivery cancelled");
        }
    }

    /// Whether cancellation has been engaged.
    pub fn is_cancelled(&self) -> bool {
        !self.enabled.load(Ordering::SeqCst)
    }
}

// State for one parallel run, shared by every completion handle it issued.
// The slot write and counter increment happen under one lock so that
// completions delivered from different threads cannot race each other.
struct RunState<T> {
    total: usize,
    inner: Mutex<RunInner<T>>,
}

struct RunInner<T> {
    // Indexed by task submission order; None until the task completes,
    // Some(empty) when it completed with no values.
    slots: Vec<Option<Vec<T>>>,
    completed: usize,
    finish: Option<FinishFn<T>>,
}

/// Single-use handle a task consumes to report its completion.
///
/// The handle may be fired from any thread, before or after `parallel`
/// itself returns. Completing consumes the handle, so a task cannot report
/// twice; dropping it unfired leaves the run permanently incomplete.
pub struct Completion<T> {
    state: Option<Arc<RunState<T>>>,
    index: usize,
    on_complete: Option<TaskCallback<T>>,
    cancel: Cancel,
}

impl<T: Clone> Completion<T> {
    /// Record this task's output values and deliver any callbacks that are
    /// now due.
    ///
    /// An empty `values` means the task produced nothing; it contributes no
    /// placeholder to the final result.
    pub fn complete(mut self, values: Vec<T>) {
        let state = match self.state.take() {
            Some(state) => state,
            None => return,
        };

        let (observed, is_last) = {
            let mut inner = state.inner.lock();
            inner.slots[self.index] = Some(values);
            inner.completed += 1;
            // Clone for the per-task callback while the slot keeps the
            // canonical copy; skipped when delivery is already cancelled.
            let observed = if self.on_complete.is_some() && !self.cancel.is_cancelled() {
                inner.slots[self.index].clone()
            } else {
                None
            };
            (observed, inner.completed == state.total)
        };

        debug!("Task {} completed", self.index);

        if let (Some(on_complete), Some(values)) = (self.on_complete.take(), observed) {
            // Cancellation may land between recording and delivery; re-check
            // before firing.
            if !self.cancel.is_cancelled() {
                on_complete(&self.cancel, &values);
            }
        }

        if is_last && !self.cancel.is_cancelled() {
            let (finish, slots) = {
                let mut inner = state.inner.lock();
                (inner.finish.take(), mem::take(&mut inner.slots))
            };
            if let Some(finish) = finish {
                let mut all = Vec::new();
                for slot in slots {
                    if let Some(values) = slot {
                        all.extend(values);
                    }
                }
                debug!("All {} tasks completed, delivering {} values", state.total, all.len());
                finish(all);
            }
        }
    }
}

impl<T> Drop for Completion<T> {
    fn drop(&mut self) {
        if self.state.is_some() {
            warn!(
                "Completion handle for task {} dropped without completing; the final callback will never fire",
                self.index
            );
        }
    }
}

/// Run every task at once and collect what they produce.
///
/// All tasks are started synchronously, in order, during this call. Each
/// receives a `Completion` handle and completes by consuming it, from any
/// thread, now or later. Once every task has completed, `callback` receives
/// the concatenation of all completion values in task-submission order,
/// regardless of the order the tasks actually finished in. A task that
/// completed with no values contributes nothing to the result.
///
/// An empty task list invokes `callback` immediately with no values. If any
/// per-task callback cancels the run (see `Task::with_callback`), `callback`
/// never fires; tasks keep running regardless, since cancellation only stops
/// callback delivery. Panics from tasks or callbacks are not caught and
/// surface in whichever context invoked them. Pass a no-op closure when the
/// aggregate result is not needed.
///
/// # Examples
///
/// ```
/// use tandem::{parallel, Task};
/// use std::sync::mpsc;
///
/// let (tx, rx) = mpsc::channel();
/// parallel(
///     vec![
///         Task::new(|done| done.complete(vec![1, 2])),
///         Task::new(|done| done.complete(vec![3])),
///     ],
///     move |values| tx.send(values).unwrap(),
/// );
/// assert_eq!(rx.recv().unwrap(), vec![1, 2, 3]);
/// ```
pub fn parallel<T, F>(tasks: Vec<Task<T>>, callback: F)
where
    T: Clone + 'static,
    F: FnOnce(Vec<T>) + Send + 'static,
{
    let total = tasks.len();
    if total == 0 {
        debug!("No tasks to run, delivering empty result");
        callback(Vec::new());
        return;
    }

    debug!("Starting {} tasks", total);

    let enabled = Arc::new(AtomicBool::new(true));
    let state = Arc::new(RunState {
        total,
        inner: Mutex::new(RunInner {
            slots: vec![None; total],
            completed: 0,
            finish: Some(Box::new(callback)),
        }),
    });

    for (index, task) in tasks.into_iter().enumerate() {
        let completion = Completion {
            state: Some(Arc::clone(&state)),
            index,
            on_complete: task.on_complete,
            cancel: Cancel {
                enabled: Arc::clone(&enabled),
            },
        };
        (task.run)(completion);
    }
}
