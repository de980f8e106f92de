use std::collections::VecDeque;

use tracing::debug;

/// A unit of work for `series`: receives the previous task's output values
/// and the continuation for the rest of the chain.
pub type SeriesFn<T> = Box<dyn FnOnce(Vec<T>, Next<T>) + Send>;

/// Single-use continuation that advances a series to its next task.
///
/// The handle owns the tasks that have not run yet, so exactly one task at a
/// time can advance the chain, from any thread, now or later. Advancing
/// consumes the handle; dropping it unfired ends the series and drops the
/// remaining tasks unrun.
pub struct Next<T> {
    queue: VecDeque<SeriesFn<T>>,
}

impl<T> Next<T> {
    /// Feed `values` to the next task in line and run it.
    ///
    /// Does nothing when no tasks remain, so the last task may call its
    /// continuation or not, as it pleases.
    pub fn advance(mut self, values: Vec<T>) {
        match self.queue.pop_front() {
            Some(task) => {
                debug!("Running next task ({} queued behind it)", self.queue.len());
                task(values, self);
            }
            None => debug!("Series complete, no tasks remaining"),
        }
    }

    /// Number of tasks still waiting to run after the current one.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

/// Run tasks one at a time, feeding each task's output to the next.
///
/// The first task receives no values. Every task after it receives exactly
/// the values the previous task passed to its continuation, plus a `Next`
/// handle for the rest of the chain; the following task runs only once that
/// handle is advanced. There is no terminal callback: the series simply ends
/// with whatever the last task does. A task that drops its handle without
/// advancing stalls the chain permanently (there is no timeout) and the
/// tasks behind it never run. Panics from tasks are not caught.
///
/// An empty task list performs no invocation and returns immediately.
///
/// # Examples
///
/// ```
/// use tandem::{series, SeriesFn};
/// use std::sync::mpsc;
///
/// let (tx, rx) = mpsc::channel();
/// let tasks: Vec<SeriesFn<String>> = vec![
///     Box::new(|_, next| next.advance(vec!["a".to_string()])),
///     Box::new(|values, next| next.advance(vec![format!("{}b", values[0])])),
///     Box::new(move |values, _| tx.send(values).unwrap()),
/// ];
/// series(tasks);
/// assert_eq!(rx.recv().unwrap(), vec!["ab".to_string()]);
/// ```
pub fn series<T>(tasks: Vec<SeriesFn<T>>) {
    if tasks.is_empty() {
        debug!("No tasks to run");
        return;
    }

    debug!("Running {} tasks in series", tasks.len());
    Next {
        queue: tasks.into(),
    }
    .advance(Vec::new());
}
