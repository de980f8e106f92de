//! Lightweight runners for callback-style tasks.
//!
//! Two independent combinators coordinate a fixed set of tasks: `parallel`
//! starts every task at once and hands a final callback the concatenation of
//! everything the tasks produced, in submission order; `series` runs tasks
//! one after another, threading each task's output values into the next.
//!
//! Tasks are plain `FnOnce` values. A task receives a single-use
//! continuation handle and reports by consuming it, either synchronously
//! before the runner returns or later from another thread or turn of an
//! async runtime. The runners never block and never spawn; where a task's
//! work actually executes is entirely up to the task.

mod parallel;
mod series;

// Re-export main types for easier access
pub use parallel::{parallel, Cancel, Completion, Task};
pub use series::{series, Next, SeriesFn};
