//! lwsched
//!
//! A cooperative, priority-ordered task scheduler for small controllers:
//! - A fixed task table whose declaration order is the priority order
//! - Yield, directed yield, flag waits and tick sleeps
//! - Lazily allocated task-local storage
//!
//! There is no preemption and no stack switching. A task routine runs
//! until it returns or escapes through a [`Yield`], and is entered
//! again from its first statement the next time it is dispatched.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod console;
pub mod switch;
pub mod task;

pub use task::context::Context;
pub use task::flag::WaitFlag;
pub use task::resume::{ResumeHint, Routine, TaskResult, Yield};
pub use task::scheduler::{Dispatch, Scheduler};
pub use task::tick::Tick;
pub use task::{TaskError, TaskId, TaskState, TaskTable};
