//! How control gets back to the scheduler.
//!
//! A routine hands the scheduler a [`ResumeHint`] in one of two ways:
//!
//! - returning `Ok(hint)` from its top level, or
//! - escaping with `Err(Yield)` from any call depth. Helpers return
//!   `Result<T, Yield>` and `?` carries the escape up to the routine's
//!   entry, where the scheduler catches it.
//!
//! The escape is single-shot. Every frame below the routine's entry is
//! discarded, and the next dispatch of that task starts the routine over
//! from its first statement. Anything a task needs to remember across a
//! yield must live in its task-local storage.

use alloc::boxed::Box;
use core::fmt;

use super::context::Context;
use super::storage::StorageError;
use super::{TaskError, TaskId};

/// Where the scheduler should restart its priority scan.
///
/// Raw 0 means "from the top"; raw `n` means "from table index `n - 1`".
/// A plain return of 0 and an explicit yield to the top are the same
/// request: no preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ResumeHint(u32);

impl ResumeHint {
    /// Rescan from the highest-priority task.
    pub const TOP: ResumeHint = ResumeHint(0);

    pub const fn from_raw(raw: u32) -> Self {
        ResumeHint(raw)
    }

    /// Rescan starting at `task`.
    pub const fn to(task: TaskId) -> Self {
        ResumeHint((task.index() as u32).saturating_add(1))
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Table index the next scan starts from, for a table of `len` tasks.
    /// Targets past the end wrap back to the top.
    pub fn start_index(self, len: usize) -> usize {
        match self.0 {
            0 => 0,
            n => {
                let index = (n - 1) as usize;
                if index < len {
                    index
                } else {
                    0
                }
            }
        }
    }
}

impl fmt::Display for ResumeHint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            0 => write!(f, "top"),
            n => write!(f, "Task#{}", n - 1),
        }
    }
}

/// A non-local exit out of a running routine.
#[must_use = "a Yield does nothing unless it is returned to the scheduler"]
#[derive(Debug)]
pub enum Yield {
    /// Give up the processor and resume the scan per the hint.
    To(ResumeHint),
    /// The routine hit an error it cannot handle. The scheduler stops
    /// the task and rescans from the top.
    Fault(TaskError),
}

impl Yield {
    /// The hint the scheduler resumes with.
    pub fn hint(&self) -> ResumeHint {
        match self {
            Yield::To(hint) => *hint,
            Yield::Fault(_) => ResumeHint::TOP,
        }
    }
}

impl From<TaskError> for Yield {
    fn from(e: TaskError) -> Self {
        Yield::Fault(e)
    }
}

impl From<StorageError> for Yield {
    fn from(e: StorageError) -> Self {
        Yield::Fault(TaskError::Storage(e))
    }
}

/// What a routine produces each time it is dispatched.
pub type TaskResult = Result<ResumeHint, Yield>;

/// A task's entry point.
pub type Routine<'f> = Box<dyn FnMut(&mut Context<'_, 'f>) -> TaskResult + 'f>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hint_encoding() {
        assert_eq!(ResumeHint::TOP.start_index(3), 0);
        assert_eq!(ResumeHint::to(TaskId::new(0)).raw(), 1);
        assert_eq!(ResumeHint::to(TaskId::new(2)).start_index(3), 2);
        assert_eq!(ResumeHint::from_raw(2).start_index(3), 1);
    }

    #[test]
    fn hint_past_end_wraps_to_top() {
        assert_eq!(ResumeHint::from_raw(4).start_index(3), 0);
        assert_eq!(ResumeHint::from_raw(u32::MAX).start_index(3), 0);
    }

    #[test]
    fn fault_resumes_from_top() {
        let y: Yield = StorageError::AllocFailed { size: 8 }.into();
        assert_eq!(y.hint(), ResumeHint::TOP);
        assert!(matches!(y, Yield::Fault(TaskError::Storage(_))));
    }
}
