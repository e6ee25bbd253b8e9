//! Priority-scan cooperative scheduler.
//!
//! The scheduler owns the task table and the tick. Each step scans the
//! table from a cursor, wrapping once, and runs the first ready task it
//! finds. Waiting tasks are re-checked as the scan passes over them, so
//! a released flag or an expired deadline is only noticed when the scan
//! reaches that task. Whatever hint the routine hands back becomes the
//! cursor for the next scan: a hint of "top" favours the highest
//! priorities, a hint naming a task starts the search at that task.

use alloc::vec::Vec;

use log::{debug, error, info, trace};

use super::context::Context;
use super::resume::{ResumeHint, Routine, Yield};
use super::tick::Tick;
use super::{Task, TaskError, TaskId};

/// One dispatch: which task ran and what it asked for next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    pub task: TaskId,
    pub hint: ResumeHint,
}

/// The cooperative scheduler.
pub struct Scheduler<'f> {
    tasks: Vec<Task<'f>>,
    routines: Vec<Routine<'f>>,
    /// Where the next scan starts.
    cursor: usize,
    current: Option<TaskId>,
    tick: Tick,
    dispatches: u64,
}

impl<'f> Scheduler<'f> {
    /// Built through [`TaskTable::build`](super::TaskTable::build), which
    /// rejects an empty table.
    pub(crate) fn new(tasks: Vec<Task<'f>>, routines: Vec<Routine<'f>>) -> Self {
        debug_assert_eq!(tasks.len(), routines.len());
        Scheduler {
            tasks,
            routines,
            cursor: 0,
            current: None,
            tick: Tick::ZERO,
            dispatches: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn task(&self, id: TaskId) -> Option<&Task<'f>> {
        self.tasks.get(id.index())
    }

    /// All tasks, highest priority first.
    pub fn tasks(&self) -> impl Iterator<Item = &Task<'f>> {
        self.tasks.iter()
    }

    /// The task dispatched most recently.
    pub fn current(&self) -> Option<TaskId> {
        self.current
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// Advance the tick from outside any task, e.g. from a timer.
    pub fn add_tick(&mut self, n: i32) {
        if n != 0 {
            self.tick = self.tick.wrapping_add(n);
        }
    }

    /// Total number of routine invocations so far.
    pub fn dispatches(&self) -> u64 {
        self.dispatches
    }

    pub fn start(&mut self, id: TaskId) -> Result<(), TaskError> {
        super::start(&mut self.tasks, id)
    }

    pub fn stop(&mut self, id: TaskId) -> Result<(), TaskError> {
        super::stop(&mut self.tasks, id)
    }

    /// Find the first ready task from the cursor, promoting waiting tasks
    /// as they are passed.
    fn scan(&mut self) -> Option<usize> {
        let len = self.tasks.len();
        let now = self.tick;
        for offset in 0..len {
            let index = (self.cursor + offset) % len;
            let task = &mut self.tasks[index];
            if task.poll_wake(now) {
                debug!("{} ({}) woken at {}", task.id(), task.name(), now);
            }
            if task.is_ready() {
                return Some(index);
            }
        }
        None
    }

    /// Run the next ready task once.
    ///
    /// Returns `None` when a full pass over the table found nothing
    /// ready; the cursor is left where it was.
    pub fn step(&mut self) -> Option<Dispatch> {
        let index = self.scan()?;
        let id = TaskId::new(index);
        self.current = Some(id);
        self.dispatches += 1;

        let outcome = {
            let routine = &mut self.routines[index];
            let mut cx = Context::new(&mut self.tasks, index, &mut self.tick);
            routine(&mut cx)
        };

        let hint = match outcome {
            Ok(hint) | Err(Yield::To(hint)) => hint,
            Err(Yield::Fault(e)) => {
                error!("{} ({}) faulted: {}", id, self.tasks[index].name(), e);
                self.tasks[index].set_stopped();
                ResumeHint::TOP
            }
        };

        self.cursor = hint.start_index(self.tasks.len());
        trace!("ran {}, resuming scan at {}", id, hint);
        Some(Dispatch { task: id, hint })
    }

    /// Take at most `passes` steps. Returns the number of dispatches.
    ///
    /// A bounded loop for tests and for callers that want a watchdog on
    /// tasks that never block.
    pub fn run_for(&mut self, passes: usize) -> usize {
        (0..passes).filter(|_| self.step().is_some()).count()
    }

    /// Schedule forever.
    pub fn run(&mut self) -> ! {
        info!("starting scheduler with {} tasks", self.len());
        for task in &self.tasks {
            debug!("  {} {} ({:?})", task.id(), task.name(), task.state());
        }
        loop {
            if self.step().is_none() {
                core::hint::spin_loop();
            }
        }
    }
}
