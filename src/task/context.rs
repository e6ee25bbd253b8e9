//! The handle a routine gets while it runs.
//!
//! A [`Context`] borrows the task table and the tick counter for the
//! duration of one dispatch. Only the running task holds one, so every
//! mutation it makes is exclusive without any locking.

use core::num::NonZeroU8;

use log::{debug, warn};

use super::flag::WaitFlag;
use super::resume::{ResumeHint, Yield};
use super::storage::StorageError;
use super::tick::Tick;
use super::{Task, TaskError, TaskId, TaskState};

pub struct Context<'a, 'f> {
    tasks: &'a mut [Task<'f>],
    current: usize,
    tick: &'a mut Tick,
}

impl<'a, 'f> Context<'a, 'f> {
    pub(crate) fn new(tasks: &'a mut [Task<'f>], current: usize, tick: &'a mut Tick) -> Self {
        Context {
            tasks,
            current,
            tick,
        }
    }

    /// The running task.
    pub fn id(&self) -> TaskId {
        TaskId::new(self.current)
    }

    /// The running task's descriptor.
    pub fn task(&self) -> &Task<'f> {
        &self.tasks[self.current]
    }

    /// Number of tasks in the table.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn state_of(&self, id: TaskId) -> Option<TaskState> {
        self.tasks.get(id.index()).map(Task::state)
    }

    // ─── Time ───────────────────────────────────────────────────

    pub fn tick(&self) -> Tick {
        *self.tick
    }

    /// Advance the tick by `n`. Only one task in the system should do
    /// this; sleepers are woken against whatever value it maintains.
    pub fn add_tick(&mut self, n: i32) {
        if n != 0 {
            *self.tick = self.tick.wrapping_add(n);
        }
    }

    // ─── Storage ────────────────────────────────────────────────

    /// This task's private block, created as `T::default()` the first
    /// time it is requested.
    ///
    /// Every later request (for the same `T`) returns the same block.
    pub fn storage<T: Default + 'static>(&mut self) -> Result<&mut T, StorageError> {
        self.tasks[self.current].storage_mut().get_or_alloc::<T>()
    }

    // ─── Yielding ───────────────────────────────────────────────

    /// Let the highest-priority ready task run.
    pub fn yield_now(&self) -> Yield {
        Yield::To(ResumeHint::TOP)
    }

    /// Run `target` next, or the first ready task below it.
    pub fn yield_to(&self, target: TaskId) -> Yield {
        if target.index() >= self.tasks.len() {
            warn!(
                "{} yielded to {} past the end of the table, rescanning from the top",
                self.id(),
                target
            );
            return Yield::To(ResumeHint::TOP);
        }
        Yield::To(ResumeHint::to(target))
    }

    /// Run the next lower-priority ready task, wrapping to the top.
    pub fn yield_next(&self) -> Yield {
        let next = (self.current + 1) % self.tasks.len();
        Yield::To(ResumeHint::to(TaskId::new(next)))
    }

    // ─── Blocking ───────────────────────────────────────────────

    /// Take `flag` and block until someone releases it.
    pub fn wait(&mut self, flag: &'f WaitFlag) -> Yield {
        self.wait_with(flag, NonZeroU8::MIN)
    }

    /// Like [`wait`](Self::wait), holding the flag with a count of `n`;
    /// the task wakes once `n` decrements (or a release) bring it to 0.
    pub fn wait_with(&mut self, flag: &'f WaitFlag, n: NonZeroU8) -> Yield {
        flag.set(n.get());
        let task = &mut self.tasks[self.current];
        task.block_on_flag(flag);
        debug!("{} waiting on flag (hold {})", task.id(), n);
        Yield::To(ResumeHint::TOP)
    }

    /// Take `flag` and block until it is released or the tick reaches
    /// `deadline`, whichever is seen first.
    pub fn wait_timeout(&mut self, flag: &'f WaitFlag, deadline: Tick) -> Yield {
        flag.set(1);
        let task = &mut self.tasks[self.current];
        task.block_on_flag_until(flag, deadline);
        debug!("{} waiting on flag until {}", task.id(), deadline);
        Yield::To(ResumeHint::TOP)
    }

    /// Clear `flag`. Waiters are promoted when the scheduler next scans
    /// past them; the caller keeps running.
    pub fn release(&self, flag: &WaitFlag) {
        flag.release();
    }

    /// Sleep until the tick reaches `target`.
    ///
    /// `target` is taken as-is; it is up to the tick owner's convention
    /// whether that is an absolute time.
    pub fn sleep(&mut self, target: Tick) -> Yield {
        let task = &mut self.tasks[self.current];
        task.block_until(target);
        debug!("{} sleeping until {}", task.id(), target);
        Yield::To(ResumeHint::TOP)
    }

    /// Sleep for `ticks` past the current tick.
    pub fn sleep_for(&mut self, ticks: i32) -> Yield {
        let target = self.tick.wrapping_add(ticks);
        self.sleep(target)
    }

    // ─── Start / stop ───────────────────────────────────────────

    /// Make a stopped task ready. Tasks that are not stopped are left
    /// alone.
    pub fn start(&mut self, id: TaskId) -> Result<(), TaskError> {
        super::start(self.tasks, id)
    }

    /// Stop a task, dropping whatever it was waiting on.
    pub fn stop(&mut self, id: TaskId) -> Result<(), TaskError> {
        super::stop(self.tasks, id)
    }

    /// Stop the running task and yield.
    pub fn exit(&mut self) -> Yield {
        self.tasks[self.current].set_stopped();
        debug!("{} exited", self.id());
        Yield::To(ResumeHint::TOP)
    }
}
