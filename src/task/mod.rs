//! Tasks and the task table.
//!
//! A task is a descriptor plus an entry routine. The table is declared
//! once, before scheduling starts, and its order is the priority order:
//! index 0 is the highest priority. The table never grows or shrinks and
//! a task never changes position.

pub mod context;
pub mod flag;
pub mod resume;
pub mod scheduler;
pub mod storage;
pub mod tick;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use self::context::Context;
use self::flag::WaitFlag;
use self::resume::{Routine, TaskResult};
use self::scheduler::Scheduler;
use self::storage::{StorageError, TaskStorage};
use self::tick::Tick;

/// Position of a task in the table, which is also its priority rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(usize);

impl TaskId {
    pub const fn new(index: usize) -> Self {
        TaskId(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Task#{}", self.0)
    }
}

/// Task state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Never scheduled until started.
    Stopped,
    Ready,
    /// Blocked on a flag and/or a tick deadline.
    Waiting,
}

bitflags::bitflags! {
    /// The conditions a waiting task is blocked on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Blockers: u8 {
        const FLAG = 0b01;
        const TICK = 0b10;
    }
}

/// A task descriptor.
pub struct Task<'f> {
    id: TaskId,
    name: &'static str,
    state: TaskState,
    storage: TaskStorage,
    wait: Option<&'f WaitFlag>,
    wake: Option<Tick>,
}

impl<'f> Task<'f> {
    fn new(id: TaskId, name: &'static str, state: TaskState) -> Self {
        Task {
            id,
            name,
            state,
            storage: TaskStorage::new(),
            wait: None,
            wake: None,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == TaskState::Ready
    }

    /// The flag this task waits on, if any.
    pub fn wait_condition(&self) -> Option<&'f WaitFlag> {
        self.wait
    }

    /// The tick this task sleeps until, if any.
    pub fn wake_tick(&self) -> Option<Tick> {
        self.wake
    }

    pub fn has_storage(&self) -> bool {
        self.storage.is_allocated()
    }

    pub fn blocked_on(&self) -> Blockers {
        let mut blockers = Blockers::empty();
        if self.wait.is_some() {
            blockers |= Blockers::FLAG;
        }
        if self.wake.is_some() {
            blockers |= Blockers::TICK;
        }
        blockers
    }

    pub(crate) fn storage_mut(&mut self) -> &mut TaskStorage {
        &mut self.storage
    }

    pub(crate) fn block_on_flag(&mut self, flag: &'f WaitFlag) {
        self.wait = Some(flag);
        self.wake = None;
        self.state = TaskState::Waiting;
    }

    pub(crate) fn block_until(&mut self, deadline: Tick) {
        self.wake = Some(deadline);
        self.wait = None;
        self.state = TaskState::Waiting;
    }

    /// Wait on `flag` with a deadline: whichever fires first wakes the task.
    pub(crate) fn block_on_flag_until(&mut self, flag: &'f WaitFlag, deadline: Tick) {
        self.wait = Some(flag);
        self.wake = Some(deadline);
        self.state = TaskState::Waiting;
    }

    pub(crate) fn set_ready(&mut self) {
        self.wait = None;
        self.wake = None;
        self.state = TaskState::Ready;
    }

    pub(crate) fn set_stopped(&mut self) {
        self.wait = None;
        self.wake = None;
        self.state = TaskState::Stopped;
    }

    /// Promote a waiting task whose flag is clear or whose deadline has
    /// passed. Returns `true` if the task was promoted.
    pub(crate) fn poll_wake(&mut self, now: Tick) -> bool {
        if self.state != TaskState::Waiting {
            return false;
        }
        let flag_clear = self.wait.map_or(false, |flag| !flag.is_held());
        let deadline_passed = self.wake.map_or(false, |deadline| now.reached(deadline));
        if flag_clear || deadline_passed {
            self.set_ready();
            return true;
        }
        false
    }
}

impl fmt::Debug for Task<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state)
            .field("wait", &self.wait)
            .field("wake", &self.wake)
            .field("storage", &self.storage)
            .finish()
    }
}

pub(crate) fn start(tasks: &mut [Task<'_>], id: TaskId) -> Result<(), TaskError> {
    let task = tasks.get_mut(id.index()).ok_or(TaskError::NoSuchTask(id))?;
    if task.state == TaskState::Stopped {
        task.set_ready();
        log::debug!("{} started", id);
    }
    Ok(())
}

pub(crate) fn stop(tasks: &mut [Task<'_>], id: TaskId) -> Result<(), TaskError> {
    let task = tasks.get_mut(id.index()).ok_or(TaskError::NoSuchTask(id))?;
    task.set_stopped();
    log::debug!("{} stopped", id);
    Ok(())
}

// ─── Errors ─────────────────────────────────────────────────────

/// Task and scheduler errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskError {
    /// The table was built with no tasks.
    EmptyTable,
    /// No task at that index.
    NoSuchTask(TaskId),
    /// Task-local storage could not be provided.
    Storage(StorageError),
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TaskError::EmptyTable => write!(f, "task table is empty"),
            TaskError::NoSuchTask(id) => write!(f, "no such task: {}", id),
            TaskError::Storage(e) => write!(f, "{}", e),
        }
    }
}

impl From<StorageError> for TaskError {
    fn from(e: StorageError) -> Self {
        TaskError::Storage(e)
    }
}

// ─── Table declaration ──────────────────────────────────────────

/// The task table, as declared before the scheduler starts.
///
/// Tasks are listed highest priority first.
#[derive(Default)]
pub struct TaskTable<'f> {
    tasks: Vec<Task<'f>>,
    routines: Vec<Routine<'f>>,
}

impl<'f> TaskTable<'f> {
    pub fn new() -> Self {
        TaskTable {
            tasks: Vec::new(),
            routines: Vec::new(),
        }
    }

    /// Append a task below every task declared so far.
    pub fn task<F>(mut self, name: &'static str, state: TaskState, routine: F) -> Self
    where
        F: FnMut(&mut Context<'_, 'f>) -> TaskResult + 'f,
    {
        let id = TaskId(self.tasks.len());
        self.tasks.push(Task::new(id, name, state));
        self.routines.push(Box::new(routine));
        self
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Freeze the table into a scheduler.
    pub fn build(self) -> Result<Scheduler<'f>, TaskError> {
        if self.tasks.is_empty() {
            return Err(TaskError::EmptyTable);
        }
        Ok(Scheduler::new(self.tasks, self.routines))
    }
}

/// Declare a task table, highest priority first.
///
/// ```
/// use lwsched::{task_table, Context, ResumeHint, TaskResult};
///
/// fn idle(_: &mut Context<'_, '_>) -> TaskResult {
///     Ok(ResumeHint::TOP)
/// }
///
/// let sched = task_table! {
///     Ready => idle,
///     Stopped => idle,
/// }
/// .build()
/// .unwrap();
/// assert_eq!(sched.len(), 2);
/// ```
#[macro_export]
macro_rules! task_table {
    ($($state:ident => $routine:expr),+ $(,)?) => {
        $crate::task::TaskTable::new()
            $(.task(stringify!($routine), $crate::task::TaskState::$state, $routine))+
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::resume::ResumeHint;

    fn noop(_: &mut Context<'_, '_>) -> TaskResult {
        Ok(ResumeHint::TOP)
    }

    #[test]
    fn empty_table_fails_fast() {
        let err = TaskTable::new().build().err();
        assert_eq!(err, Some(TaskError::EmptyTable));
    }

    #[test]
    fn declaration_order_is_priority() {
        let sched = crate::task_table! {
            Ready => noop,
            Stopped => noop,
            Ready => noop,
        }
        .build()
        .unwrap();

        let ids: Vec<_> = sched.tasks().map(|t| t.id().index()).collect();
        assert_eq!(ids, [0, 1, 2]);
        assert_eq!(sched.task(TaskId::new(1)).unwrap().state(), TaskState::Stopped);
        assert_eq!(sched.task(TaskId::new(0)).unwrap().name(), "noop");
    }

    #[test]
    fn promotion_clears_both_conditions() {
        let flag = WaitFlag::new();
        flag.set(1);
        let mut task = Task::new(TaskId(0), "t", TaskState::Ready);

        task.block_until(Tick::new(3));
        assert_eq!(task.blocked_on(), Blockers::TICK);
        assert!(!task.poll_wake(Tick::new(2)));
        assert!(task.poll_wake(Tick::new(3)));
        assert_eq!(task.wake_tick(), None);
        assert!(task.is_ready());

        task.block_on_flag(&flag);
        assert_eq!(task.blocked_on(), Blockers::FLAG);
        assert!(!task.poll_wake(Tick::new(100)));
        flag.release();
        assert!(task.poll_wake(Tick::new(100)));
        assert!(task.wait_condition().is_none());
        assert_eq!(task.blocked_on(), Blockers::empty());
    }

    #[test]
    fn stopped_tasks_are_never_promoted() {
        let mut task = Task::new(TaskId(0), "t", TaskState::Stopped);
        assert!(!task.poll_wake(Tick::new(i32::MAX)));
        assert_eq!(task.state(), TaskState::Stopped);
    }
}
