//! Task-local storage.
//!
//! Each task owns one private block, allocated the first time the task
//! asks for it and kept until the scheduler is dropped. The block is how
//! state survives a yield, since routines restart from their entry.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::{type_name, Any};
use core::fmt;
use core::mem::size_of;

/// Errors from the task-local storage allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// The allocator could not provide the block.
    AllocFailed { size: usize },
    /// The task already owns a block of a different type.
    TypeMismatch { requested: &'static str },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StorageError::AllocFailed { size } => {
                write!(f, "task storage allocation of {} bytes failed", size)
            }
            StorageError::TypeMismatch { requested } => {
                write!(f, "task storage already holds a type other than {}", requested)
            }
        }
    }
}

/// One task's storage slot.
#[derive(Default)]
pub struct TaskStorage {
    block: Option<Box<dyn Any>>,
}

impl TaskStorage {
    pub const fn new() -> Self {
        TaskStorage { block: None }
    }

    pub fn is_allocated(&self) -> bool {
        self.block.is_some()
    }

    /// Get the block, allocating a `T::default()` on first use.
    pub fn get_or_alloc<T: Default + 'static>(&mut self) -> Result<&mut T, StorageError> {
        if self.block.is_none() {
            self.block = Some(alloc_block::<T>()?);
        }
        self.block
            .as_mut()
            .and_then(|block| block.downcast_mut::<[T; 1]>())
            .map(|block| &mut block[0])
            .ok_or(StorageError::TypeMismatch {
                requested: type_name::<T>(),
            })
    }
}

impl fmt::Debug for TaskStorage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TaskStorage")
            .field("allocated", &self.is_allocated())
            .finish()
    }
}

/// Allocate without aborting on exhaustion.
fn alloc_block<T: Default + 'static>() -> Result<Box<dyn Any>, StorageError> {
    let failed = StorageError::AllocFailed {
        size: size_of::<T>(),
    };
    let mut block = Vec::new();
    block.try_reserve_exact(1).map_err(|_| failed)?;
    block.push(T::default());
    let block: Box<[T; 1]> = block.into_boxed_slice().try_into().map_err(|_| failed)?;
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default, Debug, PartialEq)]
    struct Progress {
        runs: u32,
        stamp: i64,
    }

    #[test]
    fn allocates_once_and_is_stable() {
        let mut storage = TaskStorage::new();
        assert!(!storage.is_allocated());

        let first = storage.get_or_alloc::<Progress>().unwrap();
        assert_eq!(*first, Progress::default());
        first.runs = 3;
        let first_addr = first as *const Progress;

        let second = storage.get_or_alloc::<Progress>().unwrap();
        assert_eq!(second.runs, 3);
        assert_eq!(second as *const Progress, first_addr);
    }

    #[test]
    fn other_type_is_rejected() {
        let mut storage = TaskStorage::new();
        *storage.get_or_alloc::<u32>().unwrap() = 7;
        let err = storage.get_or_alloc::<u64>().unwrap_err();
        assert!(matches!(err, StorageError::TypeMismatch { .. }));
        // The first block is untouched.
        assert_eq!(*storage.get_or_alloc::<u32>().unwrap(), 7);
    }

    #[test]
    fn zero_sized_blocks_work() {
        let mut storage = TaskStorage::new();
        storage.get_or_alloc::<()>().unwrap();
        assert!(storage.is_allocated());
    }
}
