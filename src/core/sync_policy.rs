//! Synchronization policies for a logger hierarchy
//!
//! Every piece of shared mutable state in a hierarchy (the node arena, each
//! node's effective-sink cache, each logger's pattern) lives in a
//! [`LockCell`] chosen by the hierarchy's [`SyncPolicy`]. The policy is a type
//! parameter, so one hierarchy never mixes the two.
//!
//! - [`SingleThreaded`]: `RefCell`, no atomics, `!Sync`
//! - [`MultiThreaded`]: `parking_lot::RwLock`

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::cell::{Ref, RefCell, RefMut};
use std::ops::{Deref, DerefMut};

/// Shared/exclusive access to a value.
pub trait LockCell<T> {
    type ReadGuard<'a>: Deref<Target = T>
    where
        Self: 'a;
    type WriteGuard<'a>: DerefMut<Target = T>
    where
        Self: 'a;

    fn new(value: T) -> Self;

    /// Shared access; dispatch only ever takes this.
    fn read(&self) -> Self::ReadGuard<'_>;

    /// Exclusive access; configuration changes take this.
    fn write(&self) -> Self::WriteGuard<'_>;
}

impl<T> LockCell<T> for RefCell<T> {
    type ReadGuard<'a> = Ref<'a, T> where Self: 'a;
    type WriteGuard<'a> = RefMut<'a, T> where Self: 'a;

    #[inline]
    fn new(value: T) -> Self {
        RefCell::new(value)
    }

    #[inline]
    fn read(&self) -> Ref<'_, T> {
        self.borrow()
    }

    #[inline]
    fn write(&self) -> RefMut<'_, T> {
        self.borrow_mut()
    }
}

impl<T> LockCell<T> for RwLock<T> {
    type ReadGuard<'a> = RwLockReadGuard<'a, T> where Self: 'a;
    type WriteGuard<'a> = RwLockWriteGuard<'a, T> where Self: 'a;

    #[inline]
    fn new(value: T) -> Self {
        RwLock::new(value)
    }

    #[inline]
    fn read(&self) -> RwLockReadGuard<'_, T> {
        RwLock::read(self)
    }

    #[inline]
    fn write(&self) -> RwLockWriteGuard<'_, T> {
        RwLock::write(self)
    }
}

/// Picks the lock type for every shared cell in a hierarchy.
pub trait SyncPolicy: 'static {
    type Cell<T>: LockCell<T>;

    /// Wrap `value` in this policy's cell.
    fn cell<T>(value: T) -> Self::Cell<T> {
        <Self::Cell<T> as LockCell<T>>::new(value)
    }
}

/// No locking. Loggers of this policy cannot leave their thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleThreaded;

impl SyncPolicy for SingleThreaded {
    type Cell<T> = RefCell<T>;
}

/// Reader/writer locks: concurrent dispatch, exclusive reconfiguration.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiThreaded;

impl SyncPolicy for MultiThreaded {
    type Cell<T> = RwLock<T>;
}
