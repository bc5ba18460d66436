use std::{
    cell::UnsafeCell,
    mem::MaybeUninit,
    ops::{Deref, DerefMut},
};

use libc::{
    pthread_mutex_destroy, pthread_mutex_init, pthread_mutex_lock, pthread_mutex_t,
    pthread_mutex_unlock, pthread_mutexattr_destroy, pthread_mutexattr_init,
};

use crate::CheckOk;

/// Mutual exclusion lock over a `pthread_mutex_t`.
///
/// The pthread object lives on the heap so the handle can be moved freely
/// after initialization.
#[derive(Debug)]
pub struct Mutex<T> {
    lock: Box<UnsafeCell<MaybeUninit<pthread_mutex_t>>>,
    data: UnsafeCell<T>,
}

impl<T> Mutex<T> {
    pub fn new(data: T) -> Self {
        let lock = Box::new(UnsafeCell::new(MaybeUninit::uninit()));
        let mut attr = MaybeUninit::uninit();
        unsafe {
            pthread_mutexattr_init(attr.as_mut_ptr())
                .r("attr_init")
                .unwrap();

            pthread_mutex_init((*lock.get()).as_mut_ptr(), attr.as_ptr())
                .r("mutex_init")
                .unwrap();

            pthread_mutexattr_destroy(attr.as_mut_ptr())
                .r("attr_destroy")
                .unwrap();
        }

        Self {
            lock,
            data: UnsafeCell::new(data),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, T> {
        unsafe {
            if pthread_mutex_lock(self.raw()) != 0 {
                panic!("failed to lock mutex");
            }
            MutexGuard { lock: self }
        }
    }

    fn raw(&self) -> *mut pthread_mutex_t {
        unsafe { (*self.lock.get()).as_mut_ptr() }
    }
}

/// Holds the lock. References to the data are only handed out per borrow of
/// the guard, so none outlives a [`Condvar`](super::Condvar) wait that
/// releases the lock.
pub struct MutexGuard<'a, T: 'a> {
    lock: &'a Mutex<T>,
}

impl<'a, T: 'a> MutexGuard<'a, T> {
    pub(crate) fn get_inner_lock(&self) -> *mut pthread_mutex_t {
        self.lock.raw()
    }
}

impl<T> Deref for MutexGuard<'_, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for MutexGuard<'_, T> {
    fn drop(&mut self) {
        unsafe {
            if pthread_mutex_unlock(self.lock.raw()) != 0 {
                panic!("failed to unlock mutex");
            }
        }
    }
}

unsafe impl<T: Send> Send for Mutex<T> {}
unsafe impl<T: Send> Sync for Mutex<T> {}

impl<T> Drop for Mutex<T> {
    fn drop(&mut self) {
        if unsafe { pthread_mutex_destroy(self.raw()) } != 0 {
            panic!("failed to destroy mutex");
        }
    }
}
