use std::{cell::UnsafeCell, io, mem::MaybeUninit, time::Duration};

use libc::{
    c_int, sem_destroy, sem_getvalue, sem_init, sem_post, sem_t, sem_timedwait, sem_trywait,
    sem_wait, EAGAIN, EINTR, ETIMEDOUT,
};

use super::condvar::realtime_deadline;

/// Counting semaphore over an unnamed POSIX `sem_t`, private to this process.
#[derive(Debug)]
pub struct Semaphore {
    inner: Box<UnsafeCell<MaybeUninit<sem_t>>>,
}

impl Semaphore {
    pub fn new(value: u32) -> Self {
        let inner = Box::new(UnsafeCell::new(MaybeUninit::uninit()));
        if unsafe { sem_init((*inner.get()).as_mut_ptr(), 0, value) } != 0 {
            panic!("failed to initialize semaphore");
        }
        Self { inner }
    }

    pub fn wait(&self) {
        loop {
            if unsafe { sem_wait(self.raw()) } == 0 {
                return;
            }
            match errno() {
                EINTR => continue,
                e => panic!("failed to wait for semaphore: {e}"),
            }
        }
    }

    /// Returns `false` if no permit became available within `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let ts = realtime_deadline(timeout);
        loop {
            if unsafe { sem_timedwait(self.raw(), &raw const ts) } == 0 {
                return true;
            }
            match errno() {
                EINTR => continue,
                ETIMEDOUT => return false,
                e => panic!("failed to wait for semaphore: {e}"),
            }
        }
    }

    pub fn try_wait(&self) -> bool {
        loop {
            if unsafe { sem_trywait(self.raw()) } == 0 {
                return true;
            }
            match errno() {
                EINTR => continue,
                EAGAIN => return false,
                e => panic!("failed to try semaphore: {e}"),
            }
        }
    }

    pub fn post(&self) {
        if unsafe { sem_post(self.raw()) } != 0 {
            panic!("failed to post semaphore");
        }
    }

    pub fn value(&self) -> usize {
        let mut value: c_int = 0;
        if unsafe { sem_getvalue(self.raw(), &raw mut value) } != 0 {
            panic!("failed to read semaphore");
        }
        // glibc never reports waiters as a negative value, other libcs may
        value.max(0) as usize
    }

    fn raw(&self) -> *mut sem_t {
        unsafe { (*self.inner.get()).as_mut_ptr() }
    }
}

unsafe impl Send for Semaphore {}
unsafe impl Sync for Semaphore {}

impl Drop for Semaphore {
    fn drop(&mut self) {
        if unsafe { sem_destroy(self.raw()) } != 0 {
            panic!("failed to destroy semaphore");
        }
    }
}

fn errno() -> c_int {
    io::Error::last_os_error().raw_os_error().unwrap_or(0)
}
