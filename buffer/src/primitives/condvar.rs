use std::{
    cell::UnsafeCell,
    mem::MaybeUninit,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use libc::{
    c_int, pthread_cond_destroy, pthread_cond_init, pthread_cond_signal, pthread_cond_t,
    pthread_cond_timedwait, pthread_cond_wait, pthread_condattr_destroy, pthread_condattr_init,
    pthread_mutex_t, timespec, ETIMEDOUT,
};

use crate::CheckOk;

use super::MutexGuard;

/// Condition variable paired with a [`Mutex`](super::Mutex).
///
/// Waits may return spuriously; callers must re-check their predicate.
#[derive(Debug)]
pub struct Condvar {
    inner: Box<UnsafeCell<MaybeUninit<pthread_cond_t>>>,
}

impl Condvar {
    pub fn new() -> Self {
        let inner = Box::new(UnsafeCell::new(MaybeUninit::uninit()));
        let mut attr = MaybeUninit::uninit();
        unsafe {
            pthread_condattr_init(attr.as_mut_ptr())
                .r("attr_init")
                .unwrap();

            pthread_cond_init((*inner.get()).as_mut_ptr(), attr.as_ptr())
                .r("cond_init")
                .unwrap();

            pthread_condattr_destroy(attr.as_mut_ptr())
                .r("attr_destroy")
                .unwrap();
        }

        Self { inner }
    }

    pub fn signal(&self) {
        unsafe {
            if pthread_cond_signal(self.raw()) != 0 {
                panic!("failed to signal condvar");
            }
        }
    }

    pub fn wait<'m, T>(&self, guard: MutexGuard<'m, T>) -> MutexGuard<'m, T> {
        unsafe {
            if pthread_cond_wait(self.raw(), guard.get_inner_lock()) != 0 {
                panic!("failed to wait on condvar");
            }
        }
        guard
    }

    /// Waits for at most `timeout`. The mutex is held again on return either
    /// way; the flag reports whether the wait ran out.
    pub fn wait_timeout<'m, T>(
        &self,
        guard: MutexGuard<'m, T>,
        timeout: Duration,
    ) -> (MutexGuard<'m, T>, bool) {
        let result = unsafe { cond_wait_timeout(self.raw(), guard.get_inner_lock(), timeout) };
        match result {
            0 => (guard, false),
            ETIMEDOUT => (guard, true),
            e => panic!("failed to wait for condvar: {e}"),
        }
    }

    fn raw(&self) -> *mut pthread_cond_t {
        unsafe { (*self.inner.get()).as_mut_ptr() }
    }
}

impl Default for Condvar {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl Send for Condvar {}
unsafe impl Sync for Condvar {}

impl Drop for Condvar {
    fn drop(&mut self) {
        if unsafe { pthread_cond_destroy(self.raw()) } != 0 {
            panic!("failed to destroy condvar");
        }
    }
}

unsafe fn cond_wait_timeout(
    cond: *mut pthread_cond_t,
    mutex: *mut pthread_mutex_t,
    timeout: Duration,
) -> c_int {
    let ts = realtime_deadline(timeout);
    // pthread_cond_timedwait reports failure through its return value, not errno
    pthread_cond_timedwait(cond, mutex, &raw const ts)
}

/// Absolute `CLOCK_REALTIME` instant `timeout` from now, as the timed pthread
/// and semaphore calls expect it.
pub(crate) fn realtime_deadline(timeout: Duration) -> timespec {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO);
    let target = now.saturating_add(timeout);
    timespec {
        tv_sec: target.as_secs().min(libc::time_t::MAX as u64) as libc::time_t,
        tv_nsec: target.subsec_nanos() as libc::c_long,
    }
}

#[cfg(test)]
mod test {
    use std::{thread, time::Duration};

    use super::Condvar;
    use crate::primitives::Mutex;

    #[test]
    fn wait_timeout_expires() {
        let lock = Mutex::new(());
        let cond = Condvar::new();
        let (_guard, timed_out) = cond.wait_timeout(lock.lock(), Duration::from_millis(10));
        assert!(timed_out);
    }

    #[test]
    fn signal_wakes_waiter() {
        let ready = Mutex::new(false);
        let cond = Condvar::new();
        thread::scope(|s| {
            s.spawn(|| {
                let mut guard = ready.lock();
                while !*guard {
                    guard = cond.wait(guard);
                }
            });
            *ready.lock() = true;
            cond.signal();
        });
        assert!(*ready.lock());
    }

    #[test]
    fn waiter_sees_writes_made_while_parked() {
        let log = Mutex::new(Vec::new());
        let cond = Condvar::new();
        thread::scope(|s| {
            let waiter = s.spawn(|| {
                let mut guard = log.lock();
                guard.push("waiting");
                while guard.len() < 2 {
                    guard = cond.wait(guard);
                }
                guard.push("woken");
                guard.clone()
            });
            loop {
                let mut guard = log.lock();
                if !guard.is_empty() {
                    guard.push("written");
                    cond.signal();
                    break;
                }
                drop(guard);
                thread::yield_now();
            }
            assert_eq!(waiter.join().unwrap(), vec!["waiting", "written", "woken"]);
        });
    }
}
