use std::{
    cell::UnsafeCell,
    ops::{Deref, DerefMut},
    sync::Arc,
};

use tracing::trace;

use super::{check_capacity, Backend, Deadline, Op, OpObserver};
use crate::{
    error::{BufferError, Result},
    primitives::Semaphore,
    ring::Ring,
};

/// Counting-semaphore backend.
///
/// Acquire order is always capacity semaphore first, then `mutex`: a task
/// holding `mutex` never blocks on capacity.
pub struct SemaphoreBackend<T> {
    empty_slots: Semaphore,
    filled_slots: Semaphore,
    mutex: Semaphore,
    ring: UnsafeCell<Ring<T>>,
    observer: Option<Arc<dyn OpObserver>>,
}

// Safety: the ring is only reached through `Exclusive`, which holds `mutex`.
unsafe impl<T: Send> Send for SemaphoreBackend<T> {}
unsafe impl<T: Send> Sync for SemaphoreBackend<T> {}

impl<T> SemaphoreBackend<T> {
    pub fn new(capacity: usize) -> Result<Self> {
        check_capacity(capacity)?;
        let permits = u32::try_from(capacity).map_err(|_| {
            BufferError::invalid_config(format!(
                "buffer capacity {capacity} exceeds the semaphore limit"
            ))
        })?;
        let ring = Ring::new(capacity)?;
        Ok(Self {
            empty_slots: Semaphore::new(permits),
            filled_slots: Semaphore::new(0),
            mutex: Semaphore::new(1),
            ring: UnsafeCell::new(ring),
            observer: None,
        })
    }

    pub fn observed(mut self, observer: Arc<dyn OpObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    fn observe(&self, op: Op, ring: &Ring<T>) {
        if let Some(observer) = &self.observer {
            observer.observe(op, ring.len());
        }
    }

    fn lock(&self) -> Exclusive<'_, T> {
        self.mutex.wait();
        Exclusive { backend: self }
    }

    fn acquire(sem: &Semaphore, deadline: Option<Deadline>) -> Result<()> {
        match deadline {
            None => {
                sem.wait();
                Ok(())
            }
            Some(deadline) => {
                let acquired = match deadline.remaining() {
                    Some(left) => sem.wait_timeout(left),
                    None => sem.try_wait(),
                };
                if acquired {
                    Ok(())
                } else {
                    Err(BufferError::Timeout(deadline.timeout()))
                }
            }
        }
    }
}

/// Ring access while holding the binary semaphore; posts it on drop.
struct Exclusive<'a, T> {
    backend: &'a SemaphoreBackend<T>,
}

impl<T> Deref for Exclusive<'_, T> {
    type Target = Ring<T>;
    fn deref(&self) -> &Ring<T> {
        unsafe { &*self.backend.ring.get() }
    }
}

impl<T> DerefMut for Exclusive<'_, T> {
    fn deref_mut(&mut self) -> &mut Ring<T> {
        unsafe { &mut *self.backend.ring.get() }
    }
}

impl<T> Drop for Exclusive<'_, T> {
    fn drop(&mut self) {
        self.backend.mutex.post();
    }
}

impl<T: Send> Backend<T> for SemaphoreBackend<T> {
    fn put(&self, value: T, deadline: Option<Deadline>) -> Result<()> {
        Self::acquire(&self.empty_slots, deadline)?;
        let mut ring = self.lock();
        let pushed = ring.push(value);
        if let Err(e) = pushed {
            drop(ring);
            self.empty_slots.post();
            return Err(e);
        }
        trace!(len = ring.len(), head = ring.head(), "put");
        self.observe(Op::Put, &ring);
        drop(ring);
        self.filled_slots.post();
        Ok(())
    }

    fn take(&self, deadline: Option<Deadline>) -> Result<T> {
        Self::acquire(&self.filled_slots, deadline)?;
        let mut ring = self.lock();
        let popped = ring.pop();
        let value = match popped {
            Ok(value) => value,
            Err(e) => {
                drop(ring);
                self.filled_slots.post();
                return Err(e);
            }
        };
        trace!(len = ring.len(), tail = ring.tail(), "take");
        self.observe(Op::Take, &ring);
        drop(ring);
        self.empty_slots.post();
        Ok(value)
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    fn capacity(&self) -> usize {
        self.lock().capacity()
    }
}
