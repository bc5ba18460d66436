use std::sync::Arc;

use tracing::trace;

use super::{check_capacity, Backend, Deadline, Op, OpObserver};
use crate::{
    error::{BufferError, Result},
    primitives::{Condvar, Mutex, MutexGuard},
    ring::Ring,
};

/// Monitor-style backend: the ring lives inside one mutex, producers wait on
/// `room_available`, consumers on `item_available`.
pub struct MonitorBackend<T> {
    ring: Mutex<Ring<T>>,
    room_available: Condvar,
    item_available: Condvar,
    observer: Option<Arc<dyn OpObserver>>,
}

impl<T> MonitorBackend<T> {
    pub fn new(capacity: usize) -> Result<Self> {
        check_capacity(capacity)?;
        Ok(Self {
            ring: Mutex::new(Ring::new(capacity)?),
            room_available: Condvar::new(),
            item_available: Condvar::new(),
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
}

/// Blocks on `cond` until `ready` holds. The predicate is re-checked after
/// every wake-up, and once more after a timeout before giving up, so a
/// signal racing the timeout is never dropped.
fn wait_until<'a, T>(
    mut ring: MutexGuard<'a, Ring<T>>,
    cond: &Condvar,
    deadline: Option<Deadline>,
    ready: impl Fn(&Ring<T>) -> bool,
) -> Result<MutexGuard<'a, Ring<T>>> {
    while !ready(&ring) {
        match deadline {
            None => ring = cond.wait(ring),
            Some(deadline) => {
                let Some(left) = deadline.remaining() else {
                    return Err(BufferError::Timeout(deadline.timeout()));
                };
                ring = cond.wait_timeout(ring, left).0;
            }
        }
    }
    Ok(ring)
}

impl<T: Send> Backend<T> for MonitorBackend<T> {
    fn put(&self, value: T, deadline: Option<Deadline>) -> Result<()> {
        let ring = self.ring.lock();
        let mut ring = wait_until(ring, &self.room_available, deadline, |r| !r.is_full())?;
        ring.push(value)?;
        trace!(len = ring.len(), head = ring.head(), "put");
        self.observe(Op::Put, &ring);
        self.item_available.signal();
        Ok(())
    }

    fn take(&self, deadline: Option<Deadline>) -> Result<T> {
        let ring = self.ring.lock();
        let mut ring = wait_until(ring, &self.item_available, deadline, |r| !r.is_empty())?;
        let value = ring.pop()?;
        trace!(len = ring.len(), tail = ring.tail(), "take");
        self.observe(Op::Take, &ring);
        self.room_available.signal();
        Ok(value)
    }

    fn len(&self) -> usize {
        self.ring.lock().len()
    }

    fn capacity(&self) -> usize {
        self.ring.lock().capacity()
    }
}

#[cfg(test)]
mod test {
    use std::{thread, time::Duration};

    use super::MonitorBackend;
    use crate::{
        backend::{Backend, Deadline},
        error::BufferError,
    };

    #[test]
    fn rejects_unbounded_capacity() {
        for capacity in [0, usize::MAX] {
            let err = MonitorBackend::<i64>::new(capacity).err();
            assert!(matches!(err, Some(BufferError::InvalidConfig { .. })));
        }
    }

    #[test]
    fn huge_timeout_does_not_overflow() {
        let backend = MonitorBackend::new(1).unwrap();
        backend.put(3, Deadline::after(Duration::MAX)).unwrap();
        assert_eq!(backend.take(Deadline::after(Duration::MAX)), Ok(3));
    }

    #[test]
    fn take_times_out_on_empty() {
        let backend = MonitorBackend::<i64>::new(2).unwrap();
        let err = backend
            .take(Deadline::after(Duration::from_millis(20)))
            .unwrap_err();
        assert_eq!(err, BufferError::Timeout(Duration::from_millis(20)));
    }

    #[test]
    fn put_times_out_on_full() {
        let backend = MonitorBackend::new(1).unwrap();
        backend.put(1, None).unwrap();
        let err = backend
            .put(2, Deadline::after(Duration::from_millis(20)))
            .unwrap_err();
        assert!(matches!(err, BufferError::Timeout(_)));
        assert_eq!(backend.len(), 1);
        assert_eq!(backend.take(None), Ok(1));
    }

    #[test]
    fn blocked_put_resumes_after_take() {
        let backend = MonitorBackend::new(1).unwrap();
        backend.put(1, None).unwrap();
        thread::scope(|s| {
            let producer = s.spawn(|| backend.put(2, None));
            thread::sleep(Duration::from_millis(20));
            assert_eq!(backend.take(None), Ok(1));
            producer.join().unwrap().unwrap();
        });
        assert_eq!(backend.take(None), Ok(2));
    }
}
