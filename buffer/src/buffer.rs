use std::{fmt, sync::Arc, time::Duration};

use crate::{
    backend::{Backend, Deadline, MonitorBackend, OpObserver, SemaphoreBackend, Strategy},
    error::Result,
};

/// Fixed-capacity FIFO shared between any number of producers and consumers.
///
/// `put` blocks while the buffer is full, `take` while it is empty. Both
/// backends give the same contract; pick one with [`Strategy`].
pub struct BoundedBuffer<T> {
    backend: Box<dyn Backend<T>>,
    strategy: Strategy,
}

impl<T: Send + 'static> BoundedBuffer<T> {
    pub fn new(capacity: usize, strategy: Strategy) -> Result<Self> {
        Self::build(capacity, strategy, None)
    }

    /// Like [`new`](Self::new), reporting every put and take to `observer`
    /// from inside the critical section.
    pub fn observed(
        capacity: usize,
        strategy: Strategy,
        observer: Arc<dyn OpObserver>,
    ) -> Result<Self> {
        Self::build(capacity, strategy, Some(observer))
    }

    fn build(
        capacity: usize,
        strategy: Strategy,
        observer: Option<Arc<dyn OpObserver>>,
    ) -> Result<Self> {
        let backend: Box<dyn Backend<T>> = match (strategy, observer) {
            (Strategy::Monitor, None) => Box::new(MonitorBackend::new(capacity)?),
            (Strategy::Monitor, Some(o)) => Box::new(MonitorBackend::new(capacity)?.observed(o)),
            (Strategy::Semaphore, None) => Box::new(SemaphoreBackend::new(capacity)?),
            (Strategy::Semaphore, Some(o)) => {
                Box::new(SemaphoreBackend::new(capacity)?.observed(o))
            }
        };
        Ok(Self { backend, strategy })
    }
}

impl<T> BoundedBuffer<T> {
    pub fn put(&self, value: T) -> Result<()> {
        self.backend.put(value, None)
    }

    pub fn take(&self) -> Result<T> {
        self.backend.take(None)
    }

    /// Like [`put`](Self::put), failing with `Timeout` if no slot frees up in
    /// time. The value is dropped in that case.
    pub fn put_timeout(&self, value: T, timeout: Duration) -> Result<()> {
        self.backend.put(value, Deadline::after(timeout))
    }

    pub fn take_timeout(&self, timeout: Duration) -> Result<T> {
        self.backend.take(Deadline::after(timeout))
    }

    pub fn len(&self) -> usize {
        self.backend.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.backend.capacity()
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }
}

impl<T> fmt::Debug for BoundedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedBuffer")
            .field("strategy", &self.strategy)
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}
