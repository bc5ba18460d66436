use crate::primitives::Mutex;

/// Production quota shared by all producers of a run.
///
/// Has its own lock, never held across a buffer operation.
#[derive(Debug)]
pub struct QuotaPool {
    issued: Mutex<usize>,
    total: usize,
}

impl QuotaPool {
    pub fn new(total: usize) -> Self {
        Self {
            issued: Mutex::new(0),
            total,
        }
    }

    /// Claims the next production ticket, `None` once the pool is drained.
    pub fn reserve(&self) -> Option<usize> {
        let mut issued = self.issued.lock();
        if *issued == self.total {
            return None;
        }
        let ticket = *issued;
        *issued += 1;
        Some(ticket)
    }

    pub fn issued(&self) -> usize {
        *self.issued.lock()
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

#[cfg(test)]
mod test {
    use std::{collections::BTreeSet, thread};

    use super::QuotaPool;
    use crate::primitives::Mutex;

    #[test]
    fn tickets_are_unique_under_contention() {
        let pool = QuotaPool::new(500);
        let seen = Mutex::new(BTreeSet::new());
        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    while let Some(ticket) = pool.reserve() {
                        assert!(seen.lock().insert(ticket));
                    }
                });
            }
        });
        assert_eq!(pool.issued(), 500);
        assert_eq!(seen.lock().len(), 500);
        assert_eq!(pool.reserve(), None);
    }

    #[test]
    fn empty_pool() {
        let pool = QuotaPool::new(0);
        assert_eq!(pool.reserve(), None);
        assert_eq!(pool.total(), 0);
    }
}
