use crate::error::{BufferError, Invariant, Result};

/// Fixed-capacity circular slot array.
///
/// Not synchronized: every backend keeps it behind its own exclusion
/// mechanism. Exactly `len` slots starting at `tail` (wrapping) are occupied.
#[derive(Debug)]
pub struct Ring<T> {
    slots: Box<[Option<T>]>,
    head: usize,
    tail: usize,
    count: usize,
}

impl<T> Ring<T> {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(BufferError::invalid_config("buffer capacity must be at least 1"));
        }
        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity).map_err(|e| {
            BufferError::invalid_config(format!(
                "buffer capacity {capacity} cannot be allocated: {e}"
            ))
        })?;
        slots.resize_with(capacity, || None);
        Ok(Self {
            slots: slots.into_boxed_slice(),
            head: 0,
            tail: 0,
            count: 0,
        })
    }

    /// Writes `value` at `head`. The caller must have established `len < capacity`;
    /// an occupied target slot is reported as corruption and nothing changes.
    pub fn push(&mut self, value: T) -> Result<()> {
        let index = self.head;
        let slot = &mut self.slots[index];
        if slot.is_some() {
            return Err(BufferError::Corruption {
                invariant: Invariant::PutIntoOccupied,
                index,
            });
        }
        *slot = Some(value);
        self.head = (self.head + 1) % self.slots.len();
        self.count += 1;
        Ok(())
    }

    /// Removes the value at `tail`. The caller must have established `len > 0`.
    pub fn pop(&mut self) -> Result<T> {
        let index = self.tail;
        let Some(value) = self.slots[index].take() else {
            return Err(BufferError::Corruption {
                invariant: Invariant::TakeFromEmpty,
                index,
            });
        };
        self.tail = (self.tail + 1) % self.slots.len();
        self.count -= 1;
        Ok(value)
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == self.slots.len()
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn tail(&self) -> usize {
        self.tail
    }

    #[cfg(test)]
    fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

#[cfg(test)]
mod test {
    use std::collections::VecDeque;

    use proptest::prelude::*;

    use super::Ring;
    use crate::error::{BufferError, Invariant};

    #[test]
    fn zero_capacity_rejected() {
        assert!(matches!(
            Ring::<i64>::new(0),
            Err(BufferError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn unallocatable_capacity_rejected() {
        assert!(matches!(
            Ring::<i64>::new(usize::MAX),
            Err(BufferError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn wraps_around() {
        let mut ring = Ring::new(2).unwrap();
        ring.push(1).unwrap();
        ring.push(2).unwrap();
        assert_eq!(ring.pop(), Ok(1));
        ring.push(3).unwrap();
        assert_eq!(ring.head(), 1);
        assert_eq!(ring.pop(), Ok(2));
        assert_eq!(ring.pop(), Ok(3));
        assert!(ring.is_empty());
        assert_eq!(ring.head(), ring.tail());
    }

    #[test]
    fn push_into_full_is_corruption() {
        let mut ring = Ring::new(1).unwrap();
        ring.push(7).unwrap();
        assert_eq!(
            ring.push(8),
            Err(BufferError::Corruption {
                invariant: Invariant::PutIntoOccupied,
                index: 0,
            })
        );
        // the occupied slot is left alone
        assert_eq!(ring.pop(), Ok(7));
    }

    #[test]
    fn pop_from_empty_is_corruption() {
        let mut ring = Ring::<i64>::new(3).unwrap();
        let err = ring.pop().unwrap_err();
        assert!(err.is_corruption());
        assert_eq!(ring.len(), 0);
        assert_eq!(ring.tail(), 0);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Push(i64),
        Pop,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![any::<i64>().prop_map(Op::Push), Just(Op::Pop)]
    }

    proptest! {
        // Unguarded ops: the ring must flag every push on full and every pop
        // on empty, and otherwise behave like a FIFO queue.
        #[test]
        fn matches_fifo_model(capacity in 1usize..8, ops in prop::collection::vec(op(), 0..200)) {
            let mut ring = Ring::new(capacity).unwrap();
            let mut model = VecDeque::new();

            for op in ops {
                match op {
                    Op::Push(v) => {
                        let res = ring.push(v);
                        if model.len() == capacity {
                            prop_assert!(res.unwrap_err().is_corruption());
                        } else {
                            prop_assert!(res.is_ok());
                            model.push_back(v);
                        }
                    }
                    Op::Pop => {
                        let res = ring.pop();
                        match model.pop_front() {
                            Some(expected) => prop_assert_eq!(res, Ok(expected)),
                            None => prop_assert!(res.unwrap_err().is_corruption()),
                        }
                    }
                }

                prop_assert!(ring.len() <= ring.capacity());
                prop_assert_eq!(ring.len(), model.len());
                prop_assert_eq!(ring.occupied(), ring.len());
                prop_assert_eq!((ring.tail() + ring.len()) % capacity, ring.head());
            }
        }
    }
}
