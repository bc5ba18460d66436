use tracing::debug;

use super::{Generator, Item, QuotaPool};
use crate::{
    buffer::BoundedBuffer,
    error::Result,
    event::{Event, EventSink},
};

/// How many items a producer is allowed to make.
#[derive(Debug, Clone, Copy)]
pub enum Quota<'a> {
    /// Independent quota, no coordination with other producers.
    Own(usize),
    /// Tickets drawn from a pool shared with the other producers.
    Shared(&'a QuotaPool),
}

#[derive(Debug)]
pub struct Producer<'a> {
    id: usize,
    quota: Quota<'a>,
    generator: Generator,
    produced: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProducerReport {
    pub id: usize,
    pub produced: Vec<i64>,
}

impl<'a> Producer<'a> {
    pub fn new(id: usize, quota: Quota<'a>, generator: Generator) -> Self {
        Self {
            id,
            quota,
            generator,
            produced: Vec::new(),
        }
    }

    /// Claims the next production slot. A shared ticket is reserved and the
    /// pool lock released before the item reaches the buffer.
    fn reserve(&self) -> Option<usize> {
        match self.quota {
            Quota::Own(quota) => (self.produced.len() < quota).then_some(self.produced.len()),
            Quota::Shared(pool) => pool.reserve(),
        }
    }

    pub fn run(
        mut self,
        buffer: &BoundedBuffer<Item>,
        sink: &dyn EventSink,
    ) -> Result<ProducerReport> {
        debug!(producer = self.id, "started");
        while let Some(index) = self.reserve() {
            let value = self.generator.next(index);
            buffer.put(Item::Value(value))?;
            sink.record(Event::Produced {
                producer: self.id,
                value,
            });
            self.produced.push(value);
        }
        debug!(producer = self.id, produced = self.produced.len(), "done");
        Ok(ProducerReport {
            id: self.id,
            produced: self.produced,
        })
    }
}
