use tracing::debug;

use super::Item;
use crate::{
    buffer::BoundedBuffer,
    error::Result,
    event::{Event, EventSink},
};

#[derive(Debug)]
pub struct Consumer {
    id: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerReport {
    pub id: usize,
    pub consumed: Vec<i64>,
    pub sentinels: usize,
}

impl Consumer {
    pub fn new(id: usize) -> Self {
        Self { id }
    }

    /// Takes items until the first `Shutdown`, which is swallowed, not forwarded.
    pub fn run(
        self,
        buffer: &BoundedBuffer<Item>,
        sink: &dyn EventSink,
    ) -> Result<ConsumerReport> {
        debug!(consumer = self.id, "started");
        let mut consumed = Vec::new();
        let mut sentinels = 0;
        loop {
            match buffer.take()? {
                Item::Value(value) => {
                    sink.record(Event::Consumed {
                        consumer: self.id,
                        value,
                    });
                    consumed.push(value);
                }
                Item::Shutdown => {
                    sentinels += 1;
                    break;
                }
            }
        }
        debug!(consumer = self.id, consumed = consumed.len(), "done");
        Ok(ConsumerReport {
            id: self.id,
            consumed,
            sentinels,
        })
    }
}

#[cfg(test)]
mod test {
    use super::Consumer;
    use crate::{
        backend::Strategy,
        buffer::BoundedBuffer,
        event::{Event, Recorder},
        task::Item,
    };

    #[test]
    fn stops_at_first_sentinel() {
        let buffer = BoundedBuffer::new(4, Strategy::Monitor).unwrap();
        buffer.put(Item::Value(1)).unwrap();
        buffer.put(Item::Value(2)).unwrap();
        buffer.put(Item::Shutdown).unwrap();
        buffer.put(Item::Value(3)).unwrap();

        let sink = Recorder::new();
        let report = Consumer::new(9).run(&buffer, &sink).unwrap();
        assert_eq!(report.consumed, vec![1, 2]);
        assert_eq!(report.sentinels, 1);
        assert_eq!(buffer.take(), Ok(Item::Value(3)));
        assert_eq!(
            sink.events(),
            vec![
                Event::Consumed { consumer: 9, value: 1 },
                Event::Consumed { consumer: 9, value: 2 },
            ]
        );
    }
}
