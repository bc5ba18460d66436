//! Producer and consumer tasks and what flows between them.

mod consumer;
mod producer;
mod quota;
mod source;

pub use consumer::{Consumer, ConsumerReport};
pub use producer::{Producer, ProducerReport, Quota};
pub use quota::QuotaPool;
pub use source::{Generator, ValueSource};

/// Buffer payload. `Shutdown` is out of band: no produced value can equal it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Item {
    Value(i64),
    Shutdown,
}
