//! Bounded multi-producer/multi-consumer buffer with blocking `put`/`take`,
//! two interchangeable synchronization backends, and a coordinator that
//! shuts consumers down with one sentinel each.

use anyhow::bail;
use libc::c_int;

pub mod backend;
pub mod buffer;
pub mod coordinator;
pub mod error;
pub mod event;
pub mod primitives;
pub mod ring;
pub mod task;

pub use backend::Strategy;
pub use buffer::BoundedBuffer;
pub use coordinator::{run, Config, Coordinator, Phase, QuotaMode, RunReport};
pub use error::{BufferError, Invariant, Result};
pub use event::{Event, EventSink, Role};
pub use task::{Item, ValueSource};

/// Turns a pthread-style status code into an error naming the operation.
pub trait CheckOk<R> {
    fn r(self, op: &str) -> std::result::Result<R, anyhow::Error>;
}

impl CheckOk<()> for c_int {
    fn r(self, op: &str) -> std::result::Result<(), anyhow::Error> {
        if self != 0 {
            bail!("Operation {op} failed: Code {self}");
        }
        Ok(())
    }
}
