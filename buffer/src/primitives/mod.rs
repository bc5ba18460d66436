mod condvar;
mod mutex;
mod semaphore;

pub use condvar::*;
pub use mutex::*;
pub use semaphore::*;
