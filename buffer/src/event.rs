use std::fmt;

use crate::primitives::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Producer,
    Consumer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Producer => f.write_str("Producer"),
            Self::Consumer => f.write_str("Consumer"),
        }
    }
}

/// Something observable a task did during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Produced { producer: usize, value: i64 },
    Consumed { consumer: usize, value: i64 },
    Joined { role: Role, id: usize },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Produced { producer, value } => write!(f, "{producer} Produced: {value}"),
            Self::Consumed { consumer, value } => write!(f, "{consumer} Consumed: {value}"),
            Self::Joined { role, id } => write!(f, "{role} thread {id} joined."),
        }
    }
}

/// Receives events from every task of a run, from many threads at once.
pub trait EventSink: Sync {
    fn record(&self, event: Event);
}

/// Drops everything.
#[derive(Debug, Default)]
pub struct Discard;

impl EventSink for Discard {
    fn record(&self, _event: Event) {}
}

/// Keeps every event in arrival order.
#[derive(Debug)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for Recorder {
    fn record(&self, event: Event) {
        self.events.lock().push(event);
    }
}
