//! Drives one complete producer/consumer run.
//!
//! Producers and consumers start together and meet in the buffer. Once every
//! producer has been joined, one [`Item::Shutdown`] per consumer goes through
//! the ordinary blocking `put`, and the consumers are joined in turn.

use std::{
    fmt::{self, Display},
    str::FromStr,
    sync::Arc,
    thread::{self, Scope, ScopedJoinHandle},
};

use tracing::{debug, error, info};

use crate::{
    backend::{check_capacity, OpObserver, Strategy},
    buffer::BoundedBuffer,
    error::{BufferError, Result},
    event::{Event, EventSink, Role},
    task::{
        Consumer, ConsumerReport, Item, Producer, ProducerReport, Quota, QuotaPool, ValueSource,
    },
};

/// Whether producers count their own items or draw from one pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QuotaMode {
    #[default]
    PerProducer,
    Shared,
}

impl Display for QuotaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerProducer => f.write_str("per-producer"),
            Self::Shared => f.write_str("shared"),
        }
    }
}

impl FromStr for QuotaMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "per-producer" | "own" => Ok(Self::PerProducer),
            "shared" => Ok(Self::Shared),
            _ => Err(format!(
                "Invalid quota mode: {s}. Valid options: per-producer, shared"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub producers: usize,
    pub consumers: usize,
    pub capacity: usize,
    /// Items per producer. With [`QuotaMode::Shared`] the pool holds
    /// `producers * items_per_producer` tickets.
    pub items_per_producer: usize,
    pub strategy: Strategy,
    pub quota_mode: QuotaMode,
    pub source: ValueSource,
}

impl Config {
    pub fn new(
        producers: usize,
        consumers: usize,
        capacity: usize,
        items_per_producer: usize,
    ) -> Self {
        Self {
            producers,
            consumers,
            capacity,
            items_per_producer,
            strategy: Strategy::default(),
            quota_mode: QuotaMode::default(),
            source: ValueSource::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_quota_mode(mut self, quota_mode: QuotaMode) -> Self {
        self.quota_mode = quota_mode;
        self
    }

    pub fn with_source(mut self, source: ValueSource) -> Self {
        self.source = source;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.producers == 0 {
            return Err(BufferError::invalid_config("at least one producer is required"));
        }
        if self.consumers == 0 {
            return Err(BufferError::invalid_config("at least one consumer is required"));
        }
        check_capacity(self.capacity)?;
        if self.producers.checked_mul(self.items_per_producer).is_none() {
            return Err(BufferError::invalid_config("total item count overflows"));
        }
        Ok(())
    }

    pub fn total_items(&self) -> usize {
        self.producers * self.items_per_producer
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Running,
    DrainingProducers,
    InjectingSentinels,
    DrainingConsumers,
    Terminated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub producers: Vec<ProducerReport>,
    pub consumers: Vec<ConsumerReport>,
    pub injected_sentinels: usize,
    /// Items still in the buffer once every consumer was joined.
    pub leftover: usize,
}

impl RunReport {
    pub fn produced_values(&self) -> Vec<i64> {
        self.producers.iter().flat_map(|p| p.produced.iter().copied()).collect()
    }

    pub fn consumed_values(&self) -> Vec<i64> {
        self.consumers.iter().flat_map(|c| c.consumed.iter().copied()).collect()
    }

    pub fn consumed_sentinels(&self) -> usize {
        self.consumers.iter().map(|c| c.sentinels).sum()
    }
}

pub struct Coordinator {
    config: Config,
    phase: Phase,
    observer: Option<Arc<dyn OpObserver>>,
}

impl fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("config", &self.config)
            .field("phase", &self.phase)
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

impl Coordinator {
    /// Rejects a bad configuration before anything is allocated or spawned.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            phase: Phase::Init,
            observer: None,
        })
    }

    /// Reports every buffer operation of the run to `observer`, from inside
    /// the buffer's critical section.
    pub fn with_observer(mut self, observer: Arc<dyn OpObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn enter(&mut self, phase: Phase) {
        debug!(from = ?self.phase, to = ?phase, "phase");
        self.phase = phase;
    }

    pub fn run(&mut self, sink: &dyn EventSink) -> Result<RunReport> {
        let config = self.config.clone();
        let buffer = match &self.observer {
            Some(observer) => {
                BoundedBuffer::<Item>::observed(config.capacity, config.strategy, observer.clone())?
            }
            None => BoundedBuffer::<Item>::new(config.capacity, config.strategy)?,
        };
        let pool = QuotaPool::new(config.total_items());
        info!(
            producers = config.producers,
            consumers = config.consumers,
            capacity = buffer.capacity(),
            items = config.items_per_producer,
            strategy = %buffer.strategy(),
            quota_mode = %config.quota_mode,
            source = %config.source,
            "starting run"
        );

        let report = thread::scope(|s| {
            self.enter(Phase::Running);
            let producers: Vec<_> = (0..config.producers)
                .map(|id| {
                    // shared tickets are already unique, no per-producer offset
                    let (quota, stride) = match config.quota_mode {
                        QuotaMode::PerProducer => {
                            (Quota::Own(config.items_per_producer), config.items_per_producer)
                        }
                        QuotaMode::Shared => (Quota::Shared(&pool), 0),
                    };
                    let producer = Producer::new(id, quota, config.source.generator(id, stride));
                    let buffer = &buffer;
                    spawn(s, format!("producer-{id}"), move || producer.run(buffer, sink))
                })
                .collect();

            // consumer ids continue after the producers'
            let consumers: Vec<_> = (config.producers..config.producers + config.consumers)
                .map(|id| {
                    let consumer = Consumer::new(id);
                    let buffer = &buffer;
                    spawn(s, format!("consumer-{id}"), move || consumer.run(buffer, sink))
                })
                .collect();

            self.enter(Phase::DrainingProducers);
            let producers: Vec<ProducerReport> = producers
                .into_iter()
                .map(|handle| {
                    let report = join(handle);
                    sink.record(Event::Joined {
                        role: Role::Producer,
                        id: report.id,
                    });
                    report
                })
                .collect();
            if config.quota_mode == QuotaMode::Shared {
                debug!(issued = pool.issued(), total = pool.total(), "quota pool drained");
            }

            self.enter(Phase::InjectingSentinels);
            let mut injected_sentinels = 0;
            for _ in 0..config.consumers {
                buffer.put(Item::Shutdown).unwrap_or_else(|e| fatal(e));
                injected_sentinels += 1;
            }

            self.enter(Phase::DrainingConsumers);
            let consumers: Vec<ConsumerReport> = consumers
                .into_iter()
                .map(|handle| {
                    let report = join(handle);
                    sink.record(Event::Joined {
                        role: Role::Consumer,
                        id: report.id,
                    });
                    report
                })
                .collect();

            RunReport {
                producers,
                consumers,
                injected_sentinels,
                leftover: buffer.len(),
            }
        });

        self.enter(Phase::Terminated);
        info!(
            produced = report.produced_values().len(),
            consumed = report.consumed_values().len(),
            leftover = report.leftover,
            "run complete"
        );
        Ok(report)
    }
}

/// Validates `config` and drives it to completion.
pub fn run(config: Config, sink: &dyn EventSink) -> Result<RunReport> {
    Coordinator::new(config)?.run(sink)
}

fn spawn<'scope, 'env, R: Send + 'scope>(
    s: &'scope Scope<'scope, 'env>,
    name: String,
    task: impl FnOnce() -> Result<R> + Send + 'scope,
) -> ScopedJoinHandle<'scope, R> {
    thread::Builder::new()
        .name(name)
        .spawn_scoped(s, move || task().unwrap_or_else(|e| fatal(e)))
        .unwrap_or_else(|e| fatal(e))
}

fn join<R>(handle: ScopedJoinHandle<'_, R>) -> R {
    match handle.join() {
        Ok(report) => report,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

/// A broken buffer invariant or a task that cannot start leaves the run
/// unable to finish; there is nothing to recover.
fn fatal(err: impl Display) -> ! {
    error!("fatal: {err}");
    eprintln!("fatal: {err}");
    std::process::abort()
}
