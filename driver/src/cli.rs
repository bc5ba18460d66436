use bounded_buffer::{Config, QuotaMode, Strategy, ValueSource};
use clap::Parser;

/// Bounded-buffer producer/consumer run
#[derive(Debug, Clone, Parser)]
pub struct Args {
    /// Number of producer threads
    pub num_producers: usize,
    /// Number of consumer threads
    pub num_consumers: usize,
    /// Buffer capacity in slots
    pub buffer_capacity: usize,
    /// Items each producer makes
    pub items_per_producer: usize,

    /// Synchronization backend: monitor or semaphore
    #[arg(long, default_value = "monitor")]
    pub strategy: Strategy,
    /// per-producer quotas, or one shared pool of producers * items tickets
    #[arg(long, default_value = "per-producer")]
    pub quota_mode: QuotaMode,
    /// Payload source: counter or random
    #[arg(long, default_value = "counter")]
    pub source: ValueSource,
    /// Seed for the random source
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

impl Args {
    pub fn config(&self) -> Config {
        let source = match self.source {
            ValueSource::Random { .. } => ValueSource::Random { seed: self.seed },
            other => other,
        };
        Config::new(
            self.num_producers,
            self.num_consumers,
            self.buffer_capacity,
            self.items_per_producer,
        )
        .with_strategy(self.strategy)
        .with_quota_mode(self.quota_mode)
        .with_source(source)
    }
}

#[cfg(test)]
mod test {
    use bounded_buffer::{QuotaMode, Strategy, ValueSource};
    use clap::Parser;

    use super::Args;

    #[test]
    fn positional_arguments() {
        let args = Args::try_parse_from(["prodcon", "4", "3", "10", "5"]).unwrap();
        let config = args.config();
        assert_eq!(config.producers, 4);
        assert_eq!(config.consumers, 3);
        assert_eq!(config.capacity, 10);
        assert_eq!(config.items_per_producer, 5);
        assert_eq!(config.strategy, Strategy::Monitor);
        assert_eq!(config.quota_mode, QuotaMode::PerProducer);
    }

    #[test]
    fn options() {
        let args = Args::try_parse_from([
            "prodcon",
            "1",
            "1",
            "1",
            "1",
            "--strategy",
            "semaphore",
            "--quota-mode",
            "shared",
            "--source",
            "random",
            "--seed",
            "7",
        ])
        .unwrap();
        let config = args.config();
        assert_eq!(config.strategy, Strategy::Semaphore);
        assert_eq!(config.quota_mode, QuotaMode::Shared);
        assert_eq!(config.source, ValueSource::Random { seed: 7 });
    }

    #[test]
    fn wrong_arity_is_a_usage_error() {
        assert!(Args::try_parse_from(["prodcon", "1", "1", "1"]).is_err());
        assert!(Args::try_parse_from(["prodcon", "1", "1", "1", "1", "1"]).is_err());
    }

    #[test]
    fn negative_count_is_a_usage_error() {
        assert!(Args::try_parse_from(["prodcon", "1", "1", "1", "-3"]).is_err());
        assert!(Args::try_parse_from(["prodcon", "x", "1", "1", "1"]).is_err());
    }
}
