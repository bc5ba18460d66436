use std::{fmt, str::FromStr};

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Where producers get their payloads from. Irrelevant to coordination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValueSource {
    /// `id * quota + i` per producer, or the global ticket when the quota is shared.
    #[default]
    Counter,
    /// Uniform `i64`s from a per-producer RNG derived from `seed`.
    Random { seed: u64 },
}

impl ValueSource {
    /// Counter values start at `producer * stride`.
    pub fn generator(&self, producer: usize, stride: usize) -> Generator {
        match *self {
            Self::Counter => Generator::Counter {
                base: (producer as i64).wrapping_mul(stride as i64),
            },
            Self::Random { seed } => {
                Generator::Random(StdRng::seed_from_u64(seed ^ (producer as u64).rotate_left(32)))
            }
        }
    }
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Counter => f.write_str("counter"),
            Self::Random { seed } => write!(f, "random(seed={seed})"),
        }
    }
}

impl FromStr for ValueSource {
    type Err = String;

    /// Parses the kind only; a random source starts with seed 0.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "counter" => Ok(Self::Counter),
            "random" => Ok(Self::Random { seed: 0 }),
            _ => Err(format!("Invalid source: {s}. Valid options: counter, random")),
        }
    }
}

#[derive(Debug)]
pub enum Generator {
    Counter { base: i64 },
    Random(StdRng),
}

impl Generator {
    /// Value for the `index`-th item, where `index` is either the producer's
    /// own count or a shared ticket.
    pub fn next(&mut self, index: usize) -> i64 {
        match self {
            Self::Counter { base } => base.wrapping_add(index as i64),
            Self::Random(rng) => rng.gen(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::ValueSource;

    #[test]
    fn counter_bases_do_not_overlap() {
        let mut first = ValueSource::Counter.generator(0, 5);
        let mut second = ValueSource::Counter.generator(1, 5);
        let a: Vec<_> = (0..5).map(|i| first.next(i)).collect();
        let b: Vec<_> = (0..5).map(|i| second.next(i)).collect();
        assert_eq!(a, vec![0, 1, 2, 3, 4]);
        assert_eq!(b, vec![5, 6, 7, 8, 9]);
    }

    #[test]
    fn random_is_reproducible() {
        let source = ValueSource::Random { seed: 42 };
        let mut a = source.generator(3, 10);
        let mut b = source.generator(3, 10);
        for i in 0..10 {
            assert_eq!(a.next(i), b.next(i));
        }
    }

    #[test]
    fn parse() {
        assert_eq!("Counter".parse(), Ok(ValueSource::Counter));
        assert_eq!("random".parse(), Ok(ValueSource::Random { seed: 0 }));
        assert!("dice".parse::<ValueSource>().is_err());
    }
}
