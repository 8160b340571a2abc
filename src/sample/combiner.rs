use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::Sample;
use crate::config::{CombinePolicy, RunConfig};
use crate::core::error::{Error, Result};

/// Selects, reorders and merges samples before they are run.
#[derive(Debug, Clone)]
pub struct SampleCombiner {
    policy: CombinePolicy,
    case_numbering: bool,
    test_index: usize,
    seed: u64,
}

impl SampleCombiner {
    /// Create a combiner with an explicit shuffle seed.
    pub fn new(policy: CombinePolicy, seed: u64) -> Self {
        Self {
            policy,
            case_numbering: false,
            test_index: 0,
            seed,
        }
    }

    /// Create a combiner from run settings, drawing a seed when none is configured.
    pub fn from_config(run: &RunConfig) -> Self {
        let seed = run.seed.unwrap_or_else(rand::random);
        Self::new(run.combine, seed)
            .case_numbering(run.case_numbering)
            .test_index(run.test_index)
    }

    /// Prefix inputs with the number of test cases.
    pub fn case_numbering(mut self, enabled: bool) -> Self {
        self.case_numbering = enabled;
        self
    }

    /// Keep only the given 1-based sample; 0 keeps all of them.
    pub fn test_index(mut self, index: usize) -> Self {
        self.test_index = index;
        self
    }

    /// Seed used by the shuffle policy.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Apply selection, shuffling, concatenation and case numbering.
    pub fn combine(&self, samples: Vec<Sample>) -> Result<Vec<Sample>> {
        let mut samples = self.select(samples)?;

        if self.policy == CombinePolicy::Shuffle {
            tracing::info!(seed = self.seed, "shuffling samples");
            let mut rng = StdRng::seed_from_u64(self.seed);
            samples.shuffle(&mut rng);
        }

        if self.policy.combines() {
            return Ok(vec![self.concatenate(&samples)]);
        }

        if self.case_numbering {
            for sample in &mut samples {
                sample.input = format!("1\n{}", sample.input);
            }
        }
        Ok(samples)
    }

    fn select(&self, samples: Vec<Sample>) -> Result<Vec<Sample>> {
        if self.test_index == 0 {
            return Ok(samples);
        }
        let count = samples.len();
        samples
            .into_iter()
            .nth(self.test_index - 1)
            .map(|sample| vec![sample])
            .ok_or(Error::TestIndexOutOfRange {
                index: self.test_index,
                count,
            })
    }

    fn concatenate(&self, samples: &[Sample]) -> Sample {
        let input = join_trimmed(samples.iter().map(|s| s.input.as_str()));
        let expected = join_trimmed(samples.iter().map(|s| s.expected.as_str()));

        if self.case_numbering {
            Sample::new(format!("{}\n{}", samples.len(), input), expected)
        } else {
            Sample::new(input, expected)
        }
    }
}

fn join_trimmed<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts.collect::<Vec<_>>().join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<Sample> {
        vec![
            Sample::new("1 2", "3"),
            Sample::new("4 5", "9"),
            Sample::new("10 20", "30"),
        ]
    }

    #[test]
    fn test_none_is_identity() {
        let combiner = SampleCombiner::new(CombinePolicy::None, 0);
        assert_eq!(combiner.combine(samples()).unwrap(), samples());
    }

    #[test]
    fn test_ordered_concatenates() {
        let combiner = SampleCombiner::new(CombinePolicy::Ordered, 0);
        let combined = combiner
            .combine(vec![Sample::new("i1", "o1"), Sample::new("i2", "o2")])
            .unwrap();
        assert_eq!(combined, vec![Sample::new("i1\ni2", "o1\no2")]);
    }

    #[test]
    fn test_ordered_trims_around_empty_outputs() {
        let combiner = SampleCombiner::new(CombinePolicy::Ordered, 0);
        let combined = combiner
            .combine(vec![Sample::new("a", ""), Sample::new("b", "")])
            .unwrap();
        assert_eq!(combined, vec![Sample::new("a\nb", "")]);
    }

    #[test]
    fn test_case_numbering_without_combination() {
        let combiner = SampleCombiner::new(CombinePolicy::None, 0).case_numbering(true);
        let combined = combiner.combine(samples()).unwrap();
        assert_eq!(combined.len(), 3);
        assert!(combined.iter().all(|s| s.input.starts_with("1\n")));
        assert_eq!(combined[2].input, "1\n10 20");
        assert_eq!(combined[2].expected, "30");
    }

    #[test]
    fn test_case_numbering_with_ordered() {
        let combiner = SampleCombiner::new(CombinePolicy::Ordered, 0).case_numbering(true);
        let combined = combiner.combine(samples()).unwrap();
        assert_eq!(combined, vec![Sample::new("3\n1 2\n4 5\n10 20", "3\n9\n30")]);
    }

    #[test]
    fn test_shuffle_is_deterministic_for_seed() {
        let many: Vec<Sample> = (0..20)
            .map(|i| Sample::new(i.to_string(), (i * 2).to_string()))
            .collect();

        let a = SampleCombiner::new(CombinePolicy::Shuffle, 1234)
            .combine(many.clone())
            .unwrap();
        let b = SampleCombiner::new(CombinePolicy::Shuffle, 1234)
            .combine(many.clone())
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn test_shuffle_keeps_pairs_aligned() {
        let many: Vec<Sample> = (0..10)
            .map(|i| Sample::new(format!("in{i}"), format!("out{i}")))
            .collect();
        let combined = SampleCombiner::new(CombinePolicy::Shuffle, 99)
            .combine(many)
            .unwrap();

        let inputs: Vec<&str> = combined[0].input.lines().collect();
        let outputs: Vec<&str> = combined[0].expected.lines().collect();
        assert_eq!(inputs.len(), 10);
        for (i, o) in inputs.iter().zip(&outputs) {
            assert_eq!(&i[2..], &o[3..]);
        }
    }

    #[test]
    fn test_select_single_test() {
        let combiner = SampleCombiner::new(CombinePolicy::None, 0).test_index(2);
        assert_eq!(
            combiner.combine(samples()).unwrap(),
            vec![Sample::new("4 5", "9")]
        );
    }

    #[test]
    fn test_select_out_of_range() {
        let combiner = SampleCombiner::new(CombinePolicy::None, 0).test_index(4);
        let err = combiner.combine(samples()).unwrap_err();
        assert!(matches!(err, Error::TestIndexOutOfRange { index: 4, count: 3 }));
    }

    #[test]
    fn test_from_config_uses_configured_seed() {
        let run = RunConfig {
            seed: Some(77),
            ..Default::default()
        };
        assert_eq!(SampleCombiner::from_config(&run).seed(), 77);
    }
}
