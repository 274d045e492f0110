use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    fuzzer::KPathFuzzer,
    grammar::Grammar,
};

/// Parameters of a [`KPathFuzzer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzerConfig {
    /// Maximal length of the k-paths that must be covered
    pub kcov: usize,
    /// Below this depth the fuzzer prefers expensive alternatives
    pub min_depth: usize,
    /// From this depth on the fuzzer prefers cheap alternatives and stops forcing k-paths
    pub max_depth: usize,
    /// Seed for the RNG. A random seed is used if this is not set.
    pub seed: Option<u64>,
}

impl Default for FuzzerConfig {
    fn default() -> Self {
        Self {
            kcov: 1,
            min_depth: 0,
            max_depth: 10,
            seed: None,
        }
    }
}

impl FuzzerConfig {
    pub(crate) fn check(&self) -> Result<(), Error> {
        if self.kcov < 1 {
            return Err(Error::InvalidArgument(format!("kcov must be at least 1 but is {}", self.kcov)));
        }

        if self.min_depth > self.max_depth {
            return Err(Error::InvalidArgument(format!(
                "min_depth ({}) must not be greater than max_depth ({})",
                self.min_depth, self.max_depth
            )));
        }

        Ok(())
    }
}

/// Configures and creates a [`KPathFuzzer`].
/// ```
/// # use kpath_fuzz::{grammar::Grammar, fuzzer::KPathFuzzer};
/// let grammar = Grammar::builder()
///     .rule("<start>", ["<digit><digit>"])
///     .rule("<digit>", ["0", "1"])
///     .build().unwrap();
/// let mut fuzzer = KPathFuzzer::builder(grammar)
///     .kcov(2)
///     .max_depth(5)
///     .seed(1234)
///     .build().unwrap();
/// assert_eq!(fuzzer.fuzz().len(), 2);
/// ```
pub struct FuzzerBuilder {
    grammar: Grammar,
    config: FuzzerConfig,
}

impl FuzzerBuilder {
    pub(crate) fn new(grammar: Grammar) -> Self {
        Self {
            grammar,
            config: FuzzerConfig::default(),
        }
    }

    /// Set the maximal length of k-paths to cover.
    pub fn kcov(mut self, kcov: usize) -> Self {
        self.config.kcov = kcov;
        self
    }

    /// Set the depth below which derivations are pushed to grow.
    pub fn min_depth(mut self, min_depth: usize) -> Self {
        self.config.min_depth = min_depth;
        self
    }

    /// Set the depth from which derivations are pushed to terminate.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Make generation deterministic.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: FuzzerConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the analyses and create the fuzzer.
    pub fn build(self) -> Result<KPathFuzzer, Error> {
        KPathFuzzer::new(self.grammar, self.config)
    }
}
