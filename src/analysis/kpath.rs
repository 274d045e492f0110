use indexmap::IndexMap;
use rand::{seq::SliceRandom, Rng};

use crate::{
    error::Error,
    grammar::{Expansion, Grammar, NonTerminal},
};

/// Beyond this length the number of paths tends to explode.
pub const KPATH_WARN_LENGTH: usize = 5;

/// A chain of nested expansion choices. The expansion at position `i + 1`
/// expands a non-terminal that occurs in the expansion at position `i`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KPath(Vec<Expansion>);

impl KPath {
    /// The expansions of this path from the outermost to the innermost.
    pub fn expansions(&self) -> &[Expansion] {
        &self.0
    }

    /// The number of expansions in this path.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for enumerated paths.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Enumerates the k-paths of a grammar.
pub struct KPathGenerator<'g> {
    grammar: &'g Grammar,
}

impl<'g> KPathGenerator<'g> {
    /// Create a generator for `grammar`.
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
        }
    }

    /// All paths of `depth + 1` expansions that start with `expansion`.
    fn extend(&self, expansion: &Expansion, depth: usize) -> Vec<Vec<Expansion>> {
        if depth == 0 {
            return vec![vec![expansion.clone()]];
        }

        let mut paths = Vec::new();

        for nonterm in expansion.nonterminals() {
            // Undefined non-terminals are terminals
            let Some(alternatives) = self.grammar.get(nonterm.as_str()) else {
                continue;
            };

            for alternative in alternatives {
                for tail in self.extend(alternative, depth - 1) {
                    let mut path = Vec::with_capacity(tail.len() + 1);
                    path.push(expansion.clone());
                    path.extend(tail);
                    paths.push(path);
                }
            }
        }

        paths
    }

    /// The paths of exactly `k` expansions, per non-terminal they start at.
    pub fn paths_of_length(&self, k: usize) -> Result<KPathPool, Error> {
        if k < 1 {
            return Err(Error::InvalidArgument("k-paths must have a length of at least 1".to_string()));
        }

        let mut pool = KPathPool::default();

        for (nonterm, expansions) in self.grammar.rules() {
            let paths = pool.paths.entry(nonterm.clone()).or_default();

            for expansion in expansions {
                paths.extend(self.extend(expansion, k - 1).into_iter().map(KPath));
            }
        }

        Ok(pool)
    }

    /// The union of all paths of length `1..=max_k`, per non-terminal they start at.
    pub fn paths(&self, max_k: usize) -> Result<KPathPool, Error> {
        if max_k < 1 {
            return Err(Error::InvalidArgument("max_k must be at least 1".to_string()));
        }

        if max_k > KPATH_WARN_LENGTH {
            tracing::warn!("max_k > {} may take a long time and a lot of memory to compute if the grammar is large", KPATH_WARN_LENGTH);
        }

        let mut pool = self.paths_of_length(1)?;

        for k in 2..=max_k {
            pool.append(self.paths_of_length(k)?);
        }

        Ok(pool)
    }
}

/// The k-paths of a grammar, one stack per non-terminal the paths start at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KPathPool {
    paths: IndexMap<NonTerminal, Vec<KPath>>,
}

impl KPathPool {
    fn append(&mut self, other: KPathPool) {
        for (nonterm, mut paths) in other.paths {
            self.paths.entry(nonterm).or_default().append(&mut paths);
        }
    }

    /// The total number of paths over all non-terminals.
    pub fn remaining(&self) -> usize {
        self.paths.values().map(Vec::len).sum()
    }

    /// The paths starting at `symbol`.
    pub fn get(&self, symbol: &str) -> &[KPath] {
        self.paths.get(symbol).map_or(&[][..], Vec::as_slice)
    }

    /// True if there is at least one path starting at `symbol`.
    pub fn has_paths(&self, symbol: &str) -> bool {
        !self.get(symbol).is_empty()
    }

    /// Remove and return the top path of the stack of `symbol`.
    pub fn pop(&mut self, symbol: &str) -> Option<KPath> {
        self.paths.get_mut(symbol)?.pop()
    }

    /// Randomize the order of every stack.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for paths in self.paths.values_mut() {
            paths.shuffle(rng);
        }
    }

    /// Iterate over the non-terminals and their remaining paths.
    pub fn iter(&self) -> impl Iterator<Item = (&NonTerminal, &[KPath])> {
        self.paths.iter().map(|(nonterm, paths)| (nonterm, paths.as_slice()))
    }
}
