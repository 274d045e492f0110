//! Generate inputs that systematically cover the k-paths of a grammar.
//!
//! Use it like so:
//! ```no_run
//! # use kpath_fuzz::{grammar::Grammar, fuzzer::KPathFuzzer};
//! // First, load a grammar from disk
//! let grammar = Grammar::builder()
//!     .json_grammar("my-grammar.json").unwrap()
//!     .build().unwrap();
//!
//! // Then, generate inputs until every k-path has been used once.
//! let mut fuzzer = KPathFuzzer::builder(grammar).kcov(2).build().unwrap();
//!
//! while fuzzer.remaining_k_paths() > 0 {
//!     println!("{}", fuzzer.fuzz());
//! }
//! ```
//!
//! Every tree is grown breadth-first from the start symbol. When a node is visited and
//! there is an uncovered k-path for its symbol, the path is consumed and its expansions
//! are applied to the node. Otherwise an alternative is picked at random from a grammar
//! that depends on the depth of the node:
//! - below `min_depth` only the most expensive alternatives are allowed,
//! - from `max_depth` on only the cheapest alternatives are allowed,
//! - in between every alternative is allowed.

mod config;

pub use config::*;

use std::collections::VecDeque;
use std::io::Write;

use rand::{rngs::StdRng, seq::IndexedRandom, SeedableRng};

use crate::{
    analysis::{Bias, CostTable, KPath, KPathGenerator, KPathPool},
    error::Error,
    grammar::{Expansion, Grammar, Symbol},
    tree::{DerivationTree, NodePath},
};

/// A k-path whose first expansion is not an alternative of the node it was drawn for.
#[derive(Debug, thiserror::Error)]
#[error("k-path does not apply to {0}")]
struct InconsistentPath(String);

/// The grammars a node can be expanded with, selected by its depth.
struct DepthGrammars {
    unrestricted: Grammar,
    minimizing: Grammar,
    maximizing: Grammar,
    min_depth: usize,
    max_depth: usize,
}

impl DepthGrammars {
    fn for_depth(&self, depth: usize) -> &Grammar {
        if depth < self.min_depth {
            &self.maximizing
        } else if depth < self.max_depth {
            &self.unrestricted
        } else {
            &self.minimizing
        }
    }
}

/// Create the node for one symbol of an expansion.
/// Defined non-terminals await expansion, everything else is a terminal leaf.
fn symbol_node(grammar: &Grammar, symbol: &Symbol) -> DerivationTree {
    match symbol.as_nonterminal() {
        Some(nonterm) if grammar.contains(nonterm.as_str()) => DerivationTree::unexpanded(nonterm.as_str()),
        _ => DerivationTree::leaf(symbol.as_str()),
    }
}

/// The unexpanded nodes of a forced `subtree` attached at `path` and `depth`, tagged
/// with their own depth.
fn pending_nodes(subtree: &DerivationTree, depth: usize, path: &[usize]) -> Vec<(usize, NodePath)> {
    subtree
        .unexpanded_nodes()
        .into_iter()
        .map(|(level, relative)| {
            let mut absolute = path.to_vec();
            absolute.extend(relative);
            (depth + level, absolute)
        })
        .collect()
}

/// The KPathFuzzer generates derivation trees that cover the k-paths of a grammar
/// while keeping their depth within configurable bounds.
pub struct KPathFuzzer {
    grammars: DepthGrammars,
    costs: CostTable,
    kcov: usize,
    uncovered: KPathPool,
    rng: StdRng,
}

impl KPathFuzzer {
    /// Analyze `grammar` and create a fuzzer for it.
    ///
    /// Fails if `config.kcov` is 0 or `config.min_depth` exceeds `config.max_depth`.
    pub fn new(grammar: Grammar, config: FuzzerConfig) -> Result<Self, Error> {
        config.check()?;

        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);

        tracing::info!("Computing costs...");
        let costs = CostTable::new(&grammar);

        tracing::info!("Computing min and max grammars...");
        let minimizing = costs.biased_grammar(&grammar, Bias::Minimize);
        let maximizing = costs.biased_grammar(&grammar, Bias::Maximize);

        tracing::info!("Computing k-paths...");
        let mut uncovered = KPathGenerator::new(&grammar).paths(config.kcov)?;
        uncovered.shuffle(&mut rng);
        tracing::info!("Found {} k-paths with k <= {}", uncovered.remaining(), config.kcov);

        Ok(Self {
            grammars: DepthGrammars {
                unrestricted: grammar,
                minimizing,
                maximizing,
                min_depth: config.min_depth,
                max_depth: config.max_depth,
            },
            costs,
            kcov: config.kcov,
            uncovered,
            rng,
        })
    }

    /// Configure a new fuzzer for `grammar`.
    pub fn builder(grammar: Grammar) -> FuzzerBuilder {
        FuzzerBuilder::new(grammar)
    }

    /// Re-seed the RNG.
    pub fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// The grammar the fuzzer was created with.
    pub fn grammar(&self) -> &Grammar {
        &self.grammars.unrestricted
    }

    /// The grammar used from `max_depth` on.
    pub fn minimizing_grammar(&self) -> &Grammar {
        &self.grammars.minimizing
    }

    /// The grammar used below `min_depth`.
    pub fn maximizing_grammar(&self) -> &Grammar {
        &self.grammars.maximizing
    }

    /// The grammar a node at `depth` gets expanded with when no k-path is forced.
    pub fn grammar_for_depth(&self, depth: usize) -> &Grammar {
        self.grammars.for_depth(depth)
    }

    /// The costs of the grammar.
    pub fn costs(&self) -> &CostTable {
        &self.costs
    }

    /// The configuration the fuzzer runs with. The seed is not retained.
    pub fn config(&self) -> FuzzerConfig {
        FuzzerConfig {
            kcov: self.kcov,
            min_depth: self.grammars.min_depth,
            max_depth: self.grammars.max_depth,
            seed: None,
        }
    }

    /// The number of k-paths that haven't been used yet.
    pub fn remaining_k_paths(&self) -> usize {
        self.uncovered.remaining()
    }

    /// The k-paths that haven't been used yet.
    pub fn uncovered_k_paths(&self) -> &KPathPool {
        &self.uncovered
    }

    /// Replace the pool of uncovered k-paths, e.g. with an earlier snapshot
    /// obtained from [`KPathFuzzer::uncovered_k_paths`].
    pub fn restore_k_paths(&mut self, pool: KPathPool) {
        self.uncovered = pool;
    }

    /// Generate one derivation tree from the start symbol.
    pub fn fuzz_tree(&mut self) -> DerivationTree {
        let mut root = DerivationTree::unexpanded(self.grammars.unrestricted.start_symbol().as_str());
        self.expand(&mut root);
        root
    }

    /// Generate one input.
    pub fn fuzz(&mut self) -> String {
        self.fuzz_tree().to_string()
    }

    /// Generate one input and write it to the given output stream `stream`.
    /// Returns the number of bytes written to `stream`.
    pub fn fuzz_into<S: Write>(&mut self, stream: &mut S) -> std::io::Result<usize> {
        let input = self.fuzz();
        stream.write_all(input.as_bytes())?;
        Ok(input.len())
    }

    /// Expand every unexpanded node of a partial tree. Each of them is treated
    /// like the root of a fresh derivation.
    pub fn complete_tree(&mut self, mut tree: DerivationTree) -> DerivationTree {
        for (_, path) in tree.unexpanded_nodes() {
            if let Some(node) = tree.node_at_mut(&path) {
                self.expand(node);
            }
        }

        tree
    }

    /// Apply the expansions of `steps` to the unexpanded `node`.
    /// The first step must be an alternative of `node`. Later steps are applied to every
    /// child they are an alternative of, other children stay unexpanded.
    fn force_expansion(&self, node: &mut DerivationTree, steps: &[Expansion]) -> Result<(), InconsistentPath> {
        let Some((expansion, rest)) = steps.split_first() else {
            return Ok(());
        };

        let grammar = &self.grammars.unrestricted;

        if !grammar.get(node.symbol()).is_some_and(|alternatives| alternatives.contains(expansion)) {
            return Err(InconsistentPath(node.symbol().to_string()));
        }

        let mut children = Vec::with_capacity(expansion.len());

        for symbol in expansion.symbols() {
            let mut child = symbol_node(grammar, symbol);

            if !child.is_expanded() && !rest.is_empty() {
                // The next step may belong to a sibling
                if let Err(err) = self.force_expansion(&mut child, rest) {
                    tracing::debug!("Leaving child unexpanded: {}", err);
                }
            }

            children.push(child);
        }

        node.set_children(Some(children));
        Ok(())
    }

    /// Build the subtree that realizes `path` below a node of `symbol`.
    fn apply_k_path(&self, symbol: &str, path: &KPath) -> Result<DerivationTree, InconsistentPath> {
        let mut subtree = DerivationTree::unexpanded(symbol);
        self.force_expansion(&mut subtree, path.expansions())?;
        Ok(subtree)
    }

    /// Pick a random alternative for a node at `depth` and return its children.
    fn random_children(&mut self, symbol: &str, depth: usize) -> Vec<DerivationTree> {
        let grammar = self.grammars.for_depth(depth);

        let Some(expansion) = grammar.get(symbol).and_then(|alternatives| alternatives.choose(&mut self.rng)) else {
            tracing::warn!("{} has no alternatives, treating it as a terminal", symbol);
            return Vec::new();
        };

        expansion
            .symbols()
            .iter()
            .map(|symbol| symbol_node(&self.grammars.unrestricted, symbol))
            .collect()
    }

    /// Grow the subtree at `root` breadth-first until no unexpanded node is left.
    /// Depths are counted from `root`.
    fn expand(&mut self, root: &mut DerivationTree) {
        let mut queue = VecDeque::from([(0usize, NodePath::new())]);

        while let Some((depth, path)) = queue.pop_front() {
            let Some(node) = root.node_at_mut(&path) else {
                continue;
            };

            if node.is_expanded() {
                continue;
            }

            if !self.grammars.unrestricted.contains(node.symbol()) {
                node.set_children(Some(Vec::new()));
                continue;
            }

            if depth < self.grammars.max_depth {
                if let Some(kpath) = self.uncovered.pop(node.symbol()) {
                    match self.apply_k_path(node.symbol(), &kpath) {
                        Ok(subtree) => {
                            queue.extend(pending_nodes(&subtree, depth, &path));

                            node.set_children(subtree.into_children());
                            continue;
                        },
                        Err(err) => tracing::debug!("Dropping k-path: {}", err),
                    }
                }
            }

            let children = self.random_children(node.symbol(), depth);

            for (index, child) in children.iter().enumerate() {
                if !child.is_expanded() {
                    let mut child_path = path.clone();
                    child_path.push(index);
                    queue.push_back((depth + 1, child_path));
                }
            }

            node.set_children(Some(children));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::test_grammars::expr_grammar;
    use proptest::prelude::*;

    fn fuzzer(kcov: usize, min_depth: usize, max_depth: usize) -> KPathFuzzer {
        KPathFuzzer::builder(expr_grammar())
            .kcov(kcov)
            .min_depth(min_depth)
            .max_depth(max_depth)
            .seed(1337)
            .build()
            .unwrap()
    }

    fn exhaust(fuzzer: &mut KPathFuzzer) {
        for _ in 0..10_000 {
            if fuzzer.remaining_k_paths() == 0 {
                return;
            }
            fuzzer.fuzz();
        }
        panic!("k-paths were not covered");
    }

    #[test]
    fn test_alphabet() {
        let mut fuzzer = fuzzer(2, 1, 10);

        for _ in 0..100 {
            let input = fuzzer.fuzz();
            assert!(!input.is_empty());
            assert!(input.chars().all(|c| c.is_ascii_digit() || "+*()".contains(c)), "{}", input);
        }
    }

    #[test]
    fn test_trees_are_valid() {
        let mut fuzzer = fuzzer(3, 2, 8);

        for _ in 0..100 {
            let tree = fuzzer.fuzz_tree();
            assert_eq!(tree.symbol(), "<start>");
            assert!(tree.is_valid(fuzzer.grammar()));
            assert!(tree.unexpanded_nodes().is_empty());
        }
    }

    #[test]
    fn test_coverage_progress() {
        let mut fuzzer = fuzzer(2, 0, 10);
        let total = KPathGenerator::new(fuzzer.grammar()).paths(2).unwrap().remaining();
        assert_eq!(fuzzer.remaining_k_paths(), total);

        let mut last = total;

        for _ in 0..1000 {
            fuzzer.fuzz();
            let remaining = fuzzer.remaining_k_paths();
            assert!(remaining <= last);
            last = remaining;
        }

        assert_eq!(last, 0);
    }

    #[test]
    fn test_first_tree_covers_start() {
        let mut fuzzer = fuzzer(1, 0, 10);
        fuzzer.fuzz();
        assert!(!fuzzer.uncovered_k_paths().has_paths("<start>"));
    }

    #[test]
    fn test_invalid_config() {
        let result = KPathFuzzer::builder(expr_grammar()).kcov(0).build();
        assert!(matches!(result, Err(Error::InvalidArgument(_))));

        let result = KPathFuzzer::builder(expr_grammar()).min_depth(5).max_depth(4).build();
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_depth_grammars() {
        let fuzzer = fuzzer(1, 2, 4);
        assert_eq!(fuzzer.grammar_for_depth(0), fuzzer.maximizing_grammar());
        assert_eq!(fuzzer.grammar_for_depth(1), fuzzer.maximizing_grammar());
        assert_eq!(fuzzer.grammar_for_depth(2), fuzzer.grammar());
        assert_eq!(fuzzer.grammar_for_depth(3), fuzzer.grammar());
        assert_eq!(fuzzer.grammar_for_depth(4), fuzzer.minimizing_grammar());
        assert_eq!(fuzzer.grammar_for_depth(100), fuzzer.minimizing_grammar());
    }

    #[test]
    fn test_depth_bounds() {
        let (min_depth, max_depth) = (4, 6);
        let mut fuzzer = fuzzer(1, min_depth, max_depth);
        exhaust(&mut fuzzer);

        for _ in 0..50 {
            let tree = fuzzer.fuzz_tree();
            // <expr> is the most expensive symbol that can occur at max_depth
            assert!(tree.height() > min_depth);
            assert!(tree.height() <= max_depth + 5);
        }
    }

    /// A chain where only `<c>` has a choice: the cheap `z` or the longer `<d>`.
    fn chain_grammar() -> Grammar {
        Grammar::from_strings(
            [
                ("<start>", vec!["<a>"]),
                ("<a>", vec!["<b>x"]),
                ("<b>", vec!["<c>"]),
                ("<c>", vec!["<d>", "z"]),
                ("<d>", vec!["w"]),
            ],
            "<start>",
        )
        .unwrap()
    }

    #[test]
    fn test_pending_nodes_keep_their_depth() {
        let fuzzer = KPathFuzzer::builder(chain_grammar()).kcov(3).build().unwrap();
        let paths = KPathGenerator::new(fuzzer.grammar()).paths_of_length(3).unwrap();
        let kpath = &paths.get("<start>")[0];

        let subtree = fuzzer.apply_k_path("<start>", kpath).unwrap();
        assert_eq!(subtree.to_string(), "<c>x");
        assert_eq!(pending_nodes(&subtree, 2, &[0, 1]), vec![(5, vec![0, 1, 0, 0, 0])]);
    }

    #[test]
    fn test_forced_path_depth_drives_bias() {
        // After the 3-path at the root <c> sits at depth 3, where only the cheapest alternative is allowed
        for seed in 0..20 {
            let grammar = chain_grammar();
            let pool = KPathGenerator::new(&grammar).paths_of_length(3).unwrap();

            let mut fuzzer = KPathFuzzer::builder(grammar).kcov(3).max_depth(3).seed(seed).build().unwrap();
            fuzzer.restore_k_paths(pool);

            assert_eq!(fuzzer.fuzz(), "zx");
            assert!(!fuzzer.uncovered_k_paths().has_paths("<start>"));
        }
    }

    #[test]
    fn test_deterministic() {
        let mut a = fuzzer(2, 1, 6);
        let mut b = fuzzer(2, 1, 6);

        for _ in 0..20 {
            assert_eq!(a.fuzz(), b.fuzz());
        }
    }

    #[test]
    fn test_complete_tree() {
        let partial = DerivationTree::with_children(
            "<start>",
            vec![DerivationTree::with_children(
                "<expr>",
                vec![
                    DerivationTree::unexpanded("<term>"),
                    DerivationTree::leaf("+"),
                    DerivationTree::unexpanded("<expr>"),
                ],
            )],
        );

        let mut fuzzer = fuzzer(1, 0, 5);
        let tree = fuzzer.complete_tree(partial);

        assert!(tree.unexpanded_nodes().is_empty());
        assert!(tree.is_valid(fuzzer.grammar()));
        assert!(tree.to_string().contains('+'));
    }

    #[test]
    fn test_snapshot_and_restore() {
        let mut fuzzer = fuzzer(2, 0, 10);
        let snapshot = fuzzer.uncovered_k_paths().clone();

        fuzzer.fuzz();
        assert!(fuzzer.remaining_k_paths() < snapshot.remaining());

        fuzzer.restore_k_paths(snapshot.clone());
        assert_eq!(fuzzer.uncovered_k_paths(), &snapshot);
    }

    #[test]
    fn test_foreign_path_falls_back() {
        let foreign = Grammar::from_strings([("<start>", vec!["nothing to see"])], "<start>").unwrap();
        let pool = KPathGenerator::new(&foreign).paths(1).unwrap();

        let mut fuzzer = fuzzer(1, 0, 10);
        fuzzer.restore_k_paths(pool);
        assert_eq!(fuzzer.remaining_k_paths(), 1);

        let tree = fuzzer.fuzz_tree();
        assert!(tree.is_valid(fuzzer.grammar()));
        assert_eq!(fuzzer.remaining_k_paths(), 0);
    }

    #[test]
    fn test_undefined_nonterminal() {
        let grammar = Grammar::from_strings([("<start>", vec!["<nowhere>x"])], "<start>").unwrap();
        let mut fuzzer = KPathFuzzer::builder(grammar).kcov(2).build().unwrap();
        assert_eq!(fuzzer.fuzz(), "<nowhere>x");
    }

    #[test]
    fn test_fuzz_into() {
        let mut fuzzer = KPathFuzzer::builder(Grammar::from_strings([("<start>", vec!["abc"])], "<start>").unwrap())
            .build()
            .unwrap();
        let mut buffer = Vec::new();
        assert_eq!(fuzzer.fuzz_into(&mut buffer).unwrap(), 3);
        assert_eq!(buffer, b"abc");
    }

    proptest! {
        #[test]
        fn prop_trees_are_complete_and_valid(seed in any::<u64>(), kcov in 1usize..=3, max_depth in 0usize..8) {
            let mut fuzzer = KPathFuzzer::builder(expr_grammar())
                .kcov(kcov)
                .max_depth(max_depth)
                .seed(seed)
                .build()
                .unwrap();

            for _ in 0..5 {
                let tree = fuzzer.fuzz_tree();
                prop_assert!(tree.unexpanded_nodes().is_empty());
                prop_assert!(tree.is_valid(fuzzer.grammar()));
            }
        }
    }
}
