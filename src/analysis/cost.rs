use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

use indexmap::IndexMap;

use crate::grammar::{Expansion, Grammar, NonTerminal};

/// The minimal number of expansion steps needed to derive a terminal-only string.
///
/// `Unbounded` is greater than every finite cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cost {
    /// A finite number of steps
    Finite(usize),
    /// The symbol only reaches itself without a terminating alternative
    Unbounded,
}

impl Cost {
    /// True if the cost is finite.
    pub fn is_finite(&self) -> bool {
        matches!(self, Cost::Finite(_))
    }

    fn plus_one(self) -> Self {
        match self {
            Cost::Finite(n) => Cost::Finite(n + 1),
            Cost::Unbounded => Cost::Unbounded,
        }
    }
}

impl Display for Cost {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Cost::Finite(n) => write!(f, "{}", n),
            Cost::Unbounded => write!(f, "inf"),
        }
    }
}

/// Computes costs of non-terminals and expansions of one grammar.
///
/// All non-terminals start out unbounded and their costs are lowered round by round
/// until no rule changes anymore. Every round settles at least one more non-terminal,
/// so this takes at most as many rounds as the grammar has rules.
pub struct CostAnalyzer<'g> {
    grammar: &'g Grammar,
    costs: HashMap<&'g str, Cost>,
}

impl<'g> CostAnalyzer<'g> {
    /// Analyze `grammar`.
    pub fn new(grammar: &'g Grammar) -> Self {
        let mut analyzer = Self {
            grammar,
            costs: HashMap::with_capacity(grammar.len()),
        };
        analyzer.solve();
        analyzer
    }

    fn solve(&mut self) {
        let grammar = self.grammar;

        for (nonterm, expansions) in grammar.rules() {
            // A rule without alternatives contributes nothing
            let initial = if expansions.is_empty() {
                Cost::Finite(0)
            } else {
                Cost::Unbounded
            };
            self.costs.insert(nonterm.as_str(), initial);
        }

        let mut rounds = 0;
        let mut changed = true;

        while changed {
            changed = false;
            rounds += 1;

            for (nonterm, expansions) in grammar.rules() {
                let Some(cost) = expansions.iter().map(|expansion| self.expansion_cost(expansion)).min() else {
                    continue;
                };

                if cost < self.symbol_cost(nonterm.as_str()) {
                    self.costs.insert(nonterm.as_str(), cost);
                    changed = true;
                }
            }
        }

        tracing::debug!("Costs settled after {} rounds", rounds);
    }

    /// Cost of the non-terminal `symbol`. Symbols without a rule cost nothing.
    pub fn symbol_cost(&self, symbol: &str) -> Cost {
        self.costs.get(symbol).copied().unwrap_or(Cost::Finite(0))
    }

    /// Cost of a single expansion.
    pub fn expansion_cost(&self, expansion: &Expansion) -> Cost {
        expansion
            .nonterminals()
            .into_iter()
            .map(|nonterm| self.symbol_cost(nonterm.as_str()))
            .max()
            .unwrap_or(Cost::Finite(0))
            .plus_one()
    }

    /// Compute the full cost table of the grammar.
    pub fn compute(self) -> CostTable {
        let grammar = self.grammar;
        let mut symbols = IndexMap::with_capacity(grammar.len());
        let mut expansions = IndexMap::with_capacity(grammar.len());

        for (nonterm, alternatives) in grammar.rules() {
            let costs = alternatives.iter().map(|expansion| self.expansion_cost(expansion)).collect::<Vec<_>>();
            expansions.insert(nonterm.clone(), costs);
            symbols.insert(nonterm.clone(), self.symbol_cost(nonterm.as_str()));
        }

        CostTable {
            symbols,
            expansions,
        }
    }
}

/// The costs of every non-terminal and of every expansion of a grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostTable {
    symbols: IndexMap<NonTerminal, Cost>,
    /// Aligned with the order of the alternatives in the grammar
    expansions: IndexMap<NonTerminal, Vec<Cost>>,
}

impl CostTable {
    /// Analyze `grammar`.
    pub fn new(grammar: &Grammar) -> Self {
        CostAnalyzer::new(grammar).compute()
    }

    /// The cost of a non-terminal.
    pub fn symbol_cost(&self, symbol: &str) -> Option<Cost> {
        self.symbols.get(symbol).copied()
    }

    /// The costs of all alternatives of a non-terminal, in grammar order.
    pub fn expansion_costs(&self, symbol: &str) -> Option<&[Cost]> {
        self.expansions.get(symbol).map(Vec::as_slice)
    }

    /// Iterate over the non-terminal costs.
    pub fn iter(&self) -> impl Iterator<Item = (&NonTerminal, Cost)> {
        self.symbols.iter().map(|(nonterm, cost)| (nonterm, *cost))
    }
}
