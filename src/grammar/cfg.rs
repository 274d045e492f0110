use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt::{Display, Formatter, Result as FmtResult};

use indexmap::IndexMap;
use itertools::Itertools;
use petgraph::{
    graph::{DiGraph, NodeIndex},
    visit::Dfs,
};

use crate::{
    error::Error,
    grammar::{normalize::split_expansion, GrammarBuilder},
};

/// Returns true if `symbol` is written like a non-terminal, i.e. enclosed in `<>`.
pub fn is_nonterminal(symbol: &str) -> bool {
    symbol.len() >= 2 && symbol.starts_with('<') && symbol.ends_with('>')
}

/// A non-terminal. It keeps the full token including the angle brackets.
#[derive(Debug, Clone, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct NonTerminal(String);

impl NonTerminal {
    /// Create a non-terminal from a token like `<expr>`.
    /// Returns `None` if the token is not enclosed in `<>`.
    pub fn new<S: Into<String>>(s: S) -> Option<Self> {
        let s = s.into();

        if is_nonterminal(&s) {
            Some(Self(s))
        } else {
            None
        }
    }

    /// The name without the enclosing brackets.
    pub fn id(&self) -> &str {
        &self.0[1..self.0.len() - 1]
    }

    /// The full token, e.g. `<expr>`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NonTerminal {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Display for NonTerminal {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// A piece of literal output text.
#[derive(Debug, Clone, Eq, Hash, PartialEq)]
pub struct Terminal(String);

impl Terminal {
    /// Create a terminal with the given content.
    pub fn new<S: Into<String>>(s: S) -> Self {
        Self(s.into())
    }

    /// The literal text of this terminal.
    pub fn content(&self) -> &str {
        &self.0
    }
}

/// A single element of an [`Expansion`].
#[derive(Debug, Clone, Eq, Hash, PartialEq)]
pub enum Symbol {
    /// Literal text
    Terminal(Terminal),
    /// A reference to a rule
    NonTerminal(NonTerminal),
}

impl Symbol {
    /// Classify a raw token by its syntax.
    pub fn parse<S: Into<String>>(token: S) -> Self {
        let token = token.into();

        if is_nonterminal(&token) {
            Symbol::NonTerminal(NonTerminal(token))
        } else {
            Symbol::Terminal(Terminal(token))
        }
    }

    /// The text of the symbol as it appears in a derivation tree.
    pub fn as_str(&self) -> &str {
        match self {
            Symbol::Terminal(term) => term.content(),
            Symbol::NonTerminal(nonterm) => nonterm.as_str(),
        }
    }

    /// Returns the non-terminal if this symbol is one.
    pub fn as_nonterminal(&self) -> Option<&NonTerminal> {
        match self {
            Symbol::NonTerminal(nonterm) => Some(nonterm),
            Symbol::Terminal(_) => None,
        }
    }
}

/// One alternative on the right-hand side of a rule.
#[derive(Debug, Clone, Eq, Hash, PartialEq, Default)]
pub struct Expansion(Vec<Symbol>);

impl Expansion {
    /// Create an expansion from a sequence of symbols.
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Self(symbols)
    }

    /// Create an expansion by classifying each token by its syntax.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(tokens.into_iter().map(Symbol::parse).collect())
    }

    /// The symbols of this expansion.
    pub fn symbols(&self) -> &[Symbol] {
        &self.0
    }

    /// Number of symbols.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the expansion has no symbols at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The non-terminals of this expansion in order of appearance, duplicates included.
    pub fn nonterminals(&self) -> Vec<&NonTerminal> {
        self.0.iter().filter_map(Symbol::as_nonterminal).collect()
    }

    /// True if the symbol texts are exactly `symbols`.
    pub fn matches<'a, I>(&self, symbols: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut symbols = symbols.into_iter();

        for own in &self.0 {
            match symbols.next() {
                Some(other) if other == own.as_str() => {},
                _ => return false,
            }
        }

        symbols.next().is_none()
    }
}

impl Display for Expansion {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        for symbol in &self.0 {
            f.write_str(symbol.as_str())?;
        }

        Ok(())
    }
}

/// A context-free grammar: an insertion-ordered mapping from non-terminals
/// to their alternatives, plus a designated start symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    rules: IndexMap<NonTerminal, Vec<Expansion>>,
    start_symbol: NonTerminal,
}

impl Grammar {
    /// Create a grammar. The start symbol must be defined and must have
    /// exactly one alternative.
    pub fn new(rules: IndexMap<NonTerminal, Vec<Expansion>>, start_symbol: NonTerminal) -> Result<Self, Error> {
        match rules.get(&start_symbol) {
            None => {
                return Err(Error::MalformedGrammar(format!("Start symbol '{}' not found in grammar", start_symbol)));
            },
            Some(expansions) if expansions.len() != 1 => {
                return Err(Error::MalformedGrammar(format!(
                    "Start symbol '{}' must have exactly one expansion alternative but has {}",
                    start_symbol,
                    expansions.len()
                )));
            },
            _ => {},
        }

        Ok(Self::new_unchecked(rules, start_symbol))
    }

    /// Derived grammars may have several alternatives for the start symbol.
    pub(crate) fn new_unchecked(rules: IndexMap<NonTerminal, Vec<Expansion>>, start_symbol: NonTerminal) -> Self {
        Self {
            rules,
            start_symbol,
        }
    }

    /// Create a grammar from already split symbol sequences.
    pub fn from_symbols<K, I, E, S>(productions: I, start_symbol: &str) -> Result<Self, Error>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Vec<E>)>,
        E: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut rules = IndexMap::new();

        for (key, alternatives) in productions {
            let lhs = checked_nonterminal(key)?;
            let expansions = alternatives.into_iter().map(Expansion::from_tokens).collect::<Vec<_>>();
            rules.entry(lhs).or_insert_with(Vec::new).extend(expansions);
        }

        Self::new(rules, checked_nonterminal(start_symbol)?)
    }

    /// Create a grammar from unsplit alternatives like `"<term>+<expr>"`.
    pub fn from_strings<K, I, S>(productions: I, start_symbol: &str) -> Result<Self, Error>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Vec<S>)>,
        S: AsRef<str>,
    {
        let mut rules = IndexMap::new();

        for (key, alternatives) in productions {
            let lhs = checked_nonterminal(key)?;
            let expansions = alternatives.iter().map(|alt| split_expansion(alt.as_ref())).collect::<Vec<_>>();
            rules.entry(lhs).or_insert_with(Vec::new).extend(expansions);
        }

        Self::new(rules, checked_nonterminal(start_symbol)?)
    }

    /// Get a [`GrammarBuilder`] that can load grammar files and single rules.
    pub fn builder() -> GrammarBuilder {
        GrammarBuilder::new()
    }

    /// The designated start symbol.
    pub fn start_symbol(&self) -> &NonTerminal {
        &self.start_symbol
    }

    /// All rules in insertion order.
    pub fn rules(&self) -> &IndexMap<NonTerminal, Vec<Expansion>> {
        &self.rules
    }

    /// The alternatives of `symbol`, if it is defined.
    pub fn get(&self, symbol: &str) -> Option<&[Expansion]> {
        self.rules.get(symbol).map(Vec::as_slice)
    }

    /// The key under which `symbol` is defined.
    pub fn nonterminal(&self, symbol: &str) -> Option<&NonTerminal> {
        self.rules.get_key_value(symbol).map(|(key, _)| key)
    }

    /// True if `symbol` is a key of this grammar.
    pub fn contains(&self, symbol: &str) -> bool {
        self.rules.contains_key(symbol)
    }

    /// Iterate over the defined non-terminals in insertion order.
    pub fn nonterminals(&self) -> impl Iterator<Item = &NonTerminal> {
        self.rules.keys()
    }

    /// Number of defined non-terminals.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True if no rules are defined. Never the case for a constructed grammar.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Export the rules with every alternative joined back into a single string.
    pub fn to_strings(&self) -> IndexMap<String, Vec<String>> {
        self.rules
            .iter()
            .map(|(lhs, expansions)| (lhs.as_str().to_string(), expansions.iter().map(Expansion::to_string).collect()))
            .collect()
    }

    /// Build a directed graph with an edge from each defined non-terminal
    /// to every defined non-terminal it references.
    pub(crate) fn dependency_graph(&self) -> (DiGraph<&NonTerminal, ()>, IndexMap<&NonTerminal, NodeIndex>) {
        let mut graph = DiGraph::with_capacity(self.rules.len(), 0);
        let mut nodes = IndexMap::with_capacity(self.rules.len());

        for lhs in self.rules.keys() {
            nodes.insert(lhs, graph.add_node(lhs));
        }

        for (lhs, expansions) in &self.rules {
            let src = nodes[lhs];

            for expansion in expansions {
                for nonterm in expansion.nonterminals() {
                    if let Some(&dst) = nodes.get(nonterm) {
                        if graph.find_edge(src, dst).is_none() {
                            graph.add_edge(src, dst, ());
                        }
                    }
                }
            }
        }

        (graph, nodes)
    }

    /// All defined non-terminals reachable from the start symbol, the start symbol included.
    pub fn reachable_nonterminals(&self) -> HashSet<NonTerminal> {
        let (graph, nodes) = self.dependency_graph();
        let mut reachable = HashSet::new();
        let mut dfs = Dfs::new(&graph, nodes[&self.start_symbol]);

        while let Some(idx) = dfs.next(&graph) {
            reachable.insert(graph[idx].clone());
        }

        reachable
    }

    /// All defined non-terminals that cannot be reached from the start symbol.
    pub fn unreachable_nonterminals(&self) -> HashSet<NonTerminal> {
        let reachable = self.reachable_nonterminals();
        self.rules.keys().filter(|nonterm| !reachable.contains(*nonterm)).cloned().collect()
    }
}

fn checked_nonterminal<S: Into<String>>(token: S) -> Result<NonTerminal, Error> {
    let token = token.into();

    match NonTerminal::new(token.as_str()) {
        Some(nonterm) => Ok(nonterm),
        None => Err(Error::MalformedGrammar(format!("Key isn't a non-terminal: '{}'", token))),
    }
}

impl Display for Grammar {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        let render = |lhs: &NonTerminal, expansions: &[Expansion]| {
            format!("{} ::= {}", lhs, expansions.iter().join(" | "))
        };

        let mut lines = Vec::with_capacity(self.rules.len());

        if let Some(expansions) = self.rules.get(&self.start_symbol) {
            lines.push(render(&self.start_symbol, expansions));
        }

        for (lhs, expansions) in &self.rules {
            if lhs != &self.start_symbol {
                lines.push(render(lhs, expansions));
            }
        }

        write!(f, "{}", lines.join("\n"))
    }
}
