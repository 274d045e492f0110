use std::path::Path;

use indexmap::IndexMap;

use crate::{
    error::{Error, ParsingError},
    grammar::{normalize::split_expansion, Expansion, Grammar, NonTerminal},
    parser::json,
};

/// The default non-terminal that is used as the start symbol of a grammar
pub const DEFAULT_START_SYMBOL: &str = "<start>";

/// The GrammarBuilder collects rules from grammar files and from code and returns a single [`Grammar`].
///
/// Alternatives for a non-terminal that is defined more than once are appended
/// in the order they were added.
/// ```no_run
/// # use kpath_fuzz::grammar::Grammar;
/// let grammar = Grammar::builder()
///     // Load a grammar in JSON format
///     .json_grammar("my-grammar.json").unwrap()
///     // Add a rule with unsplit alternatives
///     .rule("<digit>", ["0", "1", "2"])
///     // Set the start symbol
///     .start_symbol("<program>")
///     .build().unwrap();
/// ```
pub struct GrammarBuilder {
    rules: Vec<(String, Vec<Expansion>)>,
    start_symbol: String,
}

impl GrammarBuilder {
    pub(crate) fn new() -> Self {
        Self {
            rules: Vec::new(),
            start_symbol: DEFAULT_START_SYMBOL.to_string(),
        }
    }
    
    fn check_start_symbol(&self) -> bool {
        for (lhs, _) in &self.rules {
            if *lhs == self.start_symbol {
                return false;
            }
        }
        
        true
    }
}

impl GrammarBuilder {
    /// Load a grammar from disk that is in JSON format. Both a list of unsplit
    /// strings and a list of symbol lists are accepted per rule.
    pub fn json_grammar<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ParsingError> {
        let new_rules = json::parse_json(path.as_ref())?;
        self.rules.extend(new_rules.into_iter().map(|(lhs, expansions)| (lhs.as_str().to_string(), expansions)));
        Ok(self)
    }
    
    /// Add alternatives for `lhs`. Each alternative is split into symbols.
    pub fn rule<S, I, A>(mut self, lhs: S, alternatives: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = A>,
        A: AsRef<str>,
    {
        let expansions = alternatives.into_iter().map(|alt| split_expansion(alt.as_ref())).collect();
        self.rules.push((lhs.into(), expansions));
        self
    }
    
    /// Add a single already split alternative for `lhs`.
    pub fn expansion<S, I, T>(mut self, lhs: S, symbols: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.rules.push((lhs.into(), vec![Expansion::from_tokens(symbols)]));
        self
    }
    
    /// Set the start symbol, e.g. `<program>`.
    pub fn start_symbol<S: Into<String>>(mut self, start_symbol: S) -> Self {
        self.start_symbol = start_symbol.into();
        self
    }
    
    /// Create a [`Grammar`].
    pub fn build(self) -> Result<Grammar, Error> {
        if self.check_start_symbol() {
            return Err(Error::MalformedGrammar(format!("The grammar does not define the start symbol {}", self.start_symbol)));
        }
        
        let mut rules = IndexMap::<NonTerminal, Vec<Expansion>>::new();
        
        for (lhs, mut expansions) in self.rules {
            let lhs = match NonTerminal::new(lhs.as_str()) {
                Some(lhs) => lhs,
                None => return Err(Error::MalformedGrammar(format!("Key isn't a non-terminal: '{}'", lhs))),
            };
            
            rules.entry(lhs).or_default().append(&mut expansions);
        }
        
        let start_symbol = match NonTerminal::new(self.start_symbol.as_str()) {
            Some(start_symbol) => start_symbol,
            None => return Err(Error::MalformedGrammar(format!("Start symbol isn't a non-terminal: '{}'", self.start_symbol))),
        };
        
        Grammar::new(rules, start_symbol)
    }
}
