use std::collections::HashSet;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::grammar::{Grammar, NonTerminal};

/// A single problem found by [`Grammar::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Finding {
    /// A non-terminal is referenced by some expansion but has no rule.
    Undefined(NonTerminal),
    /// A non-terminal has a rule but no expansion references it.
    Unused(NonTerminal),
    /// A non-terminal cannot be reached from the start symbol.
    Unreachable(NonTerminal),
    /// A non-terminal has no alternatives at all.
    NoExpansions(NonTerminal),
    /// Every alternative of a non-terminal is an empty sequence.
    OnlyEmptyExpansions(NonTerminal),
}

impl Display for Finding {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        match self {
            Finding::Undefined(nonterm) => write!(f, "{}: used, but not defined.", nonterm),
            Finding::Unused(nonterm) => write!(f, "{}: defined, but not used.", nonterm),
            Finding::Unreachable(nonterm) => write!(f, "{}: unreachable from the start symbol.", nonterm),
            Finding::NoExpansions(nonterm) => write!(f, "{}: has no expansion alternatives.", nonterm),
            Finding::OnlyEmptyExpansions(nonterm) => write!(f, "{}: has no non-empty expansion.", nonterm),
        }
    }
}

/// The outcome of the advisory soundness check of a grammar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validity {
    findings: Vec<Finding>,
}

impl Validity {
    /// True if nothing was found.
    pub fn is_ok(&self) -> bool {
        self.findings.is_empty()
    }
    
    /// All findings in a stable order.
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }
}

impl Grammar {
    /// Check the grammar for undefined, unused and unreachable non-terminals and
    /// for rules without a usable alternative. This never fails, the findings
    /// are returned and logged.
    pub fn validate(&self) -> Validity {
        let mut findings = Vec::new();
        let mut used = HashSet::new();
        used.insert(self.start_symbol());
        
        for (lhs, expansions) in self.rules() {
            if expansions.is_empty() {
                findings.push(Finding::NoExpansions(lhs.clone()));
            } else if expansions.iter().all(|expansion| expansion.is_empty()) {
                findings.push(Finding::OnlyEmptyExpansions(lhs.clone()));
            }
            
            for expansion in expansions {
                used.extend(expansion.nonterminals());
            }
        }
        
        for lhs in self.nonterminals() {
            if !used.contains(lhs) {
                findings.push(Finding::Unused(lhs.clone()));
            }
        }
        
        let mut undefined = used.iter().filter(|nonterm| !self.contains(nonterm.as_str())).map(|nonterm| (*nonterm).clone()).collect::<Vec<_>>();
        undefined.sort();
        findings.extend(undefined.into_iter().map(Finding::Undefined));
        
        let unreachable = self.unreachable_nonterminals();
        for lhs in self.nonterminals() {
            if unreachable.contains(lhs) {
                findings.push(Finding::Unreachable(lhs.clone()));
            }
        }
        
        for finding in &findings {
            tracing::warn!("{}", finding);
        }
        
        Validity {
            findings,
        }
    }
    
    /// Shorthand for `validate().is_ok()`.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::test_grammars::expr_grammar;
    
    #[test]
    fn test_is_valid() {
        assert!(expr_grammar().is_valid());
    }
    
    #[test]
    fn test_unreachable() {
        let mut rules = expr_grammar().to_strings();
        rules.insert("<invalid>".to_string(), vec!["<expr>".to_string()]);
        let grammar = Grammar::from_strings(rules, "<start>").unwrap();
        
        let validity = grammar.validate();
        assert!(!validity.is_ok());
        
        let invalid = NonTerminal::new("<invalid>").unwrap();
        assert!(validity.findings().contains(&Finding::Unreachable(invalid.clone())));
        assert!(validity.findings().contains(&Finding::Unused(invalid)));
    }
    
    #[test]
    fn test_undefined() {
        let grammar = Grammar::from_strings([("<start>", vec!["<missing>x"])], "<start>").unwrap();
        let validity = grammar.validate();
        assert_eq!(validity.findings(), &[Finding::Undefined(NonTerminal::new("<missing>").unwrap())]);
    }
    
    #[test]
    fn test_unreachable_cycle() {
        // <a> and <b> use each other but the start symbol never gets there
        let grammar = Grammar::from_strings(
            [
                ("<start>", vec!["x"]),
                ("<a>", vec!["<b>"]),
                ("<b>", vec!["<a>", "y"]),
            ],
            "<start>",
        )
        .unwrap();
        let validity = grammar.validate();
        assert_eq!(
            validity.findings(),
            &[
                Finding::Unreachable(NonTerminal::new("<a>").unwrap()),
                Finding::Unreachable(NonTerminal::new("<b>").unwrap()),
            ]
        );
    }
    
    #[test]
    fn test_empty_rule() {
        let grammar = Grammar::from_symbols(
            [
                ("<start>", vec![vec!["<e>"]]),
                ("<e>", vec![Vec::<&str>::new()]),
            ],
            "<start>",
        )
        .unwrap();
        let validity = grammar.validate();
        assert_eq!(validity.findings(), &[Finding::OnlyEmptyExpansions(NonTerminal::new("<e>").unwrap())]);
    }
}
