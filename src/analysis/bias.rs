use indexmap::IndexMap;

use crate::{
    analysis::{Cost, CostTable},
    grammar::Grammar,
};

/// Which extreme of the expansion costs a biased grammar keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bias {
    /// Keep the cheapest alternatives. Leads to shallow completions.
    Minimize,
    /// Keep the most expensive alternatives. Leads to deep completions.
    Maximize,
}

impl Bias {
    fn select(self, costs: &[Cost]) -> Option<Cost> {
        match self {
            Bias::Minimize => costs.iter().min().copied(),
            Bias::Maximize => costs.iter().max().copied(),
        }
    }
}

impl CostTable {
    /// Derive a grammar that keeps, for every non-terminal, only the alternatives
    /// whose cost is the minimum or maximum among its alternatives. Ties are all kept.
    ///
    /// The derived grammar may give the start symbol more than one alternative.
    pub fn biased_grammar(&self, grammar: &Grammar, bias: Bias) -> Grammar {
        let mut rules = IndexMap::with_capacity(grammar.len());
        
        for (nonterm, expansions) in grammar.rules() {
            let costs = self.expansion_costs(nonterm.as_str()).unwrap_or(&[]);
            let extreme = bias.select(costs);
            
            let kept = expansions
                .iter()
                .zip(costs.iter())
                .filter(|(_, cost)| Some(**cost) == extreme)
                .map(|(expansion, _)| expansion.clone())
                .collect::<Vec<_>>();
            
            rules.insert(nonterm.clone(), kept);
        }
        
        Grammar::new_unchecked(rules, grammar.start_symbol().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{
        test_grammars::{cyclic_grammar, expr_grammar},
        Expansion,
    };
    
    #[test]
    fn test_minimizing() {
        let grammar = expr_grammar();
        let costs = CostTable::new(&grammar);
        let min = costs.biased_grammar(&grammar, Bias::Minimize);
        
        assert_eq!(min.start_symbol(), grammar.start_symbol());
        assert_eq!(min.len(), grammar.len());
        assert_eq!(min.get("<expr>").unwrap(), &[Expansion::from_tokens(["<term>"])]);
        assert_eq!(min.get("<factor>").unwrap(), &[Expansion::from_tokens(["<number>"])]);
        assert_eq!(min.get("<number>").unwrap().len(), 10);
    }
    
    #[test]
    fn test_maximizing() {
        let grammar = expr_grammar();
        let costs = CostTable::new(&grammar);
        let max = costs.biased_grammar(&grammar, Bias::Maximize);
        
        assert_eq!(max.get("<expr>").unwrap(), &[Expansion::from_tokens(["<term>", "+", "<expr>"])]);
        assert_eq!(max.get("<factor>").unwrap(), &[Expansion::from_tokens(["(", "<expr>", ")"])]);
        assert_eq!(max.get("<number>").unwrap().len(), 10);
    }
    
    #[test]
    fn test_extremes_hold() {
        let grammar = expr_grammar();
        let costs = CostTable::new(&grammar);
        
        for bias in [Bias::Minimize, Bias::Maximize] {
            let biased = costs.biased_grammar(&grammar, bias);
            
            for (nonterm, expansions) in biased.rules() {
                let all = costs.expansion_costs(nonterm.as_str()).unwrap();
                let extreme = bias.select(all).unwrap();
                assert!(!expansions.is_empty());
                
                for expansion in expansions {
                    let index = grammar.get(nonterm.as_str()).unwrap().iter().position(|e| e == expansion).unwrap();
                    assert_eq!(all[index], extreme);
                }
            }
        }
    }
    
    #[test]
    fn test_unbounded_alternatives() {
        let grammar = cyclic_grammar();
        let costs = CostTable::new(&grammar);
        
        let min = costs.biased_grammar(&grammar, Bias::Minimize);
        assert_eq!(min.get("<a>").unwrap(), &[Expansion::from_tokens(["x"])]);
        
        let max = costs.biased_grammar(&grammar, Bias::Maximize);
        assert_eq!(max.get("<a>").unwrap(), &[Expansion::from_tokens(["<loop>"])]);
    }
}
