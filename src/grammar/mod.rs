//! The grammar model.
//! 
//! Build a grammar like so:
//! ```no_run
//! # use kpath_fuzz::grammar::Grammar;
//! let grammar = Grammar::builder()
//!     // Load a grammar in JSON format
//!     .json_grammar("my-grammar.json").unwrap()
//!     // Set the start symbol
//!     .start_symbol("<program>")
//!     .build().unwrap();
//! ```
//! You can inspect the grammar contents like this:
//! ```no_run
//! # use kpath_fuzz::grammar::{Grammar, Symbol};
//! # let grammar: Grammar = todo!();
//! for (lhs, expansions) in grammar.rules() {
//!     println!("lhs = {}", lhs);
//! 
//!     // Every alternative is a sequence of terminals and non-terminals.
//!     for expansion in expansions {
//!         for symbol in expansion.symbols() {
//!             match symbol {
//!                 Symbol::Terminal(terminal) => println!("terminal: {}", terminal.content()),
//!                 Symbol::NonTerminal(nonterminal) => println!("non-terminal {}", nonterminal.id()),
//!             }
//!         }
//!     }
//! }
//! ```
//! Unsplit alternatives like `"<term>+<expr>"` are split into symbols once, when
//! the grammar is loaded. Symbols that look like non-terminals but have no rule
//! are treated as terminals during generation. [`Grammar::validate`] reports them.

mod builder;
mod cfg;
pub(crate) mod normalize;
mod validity;

pub use builder::*;
pub use cfg::*;
pub use validity::*;
