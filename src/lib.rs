//! This library contains everything you need to fuzz with a context-free grammar while
//! systematically covering its k-paths.
//!
//! It consists of
//! - __grammar__: Load grammars from JSON files or build them in code and check them for common mistakes.
//! - __tree__: Derivation trees with iterative traversals and serialization.
//! - __analysis__: Expansion costs, cost-biased grammars and k-path enumeration.
//! - __fuzzer__: The engine that turns all of the above into inputs.
//!
//! A k-path is a chain of `k` nested expansion choices, e.g. `<expr> ::= <term>` followed by
//! `<term> ::= <factor>`. The fuzzer applies every k-path of length `1..=kcov` once before
//! it falls back to purely random expansions.
//!
//! ## Getting Started
//! The first step always is to load a grammar. To do this use the [`Grammar::builder()`](grammar::Grammar::builder) method
//! that will give you access to a [`GrammarBuilder`](grammar::GrammarBuilder) like this:
//! ```no_run
//! # use kpath_fuzz::grammar::Grammar;
//! let grammar = Grammar::builder()
//!     .json_grammar("my-grammar.json").unwrap()
//!     // Set the start symbol
//!     .start_symbol("<program>")
//!     .build().unwrap();
//! ```
//! Then, plug the grammar into a [`KPathFuzzer`](fuzzer::KPathFuzzer):
//! ```no_run
//! # use kpath_fuzz::{grammar::Grammar, fuzzer::KPathFuzzer};
//! # let grammar = Grammar::builder().json_grammar("my-grammar.json").unwrap().build().unwrap();
//! let mut fuzzer = KPathFuzzer::builder(grammar)
//!     .kcov(2)
//!     .min_depth(2)
//!     .max_depth(10)
//!     .build().unwrap();
//! let input = fuzzer.fuzz();
//! ```
//! And that's it.

#![deny(missing_docs)]

pub(crate) mod parser;

pub mod error;
pub mod grammar;
pub mod tree;
pub mod analysis;
pub mod fuzzer;
