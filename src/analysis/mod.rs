//! Static analyses of a grammar that drive generation.
//!
//! - [`CostTable`]: how many expansion steps every non-terminal and expansion needs at least
//!   to reach a terminal-only derivation.
//! - [`CostTable::biased_grammar`]: grammars restricted to the cheapest or the most expensive alternatives.
//! - [`KPathGenerator`]: all chains of up to `k` nested expansion choices.

mod bias;
mod cost;
mod kpath;

pub use bias::Bias;
pub use cost::{Cost, CostAnalyzer, CostTable};
pub use kpath::{KPath, KPathGenerator, KPathPool, KPATH_WARN_LENGTH};
