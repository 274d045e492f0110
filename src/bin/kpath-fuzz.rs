use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sha2::{Digest, Sha256};
use tracing_subscriber::EnvFilter;
use kpath_fuzz::{
    fuzzer::KPathFuzzer,
    grammar::Grammar,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate inputs that cover the k-paths of a grammar", long_about = None)]
struct Args {
    /// Grammar file in JSON format
    #[arg(short, long, value_name = "FILE")]
    grammar: PathBuf,
    
    /// Start symbol, with or without angle brackets
    #[arg(short, long, default_value = "start")]
    start: String,
    
    /// Number of inputs to generate
    #[arg(short, long)]
    count: usize,
    
    /// Output directory
    #[arg(short = 'd', long, default_value = "out")]
    output: PathBuf,
    
    /// File extension of the generated inputs
    #[arg(short, long, default_value = "txt")]
    extension: String,
    
    /// Below this depth derivations prefer their most expensive alternatives
    #[arg(long, value_name = "NUMBER", default_value_t = 1)]
    min_depth: usize,
    
    /// From this depth on derivations prefer their cheapest alternatives
    #[arg(long, value_name = "NUMBER", default_value_t = 10)]
    max_depth: usize,
    
    /// Maximal length of the k-paths to cover
    #[arg(short, long, default_value_t = 1)]
    kcov: usize,
    
    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
    
    /// Also store the derivation tree of every input
    #[arg(long)]
    trees: bool,
    
    /// Log debug messages
    #[arg(short, long)]
    verbose: bool,
}

fn start_symbol(name: &str) -> String {
    if name.starts_with('<') && name.ends_with('>') {
        name.to_string()
    } else {
        format!("<{}>", name)
    }
}

fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

fn main() -> Result<()> {
    let args = Args::parse();
    
    let filter = if args.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();
    
    let grammar = Grammar::builder()
        .json_grammar(&args.grammar)?
        .start_symbol(start_symbol(&args.start))
        .build()
        .with_context(|| format!("Could not load grammar {}", args.grammar.display()))?;
    
    for finding in grammar.validate().findings() {
        println!("{}", finding);
    }
    
    let mut builder = KPathFuzzer::builder(grammar)
        .kcov(args.kcov)
        .min_depth(args.min_depth)
        .max_depth(args.max_depth);
    
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    
    let mut fuzzer = builder.build()?;
    
    fs::create_dir_all(&args.output).with_context(|| format!("Could not create {}", args.output.display()))?;
    
    for _ in 0..args.count {
        let tree = fuzzer.fuzz_tree();
        let input = tree.to_string();
        let hash = content_hash(&input);
        
        fs::write(args.output.join(format!("{}.{}", hash, args.extension)), &input)?;
        
        if args.trees {
            fs::write(args.output.join(format!("kpath-tree-{}", hash)), tree.to_bytes()?)?;
        }
    }
    
    tracing::info!("Generated {} inputs, {} k-paths left uncovered", args.count, fuzzer.remaining_k_paths());
    
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_content_hash() {
        assert_eq!(content_hash(""), "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
        assert_eq!(content_hash("1+2"), content_hash("1+2"));
        assert_ne!(content_hash("1+2"), content_hash("2+1"));
    }
    
    #[test]
    fn test_start_symbol() {
        assert_eq!(start_symbol("start"), "<start>");
        assert_eq!(start_symbol("<program>"), "<program>");
    }
    
    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["kpath-fuzz", "-g", "grammar.json", "-c", "3"]).unwrap();
        assert_eq!(args.min_depth, 1);
        assert_eq!(args.max_depth, 10);
        assert_eq!(args.kcov, 1);
        assert_eq!(args.output, PathBuf::from("out"));
        assert_eq!(args.extension, "txt");
        assert!(args.seed.is_none());
    }
}
