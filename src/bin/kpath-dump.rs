use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use kpath_fuzz::tree::DerivationTree;

/// Print the input that a stored derivation tree represents
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Print the JSON record of the tree instead
    #[arg(long)]
    json: bool,
    
    file: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let bytes = std::fs::read(&args.file).with_context(|| format!("Could not read {}", args.file.display()))?;
    let tree = DerivationTree::from_bytes(&bytes).context("Could not decode the derivation tree")?;
    
    let mut stdout = std::io::stdout();
    
    if args.json {
        serde_json::to_writer_pretty(&mut stdout, &tree.to_json()?)?;
        writeln!(stdout)?;
    } else {
        stdout.write_all(tree.to_string().as_bytes())?;
    }
    
    Ok(())
}
